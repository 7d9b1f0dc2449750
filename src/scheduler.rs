use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

/// The unit of work the pool executes. The scheduler is agnostic to what a task does; the
/// renderer hands it image tiles.
pub trait Task: Send {
    fn run(&self);
}

/// Counting semaphore over a mutex and condition variable; tracks how many tasks are available
/// to pick up (plus, at shutdown, one sentinel per worker).
struct Semaphore {
    count: Mutex<usize>,
    condition: Condvar,
}

impl Semaphore {
    fn new(count: usize) -> Semaphore {
        Semaphore {
            count: Mutex::new(count),
            condition: Condvar::new(),
        }
    }

    fn post(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.condition.notify_one();
    }

    fn wait(&self) {
        let mut count = self.count.lock().unwrap();
        while *count == 0 {
            count = self.condition.wait(count).unwrap();
        }
        *count -= 1;
    }
}

struct SchedulerState {
    /// FIFO of pending tasks. Workers hold this lock only to pop.
    queue: Mutex<VecDeque<Box<dyn Task>>>,
    task_semaphore: Semaphore,
    /// Completion barrier: count of enqueued-but-not-finished tasks. Lock order is always
    /// queue first, then this; no lock is held while a task runs.
    unfinished: Mutex<usize>,
    run_condition: Condvar,
}

/// Fixed-size worker pool draining a shared tile queue.
///
/// Lifecycle: `new` spawns the workers; `enqueue` + `run` publish work; `wait_for_completion`
/// blocks until the unfinished count reaches zero; `shutdown` then posts one sentinel token
/// per worker (each wakes to an empty queue and exits) and joins them all.
pub struct Scheduler {
    state: Arc<SchedulerState>,
    workers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(num_workers: usize) -> Scheduler {
        assert!(num_workers > 0);
        let state = Arc::new(SchedulerState {
            queue: Mutex::new(VecDeque::new()),
            task_semaphore: Semaphore::new(0),
            unfinished: Mutex::new(0),
            run_condition: Condvar::new(),
        });
        let workers = (0..num_workers)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || worker_entry(state))
            })
            .collect();
        log::info!("scheduler: {} workers", num_workers);
        Scheduler { state, workers }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    pub fn enqueue(&self, tasks: Vec<Box<dyn Task>>) {
        let count = tasks.len();
        {
            let mut queue = self.state.queue.lock().unwrap();
            queue.extend(tasks);
        }
        {
            let mut unfinished = self.state.unfinished.lock().unwrap();
            *unfinished += count;
        }
    }

    /// Releases workers, one semaphore token per queued task.
    pub fn run(&self) {
        let pending = self.state.queue.lock().unwrap().len();
        for _ in 0..pending {
            self.state.task_semaphore.post();
        }
    }

    pub fn wait_for_completion(&self) {
        let mut unfinished = self.state.unfinished.lock().unwrap();
        while *unfinished > 0 {
            unfinished = self.state.run_condition.wait(unfinished).unwrap();
        }
    }

    /// Drains the pool: waits for all published work, then lets every worker observe the empty
    /// queue and exit.
    pub fn shutdown(self) {
        self.wait_for_completion();
        for _ in 0..self.workers.len() {
            self.state.task_semaphore.post();
        }
        for worker in self.workers {
            worker.join().expect("worker thread panicked");
        }
        log::info!("scheduler: shut down");
    }
}

fn worker_entry(state: Arc<SchedulerState>) {
    loop {
        state.task_semaphore.wait();

        let task = {
            let mut queue = state.queue.lock().unwrap();
            match queue.pop_front() {
                // A token with no task is the shutdown sentinel.
                None => break,
                Some(task) => task,
            }
        };

        task.run();

        {
            let mut unfinished = state.unfinished.lock().unwrap();
            *unfinished -= 1;
            if *unfinished == 0 {
                state.run_condition.notify_one();
            }
        }
    }
}
