/// Represents probability mass (discrete pr) or probability density (continuous pr).
///
/// Scattering models that concentrate energy in a single direction (perfect mirrors, refractors)
/// report the probability of the chosen *branch* as a `Mass`; models with a continuous
/// distribution report a `Density`. Estimators divide by `value()` either way, but the
/// distinction matters when deciding whether a direction could ever be re-evaluated.
#[derive(Debug, Clone, Copy)]
pub enum Prob {
    Density(f32),
    Mass(f32),
}

impl Prob {
    pub fn is_density(&self) -> bool {
        matches!(self, Self::Density(_))
    }
    pub fn is_positive(&self) -> bool {
        self.value() > 0.0
    }
    /// The carried probability value, whichever variant it is.
    pub fn value(&self) -> f32 {
        match self {
            Self::Density(pdf) => *pdf,
            Self::Mass(pmf) => *pmf,
        }
    }
}
