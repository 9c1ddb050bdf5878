//! Soft-demand penalty support: opt-in unmet-demand slack, off by
//! default (§4.5 edge policies). Callers decide whether to enable it;
//! the Model Builder only needs the resulting per-tonne rate.

#[derive(Debug, Clone, Copy)]
pub struct PenaltyPolicy {
    pub enabled: bool,
    pub unmet_demand_per_tonne: f64,
}

impl PenaltyPolicy {
    pub fn disabled() -> Self {
        Self { enabled: false, unmet_demand_per_tonne: 0.0 }
    }

    pub fn enabled(unmet_demand_per_tonne: f64) -> Self {
        Self { enabled: true, unmet_demand_per_tonne }
    }

    /// The rate to pass into [`crate::model::build`], or `None` to keep
    /// the hard demand-equality constraint.
    pub fn rate(&self) -> Option<f64> {
        self.enabled.then_some(self.unmet_demand_per_tonne)
    }
}
