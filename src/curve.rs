use serde::{Deserialize, Serialize};

pub const CURVE_MONTHS: u32 = 24;
pub const MONTHLY_DECAY: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub month: u32,
    /// Raw projection; may fall below zero on hot, long horizons.
    pub health_percent: f64,
}

/// Projected health for months `0..=24` under a constant degradation factor.
pub fn project_decay_curve(degradation_factor: f64) -> Vec<CurvePoint> {
    (0..=CURVE_MONTHS)
        .map(|month| CurvePoint {
            month,
            health_percent: 100.0 - month as f64 * MONTHLY_DECAY * degradation_factor,
        })
        .collect()
}
