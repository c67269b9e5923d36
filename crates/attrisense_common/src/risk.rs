//! Risk tiers and the declarative gauge handed to the renderer.
//!
//! Tiers are half-open: `[0, 0.40)` low, `[0.40, 0.70)` medium,
//! `[0.70, 1.0]` high. A probability sitting exactly on a threshold takes
//! the higher tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest probability classified as medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.40;
/// Lowest probability classified as high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.70;

pub const LOW_RISK_COLOR: &str = "#22C55E";
pub const MEDIUM_RISK_COLOR: &str = "#FACC15";
pub const HIGH_RISK_COLOR: &str = "#EF4444";
pub const GAUGE_BAR_COLOR: &str = "#374151";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }

    /// Band color name.
    pub fn color_name(&self) -> &'static str {
        match self {
            RiskTier::Low => "green",
            RiskTier::Medium => "yellow",
            RiskTier::High => "red",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskTier::Low => LOW_RISK_COLOR,
            RiskTier::Medium => MEDIUM_RISK_COLOR,
            RiskTier::High => HIGH_RISK_COLOR,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tier for a probability. Values outside [0, 1] are clamped.
pub fn classify(probability: f64) -> RiskTier {
    let p = probability.clamp(0.0, 1.0);
    if p < MEDIUM_RISK_THRESHOLD {
        RiskTier::Low
    } else if p < HIGH_RISK_THRESHOLD {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

/// One colored range on the gauge axis, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeBand {
    pub tier: RiskTier,
    pub from: f64,
    pub to: f64,
    pub color: String,
}

/// Chart-agnostic gauge description: axis, bands, bar and number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeSpec {
    /// Probability in percent, 0–100.
    pub value: f64,
    pub axis_min: f64,
    pub axis_max: f64,
    pub bands: Vec<GaugeBand>,
    pub bar_color: String,
    pub number_suffix: String,
    /// Tier the needle falls in.
    pub tier: RiskTier,
}

impl GaugeSpec {
    /// Band containing the needle.
    pub fn active_band(&self) -> Option<&GaugeBand> {
        self.bands.iter().find(|b| b.tier == self.tier)
    }
}

/// Gauge description for a probability. Bands are fixed at 40 and 70.
pub fn render_gauge(probability: f64) -> GaugeSpec {
    let p = probability.clamp(0.0, 1.0);
    GaugeSpec {
        value: p * 100.0,
        axis_min: 0.0,
        axis_max: 100.0,
        bands: vec![
            GaugeBand {
                tier: RiskTier::Low,
                from: 0.0,
                to: 40.0,
                color: LOW_RISK_COLOR.to_string(),
            },
            GaugeBand {
                tier: RiskTier::Medium,
                from: 40.0,
                to: 70.0,
                color: MEDIUM_RISK_COLOR.to_string(),
            },
            GaugeBand {
                tier: RiskTier::High,
                from: 70.0,
                to: 100.0,
                color: HIGH_RISK_COLOR.to_string(),
            },
        ],
        bar_color: GAUGE_BAR_COLOR.to_string(),
        number_suffix: "%".to_string(),
        tier: classify(p),
    }
}
