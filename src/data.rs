use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::types::{ModelName, Valuation};
use crate::utils::clean_field;

/// One row extracted from the CRSP sheet (motor vehicle or motorcycle).
///
/// `make`, `model` and `crsp_kes` are optional here so incomplete rows can be
/// counted and skipped during cascade construction instead of failing the parse.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RawVehicleRecord {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub model_number: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub drive: Option<String>,
    /// Displacement in cc, or a free-text unit such as `63 kWh` for EVs.
    #[serde(default)]
    pub engine_cc: Option<RawEngine>,
    /// Absent for motorcycle rows.
    #[serde(default)]
    pub body_type: Option<String>,
    #[serde(default)]
    pub gvw: Option<Value>,
    #[serde(default)]
    pub seating: Option<Value>,
    #[serde(default)]
    pub fuel: Option<String>,
    /// Base valuation as read from the sheet; rounded to whole shillings when used.
    #[serde(default)]
    pub crsp_kes: Option<f64>,
}

impl RawVehicleRecord {
    /// Valuation rounded to whole shillings, or `None` when absent or not positive.
    pub fn valuation(&self) -> Option<Valuation> {
        let raw = self.crsp_kes?;
        if !raw.is_finite() {
            return None;
        }
        let rounded = raw.round();
        if rounded < 1.0 {
            return None;
        }
        Some(rounded as Valuation)
    }
}

/// Displacement as it appears in the source: a number or a text label.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawEngine {
    Number(f64),
    Label(String),
}

impl RawEngine {
    /// Normalize into an [`EngineSize`], dropping zero and placeholder values.
    pub fn normalize(&self) -> Option<EngineSize> {
        match self {
            RawEngine::Number(value) => {
                if !value.is_finite() || *value <= 0.0 {
                    return None;
                }
                if value.fract() == 0.0 && *value <= u64::MAX as f64 {
                    return Some(EngineSize::Cc(*value as u64));
                }
                Some(EngineSize::Label(value.to_string()))
            }
            RawEngine::Label(label) => {
                let label = clean_field(Some(label.as_str()))?;
                match label.parse::<u64>() {
                    Ok(0) => None,
                    Ok(cc) => Some(EngineSize::Cc(cc)),
                    Err(_) => Some(EngineSize::Label(label)),
                }
            }
        }
    }
}

/// Normalized engine size kept on cascade entries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(untagged)]
pub enum EngineSize {
    Cc(u64),
    Label(String),
}

impl fmt::Display for EngineSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineSize::Cc(cc) => write!(f, "{cc}cc"),
            EngineSize::Label(label) => f.write_str(label),
        }
    }
}

/// A vehicle as retained in the cascade for display and duty calculation.
///
/// Optional fields are omitted from the artifact when absent, never `null`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CascadeEntry {
    pub model: ModelName,
    pub crsp: Valuation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<EngineSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mn: Option<String>,
}

impl CascadeEntry {
    /// Short spec line for listings (`1998cc · Petrol · AT`).
    pub fn spec_line(&self) -> String {
        let mut parts = Vec::new();
        if let Some(cc) = &self.cc {
            parts.push(cc.to_string());
        }
        if let Some(fuel) = &self.fuel {
            parts.push(fuel.clone());
        }
        if let Some(tx) = &self.tx {
            parts.push(tx.clone());
        }
        parts.join(" · ")
    }
}

impl Ord for CascadeEntry {
    /// Model name first; the remaining fields only break ties so that equal
    /// model names still sort identically regardless of input order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.model
            .cmp(&other.model)
            .then_with(|| self.crsp.cmp(&other.crsp))
            .then_with(|| self.mn.cmp(&other.mn))
            .then_with(|| self.cc.cmp(&other.cc))
            .then_with(|| self.fuel.cmp(&other.fuel))
            .then_with(|| self.tx.cmp(&other.tx))
    }
}

impl PartialOrd for CascadeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
