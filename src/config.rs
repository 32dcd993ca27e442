use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ProteoError;

// ---------------------------------------------------------------------------
// Run settings
// ---------------------------------------------------------------------------

/// Everything about a run that is not an input file or a MW range.
///
/// Every field has a default, so a JSON config only needs the keys it
/// overrides:
///
/// ```json
/// { "columns": { "ratio": "ratio_g2_vs_g1" }, "top_n": 20 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub columns: ColumnRoles,
    /// Sheet read from workbook inputs.
    pub input_sheet: String,
    pub contaminants: ContaminantTags,
    pub threshold: Threshold,
    pub sentinels: Sentinels,
    /// Length of the "best ratio" table and highlight series.
    pub top_n: usize,
    pub plot: PlotSettings,
}

/// Maps a logical role to the column name used by the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRoles {
    pub accession: String,
    pub molecular_weight: String,
    pub ratio: String,
    pub p_value: String,
}

/// Accession substrings used to tell contaminants from target proteins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContaminantTags {
    pub human: String,
    pub mouse: String,
    pub target: String,
}

/// A pull-down row is significant when `p_value <= max_p_value` and
/// `ratio > min_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Threshold {
    pub max_p_value: f64,
    pub min_ratio: f64,
}

/// Plot coordinates substituted for zero / infinite log values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentinels {
    pub ratio_log2_floor: f64,
    pub neg_log10_p_ceiling: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            accession: "accession".into(),
            molecular_weight: "MW".into(),
            ratio: "ratio_g1_vs_g2".into(),
            p_value: "t-test_g1_vs_g2".into(),
        }
    }
}

impl Default for ContaminantTags {
    fn default() -> Self {
        Self {
            human: "HUMAN".into(),
            mouse: "MOUSE".into(),
            target: "MYC".into(),
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self {
            max_p_value: 0.05,
            min_ratio: 2.0,
        }
    }
}

impl Threshold {
    pub fn passes(&self, ratio: f64, p_value: f64) -> bool {
        p_value <= self.max_p_value && ratio > self.min_ratio
    }
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            ratio_log2_floor: -7.78,
            neg_log10_p_ceiling: 6.0,
        }
    }
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            width: 1100,
            height: 800,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: ColumnRoles::default(),
            input_sheet: "Protein sets".into(),
            contaminants: ContaminantTags::default(),
            threshold: Threshold::default(),
            sentinels: Sentinels::default(),
            top_n: 15,
            plot: PlotSettings::default(),
        }
    }
}

impl Settings {
    /// Read a JSON settings file. Missing keys keep their default.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("parsing settings file {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Threshold values must have a finite logarithm, since they place the
    /// volcano guide lines.
    pub fn validate(&self) -> std::result::Result<(), ProteoError> {
        let positive = |key: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ProteoError::InvalidSetting {
                    key: key.to_string(),
                    reason: format!("must be a positive number, got {v}"),
                })
            }
        };
        positive("threshold.max_p_value", self.threshold.max_p_value)?;
        positive("threshold.min_ratio", self.threshold.min_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_settings_match_lab_defaults() {
        let s = Settings::default();
        assert_eq!(s.columns.accession, "accession");
        assert_eq!(s.columns.molecular_weight, "MW");
        assert_eq!(s.columns.p_value, "t-test_g1_vs_g2");
        assert_eq!(s.input_sheet, "Protein sets");
        assert_eq!(s.threshold.max_p_value, 0.05);
        assert_eq!(s.threshold.min_ratio, 2.0);
        assert_eq!(s.sentinels.ratio_log2_floor, -7.78);
        assert_eq!(s.sentinels.neg_log10_p_ceiling, 6.0);
        assert_eq!(s.top_n, 15);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let s = Settings::from_json_str(
            r#"{ "columns": { "ratio": "ratio_g2_vs_g1" }, "threshold": { "min_ratio": 4 } }"#,
        )
        .unwrap();
        assert_eq!(s.columns.ratio, "ratio_g2_vs_g1");
        assert_eq!(s.columns.accession, "accession");
        assert_eq!(s.threshold.min_ratio, 4.0);
        assert_eq!(s.threshold.max_p_value, 0.05);
        assert_eq!(s.top_n, 15);
        assert_eq!(s.input_sheet, "Protein sets");
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        for json in [
            r#"{ "threshold": { "min_ratio": 0 } }"#,
            r#"{ "threshold": { "min_ratio": -1.5 } }"#,
            r#"{ "threshold": { "max_p_value": 0 } }"#,
        ] {
            let err = Settings::from_json_str(json).unwrap_err();
            let core = err.downcast_ref::<ProteoError>().expect("typed error");
            assert_eq!(core.kind(), crate::error::ErrorKind::InputValidation, "{json}");
            assert!(core.to_string().contains("threshold."), "{json}");
        }
    }

    #[test]
    fn explicit_top_level_values_win() {
        let s = Settings::from_json_str(r#"{ "top_n": 5, "input_sheet": "Proteins" }"#).unwrap();
        assert_eq!(s.top_n, 5);
        assert_eq!(s.input_sheet, "Proteins");
    }
}
