// The kernel's tunable parameter record. Deserializable the way the rest of
// this codebase's config structs are: plain-data structs, derived `Deserialize`,
// defaults filled in by a constructor rather than by scattering literals
// through the algorithm.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::TrpError;

fn default_min_replacement_tier_size() -> usize {
    3
}

fn default_max_iterations() -> usize {
    10
}

fn default_util_position_name() -> String {
    "UTIL".to_string()
}

/// Every tunable named throughout the component design, threaded immutably
/// through every stage. Constructed once per run and never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    pub hitter_pitcher_split: f64,
    pub sp_rp_split: f64,
    pub hitter_category_weights: HashMap<String, f64>,
    pub sp_category_weights: HashMap<String, f64>,
    pub rp_category_weights: HashMap<String, f64>,
    pub pa_weights: HashMap<String, f64>,
    pub replacement_tier_pct: f64,
    #[serde(default = "default_min_replacement_tier_size")]
    pub min_replacement_tier_size: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub convergence_threshold: usize,
    pub bench_reserve: f64,
    #[serde(default = "default_util_position_name")]
    pub util_position_name: String,
}

impl BudgetConfig {
    /// League-agnostic defaults drawn from the component design's defaults
    /// section. Callers override individual fields (or deserialize a whole
    /// record from the host) before running the pipeline.
    pub fn defaults() -> Self {
        let hitter_category_weights = HashMap::from([
            ("R".to_string(), 0.125),
            ("HR".to_string(), 0.125),
            ("RBI".to_string(), 0.125),
            ("SBN".to_string(), 0.125),
            ("OBP".to_string(), 0.25),
            ("SLG".to_string(), 0.25),
        ]);
        let sp_category_weights = HashMap::from([
            ("K9".to_string(), 0.40),
            ("ERA".to_string(), 0.15),
            ("WHIP".to_string(), 0.15),
            ("OUTS".to_string(), 0.15),
            ("QS".to_string(), 0.15),
        ]);
        let rp_category_weights = HashMap::from([
            ("K9".to_string(), 0.40),
            ("ERA".to_string(), 0.15),
            ("WHIP".to_string(), 0.15),
            ("OUTS".to_string(), 0.15),
            ("SVHD".to_string(), 0.15),
        ]);
        let pa_weights = HashMap::from([
            ("C".to_string(), 500.0),
            ("1B".to_string(), 600.0),
            ("2B".to_string(), 600.0),
            ("3B".to_string(), 600.0),
            ("SS".to_string(), 600.0),
            ("LF".to_string(), 600.0),
            ("CF".to_string(), 600.0),
            ("RF".to_string(), 600.0),
            ("DH".to_string(), 600.0),
            ("UTIL".to_string(), 600.0),
        ]);

        BudgetConfig {
            hitter_pitcher_split: 0.70,
            sp_rp_split: 0.50,
            hitter_category_weights,
            sp_category_weights,
            rp_category_weights,
            pa_weights,
            replacement_tier_pct: 0.03,
            min_replacement_tier_size: default_min_replacement_tier_size(),
            max_iterations: default_max_iterations(),
            convergence_threshold: 0,
            bench_reserve: 0.0,
            util_position_name: default_util_position_name(),
        }
    }

    /// Validates internal consistency: weight maps must sum to 1.0 within
    /// tolerance, every weight must be non-negative, and the convergence
    /// parameters must be usable. Mirrors the shape of this codebase's own
    /// config validation: one check per field, first failure wins.
    pub fn validate(&self) -> Result<(), TrpError> {
        validate_weights("hitter_category_weights", &self.hitter_category_weights)?;
        validate_weights("sp_category_weights", &self.sp_category_weights)?;
        validate_weights("rp_category_weights", &self.rp_category_weights)?;

        if !(0.0..=1.0).contains(&self.hitter_pitcher_split) {
            return Err(TrpError::BadConfig {
                field: "hitter_pitcher_split".into(),
                message: format!("must be in [0.0, 1.0], got {}", self.hitter_pitcher_split),
            });
        }
        if !(0.0..=1.0).contains(&self.sp_rp_split) {
            return Err(TrpError::BadConfig {
                field: "sp_rp_split".into(),
                message: format!("must be in [0.0, 1.0], got {}", self.sp_rp_split),
            });
        }
        if self.replacement_tier_pct <= 0.0 {
            return Err(TrpError::BadConfig {
                field: "replacement_tier_pct".into(),
                message: format!("must be > 0, got {}", self.replacement_tier_pct),
            });
        }
        if self.min_replacement_tier_size == 0 {
            return Err(TrpError::BadConfig {
                field: "min_replacement_tier_size".into(),
                message: "must be > 0".into(),
            });
        }
        if self.max_iterations < 1 {
            return Err(TrpError::BadConfig {
                field: "max_iterations".into(),
                message: "must be >= 1".into(),
            });
        }
        if self.bench_reserve < 0.0 {
            return Err(TrpError::BadConfig {
                field: "bench_reserve".into(),
                message: format!("must be >= 0, got {}", self.bench_reserve),
            });
        }
        for (position, weight) in &self.pa_weights {
            if *weight <= 0.0 {
                return Err(TrpError::BadConfig {
                    field: format!("pa_weights.{position}"),
                    message: format!("must be > 0, got {weight}"),
                });
            }
        }

        Ok(())
    }
}

fn validate_weights(field: &str, weights: &HashMap<String, f64>) -> Result<(), TrpError> {
    if weights.is_empty() {
        return Err(TrpError::BadConfig {
            field: field.to_string(),
            message: "must not be empty".into(),
        });
    }
    for (category, weight) in weights {
        if *weight < 0.0 {
            return Err(TrpError::BadConfig {
                field: format!("{field}.{category}"),
                message: format!("weight must be >= 0, got {weight}"),
            });
        }
    }
    let sum: f64 = weights.values().sum();
    if (sum - 1.0).abs() > 1e-6 {
        return Err(TrpError::BadConfig {
            field: field.to_string(),
            message: format!("weights must sum to 1.0, got {sum}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        BudgetConfig::defaults().validate().unwrap();
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut cfg = BudgetConfig::defaults();
        cfg.hitter_category_weights.insert("R".into(), 0.5);
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, TrpError::BadConfig { field, .. } if field == "hitter_category_weights"));
    }

    #[test]
    fn rejects_negative_weight() {
        let mut cfg = BudgetConfig::defaults();
        cfg.sp_category_weights.insert("K9".into(), -0.1);
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, TrpError::BadConfig { .. }));
    }

    #[test]
    fn rejects_zero_max_iterations() {
        let mut cfg = BudgetConfig::defaults();
        cfg.max_iterations = 0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, TrpError::BadConfig { field, .. } if field == "max_iterations"));
    }

    #[test]
    fn rejects_out_of_range_split() {
        let mut cfg = BudgetConfig::defaults();
        cfg.hitter_pitcher_split = 1.5;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, TrpError::BadConfig { field, .. } if field == "hitter_pitcher_split"));
    }
}
