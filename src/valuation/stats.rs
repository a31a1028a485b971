// Population statistics and Z-score standardization, plus the one place the
// category set for a role is decided (the "category-set resolver" the design
// notes call for: nowhere else hardcodes a category list).

use std::collections::HashSet;

use super::model::{LeagueSettings, Role};

/// Below this stdev a category is treated as degenerate (invariant 4: forced
/// to Z = 0 rather than dividing by a near-zero number).
const STDEV_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Population mean/stdev (divide by N, not N-1) over a slice of values for
/// one category across a pool's rostered tier.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats { mean: 0.0, stdev: 0.0 };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Raw Z for a single value against rostered-tier stats, honoring category
/// inversion (ERA, WHIP: lower is better, so the sign flips).
pub fn compute_raw_z(value: f64, stats: &PoolStats, inverted: bool) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    if inverted {
        (stats.mean - value) / stats.stdev
    } else {
        (value - stats.mean) / stats.stdev
    }
}

/// The category set a pool of this role standardizes over. Falls back to the
/// component design's defaults when the league doesn't name its own
/// categories, but a configured league's `batting_categories` /
/// `pitching_categories` take precedence so this stays data-driven rather
/// than a second hardcoded list.
pub fn category_set(role: Role, league: &LeagueSettings) -> Vec<String> {
    match role {
        Role::Hitter => {
            if league.batting_categories.is_empty() {
                vec!["R", "HR", "RBI", "SBN", "OBP", "SLG"]
                    .into_iter()
                    .map(String::from)
                    .collect()
            } else {
                league.batting_categories.clone()
            }
        }
        Role::Sp => {
            if league.pitching_categories.is_empty() {
                vec!["ERA", "WHIP", "K9", "QS", "OUTS"]
                    .into_iter()
                    .map(String::from)
                    .collect()
            } else {
                league.pitching_categories.clone()
            }
        }
        Role::Rp => {
            if league.pitching_categories.is_empty() {
                vec!["ERA", "WHIP", "K9", "SVHD", "OUTS"]
                    .into_iter()
                    .map(String::from)
                    .collect()
            } else {
                // Dedupe while preserving input order: this list becomes
                // `pool.categories`, which drives deterministic summation
                // order everywhere downstream (total_z, total_dollars).
                let mut seen: HashSet<&str> = HashSet::new();
                let mut categories: Vec<String> = Vec::new();
                for c in league.pitching_categories.iter().filter(|c| c.as_str() != "QS") {
                    if seen.insert(c.as_str()) {
                        categories.push(c.clone());
                    }
                }
                if seen.insert("SVHD") {
                    categories.push("SVHD".to_string());
                }
                categories
            }
        }
    }
}
