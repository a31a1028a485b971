// Stage D: Convergence Engine. Tier membership and Z-scores are mutually
// defined — rostered-tier statistics anchor Z, Z determines total_z
// rankings, and rankings redefine tier membership. This stage resolves the
// circularity by fixed-point iteration with a deterministic tie-break
// (`total_z` desc, `id` asc) and a hard iteration cap.

use std::collections::{HashMap, HashSet};

use crate::config::BudgetConfig;
use crate::error::TrpError;

use super::model::{LeagueSettings, Player, PositionPool};
use super::pool::split_ids_into_tiers;
use super::stats::compute_pool_stats;

/// Runs the convergence loop over every pool in `pools` until no pool's
/// rostered-tier membership changes between iterations, or `max_iterations`
/// is reached. Mutates each player's `raw_z` / `normalized_z` / `total_z` and
/// each pool's tier lists and per-category statistics in place.
///
/// Returns `Ok(true)` if the loop converged before hitting the cap; `Ok(false)`
/// is a convergence-exhaustion warning, not an error — the caller logs it and
/// keeps the last computed state. A non-finite Z anywhere in a pool aborts the
/// run with `TrpError::NumericalFailure`.
pub fn converge_pools(
    pools: &mut [PositionPool],
    players: &mut HashMap<String, Player>,
    league: &LeagueSettings,
    config: &BudgetConfig,
) -> Result<bool, TrpError> {
    let mut previous_rostered: Vec<HashSet<String>> =
        pools.iter().map(|p| p.rostered.iter().cloned().collect()).collect();

    for iteration in 0..config.max_iterations {
        let mut total_changes = 0usize;

        for (pool_idx, pool) in pools.iter_mut().enumerate() {
            run_one_iteration(pool, players, league, config)?;

            let current_rostered: HashSet<String> = pool.rostered.iter().cloned().collect();
            if current_rostered != previous_rostered[pool_idx] {
                total_changes += 1;
            }
            previous_rostered[pool_idx] = current_rostered;
        }

        tracing::debug!(iteration, total_changes, "stage D: convergence iteration");
        if total_changes <= config.convergence_threshold {
            return Ok(true);
        }
        // Last iteration exhausted the cap with outstanding changes.
        if iteration + 1 == config.max_iterations {
            tracing::warn!(
                pools = pools.len(),
                max_iterations = config.max_iterations,
                "convergence exhausted before stabilizing; emitting current state"
            );
            return Ok(false);
        }
    }
    Ok(true)
}

fn run_one_iteration(
    pool: &mut PositionPool,
    players: &mut HashMap<String, Player>,
    league: &LeagueSettings,
    config: &BudgetConfig,
) -> Result<(), TrpError> {
    // 1. Rostered-tier means/stdevs per category (population stdev).
    let mut rostered_ids: Vec<&String> = pool.rostered.iter().collect();
    rostered_ids.sort();

    for category in &pool.categories {
        let values: Vec<f64> = rostered_ids
            .iter()
            .filter_map(|id| players.get(*id))
            .filter_map(|p| p.category_value(category))
            .collect();
        let stats = compute_pool_stats(&values);
        pool.rostered_tier_means.insert(category.clone(), stats.mean);
        pool.rostered_tier_stdevs.insert(category.clone(), stats.stdev);
    }

    // 2. Raw Z for every player in the pool's full union.
    let all_ids: Vec<String> = {
        let mut ids: Vec<String> = pool
            .rostered
            .iter()
            .chain(pool.replacement.iter())
            .chain(pool.below_replacement.iter())
            .cloned()
            .collect();
        ids.sort();
        ids
    };

    for id in &all_ids {
        for category in &pool.categories {
            let mean = pool.rostered_tier_means.get(category).copied().unwrap_or(0.0);
            let stdev = pool.rostered_tier_stdevs.get(category).copied().unwrap_or(0.0);
            let Some(player) = players.get_mut(id) else { continue };
            let value = player.category_value(category).unwrap_or(0.0);
            let inverted = league.inverted_categories.contains(category);
            let z = if stdev.abs() < 1e-9 {
                0.0
            } else if inverted {
                (mean - value) / stdev
            } else {
                (value - mean) / stdev
            };
            if !z.is_finite() {
                return Err(TrpError::NumericalFailure {
                    player_id: player.id.clone(),
                    pool: pool.position.clone(),
                    category: category.clone(),
                });
            }
            player.computed.raw_z.insert(category.clone(), z);
        }
    }

    // 3. RLP baseline: mean raw_z over the replacement tier, per category.
    let mut replacement_ids: Vec<&String> = pool.replacement.iter().collect();
    replacement_ids.sort();
    for category in &pool.categories {
        let values: Vec<f64> = replacement_ids
            .iter()
            .filter_map(|id| players.get(*id))
            .map(|p| p.computed.raw_z.get(category).copied().unwrap_or(0.0))
            .collect();
        let avg = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        pool.rlp_raw_z_avg.insert(category.clone(), avg);
    }

    // 4. Normalized Z and total_z.
    for id in &all_ids {
        let Some(player) = players.get_mut(id) else { continue };
        let mut total = 0.0;
        for category in &pool.categories {
            let raw = player.computed.raw_z.get(category).copied().unwrap_or(0.0);
            let baseline = pool.rlp_raw_z_avg.get(category).copied().unwrap_or(0.0);
            let normalized = raw - baseline;
            if !normalized.is_finite() {
                return Err(TrpError::NumericalFailure {
                    player_id: player.id.clone(),
                    pool: pool.position.clone(),
                    category: category.clone(),
                });
            }
            player.computed.normalized_z.insert(category.clone(), normalized);
            total += normalized;
        }
        player.computed.total_z = total;
    }

    // 5. Re-rank by total_z desc, id asc, and reassign tiers.
    let mut ranked: Vec<(String, f64)> = all_ids
        .iter()
        .map(|id| (id.clone(), players.get(id).map(|p| p.computed.total_z).unwrap_or(0.0)))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let (rostered, replacement, below_replacement) = split_ids_into_tiers(
        &ranked,
        pool.roster_slots,
        config.replacement_tier_pct,
        config.min_replacement_tier_size,
    );

    for id in &rostered {
        if let Some(player) = players.get_mut(id) {
            player.computed.tier = Some(super::model::Tier::Rostered);
        }
    }
    for id in &replacement {
        if let Some(player) = players.get_mut(id) {
            player.computed.tier = Some(super::model::Tier::Replacement);
        }
    }
    for id in &below_replacement {
        if let Some(player) = players.get_mut(id) {
            player.computed.tier = Some(super::model::Tier::BelowReplacement);
        }
    }

    pool.rostered = rostered;
    pool.replacement = replacement;
    pool.below_replacement = below_replacement;
    Ok(())
}
