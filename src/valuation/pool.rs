// Stage C: Pool Builder. Forms each position's (or pitcher role's) initial
// rostered tier and percentage-band replacement tier from the composite
// metric computed in Stage A/B. The same routine builds hitter pools and the
// single SP/RP pools — the open question about `BUILD_SINGLE_POOL` having
// its own tier-sizing rule is resolved by sharing this one implementation.

use std::collections::HashMap;

use crate::config::BudgetConfig;
use crate::error::TrpError;

use super::model::{LeagueSettings, Player, PositionPool, Role};
use super::stats::category_set;

/// Sorts player ids by composite metric descending, `id` ascending on ties —
/// the deterministic order every subsequent ranking operation depends on.
fn sorted_by_composite_metric<'a>(players: &'a [&'a Player]) -> Vec<&'a Player> {
    let mut sorted: Vec<&Player> = players.to_vec();
    sorted.sort_by(|a, b| {
        b.composite_metric()
            .partial_cmp(&a.composite_metric())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted
}

/// Splits a metric-sorted player list into rostered / replacement /
/// below-replacement tiers using the percentage-band rule, with a
/// minimum-size fallback for the replacement tier.
fn split_into_tiers(
    sorted: &[&Player],
    roster_slots: usize,
    replacement_tier_pct: f64,
    min_replacement_tier_size: usize,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let pairs: Vec<(String, f64)> = sorted.iter().map(|p| (p.id.clone(), p.composite_metric())).collect();
    split_ids_into_tiers(&pairs, roster_slots, replacement_tier_pct, min_replacement_tier_size)
}

/// Splits an already metric-sorted-descending `(id, metric)` list into tiers
/// using the percentage-band rule. Shared by the initial Pool Builder
/// (ranking on the composite metric) and the Convergence Engine (ranking on
/// `total_z`), per the design decision that both use identical tier-sizing
/// logic.
pub fn split_ids_into_tiers(
    sorted: &[(String, f64)],
    roster_slots: usize,
    replacement_tier_pct: f64,
    min_replacement_tier_size: usize,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let rostered_count = roster_slots.min(sorted.len());
    let rostered: Vec<String> = sorted[..rostered_count].iter().map(|(id, _)| id.clone()).collect();

    if rostered_count == sorted.len() {
        return (rostered, Vec::new(), Vec::new());
    }

    let last_rostered_metric = sorted[rostered_count - 1].1;
    let threshold = last_rostered_metric - last_rostered_metric.abs() * replacement_tier_pct;

    let rest = &sorted[rostered_count..];
    let mut replacement_count = rest.iter().take_while(|(_, m)| *m >= threshold).count();
    if replacement_count < min_replacement_tier_size {
        replacement_count = min_replacement_tier_size.min(rest.len());
    }

    let replacement: Vec<String> = rest[..replacement_count].iter().map(|(id, _)| id.clone()).collect();
    let below_replacement: Vec<String> = rest[replacement_count..].iter().map(|(id, _)| id.clone()).collect();

    (rostered, replacement, below_replacement)
}

/// Builds one pool for a `(position, role)` group of players already
/// narrowed to that primary position/role.
pub fn build_single_pool(
    position: &str,
    role: Role,
    group: &[&Player],
    roster_slots: usize,
    categories: Vec<String>,
    config: &BudgetConfig,
) -> Result<PositionPool, TrpError> {
    if group.len() < roster_slots {
        return Err(TrpError::InsufficientPool {
            position: position.to_string(),
            needed: roster_slots,
            available: group.len(),
        });
    }

    let sorted = sorted_by_composite_metric(group);
    let (rostered, replacement, below_replacement) = split_into_tiers(
        &sorted,
        roster_slots,
        config.replacement_tier_pct,
        config.min_replacement_tier_size,
    );

    let mut pool = PositionPool::new(position, role, roster_slots, categories);
    pool.rostered = rostered;
    pool.replacement = replacement;
    pool.below_replacement = below_replacement;
    Ok(pool)
}

/// Builds every hitter position pool plus the SP and RP pools. Does not
/// build the UTIL pool — that's Stage E, and it depends on these pools
/// having already converged (Stage D).
pub fn build_position_pools(
    players: &[Player],
    league: &LeagueSettings,
    config: &BudgetConfig,
) -> Result<Vec<PositionPool>, TrpError> {
    let mut by_position: HashMap<(String, Role), Vec<&Player>> = HashMap::new();
    for player in players {
        let Some(position) = &player.computed.primary_position else {
            continue;
        };
        if position == &config.util_position_name {
            continue;
        }
        by_position
            .entry((position.clone(), player.role))
            .or_default()
            .push(player);
    }

    let mut positions: Vec<(String, Role)> = by_position.keys().cloned().collect();
    positions.sort();

    let mut pools = Vec::with_capacity(positions.len());
    for (position, role) in positions {
        let group = &by_position[&(position.clone(), role)];
        let roster_slots = match role {
            Role::Hitter => league.total_slots(&position),
            Role::Sp | Role::Rp => league.total_slots(&position),
        };
        if roster_slots == 0 {
            continue;
        }
        let categories = category_set(role, league);
        pools.push(build_single_pool(&position, role, group, roster_slots, categories, config)?);
    }

    tracing::debug!(pools = pools.len(), "stage C: built position pools");
    Ok(pools)
}
