// Stage E: UTIL Pool Builder. Must run after every hitter position pool has
// converged (Stage D). Pulls together the hitters who fell short of their
// primary-position rostered tier, plus pure-DH players, and runs the same
// convergence loop on that pool alone.

use std::collections::{HashMap, HashSet};

use crate::config::BudgetConfig;
use crate::error::TrpError;

use super::convergence::converge_pools;
use super::model::{LeagueSettings, Player, PositionPool, Role, Tier};
use super::pool::build_single_pool;
use super::stats::category_set;

/// Builds the UTIL pool and converges it. Returns the converged pool; the
/// hitter position pools passed in are read-only here — their tier lists
/// are left untouched so a UTIL-elevated player's primary-position pool
/// membership survives for diagnostics, per the one legal duplication.
pub fn build_and_converge_util_pool(
    hitter_pools: &[PositionPool],
    players: &mut HashMap<String, Player>,
    league: &LeagueSettings,
    config: &BudgetConfig,
) -> Result<PositionPool, TrpError> {
    let mut candidate_ids: HashSet<String> = HashSet::new();
    for pool in hitter_pools {
        candidate_ids.extend(pool.replacement.iter().cloned());
        candidate_ids.extend(pool.below_replacement.iter().cloned());
    }
    for player in players.values() {
        if player.role == Role::Hitter && player.is_pure_dh() {
            candidate_ids.insert(player.id.clone());
        }
    }

    let mut ordered_ids: Vec<&String> = candidate_ids.iter().collect();
    ordered_ids.sort();
    let group: Vec<&Player> = ordered_ids
        .into_iter()
        .filter_map(|id| players.get(id))
        .collect();

    let roster_slots = league.total_slots(&config.util_position_name);
    let categories = category_set(Role::Hitter, league);

    let mut util_pool = build_single_pool(
        &config.util_position_name,
        Role::Hitter,
        &group,
        roster_slots,
        categories,
        config,
    )?;

    // Converging UTIL as its own pool reassigns `tier` for every candidate
    // it tracks, not just the ones it elevates — but a non-elevated
    // candidate's tier of record is still the one their primary-position
    // pool computed in Stage D. Snapshot it here and restore it below for
    // everyone except the players UTIL actually rosters.
    let original_tier: HashMap<String, Option<Tier>> = util_pool
        .all_ids()
        .iter()
        .filter_map(|id| players.get(id).map(|p| (id.clone(), p.computed.tier)))
        .collect();

    let mut singleton = vec![util_pool.clone()];
    converge_pools(&mut singleton, players, league, config)?;
    util_pool = singleton.into_iter().next().expect("singleton always has one element");

    let rostered: HashSet<&String> = util_pool.rostered.iter().collect();
    for (id, tier) in &original_tier {
        if rostered.contains(id) {
            continue;
        }
        if let Some(player) = players.get_mut(id) {
            player.computed.tier = *tier;
        }
    }
    for id in &util_pool.rostered {
        if let Some(player) = players.get_mut(id) {
            player.computed.util_rostered = true;
            player.computed.tier = Some(Tier::Rostered);
        }
    }

    tracing::debug!(
        rostered = util_pool.rostered.len(),
        candidates = util_pool.rostered.len() + util_pool.replacement.len() + util_pool.below_replacement.len(),
        "stage E: built and converged UTIL pool"
    );
    Ok(util_pool)
}
