// Stage H: Validator / Normalizer. Checks the conservation laws the rest of
// the pipeline is supposed to preserve and rescales rostered dollar totals
// to match the league budget when rounding drift pushes the sum outside
// tolerance.

use std::collections::HashMap;

use crate::error::TrpError;

use super::model::{LeagueBudget, Player, PositionPool, Tier};

const BUDGET_BALANCE_TOLERANCE: f64 = 1.0;
const RLP_SANITY_TOLERANCE: f64 = 0.5;

/// Non-fatal observations surfaced after validation. Callers typically just
/// log these; they don't change the run's success/failure outcome.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

/// Runs every check in §4.7. Returns `Err` only for conditions the error
/// taxonomy treats as aborting (orphan players, a scaling attempt with
/// nothing to scale); everything else becomes a warning on the report.
pub fn validate_and_normalize(
    pools: &mut [PositionPool],
    players: &mut HashMap<String, Player>,
    league_budget: &LeagueBudget,
) -> Result<ValidationReport, TrpError> {
    let mut report = ValidationReport::default();

    check_no_orphans(players)?;
    check_tier_disjointness(pools, &mut report);
    check_tier_sizes(pools, &mut report);
    check_rlp_sanity(pools, players, &mut report);
    check_dollar_sanity(pools, players, &mut report);
    balance_budget(pools, players, league_budget, &mut report)?;

    Ok(report)
}

fn check_no_orphans(players: &HashMap<String, Player>) -> Result<(), TrpError> {
    let orphans: Vec<String> = players
        .values()
        .filter(|p| p.computed.tier.is_none())
        .map(|p| p.id.clone())
        .collect();
    if !orphans.is_empty() {
        return Err(TrpError::MalformedInput {
            ids: orphans,
            message: "player(s) never assigned to a pool tier".to_string(),
        });
    }
    Ok(())
}

fn check_tier_disjointness(pools: &[PositionPool], report: &mut ValidationReport) {
    for pool in pools {
        let mut seen = std::collections::HashSet::new();
        for id in pool.rostered.iter().chain(pool.replacement.iter()).chain(pool.below_replacement.iter()) {
            if !seen.insert(id) {
                report.warnings.push(format!(
                    "pool {} ({:?}): player {id} appears in more than one tier",
                    pool.position, pool.role
                ));
            }
        }
    }
}

fn check_tier_sizes(pools: &[PositionPool], report: &mut ValidationReport) {
    for pool in pools {
        let available = pool.rostered.len() + pool.replacement.len() + pool.below_replacement.len();
        let expected = pool.roster_slots.min(available);
        if pool.rostered.len() != expected {
            report.warnings.push(format!(
                "pool {} ({:?}): expected {} rostered, found {}",
                pool.position,
                pool.role,
                expected,
                pool.rostered.len()
            ));
        }
    }
}

fn check_rlp_sanity(pools: &[PositionPool], players: &HashMap<String, Player>, report: &mut ValidationReport) {
    for pool in pools {
        if pool.replacement.is_empty() {
            continue;
        }
        let values: Vec<f64> = pool
            .replacement
            .iter()
            .filter_map(|id| players.get(id))
            .map(|p| p.computed.total_z)
            .collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        if mean.abs() >= RLP_SANITY_TOLERANCE {
            report.warnings.push(format!(
                "pool {} ({:?}): replacement-tier mean total_z = {mean:.4}, expected near 0",
                pool.position, pool.role
            ));
            tracing::warn!(pool = %pool.position, mean, "RLP sanity check failed");
        }
    }
}

fn check_dollar_sanity(pools: &[PositionPool], players: &HashMap<String, Player>, report: &mut ValidationReport) {
    for pool in pools {
        for id in &pool.rostered {
            if let Some(player) = players.get(id) {
                if player.computed.total_dollars < 0.0 {
                    report.warnings.push(format!(
                        "rostered player {id} in pool {} has negative total_dollars ({:.2})",
                        pool.position, player.computed.total_dollars
                    ));
                    tracing::warn!(player = %id, pool = %pool.position, dollars = player.computed.total_dollars, "negative rostered dollar value");
                }
            }
        }
    }
}

fn balance_budget(
    pools: &[PositionPool],
    players: &mut HashMap<String, Player>,
    league_budget: &LeagueBudget,
    report: &mut ValidationReport,
) -> Result<(), TrpError> {
    let mut rostered_ids: Vec<&String> = pools.iter().flat_map(|p| p.rostered.iter()).collect();
    rostered_ids.sort();

    let sum: f64 = rostered_ids.iter().filter_map(|id| players.get(*id)).map(|p| p.computed.total_dollars).sum();
    let diff = sum - league_budget.total;

    if diff.abs() <= BUDGET_BALANCE_TOLERANCE {
        return Ok(());
    }

    if sum.abs() < 1e-9 {
        return Err(TrpError::BadConfig {
            field: "league_budget.total".into(),
            message: "cannot rescale rostered dollars: rostered total is zero".to_string(),
        });
    }

    let factor = league_budget.total / sum;
    for id in rostered_ids {
        if let Some(player) = players.get_mut(id) {
            player.computed.total_dollars *= factor;
            for value in player.computed.dollar_values.values_mut() {
                *value *= factor;
            }
        }
    }
    report.warnings.push(format!(
        "rostered dollar total {sum:.2} outside ±${BUDGET_BALANCE_TOLERANCE} of league budget {:.2}; rescaled by {factor:.6}",
        league_budget.total
    ));
    tracing::warn!(sum, total = league_budget.total, factor, "rescaled rostered dollars to balance budget");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::model::{CategoryBudgets, HitterStats, PlayerStats, Role};

    fn league_budget(total: f64) -> LeagueBudget {
        LeagueBudget {
            total,
            hitter_budget: total,
            pitcher_budget: 0.0,
            sp_budget: 0.0,
            rp_budget: 0.0,
            category_budgets: CategoryBudgets::default(),
        }
    }

    fn rostered_hitter(id: &str, dollars: f64) -> Player {
        let mut p = Player::new(
            id,
            id,
            "TST",
            vec!["2B".into()],
            Role::Hitter,
            PlayerStats::Hitter(HitterStats {
                pa: 0.0,
                ab: 0.0,
                r: 0.0,
                hr: 0.0,
                rbi: 0.0,
                sbn: 0.0,
                obp: 0.0,
                slg: 0.0,
                wrc_plus: 0.0,
            }),
        );
        p.computed.tier = Some(Tier::Rostered);
        p.computed.total_dollars = dollars;
        p.computed.dollar_values.insert("R".to_string(), dollars);
        p
    }

    #[test]
    fn orphan_player_is_an_error() {
        let mut players = HashMap::new();
        players.insert("a".to_string(), rostered_hitter("a", 10.0));
        players.get_mut("a").unwrap().computed.tier = None;
        let mut pools = vec![];
        let budget = league_budget(10.0);
        let err = validate_and_normalize(&mut pools, &mut players, &budget).unwrap_err();
        assert!(matches!(err, TrpError::MalformedInput { .. }));
    }

    #[test]
    fn within_tolerance_is_not_rescaled() {
        let mut players = HashMap::new();
        players.insert("a".to_string(), rostered_hitter("a", 100.5));
        let mut pool = PositionPool::new("2B", Role::Hitter, 1, vec!["R".to_string()]);
        pool.rostered = vec!["a".into()];
        let mut pools = vec![pool];
        let budget = league_budget(100.0);
        validate_and_normalize(&mut pools, &mut players, &budget).unwrap();
        assert_eq!(players["a"].computed.total_dollars, 100.5);
    }

    #[test]
    fn out_of_tolerance_rescales_to_match_budget() {
        let mut players = HashMap::new();
        players.insert("a".to_string(), rostered_hitter("a", 50.0));
        players.insert("b".to_string(), rostered_hitter("b", 50.0));
        let mut pool = PositionPool::new("2B", Role::Hitter, 2, vec!["R".to_string()]);
        pool.rostered = vec!["a".into(), "b".into()];
        let mut pools = vec![pool];
        let budget = league_budget(200.0);
        let report = validate_and_normalize(&mut pools, &mut players, &budget).unwrap();
        let sum: f64 = players.values().map(|p| p.computed.total_dollars).sum();
        assert!((sum - 200.0).abs() < 1e-6);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn negative_rostered_dollars_warns() {
        let mut players = HashMap::new();
        players.insert("a".to_string(), rostered_hitter("a", -5.0));
        let mut pool = PositionPool::new("2B", Role::Hitter, 1, vec!["R".to_string()]);
        pool.rostered = vec!["a".into()];
        let mut pools = vec![pool];
        let budget = league_budget(-5.0);
        let report = validate_and_normalize(&mut pools, &mut players, &budget).unwrap();
        assert!(report.warnings.iter().any(|w| w.contains("negative total_dollars")));
    }
}
