// The TRP valuation kernel: a staged pipeline that turns normalized player
// projections and league rules into market-calibrated auction dollar values.
//
// Stages run in a fixed order (A -> B -> C -> D(hitters) -> E -> D(pitchers)
// -> F -> G -> H); the Convergence Engine (D) is the only cyclic piece, and
// it runs twice -- once to settle the hitter position pools before the UTIL
// pool can be built from their leftovers, once to settle the pitcher role
// pools, which don't feed into UTIL at all.

pub mod budget;
pub mod convergence;
pub mod dollars;
pub mod model;
pub mod normalize;
pub mod pool;
pub mod position;
pub mod stats;
pub mod util_pool;
pub mod validate;

use std::collections::HashMap;

use crate::config::BudgetConfig;

use model::{LeagueSettings, Player, PositionPool, Role};
use normalize::{RawHitterRecord, RawPitcherRecord};
use validate::ValidationReport;

/// Everything the orchestration entry point hands back: every valued
/// player, every pool's diagnostics (position pools plus the UTIL pool),
/// the league budget they were priced against, and the non-fatal warnings
/// the Validator collected along the way.
pub struct ValuationResult {
    pub players: Vec<Player>,
    pub pools: Vec<PositionPool>,
    pub league_budget: model::LeagueBudget,
    pub report: ValidationReport,
}

/// Runs the full kernel over raw upstream records. This is the only
/// function outside the stage modules that knows the stage order; each
/// stage function below is a short, linear call with no branching logic
/// beyond dispatching hitters and pitchers to the right pools.
pub fn run_pipeline(
    hitters: &[RawHitterRecord],
    pitchers: &[RawPitcherRecord],
    league: &LeagueSettings,
    config: &BudgetConfig,
) -> anyhow::Result<ValuationResult> {
    config.validate()?;

    // Stage A: Normalizer.
    let mut players = normalize::normalize_all(hitters, pitchers)?;

    // Stage B: Primary-Position Assigner.
    position::assign_primary_positions(&mut players, league);

    // Stage C: Pool Builder (hitter position pools + SP/RP pools).
    let mut pools = pool::build_position_pools(&players, league, config)?;

    let mut players_by_id: HashMap<String, Player> =
        players.into_iter().map(|p| (p.id.clone(), p)).collect();

    let mut hitter_pool_idxs: Vec<usize> = Vec::new();
    let mut pitcher_pool_idxs: Vec<usize> = Vec::new();
    for (i, p) in pools.iter().enumerate() {
        match p.role {
            Role::Hitter => hitter_pool_idxs.push(i),
            Role::Sp | Role::Rp => pitcher_pool_idxs.push(i),
        }
    }

    // Stage D (hitters): converge hitter position pools before UTIL can
    // see which players fell into their replacement/below-replacement tiers.
    {
        let mut hitter_pools: Vec<PositionPool> =
            hitter_pool_idxs.iter().map(|&i| pools[i].clone()).collect();
        let converged = convergence::converge_pools(&mut hitter_pools, &mut players_by_id, league, config)?;
        if !converged {
            tracing::warn!("hitter position pools did not converge within max_iterations");
        }
        for (slot, &i) in hitter_pool_idxs.iter().enumerate() {
            pools[i] = hitter_pools[slot].clone();
        }
    }

    // Stage E: UTIL Pool Builder. Must observe the post-convergence hitter
    // tiers computed above; runs its own convergence pass internally.
    let hitter_pools_snapshot: Vec<PositionPool> = hitter_pool_idxs.iter().map(|&i| pools[i].clone()).collect();
    let util_pool = util_pool::build_and_converge_util_pool(&hitter_pools_snapshot, &mut players_by_id, league, config)?;

    // Stage D (pitchers): SP and RP never interact with hitter pools or
    // UTIL, so they converge independently.
    {
        let mut pitcher_pools: Vec<PositionPool> =
            pitcher_pool_idxs.iter().map(|&i| pools[i].clone()).collect();
        let converged = convergence::converge_pools(&mut pitcher_pools, &mut players_by_id, league, config)?;
        if !converged {
            tracing::warn!("pitcher role pools did not converge within max_iterations");
        }
        for (slot, &i) in pitcher_pool_idxs.iter().enumerate() {
            pools[i] = pitcher_pools[slot].clone();
        }
    }

    pools.push(util_pool);

    // Stage F: Budget Allocator. The UTIL pool is a hitter pool too (it
    // competes for the same hitter category budgets as every other position).
    let league_budget = budget::compute_league_budget(league, config);
    let (hitter_idxs, pitcher_idxs): (Vec<usize>, Vec<usize>) =
        (0..pools.len()).partition(|&i| pools[i].role == Role::Hitter);

    let mut hitter_pools: Vec<PositionPool> = hitter_idxs.iter().map(|&i| pools[i].clone()).collect();
    budget::allocate_hitter_pool_budgets(&mut hitter_pools, &players_by_id, &league_budget, config);
    for (slot, &i) in hitter_idxs.iter().enumerate() {
        pools[i] = hitter_pools[slot].clone();
    }

    for &i in &pitcher_idxs {
        budget::allocate_pitcher_pool_budget(&mut pools[i], &league_budget, config);
    }

    // Stage G: Dollar Translator.
    for pool in pools.iter_mut() {
        dollars::translate_pool_dollars(pool, &mut players_by_id)?;
    }

    // Stage H: Validator / Normalizer.
    let report = validate::validate_and_normalize(&mut pools, &mut players_by_id, &league_budget)?;

    let mut players: Vec<Player> = players_by_id.into_values().collect();
    players.sort_by(|a, b| a.id.cmp(&b.id));

    tracing::info!(
        players = players.len(),
        pools = pools.len(),
        league_total = league_budget.total,
        warnings = report.warnings.len(),
        "valuation kernel run complete"
    );

    Ok(ValuationResult {
        players,
        pools,
        league_budget,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::model::Role as R;
    use std::collections::HashSet;

    fn hitter(id: &str, pos: &str, wrc_plus: f64) -> RawHitterRecord {
        RawHitterRecord {
            id: id.into(),
            name: id.into(),
            team: "TST".into(),
            positions: vec![pos.into()],
            pa: 600.0,
            ab: 540.0,
            r: wrc_plus * 0.7,
            hr: wrc_plus * 0.2,
            rbi: wrc_plus * 0.7,
            sb: 10.0,
            cs: 2.0,
            obp: 0.300 + wrc_plus / 1000.0,
            slg: 0.400 + wrc_plus / 1000.0,
            wrc_plus,
        }
    }

    fn pitcher(id: &str, role: R, fip: f64) -> RawPitcherRecord {
        RawPitcherRecord {
            id: id.into(),
            name: id.into(),
            team: "TST".into(),
            positions: vec![if role == R::Sp { "SP".into() } else { "RP".into() }],
            role,
            outs: None,
            ip: Some(180.0),
            era: fip,
            whip: 1.10,
            k9: 9.0,
            qs: 15.0,
            sv: if role == R::Rp { 20.0 } else { 0.0 },
            hld: 0.0,
            svhd: None,
            fip,
        }
    }

    fn small_league() -> LeagueSettings {
        LeagueSettings {
            num_teams: 2,
            budget_per_team: 260.0,
            roster_slots: HashMap::from([
                ("C".to_string(), 1),
                ("SS".to_string(), 1),
                ("UTIL".to_string(), 1),
                ("SP".to_string(), 2),
                ("RP".to_string(), 2),
            ]),
            batting_categories: vec![],
            pitching_categories: vec![],
            inverted_categories: HashSet::from(["ERA".to_string(), "WHIP".to_string()]),
        }
    }

    /// End-to-end smoke test: runs the whole pipeline over a small league
    /// and checks the conservation laws hold, mirroring scenario S5.
    #[test]
    fn full_pipeline_balances_budget_and_fills_rosters() {
        let league = small_league();
        let config = BudgetConfig::defaults();

        let hitters: Vec<RawHitterRecord> = (0..6)
            .map(|i| hitter(&format!("c{i}"), "C", 130.0 - i as f64 * 5.0))
            .chain((0..6).map(|i| hitter(&format!("ss{i}"), "SS", 140.0 - i as f64 * 4.0)))
            .chain((0..4).map(|i| hitter(&format!("dh{i}"), "DH", 120.0 - i as f64 * 3.0)))
            .collect();
        let pitchers: Vec<RawPitcherRecord> = (0..6)
            .map(|i| pitcher(&format!("sp{i}"), R::Sp, 3.20 + i as f64 * 0.15))
            .chain((0..6).map(|i| pitcher(&format!("rp{i}"), R::Rp, 3.00 + i as f64 * 0.10)))
            .collect();

        let result = run_pipeline(&hitters, &pitchers, &league, &config).unwrap();

        assert!(result.report.warnings.iter().all(|w| !w.contains("never assigned")));

        let rostered_total: f64 = result
            .players
            .iter()
            .filter(|p| p.computed.tier == Some(model::Tier::Rostered))
            .map(|p| p.computed.total_dollars)
            .sum();
        assert!((rostered_total - result.league_budget.total).abs() < 1.0);

        let c_pool = result.pools.iter().find(|p| p.position == "C" && p.role == R::Hitter).unwrap();
        assert_eq!(c_pool.rostered.len(), c_pool.roster_slots);
    }

    #[test]
    fn determinism_same_input_same_output() {
        let league = small_league();
        let config = BudgetConfig::defaults();
        let hitters: Vec<RawHitterRecord> = (0..6).map(|i| hitter(&format!("c{i}"), "C", 130.0 - i as f64 * 5.0)).collect();
        let pitchers: Vec<RawPitcherRecord> = (0..4).map(|i| pitcher(&format!("sp{i}"), R::Sp, 3.2 + i as f64 * 0.1)).collect();

        let r1 = run_pipeline(&hitters, &pitchers, &league, &config).unwrap();
        let r2 = run_pipeline(&hitters, &pitchers, &league, &config).unwrap();

        let ids1: Vec<&String> = r1.players.iter().map(|p| &p.id).collect();
        let ids2: Vec<&String> = r2.players.iter().map(|p| &p.id).collect();
        assert_eq!(ids1, ids2);
        for (a, b) in r1.players.iter().zip(r2.players.iter()) {
            assert_eq!(a.computed.total_dollars, b.computed.total_dollars);
        }
    }
}
