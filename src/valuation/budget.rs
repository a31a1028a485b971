// Stage F: Budget Allocator. Splits the league's total auction budget into
// hitter/pitcher and role budgets, then distributes hitter category dollars
// across positions by production share (counting stats) or PA-weighted
// share (rate stats), and pitcher category dollars by fixed role weights.

use std::collections::HashMap;

use crate::config::BudgetConfig;

use super::model::{CategoryBudgets, LeagueBudget, LeagueSettings, Player, PositionPool, Role};

const HITTER_COUNTING_CATEGORIES: &[&str] = &["R", "HR", "RBI", "SBN"];
const HITTER_RATE_CATEGORIES: &[&str] = &["OBP", "SLG"];

fn is_rate_category(category: &str) -> bool {
    HITTER_RATE_CATEGORIES.contains(&category)
}

/// Computes the league-wide, role, and category budgets. Does not touch any
/// pool — that's `allocate_pool_budgets` / `allocate_pitcher_budget` below.
pub fn compute_league_budget(league: &LeagueSettings, config: &BudgetConfig) -> LeagueBudget {
    let total = league.num_teams as f64 * (league.budget_per_team - config.bench_reserve);
    let hitter_budget = total * config.hitter_pitcher_split;
    let pitcher_budget = total - hitter_budget;
    let sp_budget = pitcher_budget * config.sp_rp_split;
    let rp_budget = pitcher_budget - sp_budget;

    let hitter: HashMap<String, f64> = config
        .hitter_category_weights
        .iter()
        .map(|(c, w)| (c.clone(), hitter_budget * w))
        .collect();
    let sp: HashMap<String, f64> = config
        .sp_category_weights
        .iter()
        .map(|(c, w)| (c.clone(), sp_budget * w))
        .collect();
    let rp: HashMap<String, f64> = config
        .rp_category_weights
        .iter()
        .map(|(c, w)| (c.clone(), rp_budget * w))
        .collect();

    LeagueBudget {
        total,
        hitter_budget,
        pitcher_budget,
        sp_budget,
        rp_budget,
        category_budgets: CategoryBudgets { hitter, sp, rp },
    }
}

fn rostered_category_sum(pool: &PositionPool, players: &HashMap<String, Player>, category: &str) -> f64 {
    let mut ids: Vec<&String> = pool.rostered.iter().collect();
    ids.sort();
    ids.iter()
        .filter_map(|id| players.get(*id))
        .filter_map(|p| p.category_value(category))
        .sum()
}

fn weighted_pa(pool: &PositionPool, config: &BudgetConfig) -> f64 {
    let weight = config.pa_weights.get(&pool.position).copied().unwrap_or(600.0);
    pool.rostered.len() as f64 * weight
}

/// Allocates hitter category budgets across every hitter pool (including the
/// UTIL pool, which is itself just another position pool by this stage).
pub fn allocate_hitter_pool_budgets(
    hitter_pools: &mut [PositionPool],
    players: &HashMap<String, Player>,
    league_budget: &LeagueBudget,
    config: &BudgetConfig,
) {
    for category in HITTER_COUNTING_CATEGORIES {
        let league_total = league_budget.category_budgets.hitter.get(*category).copied().unwrap_or(0.0);
        let sums: Vec<f64> = hitter_pools
            .iter()
            .map(|p| rostered_category_sum(p, players, category))
            .collect();
        let denominator: f64 = sums.iter().sum();
        for (pool, sum) in hitter_pools.iter_mut().zip(sums.iter()) {
            let share = if denominator > 0.0 { sum / denominator } else { 0.0 };
            pool.category_budgets.insert(category.to_string(), league_total * share);
            pool.production_share.insert(category.to_string(), share);
        }
    }

    for category in HITTER_RATE_CATEGORIES {
        let league_total = league_budget.category_budgets.hitter.get(*category).copied().unwrap_or(0.0);
        let weights: Vec<f64> = hitter_pools.iter().map(|p| weighted_pa(p, config)).collect();
        let denominator: f64 = weights.iter().sum();
        for (pool, w) in hitter_pools.iter_mut().zip(weights.iter()) {
            let share = if denominator > 0.0 { w / denominator } else { 0.0 };
            pool.category_budgets.insert(category.to_string(), league_total * share);
            pool.production_share.insert(category.to_string(), share);
        }
    }

    tracing::debug!(pools = hitter_pools.len(), "stage F: allocated hitter category budgets");
}

/// Allocates a pitcher pool's category budgets directly from its role's
/// budget and weights; pitcher pools are single-position per role, so there
/// is no production-share split to compute.
pub fn allocate_pitcher_pool_budget(pool: &mut PositionPool, league_budget: &LeagueBudget, config: &BudgetConfig) {
    let (role_budget, weights) = match pool.role {
        Role::Sp => (league_budget.sp_budget, &config.sp_category_weights),
        Role::Rp => (league_budget.rp_budget, &config.rp_category_weights),
        Role::Hitter => return,
    };
    for (category, weight) in weights {
        pool.category_budgets.insert(category.clone(), role_budget * weight);
    }
    tracing::debug!(position = %pool.position, "stage F: allocated pitcher pool budget");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::model::{HitterStats, PlayerStats};

    fn league() -> LeagueSettings {
        LeagueSettings {
            num_teams: 10,
            budget_per_team: 260.0,
            roster_slots: HashMap::new(),
            batting_categories: vec![],
            pitching_categories: vec![],
            inverted_categories: Default::default(),
        }
    }

    #[test]
    fn league_budget_splits_match_defaults() {
        let league = league();
        let config = BudgetConfig::defaults();
        let budget = compute_league_budget(&league, &config);
        assert_eq!(budget.total, 2600.0);
        assert_eq!(budget.hitter_budget, 1820.0);
        assert_eq!(budget.pitcher_budget, 780.0);
        assert_eq!(budget.sp_budget, 390.0);
        assert_eq!(budget.rp_budget, 390.0);
    }

    #[test]
    fn category_weights_sum_to_role_budget() {
        let league = league();
        let config = BudgetConfig::defaults();
        let budget = compute_league_budget(&league, &config);
        let sum: f64 = budget.category_budgets.hitter.values().sum();
        assert!((sum - budget.hitter_budget).abs() < 1e-6);
    }

    fn hitter(id: &str, r: f64) -> Player {
        Player::new(
            id,
            id,
            "TST",
            vec!["2B".into()],
            Role::Hitter,
            PlayerStats::Hitter(HitterStats {
                pa: 600.0,
                ab: 540.0,
                r,
                hr: 20.0,
                rbi: 70.0,
                sbn: 10.0,
                obp: 0.340,
                slg: 0.440,
                wrc_plus: r,
            }),
        )
    }

    #[test]
    fn counting_stat_allocation_follows_production_share() {
        let mut players = HashMap::new();
        // Pool A's rostered hitters produce twice the R of pool B's.
        let mut pool_a = PositionPool::new("2B", Role::Hitter, 2, vec!["R".to_string()]);
        pool_a.rostered = vec!["a0".into(), "a1".into()];
        players.insert("a0".to_string(), hitter("a0", 100.0));
        players.insert("a1".to_string(), hitter("a1", 100.0));

        let mut pool_b = PositionPool::new("SS", Role::Hitter, 2, vec!["R".to_string()]);
        pool_b.rostered = vec!["b0".into(), "b1".into()];
        players.insert("b0".to_string(), hitter("b0", 50.0));
        players.insert("b1".to_string(), hitter("b1", 50.0));

        let league = league();
        let config = BudgetConfig::defaults();
        let league_budget = compute_league_budget(&league, &config);

        let mut pools = vec![pool_a, pool_b];
        allocate_hitter_pool_budgets(&mut pools, &players, &league_budget, &config);

        let r_total = league_budget.category_budgets.hitter["R"];
        assert!((pools[0].category_budgets["R"] - r_total * 2.0 / 3.0).abs() < 1e-6);
        assert!((pools[1].category_budgets["R"] - r_total * 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn pitcher_pool_budget_uses_role_weights_directly() {
        let league = league();
        let config = BudgetConfig::defaults();
        let league_budget = compute_league_budget(&league, &config);
        let mut sp_pool = PositionPool::new("SP", Role::Sp, 5, vec!["K9".to_string(), "ERA".to_string()]);
        allocate_pitcher_pool_budget(&mut sp_pool, &league_budget, &config);
        assert!((sp_pool.category_budgets["K9"] - league_budget.sp_budget * 0.40).abs() < 1e-6);
        assert!((sp_pool.category_budgets["ERA"] - league_budget.sp_budget * 0.15).abs() < 1e-6);
    }
}
