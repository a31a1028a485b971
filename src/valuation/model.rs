// Core data model shared by every stage of the kernel: players, their
// role-specific stat records, position pools, and the league-wide budget.

use std::collections::{HashMap, HashSet};

/// A player's roster role. Two-way players get one `Player` record per role
/// they're valued under — the kernel never merges a hitter record and a
/// pitcher record for the same person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Hitter,
    Sp,
    Rp,
}

/// Which of the three disjoint tiers a pool has placed a player in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Rostered,
    Replacement,
    BelowReplacement,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitterStats {
    pub pa: f64,
    pub ab: f64,
    pub r: f64,
    pub hr: f64,
    pub rbi: f64,
    pub sbn: f64,
    pub obp: f64,
    pub slg: f64,
    pub wrc_plus: f64,
}

impl HitterStats {
    /// Looks up a category value by name. This is the one place hitter
    /// category names resolve to stat fields; stages carry category sets as
    /// data and call through here rather than matching on names themselves.
    pub fn category_value(&self, category: &str) -> Option<f64> {
        match category {
            "R" => Some(self.r),
            "HR" => Some(self.hr),
            "RBI" => Some(self.rbi),
            "SBN" => Some(self.sbn),
            "OBP" => Some(self.obp),
            "SLG" => Some(self.slg),
            "PA" => Some(self.pa),
            "AB" => Some(self.ab),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitcherStats {
    pub outs: f64,
    pub era: f64,
    pub whip: f64,
    pub k9: f64,
    pub qs: f64,
    pub svhd: f64,
    pub fip: f64,
}

impl PitcherStats {
    pub fn ip(&self) -> f64 {
        self.outs / 3.0
    }

    pub fn category_value(&self, category: &str) -> Option<f64> {
        match category {
            "ERA" => Some(self.era),
            "WHIP" => Some(self.whip),
            "K9" => Some(self.k9),
            "QS" => Some(self.qs),
            "SVHD" => Some(self.svhd),
            "OUTS" => Some(self.outs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerStats {
    Hitter(HitterStats),
    Pitcher(PitcherStats),
}

impl PlayerStats {
    pub fn category_value(&self, category: &str) -> Option<f64> {
        match self {
            PlayerStats::Hitter(h) => h.category_value(category),
            PlayerStats::Pitcher(p) => p.category_value(category),
        }
    }

    /// The composite metric used for initial ranking: wRC+ for hitters,
    /// negated FIP for pitchers (lower FIP is better, so higher is better
    /// after negation, matching the hitter convention of "higher is better").
    pub fn composite_metric(&self) -> f64 {
        match self {
            PlayerStats::Hitter(h) => h.wrc_plus,
            PlayerStats::Pitcher(p) => -p.fip,
        }
    }
}

/// Engine output attached to a player, mutated only through the pipeline's
/// stages; nothing outside `computed` ever changes after the Normalizer
/// creates the player.
#[derive(Debug, Clone, Default)]
pub struct ComputedValuation {
    pub primary_position: Option<String>,
    pub raw_z: HashMap<String, f64>,
    pub normalized_z: HashMap<String, f64>,
    pub total_z: f64,
    pub dollar_values: HashMap<String, f64>,
    pub total_dollars: f64,
    pub tier: Option<Tier>,
    /// Set when a hitter's ROSTERED tier membership comes from the UTIL pool
    /// rather than their primary-position pool (the one legal duplication).
    pub util_rostered: bool,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team: String,
    /// Ordered eligibility tags, e.g. `["2B", "SS"]`. Order matters: the
    /// Primary-Position Assigner's fallback uses the first entry.
    pub positions: Vec<String>,
    pub role: Role,
    pub stats: PlayerStats,
    pub computed: ComputedValuation,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, team: impl Into<String>, positions: Vec<String>, role: Role, stats: PlayerStats) -> Self {
        Player {
            id: id.into(),
            name: name.into(),
            team: team.into(),
            positions,
            role,
            stats,
            computed: ComputedValuation::default(),
        }
    }

    pub fn composite_metric(&self) -> f64 {
        self.stats.composite_metric()
    }

    pub fn category_value(&self, category: &str) -> Option<f64> {
        self.stats.category_value(category)
    }

    pub fn is_pure_dh(&self) -> bool {
        self.positions.len() == 1 && self.positions[0] == "DH"
    }
}

/// A position-or-role pool: `(position, role)` for hitters (e.g. `("2B",
/// Hitter)`), a single synthetic position per pitcher role (`("SP", Sp)`,
/// `("RP", Rp)`), or the UTIL pool (`("UTIL", Hitter)`).
#[derive(Debug, Clone)]
pub struct PositionPool {
    pub position: String,
    pub role: Role,
    pub roster_slots: usize,
    /// Ordered category set this pool standardizes over; ordering drives
    /// deterministic summation and iteration everywhere else.
    pub categories: Vec<String>,
    pub rostered: Vec<String>,
    pub replacement: Vec<String>,
    pub below_replacement: Vec<String>,
    pub rostered_tier_means: HashMap<String, f64>,
    pub rostered_tier_stdevs: HashMap<String, f64>,
    pub rlp_raw_z_avg: HashMap<String, f64>,
    pub category_budgets: HashMap<String, f64>,
    pub dollars_per_z: HashMap<String, f64>,
    pub total_pool_z: HashMap<String, f64>,
    pub production_share: HashMap<String, f64>,
}

impl PositionPool {
    pub fn new(position: impl Into<String>, role: Role, roster_slots: usize, categories: Vec<String>) -> Self {
        PositionPool {
            position: position.into(),
            role,
            roster_slots,
            categories,
            rostered: Vec::new(),
            replacement: Vec::new(),
            below_replacement: Vec::new(),
            rostered_tier_means: HashMap::new(),
            rostered_tier_stdevs: HashMap::new(),
            rlp_raw_z_avg: HashMap::new(),
            category_budgets: HashMap::new(),
            dollars_per_z: HashMap::new(),
            total_pool_z: HashMap::new(),
            production_share: HashMap::new(),
        }
    }

    /// All player ids currently tracked by this pool, across all three tiers.
    pub fn all_ids(&self) -> HashSet<String> {
        self.rostered
            .iter()
            .chain(self.replacement.iter())
            .chain(self.below_replacement.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryBudgets {
    pub hitter: HashMap<String, f64>,
    pub sp: HashMap<String, f64>,
    pub rp: HashMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct LeagueBudget {
    pub total: f64,
    pub hitter_budget: f64,
    pub pitcher_budget: f64,
    pub sp_budget: f64,
    pub rp_budget: f64,
    pub category_budgets: CategoryBudgets,
}

/// League structural settings: roster slots and category universe. Distinct
/// from `BudgetConfig`, which holds tunable allocation parameters rather than
/// the league's actual shape.
#[derive(Debug, Clone)]
pub struct LeagueSettings {
    pub num_teams: usize,
    pub budget_per_team: f64,
    /// Slots per team, keyed by position tag (`"C"`, `"1B"`, ..., `"UTIL"`,
    /// `"SP"`, `"RP"`).
    pub roster_slots: HashMap<String, usize>,
    pub batting_categories: Vec<String>,
    pub pitching_categories: Vec<String>,
    pub inverted_categories: HashSet<String>,
}

impl LeagueSettings {
    pub fn total_slots(&self, position: &str) -> usize {
        self.roster_slots.get(position).copied().unwrap_or(0) * self.num_teams
    }
}
