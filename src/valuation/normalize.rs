// Stage A: Normalizer. Projects already-parsed upstream records into the
// engine-facing `HitterStats` / `PitcherStats` shape, deriving fields the
// upstream feed doesn't carry directly (outs, svhd, sbn) and zeroing
// role-foreign categories.
//
// Parsing the upstream JSON/CSV itself is the ETL's job; this stage starts
// from already-typed records.

use crate::error::TrpError;

use super::model::{HitterStats, PitcherStats, Player, PlayerStats, Role};

/// Upstream hitter record, pre-parsed by the (out of scope) ETL layer.
#[derive(Debug, Clone)]
pub struct RawHitterRecord {
    pub id: String,
    pub name: String,
    pub team: String,
    pub positions: Vec<String>,
    pub pa: f64,
    pub ab: f64,
    pub r: f64,
    pub hr: f64,
    pub rbi: f64,
    pub sb: f64,
    pub cs: f64,
    pub obp: f64,
    pub slg: f64,
    pub wrc_plus: f64,
}

/// Upstream pitcher record. `outs` and `svhd` are optional because the
/// upstream feed sometimes carries `ip` (innings) instead of outs, and
/// sometimes carries `sv`/`hld` separately instead of a combined `svhd`.
#[derive(Debug, Clone)]
pub struct RawPitcherRecord {
    pub id: String,
    pub name: String,
    pub team: String,
    pub positions: Vec<String>,
    pub role: Role,
    pub outs: Option<f64>,
    pub ip: Option<f64>,
    pub era: f64,
    pub whip: f64,
    pub k9: f64,
    pub qs: f64,
    pub sv: f64,
    pub hld: f64,
    pub svhd: Option<f64>,
    pub fip: f64,
}

fn require_finite(value: f64, id: &str, field: &str) -> Result<f64, TrpError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TrpError::MalformedInput {
            ids: vec![id.to_string()],
            message: format!("field `{field}` is not finite"),
        })
    }
}

/// Normalizes one raw hitter record into a `Player`. `sbn` is always derived
/// (`sb - cs`), never trusted from upstream.
pub fn normalize_hitter(raw: &RawHitterRecord) -> Result<Player, TrpError> {
    let sbn = require_finite(raw.sb - raw.cs, &raw.id, "sbn")?;
    let stats = HitterStats {
        pa: require_finite(raw.pa, &raw.id, "pa")?,
        ab: require_finite(raw.ab, &raw.id, "ab")?,
        r: require_finite(raw.r, &raw.id, "r")?,
        hr: require_finite(raw.hr, &raw.id, "hr")?,
        rbi: require_finite(raw.rbi, &raw.id, "rbi")?,
        sbn,
        obp: require_finite(raw.obp, &raw.id, "obp")?,
        slg: require_finite(raw.slg, &raw.id, "slg")?,
        wrc_plus: require_finite(raw.wrc_plus, &raw.id, "wrc_plus")?,
    };
    Ok(Player::new(
        raw.id.clone(),
        raw.name.clone(),
        raw.team.clone(),
        raw.positions.clone(),
        Role::Hitter,
        PlayerStats::Hitter(stats),
    ))
}

/// Normalizes one raw pitcher record into a `Player`, deriving `outs` from
/// `ip` and `svhd` from `sv + hld` when absent, and zeroing the category
/// that's foreign to the player's role (`qs` for RP, `svhd` for SP).
pub fn normalize_pitcher(raw: &RawPitcherRecord) -> Result<Player, TrpError> {
    let outs = match (raw.outs, raw.ip) {
        (Some(outs), _) => outs,
        (None, Some(ip)) => ip * 3.0,
        (None, None) => {
            return Err(TrpError::MalformedInput {
                ids: vec![raw.id.clone()],
                message: "neither `outs` nor `ip` present".to_string(),
            });
        }
    };
    let raw_svhd = raw.svhd.unwrap_or(raw.sv + raw.hld);

    let (qs, svhd) = match raw.role {
        Role::Sp => (raw.qs, 0.0),
        Role::Rp => (0.0, raw_svhd),
        Role::Hitter => {
            return Err(TrpError::MalformedInput {
                ids: vec![raw.id.clone()],
                message: "pitcher record carries Role::Hitter".to_string(),
            });
        }
    };

    let stats = PitcherStats {
        outs: require_finite(outs, &raw.id, "outs")?,
        era: require_finite(raw.era, &raw.id, "era")?,
        whip: require_finite(raw.whip, &raw.id, "whip")?,
        k9: require_finite(raw.k9, &raw.id, "k9")?,
        qs: require_finite(qs, &raw.id, "qs")?,
        svhd: require_finite(svhd, &raw.id, "svhd")?,
        fip: require_finite(raw.fip, &raw.id, "fip")?,
    };
    Ok(Player::new(
        raw.id.clone(),
        raw.name.clone(),
        raw.team.clone(),
        raw.positions.clone(),
        raw.role,
        PlayerStats::Pitcher(stats),
    ))
}

/// Normalizes every record in both iterables. Per-record shape errors
/// aggregate into a single `MalformedInput` rather than aborting on the
/// first bad record, so a caller sees every offending id at once.
pub fn normalize_all(
    hitters: &[RawHitterRecord],
    pitchers: &[RawPitcherRecord],
) -> Result<Vec<Player>, TrpError> {
    let mut players = Vec::with_capacity(hitters.len() + pitchers.len());
    let mut bad_ids = Vec::new();

    for raw in hitters {
        match normalize_hitter(raw) {
            Ok(player) => players.push(player),
            Err(TrpError::MalformedInput { ids, .. }) => bad_ids.extend(ids),
            Err(other) => return Err(other),
        }
    }
    for raw in pitchers {
        match normalize_pitcher(raw) {
            Ok(player) => players.push(player),
            Err(TrpError::MalformedInput { ids, .. }) => bad_ids.extend(ids),
            Err(other) => return Err(other),
        }
    }

    if !bad_ids.is_empty() {
        return Err(TrpError::MalformedInput {
            ids: bad_ids,
            message: "one or more records failed normalization".to_string(),
        });
    }

    tracing::debug!(hitters = hitters.len(), pitchers = pitchers.len(), "stage A: normalized input records");
    Ok(players)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hitter(id: &str) -> RawHitterRecord {
        RawHitterRecord {
            id: id.into(),
            name: "Test Hitter".into(),
            team: "TST".into(),
            positions: vec!["2B".into()],
            pa: 600.0,
            ab: 540.0,
            r: 90.0,
            hr: 25.0,
            rbi: 85.0,
            sb: 15.0,
            cs: 5.0,
            obp: 0.350,
            slg: 0.470,
            wrc_plus: 120.0,
        }
    }

    fn pitcher(id: &str, role: Role) -> RawPitcherRecord {
        RawPitcherRecord {
            id: id.into(),
            name: "Test Pitcher".into(),
            team: "TST".into(),
            positions: vec![if role == Role::Sp { "SP".into() } else { "RP".into() }],
            role,
            outs: None,
            ip: Some(180.0),
            era: 3.50,
            whip: 1.15,
            k9: 9.0,
            qs: 15.0,
            sv: 0.0,
            hld: 0.0,
            svhd: None,
            fip: 3.60,
        }
    }

    #[test]
    fn derives_sbn_from_sb_minus_cs() {
        let player = normalize_hitter(&hitter("h1")).unwrap();
        match player.stats {
            PlayerStats::Hitter(h) => assert_eq!(h.sbn, 10.0),
            _ => panic!("expected hitter"),
        }
    }

    #[test]
    fn derives_outs_from_ip() {
        let player = normalize_pitcher(&pitcher("p1", Role::Sp)).unwrap();
        match player.stats {
            PlayerStats::Pitcher(p) => assert_eq!(p.outs, 540.0),
            _ => panic!("expected pitcher"),
        }
    }

    #[test]
    fn sp_zeroes_svhd_and_keeps_qs() {
        let mut raw = pitcher("p1", Role::Sp);
        raw.sv = 3.0;
        raw.hld = 1.0;
        let player = normalize_pitcher(&raw).unwrap();
        match player.stats {
            PlayerStats::Pitcher(p) => {
                assert_eq!(p.svhd, 0.0);
                assert_eq!(p.qs, 15.0);
            }
            _ => panic!("expected pitcher"),
        }
    }

    #[test]
    fn rp_zeroes_qs_and_derives_svhd() {
        let mut raw = pitcher("p1", Role::Rp);
        raw.sv = 20.0;
        raw.hld = 5.0;
        raw.qs = 0.0;
        let player = normalize_pitcher(&raw).unwrap();
        match player.stats {
            PlayerStats::Pitcher(p) => {
                assert_eq!(p.qs, 0.0);
                assert_eq!(p.svhd, 25.0);
            }
            _ => panic!("expected pitcher"),
        }
    }

    #[test]
    fn rejects_non_finite_field() {
        let mut raw = hitter("h1");
        raw.wrc_plus = f64::NAN;
        let err = normalize_hitter(&raw).unwrap_err();
        assert!(matches!(err, TrpError::MalformedInput { .. }));
    }

    #[test]
    fn missing_outs_and_ip_is_malformed() {
        let mut raw = pitcher("p1", Role::Sp);
        raw.outs = None;
        raw.ip = None;
        let err = normalize_pitcher(&raw).unwrap_err();
        assert!(matches!(err, TrpError::MalformedInput { .. }));
    }

    #[test]
    fn normalize_all_aggregates_bad_ids() {
        let mut bad = hitter("bad1");
        bad.pa = f64::NAN;
        let mut bad2 = hitter("bad2");
        bad2.hr = f64::INFINITY;
        let good = hitter("good1");

        let err = normalize_all(&[good, bad, bad2], &[]).unwrap_err();
        match err {
            TrpError::MalformedInput { ids, .. } => {
                assert_eq!(ids.len(), 2);
                assert!(ids.contains(&"bad1".to_string()));
                assert!(ids.contains(&"bad2".to_string()));
            }
            _ => panic!("expected MalformedInput"),
        }
    }

    #[test]
    fn normalize_all_succeeds_on_clean_input() {
        let players = normalize_all(&[hitter("h1")], &[pitcher("p1", Role::Sp)]).unwrap();
        assert_eq!(players.len(), 2);
    }
}
