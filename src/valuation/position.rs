// Stage B: Primary-Position Assigner. Resolves multi-position hitter
// eligibility down to exactly one valuation position per player, processing
// the scarcest positions first so a shallow position doesn't get starved by
// players who'd be just as happy at a deeper one.

use std::collections::HashSet;

use super::model::{LeagueSettings, Player, Role};

/// Assigns `computed.primary_position` on every player.
///
/// Pitchers are trivial: their role already fixes a single pool (`"SP"` or
/// `"RP"`), so no scarcity contention applies. Hitters go through the
/// scarcest-first allocation described in the component design.
pub fn assign_primary_positions(players: &mut [Player], league: &LeagueSettings) {
    for player in players.iter_mut() {
        if player.role != Role::Hitter {
            player.computed.primary_position = Some(role_position_name(player.role).to_string());
        }
    }

    let hitter_positions = scarcity_ordered_positions(league);

    let mut unassigned: Vec<usize> = players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.role == Role::Hitter && p.computed.primary_position.is_none())
        .map(|(i, _)| i)
        .collect();

    for position in &hitter_positions {
        if unassigned.is_empty() {
            break;
        }
        let total_slots = league.total_slots(position);
        if total_slots == 0 {
            continue;
        }

        let mut candidates: Vec<usize> = unassigned
            .iter()
            .copied()
            .filter(|&i| players[i].positions.iter().any(|p| p == position))
            .collect();

        candidates.sort_by(|&a, &b| {
            let metric_a = players[a].composite_metric();
            let metric_b = players[b].composite_metric();
            metric_b
                .partial_cmp(&metric_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| players[a].id.cmp(&players[b].id))
        });

        let take = (1.5 * total_slots as f64).ceil() as usize;
        for &i in candidates.iter().take(take) {
            players[i].computed.primary_position = Some(position.clone());
        }

        let assigned_this_round: HashSet<usize> = candidates.into_iter().take(take).collect();
        unassigned.retain(|i| !assigned_this_round.contains(i));
    }

    // Fallback: anyone left (positions with no roster slots, or a deeper
    // position than the buffer reached) takes their first-listed eligibility.
    for &i in &unassigned {
        let fallback = players[i]
            .positions
            .first()
            .cloned()
            .unwrap_or_else(|| "UTIL".to_string());
        players[i].computed.primary_position = Some(fallback);
    }

    tracing::debug!(players = players.len(), "stage B: assigned primary positions");
}

fn role_position_name(role: Role) -> &'static str {
    match role {
        Role::Sp => "SP",
        Role::Rp => "RP",
        Role::Hitter => unreachable!("hitters resolve via scarcity ordering"),
    }
}

/// Hitter roster positions present in the league, ordered by ascending
/// scarcity (fewest league-wide slots first). Ties break by position name so
/// iteration order doesn't depend on the `HashMap`'s randomized hash order.
fn scarcity_ordered_positions(league: &LeagueSettings) -> Vec<String> {
    let mut positions: Vec<String> = league
        .roster_slots
        .keys()
        .filter(|p| p.as_str() != "UTIL" && p.as_str() != "SP" && p.as_str() != "RP")
        .cloned()
        .collect();
    positions.sort_by_key(|p| (league.total_slots(p), p.clone()));
    positions
}
