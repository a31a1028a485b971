// Stage G: Dollar Translator. Converts each pool's category budgets into a
// $/Z rate using only the rostered tier's positive normalized Z as the
// denominator, then prices every player in the pool against that rate.

use std::collections::HashMap;

use crate::error::TrpError;

use super::model::{Player, PositionPool};

/// Computes `dollars_per_z` and `total_pool_z` for every category in the
/// pool, then prices every player the pool tracks (rostered, replacement,
/// and below-replacement alike — pricing non-rostered players is a useful
/// diagnostic even though only rostered dollars count toward the league
/// budget). A non-finite dollar figure aborts with `TrpError::NumericalFailure`
/// rather than propagating into the league's budget balance check.
pub fn translate_pool_dollars(pool: &mut PositionPool, players: &mut HashMap<String, Player>) -> Result<(), TrpError> {
    for category in &pool.categories {
        let mut rostered_ids: Vec<&String> = pool.rostered.iter().collect();
        rostered_ids.sort();
        let total_positive_z: f64 = rostered_ids
            .iter()
            .filter_map(|id| players.get(*id))
            .map(|p| p.computed.normalized_z.get(category).copied().unwrap_or(0.0).max(0.0))
            .sum();
        pool.total_pool_z.insert(category.clone(), total_positive_z);

        let budget = pool.category_budgets.get(category).copied().unwrap_or(0.0);
        let rate = if total_positive_z > 0.0 { budget / total_positive_z } else { 0.0 };
        if !rate.is_finite() {
            return Err(TrpError::NumericalFailure {
                player_id: "<dollars_per_z>".to_string(),
                pool: pool.position.clone(),
                category: category.clone(),
            });
        }
        pool.dollars_per_z.insert(category.clone(), rate);
    }

    let mut all_ids: Vec<String> = pool
        .rostered
        .iter()
        .chain(pool.replacement.iter())
        .chain(pool.below_replacement.iter())
        .cloned()
        .collect();
    all_ids.sort();

    for id in all_ids {
        let Some(player) = players.get_mut(&id) else { continue };
        let mut total_dollars = 0.0;
        for category in &pool.categories {
            let z = player.computed.normalized_z.get(category).copied().unwrap_or(0.0);
            let rate = pool.dollars_per_z.get(category).copied().unwrap_or(0.0);
            let dollars = z * rate;
            if !dollars.is_finite() {
                return Err(TrpError::NumericalFailure {
                    player_id: player.id.clone(),
                    pool: pool.position.clone(),
                    category: category.clone(),
                });
            }
            player.computed.dollar_values.insert(category.clone(), dollars);
            total_dollars += dollars;
        }
        player.computed.total_dollars = total_dollars;
    }

    tracing::debug!(position = %pool.position, "stage G: translated pool Z to dollars");
    Ok(())
}
