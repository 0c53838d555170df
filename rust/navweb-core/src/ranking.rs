//! Ranking of interchangeable training objects by travel efficiency.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{HasWorldLocation, WorldPoint};

/// A training object with the cost of working it from the current spot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub location: WorldPoint,
    pub object_id: i32,
    pub cost: i32,
    /// Ticks from the object to the bank; 0 when ranked without banking.
    #[serde(default)]
    pub bank_distance: i32,
}

impl RankedCandidate {
    pub fn without_banking(location: WorldPoint, object_id: i32, cost: i32) -> Self {
        Self { location, object_id, cost, bank_distance: 0 }
    }

    pub fn with_banking(location: WorldPoint, object_id: i32, round_trip: i32, bank_distance: i32) -> Self {
        Self { location, object_id, cost: round_trip, bank_distance }
    }

    pub fn is_banking(&self) -> bool {
        self.bank_distance > 0
    }
}

impl HasWorldLocation for RankedCandidate {
    fn world_location(&self) -> WorldPoint {
        self.location
    }
}

/// Matching object found in the scene before costing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TrainingCandidate {
    pub location: WorldPoint,
    pub object_id: i32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RankBasis {
    /// Cost is the walk from the reference point to the object.
    FromReference(WorldPoint),
    /// Cost is object -> bank plus bank -> object.
    BankRoundTrip(WorldPoint),
}

/// Cost every candidate with `path_cost`, drop the unreachable ones and keep
/// the cheapest `top_n` in ascending order. Ties keep scan order.
pub fn rank_candidates<F>(candidates: &[TrainingCandidate], basis: RankBasis, top_n: usize, mut path_cost: F) -> Vec<RankedCandidate>
where
    F: FnMut(WorldPoint, WorldPoint) -> Option<i32>,
{
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .filter_map(|c| match basis {
            RankBasis::FromReference(reference) => {
                let cost = path_cost(reference, c.location)?;
                Some(RankedCandidate::without_banking(c.location, c.object_id, cost))
            }
            RankBasis::BankRoundTrip(bank) => {
                let to_bank = path_cost(c.location, bank)?;
                let from_bank = path_cost(bank, c.location)?;
                Some(RankedCandidate::with_banking(c.location, c.object_id, to_bank + from_bank, to_bank))
            }
        })
        .collect();
    ranked.sort_by_key(|r| r.cost);
    if let (Some(best), Some(worst)) = (ranked.first(), ranked.last()) {
        debug!(
            best = best.cost,
            median = ranked[ranked.len() / 2].cost,
            worst = worst.cost,
            reachable = ranked.len(),
            scanned = candidates.len(),
            "training spot costs"
        );
    }
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(x: i32, id: i32) -> TrainingCandidate {
        TrainingCandidate { location: WorldPoint::new(x, 3200, 0), object_id: id }
    }

    #[test]
    fn ranks_by_walk_and_skips_unreachable() {
        let reference = WorldPoint::new(3200, 3200, 0);
        let cands = [cand(3210, 1), cand(3203, 2), cand(3205, 3)];
        let ranked = rank_candidates(&cands, RankBasis::FromReference(reference), 10, |a, b| {
            if b.x == 3205 {
                None
            } else {
                Some(a.distance_to(&b))
            }
        });
        let ids: Vec<i32> = ranked.iter().map(|r| r.object_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(ranked[0].cost, 3);
        assert!(!ranked[0].is_banking());
    }

    #[test]
    fn bank_round_trip_sums_both_legs() {
        let bank = WorldPoint::new(3200, 3200, 0);
        let cands = [cand(3204, 1), cand(3202, 2)];
        // Walking back from the bank costs one extra tick.
        let ranked = rank_candidates(&cands, RankBasis::BankRoundTrip(bank), 10, |a, b| {
            let d = a.distance_to(&b);
            Some(if a == bank { d + 1 } else { d })
        });
        assert_eq!(ranked[0], RankedCandidate::with_banking(WorldPoint::new(3202, 3200, 0), 2, 5, 2));
        assert_eq!(ranked[1].cost, 9);
        assert_eq!(ranked[1].bank_distance, 4);
    }

    #[test]
    fn keeps_top_n() {
        let reference = WorldPoint::new(3200, 3200, 0);
        let cands: Vec<_> = (1..=15).map(|i| cand(3200 + i, i)).collect();
        let ranked = rank_candidates(&cands, RankBasis::FromReference(reference), 10, |a, b| Some(a.distance_to(&b)));
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked.last().map(|r| r.cost), Some(10));
    }

    #[test]
    fn serializes_flat() {
        let r = RankedCandidate::without_banking(WorldPoint::new(1, 2, 0), 7, 3);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v, serde_json::json!({"x": 1, "y": 2, "plane": 0, "object_id": 7, "cost": 3, "bank_distance": 0}));
    }
}
