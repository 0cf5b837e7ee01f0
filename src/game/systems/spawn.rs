//! Spawn point selection
//!
//! Picks the candidate farthest from every living entity, skipping any that
//! overlap geometry. Deterministic for a given world state.

use crate::game::constants::entity::RADIUS;
use crate::game::map::WallSegment;
use crate::game::systems::collision::circle_hits_any;
use crate::util::vec2::Vec2;

/// Choose a spawn position
///
/// Among candidates clear of `walls` (at the entity collision radius), return
/// the one maximising the minimum distance to `living`. Ties keep the earlier
/// candidate. With no living entities every clear candidate scores infinity,
/// so the first clear one wins. If no candidate is clear the first candidate
/// is returned; an empty candidate list yields the origin.
pub fn select_spawn_point(candidates: &[Vec2], walls: &[WallSegment], living: &[Vec2]) -> Vec2 {
    let mut best: Option<(Vec2, f32)> = None;

    for &candidate in candidates {
        if circle_hits_any(candidate, RADIUS, walls) {
            continue;
        }

        let min_dist_sq = living
            .iter()
            .map(|p| candidate.distance_sq_to(*p))
            .fold(f32::INFINITY, f32::min);

        let better = best.map_or(true, |(_, score)| min_dist_sq > score);
        if better {
            best = Some((candidate, min_dist_sq));
        }
    }

    match best {
        Some((point, _)) => point,
        None => {
            if !candidates.is_empty() {
                tracing::warn!("Every spawn candidate overlaps geometry, using the first");
            }
            candidates.first().copied().unwrap_or(Vec2::ZERO)
        }
    }
}
