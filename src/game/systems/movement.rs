//! Movement integration with wall sliding
//!
//! Each axis is integrated and tested separately so an entity blocked on one
//! axis still slides along the other.

use smallvec::SmallVec;

use crate::game::constants::entity::RADIUS;
use crate::game::map::{clamp_to_world, WallSegment};
use crate::game::state::{Entity, EntityId, SimulationWorld};
use crate::game::systems::collision::circle_hits_any;
use crate::util::vec2::Vec2;

/// Advance one entity by `velocity * dt`. Returns true if any axis was blocked.
///
/// Dead entities are frozen and never report a block.
pub fn step_entity(entity: &mut Entity, walls: &[WallSegment], dt: f32) -> bool {
    if !entity.is_alive() {
        return false;
    }

    let mut blocked = false;
    let mut position = entity.position;

    if entity.velocity.x != 0.0 {
        let candidate = Vec2::new(position.x + entity.velocity.x * dt, position.y);
        if circle_hits_any(candidate, RADIUS, walls) {
            blocked = true;
        } else {
            position.x = candidate.x;
        }
    }

    if entity.velocity.y != 0.0 {
        let candidate = Vec2::new(position.x, position.y + entity.velocity.y * dt);
        if circle_hits_any(candidate, RADIUS, walls) {
            blocked = true;
        } else {
            position.y = candidate.y;
        }
    }

    let clamped = clamp_to_world(position, RADIUS);
    if clamped != position {
        blocked = true;
    }

    entity.position = clamped;
    blocked
}

/// Move every bot, then every human. Returns the ids of bots that hit a wall.
pub fn update(world: &mut SimulationWorld, dt: f32) -> SmallVec<[EntityId; 8]> {
    let mut blocked_bots = SmallVec::new();
    let walls = &world.walls;

    for entity in world.entities.iter_mut().filter(|e| e.is_bot()) {
        if step_entity(entity, walls, dt) {
            blocked_bots.push(entity.id);
        }
    }

    for entity in world.entities.iter_mut().filter(|e| !e.is_bot()) {
        step_entity(entity, walls, dt);
    }

    blocked_bots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::EntityKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn entity_at(x: f32, y: f32, velocity: Vec2) -> Entity {
        let mut e = Entity::new(Uuid::new_v4(), "Mover".to_string(), EntityKind::Human, Vec2::new(x, y), 0);
        e.velocity = velocity;
        e
    }

    #[test]
    fn test_free_movement() {
        let mut e = entity_at(500.0, 500.0, Vec2::new(100.0, -50.0));
        let blocked = step_entity(&mut e, &[], 0.5);
        assert!(!blocked);
        assert_eq!(e.position, Vec2::new(550.0, 475.0));
    }

    #[test]
    fn test_slides_along_wall() {
        // Wall directly to the right; diagonal movement keeps the vertical part
        let walls = [WallSegment::new(525.0, 0.0, 50.0, 1000.0)];
        let mut e = entity_at(500.0, 500.0, Vec2::new(100.0, 100.0));
        let blocked = step_entity(&mut e, &walls, 0.1);
        assert!(blocked);
        assert_eq!(e.position.x, 500.0);
        assert_eq!(e.position.y, 510.0);
    }

    #[test]
    fn test_clamped_to_world_bounds() {
        let mut e = entity_at(30.0, 30.0, Vec2::new(-1000.0, 0.0));
        let blocked = step_entity(&mut e, &[], 1.0);
        assert!(blocked);
        assert_eq!(e.position.x, RADIUS);
    }

    #[test]
    fn test_dead_entity_frozen() {
        let mut e = entity_at(500.0, 500.0, Vec2::new(100.0, 0.0));
        e.health = 0.0;
        e.respawn_at = Some(1000);
        assert!(!step_entity(&mut e, &[], 1.0));
        assert_eq!(e.position, Vec2::new(500.0, 500.0));
    }

    #[test]
    fn test_update_reports_blocked_bots_only() {
        let mut world = SimulationWorld::with_layout(
            vec![WallSegment::new(525.0, 0.0, 50.0, 1000.0)],
            Vec::new(),
            Vec::new(),
            StdRng::seed_from_u64(1),
        );
        let mut bot = entity_at(500.0, 500.0, Vec2::new(100.0, 0.0));
        bot.kind = EntityKind::Bot;
        let bot_id = bot.id;
        let human = entity_at(500.0, 700.0, Vec2::new(100.0, 0.0));
        world.add_entity(bot);
        world.add_entity(human);

        let blocked = update(&mut world, 0.1);
        assert_eq!(blocked.as_slice(), &[bot_id]);
    }
}
