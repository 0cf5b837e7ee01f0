//! Respawn and reload timers, polled once per tick

use crate::game::constants::entity::{STARTING_ARMOR, STARTING_HEALTH};
use crate::game::constants::lifecycle::SPAWN_INVULN_MS;
use crate::game::state::{Millis, SimulationWorld};
use crate::game::systems::combat::complete_reload;
use crate::game::systems::spawn::select_spawn_point;
use crate::net::protocol::GameEvent;
use crate::util::vec2::Vec2;

/// Resolve due respawns and due reload completions for every entity
pub fn update(world: &mut SimulationWorld, now: Millis, events: &mut Vec<GameEvent>) {
    for idx in 0..world.entities.len() {
        let entity = &mut world.entities[idx];
        if entity.is_alive() {
            complete_reload(entity, now);
        } else if entity.respawn_at.is_some_and(|at| now >= at) {
            respawn(world, idx, now, events);
        }
    }
}

/// Bring a dead entity back at a fresh spawn point with starting stats
fn respawn(world: &mut SimulationWorld, idx: usize, now: Millis, events: &mut Vec<GameEvent>) {
    let living = world.living_positions(None);
    let position = select_spawn_point(&world.spawn_points, &world.walls, &living);

    let entity = &mut world.entities[idx];
    entity.position = position;
    entity.velocity = Vec2::ZERO;
    entity.health = STARTING_HEALTH;
    entity.armor = STARTING_ARMOR;
    entity.ammo = entity.weapon_config().magazine;
    entity.max_ammo = entity.ammo;
    entity.reload_finish_at = None;
    entity.last_shot_at = None;
    entity.intent = Default::default();
    entity.invulnerable_until = now + SPAWN_INVULN_MS;
    entity.respawn_at = None;

    tracing::debug!("{} respawned at ({:.0}, {:.0})", entity.name, position.x, position.y);

    events.push(GameEvent::Respawn {
        entity_id: entity.id,
        x: position.x,
        y: position.y,
    });
}
