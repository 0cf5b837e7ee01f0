//! Bot population balancing
//!
//! Keeps humans plus bots at or above a minimum by adding bots while the
//! server is quiet and removing the oldest ones as humans arrive.

use uuid::Uuid;

use crate::game::state::{Entity, EntityId, EntityKind, Millis, SimulationWorld};
use crate::game::systems::ai::{generate_bot_name, AiManager};
use crate::game::systems::spawn::select_spawn_point;
use crate::net::protocol::GameEvent;

/// Bring the bot count to `max(0, min_total - humans)`
///
/// Returns the signed change in bot count.
pub fn balance(
    world: &mut SimulationWorld,
    ai: &mut AiManager,
    min_total: usize,
    now: Millis,
    events: &mut Vec<GameEvent>,
) -> isize {
    let needed = min_total.saturating_sub(world.human_count());
    let current = world.bot_count();

    if current < needed {
        for _ in current..needed {
            spawn_bot(world, ai, now, events);
        }
    } else if current > needed {
        despawn_oldest_bots(world, ai, current - needed, events);
    }

    needed as isize - current as isize
}

fn spawn_bot(world: &mut SimulationWorld, ai: &mut AiManager, now: Millis, events: &mut Vec<GameEvent>) -> EntityId {
    let id = Uuid::new_v4();
    let name = generate_bot_name(&mut world.rng);
    let living = world.living_positions(None);
    let position = select_spawn_point(&world.spawn_points, &world.walls, &living);

    world.add_entity(Entity::new(id, name.clone(), EntityKind::Bot, position, now));
    ai.register_bot(id, now, &mut world.rng);

    tracing::debug!("Bot {} spawned at ({:.0}, {:.0})", name, position.x, position.y);
    events.push(GameEvent::PlayerJoined { entity_id: id, name });
    id
}

/// Remove the `count` earliest-created bots
fn despawn_oldest_bots(world: &mut SimulationWorld, ai: &mut AiManager, count: usize, events: &mut Vec<GameEvent>) {
    let oldest: Vec<EntityId> = world
        .entities
        .iter()
        .filter(|e| e.is_bot())
        .take(count)
        .map(|e| e.id)
        .collect();

    for id in oldest {
        if let Some(bot) = world.remove_entity(id) {
            ai.unregister_bot(id);
            tracing::debug!("Bot {} despawned", bot.name);
            events.push(GameEvent::PlayerLeft {
                entity_id: id,
                name: bot.name,
            });
        }
    }
}
