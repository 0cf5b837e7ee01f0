//! Combat resolution: fire gating, hitscan rays, damage and kill attribution.
//!
//! Humans and bots share every function here. Firing is rate limited by the
//! weapon cooldown, consumes one round per trigger pull, and resolves each ray
//! against the nearest wall and the nearest living entity.

use rand::Rng;

use crate::game::constants::combat::ARMOR_ABSORPTION;
use crate::game::constants::entity::RADIUS;
use crate::game::constants::lifecycle::RESPAWN_DELAY_MS;
use crate::game::state::{Entity, EntityId, Millis, SimulationWorld};
use crate::game::systems::collision::{nearest_wall_hit, ray_intersects_circle};
use crate::net::protocol::GameEvent;
use crate::util::vec2::Vec2;

/// Result of damage that actually landed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub armor_absorbed: f32,
    pub health_lost: f32,
    pub killed: bool,
}

impl DamageOutcome {
    /// Damage that landed, armor and health together
    pub fn total(&self) -> f32 {
        self.armor_absorbed + self.health_lost
    }
}

/// Try to fire the weapon of the entity at `shooter_idx`
///
/// Silently rejected (no state change) if the shooter is dead, invulnerable,
/// reloading, out of ammo, or still inside the weapon cooldown. On success a
/// `Shoot` event is always emitted, followed by one `Hit` per ray that strikes
/// a living entity. Emptying the magazine starts a reload.
pub fn attempt_fire(world: &mut SimulationWorld, shooter_idx: usize, now: Millis, events: &mut Vec<GameEvent>) -> bool {
    let Some(shooter) = world.entities.get_mut(shooter_idx) else {
        return false;
    };

    if !shooter.is_alive() || shooter.is_invulnerable(now) || shooter.is_reloading() || shooter.ammo == 0 {
        return false;
    }

    let weapon = shooter.weapon_config();
    if let Some(last) = shooter.last_shot_at {
        if (now.saturating_sub(last) as f32) < weapon.cooldown_ms() {
            return false;
        }
    }

    shooter.last_shot_at = Some(now);
    shooter.ammo -= 1;

    let shooter_id = shooter.id;
    let origin = shooter.position;
    let aim = shooter.aim_angle;

    events.push(GameEvent::Shoot {
        shooter_id,
        x: origin.x,
        y: origin.y,
        angle: aim,
        weapon: weapon.id,
    });

    let max_offset = weapon.fire_mode.max_offset();
    for _ in 0..weapon.fire_mode.ray_count() {
        let offset = if max_offset > 0.0 {
            world.rng.gen_range(-max_offset..=max_offset)
        } else {
            0.0
        };
        let dir = Vec2::from_angle(aim + offset);

        let Some(target_idx) = resolve_ray(world, shooter_idx, origin, dir, weapon.range) else {
            continue;
        };

        let target_id = world.entities[target_idx].id;
        let outcome = apply_damage(world, target_id, weapon.damage, Some(shooter_id), now);
        let (damage, killed) = match outcome {
            Some(o) => (o.total(), o.killed),
            None => (0.0, false),
        };

        if killed {
            tracing::debug!("{} killed {} with {:?}", shooter_id, target_id, weapon.id);
        }

        events.push(GameEvent::Hit {
            shooter_id,
            target_id,
            damage,
            killed,
        });
    }

    let shooter = &mut world.entities[shooter_idx];
    if shooter.ammo == 0 {
        start_reload(shooter, now);
    }

    true
}

/// Index of the living entity a ray strikes, if it is strictly closer than
/// any wall along the ray. The shooter is never a candidate.
pub fn resolve_ray(world: &SimulationWorld, shooter_idx: usize, origin: Vec2, dir: Vec2, range: f32) -> Option<usize> {
    let wall_t = nearest_wall_hit(origin, dir, range, &world.walls);

    let mut nearest: Option<(usize, f32)> = None;
    for (i, entity) in world.entities.iter().enumerate() {
        if i == shooter_idx || !entity.is_alive() {
            continue;
        }
        if let Some(t) = ray_intersects_circle(origin, dir, range, entity.position, RADIUS) {
            if nearest.map_or(true, |(_, best)| t < best) {
                nearest = Some((i, t));
            }
        }
    }

    let (idx, entity_t) = nearest?;
    match wall_t {
        Some(w) if w <= entity_t => None,
        _ => Some(idx),
    }
}

/// Apply damage to `target_id`
///
/// No-op (returns `None`) for unknown, dead or invulnerable targets. Armor
/// soaks `min(armor, amount * 0.33)`; the rest comes off health, floored at
/// zero, and `health_lost` counts only the health the target actually had. A kill credits the attacker (if it still exists and is not the
/// target) and schedules the respawn.
pub fn apply_damage(
    world: &mut SimulationWorld,
    target_id: EntityId,
    amount: f32,
    attacker_id: Option<EntityId>,
    now: Millis,
) -> Option<DamageOutcome> {
    let target = world.entity_mut(target_id)?;
    if !target.is_alive() || target.is_invulnerable(now) {
        return None;
    }

    let armor_absorbed = target.armor.min(amount * ARMOR_ABSORPTION);
    let health_before = target.health;
    target.armor -= armor_absorbed;
    target.health = (health_before - (amount - armor_absorbed)).max(0.0);
    let health_lost = health_before - target.health;

    let killed = target.health <= 0.0;
    if killed {
        kill(target, now);
        if let Some(attacker) = attacker_id.filter(|id| *id != target_id) {
            if let Some(attacker) = world.entity_mut(attacker) {
                attacker.kills += 1;
            }
        }
    }

    Some(DamageOutcome {
        armor_absorbed,
        health_lost,
        killed,
    })
}

/// Move an entity into the dead-pending-respawn state
fn kill(entity: &mut Entity, now: Millis) {
    entity.health = 0.0;
    entity.deaths += 1;
    entity.respawn_at = Some(now + RESPAWN_DELAY_MS);
    entity.velocity = Vec2::ZERO;
    entity.intent = Default::default();
}

/// Begin a reload. Ignored while dead or already reloading.
pub fn start_reload(entity: &mut Entity, now: Millis) -> bool {
    if !entity.is_alive() || entity.is_reloading() {
        return false;
    }
    entity.reload_finish_at = Some(now + entity.weapon_config().reload_ms());
    true
}

/// Finish a reload whose timestamp has passed, refilling the magazine
pub fn complete_reload(entity: &mut Entity, now: Millis) -> bool {
    match entity.reload_finish_at {
        Some(finish) if now >= finish => {
            entity.ammo = entity.weapon_config().magazine;
            entity.max_ammo = entity.ammo;
            entity.reload_finish_at = None;
            true
        }
        _ => false,
    }
}

/// Resolve held-trigger and reload intents for every living entity
pub fn process_intents(world: &mut SimulationWorld, now: Millis, events: &mut Vec<GameEvent>) {
    for idx in 0..world.entities.len() {
        let entity = &mut world.entities[idx];
        if !entity.is_alive() {
            continue;
        }

        if std::mem::take(&mut entity.intent.reload) {
            start_reload(entity, now);
        }

        if entity.intent.fire {
            attempt_fire(world, idx, now, events);
        }
    }
}
