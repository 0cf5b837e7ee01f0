//! Pickup collection and respawn

use crate::game::constants::entity::{MAX_ARMOR, MAX_HEALTH, RADIUS};
use crate::game::constants::pickups::{
    ARMOR_HEAVY_AMOUNT, ARMOR_LIGHT_AMOUNT, HEALTH_LARGE_AMOUNT, HEALTH_SMALL_AMOUNT, RADIUS as PICKUP_RADIUS,
};
use crate::game::map::WallSegment;
use crate::game::state::{Entity, Millis, Pickup, PickupKind, SimulationWorld};
use crate::game::systems::collision::circle_intersects_rect;
use crate::net::protocol::GameEvent;

/// Square footprint of a pickup, centred on its position
fn bounds(pickup: &Pickup) -> WallSegment {
    WallSegment::new(
        pickup.position.x - PICKUP_RADIUS,
        pickup.position.y - PICKUP_RADIUS,
        PICKUP_RADIUS * 2.0,
        PICKUP_RADIUS * 2.0,
    )
}

/// Apply a pickup's effect to an entity
///
/// Returns false without touching the entity when the effect would change
/// nothing (full health, full armor, full magazine of the same weapon).
pub fn apply_effect(entity: &mut Entity, kind: PickupKind) -> bool {
    match kind {
        PickupKind::HealthSmall => heal(entity, HEALTH_SMALL_AMOUNT),
        PickupKind::HealthLarge => heal(entity, HEALTH_LARGE_AMOUNT),
        PickupKind::ArmorLight => add_armor(entity, ARMOR_LIGHT_AMOUNT),
        PickupKind::ArmorHeavy => add_armor(entity, ARMOR_HEAVY_AMOUNT),
        PickupKind::Ammo => {
            if entity.ammo >= entity.max_ammo && !entity.is_reloading() {
                return false;
            }
            entity.ammo = entity.max_ammo;
            entity.reload_finish_at = None;
            true
        }
        PickupKind::Weapon(weapon) => {
            if entity.weapon == weapon && entity.ammo >= entity.max_ammo && !entity.is_reloading() {
                return false;
            }
            entity.equip(weapon);
            true
        }
    }
}

fn heal(entity: &mut Entity, amount: f32) -> bool {
    if entity.health >= MAX_HEALTH {
        return false;
    }
    entity.health = (entity.health + amount).min(MAX_HEALTH);
    true
}

fn add_armor(entity: &mut Entity, amount: f32) -> bool {
    if entity.armor >= MAX_ARMOR {
        return false;
    }
    entity.armor = (entity.armor + amount).min(MAX_ARMOR);
    true
}

/// Let every living human collect the active pickups it overlaps
pub fn collect(world: &mut SimulationWorld, now: Millis, events: &mut Vec<GameEvent>) {
    for entity in world.entities.iter_mut().filter(|e| !e.is_bot() && e.is_alive()) {
        for pickup in world.pickups.iter_mut().filter(|p| p.active) {
            if !circle_intersects_rect(entity.position, RADIUS, &bounds(pickup)) {
                continue;
            }
            if !apply_effect(entity, pickup.kind) {
                continue;
            }

            pickup.active = false;
            pickup.respawn_at = Some(now + pickup.kind.respawn_ms());

            events.push(GameEvent::PickupCollected {
                entity_id: entity.id,
                pickup_id: pickup.id,
            });
        }
    }
}

/// Reactivate every pickup whose respawn time has passed
pub fn respawn_due(world: &mut SimulationWorld, now: Millis) {
    for pickup in world.pickups.iter_mut() {
        if pickup.respawn_at.is_some_and(|at| now >= at) {
            pickup.active = true;
            pickup.respawn_at = None;
        }
    }
}
