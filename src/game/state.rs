//! Simulation state: combatants, pickups and the world that owns them.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::constants::{entity, lifecycle, pickups};
use crate::game::map::{self, WallSegment};
use crate::game::weapons::{WeaponConfig, WeaponId};
use crate::util::vec2::Vec2;

/// Unique combatant identifier
pub type EntityId = Uuid;

/// Pickup identifier (index into the spawn table)
pub type PickupId = u32;

/// Simulation time in milliseconds since session start
pub type Millis = u64;

/// Who drives an entity's intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Human,
    Bot,
}

/// Intent set between ticks by input (humans) or think steps (bots)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    /// Trigger held; fires every tick the cooldown allows
    pub fire: bool,
    /// Reload requested; consumed by the next combat pass
    pub reload: bool,
}

/// A combatant, human or bot
///
/// Bot-only decision state lives in the AI manager keyed by `id`, so every
/// system here is written once against this shape.
#[derive(Debug, Clone)]
pub struct Entity {
    // === Hot: touched by movement and raycasts every tick ===
    pub position: Vec2,
    /// World units per second
    pub velocity: Vec2,
    /// Aim angle in radians
    pub aim_angle: f32,
    pub health: f32,
    pub armor: f32,
    pub respawn_at: Option<Millis>,
    pub invulnerable_until: Millis,

    // === Warm: combat bookkeeping ===
    pub weapon: WeaponId,
    pub ammo: u32,
    pub max_ammo: u32,
    pub last_shot_at: Option<Millis>,
    /// Set while a reload is in progress
    pub reload_finish_at: Option<Millis>,
    pub intent: Intent,
    pub kills: u32,
    pub deaths: u32,

    // === Cold ===
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
}

impl Entity {
    /// Fresh combatant at full stats, invulnerable from `now`
    pub fn new(id: EntityId, name: String, kind: EntityKind, position: Vec2, now: Millis) -> Self {
        let weapon = WeaponId::DEFAULT;
        let magazine = weapon.config().magazine;
        Self {
            position,
            velocity: Vec2::ZERO,
            aim_angle: 0.0,
            health: entity::STARTING_HEALTH,
            armor: entity::STARTING_ARMOR,
            respawn_at: None,
            invulnerable_until: now + lifecycle::SPAWN_INVULN_MS,
            weapon,
            ammo: magazine,
            max_ammo: magazine,
            last_shot_at: None,
            reload_finish_at: None,
            intent: Intent::default(),
            kills: 0,
            deaths: 0,
            id,
            name,
            kind,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.kind == EntityKind::Bot
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0 && self.respawn_at.is_none()
    }

    pub fn is_invulnerable(&self, now: Millis) -> bool {
        self.invulnerable_until > now
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_finish_at.is_some()
    }

    pub fn weapon_config(&self) -> &'static WeaponConfig {
        self.weapon.config()
    }

    /// Switch weapon with a full magazine, abandoning any reload
    pub fn equip(&mut self, weapon: WeaponId) {
        let magazine = weapon.config().magazine;
        self.weapon = weapon;
        self.ammo = magazine;
        self.max_ammo = magazine;
        self.reload_finish_at = None;
    }
}

/// Pickup type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    HealthSmall,
    HealthLarge,
    ArmorLight,
    ArmorHeavy,
    Ammo,
    Weapon(WeaponId),
}

impl PickupKind {
    /// Delay between collection and reappearance
    pub fn respawn_ms(&self) -> Millis {
        match self {
            PickupKind::HealthSmall | PickupKind::HealthLarge => pickups::HEALTH_RESPAWN_MS,
            PickupKind::ArmorLight | PickupKind::ArmorHeavy => pickups::ARMOR_RESPAWN_MS,
            PickupKind::Ammo => pickups::AMMO_RESPAWN_MS,
            PickupKind::Weapon(_) => pickups::WEAPON_RESPAWN_MS,
        }
    }
}

/// World pickup with an active/cooldown lifecycle
#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: PickupId,
    pub position: Vec2,
    pub kind: PickupKind,
    pub active: bool,
    pub respawn_at: Option<Millis>,
}

impl Pickup {
    pub fn new(id: PickupId, position: Vec2, kind: PickupKind) -> Self {
        Self {
            id,
            position,
            kind,
            active: true,
            respawn_at: None,
        }
    }
}

/// The complete simulation state, owned by the tick scheduler
pub struct SimulationWorld {
    /// Combatants in creation order (humans and bots interleaved)
    pub entities: Vec<Entity>,
    pub pickups: Vec<Pickup>,
    pub walls: Vec<WallSegment>,
    pub spawn_points: Vec<Vec2>,
    pub rng: StdRng,
    pub tick: u64,
}

impl SimulationWorld {
    /// World built from the static map tables
    pub fn new() -> Self {
        Self::from_map(StdRng::from_entropy())
    }

    /// Static map layout with a caller-provided RNG (seeded in tests and benches)
    pub fn from_map(rng: StdRng) -> Self {
        let pickups = map::PICKUP_SPAWNS
            .iter()
            .enumerate()
            .map(|(i, (position, kind))| Pickup::new(i as PickupId, *position, *kind))
            .collect();
        Self::with_layout(
            map::WALLS.to_vec(),
            map::SPAWN_POINTS.to_vec(),
            pickups,
            rng,
        )
    }

    pub fn with_layout(
        walls: Vec<WallSegment>,
        spawn_points: Vec<Vec2>,
        pickups: Vec<Pickup>,
        rng: StdRng,
    ) -> Self {
        Self {
            entities: Vec::new(),
            pickups,
            walls,
            spawn_points,
            rng,
            tick: 0,
        }
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Remove an entity, preserving the creation order of the rest
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index_of(id)?;
        Some(self.entities.remove(index))
    }

    pub fn human_count(&self) -> usize {
        self.entities.iter().filter(|e| !e.is_bot()).count()
    }

    pub fn bot_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_bot()).count()
    }

    /// Positions of every living entity, optionally excluding one id
    pub fn living_positions(&self, exclude: Option<EntityId>) -> Vec<Vec2> {
        self.entities
            .iter()
            .filter(|e| e.is_alive() && Some(e.id) != exclude)
            .map(|e| e.position)
            .collect()
    }
}

impl Default for SimulationWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human(now: Millis) -> Entity {
        Entity::new(Uuid::new_v4(), "Tester".to_string(), EntityKind::Human, Vec2::new(100.0, 100.0), now)
    }

    #[test]
    fn test_entity_new_full_stats() {
        let e = human(1000);
        assert!(e.is_alive());
        assert!(!e.is_bot());
        assert_eq!(e.health, entity::STARTING_HEALTH);
        assert_eq!(e.armor, entity::STARTING_ARMOR);
        assert_eq!(e.weapon, WeaponId::DEFAULT);
        assert_eq!(e.ammo, e.max_ammo);
        assert!(e.last_shot_at.is_none());
        assert!(!e.is_reloading());
    }

    #[test]
    fn test_spawn_invulnerability_window() {
        let e = human(1000);
        assert!(e.is_invulnerable(1000));
        assert!(e.is_invulnerable(1000 + lifecycle::SPAWN_INVULN_MS - 1));
        assert!(!e.is_invulnerable(1000 + lifecycle::SPAWN_INVULN_MS));
    }

    #[test]
    fn test_dead_pending_respawn_is_not_alive() {
        let mut e = human(0);
        e.health = 0.0;
        e.respawn_at = Some(5000);
        assert!(!e.is_alive());
    }

    #[test]
    fn test_equip_resets_magazine_and_reload() {
        let mut e = human(0);
        e.ammo = 0;
        e.reload_finish_at = Some(500);
        e.equip(WeaponId::Shotgun);
        assert_eq!(e.weapon, WeaponId::Shotgun);
        assert_eq!(e.ammo, WeaponId::Shotgun.config().magazine);
        assert_eq!(e.max_ammo, e.ammo);
        assert!(!e.is_reloading());
    }

    #[test]
    fn test_world_from_map_tables() {
        let world = SimulationWorld::new();
        assert_eq!(world.walls.len(), map::WALLS.len());
        assert_eq!(world.pickups.len(), map::PICKUP_SPAWNS.len());
        assert!(world.pickups.iter().all(|p| p.active));
        assert!(world.entities.is_empty());
    }

    #[test]
    fn test_remove_entity_keeps_order() {
        let mut world = SimulationWorld::new();
        let a = human(0);
        let b = human(0);
        let c = human(0);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        world.add_entity(a);
        world.add_entity(b);
        world.add_entity(c);

        assert!(world.remove_entity(b_id).is_some());
        let ids: Vec<EntityId> = world.entities.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a_id, c_id]);
        assert!(world.remove_entity(b_id).is_none());
    }

    #[test]
    fn test_living_positions_excludes_dead_and_self() {
        let mut world = SimulationWorld::new();
        let a = human(0);
        let mut b = human(0);
        b.health = 0.0;
        b.respawn_at = Some(100);
        let c = human(0);
        let a_id = a.id;
        world.add_entity(a);
        world.add_entity(b);
        world.add_entity(c);

        assert_eq!(world.living_positions(Some(a_id)).len(), 1);
        assert_eq!(world.living_positions(None).len(), 2);
    }

    #[test]
    fn test_pickup_respawn_delays() {
        assert_eq!(PickupKind::HealthSmall.respawn_ms(), pickups::HEALTH_RESPAWN_MS);
        assert_eq!(PickupKind::ArmorHeavy.respawn_ms(), pickups::ARMOR_RESPAWN_MS);
        assert_eq!(PickupKind::Weapon(WeaponId::Rifle).respawn_ms(), pickups::WEAPON_RESPAWN_MS);
    }
}
