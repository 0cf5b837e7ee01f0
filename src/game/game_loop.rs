//! Tick scheduler and inbound handlers
//!
//! `GameLoop` is the single owner of the simulation. Joins, inputs and
//! disconnects mutate intent or membership between ticks; only `tick` turns
//! intent into movement, combat and lifecycle outcomes.

use tracing::{info, warn};
use uuid::Uuid;

use crate::game::constants::entity::{MAX_NAME_LEN, SPEED};
use crate::game::constants::population::{MAX_HUMANS, MIN_PLAYER_COUNT};
use crate::game::constants::tick::MAX_TICK_ELAPSED_MS;
use crate::game::input_buffer::{InputBuffer, InputSender};
use crate::game::state::{Entity, EntityId, EntityKind, Millis, SimulationWorld};
use crate::game::systems::ai::AiManager;
use crate::game::systems::spawn::select_spawn_point;
use crate::game::systems::{combat, lifecycle, movement, pickups, population};
use crate::game::weapons::WeaponConfig;
use crate::net::protocol::{weapon_catalog, GameEvent, InputState, Snapshot, WorldConfig};
use crate::util::vec2::Vec2;

/// Population limits
#[derive(Debug, Clone)]
pub struct GameLoopConfig {
    /// Humans allowed at once; further joins are rejected
    pub max_humans: usize,
    /// Humans plus bots kept at or above this count
    pub min_player_count: usize,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            max_humans: MAX_HUMANS,
            min_player_count: MIN_PLAYER_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("server is full ({max} players)")]
    ServerFull { max: usize },
    #[error("invalid display name")]
    InvalidName,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TickError {
    #[error("entity {entity} has a non-finite position after movement")]
    NonFiniteState { entity: EntityId },
    #[error("tick panicked: {0}")]
    Panicked(String),
}

/// Reply to a successful join
#[derive(Debug, Clone)]
pub struct Joined {
    pub entity_id: EntityId,
    pub world: WorldConfig,
    pub weapons: Vec<WeaponConfig>,
    /// Events caused by the join, for broadcast
    pub events: Vec<GameEvent>,
}

/// Everything a tick produces
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub events: Vec<GameEvent>,
    pub snapshot: Snapshot,
}

pub struct GameLoop {
    world: SimulationWorld,
    ai: AiManager,
    input_buffer: InputBuffer,
    config: GameLoopConfig,
    last_tick_at: Option<Millis>,
}

impl GameLoop {
    pub fn new(config: GameLoopConfig) -> Self {
        Self::with_world(SimulationWorld::new(), config)
    }

    pub fn with_world(world: SimulationWorld, config: GameLoopConfig) -> Self {
        Self {
            world,
            ai: AiManager::new(),
            input_buffer: InputBuffer::default(),
            config,
            last_tick_at: None,
        }
    }

    pub fn world(&self) -> &SimulationWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SimulationWorld {
        &mut self.world
    }

    pub fn config(&self) -> &GameLoopConfig {
        &self.config
    }

    pub fn human_count(&self) -> usize {
        self.world.human_count()
    }

    pub fn bot_count(&self) -> usize {
        self.world.bot_count()
    }

    /// Sender handle for connection tasks
    pub fn input_sender(&self) -> InputSender {
        self.input_buffer.sender()
    }

    /// Fill the empty world with bots
    pub fn populate(&mut self, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        population::balance(&mut self.world, &mut self.ai, self.config.min_player_count, now, &mut events);
        events
    }

    /// Create a human entity at a selected spawn point
    pub fn join(&mut self, name: &str, now: Millis) -> Result<Joined, JoinError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(JoinError::InvalidName);
        }

        let humans = self.world.human_count();
        if humans >= self.config.max_humans {
            return Err(JoinError::ServerFull {
                max: self.config.max_humans,
            });
        }

        let living = self.world.living_positions(None);
        let position = select_spawn_point(&self.world.spawn_points, &self.world.walls, &living);
        let entity_id = Uuid::new_v4();
        self.world
            .add_entity(Entity::new(entity_id, name.to_string(), EntityKind::Human, position, now));

        info!("{} joined as {} ({} humans)", name, entity_id, humans + 1);

        let mut events = vec![GameEvent::PlayerJoined {
            entity_id,
            name: name.to_string(),
        }];
        population::balance(&mut self.world, &mut self.ai, self.config.min_player_count, now, &mut events);
        events.push(self.player_count());

        Ok(Joined {
            entity_id,
            world: WorldConfig::from_world(&self.world),
            weapons: weapon_catalog(),
            events,
        })
    }

    /// Remove a human immediately and rebalance bots
    ///
    /// Unknown ids and bot ids are ignored.
    pub fn disconnect(&mut self, entity_id: EntityId, now: Millis) -> Vec<GameEvent> {
        let is_human = self.world.entity(entity_id).is_some_and(|e| !e.is_bot());
        if !is_human {
            return Vec::new();
        }
        let Some(entity) = self.world.remove_entity(entity_id) else {
            return Vec::new();
        };

        info!("{} ({}) left", entity.name, entity_id);

        let mut events = vec![GameEvent::PlayerLeft {
            entity_id,
            name: entity.name,
        }];
        population::balance(&mut self.world, &mut self.ai, self.config.min_player_count, now, &mut events);
        events.push(self.player_count());
        events
    }

    /// Set movement, aim and trigger intent on a living human
    ///
    /// Unknown, dead and bot entities are ignored. A non-finite aim angle is
    /// dropped and the previous aim kept.
    pub fn apply_input(&mut self, entity_id: EntityId, input: InputState) -> bool {
        let Some(entity) = self.world.entity_mut(entity_id) else {
            return false;
        };
        if entity.is_bot() || !entity.is_alive() {
            return false;
        }

        let dir = Vec2::new(
            axis(input.left, input.right),
            axis(input.up, input.down),
        );
        entity.velocity = dir.normalize() * SPEED;

        if input.aim_angle.is_finite() {
            entity.aim_angle = input.aim_angle;
        } else {
            warn!("Ignoring non-finite aim from {}", entity_id);
        }

        entity.intent.fire = input.shoot;
        entity.intent.reload |= input.reload;
        true
    }

    /// Advance the simulation to `now`
    ///
    /// Steps run in a fixed order: bot thinks, movement (bots then humans),
    /// held-trigger combat, pickup collection, respawns and reloads, pickup
    /// reactivation, snapshot. An error abandons the remaining steps; state
    /// mutated before the failure is kept.
    pub fn tick(&mut self, now: Millis) -> Result<TickOutput, TickError> {
        let elapsed = self
            .last_tick_at
            .map_or(0, |last| now.saturating_sub(last))
            .min(MAX_TICK_ELAPSED_MS);
        self.last_tick_at = Some(now);
        let dt = elapsed as f32 / 1000.0;

        self.world.tick += 1;

        for message in self.input_buffer.drain() {
            self.apply_input(message.entity_id, message.input);
        }

        let mut events = Vec::new();

        self.ai.think_due(&mut self.world, now, &mut events);

        let blocked = movement::update(&mut self.world, dt);
        self.ai.handle_blocked(&mut self.world, &blocked, now);
        if let Some(entity) = self.world.entities.iter().find(|e| !e.position.is_finite()) {
            return Err(TickError::NonFiniteState { entity: entity.id });
        }

        combat::process_intents(&mut self.world, now, &mut events);

        pickups::collect(&mut self.world, now, &mut events);

        lifecycle::update(&mut self.world, now, &mut events);

        pickups::respawn_due(&mut self.world, now);

        let snapshot = Snapshot::from_world(&self.world, now);
        Ok(TickOutput { events, snapshot })
    }

    /// Repair NaN/infinite entity state. Returns the number of entities fixed.
    pub fn sanitize(&mut self) -> usize {
        let mut fixed = 0;
        for idx in 0..self.world.entities.len() {
            let entity = &self.world.entities[idx];
            let bad_position = !entity.position.is_finite();
            let bad_velocity = !entity.velocity.is_finite();
            let bad_aim = !entity.aim_angle.is_finite();
            if !(bad_position || bad_velocity || bad_aim) {
                continue;
            }

            let position = if bad_position {
                let living = self.world.living_positions(Some(entity.id));
                Some(select_spawn_point(&self.world.spawn_points, &self.world.walls, &living))
            } else {
                None
            };

            let entity = &mut self.world.entities[idx];
            warn!("Fixed non-finite state for {}", entity.id);
            if let Some(position) = position {
                entity.position = position;
            }
            if bad_velocity {
                entity.velocity = Vec2::ZERO;
            }
            if bad_aim {
                entity.aim_angle = 0.0;
            }
            fixed += 1;
        }
        fixed
    }

    fn player_count(&self) -> GameEvent {
        GameEvent::PlayerCount {
            n: self.world.human_count() as u32,
        }
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new(GameLoopConfig::default())
    }
}

#[inline]
fn axis(negative: bool, positive: bool) -> f32 {
    positive as i8 as f32 - negative as i8 as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::entity::{MAX_ARMOR, MAX_HEALTH};
    use crate::game::constants::lifecycle::SPAWN_INVULN_MS;
    use crate::game::constants::tick::TICK_DURATION_US;
    use crate::util::vec2::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_loop(config: GameLoopConfig) -> GameLoop {
        GameLoop::with_world(SimulationWorld::from_map(StdRng::seed_from_u64(2024)), config)
    }

    fn humans_only() -> GameLoopConfig {
        GameLoopConfig {
            max_humans: 4,
            min_player_count: 0,
        }
    }

    fn count<F: Fn(&GameEvent) -> bool>(events: &[GameEvent], pred: F) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_join_spawns_human_and_rebalances() {
        let mut game = create_test_loop(GameLoopConfig::default());
        game.populate(0);
        assert_eq!(game.bot_count(), MIN_PLAYER_COUNT);

        let joined = game.join("Alice", 100).unwrap();
        assert_eq!(game.human_count(), 1);
        assert_eq!(game.bot_count(), MIN_PLAYER_COUNT - 1);
        assert!(game.world().entity(joined.entity_id).unwrap().is_invulnerable(100));
        assert_eq!(joined.weapons.len(), 4);
        assert!(matches!(joined.events.first(), Some(GameEvent::PlayerJoined { name, .. }) if name == "Alice"));
        assert!(matches!(joined.events.last(), Some(GameEvent::PlayerCount { n: 1 })));
        assert_eq!(count(&joined.events, |e| matches!(e, GameEvent::PlayerLeft { .. })), 1);
    }

    #[test]
    fn test_join_rejected_when_full() {
        let mut game = create_test_loop(GameLoopConfig {
            max_humans: 1,
            min_player_count: 0,
        });
        game.join("One", 0).unwrap();
        assert_eq!(game.join("Two", 0).unwrap_err(), JoinError::ServerFull { max: 1 });
        assert_eq!(game.human_count(), 1);
    }

    #[test]
    fn test_join_rejects_bad_names() {
        let mut game = create_test_loop(humans_only());
        assert_eq!(game.join("   ", 0).unwrap_err(), JoinError::InvalidName);
        assert_eq!(game.join("ThisNameIsWayTooLong", 0).unwrap_err(), JoinError::InvalidName);
        assert_eq!(game.human_count(), 0);
    }

    #[test]
    fn test_disconnect_restores_bots() {
        let mut game = create_test_loop(GameLoopConfig::default());
        game.populate(0);
        let id = game.join("Bob", 0).unwrap().entity_id;

        let events = game.disconnect(id, 500);
        assert!(game.world().entity(id).is_none());
        assert_eq!(game.bot_count(), MIN_PLAYER_COUNT);
        assert!(matches!(events.first(), Some(GameEvent::PlayerLeft { entity_id, .. }) if *entity_id == id));
        assert!(matches!(events.last(), Some(GameEvent::PlayerCount { n: 0 })));

        assert!(game.disconnect(id, 600).is_empty());
    }

    #[test]
    fn test_disconnect_ignores_bots() {
        let mut game = create_test_loop(GameLoopConfig::default());
        game.populate(0);
        let bot_id = game.world().entities[0].id;
        assert!(game.disconnect(bot_id, 0).is_empty());
        assert_eq!(game.bot_count(), MIN_PLAYER_COUNT);
    }

    #[test]
    fn test_input_sets_unit_velocity() {
        let mut game = create_test_loop(humans_only());
        let id = game.join("Mover", 0).unwrap().entity_id;

        let input = InputState {
            up: true,
            right: true,
            aim_angle: 0.5,
            ..Default::default()
        };
        assert!(game.apply_input(id, input));

        let e = game.world().entity(id).unwrap();
        assert!((e.velocity.length() - SPEED).abs() < 1e-3);
        assert!(e.velocity.x > 0.0 && e.velocity.y < 0.0);
        assert_eq!(e.aim_angle, 0.5);
    }

    #[test]
    fn test_input_non_finite_aim_ignored() {
        let mut game = create_test_loop(humans_only());
        let id = game.join("Aimer", 0).unwrap().entity_id;
        game.apply_input(id, InputState { aim_angle: 1.0, ..Default::default() });
        game.apply_input(id, InputState { aim_angle: f32::NAN, ..Default::default() });
        assert_eq!(game.world().entity(id).unwrap().aim_angle, 1.0);
    }

    #[test]
    fn test_input_for_dead_or_unknown_ignored() {
        let mut game = create_test_loop(humans_only());
        let id = game.join("Ghost", 0).unwrap().entity_id;
        {
            let e = game.world_mut().entity_mut(id).unwrap();
            e.health = 0.0;
            e.respawn_at = Some(3000);
        }
        let input = InputState { left: true, ..Default::default() };
        assert!(!game.apply_input(id, input));
        assert!(!game.apply_input(Uuid::new_v4(), input));
        assert_eq!(game.world().entity(id).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_queued_input_last_write_wins() {
        let mut game = create_test_loop(humans_only());
        let id = game.join("Queue", 0).unwrap().entity_id;

        let sender = game.input_sender();
        assert!(sender.try_send(id, InputState { left: true, ..Default::default() }).is_ok());
        assert!(sender.try_send(id, InputState { right: true, ..Default::default() }).is_ok());
        game.tick(16).unwrap();

        assert!(game.world().entity(id).unwrap().velocity.x > 0.0);
    }

    #[test]
    fn test_reload_cycle_through_ticks() {
        let mut game = create_test_loop(humans_only());
        let id = game.join("Shooter", 0).unwrap().entity_id;
        let hold = InputState { shoot: true, ..Default::default() };
        game.apply_input(id, hold);

        // Spawn protection blocks firing until it expires
        let mut now = SPAWN_INVULN_MS;
        let mut shots = 0;
        while shots < 12 {
            let out = game.tick(now).unwrap();
            shots += count(&out.events, |e| matches!(e, GameEvent::Shoot { .. }));
            now += 250;
        }
        game.apply_input(id, InputState::default());

        let e = game.world().entity(id).unwrap();
        assert_eq!(e.ammo, 0);
        assert!(e.is_reloading());
        let finish = e.reload_finish_at.unwrap();

        game.tick(finish - 1).unwrap();
        assert!(game.world().entity(id).unwrap().is_reloading());

        let out = game.tick(finish).unwrap();
        let e = game.world().entity(id).unwrap();
        assert_eq!(e.ammo, 12);
        assert!(!e.is_reloading());
        assert!(!out.snapshot.players[0].reloading);
    }

    #[test]
    fn test_snapshot_lists_every_entity_and_pickup() {
        let mut game = create_test_loop(GameLoopConfig::default());
        game.populate(0);
        game.join("Snap", 0).unwrap();

        let out = game.tick(16).unwrap();
        assert_eq!(out.snapshot.players.len(), game.world().entities.len());
        assert_eq!(out.snapshot.pickups.len(), game.world().pickups.len());
        assert_eq!(out.snapshot.tick, 1);
    }

    #[test]
    fn test_tick_rejects_non_finite_positions() {
        let mut game = create_test_loop(humans_only());
        let id = game.join("Broken", 0).unwrap().entity_id;
        game.world_mut().entity_mut(id).unwrap().position = Vec2::new(f32::NAN, 10.0);

        assert_eq!(game.tick(16).unwrap_err(), TickError::NonFiniteState { entity: id });
    }

    #[test]
    fn test_sanitize_repairs_state() {
        let mut game = create_test_loop(humans_only());
        let id = game.join("Fixme", 0).unwrap().entity_id;
        {
            let e = game.world_mut().entity_mut(id).unwrap();
            e.position = Vec2::new(f32::INFINITY, 0.0);
            e.velocity = Vec2::new(f32::NAN, 0.0);
        }

        assert_eq!(game.sanitize(), 1);
        let e = game.world().entity(id).unwrap();
        assert!(e.position.is_finite());
        assert_eq!(e.velocity, Vec2::ZERO);
        assert_eq!(game.sanitize(), 0);
        assert!(game.tick(16).is_ok());
    }

    #[test]
    fn test_invariants_hold_over_long_run() {
        let mut game = create_test_loop(GameLoopConfig::default());
        game.populate(0);
        let id = game.join("Soak", 0).unwrap().entity_id;
        game.apply_input(id, InputState { down: true, shoot: true, ..Default::default() });

        let step = TICK_DURATION_US / 1000;
        let mut now = 0;
        for _ in 0..3600 {
            now += step;
            game.tick(now).unwrap();
            for e in &game.world().entities {
                assert!((0.0..=MAX_HEALTH).contains(&e.health), "{} health {}", e.name, e.health);
                assert!((0.0..=MAX_ARMOR).contains(&e.armor), "{} armor {}", e.name, e.armor);
                assert!(e.ammo <= e.max_ammo);
                assert_eq!(e.is_alive(), e.respawn_at.is_none());
                assert!(e.position.is_finite());
            }
        }
        assert_eq!(game.bot_count(), MIN_PLAYER_COUNT - 1);
    }
}
