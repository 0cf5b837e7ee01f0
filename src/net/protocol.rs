use serde::{Deserialize, Serialize};

use crate::game::constants::{entity, tick, world};
use crate::game::map::WallSegment;
use crate::game::state::{Entity, EntityId, Millis, Pickup, PickupId, PickupKind, SimulationWorld};
use crate::game::weapons::{self, WeaponConfig, WeaponId};

/// Messages from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Request to join with a display name
    Join { name: String },
    /// Latest control state
    Input(InputState),
    /// Leave the game
    Leave,
    /// Ping for latency measurement
    Ping { timestamp: u64 },
}

/// Messages from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Join accepted: the client's entity plus everything static it needs to render
    JoinAccepted {
        entity_id: EntityId,
        world: WorldConfig,
        weapons: Vec<WeaponConfig>,
    },
    /// Join was rejected
    JoinRejected { reason: String },
    /// Full world snapshot, sent every tick
    Snapshot(Snapshot),
    /// Discrete game event
    Event(GameEvent),
    /// Pong response with server timestamp
    Pong {
        client_timestamp: u64,
        server_timestamp: u64,
    },
}

/// Control state sent by a human client
///
/// Movement is four held directions; the server turns them into a unit
/// vector, so diagonal movement is not faster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Aim angle in radians
    pub aim_angle: f32,
    /// Trigger held
    pub shoot: bool,
    /// Reload requested
    pub reload: bool,
}

/// Static world description sent on join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub entity_radius: f32,
    pub tick_rate: u32,
    pub walls: Vec<WallSegment>,
}

impl WorldConfig {
    pub fn from_world(sim: &SimulationWorld) -> Self {
        Self {
            width: world::WIDTH,
            height: world::HEIGHT,
            entity_radius: entity::RADIUS,
            tick_rate: tick::TICK_RATE,
            walls: sim.walls.clone(),
        }
    }
}

/// Per-entity snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: EntityId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub aim_angle: f32,
    pub health: f32,
    pub armor: f32,
    pub weapon: WeaponId,
    pub ammo: u32,
    pub kills: u32,
    pub deaths: u32,
    pub reloading: bool,
    /// Derived from the spawn protection timestamp at snapshot time
    pub invulnerable: bool,
}

impl PlayerSnapshot {
    pub fn from_entity(entity: &Entity, now: Millis) -> Self {
        Self {
            id: entity.id,
            name: entity.name.clone(),
            x: entity.position.x,
            y: entity.position.y,
            aim_angle: entity.aim_angle,
            health: entity.health,
            armor: entity.armor,
            weapon: entity.weapon,
            ammo: entity.ammo,
            kills: entity.kills,
            deaths: entity.deaths,
            reloading: entity.is_reloading(),
            invulnerable: entity.is_invulnerable(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSnapshot {
    pub id: PickupId,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: PickupKind,
    pub active: bool,
}

impl PickupSnapshot {
    pub fn from_pickup(pickup: &Pickup) -> Self {
        Self {
            id: pickup.id,
            x: pickup.position.x,
            y: pickup.position.y,
            kind: pickup.kind,
            active: pickup.active,
        }
    }
}

/// World state for network transmission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub players: Vec<PlayerSnapshot>,
    pub pickups: Vec<PickupSnapshot>,
}

impl Snapshot {
    pub fn from_world(sim: &SimulationWorld, now: Millis) -> Self {
        Self {
            tick: sim.tick,
            players: sim
                .entities
                .iter()
                .map(|e| PlayerSnapshot::from_entity(e, now))
                .collect(),
            pickups: sim.pickups.iter().map(PickupSnapshot::from_pickup).collect(),
        }
    }
}

/// Game events that clients should be notified about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Accepted fire attempt, hit or miss
    Shoot {
        shooter_id: EntityId,
        x: f32,
        y: f32,
        angle: f32,
        weapon: WeaponId,
    },
    /// One ray or pellet struck a living entity
    ///
    /// `damage` is what landed on armor and health, zero while the target is
    /// invulnerable.
    Hit {
        shooter_id: EntityId,
        target_id: EntityId,
        damage: f32,
        killed: bool,
    },
    PickupCollected { entity_id: EntityId, pickup_id: PickupId },
    Respawn { entity_id: EntityId, x: f32, y: f32 },
    /// A human or bot entered the world
    PlayerJoined { entity_id: EntityId, name: String },
    /// A human or bot left the world
    PlayerLeft { entity_id: EntityId, name: String },
    /// Connected human count
    PlayerCount { n: u32 },
}

/// Weapon catalog as sent in `JoinAccepted`
pub fn weapon_catalog() -> Vec<WeaponConfig> {
    weapons::catalog().to_vec()
}

/// Encode a message using bincode
/// Uses legacy config for fixed-size integers
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::serde::encode_to_vec(message, bincode::config::legacy())
        .map_err(|e| EncodeError(e.to_string()))
}

/// Decode a message using bincode
pub fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, DecodeError> {
    bincode::serde::decode_from_slice(data, bincode::config::legacy())
        .map(|(msg, _)| msg)
        .map_err(|e| DecodeError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(String);

#[derive(Debug, thiserror::Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(String);
