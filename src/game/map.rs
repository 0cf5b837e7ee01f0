//! World geometry and fixed placement tables
//!
//! The map is static for the process lifetime: walls and crates, the spawn
//! candidate list, and the pickup spawn table.

use serde::{Deserialize, Serialize};

use crate::game::constants::world;
use crate::game::state::PickupKind;
use crate::game::weapons::WeaponId;
use crate::util::vec2::Vec2;

/// Axis-aligned rectangle; (x, y) is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl WallSegment {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Min and max corners, ordered even for a negative width or height
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let (x0, x1) = (self.x, self.x + self.width);
        let (y0, y1) = (self.y, self.y + self.height);
        (Vec2::new(x0.min(x1), y0.min(y1)), Vec2::new(x0.max(x1), y0.max(y1)))
    }
}

const T: f32 = 40.0;

/// Boundary walls, interior walls and crates
pub const WALLS: &[WallSegment] = &[
    // Boundary
    WallSegment::new(0.0, 0.0, world::WIDTH, T),
    WallSegment::new(0.0, world::HEIGHT - T, world::WIDTH, T),
    WallSegment::new(0.0, 0.0, T, world::HEIGHT),
    WallSegment::new(world::WIDTH - T, 0.0, T, world::HEIGHT),
    // Central cross
    WallSegment::new(900.0, 700.0, 200.0, 40.0),
    WallSegment::new(900.0, 1260.0, 200.0, 40.0),
    WallSegment::new(700.0, 900.0, 40.0, 200.0),
    WallSegment::new(1260.0, 900.0, 40.0, 200.0),
    // Corner bunkers
    WallSegment::new(300.0, 300.0, 250.0, 40.0),
    WallSegment::new(300.0, 300.0, 40.0, 250.0),
    WallSegment::new(1450.0, 300.0, 250.0, 40.0),
    WallSegment::new(1660.0, 300.0, 40.0, 250.0),
    WallSegment::new(300.0, 1660.0, 250.0, 40.0),
    WallSegment::new(300.0, 1450.0, 40.0, 250.0),
    WallSegment::new(1450.0, 1660.0, 250.0, 40.0),
    WallSegment::new(1660.0, 1450.0, 40.0, 250.0),
    // Crates
    WallSegment::new(600.0, 560.0, 60.0, 60.0),
    WallSegment::new(1340.0, 560.0, 60.0, 60.0),
    WallSegment::new(600.0, 1380.0, 60.0, 60.0),
    WallSegment::new(1340.0, 1380.0, 60.0, 60.0),
    WallSegment::new(970.0, 400.0, 60.0, 60.0),
    WallSegment::new(970.0, 1540.0, 60.0, 60.0),
    WallSegment::new(400.0, 970.0, 60.0, 60.0),
    WallSegment::new(1540.0, 970.0, 60.0, 60.0),
];

/// Spawn point candidates, tried in this order
pub const SPAWN_POINTS: &[Vec2] = &[
    Vec2::new(150.0, 150.0),
    Vec2::new(1850.0, 150.0),
    Vec2::new(150.0, 1850.0),
    Vec2::new(1850.0, 1850.0),
    Vec2::new(1000.0, 150.0),
    Vec2::new(1000.0, 1850.0),
    Vec2::new(150.0, 1000.0),
    Vec2::new(1850.0, 1000.0),
    Vec2::new(1000.0, 1000.0),
    Vec2::new(500.0, 800.0),
    Vec2::new(1500.0, 800.0),
    Vec2::new(500.0, 1200.0),
    Vec2::new(1500.0, 1200.0),
];

/// Pickup spawn table: (position, kind). Pickup ids are table indices.
pub const PICKUP_SPAWNS: &[(Vec2, PickupKind)] = &[
    (Vec2::new(1000.0, 850.0), PickupKind::HealthLarge),
    (Vec2::new(1000.0, 1150.0), PickupKind::ArmorHeavy),
    (Vec2::new(420.0, 420.0), PickupKind::HealthSmall),
    (Vec2::new(1580.0, 420.0), PickupKind::HealthSmall),
    (Vec2::new(420.0, 1580.0), PickupKind::ArmorLight),
    (Vec2::new(1580.0, 1580.0), PickupKind::ArmorLight),
    (Vec2::new(250.0, 1000.0), PickupKind::Ammo),
    (Vec2::new(1750.0, 1000.0), PickupKind::Ammo),
    (Vec2::new(1000.0, 250.0), PickupKind::Weapon(WeaponId::Shotgun)),
    (Vec2::new(1000.0, 1750.0), PickupKind::Weapon(WeaponId::Rifle)),
    (Vec2::new(850.0, 1000.0), PickupKind::Weapon(WeaponId::Sniper)),
];

/// Clamp a circle center so the circle stays inside the world
pub fn clamp_to_world(position: Vec2, radius: f32) -> Vec2 {
    Vec2::new(
        position.x.clamp(radius, world::WIDTH - radius),
        position.y.clamp(radius, world::HEIGHT - radius),
    )
}
