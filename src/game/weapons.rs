//! Weapon catalog
//!
//! Weapons are a closed enum; per-weapon combat parameters come from a static
//! table indexed by the enum, so combat code never branches on names.

use serde::{Deserialize, Serialize};

/// Weapon identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponId {
    Pistol,
    Rifle,
    Shotgun,
    Sniper,
}

impl WeaponId {
    pub const ALL: [WeaponId; 4] = [
        WeaponId::Pistol,
        WeaponId::Rifle,
        WeaponId::Shotgun,
        WeaponId::Sniper,
    ];

    /// Weapon every entity spawns with
    pub const DEFAULT: WeaponId = WeaponId::Pistol;

    pub fn config(self) -> &'static WeaponConfig {
        match self {
            WeaponId::Pistol => &CATALOG[0],
            WeaponId::Rifle => &CATALOG[1],
            WeaponId::Shotgun => &CATALOG[2],
            WeaponId::Sniper => &CATALOG[3],
        }
    }
}

/// How a single trigger pull resolves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FireMode {
    /// One ray with a symmetric random bloom offset in `[-bloom, bloom]`
    Hitscan { bloom: f32 },
    /// `count` rays, each with an independent offset in `[-spread, spread]`
    Pellets { count: u32, spread: f32 },
}

impl FireMode {
    /// Number of rays cast per shot
    pub fn ray_count(&self) -> u32 {
        match *self {
            FireMode::Hitscan { .. } => 1,
            FireMode::Pellets { count, .. } => count,
        }
    }

    /// Half-width of the random angular offset applied to each ray
    pub fn max_offset(&self) -> f32 {
        match *self {
            FireMode::Hitscan { bloom } => bloom,
            FireMode::Pellets { spread, .. } => spread,
        }
    }
}

/// Static combat parameters for one weapon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponConfig {
    pub id: WeaponId,
    /// Damage per ray (per pellet for shotguns)
    pub damage: f32,
    /// Shots per second
    pub rate_of_fire: f32,
    pub magazine: u32,
    /// Reload duration in seconds
    pub reload_secs: f32,
    /// Maximum ray length in world units
    pub range: f32,
    pub fire_mode: FireMode,
}

impl WeaponConfig {
    /// Minimum time between accepted shots
    pub fn cooldown_ms(&self) -> f32 {
        1000.0 / self.rate_of_fire
    }

    pub fn reload_ms(&self) -> u64 {
        (self.reload_secs * 1000.0).round() as u64
    }
}

static CATALOG: [WeaponConfig; 4] = [
    WeaponConfig {
        id: WeaponId::Pistol,
        damage: 20.0,
        rate_of_fire: 4.0,
        magazine: 12,
        reload_secs: 1.2,
        range: 800.0,
        fire_mode: FireMode::Hitscan { bloom: 0.03 },
    },
    WeaponConfig {
        id: WeaponId::Rifle,
        damage: 15.0,
        rate_of_fire: 10.0,
        magazine: 30,
        reload_secs: 2.0,
        range: 1000.0,
        fire_mode: FireMode::Hitscan { bloom: 0.06 },
    },
    WeaponConfig {
        id: WeaponId::Shotgun,
        damage: 10.0,
        rate_of_fire: 1.2,
        magazine: 6,
        reload_secs: 2.5,
        range: 450.0,
        fire_mode: FireMode::Pellets {
            count: 10,
            spread: 0.25,
        },
    },
    WeaponConfig {
        id: WeaponId::Sniper,
        damage: 80.0,
        rate_of_fire: 0.8,
        magazine: 5,
        reload_secs: 3.0,
        range: 1600.0,
        fire_mode: FireMode::Hitscan { bloom: 0.0 },
    },
];

/// Full catalog, in `WeaponId::ALL` order
pub fn catalog() -> &'static [WeaponConfig] {
    &CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_lookup_matches_id() {
        for id in WeaponId::ALL {
            assert_eq!(id.config().id, id);
        }
    }

    #[test]
    fn test_catalog_order() {
        let ids: Vec<WeaponId> = catalog().iter().map(|w| w.id).collect();
        assert_eq!(ids, WeaponId::ALL.to_vec());
    }

    #[test]
    fn test_cooldown() {
        assert_eq!(WeaponId::Pistol.config().cooldown_ms(), 250.0);
        assert_eq!(WeaponId::Rifle.config().cooldown_ms(), 100.0);
    }

    #[test]
    fn test_reload_ms() {
        assert_eq!(WeaponId::Pistol.config().reload_ms(), 1200);
        assert_eq!(WeaponId::Sniper.config().reload_ms(), 3000);
    }

    #[test]
    fn test_shotgun_is_pellet_weapon() {
        let shotgun = WeaponId::Shotgun.config();
        assert_eq!(shotgun.fire_mode.ray_count(), 10);
        assert_eq!(WeaponId::Pistol.config().fire_mode.ray_count(), 1);
    }
}
