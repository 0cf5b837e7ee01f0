//! Static configuration surface for the simulation.
//!
//! Everything here is fixed at compile time. Timestamps and durations are
//! milliseconds of simulation time unless the name says otherwise.

/// Simulation timing
pub mod tick {
    /// Server tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Tick duration in microseconds (1_000_000 / 60, rounded down)
    pub const TICK_DURATION_US: u64 = 1_000_000 / TICK_RATE as u64;
    /// Upper bound on the elapsed time fed to movement in one tick
    pub const MAX_TICK_ELAPSED_MS: u64 = 100;
    /// Ticks between periodic status log lines (30 seconds)
    pub const STATUS_LOG_INTERVAL: u64 = TICK_RATE as u64 * 30;
}

/// World dimensions
pub mod world {
    pub const WIDTH: f32 = 2000.0;
    pub const HEIGHT: f32 = 2000.0;
}

/// Combatant population limits
pub mod population {
    /// Maximum connected humans; joins beyond this are rejected
    pub const MAX_HUMANS: usize = 16;
    /// Bots top the total combatant count up to this number
    pub const MIN_PLAYER_COUNT: usize = 8;
}

/// Per-entity physical and vital constants
pub mod entity {
    /// Collision circle radius shared by humans and bots
    pub const RADIUS: f32 = 20.0;
    /// Full movement speed in world units per second
    pub const SPEED: f32 = 250.0;
    pub const MAX_HEALTH: f32 = 100.0;
    pub const MAX_ARMOR: f32 = 100.0;
    pub const STARTING_HEALTH: f32 = 100.0;
    pub const STARTING_ARMOR: f32 = 0.0;
    /// Maximum display name length after sanitisation
    pub const MAX_NAME_LEN: usize = 16;
}

/// Death, respawn and spawn protection
pub mod lifecycle {
    /// Delay between death and respawn
    pub const RESPAWN_DELAY_MS: u64 = 3000;
    /// Invulnerability granted on every spawn and respawn
    pub const SPAWN_INVULN_MS: u64 = 2000;
}

/// Damage model
pub mod combat {
    /// Fraction of incoming damage soaked by armor (bounded by armor left)
    pub const ARMOR_ABSORPTION: f32 = 0.33;
}

/// Pickup tuning
pub mod pickups {
    /// Radius of a pickup's collection area
    pub const RADIUS: f32 = 15.0;
    pub const HEALTH_SMALL_AMOUNT: f32 = 25.0;
    pub const HEALTH_LARGE_AMOUNT: f32 = 50.0;
    pub const ARMOR_LIGHT_AMOUNT: f32 = 25.0;
    pub const ARMOR_HEAVY_AMOUNT: f32 = 50.0;
    pub const HEALTH_RESPAWN_MS: u64 = 10_000;
    pub const ARMOR_RESPAWN_MS: u64 = 20_000;
    pub const AMMO_RESPAWN_MS: u64 = 8_000;
    pub const WEAPON_RESPAWN_MS: u64 = 15_000;
}

/// AI bot constants
pub mod ai {
    /// Time between think steps for one bot
    pub const THINK_INTERVAL_MS: u64 = 200;
    /// Time between wander heading changes
    pub const WANDER_INTERVAL_MS: u64 = 2000;
    /// Targets beyond this distance are ignored
    pub const SENSOR_RADIUS: f32 = 700.0;
    /// Bots only consider firing within this distance
    pub const FIRE_RANGE: f32 = 500.0;
    /// Probability of a fire attempt per think step while in range
    pub const FIRE_CHANCE: f64 = 0.35;
    /// Maximum aim error applied when pursuing (radians, symmetric)
    pub const AIM_ERROR: f32 = 0.08;
    /// Fraction of full speed used while pursuing
    pub const PURSUE_SPEED_FACTOR: f32 = 0.75;
    /// Fraction of full speed used while wandering
    pub const WANDER_SPEED_FACTOR: f32 = 0.4;
}

/// Networking constants
pub mod net {
    /// Maximum framed message size
    pub const MAX_MESSAGE_SIZE: usize = 65536;
    /// Capacity of the inbound input queue between ticks
    pub const INPUT_BUFFER_SIZE: usize = 1024;
    /// Capacity of the session command queue (join/disconnect)
    pub const COMMAND_BUFFER_SIZE: usize = 256;
    /// Capacity of each connection's direct outbound queue
    pub const DIRECT_BUFFER_SIZE: usize = 32;
}
