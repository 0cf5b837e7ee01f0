use hashbrown::HashMap;
use rand::Rng;

use crate::game::constants::ai::*;
use crate::game::constants::entity::SPEED;
use crate::game::state::{Entity, EntityId, Millis, SimulationWorld};
use crate::game::systems::combat;
use crate::net::protocol::GameEvent;
use crate::util::vec2::Vec2;

/// Bot behavior mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiMode {
    /// Close on and shoot at a target
    Pursue,
    /// Roam on a random heading
    Wander,
}

/// Decision state for a bot, attached alongside its entity
#[derive(Debug, Clone)]
pub struct AiState {
    pub mode: AiMode,
    pub target_id: Option<EntityId>,
    pub wander_angle: f32,
    pub next_wander_change_at: Millis,
    pub next_think_at: Millis,
}

impl AiState {
    /// Fresh state with the first think staggered inside one interval so a
    /// batch of bots spawned together does not think on the same tick
    pub fn new<R: Rng>(now: Millis, rng: &mut R) -> Self {
        Self {
            mode: AiMode::Wander,
            target_id: None,
            wander_angle: rng.gen_range(0.0..std::f32::consts::TAU),
            next_wander_change_at: now + WANDER_INTERVAL_MS,
            next_think_at: now + rng.gen_range(0..THINK_INTERVAL_MS),
        }
    }

    fn pick_heading<R: Rng>(&mut self, now: Millis, rng: &mut R) {
        self.wander_angle = rng.gen_range(0.0..std::f32::consts::TAU);
        self.next_wander_change_at = now + WANDER_INTERVAL_MS;
    }
}

/// AI manager for all bots
pub struct AiManager {
    states: HashMap<EntityId, AiState>,
}

impl AiManager {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    pub fn register_bot<R: Rng>(&mut self, bot_id: EntityId, now: Millis, rng: &mut R) {
        self.states.insert(bot_id, AiState::new(now, rng));
    }

    pub fn unregister_bot(&mut self, bot_id: EntityId) {
        self.states.remove(&bot_id);
    }

    pub fn get(&self, bot_id: EntityId) -> Option<&AiState> {
        self.states.get(&bot_id)
    }

    pub fn get_mut(&mut self, bot_id: EntityId) -> Option<&mut AiState> {
        self.states.get_mut(&bot_id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Run every think step that is due
    ///
    /// Walks the entity list rather than the map so bots think in creation
    /// order and seeded runs stay reproducible.
    pub fn think_due(&mut self, world: &mut SimulationWorld, now: Millis, events: &mut Vec<GameEvent>) {
        for idx in 0..world.entities.len() {
            let id = world.entities[idx].id;
            let Some(ai) = self.states.get_mut(&id) else {
                continue;
            };
            if now >= ai.next_think_at {
                think(ai, world, idx, now, events);
            }
        }
    }

    /// Redirect wandering bots whose last move ran into geometry
    pub fn handle_blocked(&mut self, world: &mut SimulationWorld, blocked: &[EntityId], now: Millis) {
        for &id in blocked {
            let Some(ai) = self.states.get_mut(&id) else {
                continue;
            };
            if ai.mode != AiMode::Wander {
                continue;
            }
            ai.pick_heading(now, &mut world.rng);
            if let Some(bot) = world.entity_mut(id) {
                steer_wander(ai, bot);
            }
        }
    }
}

impl Default for AiManager {
    fn default() -> Self {
        Self::new()
    }
}

/// One decision step for the bot at `idx`
fn think(ai: &mut AiState, world: &mut SimulationWorld, idx: usize, now: Millis, events: &mut Vec<GameEvent>) {
    ai.next_think_at = now + THINK_INTERVAL_MS;

    if !world.entities[idx].is_alive() {
        ai.target_id = None;
        return;
    }

    match find_nearest_target(world, idx) {
        Some((target_id, target_pos, dist)) if dist <= SENSOR_RADIUS => {
            ai.mode = AiMode::Pursue;
            ai.target_id = Some(target_id);

            let aim_error = world.rng.gen_range(-AIM_ERROR..=AIM_ERROR);
            let bot = &mut world.entities[idx];
            bot.aim_angle = bot.position.angle_to_point(target_pos) + aim_error;
            bot.velocity = (target_pos - bot.position).normalize() * (SPEED * PURSUE_SPEED_FACTOR);

            if dist <= FIRE_RANGE && world.rng.gen_bool(FIRE_CHANCE) {
                combat::attempt_fire(world, idx, now, events);
            }
        }
        _ => {
            if ai.mode != AiMode::Wander || now >= ai.next_wander_change_at {
                ai.pick_heading(now, &mut world.rng);
            }
            ai.mode = AiMode::Wander;
            ai.target_id = None;
            steer_wander(ai, &mut world.entities[idx]);
        }
    }
}

fn steer_wander(ai: &AiState, bot: &mut Entity) {
    bot.aim_angle = ai.wander_angle;
    bot.velocity = Vec2::from_angle(ai.wander_angle) * (SPEED * WANDER_SPEED_FACTOR);
}

/// Nearest living entity other than the bot: (id, position, distance)
fn find_nearest_target(world: &SimulationWorld, bot_idx: usize) -> Option<(EntityId, Vec2, f32)> {
    let origin = world.entities[bot_idx].position;
    let mut nearest: Option<(EntityId, Vec2, f32)> = None;

    for (i, other) in world.entities.iter().enumerate() {
        if i == bot_idx || !other.is_alive() {
            continue;
        }
        let dist = origin.distance_to(other.position);
        if nearest.map_or(true, |(_, _, d)| dist < d) {
            nearest = Some((other.id, other.position, dist));
        }
    }

    nearest
}

/// Generate bot names
pub fn generate_bot_name<R: Rng>(rng: &mut R) -> String {
    let prefixes = ["Rogue", "Ghost", "Viper", "Havoc", "Rusty", "Blitz", "Shade", "Raven"];
    let suffixes = ["Bot", "Unit", "Drone", "Mk2", "X", "Prime", "Zero", "07"];

    format!(
        "{}{}",
        prefixes[rng.gen_range(0..prefixes.len())],
        suffixes[rng.gen_range(0..suffixes.len())]
    )
}
