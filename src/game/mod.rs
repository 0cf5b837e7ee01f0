pub mod constants;
pub mod map;
pub mod weapons;
pub mod state;
pub mod systems;
pub mod game_loop;
pub mod input_buffer;
