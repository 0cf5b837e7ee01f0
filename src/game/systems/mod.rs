pub mod collision;
pub mod spawn;
pub mod movement;
pub mod combat;
pub mod ai;
pub mod lifecycle;
pub mod pickups;
pub mod population;
