//! Worldgen creature group spawning for a chunked voxel world.

mod access;
mod blocks;
mod catalog;
mod chunk;
mod climate;
mod codec;
mod collision;
mod config;
mod creature;
mod entity;
mod heightmap;
mod pass;
mod planner;
mod storage;
mod suitability;

pub use access::*;
pub use blocks::*;
pub use catalog::*;
pub use chunk::*;
pub use climate::*;
pub use codec::*;
pub use collision::*;
pub use config::*;
pub use creature::*;
pub use entity::*;
pub use heightmap::*;
pub use pass::*;
pub use planner::*;
pub use storage::*;
pub use suitability::*;
