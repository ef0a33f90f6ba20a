pub mod board;
pub mod config;
pub mod constants;
pub mod custom_maps;
pub mod driver;
pub mod engine;
pub mod entities;
pub mod error;
pub mod high_scores;
pub mod level;
pub mod level_library;
pub mod progression;
pub mod protocol;
pub mod rng;
pub mod session;
pub mod types;
