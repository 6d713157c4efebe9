pub mod args;
pub mod artifact;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod defaults;
pub mod driver;
pub mod duration;
pub mod error;
pub mod executor;
pub mod interrupt;
pub mod ladder;
pub mod logging;
pub mod orchestrator;
pub mod reducer;
pub mod render;
pub mod summary;
pub mod target;
