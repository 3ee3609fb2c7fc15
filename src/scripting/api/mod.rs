//! # API Module
//!
//! Aggregates all Rhai API sub-modules and provides a single registration point.
//!
//! ## Sub-modules
//! - **clip**: the movie-clip `this` object
//! - **globals**: helpers callable from any script

pub mod clip;
pub mod globals;

use rhai::Engine;

/// Register all API functions with the Rhai engine.
pub fn register_all(engine: &mut Engine) {
    clip::register(engine);
    globals::register(engine);
}
