//! # Global Helpers
//!
//! Functions available to every script regardless of `this`.

use crate::scripting::scope;
use crate::scripting::types::MovieClip;
use rhai::{Dynamic, Engine, ImmutableString};
use tracing::info;

/// Register global helper functions with Rhai.
pub fn register(engine: &mut Engine) {
    engine.register_fn(
        "has_property",
        |clip: MovieClip, name: ImmutableString| scope::has_property(&clip, &name),
    );

    engine.register_fn("trace", |value: Dynamic| {
        info!(target: "flashback::script", "{}", value);
    });
}
