//! # Movie Clip API
//!
//! The `this` object of frame and button scripts.
//!
//! ## Responsibilities
//! - **Playback**: `play`, `stop`, `gotoFrame`, `gotoAndPlay`, `gotoAndStop`
//! - **Loading**: `getBytesLoaded`, `getBytesTotal`
//! - **Navigation**: `getURL`
//! - **Properties**: `_root`, `_parent` and named child sprites (read only)

use crate::scripting::scope::clip_property;
use crate::scripting::types::MovieClip;
use crate::types::FrameTarget;
use rhai::{Dynamic, Engine, ImmutableString, INT};
use tracing::warn;

/// Converts a script value into a jump target. Strings are labels.
pub(crate) fn frame_target(value: &Dynamic) -> Option<FrameTarget> {
    if let Ok(frame) = value.as_int() {
        return Some(FrameTarget::Frame(
            u32::try_from(frame.max(0)).unwrap_or(u32::MAX),
        ));
    }
    if let Ok(frame) = value.as_float() {
        if frame.is_finite() {
            return Some(FrameTarget::Frame(frame.max(0.0) as u32));
        }
    }
    if let Some(label) = value.read_lock::<ImmutableString>() {
        return Some(FrameTarget::Label(label.to_string()));
    }
    warn!(value = %value.type_name(), "goto: expected a frame number or label");
    None
}

/// Register movie-clip functions with Rhai.
pub fn register(engine: &mut Engine) {
    engine.register_type_with_name::<MovieClip>("MovieClip");

    // Clips reached through bare names are constants, so methods take the
    // handle by value. Getters are pure and may borrow.
    engine.register_fn("play", |clip: MovieClip| clip.play());
    engine.register_fn("stop", |clip: MovieClip| clip.stop());

    // `goto` is a reserved word in Rhai.
    engine.register_fn("gotoFrame", |clip: MovieClip, target: Dynamic| {
        if let Some(target) = frame_target(&target) {
            clip.goto(&target);
        }
    });
    engine.register_fn("gotoAndPlay", |clip: MovieClip, target: Dynamic| {
        if let Some(target) = frame_target(&target) {
            clip.goto_and_play(&target);
        }
    });
    engine.register_fn("gotoAndStop", |clip: MovieClip, target: Dynamic| {
        if let Some(target) = frame_target(&target) {
            clip.goto_and_stop(&target);
        }
    });

    engine.register_fn("getBytesLoaded", |clip: MovieClip| {
        clip.bytes_loaded() as INT
    });
    engine.register_fn("getBytesTotal", |clip: MovieClip| {
        clip.bytes_total() as INT
    });

    engine.register_fn(
        "getURL",
        |clip: MovieClip, url: ImmutableString, target: ImmutableString| {
            clip.get_url(&url, &target);
        },
    );
    engine.register_fn("getURL", |clip: MovieClip, url: ImmutableString| {
        clip.get_url(&url, "");
    });

    engine.register_get("_root", |clip: &mut MovieClip| {
        clip.root().map(Dynamic::from).unwrap_or(Dynamic::UNIT)
    });
    engine.register_get("_parent", |clip: &mut MovieClip| {
        clip.parent().map(Dynamic::from).unwrap_or(Dynamic::UNIT)
    });

    // Unknown properties fall back to the indexer, which serves named children.
    engine.register_indexer_get(|clip: &mut MovieClip, name: ImmutableString| {
        match clip_property(clip, &name) {
            Some(value) => value,
            None => {
                warn!(clip = %clip, property = %name, "Unknown movie clip property");
                Dynamic::UNIT
            }
        }
    });
    engine.register_indexer_set(
        |clip: &mut MovieClip, name: ImmutableString, _value: Dynamic| {
            warn!(clip = %clip, property = %name, "Movie clip properties are read-only; write ignored");
        },
    );

    engine.register_fn("to_string", |clip: MovieClip| clip.target_path());
    engine.register_fn("to_debug", |clip: MovieClip| {
        format!("MovieClip({})", clip.target_path())
    });
    engine.register_fn("==", |a: MovieClip, b: MovieClip| a == b);
    engine.register_fn("!=", |a: MovieClip, b: MovieClip| a != b);
}
