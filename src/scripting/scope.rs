//! # Action Scopes
//!
//! Two-level name lookup for scripts.
//!
//! A bare name is looked up in the [`LocalScope`] first (`this` and the
//! properties it exposes), then in the [`GlobalScope`]. Lookups run at the
//! moment the name is read, so a named child placed earlier in the same pass
//! is visible and a removed one is not. Neither scope can be written to.

use super::types::MovieClip;
use rhai::Dynamic;
use std::rc::Rc;

/// Built-in property names of every clip.
pub const CLIP_PROPERTIES: [&str; 2] = ["_root", "_parent"];

/// Read-only names shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalScope {
    level0: MovieClip,
}

impl GlobalScope {
    pub fn new(root: MovieClip) -> Self {
        Self { level0: root }
    }

    pub fn resolve(&self, name: &str) -> Option<Dynamic> {
        match name {
            "_level0" => Some(Dynamic::from(self.level0.clone())),
            _ => None,
        }
    }
}

/// Names visible to one action invocation.
#[derive(Debug, Clone)]
pub struct LocalScope {
    this: MovieClip,
    global: Rc<GlobalScope>,
}

impl LocalScope {
    pub fn new(this: MovieClip, global: Rc<GlobalScope>) -> Self {
        Self { this, global }
    }

    pub fn this(&self) -> &MovieClip {
        &self.this
    }

    /// Resolves a bare name, falling back to the global scope.
    pub fn resolve(&self, name: &str) -> Option<Dynamic> {
        clip_property(&self.this, name).or_else(|| self.global.resolve(name))
    }
}

/// Looks up a property of `clip`: a built-in or a named child sprite.
///
/// `_parent` of the root resolves to `()`.
pub fn clip_property(clip: &MovieClip, name: &str) -> Option<Dynamic> {
    match name {
        "_root" => Some(clip.root().map(Dynamic::from).unwrap_or(Dynamic::UNIT)),
        "_parent" => Some(clip.parent().map(Dynamic::from).unwrap_or(Dynamic::UNIT)),
        _ => clip.child(name).map(Dynamic::from),
    }
}

/// Whether `name` is a property of `clip` right now.
pub fn has_property(clip: &MovieClip, name: &str) -> bool {
    CLIP_PROPERTIES.contains(&name) || clip.child(name).is_some()
}
