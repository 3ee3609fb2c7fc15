//! # Scripting Types
//!
//! Handle types for Rhai scripting integration.
//!
//! ## Responsibilities
//! - **MovieClip**: the `this` object of frame and button scripts. Wraps the
//!   shared stage and a timeline id. Every call borrows the stage only for its
//!   own duration.

use crate::stage::Stage;
use crate::types::{FrameTarget, TimelineId};
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// Script-facing handle to one timeline instance.
#[derive(Clone)]
pub struct MovieClip {
    pub stage: Rc<RefCell<Stage>>,
    pub id: TimelineId,
}

impl MovieClip {
    pub fn new(stage: Rc<RefCell<Stage>>, id: TimelineId) -> Self {
        Self { stage, id }
    }

    fn with_stage<R>(&self, operation: &str, f: impl FnOnce(RefMut<'_, Stage>) -> R) -> Option<R> {
        match self.stage.try_borrow_mut() {
            Ok(stage) => Some(f(stage)),
            Err(_) => {
                warn!(clip = %self.id, operation, "Stage is busy; clip call ignored");
                None
            }
        }
    }

    fn related(&self, id: TimelineId) -> MovieClip {
        MovieClip::new(self.stage.clone(), id)
    }

    fn report_stale(&self, operation: &str, found: bool) {
        if !found {
            debug!(clip = %self.id, operation, "Clip is no longer on stage");
        }
    }

    pub fn play(&self) {
        let found = self.with_stage("play", |mut stage| stage.play(self.id));
        self.report_stale("play", found.unwrap_or(true));
    }

    pub fn stop(&self) {
        let found = self.with_stage("stop", |mut stage| stage.stop(self.id));
        self.report_stale("stop", found.unwrap_or(true));
    }

    /// Jumps to a frame or label. Returns whether the jump happened.
    pub fn goto(&self, target: &FrameTarget) -> bool {
        self.with_stage("goto", |mut stage| stage.goto(self.id, target))
            .unwrap_or(false)
    }

    pub fn goto_and_play(&self, target: &FrameTarget) {
        if self.goto(target) {
            self.play();
        }
    }

    pub fn goto_and_stop(&self, target: &FrameTarget) {
        if self.goto(target) {
            self.stop();
        }
    }

    /// Loading is complete before playback starts, so loaded always equals total.
    pub fn bytes_loaded(&self) -> u64 {
        self.bytes_total()
    }

    pub fn bytes_total(&self) -> u64 {
        self.with_stage("getBytesTotal", |stage| stage.assets.byte_size)
            .unwrap_or(1)
    }

    pub fn get_url(&self, url: &str, target: &str) {
        self.with_stage("getURL", |mut stage| stage.navigate(url, target));
    }

    pub fn root(&self) -> Option<MovieClip> {
        let root = self.with_stage("_root", |stage| stage.root_of(self.id))??;
        Some(self.related(root))
    }

    pub fn parent(&self) -> Option<MovieClip> {
        let parent = self.with_stage("_parent", |stage| stage.parent_of(self.id))??;
        Some(self.related(parent))
    }

    /// Named child sprite, resolved against the current frame.
    pub fn child(&self, name: &str) -> Option<MovieClip> {
        let child = self.with_stage("child", |stage| stage.child_by_name(self.id, name))??;
        Some(self.related(child))
    }

    pub fn target_path(&self) -> String {
        self.with_stage("targetPath", |stage| stage.target_path(self.id))
            .unwrap_or_else(|| self.id.to_string())
    }
}

impl PartialEq for MovieClip {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.stage, &other.stage) && self.id == other.id
    }
}

impl fmt::Debug for MovieClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovieClip").field("id", &self.id).finish()
    }
}

impl fmt::Display for MovieClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target_path())
    }
}
