//! # Player
//!
//! Drives the timeline tree one frame at a time.
//!
//! ## Responsibilities
//! - **Frame passes**: `show_frame` applies a timeline's frame, recursing into
//!   child sprites and buttons, then schedules sound, runs the frame action and
//!   advances.
//! - **Clock**: turns host time into catch-up passes of the root timeline.
//! - **Input**: routes pointer and key input to button instances and runs
//!   their handlers.
//!
//! Scripts reach back into the stage through [`MovieClip`] handles, so the
//! player never holds a stage borrow while an action runs.

use crate::button::{ButtonEvent, ButtonInput};
use crate::clock::FrameClock;
use crate::config::PlayerConfig;
use crate::errors::PlayerError;
use crate::layer::LayerState;
use crate::scripting::{GlobalScope, MovieClip, ScriptHost};
use crate::stage::{HandlerCall, LayerVisit, PlayerContext, Stage};
use crate::systems::assets::MovieAssets;
use crate::systems::sound::AudioSource;
use crate::timeline::TimelineState;
use crate::types::{Depth, LayerHandle, TimelineId};
use flashback_data::model::MovieData;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, instrument, trace};

pub struct Player {
    stage: Rc<RefCell<Stage>>,
    scripts: ScriptHost,
    clock: FrameClock,
    root: TimelineId,
}

impl Player {
    /// Validates the movie, builds the root timeline and shows frame 0.
    #[instrument(level = "debug", skip_all, fields(frame_rate = movie.frame_rate))]
    pub fn new(
        movie: &MovieData,
        config: PlayerConfig,
        context: PlayerContext,
    ) -> Result<Self, PlayerError> {
        let assets = Rc::new(MovieAssets::new(movie)?);
        let frame_rate = config.effective_frame_rate(assets.frame_rate)?;
        let stage = Stage::new(assets.clone(), frame_rate, context)?;
        let root = stage.root();
        let stage = Rc::new(RefCell::new(stage));
        if config.preload_audio {
            stage.borrow_mut().preload_audio();
        }

        let global = GlobalScope::new(MovieClip::new(stage.clone(), root));
        let mut scripts = ScriptHost::new(global, &config);
        let failures = scripts.compile_library(&assets);

        let mut player = Self {
            stage,
            scripts,
            clock: FrameClock::new(frame_rate),
            root,
        };
        player.show_frame(root);
        info!(
            frame_rate,
            frames = assets.root.frame_count,
            script_failures = failures,
            "Player ready"
        );
        Ok(player)
    }

    pub fn root(&self) -> TimelineId {
        self.root
    }

    pub fn frame_rate(&self) -> f64 {
        self.clock.frame_rate()
    }

    /// Shared stage, for hosts that want direct access.
    pub fn stage(&self) -> Rc<RefCell<Stage>> {
        self.stage.clone()
    }

    /// Runs the passes due at `now` (seconds). Returns how many ran.
    #[instrument(level = "trace", skip(self))]
    pub fn tick(&mut self, now: f64) -> u64 {
        let due = self.clock.elapsed_frames(now);
        for _ in 0..due {
            self.show_frame(self.root);
        }
        due
    }

    /// Runs `frames` passes of the root timeline back to back.
    pub fn advance_frames(&mut self, frames: u32) {
        for _ in 0..frames {
            self.show_frame(self.root);
        }
    }

    /// One reconciliation pass of `id` and everything below it.
    pub fn show_frame(&mut self, id: TimelineId) {
        let Some(plan) = self.stage.borrow_mut().begin_frame(id) else {
            return;
        };
        trace!(timeline = %id, frame = plan.frame, resync = plan.resync, "show_frame");

        if plan.skip_diff {
            for index in 0..plan.layer_count {
                let visit = self.stage.borrow().layer_visit(id, index);
                self.visit_layer(id, index, visit);
            }
            return;
        }

        for index in 0..plan.layer_count {
            let visit = self.stage.borrow_mut().reconcile_layer(id, index, &plan);
            self.visit_layer(id, index, visit);
        }
        self.stage.borrow_mut().schedule_sounds(id, &plan);

        let action = self.stage.borrow_mut().complete_frame(id, &plan);
        if let Some(action) = action {
            self.run(HandlerCall { owner: id, action });
        }
        self.stage.borrow_mut().advance(id);
    }

    fn visit_layer(&mut self, id: TimelineId, index: usize, visit: LayerVisit) {
        if let Some(child) = visit.sprite {
            self.show_frame(child);
        }
        if visit.button {
            let call = self.stage.borrow_mut().button_frame_update(id, index);
            if let Some(call) = call {
                self.run(call);
            }
        }
    }

    fn run(&self, call: HandlerCall) {
        if !self.scripts.has_action(&call.action) {
            return;
        }
        if !self.stage.borrow().contains(call.owner) {
            return;
        }
        trace!(action = %call.action, owner = %call.owner, "Running action");
        self.scripts
            .invoke(&call.action, MovieClip::new(self.stage.clone(), call.owner));
    }

    // Input

    pub fn pointer_hover(&mut self, container: LayerHandle, hovered: bool) -> Option<ButtonEvent> {
        let input = if hovered {
            ButtonInput::HoverStart
        } else {
            ButtonInput::HoverEnd
        };
        self.button_input(container, input)
    }

    pub fn pointer_press(&mut self, container: LayerHandle) -> Option<ButtonEvent> {
        self.button_input(container, ButtonInput::Press)
    }

    pub fn pointer_release(&mut self, container: LayerHandle) -> Option<ButtonEvent> {
        self.button_input(container, ButtonInput::Release)
    }

    fn button_input(&mut self, container: LayerHandle, input: ButtonInput) -> Option<ButtonEvent> {
        let (event, call) = self.stage.borrow_mut().button_input(container, input)?;
        self.run(call);
        Some(event)
    }

    /// Fires key handlers of every live button. Returns how many matched.
    pub fn key_press(&mut self, code: u8) -> usize {
        let calls = self.stage.borrow().key_press_calls(code);
        for call in &calls {
            self.run(*call);
        }
        calls.len()
    }

    // Inspection

    pub fn movie_clip(&self, id: TimelineId) -> MovieClip {
        MovieClip::new(self.stage.clone(), id)
    }

    pub fn timeline_state(&self, id: TimelineId) -> Option<TimelineState> {
        self.stage.borrow().timeline_state(id)
    }

    pub fn layer_state(&self, id: TimelineId, depth: Depth) -> Option<LayerState> {
        self.stage.borrow().layer_state(id, depth)
    }

    pub fn sound_owner(&self, source: AudioSource) -> Option<TimelineId> {
        self.stage.borrow().sound_owner(source)
    }

    pub fn is_alive(&self, id: TimelineId) -> bool {
        self.stage.borrow().contains(id)
    }
}
