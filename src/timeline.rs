//! # Timeline
//!
//! Playback state of one movie-clip instance.
//!
//! ## Responsibilities
//! - **Frame stepping**: current frame, last rendered frame, pause flag and the
//!   advance/wrap rule applied at the end of every pass.
//! - **Jumps**: `goto` by frame or label. A jump during a pass replaces the
//!   automatic advance of that pass.
//! - **Layers**: the depth-indexed slots and the name table pointing into them.
//!
//! Reconciling layers against frame data needs the whole arena and lives in
//! [`Stage`](crate::stage::Stage).

use crate::errors::PlayerError;
use crate::layer::Layer;
use crate::systems::assets::TimelineDef;
use crate::systems::renderer::Renderer;
use crate::systems::sound::ActiveSounds;
use crate::types::{Depth, FrameTarget, LayerHandle, TimelineId};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Timeline {
    pub(crate) definition: Rc<TimelineDef>,
    pub(crate) frame: u32,
    pub(crate) rendered_frame: Option<u32>,
    pub(crate) paused: bool,
    /// Set by `goto` during this timeline's own pass; cleared when a pass begins.
    pub(crate) jumped: bool,
    pub(crate) layers: Vec<Layer>,
    pub(crate) named: HashMap<String, Depth>,
    pub(crate) active_sounds: ActiveSounds,
    pub(crate) parent: Option<TimelineId>,
    pub(crate) root: Option<TimelineId>,
    /// Container this timeline's layers are attached to.
    pub(crate) container: LayerHandle,
}

/// What one `show_frame` pass has to do, computed before any change is made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    pub frame: u32,
    /// Frames up to and including this one are already applied.
    pub after: Option<u32>,
    pub resync: bool,
    /// Paused on an already rendered frame: only children are visited.
    pub skip_diff: bool,
    pub layer_count: usize,
}

/// Read-only snapshot of a timeline, for hosts and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineState {
    pub frame: u32,
    pub rendered_frame: Option<u32>,
    pub paused: bool,
    pub frame_count: u32,
    pub layer_count: usize,
    pub parent: Option<TimelineId>,
    pub root: Option<TimelineId>,
}

impl Timeline {
    /// Creates an instance with no layer containers yet.
    pub fn new(
        definition: Rc<TimelineDef>,
        parent: Option<TimelineId>,
        root: Option<TimelineId>,
        container: LayerHandle,
    ) -> Result<Self, PlayerError> {
        if definition.frame_count == 0 {
            return Err(PlayerError::EmptyTimeline(definition.key));
        }
        Ok(Self {
            definition,
            frame: 0,
            rendered_frame: None,
            paused: false,
            jumped: false,
            layers: Vec::new(),
            named: HashMap::new(),
            active_sounds: ActiveSounds::default(),
            parent,
            root,
            container,
        })
    }

    /// Creates one container per depth and attaches it under `self.container`.
    pub fn attach_layers(&mut self, renderer: &mut dyn Renderer) {
        self.layers = (0..self.definition.layers.len())
            .map(|index| {
                let depth = Depth(index as u32);
                let handle = renderer.create_layer_container(depth);
                renderer.attach(self.container, handle);
                Layer::new(depth, handle)
            })
            .collect();
    }

    pub fn detach_layers(&mut self, renderer: &mut dyn Renderer) {
        for layer in &self.layers {
            renderer.detach(layer.container);
        }
    }

    /// Starts a pass. Jumps made between passes are shown by this pass and
    /// do not hold back its advance.
    pub fn begin_frame(&mut self) -> FramePlan {
        self.jumped = false;
        self.plan_frame()
    }

    pub fn plan_frame(&self) -> FramePlan {
        let frame = self.frame;
        let layer_count = self.layers.len();
        if self.paused && self.rendered_frame == Some(frame) {
            return FramePlan {
                frame,
                after: self.rendered_frame,
                resync: false,
                skip_diff: true,
                layer_count,
            };
        }
        let resync = matches!(self.rendered_frame, Some(rendered) if rendered > frame);
        FramePlan {
            frame,
            after: if resync { None } else { self.rendered_frame },
            resync,
            skip_diff: false,
            layer_count,
        }
    }

    /// Marks the planned frame as rendered. Returns the frame if it carries an action.
    pub fn complete_frame(&mut self, plan: &FramePlan) -> Option<u32> {
        self.rendered_frame = Some(plan.frame);
        self.definition
            .actions
            .contains_key(&plan.frame)
            .then_some(plan.frame)
    }

    /// End-of-pass step: move to the next frame unless paused or a jump already chose it.
    pub fn advance(&mut self) {
        if std::mem::take(&mut self.jumped) || self.paused {
            return;
        }
        self.frame = (self.frame + 1) % self.definition.frame_count;
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.paused = true;
    }

    /// Sets the next frame to show. Unknown labels are ignored.
    pub fn goto(&mut self, target: &FrameTarget) -> bool {
        let frame = match target {
            FrameTarget::Frame(frame) => *frame,
            FrameTarget::Label(label) => match self.definition.label(label) {
                Some(frame) => frame,
                None => {
                    warn!(timeline = %self.definition.key, label = %label, "goto: unknown frame label");
                    return false;
                }
            },
        };
        let last = self.definition.frame_count - 1;
        if frame > last {
            debug!(timeline = %self.definition.key, frame, last, "goto: frame out of range, clamping");
        }
        self.frame = frame.min(last);
        self.jumped = true;
        true
    }

    pub fn layer(&self, depth: Depth) -> Option<&Layer> {
        self.layers.get(depth.0 as usize)
    }

    pub fn named_depth(&self, name: &str) -> Option<Depth> {
        self.named.get(name).copied()
    }

    /// Name under which the layer at `depth` is registered, if any.
    pub fn name_of(&self, depth: Depth) -> Option<&str> {
        self.layer(depth)
            .and_then(|layer| layer.name.as_deref())
            .filter(|name| self.named.get(*name) == Some(&depth))
    }

    pub fn state(&self) -> TimelineState {
        TimelineState {
            frame: self.frame,
            rendered_frame: self.rendered_frame,
            paused: self.paused,
            frame_count: self.definition.frame_count,
            layer_count: self.layers.len(),
            parent: self.parent,
            root: self.root,
        }
    }
}
