//! # Stage
//!
//! Arena of timeline instances plus the collaborators they drive.
//!
//! ## Responsibilities
//! - **Arena**: generational slots for every live timeline. Destroying a
//!   timeline destroys its sprites first and bumps the slot generation so old
//!   handles stop resolving.
//! - **Reconciliation**: applies one depth of a `show_frame` pass (removal,
//!   character swap, transform and name updates).
//! - **Routing**: maps button containers to the button instance that owns them
//!   and checks identity before every transition.
//! - **Sound**: runs the sound scheduler against each timeline's active set.
//!
//! The stage never runs scripts. Anything that needs an action returns a
//! [`HandlerCall`] so the caller can invoke it without holding a borrow.

use crate::audio::AudioBackend;
use crate::button::{Button, ButtonEvent, ButtonInput, ButtonKey, ButtonState};
use crate::display::{self, DisplayObject, Resolution};
use crate::errors::PlayerError;
use crate::layer::{LayerContent, LayerState};
use crate::scripting::ActionKey;
use crate::systems::assets::{MovieAssets, TimelineDef};
use crate::systems::renderer::Renderer;
use crate::systems::sound::{AudioSource, SoundOwnership, SoundPass, SoundScheduler};
use crate::timeline::{FramePlan, Timeline, TimelineState};
use crate::types::{Depth, FrameTarget, LayerHandle, TimelineId};
use crate::Navigator;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// Collaborators handed to the player at construction.
pub struct PlayerContext {
    /// Surface container the root timeline's layers attach to.
    pub mount: LayerHandle,
    pub renderer: Box<dyn Renderer>,
    pub audio: Box<dyn AudioBackend>,
    pub navigator: Box<dyn Navigator>,
}

struct Slot {
    generation: u32,
    timeline: Option<Timeline>,
}

/// Routing record for a live button instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonBinding {
    pub timeline: TimelineId,
    pub depth: Depth,
    pub key: ButtonKey,
}

/// A script to run with `this` bound to `owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerCall {
    pub owner: TimelineId,
    pub action: ActionKey,
}

/// Children of one depth to visit after its diff is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerVisit {
    pub sprite: Option<TimelineId>,
    pub button: bool,
}

pub struct Stage {
    slots: Vec<Slot>,
    free_indices: Vec<usize>,
    root: TimelineId,
    frame_rate: f64,
    pub(crate) assets: Rc<MovieAssets>,
    pub(crate) renderer: Box<dyn Renderer>,
    pub(crate) audio: Box<dyn AudioBackend>,
    pub(crate) navigator: Box<dyn Navigator>,
    sound_owners: SoundOwnership,
    buttons: HashMap<LayerHandle, ButtonBinding>,
    next_button_key: u64,
}

impl Stage {
    /// Creates the stage and its root timeline.
    pub fn new(
        assets: Rc<MovieAssets>,
        frame_rate: f64,
        context: PlayerContext,
    ) -> Result<Self, PlayerError> {
        let PlayerContext {
            mount,
            mut renderer,
            audio,
            navigator,
        } = context;

        let root_id = TimelineId {
            index: 0,
            generation: 0,
        };
        let mut root = Timeline::new(assets.root.clone(), None, Some(root_id), mount)?;
        root.attach_layers(renderer.as_mut());

        Ok(Self {
            slots: vec![Slot {
                generation: 0,
                timeline: Some(root),
            }],
            free_indices: Vec::new(),
            root: root_id,
            frame_rate,
            assets,
            renderer,
            audio,
            navigator,
            sound_owners: SoundOwnership::default(),
            buttons: HashMap::new(),
            next_button_key: 0,
        })
    }

    pub fn root(&self) -> TimelineId {
        self.root
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.timeline.as_ref())
    }

    pub fn get_mut(&mut self, id: TimelineId) -> Option<&mut Timeline> {
        Self::slot_mut(&mut self.slots, id)
    }

    pub fn contains(&self, id: TimelineId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live timelines.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.timeline.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_mut(slots: &mut [Slot], id: TimelineId) -> Option<&mut Timeline> {
        slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.timeline.as_mut())
    }

    fn allocate(&mut self, timeline: Timeline) -> TimelineId {
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index];
            slot.timeline = Some(timeline);
            TimelineId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len();
            self.slots.push(Slot {
                generation: 0,
                timeline: Some(timeline),
            });
            TimelineId {
                index,
                generation: 0,
            }
        }
    }

    fn release(&mut self, id: TimelineId) -> Option<Timeline> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)?;
        let timeline = slot.timeline.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(id.index);
        Some(timeline)
    }

    fn instantiate_sprite(
        &mut self,
        definition: Rc<TimelineDef>,
        parent: TimelineId,
        container: LayerHandle,
    ) -> Result<TimelineId, PlayerError> {
        let root = self.get(parent).and_then(|timeline| timeline.root);
        let mut timeline = Timeline::new(definition, Some(parent), root, container)?;
        timeline.attach_layers(self.renderer.as_mut());
        let id = self.allocate(timeline);
        debug!(%id, %parent, "Sprite instantiated");
        Ok(id)
    }

    /// Detaches and drops a timeline, its sprites first.
    pub(crate) fn destroy_timeline(&mut self, id: TimelineId) {
        let Some(mut timeline) = self.release(id) else {
            return;
        };
        timeline.parent = None;
        timeline.root = None;

        for layer in timeline.layers.iter_mut() {
            match std::mem::take(&mut layer.content) {
                LayerContent::Sprite(child) => self.destroy_timeline(child),
                LayerContent::Button(button) => self.unbind_button(layer.container, &button),
                LayerContent::Empty => {}
            }
        }
        timeline.detach_layers(self.renderer.as_mut());

        let mut scheduler = SoundScheduler {
            owners: &mut self.sound_owners,
            audio: self.audio.as_mut(),
            sounds: &self.assets.sounds,
        };
        scheduler.stop_all(id, &mut timeline.active_sounds);
        debug!(%id, definition = %timeline.definition.key, "Timeline destroyed");
    }

    // Reconciliation

    pub(crate) fn begin_frame(&mut self, id: TimelineId) -> Option<FramePlan> {
        self.get_mut(id).map(Timeline::begin_frame)
    }

    /// Applies the planned frame to one depth.
    pub(crate) fn reconcile_layer(
        &mut self,
        id: TimelineId,
        index: usize,
        plan: &FramePlan,
    ) -> LayerVisit {
        let Some(definition) = self.get(id).map(|timeline| timeline.definition.clone()) else {
            return LayerVisit::default();
        };
        let Some(entries) = definition.layers.get(index) else {
            return LayerVisit::default();
        };

        let resolution = display::resolve(entries, plan.after, plan.frame);
        let clear = plan.resync
            || matches!(
                resolution,
                Resolution::Removed
                    | Resolution::Placed {
                        interrupted: true,
                        ..
                    }
            );
        if clear {
            self.clear_layer(id, index);
        }
        if let Resolution::Placed { object, .. } = resolution {
            self.place_object(id, index, object);
        }
        self.layer_visit(id, index)
    }

    pub(crate) fn layer_visit(&self, id: TimelineId, index: usize) -> LayerVisit {
        match self.get(id).and_then(|timeline| timeline.layers.get(index)) {
            Some(layer) => LayerVisit {
                sprite: layer.sprite(),
                button: layer.button().is_some(),
            },
            None => LayerVisit::default(),
        }
    }

    /// Empties a depth, destroying whatever it owned.
    fn clear_layer(&mut self, id: TimelineId, index: usize) {
        let Some(timeline) = self.get_mut(id) else {
            return;
        };
        let Some(layer) = timeline.layers.get_mut(index) else {
            return;
        };
        if !layer.is_occupied() && layer.content == LayerContent::Empty {
            return;
        }

        let depth = layer.depth;
        let container = layer.container;
        layer.character = None;
        layer.ratio = None;
        layer.transform = None;
        layer.color_transform = None;
        let name = layer.name.take();
        let content = std::mem::take(&mut layer.content);
        if let Some(name) = name {
            if timeline.named.get(&name) == Some(&depth) {
                timeline.named.remove(&name);
            }
        }

        match content {
            LayerContent::Sprite(child) => self.destroy_timeline(child),
            LayerContent::Button(button) => self.unbind_button(container, &button),
            LayerContent::Empty => {}
        }
        self.renderer.set_href(container, None);
        self.renderer.set_transform(container, None);
        self.renderer.set_color_effect(container, None);
    }

    fn place_object(&mut self, id: TimelineId, index: usize, object: &DisplayObject) {
        let Some((changed, occupied, container, depth)) = self
            .get(id)
            .and_then(|timeline| timeline.layers.get(index))
            .map(|layer| {
                (
                    !object.same_instance(layer.character, layer.ratio),
                    layer.is_occupied(),
                    layer.container,
                    layer.depth,
                )
            })
        else {
            return;
        };

        if changed {
            if occupied {
                self.clear_layer(id, index);
            }
            self.create_content(id, index, container, depth, object);
        }

        let Some(timeline) = self.get_mut(id) else {
            return;
        };
        let layer = &mut timeline.layers[index];
        layer.transform = object.transform;
        layer.color_transform = object.color_transform.clone();
        let previous = std::mem::replace(&mut layer.name, object.name.clone());
        if previous != object.name {
            if let Some(previous) = previous {
                if timeline.named.get(&previous) == Some(&depth) {
                    timeline.named.remove(&previous);
                }
            }
            if let Some(name) = &object.name {
                timeline.named.insert(name.clone(), depth);
            }
        }

        self.renderer.set_transform(container, object.transform.as_ref());
        self.renderer
            .set_color_effect(container, object.color_transform.as_ref());
    }

    fn create_content(
        &mut self,
        id: TimelineId,
        index: usize,
        container: LayerHandle,
        depth: Depth,
        object: &DisplayObject,
    ) {
        let character = object.character;
        self.renderer.set_href(container, Some(character));

        let content = if let Some(definition) = self.assets.sprites.get(&character).cloned() {
            match self.instantiate_sprite(definition, id, container) {
                Ok(child) => LayerContent::Sprite(child),
                Err(err) => {
                    warn!(error = %err, %character, "Sprite construction failed; showing as plain graphic");
                    LayerContent::Empty
                }
            }
        } else if self.assets.buttons.contains_key(&character) {
            let key = ButtonKey(self.next_button_key);
            self.next_button_key += 1;
            self.buttons.insert(
                container,
                ButtonBinding {
                    timeline: id,
                    depth,
                    key,
                },
            );
            self.renderer.set_button_state(container, ButtonState::Up);
            LayerContent::Button(Button::new(key, character))
        } else {
            LayerContent::Empty
        };

        if let Some(layer) = self
            .get_mut(id)
            .and_then(|timeline| timeline.layers.get_mut(index))
        {
            layer.character = Some(character);
            layer.ratio = object.ratio;
            layer.content = content;
        }
    }

    pub(crate) fn schedule_sounds(&mut self, id: TimelineId, plan: &FramePlan) {
        let Some(timeline) = Self::slot_mut(&mut self.slots, id) else {
            return;
        };
        let definition = timeline.definition.clone();
        let pass = SoundPass {
            timeline: id,
            definition: &definition,
            after: plan.after,
            frame: plan.frame,
            resync: plan.resync,
            frame_rate: self.frame_rate,
        };
        let mut scheduler = SoundScheduler {
            owners: &mut self.sound_owners,
            audio: self.audio.as_mut(),
            sounds: &self.assets.sounds,
        };
        scheduler.run(&pass, &mut timeline.active_sounds);
    }

    /// Marks the frame rendered and returns the frame action to run, if any.
    pub(crate) fn complete_frame(&mut self, id: TimelineId, plan: &FramePlan) -> Option<ActionKey> {
        let timeline = self.get_mut(id)?;
        let frame = timeline.complete_frame(plan)?;
        Some(ActionKey::Frame {
            timeline: timeline.definition.key,
            frame,
        })
    }

    pub(crate) fn advance(&mut self, id: TimelineId) {
        if let Some(timeline) = self.get_mut(id) {
            timeline.advance();
        }
    }

    /// Calls `load` on every audio source of the movie.
    pub(crate) fn preload_audio(&mut self) {
        for source in self.assets.audio_sources() {
            self.audio.load(source);
        }
    }

    // Buttons

    fn unbind_button(&mut self, container: LayerHandle, button: &Button) {
        if self
            .buttons
            .get(&container)
            .is_some_and(|binding| binding.key == button.key)
        {
            self.buttons.remove(&container);
        }
    }

    pub fn button_binding(&self, container: LayerHandle) -> Option<ButtonBinding> {
        self.buttons.get(&container).copied()
    }

    /// Per-frame hover check of the button at `index`.
    pub(crate) fn button_frame_update(&mut self, id: TimelineId, index: usize) -> Option<HandlerCall> {
        let container = self.get(id)?.layers.get(index)?.container;
        let hovered = self.renderer.is_hovered(container);
        let button = self.get_mut(id)?.layers.get_mut(index)?.button_mut()?;
        let event = button.frame_update(hovered)?;
        let character = button.character;
        self.renderer.set_button_state(container, ButtonState::Up);
        Some(HandlerCall {
            owner: id,
            action: ActionKey::Button { character, event },
        })
    }

    /// Routes pointer input to the button living in `container`.
    ///
    /// Input aimed at a removed or replaced button is dropped.
    pub(crate) fn button_input(
        &mut self,
        container: LayerHandle,
        input: ButtonInput,
    ) -> Option<(ButtonEvent, HandlerCall)> {
        let Some(binding) = self.buttons.get(&container).copied() else {
            debug!(%container, ?input, "Pointer input for a container without a live button");
            return None;
        };
        let button = self
            .get_mut(binding.timeline)?
            .layers
            .get_mut(binding.depth.0 as usize)?
            .button_mut()
            .filter(|button| button.key == binding.key)?;
        let event = button.handle(input)?;
        let (state, character) = (button.state, button.character);
        self.renderer.set_button_state(container, state);
        Some((
            event,
            HandlerCall {
                owner: binding.timeline,
                action: ActionKey::Button { character, event },
            },
        ))
    }

    /// Key handlers of every live button for `code`, ordered by owner then depth.
    pub(crate) fn key_press_calls(&self, code: u8) -> Vec<HandlerCall> {
        let mut bindings: Vec<&ButtonBinding> = self.buttons.values().collect();
        bindings.sort_by_key(|binding| (binding.timeline.index, binding.depth));
        bindings
            .into_iter()
            .filter_map(|binding| {
                let layer = self
                    .get(binding.timeline)?
                    .layers
                    .get(binding.depth.0 as usize)?;
                let button = layer.button().filter(|button| button.key == binding.key)?;
                let definition = self.assets.buttons.get(&button.character)?;
                definition.key_handler(code)?;
                Some(HandlerCall {
                    owner: binding.timeline,
                    action: ActionKey::KeyPress {
                        character: button.character,
                        code,
                    },
                })
            })
            .collect()
    }

    // Queries used by scripts and hosts

    pub fn parent_of(&self, id: TimelineId) -> Option<TimelineId> {
        self.get(id)?.parent.filter(|parent| self.contains(*parent))
    }

    pub fn root_of(&self, id: TimelineId) -> Option<TimelineId> {
        self.get(id)?.root.filter(|root| self.contains(*root))
    }

    /// Sprite currently shown under `name` in `id`.
    pub fn child_by_name(&self, id: TimelineId, name: &str) -> Option<TimelineId> {
        let timeline = self.get(id)?;
        let depth = timeline.named_depth(name)?;
        timeline.layer(depth)?.sprite()
    }

    /// Dotted path from `_level0`, e.g. `_level0.menu.icon`.
    pub fn target_path(&self, id: TimelineId) -> String {
        let Some(parent) = self.parent_of(id) else {
            return if id == self.root {
                "_level0".to_string()
            } else {
                format!("<detached {}>", id)
            };
        };
        let segment = self
            .get(parent)
            .and_then(|timeline| {
                timeline
                    .layers
                    .iter()
                    .find(|layer| layer.sprite() == Some(id))
                    .map(|layer| match timeline.name_of(layer.depth) {
                        Some(name) => name.to_string(),
                        None => format!("instance{}", id.index),
                    })
            })
            .unwrap_or_else(|| format!("instance{}", id.index));
        format!("{}.{}", self.target_path(parent), segment)
    }

    pub fn timeline_state(&self, id: TimelineId) -> Option<TimelineState> {
        self.get(id).map(Timeline::state)
    }

    pub fn layer_state(&self, id: TimelineId, depth: Depth) -> Option<LayerState> {
        self.get(id)?.layer(depth).map(LayerState::from)
    }

    pub fn sound_owner(&self, source: AudioSource) -> Option<TimelineId> {
        self.sound_owners.owner(source)
    }

    pub fn play(&mut self, id: TimelineId) -> bool {
        self.get_mut(id).map(Timeline::play).is_some()
    }

    pub fn stop(&mut self, id: TimelineId) -> bool {
        self.get_mut(id).map(Timeline::stop).is_some()
    }

    pub fn goto(&mut self, id: TimelineId, target: &FrameTarget) -> bool {
        self.get_mut(id)
            .map(|timeline| timeline.goto(target))
            .unwrap_or(false)
    }

    pub fn navigate(&mut self, url: &str, target: &str) {
        self.navigator.get_url(url, target);
    }
}
