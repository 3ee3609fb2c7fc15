//! # Renderer
//!
//! The rendering surface as seen by the player.
//!
//! ## Responsibilities
//! - **Renderer**: the interface a host surface implements (containers,
//!   character references, transforms, color effects, hover queries).
//! - **RecordingRenderer**: headless surface that records every call and keeps
//!   enough state (hrefs, attachments, hover) to inspect the display list.

use crate::button::ButtonState;
use crate::types::{Affine, CharacterId, ColorTransform, Depth, LayerHandle};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Host rendering surface.
pub trait Renderer {
    /// Creates a new, detached container for the given depth.
    fn create_layer_container(&mut self, depth: Depth) -> LayerHandle;

    /// Points the container at a character, or clears it.
    fn set_href(&mut self, handle: LayerHandle, character: Option<CharacterId>);

    fn set_transform(&mut self, handle: LayerHandle, transform: Option<&Affine>);

    fn set_color_effect(&mut self, handle: LayerHandle, effect: Option<&ColorTransform>);

    fn attach(&mut self, parent: LayerHandle, handle: LayerHandle);

    fn detach(&mut self, handle: LayerHandle);

    /// Whether the pointer is currently over the container.
    fn is_hovered(&self, handle: LayerHandle) -> bool;

    /// Shows the up/over/down variant of a button.
    ///
    /// The default implementation does nothing.
    fn set_button_state(&mut self, _handle: LayerHandle, _state: ButtonState) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Create(LayerHandle, Depth),
    SetHref(LayerHandle, Option<CharacterId>),
    SetTransform(LayerHandle, Option<Affine>),
    SetColorEffect(LayerHandle, Option<ColorTransform>),
    Attach(LayerHandle, LayerHandle),
    Detach(LayerHandle),
    ButtonState(LayerHandle, ButtonState),
}

#[derive(Debug, Default)]
pub struct RenderLog {
    pub calls: Vec<RenderCall>,
    pub hrefs: HashMap<LayerHandle, CharacterId>,
    pub parents: HashMap<LayerHandle, LayerHandle>,
    pub hovered: HashSet<LayerHandle>,
    next_handle: u64,
}

/// Headless [`Renderer`] that records calls into a shared log.
///
/// Clones share the same log, so a host can keep one clone for inspection
/// after handing the other to the player.
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    log: Rc<RefCell<RenderLog>>,
}

impl RecordingRenderer {
    /// Handle of the mount point every recording renderer starts with.
    pub const MOUNT: LayerHandle = LayerHandle(0);

    pub fn new() -> Self {
        let log = RenderLog {
            next_handle: 1,
            ..RenderLog::default()
        };
        Self {
            log: Rc::new(RefCell::new(log)),
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.log.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().calls.clear();
    }

    pub fn href(&self, handle: LayerHandle) -> Option<CharacterId> {
        self.log.borrow().hrefs.get(&handle).copied()
    }

    pub fn is_attached(&self, handle: LayerHandle) -> bool {
        self.log.borrow().parents.contains_key(&handle)
    }

    /// Simulates the pointer entering or leaving a container.
    pub fn set_hovered(&self, handle: LayerHandle, hovered: bool) {
        let mut log = self.log.borrow_mut();
        if hovered {
            log.hovered.insert(handle);
        } else {
            log.hovered.remove(&handle);
        }
    }
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for RecordingRenderer {
    fn create_layer_container(&mut self, depth: Depth) -> LayerHandle {
        let mut log = self.log.borrow_mut();
        let handle = LayerHandle(log.next_handle);
        log.next_handle += 1;
        log.calls.push(RenderCall::Create(handle, depth));
        handle
    }

    fn set_href(&mut self, handle: LayerHandle, character: Option<CharacterId>) {
        let mut log = self.log.borrow_mut();
        match character {
            Some(id) => log.hrefs.insert(handle, id),
            None => log.hrefs.remove(&handle),
        };
        log.calls.push(RenderCall::SetHref(handle, character));
    }

    fn set_transform(&mut self, handle: LayerHandle, transform: Option<&Affine>) {
        self.log
            .borrow_mut()
            .calls
            .push(RenderCall::SetTransform(handle, transform.copied()));
    }

    fn set_color_effect(&mut self, handle: LayerHandle, effect: Option<&ColorTransform>) {
        self.log
            .borrow_mut()
            .calls
            .push(RenderCall::SetColorEffect(handle, effect.cloned()));
    }

    fn attach(&mut self, parent: LayerHandle, handle: LayerHandle) {
        let mut log = self.log.borrow_mut();
        log.parents.insert(handle, parent);
        log.calls.push(RenderCall::Attach(parent, handle));
    }

    fn detach(&mut self, handle: LayerHandle) {
        let mut log = self.log.borrow_mut();
        log.parents.remove(&handle);
        log.calls.push(RenderCall::Detach(handle));
    }

    fn is_hovered(&self, handle: LayerHandle) -> bool {
        self.log.borrow().hovered.contains(&handle)
    }

    fn set_button_state(&mut self, handle: LayerHandle, state: ButtonState) {
        self.log
            .borrow_mut()
            .calls
            .push(RenderCall::ButtonState(handle, state));
    }
}
