use crate::button::Button;
use crate::types::{Affine, CharacterId, ColorTransform, Depth, LayerHandle, TimelineId};

/// What a depth currently owns besides its character reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LayerContent {
    #[default]
    Empty,
    Sprite(TimelineId),
    Button(Button),
}

/// One depth slot of a timeline instance.
#[derive(Debug, Clone)]
pub struct Layer {
    pub depth: Depth,
    /// Container created for this depth on the rendering surface.
    pub container: LayerHandle,
    pub character: Option<CharacterId>,
    pub ratio: Option<u16>,
    pub name: Option<String>,
    pub transform: Option<Affine>,
    pub color_transform: Option<ColorTransform>,
    pub content: LayerContent,
}

impl Layer {
    pub fn new(depth: Depth, container: LayerHandle) -> Self {
        Self {
            depth,
            container,
            character: None,
            ratio: None,
            name: None,
            transform: None,
            color_transform: None,
            content: LayerContent::Empty,
        }
    }

    pub fn sprite(&self) -> Option<TimelineId> {
        match self.content {
            LayerContent::Sprite(id) => Some(id),
            _ => None,
        }
    }

    pub fn button(&self) -> Option<&Button> {
        match &self.content {
            LayerContent::Button(button) => Some(button),
            _ => None,
        }
    }

    pub fn button_mut(&mut self) -> Option<&mut Button> {
        match &mut self.content {
            LayerContent::Button(button) => Some(button),
            _ => None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.character.is_some()
    }
}

/// Read-only snapshot of a layer, for hosts and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub depth: Depth,
    pub container: LayerHandle,
    pub character: Option<CharacterId>,
    pub ratio: Option<u16>,
    pub name: Option<String>,
    pub transform: Option<Affine>,
    pub color_transform: Option<ColorTransform>,
    pub sprite: Option<TimelineId>,
    pub button: Option<crate::button::ButtonState>,
}

impl From<&Layer> for LayerState {
    fn from(layer: &Layer) -> Self {
        Self {
            depth: layer.depth,
            container: layer.container,
            character: layer.character,
            ratio: layer.ratio,
            name: layer.name.clone(),
            transform: layer.transform,
            color_transform: layer.color_transform.clone(),
            sprite: layer.sprite(),
            button: layer.button().map(Button::state),
        }
    }
}
