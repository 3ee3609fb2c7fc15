use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a character (shape, sprite, button or sound) in the movie dictionary.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct CharacterId(pub u16);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Top level decoder output.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MovieData {
    pub frame_rate: f64,
    /// Size of the source file, reported by `getBytesLoaded`/`getBytesTotal`.
    #[serde(default)]
    pub byte_size: Option<u64>,
    pub root: TimelineData,
    #[serde(default)]
    pub sprites: BTreeMap<CharacterId, TimelineData>,
    #[serde(default)]
    pub buttons: BTreeMap<CharacterId, ButtonData>,
    #[serde(default)]
    pub sounds: BTreeMap<CharacterId, SoundData>,
}

/// Frame data of the main timeline or of one sprite definition.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TimelineData {
    pub frame_count: u32,
    /// One entry per depth, bottom first.
    #[serde(default)]
    pub layers: Vec<LayerData>,
    #[serde(default)]
    pub actions: BTreeMap<u32, ActionData>,
    #[serde(default)]
    pub labels: BTreeMap<String, u32>,
    #[serde(default)]
    pub sounds: BTreeMap<u32, Vec<SoundCue>>,
    #[serde(default)]
    pub sound_stream: Option<SoundStreamData>,
}

/// Per-frame changes of a single depth.
///
/// A missing frame means "unchanged", `null` means the object was removed.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct LayerData {
    pub frames: BTreeMap<u32, Option<ObjectData>>,
}

/// A placed display object.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ObjectData {
    pub character: CharacterId,
    /// `[a, b, c, d, tx, ty]`
    #[serde(default)]
    pub matrix: Option<[f64; 6]>,
    #[serde(default)]
    pub name: Option<String>,
    /// Either a 4 component multiplier or a 4x5 color matrix.
    #[serde(default)]
    pub color_transform: Option<Vec<f64>>,
    #[serde(default)]
    pub ratio: Option<u16>,
}

/// Frame or button script: Rhai source, or a list of decoded bytecode ops.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ActionData {
    Script(String),
    Ops(Vec<ActionOp>),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ActionOp {
    Play,
    Stop,
    GotoFrame { frame: u32 },
    GotoLabel { label: String },
    GetUrl { url: String, target: String },
    /// Calls a zero-argument clip method on a dotted target path, e.g. `_root.menu`.
    CallMethod { target: String, method: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SoundCue {
    pub character: CharacterId,
    #[serde(default, rename = "loop", alias = "loops")]
    pub looping: bool,
    #[serde(default)]
    pub no_restart: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SoundStreamData {
    pub start: u32,
    #[serde(default)]
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SoundData {
    #[serde(default)]
    pub sample_rate: u32,
    #[serde(default)]
    pub stereo: bool,
    #[serde(default)]
    pub sample_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ButtonData {
    #[serde(default)]
    pub mouse: ButtonHandlers,
    /// Key code to handler.
    #[serde(default)]
    pub key_press: BTreeMap<u8, ActionData>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ButtonHandlers {
    #[serde(default)]
    pub hover_in: Option<ActionData>,
    #[serde(default)]
    pub hover_out: Option<ActionData>,
    #[serde(default)]
    pub down: Option<ActionData>,
    #[serde(default)]
    pub up: Option<ActionData>,
}
