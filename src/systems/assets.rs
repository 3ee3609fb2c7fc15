use crate::display::{DisplayObject, FrameEntries};
use crate::errors::PlayerError;
use crate::systems::sound::AudioSource;
use crate::types::{CharacterId, DefinitionKey, Depth};
use flashback_data::model::{ActionData, ButtonData, MovieData, SoundCue, SoundData, TimelineData};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::debug;

/// Immutable frame data shared by every instance of a timeline definition.
#[derive(Debug)]
pub struct TimelineDef {
    pub key: DefinitionKey,
    pub frame_count: u32,
    /// Changes per depth, bottom first.
    pub layers: Vec<FrameEntries>,
    pub actions: BTreeMap<u32, ActionData>,
    pub labels: BTreeMap<String, u32>,
    pub sounds: BTreeMap<u32, Vec<SoundCue>>,
    pub sound_stream: Option<u32>,
}

/// A sound that starts on a given frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundStart {
    pub source: AudioSource,
    pub looping: bool,
    pub no_restart: bool,
}

impl TimelineDef {
    fn from_data(key: DefinitionKey, data: &TimelineData) -> Result<Self, PlayerError> {
        if data.frame_count == 0 {
            return Err(PlayerError::EmptyTimeline(key));
        }
        let layers = data
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                let depth = Depth(index as u32);
                layer
                    .frames
                    .iter()
                    .map(|(&frame, entry)| {
                        let object = entry
                            .as_ref()
                            .map(|object| DisplayObject::from_data(object, key, depth, frame))
                            .transpose()?;
                        Ok((frame, object))
                    })
                    .collect::<Result<FrameEntries, PlayerError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            key,
            frame_count: data.frame_count,
            layers,
            actions: data.actions.clone(),
            labels: data.labels.clone(),
            sounds: data.sounds.clone(),
            sound_stream: data.sound_stream.as_ref().map(|stream| stream.start),
        })
    }

    /// Event sounds and the stream that begin on `frame`, in declaration order.
    pub fn sound_starts(&self, frame: u32) -> Vec<SoundStart> {
        let mut starts: Vec<SoundStart> = self
            .sounds
            .get(&frame)
            .into_iter()
            .flatten()
            .map(|cue| SoundStart {
                source: AudioSource::Sound(cue.character),
                looping: cue.looping,
                no_restart: cue.no_restart,
            })
            .collect();
        if self.sound_stream == Some(frame) {
            starts.push(SoundStart {
                source: AudioSource::Stream(self.key),
                looping: false,
                no_restart: false,
            });
        }
        starts
    }

    pub fn label(&self, name: &str) -> Option<u32> {
        self.labels.get(name).copied()
    }
}

/// Handler scripts of a button definition.
#[derive(Debug)]
pub struct ButtonDef {
    pub character: CharacterId,
    pub data: ButtonData,
}

impl ButtonDef {
    pub fn handler(&self, event: crate::button::ButtonEvent) -> Option<&ActionData> {
        use crate::button::ButtonEvent;
        let mouse = &self.data.mouse;
        match event {
            ButtonEvent::HoverIn => mouse.hover_in.as_ref(),
            ButtonEvent::HoverOut => mouse.hover_out.as_ref(),
            ButtonEvent::Down => mouse.down.as_ref(),
            ButtonEvent::Up => mouse.up.as_ref(),
        }
    }

    pub fn key_handler(&self, code: u8) -> Option<&ActionData> {
        self.data.key_press.get(&code)
    }
}

/// Validated, read-only movie dictionary.
///
/// Built once per player and shared by reference with every timeline.
#[derive(Debug)]
pub struct MovieAssets {
    pub frame_rate: f64,
    pub byte_size: u64,
    pub root: Rc<TimelineDef>,
    pub sprites: HashMap<CharacterId, Rc<TimelineDef>>,
    pub buttons: HashMap<CharacterId, Rc<ButtonDef>>,
    pub sounds: BTreeMap<CharacterId, SoundData>,
}

impl MovieAssets {
    /// Validates every definition up front so playback never sees malformed data.
    pub fn new(movie: &MovieData) -> Result<Self, PlayerError> {
        if !(movie.frame_rate.is_finite() && movie.frame_rate > 0.0) {
            return Err(PlayerError::InvalidFrameRate(movie.frame_rate));
        }
        let root = Rc::new(TimelineDef::from_data(DefinitionKey::Root, &movie.root)?);
        let sprites = movie
            .sprites
            .iter()
            .map(|(&id, data)| {
                TimelineDef::from_data(DefinitionKey::Sprite(id), data).map(|def| (id, Rc::new(def)))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        let buttons = movie
            .buttons
            .iter()
            .map(|(&id, data)| {
                let def = ButtonDef {
                    character: id,
                    data: data.clone(),
                };
                (id, Rc::new(def))
            })
            .collect();

        debug!(
            sprites = movie.sprites.len(),
            buttons = movie.buttons.len(),
            sounds = movie.sounds.len(),
            "Movie assets loaded"
        );

        Ok(Self {
            frame_rate: movie.frame_rate,
            byte_size: movie.byte_size.filter(|&size| size > 0).unwrap_or(1),
            root,
            sprites,
            buttons,
            sounds: movie.sounds.clone(),
        })
    }

    /// The root definition followed by every sprite definition.
    pub fn timelines(&self) -> impl Iterator<Item = &Rc<TimelineDef>> {
        std::iter::once(&self.root).chain(self.sprites.values())
    }

    pub fn definition(&self, key: DefinitionKey) -> Option<&Rc<TimelineDef>> {
        match key {
            DefinitionKey::Root => Some(&self.root),
            DefinitionKey::Sprite(id) => self.sprites.get(&id),
        }
    }

    /// Every audio source the movie can start.
    pub fn audio_sources(&self) -> Vec<AudioSource> {
        let mut sources: Vec<AudioSource> =
            self.sounds.keys().map(|&id| AudioSource::Sound(id)).collect();
        sources.extend(
            self.timelines()
                .filter(|def| def.sound_stream.is_some())
                .map(|def| AudioSource::Stream(def.key)),
        );
        sources
    }
}
