//! # Sound Scheduler
//!
//! Starts, seeks and stops audio sources as a timeline's frames are shown.
//!
//! ## Responsibilities
//! - **Ownership**: an audio source is bound to at most one timeline at a time.
//!   A second timeline asking for a bound source is reported and skipped.
//! - **Scheduling**: every start cue in the frames just shown is played with a
//!   seek that keeps it aligned to the current frame.
//! - **Resync**: a backward jump stops what the timeline was playing, except
//!   sources that restart at frame 0 anyway.

use crate::audio::AudioBackend;
use crate::systems::assets::{SoundStart, TimelineDef};
use crate::types::{CharacterId, DefinitionKey, TimelineId};
use flashback_data::model::SoundData;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, trace, warn};

/// Handle of one playable audio resource.
///
/// Event sounds are shared by character id. A sound stream belongs to its
/// timeline definition, so every instance of a sprite shares one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AudioSource {
    Sound(CharacterId),
    Stream(DefinitionKey),
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::Sound(id) => write!(f, "sound {}", id),
            AudioSource::Stream(key) => write!(f, "stream of {}", key),
        }
    }
}

/// Registry of which timeline currently owns each audio source.
#[derive(Debug, Default)]
pub struct SoundOwnership {
    owners: HashMap<AudioSource, TimelineId>,
}

impl SoundOwnership {
    pub fn owner(&self, source: AudioSource) -> Option<TimelineId> {
        self.owners.get(&source).copied()
    }

    /// Binds `source` to `timeline`.
    ///
    /// Returns `Ok(true)` when the timeline already owned it and `Err(owner)`
    /// when another timeline does. A conflicting binding is left untouched.
    pub fn bind(&mut self, source: AudioSource, timeline: TimelineId) -> Result<bool, TimelineId> {
        match self.owners.get(&source) {
            Some(&owner) if owner == timeline => Ok(true),
            Some(&owner) => Err(owner),
            None => {
                self.owners.insert(source, timeline);
                Ok(false)
            }
        }
    }

    /// Releases `source` if `timeline` owns it.
    pub fn release(&mut self, source: AudioSource, timeline: TimelineId) -> bool {
        if self.owners.get(&source) == Some(&timeline) {
            self.owners.remove(&source);
            true
        } else {
            false
        }
    }
}

/// Sources a timeline has started and not stopped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActiveSounds {
    sources: BTreeSet<AudioSource>,
}

impl ActiveSounds {
    pub fn contains(&self, source: AudioSource) -> bool {
        self.sources.contains(&source)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AudioSource> + '_ {
        self.sources.iter().copied()
    }

    fn insert(&mut self, source: AudioSource) {
        self.sources.insert(source);
    }

    fn take(&mut self) -> BTreeSet<AudioSource> {
        std::mem::take(&mut self.sources)
    }
}

/// Frames covered by one `show_frame` pass.
#[derive(Debug, Clone, Copy)]
pub struct SoundPass<'a> {
    pub timeline: TimelineId,
    pub definition: &'a TimelineDef,
    /// Last frame already handled, exclusive lower bound of the pass.
    pub after: Option<u32>,
    pub frame: u32,
    pub resync: bool,
    pub frame_rate: f64,
}

/// Borrowed view of the sound state a pass needs.
pub struct SoundScheduler<'a> {
    pub owners: &'a mut SoundOwnership,
    pub audio: &'a mut dyn AudioBackend,
    pub sounds: &'a BTreeMap<CharacterId, SoundData>,
}

impl SoundScheduler<'_> {
    /// Runs the sound part of a pass over `(after, frame]`.
    pub fn run(&mut self, pass: &SoundPass<'_>, active: &mut ActiveSounds) {
        if pass.resync {
            let restarting: Vec<AudioSource> = pass
                .definition
                .sound_starts(0)
                .into_iter()
                .map(|start| start.source)
                .collect();
            for source in active.take() {
                if restarting.contains(&source) {
                    continue;
                }
                self.audio.pause(source);
                self.owners.release(source, pass.timeline);
            }
        }

        let first = pass.after.map_or(0, |after| after + 1);
        if first > pass.frame {
            return;
        }
        for start_frame in first..=pass.frame {
            for start in pass.definition.sound_starts(start_frame) {
                self.start(pass, start_frame, start, active);
            }
        }
    }

    fn start(
        &mut self,
        pass: &SoundPass<'_>,
        start_frame: u32,
        start: SoundStart,
        active: &mut ActiveSounds,
    ) {
        let source = start.source;
        if let AudioSource::Sound(id) = source {
            if !self.sounds.contains_key(&id) {
                warn!(%source, timeline = %pass.timeline, "Sound cue references an unknown sound; skipping");
                return;
            }
        }

        let already_owned = match self.owners.bind(source, pass.timeline) {
            Ok(owned) => owned,
            Err(owner) => {
                warn!(
                    %source,
                    %owner,
                    timeline = %pass.timeline,
                    "Audio source is owned by another timeline; cue dropped"
                );
                return;
            }
        };

        self.audio.set_loop(source, start.looping);
        if !(start.no_restart && already_owned) {
            let seconds = f64::from(pass.frame - start_frame) / pass.frame_rate;
            self.audio.set_position(source, seconds);
        }
        if let Err(err) = self.audio.play(source) {
            warn!(error = %err, timeline = %pass.timeline, "Sound play failure");
        }
        trace!(%source, frame = start_frame, "Sound started");
        active.insert(source);
    }

    /// Stops and releases everything `timeline` is playing.
    pub fn stop_all(&mut self, timeline: TimelineId, active: &mut ActiveSounds) {
        for source in active.take() {
            self.audio.pause(source);
            self.owners.release(source, timeline);
            debug!(%source, %timeline, "Sound stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: usize) -> TimelineId {
        TimelineId {
            index,
            generation: 0,
        }
    }

    #[test]
    fn ownership_is_exclusive() {
        let mut owners = SoundOwnership::default();
        let source = AudioSource::Sound(CharacterId(3));
        assert_eq!(owners.bind(source, id(1)), Ok(false));
        assert_eq!(owners.bind(source, id(1)), Ok(true));
        assert_eq!(owners.bind(source, id(2)), Err(id(1)));
        assert!(!owners.release(source, id(2)));
        assert_eq!(owners.owner(source), Some(id(1)));
        assert!(owners.release(source, id(1)));
        assert_eq!(owners.owner(source), None);
    }
}
