//! # Audio
//!
//! Audio backend interface and a headless recording implementation.
//!
//! The player never decodes or mixes audio itself. It only drives the
//! backend: which source starts, at what offset, whether it loops.

use crate::errors::AudioError;
use crate::systems::sound::AudioSource;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Host audio output.
pub trait AudioBackend {
    fn play(&mut self, source: AudioSource) -> Result<(), AudioError>;

    fn pause(&mut self, source: AudioSource);

    fn set_loop(&mut self, source: AudioSource, looping: bool);

    /// Seeks to `seconds` from the start of the source.
    fn set_position(&mut self, source: AudioSource, seconds: f64);

    /// Prepares a source ahead of playback. Hosts that gate audio behind a user
    /// gesture use this to unlock every source at once.
    fn load(&mut self, _source: AudioSource) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Play(AudioSource),
    Pause(AudioSource),
    SetLoop(AudioSource, bool),
    SetPosition(AudioSource, f64),
    Load(AudioSource),
}

#[derive(Debug, Default)]
struct AudioLog {
    calls: Vec<AudioCall>,
    failing: HashSet<AudioSource>,
}

/// Headless [`AudioBackend`] that records calls. Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    log: Rc<RefCell<AudioLog>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.log.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().calls.clear();
    }

    /// Makes every later `play` of `source` fail.
    pub fn fail_on(&self, source: AudioSource) {
        self.log.borrow_mut().failing.insert(source);
    }
}

impl AudioBackend for RecordingAudio {
    fn play(&mut self, source: AudioSource) -> Result<(), AudioError> {
        let mut log = self.log.borrow_mut();
        log.calls.push(AudioCall::Play(source));
        if log.failing.contains(&source) {
            return Err(AudioError {
                sound: source,
                reason: "playback rejected".into(),
            });
        }
        Ok(())
    }

    fn pause(&mut self, source: AudioSource) {
        self.log.borrow_mut().calls.push(AudioCall::Pause(source));
    }

    fn set_loop(&mut self, source: AudioSource, looping: bool) {
        self.log
            .borrow_mut()
            .calls
            .push(AudioCall::SetLoop(source, looping));
    }

    fn set_position(&mut self, source: AudioSource, seconds: f64) {
        self.log
            .borrow_mut()
            .calls
            .push(AudioCall::SetPosition(source, seconds));
    }

    fn load(&mut self, source: AudioSource) {
        self.log.borrow_mut().calls.push(AudioCall::Load(source));
    }
}
