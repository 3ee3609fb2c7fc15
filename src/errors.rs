use crate::systems::sound::AudioSource;
use crate::types::DefinitionKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Timeline {0} has no frames")]
    EmptyTimeline(DefinitionKey),
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),
    #[error("Malformed transform in {timeline} at depth {depth}, frame {frame}")]
    MalformedTransform {
        timeline: DefinitionKey,
        depth: u32,
        frame: u32,
    },
    #[error("Malformed color transform in {timeline} at depth {depth}, frame {frame}: expected 4 or 20 finite values, got {len}")]
    MalformedColorTransform {
        timeline: DefinitionKey,
        depth: u32,
        frame: u32,
        len: usize,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Failure reported by an [`AudioBackend`](crate::audio::AudioBackend).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Audio playback failed for {sound}: {reason}")]
pub struct AudioError {
    pub sound: AudioSource,
    pub reason: String,
}
