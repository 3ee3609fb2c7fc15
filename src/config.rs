use crate::errors::PlayerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Player settings that are not part of the movie data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Overrides the movie's own frame rate.
    pub frame_rate: Option<f64>,
    /// Calls `load` on every audio source at startup.
    pub preload_audio: bool,
    /// Per-invocation operation budget for scripts. `0` means unlimited.
    pub max_script_operations: u64,
    /// Maximum script call depth. `0` keeps the engine default.
    pub max_call_depth: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            frame_rate: None,
            preload_audio: false,
            max_script_operations: 1_000_000,
            max_call_depth: 0,
        }
    }
}

impl PlayerConfig {
    pub fn from_json(text: &str) -> Result<Self, PlayerError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlayerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Frame rate to play at, given the movie's own rate.
    pub fn effective_frame_rate(&self, movie_rate: f64) -> Result<f64, PlayerError> {
        match self.frame_rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
            Some(rate) => Err(PlayerError::InvalidFrameRate(rate)),
            None => Ok(movie_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PlayerConfig::from_json(r#"{ "preload_audio": true }"#).unwrap();
        assert!(config.preload_audio);
        assert_eq!(config.frame_rate, None);
        assert_eq!(config.max_script_operations, 1_000_000);
    }

    #[test]
    fn frame_rate_override() {
        let config = PlayerConfig {
            frame_rate: Some(30.0),
            ..PlayerConfig::default()
        };
        assert_eq!(config.effective_frame_rate(12.0).unwrap(), 30.0);
        assert_eq!(PlayerConfig::default().effective_frame_rate(12.0).unwrap(), 12.0);

        let broken = PlayerConfig {
            frame_rate: Some(-1.0),
            ..PlayerConfig::default()
        };
        assert!(broken.effective_frame_rate(12.0).is_err());
    }
}
