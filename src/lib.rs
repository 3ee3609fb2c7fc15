//! # Flashback
//!
//! `flashback` replays decoded Flash movies: nested movie clips, buttons,
//! sounds and frame scripts, driven frame by frame against a host surface.
//!
//! The decoder output ([`flashback_data::model::MovieData`]) is validated once
//! into shared read-only assets. A [`Player`] then owns the tree of timeline
//! instances and reconciles it against that data every frame, including
//! seeks, loops and jumps issued by scripts.
//!
//! ## Core Features
//!
//! *   **Frame Reconciliation**: Incremental per-depth diffs with full resync on backward jumps.
//! *   **Nested Timelines**: Every sprite instance plays independently of its parent.
//! *   **Buttons**: Up/Over/Down state machine with mouse and key handlers.
//! *   **Sound Scheduling**: Frame-aligned starts with exclusive source ownership.
//! *   **Scripting**: Frame and button scripts run on [Rhai](https://rhai.rs/) against a movie-clip API.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use flashback::{LogNavigator, Player, PlayerConfig, PlayerContext};
//! use flashback::audio::RecordingAudio;
//! use flashback::systems::RecordingRenderer;
//!
//! let movie = flashback::load_movie("movie.json").unwrap();
//! let context = PlayerContext {
//!     mount: RecordingRenderer::MOUNT,
//!     renderer: Box::new(RecordingRenderer::new()),
//!     audio: Box::new(RecordingAudio::new()),
//!     navigator: Box::new(LogNavigator),
//! };
//! let mut player = Player::new(&movie, PlayerConfig::default(), context).unwrap();
//! player.tick(0.0);
//! ```

/// Audio backend interface.
pub mod audio;

/// Button state machine.
pub mod button;

/// Wall-clock to frame conversion.
pub mod clock;

pub mod config;

/// Placements and the backward frame scan.
pub mod display;

pub mod errors;

/// Depth slots of a timeline.
pub mod layer;

/// The frame driver.
pub mod player;

/// Rhai scripting host and movie-clip API.
pub mod scripting;

/// Timeline arena and reconciliation.
pub mod stage;

/// Core systems (Assets, Renderer, Sound).
pub mod systems;

/// Playback state of one movie-clip instance.
pub mod timeline;

/// Shared identifiers and value types.
pub mod types;

pub use config::PlayerConfig;
pub use errors::{AudioError, PlayerError};
pub use player::Player;
pub use stage::PlayerContext;
pub use types::{CharacterId, Depth, LayerHandle, TimelineId};

use anyhow::{Context, Result};
use flashback_data::model::MovieData;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tracing::{info, instrument};

/// Receives `getURL` requests from scripts.
pub trait Navigator {
    fn get_url(&mut self, url: &str, target: &str);
}

/// Navigator that only logs requests.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn get_url(&mut self, url: &str, target: &str) {
        info!(url, target, "getURL");
    }
}

/// Navigator that keeps every request. Clones share one list.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    requests: Rc<RefCell<Vec<(String, String)>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(url, target)` pairs in request order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn get_url(&mut self, url: &str, target: &str) {
        self.requests
            .borrow_mut()
            .push((url.to_string(), target.to_string()));
    }
}

/// Reads a decoded movie from a JSON file.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_movie(path: impl AsRef<Path>) -> Result<MovieData> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read movie file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse movie file {}", path.display()))
}
