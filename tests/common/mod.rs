//! Shared helpers for player integration tests.
#![allow(dead_code)]

use flashback::audio::{AudioCall, RecordingAudio};
use flashback::systems::renderer::RenderCall;
use flashback::systems::RecordingRenderer;
use flashback::{
    Depth, LayerHandle, Player, PlayerConfig, PlayerContext, RecordingNavigator, TimelineId,
};
use flashback_data::model::MovieData;
use serde_json::Value;

/// A player wired to recording collaborators.
pub struct Harness {
    pub player: Player,
    pub renderer: RecordingRenderer,
    pub audio: RecordingAudio,
    pub navigator: RecordingNavigator,
}

impl Harness {
    pub fn root(&self) -> TimelineId {
        self.player.root()
    }

    pub fn container(&self, timeline: TimelineId, depth: u32) -> LayerHandle {
        self.player
            .layer_state(timeline, Depth(depth))
            .expect("layer exists")
            .container
    }

    /// Character shown at a root depth.
    pub fn character(&self, depth: u32) -> Option<u16> {
        self.player
            .layer_state(self.root(), Depth(depth))
            .and_then(|layer| layer.character)
            .map(|id| id.0)
    }

    pub fn sprite(&self, timeline: TimelineId, depth: u32) -> Option<TimelineId> {
        self.player
            .layer_state(timeline, Depth(depth))
            .and_then(|layer| layer.sprite)
    }

    pub fn frame(&self, timeline: TimelineId) -> u32 {
        self.player.timeline_state(timeline).expect("timeline alive").frame
    }

    pub fn rendered(&self, timeline: TimelineId) -> Option<u32> {
        self.player
            .timeline_state(timeline)
            .expect("timeline alive")
            .rendered_frame
    }

    pub fn paused(&self, timeline: TimelineId) -> bool {
        self.player.timeline_state(timeline).expect("timeline alive").paused
    }

    pub fn urls(&self) -> Vec<String> {
        self.navigator
            .requests()
            .into_iter()
            .map(|(url, _)| url)
            .collect()
    }

    pub fn render_calls(&self) -> Vec<RenderCall> {
        self.renderer.calls()
    }

    pub fn audio_calls(&self) -> Vec<AudioCall> {
        self.audio.calls()
    }
}

pub fn movie(value: Value) -> MovieData {
    serde_json::from_value(value).expect("valid movie json")
}

pub fn context(
    renderer: &RecordingRenderer,
    audio: &RecordingAudio,
    navigator: &RecordingNavigator,
) -> PlayerContext {
    PlayerContext {
        mount: RecordingRenderer::MOUNT,
        renderer: Box::new(renderer.clone()),
        audio: Box::new(audio.clone()),
        navigator: Box::new(navigator.clone()),
    }
}

pub fn harness(value: Value) -> Harness {
    harness_with(value, PlayerConfig::default())
}

pub fn harness_with(value: Value, config: PlayerConfig) -> Harness {
    init_tracing();
    let renderer = RecordingRenderer::new();
    let audio = RecordingAudio::new();
    let navigator = RecordingNavigator::new();
    let player = Player::new(
        &movie(value),
        config,
        context(&renderer, &audio, &navigator),
    )
    .expect("player builds");
    Harness {
        player,
        renderer,
        audio,
        navigator,
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
