//! Playback Tests
//!
//! Frame reconciliation of the timeline tree: placement, removal, character
//! swaps, resync on backward jumps, pausing and the frame clock.

mod common;

use common::{harness, movie};
use flashback::audio::RecordingAudio;
use flashback::systems::renderer::RenderCall;
use flashback::systems::RecordingRenderer;
use flashback::types::{Affine, DefinitionKey};
use flashback::{CharacterId, Depth, Player, PlayerConfig, PlayerError, RecordingNavigator};
use serde_json::json;

fn sequence_movie() -> serde_json::Value {
    json!({
        "frame_rate": 8,
        "root": {
            "frame_count": 4,
            "layers": [
                { "0": { "character": 1 }, "1": null, "2": { "character": 2 } }
            ]
        }
    })
}

/// Placement, removal and "unchanged" resolve frame by frame, then wrap.
///
/// Validates:
/// - `[{1}, removed, {2}, unchanged]` shows `1, removed, 2, 2`
/// - `rendered_frame` tracks the frame shown by each call
/// - the frame wraps to 0 after the fourth call
#[test]
fn placement_sequence_and_wrap() {
    let mut h = harness(sequence_movie());
    let root = h.root();
    let container = h.container(root, 0);

    // `Player::new` already showed frame 0.
    assert_eq!(h.character(0), Some(1));
    assert_eq!(h.renderer.href(container), Some(CharacterId(1)));
    assert_eq!(h.rendered(root), Some(0));

    h.player.advance_frames(1);
    assert_eq!(h.character(0), None);
    assert_eq!(h.renderer.href(container), None);
    assert_eq!(h.rendered(root), Some(1));

    h.player.advance_frames(1);
    assert_eq!(h.character(0), Some(2));
    assert_eq!(h.rendered(root), Some(2));

    h.player.advance_frames(1);
    assert_eq!(h.character(0), Some(2));
    assert_eq!(h.rendered(root), Some(3));
    assert_eq!(h.frame(root), 0);

    // Wrapping is a backward jump: full resync back to the first placement.
    h.player.advance_frames(1);
    assert_eq!(h.character(0), Some(1));
    assert_eq!(h.renderer.href(container), Some(CharacterId(1)));
    assert_eq!(h.rendered(root), Some(0));
}

/// Frames skipped by a jump are still folded into the display state.
#[test]
fn forward_jump_folds_skipped_frames() {
    let mut h = harness(json!({
        "frame_rate": 8,
        "root": {
            "frame_count": 5,
            "layers": [
                { "1": { "character": 3 } },
                { "0": { "character": 4 }, "2": null },
                { "0": { "character": 5 }, "1": null, "3": { "character": 5 } }
            ],
            "actions": { "0": "this.gotoFrame(3);" }
        }
    }));
    h.player.advance_frames(1);
    let root = h.root();
    assert_eq!(h.rendered(root), Some(3));
    assert_eq!(h.character(0), Some(3));
    assert_eq!(h.character(1), None);
    assert_eq!(h.character(2), Some(5));
}

/// A depth that was emptied and refilled with the same character inside one
/// pass gets a fresh sprite.
#[test]
fn refill_within_a_jump_recreates_sprite() {
    let mut h = harness(json!({
        "frame_rate": 8,
        "root": {
            "frame_count": 4,
            "layers": [ { "0": { "character": 10 }, "1": null, "2": { "character": 10 } } ],
            "actions": { "0": "this.gotoFrame(2);" }
        },
        "sprites": { "10": { "frame_count": 1 } }
    }));
    let root = h.root();
    let before = h.sprite(root, 0).expect("sprite at frame 0");
    h.player.advance_frames(1);
    let after = h.sprite(root, 0).expect("sprite at frame 2");
    assert_ne!(before, after);
    assert!(!h.player.is_alive(before));
}

/// Transform and color effect are reapplied on every frame the object is
/// present, without recreating it.
#[test]
fn transform_updates_keep_instance() {
    let mut h = harness(json!({
        "frame_rate": 8,
        "root": {
            "frame_count": 2,
            "layers": [ {
                "0": { "character": 10, "matrix": [1, 0, 0, 1, 0, 0] },
                "1": { "character": 10, "matrix": [2, 0, 0, 2, 5, 5], "color_transform": [1, 1, 1, 0.5] }
            } ]
        },
        "sprites": { "10": { "frame_count": 1 } }
    }));
    let root = h.root();
    let container = h.container(root, 0);
    let sprite = h.sprite(root, 0);
    h.renderer.clear_calls();

    h.player.advance_frames(1);
    assert_eq!(h.sprite(root, 0), sprite);
    let calls = h.render_calls();
    assert!(calls.contains(&RenderCall::SetTransform(
        container,
        Some(Affine::new([2.0, 0.0, 0.0, 2.0, 5.0, 5.0]))
    )));
    assert!(!calls
        .iter()
        .any(|call| matches!(call, RenderCall::SetHref(handle, _) if *handle == container)));
    let layer = h.player.layer_state(root, Depth(0)).unwrap();
    assert_eq!(layer.color_transform.unwrap().values(), &[1.0, 1.0, 1.0, 0.5]);
}

/// Swapping characters fully detaches the old sprite before the new one is attached.
#[test]
fn character_swap_detaches_before_attach() {
    let mut h = harness(json!({
        "frame_rate": 8,
        "root": {
            "frame_count": 2,
            "layers": [ { "0": { "character": 10 }, "1": { "character": 11 } } ]
        },
        "sprites": {
            "10": { "frame_count": 1, "layers": [ { "0": { "character": 1 } } ] },
            "11": { "frame_count": 1, "layers": [ { "0": { "character": 2 } } ] }
        }
    }));
    let root = h.root();
    let old = h.sprite(root, 0).expect("old sprite");
    let old_layer = h.container(old, 0);
    h.renderer.clear_calls();

    h.player.advance_frames(1);
    let new = h.sprite(root, 0).expect("new sprite");
    assert_ne!(old, new);
    assert!(!h.player.is_alive(old));
    assert!(!h.renderer.is_attached(old_layer));

    let calls = h.render_calls();
    let detached = calls
        .iter()
        .position(|call| *call == RenderCall::Detach(old_layer))
        .expect("old layer detached");
    let created = calls
        .iter()
        .position(|call| matches!(call, RenderCall::Create(..)))
        .expect("new layer created");
    assert!(detached < created);
    assert_eq!(h.player.layer_state(new, Depth(0)).unwrap().character, Some(CharacterId(2)));
}

/// A ratio change on the same character is a full recreation.
#[test]
fn ratio_change_recreates() {
    let mut h = harness(json!({
        "frame_rate": 8,
        "root": {
            "frame_count": 2,
            "layers": [ { "0": { "character": 10, "ratio": 1 }, "1": { "character": 10, "ratio": 2 } } ]
        },
        "sprites": { "10": { "frame_count": 3 } }
    }));
    let root = h.root();
    let first = h.sprite(root, 0).unwrap();
    h.player.advance_frames(1);
    let second = h.sprite(root, 0).unwrap();
    assert_ne!(first, second);
    assert_eq!(h.frame(second), 1);
    assert_eq!(h.rendered(second), Some(0));
}

/// Child sprites know their parent and root; grandchildren share the root.
#[test]
fn nested_timelines_link_parent_and_root() {
    let h = harness(json!({
        "frame_rate": 8,
        "root": { "frame_count": 1, "layers": [ { "0": { "character": 10, "name": "outer" } } ] },
        "sprites": {
            "10": { "frame_count": 2, "layers": [ { "0": { "character": 11, "name": "inner" } } ] },
            "11": { "frame_count": 3 }
        }
    }));
    let root = h.root();
    let outer = h.sprite(root, 0).unwrap();
    let inner = h.sprite(outer, 0).unwrap();

    let outer_state = h.player.timeline_state(outer).unwrap();
    assert_eq!(outer_state.parent, Some(root));
    assert_eq!(outer_state.root, Some(root));
    let inner_state = h.player.timeline_state(inner).unwrap();
    assert_eq!(inner_state.parent, Some(outer));
    assert_eq!(inner_state.root, Some(root));
    assert_eq!(h.player.movie_clip(inner).target_path(), "_level0.outer.inner");
}

/// Every sprite instance plays at its own pace, independently of its parent.
#[test]
fn children_play_independently() {
    let mut h = harness(json!({
        "frame_rate": 8,
        "root": { "frame_count": 1, "layers": [ { "0": { "character": 10 } } ] },
        "sprites": { "10": { "frame_count": 3 } }
    }));
    let root = h.root();
    let child = h.sprite(root, 0).unwrap();
    assert_eq!(h.frame(child), 1);
    h.player.advance_frames(2);
    assert_eq!(h.sprite(root, 0), Some(child));
    assert_eq!(h.frame(child), 0);
    assert_eq!(h.rendered(child), Some(2));
}

/// Two passes over a paused timeline produce identical renderer output, and
/// children keep playing.
#[test]
fn paused_timeline_is_idempotent() {
    let mut h = harness(json!({
        "frame_rate": 8,
        "root": {
            "frame_count": 3,
            "layers": [
                { "0": { "character": 1 }, "1": { "character": 2 } },
                { "0": { "character": 10 } }
            ],
            "actions": { "1": "this.stop();" }
        },
        "sprites": { "10": { "frame_count": 4 } }
    }));
    let root = h.root();
    h.player.advance_frames(1);
    assert!(h.paused(root));
    assert_eq!(h.frame(root), 1);
    let child = h.sprite(root, 1).unwrap();
    let child_frame = h.frame(child);

    h.renderer.clear_calls();
    h.player.advance_frames(1);
    let first = h.render_calls();
    let state = h.player.timeline_state(root);

    h.renderer.clear_calls();
    h.player.advance_frames(1);
    assert_eq!(h.render_calls(), first);
    assert_eq!(h.player.timeline_state(root), state);
    assert_eq!(h.character(0), Some(2));
    assert_eq!(h.frame(child), (child_frame + 2) % 4);
}

/// A goto on a paused timeline is rendered on the next pass without unpausing.
#[test]
fn goto_while_paused_renders_target() {
    let mut h = harness(sequence_movie());
    let root = h.root();
    let clip = h.player.movie_clip(root);
    clip.goto_and_stop(&flashback::types::FrameTarget::Frame(2));
    h.player.advance_frames(1);
    assert_eq!(h.character(0), Some(2));
    assert_eq!(h.rendered(root), Some(2));
    assert!(h.paused(root));
    h.player.advance_frames(1);
    assert_eq!(h.frame(root), 2);
}

/// Removing a sprite destroys its whole subtree.
#[test]
fn removal_destroys_subtree() {
    let mut h = harness(json!({
        "frame_rate": 8,
        "root": { "frame_count": 2, "layers": [ { "0": { "character": 10 }, "1": null } ] },
        "sprites": {
            "10": { "frame_count": 1, "layers": [ { "0": { "character": 11 } } ] },
            "11": { "frame_count": 1 }
        }
    }));
    let root = h.root();
    let outer = h.sprite(root, 0).unwrap();
    let inner = h.sprite(outer, 0).unwrap();
    h.player.advance_frames(1);
    assert!(!h.player.is_alive(outer));
    assert!(!h.player.is_alive(inner));
    assert_eq!(h.player.stage().borrow().len(), 1);
}

/// The clock converts elapsed wall time into catch-up passes.
#[test]
fn tick_catches_up() {
    let mut h = harness(sequence_movie());
    let root = h.root();
    assert_eq!(h.player.tick(10.0), 0);
    assert_eq!(h.player.tick(10.25), 2);
    assert_eq!(h.rendered(root), Some(2));
    assert_eq!(h.player.tick(10.25), 0);
}

/// Invalid construction input is rejected up front.
#[test]
fn rejects_invalid_movies() {
    let build = |value: serde_json::Value| {
        let renderer = RecordingRenderer::new();
        let audio = RecordingAudio::new();
        let navigator = RecordingNavigator::new();
        Player::new(
            &movie(value),
            PlayerConfig::default(),
            common::context(&renderer, &audio, &navigator),
        )
    };

    match build(json!({ "frame_rate": 8, "root": { "frame_count": 0 } })) {
        Err(PlayerError::EmptyTimeline(DefinitionKey::Root)) => {}
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("empty timeline accepted"),
    }

    let bad_color = json!({
        "frame_rate": 8,
        "root": { "frame_count": 1, "layers": [ { "0": { "character": 1, "color_transform": [1, 2, 3] } } ] }
    });
    assert!(matches!(
        build(bad_color),
        Err(PlayerError::MalformedColorTransform { len: 3, .. })
    ));
}
