// flashback-data: Serde structs for decoded movie timelines
pub mod model;

#[cfg(test)]
mod tests {
    use super::model::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let data = json!({
            "frame_rate": 12,
            "root": { "frame_count": 1 }
        });
        let movie: MovieData = serde_json::from_value(data).unwrap();
        assert_eq!(movie.root.frame_count, 1);
        assert!(movie.sprites.is_empty());
        assert_eq!(movie.byte_size, None);
    }

    #[test]
    fn test_layer_tombstones() {
        let data = json!([
            {
                "0": { "character": 1, "matrix": [1, 0, 0, 1, 10, 20] },
                "1": null,
                "2": { "character": 2, "name": "ball", "ratio": 3 }
            }
        ]);
        let layers: Vec<LayerData> = serde_json::from_value(data).unwrap();
        let frames = &layers[0].frames;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[&0].as_ref().unwrap().matrix, Some([1.0, 0.0, 0.0, 1.0, 10.0, 20.0]));
        assert!(frames[&1].is_none());
        assert_eq!(frames[&2].as_ref().unwrap().name.as_deref(), Some("ball"));
        assert!(!frames.contains_key(&3));
    }

    #[test]
    fn test_action_forms() {
        let script: ActionData = serde_json::from_value(json!("this.stop();")).unwrap();
        assert_eq!(script, ActionData::Script("this.stop();".into()));

        let ops: ActionData = serde_json::from_value(json!([
            { "op": "gotoFrame", "frame": 4 },
            { "op": "getUrl", "url": "http://example.com", "target": "_blank" },
            { "op": "play" }
        ]))
        .unwrap();
        match ops {
            ActionData::Ops(ops) => {
                assert_eq!(ops[0], ActionOp::GotoFrame { frame: 4 });
                assert_eq!(ops[2], ActionOp::Play);
            }
            other => panic!("expected ops, got {:?}", other),
        }
    }

    #[test]
    fn test_sound_cue_loop_alias() {
        let cue: SoundCue =
            serde_json::from_value(json!({ "character": 7, "loops": true })).unwrap();
        assert!(cue.looping);
        assert!(!cue.no_restart);
    }
}
