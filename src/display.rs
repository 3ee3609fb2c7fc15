//! # Display Objects
//!
//! Validated per-frame placements and the backward scan that decides what a
//! depth shows after a run of frames.
//!
//! ## Key Types
//! - `DisplayObject`: a placement with a parsed transform and color effect.
//! - `FrameEntries`: frame-keyed changes of one depth. `None` is a removal.
//! - `Resolution`: outcome of scanning the entries between two frames.

use crate::errors::PlayerError;
use crate::types::{Affine, CharacterId, ColorTransform, DefinitionKey, Depth};
use flashback_data::model::ObjectData;
use std::collections::BTreeMap;

/// Frame-keyed changes of one depth. A missing frame means "unchanged".
pub type FrameEntries = BTreeMap<u32, Option<DisplayObject>>;

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayObject {
    pub character: CharacterId,
    pub transform: Option<Affine>,
    pub color_transform: Option<ColorTransform>,
    pub name: Option<String>,
    pub ratio: Option<u16>,
}

impl DisplayObject {
    /// Validates decoder output for the placement at `(timeline, depth, frame)`.
    pub fn from_data(
        data: &ObjectData,
        timeline: DefinitionKey,
        depth: Depth,
        frame: u32,
    ) -> Result<Self, PlayerError> {
        let transform = match data.matrix {
            Some(m) if m.iter().all(|v| v.is_finite()) => Some(Affine::new(m)),
            Some(_) => {
                return Err(PlayerError::MalformedTransform {
                    timeline,
                    depth: depth.0,
                    frame,
                })
            }
            None => None,
        };
        let color_transform = match &data.color_transform {
            Some(values) => Some(ColorTransform::from_values(values).ok_or(
                PlayerError::MalformedColorTransform {
                    timeline,
                    depth: depth.0,
                    frame,
                    len: values.len(),
                },
            )?),
            None => None,
        };
        Ok(Self {
            character: data.character,
            transform,
            color_transform,
            name: data.name.clone(),
            ratio: data.ratio,
        })
    }

    /// Two placements share an instance when character and ratio match.
    pub fn same_instance(&self, character: Option<CharacterId>, ratio: Option<u16>) -> bool {
        character == Some(self.character) && ratio == self.ratio
    }
}

#[derive(Debug, PartialEq)]
pub enum Resolution<'a> {
    /// No entry in the scanned range.
    Unchanged,
    /// The newest entry is a removal.
    Removed,
    /// The newest entry is a placement.
    ///
    /// `interrupted` is set when an older entry in the same range removed the
    /// slot or held a different instance, so the current content must not be
    /// reused even if it matches.
    Placed {
        object: &'a DisplayObject,
        interrupted: bool,
    },
}

/// Scans `entries` backward from `frame` down to just after `rendered`.
pub fn resolve(entries: &FrameEntries, rendered: Option<u32>, frame: u32) -> Resolution<'_> {
    let start = match rendered {
        Some(r) if r >= frame => return Resolution::Unchanged,
        Some(r) => r + 1,
        None => 0,
    };
    let mut scan = entries.range(start..=frame).rev();
    match scan.next() {
        None => Resolution::Unchanged,
        Some((_, None)) => Resolution::Removed,
        Some((_, Some(object))) => {
            let interrupted = scan.any(|(_, entry)| match entry {
                None => true,
                Some(older) => !object.same_instance(Some(older.character), older.ratio),
            });
            Resolution::Placed {
                object,
                interrupted,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(character: u16) -> DisplayObject {
        DisplayObject {
            character: CharacterId(character),
            transform: None,
            color_transform: None,
            name: None,
            ratio: None,
        }
    }

    fn entries(items: &[(u32, Option<u16>)]) -> FrameEntries {
        items
            .iter()
            .map(|(frame, c)| (*frame, c.map(object)))
            .collect()
    }

    #[test]
    fn newest_entry_wins() {
        let e = entries(&[(0, Some(1)), (2, Some(2))]);
        match resolve(&e, None, 3) {
            Resolution::Placed { object, .. } => assert_eq!(object.character, CharacterId(2)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn tombstone_ends_scan() {
        let e = entries(&[(0, Some(1)), (1, None)]);
        assert_eq!(resolve(&e, None, 1), Resolution::Removed);
        assert_eq!(resolve(&e, Some(1), 2), Resolution::Unchanged);
    }

    #[test]
    fn range_excludes_rendered_frame() {
        let e = entries(&[(0, Some(1))]);
        assert_eq!(resolve(&e, Some(0), 1), Resolution::Unchanged);
        assert_eq!(resolve(&e, Some(0), 0), Resolution::Unchanged);
    }

    #[test]
    fn removal_inside_range_interrupts() {
        let e = entries(&[(1, Some(1)), (2, None), (3, Some(1))]);
        match resolve(&e, Some(0), 3) {
            Resolution::Placed { interrupted, .. } => assert!(interrupted),
            other => panic!("unexpected {:?}", other),
        }
        match resolve(&e, Some(2), 3) {
            Resolution::Placed { interrupted, .. } => assert!(!interrupted),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_color_transform() {
        let data = ObjectData {
            character: CharacterId(1),
            matrix: None,
            name: None,
            color_transform: Some(vec![1.0, 1.0, 1.0]),
            ratio: None,
        };
        let err = DisplayObject::from_data(&data, DefinitionKey::Root, Depth(2), 5).unwrap_err();
        assert!(matches!(
            err,
            PlayerError::MalformedColorTransform { len: 3, depth: 2, .. }
        ));
    }

    #[test]
    fn rejects_non_finite_matrix() {
        let data = ObjectData {
            character: CharacterId(1),
            matrix: Some([1.0, 0.0, 0.0, f64::NAN, 0.0, 0.0]),
            name: None,
            color_transform: None,
            ratio: None,
        };
        assert!(DisplayObject::from_data(&data, DefinitionKey::Root, Depth(0), 0).is_err());
    }
}
