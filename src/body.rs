//! The parametric pod description (`BodyDefinition`) and a handful of
//! concrete body presets spanning hexapod, pentapod, and heptapod frames.

use crate::error::PodResult;
use crate::gait::{build_gait, Gait, GaitType};
use crate::geometry::{Coordinate, JointTriple, SegmentLengths};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Serializable description of a pod: leg count, per-leg mounting angle and
/// anchor coordinate, per-leg segment lengths, per-leg rest angles, and the
/// active gait.
///
/// Invariant: the four per-leg sequences all have length `num_legs`.
/// Mutated only through [`crate::pod::Pod`]'s typed setters so the pod's
/// derived leg state stays in sync.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct BodyDefinition {
    pub num_legs: usize,
    pub gait: Gait,
    pub coxa_angles: Vec<f64>,
    pub coxa_coordinates: Vec<Coordinate>,
    pub segments: Vec<SegmentLengths>,
    pub rest_angles: Vec<JointTriple>,
}

impl BodyDefinition {
    pub fn new(
        num_legs: usize,
        gait_type: GaitType,
        coxa_angles: Vec<f64>,
        coxa_coordinates: Vec<Coordinate>,
        segments: Vec<SegmentLengths>,
        rest_angles: Vec<JointTriple>,
    ) -> PodResult<Self> {
        let gait = build_gait(num_legs, gait_type)?;
        Ok(BodyDefinition {
            num_legs,
            gait,
            coxa_angles,
            coxa_coordinates,
            segments,
            rest_angles,
        })
    }

    pub fn save(&self, path: &Path) -> PodResult<()> {
        let serialized = toml::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    pub fn load(path: &Path) -> PodResult<Self> {
        let text = fs::read_to_string(path)?;
        let definition: BodyDefinition = toml::from_str(&text)?;
        Ok(definition)
    }
}

/// 6-legged pod, uneven separation between legs, standard segment lengths.
pub fn example_hexapod_0() -> BodyDefinition {
    let rest_angles = vec![JointTriple::new(0.0, -50.0, 100.0); 6];
    let segments = vec![SegmentLengths::new(30.0, 70.0, 120.0); 6];
    BodyDefinition::new(
        6,
        GaitType::Tripod,
        vec![0.0, 0.0, 180.0, 180.0, 180.0, 0.0],
        vec![
            Coordinate::new(40.0, 0.0, 0.0),
            Coordinate::new(40.0, 80.0, 0.0),
            Coordinate::new(-40.0, 80.0, 0.0),
            Coordinate::new(-40.0, 0.0, 0.0),
            Coordinate::new(-40.0, -80.0, 0.0),
            Coordinate::new(40.0, -80.0, 0.0),
        ],
        segments,
        rest_angles,
    )
    .expect("hexapod/tripod is a supported combination")
}

/// 6-legged pod, even separation, standard segment lengths. Supports tripod,
/// ripple, and wave gaits.
pub fn example_hexapod_1() -> BodyDefinition {
    let rest_angles = vec![JointTriple::new(0.0, -50.0, 100.0); 6];
    let segments = vec![SegmentLengths::new(30.0, 70.0, 120.0); 6];
    BodyDefinition::new(
        6,
        GaitType::Tripod,
        vec![0.0, 60.0, 120.0, 180.0, 240.0, 300.0],
        vec![
            Coordinate::new(40.0, 0.0, 0.0),
            Coordinate::new(20.0, 34.64, 0.0),
            Coordinate::new(-20.0, 34.64, 0.0),
            Coordinate::new(-40.0, 0.0, 0.0),
            Coordinate::new(-20.0, -34.64, 0.0),
            Coordinate::new(20.0, -34.64, 0.0),
        ],
        segments,
        rest_angles,
    )
    .expect("hexapod/tripod is a supported combination")
}

/// 6-legged pod with a relatively small body and short tibias. Supports
/// tripod, ripple, and wave gaits.
pub fn example_hexapod_2() -> BodyDefinition {
    let rest_angles = vec![JointTriple::new(0.0, 45.0, 45.0); 6];
    let segments = vec![SegmentLengths::new(53.85, 48.0, 61.7); 6];
    BodyDefinition::new(
        6,
        GaitType::Tripod,
        vec![0.0, 60.0, 120.0, 180.0, 240.0, 300.0],
        vec![
            Coordinate::new(40.0, 0.0, 0.0),
            Coordinate::new(20.0, 34.64, 0.0),
            Coordinate::new(-20.0, 34.64, 0.0),
            Coordinate::new(-40.0, 0.0, 0.0),
            Coordinate::new(-20.0, -34.64, 0.0),
            Coordinate::new(20.0, -34.64, 0.0),
        ],
        segments,
        rest_angles,
    )
    .expect("hexapod/tripod is a supported combination")
}

/// 5-legged pod. The only valid gait is wave.
pub fn example_pentapod() -> BodyDefinition {
    let rest_angles = vec![JointTriple::new(0.0, -50.0, 100.0); 5];
    let segments = vec![SegmentLengths::new(40.0, 60.0, 150.0); 5];
    BodyDefinition::new(
        5,
        GaitType::Wave,
        vec![0.0, 72.0, 144.0, 216.0, 288.0],
        vec![
            Coordinate::new(40.00, 0.00, 0.0),
            Coordinate::new(12.36, 38.04, 0.0),
            Coordinate::new(-32.36, 23.51, 0.0),
            Coordinate::new(-32.36, -23.51, 0.0),
            Coordinate::new(12.36, -38.04, 0.0),
        ],
        segments,
        rest_angles,
    )
    .expect("pentapod/wave is a supported combination")
}

/// 7-legged pod. The only valid gait is wave.
pub fn example_heptapod() -> BodyDefinition {
    let rest_angles = vec![JointTriple::new(0.0, -50.0, 100.0); 7];
    let segments = vec![SegmentLengths::new(40.0, 60.0, 150.0); 7];
    BodyDefinition::new(
        7,
        GaitType::Wave,
        vec![51.43, 102.86, 154.29, 205.72, 257.15, 308.58, 360.0],
        vec![
            Coordinate::new(24.94, 31.27, 0.0),
            Coordinate::new(-8.90, 39.00, 0.0),
            Coordinate::new(-36.04, 17.36, 0.0),
            Coordinate::new(-36.04, -17.36, 0.0),
            Coordinate::new(-8.90, -39.00, 0.0),
            Coordinate::new(24.94, -31.27, 0.0),
            Coordinate::new(40.00, 0.00, 0.0),
        ],
        segments,
        rest_angles,
    )
    .expect("heptapod/wave is a supported combination")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_consistent_per_leg_sequence_lengths() {
        for preset in [
            example_hexapod_0(),
            example_hexapod_1(),
            example_hexapod_2(),
            example_pentapod(),
            example_heptapod(),
        ] {
            assert_eq!(preset.coxa_angles.len(), preset.num_legs);
            assert_eq!(preset.coxa_coordinates.len(), preset.num_legs);
            assert_eq!(preset.segments.len(), preset.num_legs);
            assert_eq!(preset.rest_angles.len(), preset.num_legs);
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir::TempDir::new("pod-body").unwrap();
        let path = dir.path().join("hexapod1.toml");
        let original = example_hexapod_1();
        original.save(&path).unwrap();
        let loaded = BodyDefinition::load(&path).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn octopod_preset_has_no_catalog_gait() {
        let result = BodyDefinition::new(
            8,
            GaitType::Tripod,
            vec![0.0; 8],
            vec![Coordinate::new(0.0, 0.0, 0.0); 8],
            vec![SegmentLengths::new(20.0, 40.0, 60.0); 8],
            vec![JointTriple::zero(); 8],
        );
        assert!(result.is_err());
    }
}
