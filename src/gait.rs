//! The gait catalog. Given a leg count and a [`GaitType`], produces the
//! fixed swing/stance bitmatrix and the stance return speed factor that
//! drive [`crate::pod::Pod::update_movement`].

use crate::error::{PodError, PodResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
pub enum GaitType {
    Tripod,
    Wave,
    Ripple,
}

/// A fixed per-column swing/stance assignment for every leg, plus the factor
/// that scales how fast a stance leg is allowed to return relative to a
/// swinging one.
///
/// Invariant: every column contains at least one `1` (some leg swings every
/// gait index); `pattern.len() == num_legs` and every row has
/// `num_indices_in_pattern` columns.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Gait {
    pattern: Vec<Vec<u8>>,
    pub stance_return_speed_factor: f64,
    pub num_indices_in_pattern: usize,
    pub name: String,
}

impl Gait {
    fn from_rows(rows: Vec<Vec<u8>>, stance_return_speed_factor: f64, name: &str) -> Self {
        let num_indices_in_pattern = rows.first().map(|row| row.len()).unwrap_or(0);
        Gait {
            pattern: rows,
            stance_return_speed_factor,
            num_indices_in_pattern,
            name: name.to_owned(),
        }
    }

    /// `true` if leg `leg_index` is in swing phase at `gait_index`.
    ///
    /// `gait_index` is taken modulo `num_indices_in_pattern` so a transiently
    /// out-of-range index (reversing direction at the ends of the pattern
    /// briefly takes the index negative or past the end) still resolves to a
    /// valid column instead of panicking.
    pub fn is_swing_phase(&self, leg_index: usize, gait_index: i64) -> bool {
        let wrapped = gait_index.rem_euclid(self.num_indices_in_pattern as i64) as usize;
        self.pattern[leg_index][wrapped] == 1
    }

    pub fn num_legs(&self) -> usize {
        self.pattern.len()
    }
}

/// Hexapod tripod gait: two columns, three legs swing per column.
fn hexapod_tripod() -> Gait {
    Gait::from_rows(
        vec![
            vec![0, 1],
            vec![1, 0],
            vec![0, 1],
            vec![1, 0],
            vec![0, 1],
            vec![1, 0],
        ],
        1.0,
        "Tripod gait",
    )
}

/// Hexapod ripple gait: three columns, legs paired so exactly two swing per
/// column (one pair).
fn hexapod_ripple() -> Gait {
    Gait::from_rows(
        vec![
            vec![1, 0, 0],
            vec![0, 1, 0],
            vec![0, 0, 1],
            vec![0, 0, 1],
            vec![1, 0, 0],
            vec![0, 1, 0],
        ],
        0.4,
        "Ripple gait",
    )
}

/// Hexapod wave gait: six columns, exactly one leg swings per column.
fn hexapod_wave() -> Gait {
    Gait::from_rows(
        vec![
            vec![0, 0, 1, 0, 0, 0],
            vec![0, 1, 0, 0, 0, 0],
            vec![1, 0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0, 1],
            vec![0, 0, 0, 0, 1, 0],
            vec![0, 0, 0, 1, 0, 0],
        ],
        0.19,
        "Wave gait",
    )
}

fn pentapod_wave() -> Gait {
    Gait::from_rows(
        vec![
            vec![1, 0, 0, 0, 0],
            vec![0, 1, 0, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 0, 0, 1, 0],
            vec![0, 0, 0, 0, 1],
        ],
        0.2,
        "Wave gait",
    )
}

fn heptapod_wave() -> Gait {
    Gait::from_rows(
        vec![
            vec![1, 0, 0, 0, 0, 0, 0],
            vec![0, 1, 0, 0, 0, 0, 0],
            vec![0, 0, 1, 0, 0, 0, 0],
            vec![0, 0, 0, 1, 0, 0, 0],
            vec![0, 0, 0, 0, 1, 0, 0],
            vec![0, 0, 0, 0, 0, 1, 0],
            vec![0, 0, 0, 0, 0, 0, 1],
        ],
        0.16,
        "Wave gait",
    )
}

/// Builds the gait for `num_legs` legs of the given `gait_type`, or fails
/// with [`PodError::UnsupportedCombination`] if the catalog has no entry for
/// that pair.
pub fn build_gait(num_legs: usize, gait_type: GaitType) -> PodResult<Gait> {
    let gait = match (num_legs, gait_type) {
        (6, GaitType::Tripod) => hexapod_tripod(),
        (6, GaitType::Ripple) => hexapod_ripple(),
        (6, GaitType::Wave) => hexapod_wave(),
        (5, GaitType::Wave) => pentapod_wave(),
        (7, GaitType::Wave) => heptapod_wave(),
        _ => {
            return Err(PodError::UnsupportedCombination {
                num_legs,
                gait: format!("{gait_type:?}"),
            })
        }
    };
    Ok(gait)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_column_has_a_swinging_leg(gait: &Gait) {
        for column in 0..gait.num_indices_in_pattern {
            let swingers = gait.pattern.iter().filter(|row| row[column] == 1).count();
            assert!(swingers >= 1, "column {column} has no swinging leg");
        }
    }

    #[test]
    fn hexapod_tripod_columns_have_three_swingers() {
        let gait = build_gait(6, GaitType::Tripod).unwrap();
        every_column_has_a_swinging_leg(&gait);
        for column in 0..gait.num_indices_in_pattern {
            let swingers = gait.pattern.iter().filter(|row| row[column] == 1).count();
            assert_eq!(swingers, 3);
        }
    }

    #[test]
    fn wave_gaits_have_exactly_one_swinger_per_column() {
        for (num_legs, ty) in [(6, GaitType::Wave), (5, GaitType::Wave), (7, GaitType::Wave)] {
            let gait = build_gait(num_legs, ty).unwrap();
            every_column_has_a_swinging_leg(&gait);
            for column in 0..gait.num_indices_in_pattern {
                let swingers = gait.pattern.iter().filter(|row| row[column] == 1).count();
                assert_eq!(swingers, 1, "num_legs={num_legs}, column={column}");
            }
        }
    }

    #[test]
    fn ripple_gait_every_column_has_a_swinger() {
        let gait = build_gait(6, GaitType::Ripple).unwrap();
        every_column_has_a_swinging_leg(&gait);
    }

    #[test]
    fn unsupported_combination_fails_at_construction() {
        let result = build_gait(8, GaitType::Tripod);
        assert!(matches!(
            result,
            Err(PodError::UnsupportedCombination { num_legs: 8, .. })
        ));
    }

    #[test]
    fn gait_index_wraps_on_negative_values() {
        let gait = build_gait(6, GaitType::Tripod).unwrap();
        assert_eq!(gait.is_swing_phase(0, -1), gait.is_swing_phase(0, 1));
    }
}
