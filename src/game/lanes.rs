use crate::error::{GameError, Result};

/// Lane centerlines, left to right.
pub const LANES: [f32; 4] = [-4.5, -1.5, 1.5, 4.5];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Driving toward the player (+z).
    Oncoming,
    /// Driving the same way as the player (-z).
    SameDirection,
}

pub const fn lane_count() -> usize {
    LANES.len()
}

pub fn x_for_lane(index: usize) -> Result<f32> {
    LANES.get(index).copied().ok_or(GameError::LaneOutOfRange {
        index,
        count: lane_count(),
    })
}

/// The left half of the road carries oncoming traffic.
pub fn lane_direction(index: usize) -> Direction {
    if index < lane_count() / 2 {
        Direction::Oncoming
    } else {
        Direction::SameDirection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_map_to_fixed_x() {
        assert_eq!(lane_count(), 4);
        assert_eq!(x_for_lane(0).unwrap(), -4.5);
        assert_eq!(x_for_lane(2).unwrap(), 1.5);
        assert_eq!(x_for_lane(3).unwrap(), 4.5);
    }

    #[test]
    fn out_of_range_lane_fails() {
        match x_for_lane(4) {
            Err(GameError::LaneOutOfRange { index, count }) => {
                assert_eq!(index, 4);
                assert_eq!(count, 4);
            }
            other => panic!("expected LaneOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn left_half_is_oncoming() {
        assert_eq!(lane_direction(0), Direction::Oncoming);
        assert_eq!(lane_direction(1), Direction::Oncoming);
        assert_eq!(lane_direction(2), Direction::SameDirection);
        assert_eq!(lane_direction(3), Direction::SameDirection);
    }
}
