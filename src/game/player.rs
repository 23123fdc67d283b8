use nalgebra::Point3;

use crate::error::Result;
use crate::game::collision::Aabb;
use crate::game::config::PlayerConfig;
use crate::game::lanes;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveState {
    Driving,
    Crashed,
}

/// Lane position of the player's car. Lane changes are discrete; the car's
/// x follows the target lane with exponential smoothing.
#[derive(Clone, Debug)]
pub struct PlayerController {
    current_lane: usize,
    target_x: f32,
    current_x: f32,
    state: DriveState,
    lane_change_speed: f32,
    snap_epsilon: f32,
}

impl PlayerController {
    pub fn new(config: &PlayerConfig) -> Result<Self> {
        let x = lanes::x_for_lane(config.start_lane)?;
        Ok(PlayerController {
            current_lane: config.start_lane,
            target_x: x,
            current_x: x,
            state: DriveState::Driving,
            lane_change_speed: config.lane_change_speed,
            snap_epsilon: config.snap_epsilon,
        })
    }

    /// Apply one frame of edge-triggered intents. Clamped at the outer lanes.
    pub fn steer(&mut self, left: bool, right: bool) {
        if self.state == DriveState::Crashed {
            return;
        }
        if left && self.current_lane > 0 {
            self.current_lane -= 1;
        }
        if right && self.current_lane + 1 < lanes::lane_count() {
            self.current_lane += 1;
        }
        self.target_x = lanes::LANES[self.current_lane];
    }

    pub fn update(&mut self) {
        if self.state == DriveState::Crashed {
            return;
        }
        let diff = self.target_x - self.current_x;
        if diff.abs() > self.snap_epsilon {
            self.current_x += diff * self.lane_change_speed;
        } else {
            self.current_x = self.target_x;
        }
    }

    pub fn crash(&mut self) {
        self.state = DriveState::Crashed;
    }

    pub fn reset(&mut self, start_lane: usize) -> Result<()> {
        let x = lanes::x_for_lane(start_lane)?;
        self.current_lane = start_lane;
        self.target_x = x;
        self.current_x = x;
        self.state = DriveState::Driving;
        Ok(())
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::new(self.current_x, 0.0, 0.0)
    }

    pub fn bounds(&self, local: &Aabb) -> Aabb {
        local.translated(&self.position().coords)
    }

    pub fn current_lane(&self) -> usize {
        self.current_lane
    }

    pub fn target_x(&self) -> f32 {
        self.target_x
    }

    pub fn current_x(&self) -> f32 {
        self.current_x
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn is_crashed(&self) -> bool {
        self.state == DriveState::Crashed
    }
}
