use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::game::lanes;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub scale: f32,
    pub rotation_offset_y: f32,
    pub position_offset_y: f32,
}

impl ModelConfig {
    fn at(path: &str) -> Self {
        ModelConfig {
            path: path.to_string(),
            scale: 0.024,
            rotation_offset_y: 0.0,
            position_offset_y: 0.0,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::at("/assets/models/boltcar.glb")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TrafficConfig {
    /// Spawn z, far ahead of the player (negative).
    pub spawn_distance: f32,
    /// Entities at or past this z are behind the player and get removed.
    pub despawn_distance: f32,
    /// Extra distance beyond `spawn_distance` before a receding car is removed.
    pub despawn_margin: f32,
    /// Frames between spawn attempts at multiplier 1.
    pub base_spawn_interval: f32,
    pub min_spawn_interval: f32,
    pub spawn_probability: f32,
    pub oncoming_speed: f32,
    pub same_direction_speed: f32,
    /// Speed is scaled by a factor drawn from `[1 - jitter, 1 + jitter]`.
    pub speed_jitter: f32,
    pub models: Vec<ModelConfig>,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        TrafficConfig {
            spawn_distance: -100.0,
            despawn_distance: 50.0,
            despawn_margin: 50.0,
            base_spawn_interval: 45.0,
            min_spawn_interval: 20.0,
            spawn_probability: 0.8,
            oncoming_speed: 0.8,
            same_direction_speed: 0.1,
            speed_jitter: 0.25,
            models: (1..=6)
                .map(|i| ModelConfig::at(&format!("/assets/models/{}.glb", i)))
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub start_lane: usize,
    pub lane_change_speed: f32,
    pub snap_epsilon: f32,
    pub model: ModelConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            start_lane: 2,
            lane_change_speed: 0.1,
            snap_epsilon: 0.01,
            model: ModelConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RoadConfig {
    pub segment_count: usize,
    pub segment_length: f32,
    /// Forward speed per frame at multiplier 1.
    pub speed: f32,
    pub width: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        RoadConfig {
            segment_count: 6,
            segment_length: 50.0,
            speed: 0.3,
            width: 12.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub distance_per_frame: f32,
    /// Multiplier gained per point of score.
    pub speed_ramp: f32,
    pub max_speed_multiplier: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            distance_per_frame: 0.3,
            speed_ramp: 0.0005,
            max_speed_multiplier: 3.0,
        }
    }
}

/// What happens to live traffic when a crashed game restarts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    #[default]
    ClearTraffic,
    KeepTraffic,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub traffic: TrafficConfig,
    pub player: PlayerConfig,
    pub road: RoadConfig,
    pub scoring: ScoringConfig,
    pub restart_policy: RestartPolicy,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> GameError {
    GameError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    // NaN fails both comparisons.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(invalid(field, format!("{} not in [{}, {}]", value, min, max)))
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must be positive", value)))
    }
}

impl GameConfig {
    /// Parse and validate a config file.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let traffic = &self.traffic;
        check_range("traffic.spawn_probability", traffic.spawn_probability, 0.0, 1.0)?;
        check_range("traffic.speed_jitter", traffic.speed_jitter, 0.0, 1.0)?;
        check_positive("traffic.base_spawn_interval", traffic.base_spawn_interval)?;
        check_range("traffic.min_spawn_interval", traffic.min_spawn_interval, 0.0, f32::MAX)?;
        check_range("traffic.despawn_margin", traffic.despawn_margin, 0.0, f32::MAX)?;
        if !(traffic.spawn_distance < 0.0 && traffic.despawn_distance > 0.0) {
            return Err(invalid(
                "traffic.spawn_distance",
                "cars must spawn ahead of the player (z < 0) and despawn behind it (z > 0)",
            ));
        }

        let player = &self.player;
        if player.start_lane >= lanes::lane_count() {
            return Err(GameError::LaneOutOfRange {
                index: player.start_lane,
                count: lanes::lane_count(),
            });
        }
        check_range("player.lane_change_speed", player.lane_change_speed, f32::MIN_POSITIVE, 1.0)?;
        check_range("player.snap_epsilon", player.snap_epsilon, 0.0, f32::MAX)?;

        let road = &self.road;
        if road.segment_count == 0 {
            return Err(invalid("road.segment_count", "at least one segment is needed"));
        }
        check_positive("road.segment_length", road.segment_length)?;
        check_range("road.speed", road.speed, 0.0, f32::MAX)?;

        let scoring = &self.scoring;
        check_range("scoring.distance_per_frame", scoring.distance_per_frame, 0.0, f32::MAX)?;
        check_range("scoring.speed_ramp", scoring.speed_ramp, 0.0, f32::MAX)?;
        check_range("scoring.max_speed_multiplier", scoring.max_speed_multiplier, 1.0, f32::MAX)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = GameConfig::from_json("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.traffic.models.len(), 6);
        assert_eq!(config.player.start_lane, 2);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = GameConfig::from_json(
            r#"{ "traffic": { "spawn_probability": 1.0 }, "restart_policy": "keep_traffic" }"#,
        )
        .unwrap();
        assert_eq!(config.traffic.spawn_probability, 1.0);
        assert_eq!(config.traffic.base_spawn_interval, 45.0);
        assert_eq!(config.restart_policy, RestartPolicy::KeepTraffic);
        assert_eq!(config.road, RoadConfig::default());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_speed_jitter_is_rejected() {
        let err = GameConfig::from_json(
            r#"{ "traffic": { "speed_jitter": -0.1, "spawn_probability": 1.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidConfig { field: "traffic.speed_jitter", .. }
        ));
    }

    #[test]
    fn nan_jitter_is_rejected() {
        let mut config = GameConfig::default();
        config.traffic.speed_jitter = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            r#"{ "traffic": { "spawn_probability": 1.5 } }"#,
            r#"{ "traffic": { "min_spawn_interval": -1.0 } }"#,
            r#"{ "traffic": { "base_spawn_interval": 0.0 } }"#,
            r#"{ "road": { "segment_length": 0.0 } }"#,
            r#"{ "road": { "segment_count": 0 } }"#,
            r#"{ "player": { "lane_change_speed": 0.0 } }"#,
            r#"{ "scoring": { "max_speed_multiplier": 0.5 } }"#,
        ];
        for json in cases {
            assert!(
                matches!(GameConfig::from_json(json), Err(GameError::InvalidConfig { .. })),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn start_lane_outside_the_road_is_rejected() {
        let err = GameConfig::from_json(r#"{ "player": { "start_lane": 4 } }"#).unwrap_err();
        assert!(matches!(err, GameError::LaneOutOfRange { index: 4, count: 4 }));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = GameConfig::from_json("{ traffic: ").unwrap_err();
        assert!(matches!(err, GameError::Config(_)));
    }
}
