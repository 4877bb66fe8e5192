//! Game state observed at a sampling tick.
//!
//! [`GameState`] is owned by the game; the collector only reads it. All fields have
//! defaults so that a partial JSON object deserializes.

use serde::{Deserialize, Serialize};

/// Difficulty selected for the session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[display("easy")]
    Easy,
    #[default]
    #[display("normal")]
    Normal,
    #[display("hard")]
    Hard,
}

impl Difficulty {
    /// Target spawn interval in milliseconds.
    #[must_use]
    pub const fn spawn_interval_ms(self) -> u32 {
        match self {
            Difficulty::Easy => 780,
            Difficulty::Normal => 650,
            Difficulty::Hard => 560,
        }
    }
}

/// Display mode the session is running in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    #[display("mobile")]
    Mobile,
    #[display("pc")]
    Pc,
    #[display("vr")]
    Vr,
    #[display("cvr")]
    Cvr,
}

/// Food-group keys in one-hot order.
pub const FOOD_GROUP_KEYS: [&str; 5] = ["fruit", "veg", "protein", "grain", "dairy"];

/// Ambient game state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameState {
    /// Planned session length in seconds.
    pub time_plan_sec: f64,
    pub left_sec: f64,

    pub score: i64,
    pub combo: i64,
    pub misses: i64,
    /// Accuracy of good hits in percent (0..=100).
    pub accuracy_pct: f64,
    /// Pressure level (0..=3).
    pub pressure: f64,

    pub storm: bool,
    pub storm_urgent: bool,
    pub clutch: bool,

    pub mini_on: bool,
    pub mini_need: i64,
    pub mini_now: i64,
    pub mini_left_sec: f64,
    pub mini_count_total: i64,
    pub mini_count_cleared: i64,

    pub power_charge: f64,
    pub power_threshold: f64,

    pub goal_pct: f64,
    pub goal_now: i64,
    pub goal_total: i64,

    pub group_key: String,
    pub group_name: String,
    pub difficulty: Difficulty,
    pub view: ViewMode,

    // cumulative judgment counters
    pub hit_good: i64,
    pub hit_wrong: i64,
    pub hit_junk: i64,
    pub expire_good: i64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            time_plan_sec: 90.0,
            left_sec: 0.0,
            score: 0,
            combo: 0,
            misses: 0,
            accuracy_pct: 0.0,
            pressure: 0.0,
            storm: false,
            storm_urgent: false,
            clutch: false,
            mini_on: false,
            mini_need: 0,
            mini_now: 0,
            mini_left_sec: 0.0,
            mini_count_total: 0,
            mini_count_cleared: 0,
            power_charge: 0.0,
            power_threshold: 8.0,
            goal_pct: 0.0,
            goal_now: 0,
            goal_total: 1,
            group_key: String::new(),
            group_name: String::new(),
            difficulty: Difficulty::Normal,
            view: ViewMode::Mobile,
            hit_good: 0,
            hit_wrong: 0,
            hit_junk: 0,
            expire_good: 0,
        }
    }
}

impl GameState {
    /// Index of the current food group in [`FOOD_GROUP_KEYS`], if any.
    #[must_use]
    pub fn group_index(&self) -> Option<usize> {
        FOOD_GROUP_KEYS.iter().position(|k| *k == self.group_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let state: GameState =
            serde_json::from_str(r#"{"score": 120, "difficulty": "hard", "view": "cvr"}"#)
                .unwrap();
        assert_eq!(state.score, 120);
        assert_eq!(state.difficulty, Difficulty::Hard);
        assert_eq!(state.view, ViewMode::Cvr);
        assert!((state.time_plan_sec - 90.0).abs() < f64::EPSILON);
        assert_eq!(state.goal_total, 1);
    }

    #[test]
    fn test_group_index() {
        let state = GameState {
            group_key: "grain".to_owned(),
            ..GameState::default()
        };
        assert_eq!(state.group_index(), Some(3));
        assert_eq!(GameState::default().group_index(), None);
    }

    #[test]
    fn test_spawn_interval_is_faster_on_hard() {
        assert!(Difficulty::Hard.spawn_interval_ms() < Difficulty::Normal.spawn_interval_ms());
        assert!(Difficulty::Normal.spawn_interval_ms() < Difficulty::Easy.spawn_interval_ms());
    }
}
