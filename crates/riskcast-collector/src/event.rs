//! Typed collector input events.
//!
//! Events arrive as JSON objects tagged by `kind`. Payload numbers are loosely typed
//! (any JSON number) and are validated when converted to their internal form; an
//! event that fails validation is reported as [`InvalidEventError`] and dropped by
//! the collector.
//!
//! ```json
//! {"kind":"session_start","sessionId":"a1","seed":"42","gameTag":"groups","startSec":0}
//! {"kind":"snapshot","tSec":3,"left":87,"score":120,"combo":2,"miss":1,"acc":80}
//! {"kind":"prediction","tSec":3,"features":[...32 numbers...],"pMissNext5":0.4}
//! {"kind":"state","nowSec":4.2,"state":{"score":130,"misses":1}}
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    feature::{FEATURE_COUNT, FeatureVector},
    pending::{ModelOutputs, PendingPrediction, SampleContext},
    snapshot::Snapshot,
    state::GameState,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectorEvent {
    SessionStart(SessionInfo),
    Snapshot(SnapshotEvent),
    Prediction(PredictionEvent),
    State(StateEvent),
}

/// Identity of a play session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub seed: String,
    pub game_tag: String,
    /// Clock reading at which session time 0 starts.
    pub start_sec: f64,
}

impl SessionInfo {
    /// Session key used for split assignment: `sessionId|seed|gameTag`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.session_id, self.seed, self.game_tag)
    }
}

/// Externally produced snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEvent {
    pub t_sec: Option<f64>,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub combo: f64,
    #[serde(default)]
    pub miss: f64,
    #[serde(default)]
    pub acc: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub mini_on: bool,
    #[serde(default)]
    pub mini_left: f64,
    #[serde(default)]
    pub storm: bool,
    #[serde(default)]
    pub hit_good: f64,
    #[serde(default)]
    pub hit_wrong: f64,
    #[serde(default)]
    pub hit_junk: f64,
    #[serde(default)]
    pub expire_good: f64,
}

/// Externally produced sample with optional model outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionEvent {
    pub t_sec: Option<f64>,
    pub features: Vec<f64>,
    #[serde(default)]
    pub group_key: String,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub risk01: Option<f64>,
    #[serde(default)]
    pub p_miss_next5: Option<f64>,
    #[serde(default)]
    pub p_score_drop_next5: Option<f64>,
}

/// Full game state observed at clock reading `now_sec`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEvent {
    pub now_sec: f64,
    #[serde(default)]
    pub state: GameState,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum InvalidEventError {
    #[display("missing field `{field}`")]
    MissingField { field: &'static str },
    #[display("field `{field}` is not finite")]
    NonFinite { field: &'static str },
    #[display("field `{field}` is negative: {value}")]
    Negative { field: &'static str, value: f64 },
    #[display("expected {} features, found {found}", FEATURE_COUNT)]
    FeatureCount { found: usize },
}

fn finite(field: &'static str, value: f64) -> Result<f64, InvalidEventError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidEventError::NonFinite { field })
    }
}

/// Non-negative whole seconds, truncated.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds(field: &'static str, value: f64) -> Result<u32, InvalidEventError> {
    let value = finite(field, value)?;
    if value < 0.0 {
        return Err(InvalidEventError::Negative { field, value });
    }
    Ok(value.floor().min(f64::from(u32::MAX)) as u32)
}

/// Rounded counter value.
#[expect(clippy::cast_possible_truncation)]
fn count(field: &'static str, value: f64) -> Result<i64, InvalidEventError> {
    Ok(finite(field, value)?.round() as i64)
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(field: &'static str, value: f64) -> Result<u8, InvalidEventError> {
    Ok(finite(field, value)?.round().clamp(0.0, 100.0) as u8)
}

#[expect(clippy::cast_possible_truncation)]
fn probability(field: &'static str, value: Option<f64>) -> Result<Option<f32>, InvalidEventError> {
    value
        .map(|v| finite(field, v).map(|v| v.clamp(0.0, 1.0) as f32))
        .transpose()
}

impl TryFrom<&SnapshotEvent> for Snapshot {
    type Error = InvalidEventError;

    fn try_from(e: &SnapshotEvent) -> Result<Self, Self::Error> {
        let t_sec = e
            .t_sec
            .ok_or(InvalidEventError::MissingField { field: "tSec" })?;
        Ok(Snapshot {
            t_sec: seconds("tSec", t_sec)?,
            left: seconds("left", e.left)?,
            score: count("score", e.score)?,
            combo: count("combo", e.combo)?,
            miss: count("miss", e.miss)?,
            acc: percent("acc", e.acc)?,
            pressure: percent("pressure", e.pressure)?.min(3),
            mini_on: e.mini_on,
            mini_left: seconds("miniLeft", e.mini_left)?,
            storm: e.storm,
            hit_good: count("hitGood", e.hit_good)?,
            hit_wrong: count("hitWrong", e.hit_wrong)?,
            hit_junk: count("hitJunk", e.hit_junk)?,
            expire_good: count("expireGood", e.expire_good)?,
        })
    }
}

impl TryFrom<&PredictionEvent> for PendingPrediction {
    type Error = InvalidEventError;

    #[expect(clippy::cast_possible_truncation)]
    fn try_from(e: &PredictionEvent) -> Result<Self, Self::Error> {
        let t_sec = e
            .t_sec
            .ok_or(InvalidEventError::MissingField { field: "tSec" })?;
        if e.features.len() != FEATURE_COUNT {
            return Err(InvalidEventError::FeatureCount {
                found: e.features.len(),
            });
        }
        let mut features = [0.0; FEATURE_COUNT];
        for (slot, value) in features.iter_mut().zip(&e.features) {
            *slot = finite("features", *value)? as f32;
        }
        Ok(PendingPrediction {
            t_sec: seconds("tSec", t_sec)?,
            features: FeatureVector::new(features),
            context: SampleContext {
                group_key: e.group_key.clone(),
                group_name: e.group_name.clone(),
            },
            model_outputs: ModelOutputs {
                risk01: probability("risk01", e.risk01)?,
                p_miss_next5: probability("pMissNext5", e.p_miss_next5)?,
                p_score_drop_next5: probability("pScoreDropNext5", e.p_score_drop_next5)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_parsing() {
        let lines = [
            r#"{"kind":"session_start","sessionId":"a1","seed":"42","gameTag":"groups"}"#,
            r#"{"kind":"snapshot","tSec":3,"score":120,"miss":1,"acc":80.4}"#,
            r#"{"kind":"state","nowSec":4.5,"state":{"score":7}}"#,
        ];
        let events: Vec<CollectorEvent> = lines
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        let CollectorEvent::SessionStart(info) = &events[0] else {
            panic!("unexpected event: {:?}", events[0]);
        };
        assert_eq!(info.key(), "a1|42|groups");
        let CollectorEvent::Snapshot(snap) = &events[1] else {
            panic!("unexpected event: {:?}", events[1]);
        };
        let snap = Snapshot::try_from(snap).unwrap();
        assert_eq!((snap.t_sec, snap.score, snap.miss, snap.acc), (3, 120, 1, 80));
        assert!(matches!(&events[2], CollectorEvent::State(s) if s.state.score == 7));
    }

    #[test]
    fn test_snapshot_validation() {
        let missing = SnapshotEvent::default();
        assert_eq!(
            Snapshot::try_from(&missing),
            Err(InvalidEventError::MissingField { field: "tSec" })
        );
        let negative = SnapshotEvent {
            t_sec: Some(-1.0),
            ..SnapshotEvent::default()
        };
        assert!(matches!(
            Snapshot::try_from(&negative),
            Err(InvalidEventError::Negative { field: "tSec", .. })
        ));
        let nan = SnapshotEvent {
            t_sec: Some(1.0),
            score: f64::NAN,
            ..SnapshotEvent::default()
        };
        assert_eq!(
            Snapshot::try_from(&nan),
            Err(InvalidEventError::NonFinite { field: "score" })
        );
    }

    #[test]
    fn test_prediction_validation() {
        let short = PredictionEvent {
            t_sec: Some(2.0),
            features: vec![0.5; 31],
            ..PredictionEvent::default()
        };
        assert_eq!(
            PendingPrediction::try_from(&short),
            Err(InvalidEventError::FeatureCount { found: 31 })
        );
        let ok = PredictionEvent {
            t_sec: Some(2.9),
            features: vec![2.0; FEATURE_COUNT],
            p_miss_next5: Some(1.3),
            ..PredictionEvent::default()
        };
        let p = PendingPrediction::try_from(&ok).unwrap();
        assert_eq!(p.t_sec, 2);
        assert_eq!(p.features[0], 1.0);
        assert_eq!(p.model_outputs.p_miss_next5, Some(1.0));
        assert_eq!(p.model_outputs.risk01, None);
    }
}
