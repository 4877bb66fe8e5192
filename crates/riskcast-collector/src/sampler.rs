//! Conversion of ambient game state into snapshots and feature vectors.
//!
//! [`SnapshotSampler::sample`] is called once per tick. It stamps the state with the
//! whole number of seconds since the session started and derives the 32 features
//! described in [`feature`](crate::feature). Features 20–23 are one-tick deltas of
//! features 0–3 against the previous sample, scaled into \[-1, 1\] and mapped to
//! \[0, 1\] with `x * 0.5 + 0.5`; the first sample of a session has neutral deltas
//! (0.5).

use crate::{
    feature::{FEATURE_COUNT, FeatureVector},
    pending::SampleContext,
    snapshot::Snapshot,
    state::{Difficulty, GameState, ViewMode},
};

const MAX_MISSES: f64 = 30.0;
const MAX_COMBO: f64 = 20.0;
const MAX_SCORE: f64 = 2500.0;
const MAX_PRESSURE: f64 = 3.0;
const MAX_MINI_LEFT_SEC: f64 = 12.0;
const SPAWN_REFERENCE_MS: f64 = 720.0;
const TIME_PLAN_RANGE_SEC: (f64, f64) = (5.0, 180.0);

/// Divisors that map one-tick changes of features 0–3 into \[-1, 1\].
const DELTA_SCALES: [f32; 4] = [0.30, 0.18, 0.25, 0.16];

/// Output of one sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub snapshot: Snapshot,
    pub features: FeatureVector,
    pub context: SampleContext,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotSampler {
    session_start_sec: f64,
    previous: Option<FeatureVector>,
}

fn unit(value: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, max) / max
    } else {
        0.0
    }
}

#[expect(clippy::cast_precision_loss)]
fn ratio(num: i64, den: i64) -> f64 {
    (num as f64 / den.max(1) as f64).clamp(0.0, 1.0)
}

fn flag(on: bool) -> f64 {
    if on { 1.0 } else { 0.0 }
}

impl SnapshotSampler {
    #[must_use]
    pub fn new(session_start_sec: f64) -> Self {
        Self {
            session_start_sec,
            previous: None,
        }
    }

    /// Starts a new session; the next sample has neutral deltas.
    pub fn reset(&mut self, session_start_sec: f64) {
        self.session_start_sec = session_start_sec;
        self.previous = None;
    }

    /// Whole seconds since session start, `floor(max(0, now - start))`.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn session_sec(&self, now_sec: f64) -> u32 {
        let elapsed = now_sec - self.session_start_sec;
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }
        elapsed.floor().min(f64::from(u32::MAX)) as u32
    }

    /// Samples `state` at clock reading `now_sec`.
    pub fn sample(&mut self, state: &GameState, now_sec: f64) -> Sample {
        let t_sec = self.session_sec(now_sec);
        let features = build_features(state, self.previous.as_ref());
        self.previous = Some(features);
        Sample {
            snapshot: snapshot_of(state, t_sec),
            features,
            context: SampleContext {
                group_key: state.group_key.clone(),
                group_name: state.group_name.clone(),
            },
        }
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn snapshot_of(state: &GameState, t_sec: u32) -> Snapshot {
    let secs = |v: f64| {
        if v.is_finite() {
            v.clamp(0.0, f64::from(u32::MAX)) as u32
        } else {
            0
        }
    };
    Snapshot {
        t_sec,
        left: secs(state.left_sec),
        score: state.score,
        combo: state.combo,
        miss: state.misses,
        acc: (unit(state.accuracy_pct, 100.0) * 100.0).round() as u8,
        pressure: (unit(state.pressure, MAX_PRESSURE) * MAX_PRESSURE).round() as u8,
        mini_on: state.mini_on,
        mini_left: secs(state.mini_left_sec),
        storm: state.storm,
        hit_good: state.hit_good,
        hit_wrong: state.hit_wrong,
        hit_junk: state.hit_junk,
        expire_good: state.expire_good,
    }
}

/// Computes the feature vector for `state`.
///
/// `previous` is the vector of the preceding tick, used for the delta features.
#[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#[must_use]
pub fn build_features(state: &GameState, previous: Option<&FeatureVector>) -> FeatureVector {
    let mut x = [0.0_f64; FEATURE_COUNT];

    x[0] = unit(state.accuracy_pct, 100.0);
    x[1] = unit(state.misses as f64, MAX_MISSES);
    x[2] = unit(state.combo as f64, MAX_COMBO);
    x[3] = unit(state.score as f64, MAX_SCORE);
    x[4] = unit(state.pressure, MAX_PRESSURE);
    x[5] = flag(state.storm);
    x[6] = flag(state.mini_on);
    if state.mini_on && state.mini_need > 0 {
        x[7] = ratio(state.mini_need.saturating_sub(state.mini_now), state.mini_need);
    }
    x[8] = unit(state.mini_left_sec, MAX_MINI_LEFT_SEC);

    let spawn_ms = f64::from(state.difficulty.spawn_interval_ms());
    x[9] = ((SPAWN_REFERENCE_MS - spawn_ms) / SPAWN_REFERENCE_MS).clamp(0.0, 1.0);
    let (lo, hi) = TIME_PLAN_RANGE_SEC;
    let time_plan = if state.time_plan_sec.is_finite() {
        state.time_plan_sec.clamp(lo, hi)
    } else {
        90.0
    };
    x[10] = unit(state.left_sec, time_plan);

    x[11] = if state.power_charge.is_finite() && state.power_threshold.is_finite() {
        (state.power_charge / state.power_threshold.max(1.0)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    x[12] = unit(state.goal_pct, 100.0);
    x[13] = ratio(state.goal_now, state.goal_total);
    x[14] = ratio(state.mini_count_cleared, state.mini_count_total);

    if let Some(group) = state.group_index() {
        x[15 + group] = 1.0;
    }

    x[24] = flag(state.storm_urgent);
    x[25] = flag(state.clutch);
    x[26] = flag(state.view == ViewMode::Cvr);
    x[27] = flag(state.view == ViewMode::Vr);
    x[28] = flag(state.view == ViewMode::Pc);
    x[29] = flag(state.difficulty == Difficulty::Hard);
    x[30] = flag(state.difficulty == Difficulty::Easy);
    x[31] = 1.0;

    let mut values = x.map(|v| v as f32);
    for (i, scale) in DELTA_SCALES.iter().enumerate() {
        let delta = previous.map_or(0.0, |prev| ((values[i] - prev[i]) / scale).clamp(-1.0, 1.0));
        values[20 + i] = delta * 0.5 + 0.5;
    }
    FeatureVector::new(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState {
            accuracy_pct: 80.0,
            misses: 3,
            combo: 5,
            score: 500,
            pressure: 1.5,
            left_sec: 45.0,
            group_key: "protein".to_owned(),
            difficulty: Difficulty::Hard,
            view: ViewMode::Vr,
            ..GameState::default()
        }
    }

    #[test]
    fn test_session_seconds_are_floored_and_non_negative() {
        let sampler = SnapshotSampler::new(100.0);
        assert_eq!(sampler.session_sec(99.0), 0);
        assert_eq!(sampler.session_sec(100.99), 0);
        assert_eq!(sampler.session_sec(107.2), 7);
    }

    #[test]
    fn test_feature_layout() {
        let f = build_features(&state(), None);
        assert!((f[0] - 0.8).abs() < 1e-6);
        assert!((f[1] - 0.1).abs() < 1e-6);
        assert!((f[2] - 0.25).abs() < 1e-6);
        assert!((f[3] - 0.2).abs() < 1e-6);
        assert!((f[4] - 0.5).abs() < 1e-6);
        assert!((f[9] - 160.0 / 720.0).abs() < 1e-6);
        assert!((f[10] - 0.5).abs() < 1e-6);
        assert_eq!(f[17], 1.0);
        assert_eq!(f[15] + f[16] + f[18] + f[19], 0.0);
        assert_eq!((f[26], f[27], f[28]), (0.0, 1.0, 0.0));
        assert_eq!((f[29], f[30], f[31]), (1.0, 0.0, 1.0));
        for i in 20..24 {
            assert!((f[i] - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_deltas_follow_previous_tick() {
        let mut sampler = SnapshotSampler::new(0.0);
        let first = sampler.sample(&state(), 0.0);
        let mut next = state();
        next.misses = 30; // +0.9 in f1, saturates
        next.accuracy_pct = 77.0; // -0.03 in f0
        let second = sampler.sample(&next, 1.0);
        assert_eq!(second.features[21], 1.0);
        assert!((second.features[20] - (-0.1 * 0.5 + 0.5)).abs() < 1e-5);
        assert_eq!(second.snapshot.t_sec, 1);
        assert_eq!(first.snapshot.miss, 3);

        sampler.reset(1.0);
        let after_reset = sampler.sample(&next, 1.0);
        assert!((after_reset.features[21] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_state_stays_in_range() {
        let state = GameState {
            accuracy_pct: f64::NAN,
            pressure: f64::INFINITY,
            time_plan_sec: f64::NAN,
            ..GameState::default()
        };
        let f = build_features(&state, None);
        assert!(f.iter().all(|v| (0.0..=1.0).contains(&v)));
        assert_eq!(f[0], 0.0);
    }

    #[test]
    fn test_extreme_counters_do_not_overflow() {
        let state = GameState {
            mini_on: true,
            mini_need: i64::MAX,
            mini_now: -1,
            score: i64::MIN,
            misses: i64::MAX,
            goal_now: i64::MAX,
            goal_total: i64::MIN,
            mini_count_cleared: i64::MIN,
            mini_count_total: i64::MAX,
            ..GameState::default()
        };
        let mut sampler = SnapshotSampler::new(0.0);
        let sample = sampler.sample(&state, 1.0);
        let f = sample.features;
        assert!(f.iter().all(|v| (0.0..=1.0).contains(&v)));
        assert_eq!(f[7], 1.0);
        assert_eq!(f[1], 1.0);
        assert_eq!(f[3], 0.0);
        assert_eq!(sample.snapshot.score, i64::MIN);
    }
}
