//! Fixed-width feature vectors.
//!
//! Every sample carries exactly [`FEATURE_COUNT`] features. Each slot has a declared
//! [`FeatureKind`]: a unit-interval value in \[0.0, 1.0\] or a boolean flag in {0, 1}.
//! [`FeatureVector::new`] clamps every slot into its declared range, so a vector that
//! exists is always in range.
//!
//! # Layout
//!
//! | index | name | kind |
//! |---|---|---|
//! | 0–3 | accuracy, misses, combo, score | unit |
//! | 4 | pressure | unit |
//! | 5–6 | storm, mini quest active | flag |
//! | 7–8 | mini quest gap, mini time left | unit |
//! | 9–10 | spawn speed, time left | unit |
//! | 11–14 | power, goal percent, goal progress, minis cleared | unit |
//! | 15–19 | food group one-hot | flag |
//! | 20–23 | one-tick deltas of 0–3, mapped to \[0, 1\] | unit |
//! | 24–25 | storm urgent, clutch | flag |
//! | 26–28 | view cvr / vr / pc | flag |
//! | 29–30 | difficulty hard / easy | flag |
//! | 31 | constant bias helper | flag |
//!
//! See [`sampler`](crate::sampler) for how the values are computed from game state.

use std::ops::Index;

/// Number of features in every [`FeatureVector`].
pub const FEATURE_COUNT: usize = 32;

/// Declared value range of a feature slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum FeatureKind {
    /// Continuous value in \[0.0, 1.0\].
    Unit,
    /// Boolean stored as 0.0 or 1.0.
    Flag,
}

impl FeatureKind {
    /// Forces a value into this kind's range.
    ///
    /// Non-finite values become 0. Flags round at 0.5.
    #[must_use]
    pub fn clamp(self, value: f32) -> f32 {
        if !value.is_finite() {
            return 0.0;
        }
        match self {
            FeatureKind::Unit => value.clamp(0.0, 1.0),
            FeatureKind::Flag => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Static description of one feature slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
}

const fn unit(name: &'static str) -> FeatureSpec {
    FeatureSpec {
        name,
        kind: FeatureKind::Unit,
    }
}

const fn flag(name: &'static str) -> FeatureSpec {
    FeatureSpec {
        name,
        kind: FeatureKind::Flag,
    }
}

pub const FEATURE_SPECS: [FeatureSpec; FEATURE_COUNT] = [
    unit("accuracy"),
    unit("misses"),
    unit("combo"),
    unit("score"),
    unit("pressure"),
    flag("storm"),
    flag("mini_on"),
    unit("mini_gap"),
    unit("mini_time_left"),
    unit("spawn_speed"),
    unit("time_left"),
    unit("power"),
    unit("goal_pct"),
    unit("goal_progress"),
    unit("minis_cleared"),
    flag("group_fruit"),
    flag("group_veg"),
    flag("group_protein"),
    flag("group_grain"),
    flag("group_dairy"),
    unit("delta_accuracy"),
    unit("delta_misses"),
    unit("delta_combo"),
    unit("delta_score"),
    flag("storm_urgent"),
    flag("clutch"),
    flag("view_cvr"),
    flag("view_vr"),
    flag("view_pc"),
    flag("diff_hard"),
    flag("diff_easy"),
    flag("bias"),
];

/// Dataset column name of feature `index` (`f0` .. `f31`).
#[must_use]
pub fn column_name(index: usize) -> String {
    format!("f{index}")
}

/// A clamped, fixed-width feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FEATURE_COUNT]);

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new([0.0; FEATURE_COUNT])
    }
}

impl FeatureVector {
    /// Creates a vector, clamping each value into its declared range.
    ///
    /// # Examples
    ///
    /// ```
    /// use riskcast_collector::feature::{FEATURE_COUNT, FeatureVector};
    ///
    /// let mut values = [0.0; FEATURE_COUNT];
    /// values[0] = 1.7; // unit slot
    /// values[5] = 0.8; // flag slot
    /// let v = FeatureVector::new(values);
    /// assert_eq!(v[0], 1.0);
    /// assert_eq!(v[5], 1.0);
    /// ```
    #[must_use]
    pub fn new(mut values: [f32; FEATURE_COUNT]) -> Self {
        for (value, spec) in values.iter_mut().zip(&FEATURE_SPECS) {
            *value = spec.kind.clamp(*value);
        }
        Self(values)
    }

    /// Builds a vector from a slice, returning `None` unless it has exactly
    /// [`FEATURE_COUNT`] elements.
    #[must_use]
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        let values: [f32; FEATURE_COUNT] = values.try_into().ok()?;
        Some(Self::new(values))
    }

    #[must_use]
    pub fn as_array(&self) -> &[f32; FEATURE_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().copied()
    }
}

impl Index<usize> for FeatureVector {
    type Output = f32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specs_match_column_count() {
        assert_eq!(FEATURE_SPECS.len(), FEATURE_COUNT);
        assert!(FEATURE_SPECS[31].kind.is_flag());
    }

    #[test]
    fn test_non_finite_values_become_zero() {
        let mut values = [0.5; FEATURE_COUNT];
        values[0] = f32::NAN;
        values[1] = f32::INFINITY;
        let v = FeatureVector::new(values);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[1], 0.0);
    }

    #[test]
    fn test_every_slot_in_declared_range() {
        let v = FeatureVector::new([-3.0; FEATURE_COUNT]);
        assert!(v.iter().all(|x| (0.0..=1.0).contains(&x)));
        let v = FeatureVector::new([0.3; FEATURE_COUNT]);
        for (x, spec) in v.iter().zip(&FEATURE_SPECS) {
            match spec.kind {
                FeatureKind::Unit => assert!((x - 0.3).abs() < f32::EPSILON),
                FeatureKind::Flag => assert_eq!(x, 0.0),
            }
        }
    }

    #[test]
    fn test_from_slice_rejects_wrong_width() {
        assert!(FeatureVector::from_slice(&[0.0; 31]).is_none());
        assert!(FeatureVector::from_slice(&[0.0; FEATURE_COUNT]).is_some());
    }
}
