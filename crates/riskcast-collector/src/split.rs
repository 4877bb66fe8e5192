//! Deterministic train/validation/test assignment.
//!
//! The session key is hashed with 32-bit FNV-1a, scaled to `u = hash / 2^32`, and
//! compared against the cumulative proportions. The same key and proportions always
//! produce the same split, so every row of a session lands in the same partition.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Dataset partition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    #[display("train")]
    Train,
    #[display("val")]
    Val,
    #[display("test")]
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown split `{name}` (expected train, val or test)")]
pub struct UnknownSplitError {
    pub name: String,
}

impl FromStr for Split {
    type Err = UnknownSplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "train" => Ok(Split::Train),
            "val" => Ok(Split::Val),
            "test" => Ok(Split::Test),
            other => Err(UnknownSplitError {
                name: other.to_owned(),
            }),
        }
    }
}

/// 32-bit FNV-1a over the UTF-8 bytes of `key`.
///
/// # Examples
///
/// ```
/// use riskcast_collector::split::fnv1a32;
///
/// assert_eq!(fnv1a32(""), 0x811c_9dc5);
/// assert_eq!(fnv1a32("a"), 0xe40c_292c);
/// ```
#[must_use]
pub fn fnv1a32(key: &str) -> u32 {
    const OFFSET_BASIS: u32 = 2_166_136_261;
    const PRIME: u32 = 16_777_619;
    key.bytes()
        .fold(OFFSET_BASIS, |h, b| (h ^ u32::from(b)).wrapping_mul(PRIME))
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid split proportions `{input}`: `{part}` is not a number")]
pub struct SplitProportionsError {
    pub input: String,
    pub part: String,
}

/// Normalized train/val/test proportions.
///
/// Parsed from `"train,val,test"`. Missing or zero parts take their default
/// (0.8, 0.1, 0.1). Train is clamped to \[0.05, 0.95\], val and test to
/// \[0.02, 0.30\], then all three are scaled to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SplitProportions {
    train: f64,
    val: f64,
    test: f64,
}

impl Default for SplitProportions {
    fn default() -> Self {
        Self::new(0.8, 0.1, 0.1)
    }
}

impl SplitProportions {
    /// Clamps and normalizes the given proportions.
    #[must_use]
    pub fn new(train: f64, val: f64, test: f64) -> Self {
        let fix = |x: f64, default: f64, lo: f64, hi: f64| {
            let x = if x.is_finite() && x != 0.0 { x } else { default };
            x.clamp(lo, hi)
        };
        let train = fix(train, 0.8, 0.05, 0.95);
        let val = fix(val, 0.1, 0.02, 0.30);
        let test = fix(test, 0.1, 0.02, 0.30);
        let sum = train + val + test;
        Self {
            train: train / sum,
            val: val / sum,
            test: test / sum,
        }
    }

    #[must_use]
    pub fn train(&self) -> f64 {
        self.train
    }

    #[must_use]
    pub fn val(&self) -> f64 {
        self.val
    }

    #[must_use]
    pub fn test(&self) -> f64 {
        self.test
    }
}

impl FromStr for SplitProportions {
    type Err = SplitProportionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = [0.0; 3];
        for (slot, part) in parts.iter_mut().zip(s.split(',')) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            *slot = part.parse().map_err(|_| SplitProportionsError {
                input: s.to_owned(),
                part: part.to_owned(),
            })?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl TryFrom<String> for SplitProportions {
    type Error = SplitProportionsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SplitProportions> for String {
    fn from(value: SplitProportions) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SplitProportions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.train, self.val, self.test)
    }
}

/// Maps session keys to splits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SplitAssigner {
    proportions: SplitProportions,
}

impl SplitAssigner {
    #[must_use]
    pub fn new(proportions: SplitProportions) -> Self {
        Self { proportions }
    }

    #[must_use]
    pub fn proportions(&self) -> SplitProportions {
        self.proportions
    }

    /// Assigns `key` to a split.
    ///
    /// # Examples
    ///
    /// ```
    /// use riskcast_collector::split::SplitAssigner;
    ///
    /// let assigner = SplitAssigner::default();
    /// let key = "session-42|1234|groups";
    /// assert_eq!(assigner.assign(key), assigner.assign(key));
    /// ```
    #[must_use]
    pub fn assign(&self, key: &str) -> Split {
        let u = f64::from(fnv1a32(key)) / 4_294_967_296.0;
        let p = self.proportions;
        if u < p.train {
            Split::Train
        } else if u < p.train + p.val {
            Split::Val
        } else {
            Split::Test
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod proportions {
        use super::*;

        #[test]
        fn test_default_string() {
            let p: SplitProportions = "0.8,0.1,0.1".parse().unwrap();
            assert_eq!(p, SplitProportions::default());
            assert!((p.train() + p.val() + p.test() - 1.0).abs() < 1e-12);
        }

        #[test]
        fn test_clamped_then_normalized() {
            let p: SplitProportions = "1.0,0.5,0.01".parse().unwrap();
            // 0.95, 0.30, 0.02 before normalization
            let sum = 0.95 + 0.30 + 0.02;
            assert!((p.train() - 0.95 / sum).abs() < 1e-12);
            assert!((p.val() - 0.30 / sum).abs() < 1e-12);
            assert!((p.test() - 0.02 / sum).abs() < 1e-12);
        }

        #[test]
        fn test_missing_parts_use_defaults() {
            let p: SplitProportions = "0.7".parse().unwrap();
            assert_eq!(p, SplitProportions::new(0.7, 0.1, 0.1));
        }

        #[test]
        fn test_non_numeric_is_rejected() {
            let err = "0.8,x,0.1".parse::<SplitProportions>().unwrap_err();
            assert_eq!(err.part, "x");
        }

        #[test]
        fn test_serde_as_string() {
            let json = serde_json::to_string(&SplitProportions::default()).unwrap();
            assert!(json.starts_with('"'));
            let back: SplitProportions = serde_json::from_str(&json).unwrap();
            assert!((back.train() - 0.8).abs() < 1e-12);
        }
    }

    mod assigner {
        use super::*;

        #[test]
        fn test_fnv_known_vectors() {
            assert_eq!(fnv1a32("foobar"), 0xbf9c_f968);
        }

        #[test]
        #[expect(clippy::cast_precision_loss)]
        fn test_proportions_converge() {
            let assigner = SplitAssigner::default();
            let n = 20_000;
            let mut counts = [0usize; 3];
            for i in 0..n {
                let split = assigner.assign(&format!("session-{i}|{}|groups", i * 7919));
                counts[split as usize] += 1;
            }
            let frac = |c: usize| c as f64 / f64::from(n);
            assert!((frac(counts[0]) - 0.8).abs() < 0.02, "{counts:?}");
            assert!((frac(counts[1]) - 0.1).abs() < 0.02, "{counts:?}");
            assert!((frac(counts[2]) - 0.1).abs() < 0.02, "{counts:?}");
        }

        #[test]
        fn test_split_name_round_trip() {
            for split in Split::ALL {
                assert_eq!(split.to_string().parse::<Split>().unwrap(), split);
            }
            assert!("training".parse::<Split>().is_err());
        }
    }
}
