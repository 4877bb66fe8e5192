//! Portable JSON form of a trained model.
//!
//! ```text
//! {
//!   "schema": 1,
//!   "W1": [[f32; 32]; 16], "b1": [f32; 16],
//!   "W2": [f32; 16],       "b2": f32,
//!   "meta": { "trainedAtIso", "rows", "bestValAUC", "bestEpoch",
//!             "label"?, "stopReason"?, "classWeight"? }
//! }
//! ```
//!
//! `schema` is optional on import and defaults to 1. Shapes are checked when the
//! artifact is turned back into an [`Mlp`] with [`ModelArtifact::to_model`].

use std::io;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    model::{HIDDEN, INPUT, Mlp, Tensor},
    trainer::{StopReason, TrainingOutcome},
};

pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

fn default_schema() -> u32 {
    ARTIFACT_SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    #[serde(rename = "trainedAtIso")]
    pub trained_at: DateTime<Utc>,
    pub rows: usize,
    #[serde(rename = "bestValAUC")]
    pub best_val_auc: Option<f64>,
    /// 0 when no epoch improved.
    #[serde(rename = "bestEpoch")]
    pub best_epoch: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        default,
        rename = "stopReason",
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_reason: Option<StopReason>,
    #[serde(
        default,
        rename = "classWeight",
        skip_serializing_if = "Option::is_none"
    )]
    pub class_weight: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default = "default_schema")]
    pub schema: u32,
    #[serde(rename = "W1")]
    pub w1: Vec<Vec<f32>>,
    pub b1: Vec<f32>,
    #[serde(rename = "W2")]
    pub w2: Vec<f32>,
    pub b2: f32,
    pub meta: ArtifactMeta,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ArtifactError {
    #[display("unsupported artifact schema version {version}")]
    UnsupportedSchema { version: u32 },
    #[display("{tensor} has {found} values, expected {expected}")]
    Shape {
        tensor: Tensor,
        expected: usize,
        found: usize,
    },
    #[display("{tensor} contains a non-finite value")]
    NonFinite { tensor: Tensor },
    #[display("invalid artifact JSON: {_0}")]
    Json(serde_json::Error),
}

impl From<serde_json::Error> for ArtifactError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

fn check_len(tensor: Tensor, expected: usize, found: usize) -> Result<(), ArtifactError> {
    if expected == found {
        Ok(())
    } else {
        Err(ArtifactError::Shape {
            tensor,
            expected,
            found,
        })
    }
}

impl ModelArtifact {
    #[must_use]
    pub fn new(model: &Mlp, meta: ArtifactMeta) -> Self {
        Self {
            schema: ARTIFACT_SCHEMA_VERSION,
            w1: model.w1.iter().map(|row| row.to_vec()).collect(),
            b1: model.b1.to_vec(),
            w2: model.w2.to_vec(),
            b2: model.b2,
            meta,
        }
    }

    /// Packages the best model of a training run.
    #[must_use]
    pub fn from_outcome(outcome: &TrainingOutcome, label: &str, trained_at: DateTime<Utc>) -> Self {
        Self::new(
            &outcome.model,
            ArtifactMeta {
                trained_at,
                rows: outcome.rows,
                best_val_auc: outcome.best_val_auc,
                best_epoch: outcome.best_epoch.unwrap_or(0),
                label: Some(label.to_owned()),
                stop_reason: Some(outcome.stop_reason),
                class_weight: Some(outcome.class_weight),
            },
        )
    }

    /// Rebuilds the network, checking schema version, shapes and finiteness.
    pub fn to_model(&self) -> Result<Mlp, ArtifactError> {
        if self.schema != ARTIFACT_SCHEMA_VERSION {
            return Err(ArtifactError::UnsupportedSchema {
                version: self.schema,
            });
        }
        check_len(Tensor::W1, HIDDEN, self.w1.len())?;
        check_len(Tensor::B1, HIDDEN, self.b1.len())?;
        check_len(Tensor::W2, HIDDEN, self.w2.len())?;

        let mut model = Mlp::zeros();
        for (dst, src) in model.w1.iter_mut().zip(&self.w1) {
            check_len(Tensor::W1, INPUT, src.len())?;
            dst.copy_from_slice(src);
        }
        model.b1.copy_from_slice(&self.b1);
        model.w2.copy_from_slice(&self.w2);
        model.b2 = self.b2;

        if let Some(tensor) = model.first_non_finite() {
            return Err(ArtifactError::NonFinite { tensor });
        }
        Ok(model)
    }

    pub fn from_reader<R>(reader: R) -> Result<Self, ArtifactError>
    where
        R: io::Read,
    {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_writer<W>(&self, writer: W) -> Result<(), ArtifactError>
    where
        W: io::Write,
    {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
