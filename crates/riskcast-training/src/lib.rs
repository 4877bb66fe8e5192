//! Training system for the gameplay risk classifier.
//!
//! This crate trains a small neural network on rows collected by
//! `riskcast-collector` to predict a binary label (by default `y_missNext5`) from
//! the 32 features of a sample.
//!
//! # How Training Works
//!
//! 1. **Select** - Keep rows that carry the target label
//! 2. **Split** - Shuffle with a seedable RNG and hold out a validation share
//! 3. **Weight** - Scale the loss of positive samples to counter class imbalance
//! 4. **Optimize** - Mini-batch gradient descent with Adam
//! 5. **Validate** - Weighted cross-entropy and ROC AUC after every epoch
//! 6. **Checkpoint** - Keep the weights with the best validation AUC, stop when it
//!    no longer improves
//! 7. **Export** - Write the checkpoint as a JSON [`artifact::ModelArtifact`]
//!
//! # Architecture
//!
//! ```text
//! Dataset rows (riskcast-collector)
//!     ↓ selected and shuffled by
//! Trainer
//!     ↓ optimizes (Adam)
//! Mlp 32 → 16 (ReLU) → 1 (sigmoid)
//!     ↓ scored by (riskcast-stats)
//! Validation loss / AUC
//!     ↓ decides
//! Checkpoint & early stopping
//! ```
//!
//! # Modules
//!
//! - [`model`]: Network, forward pass and gradients
//! - [`adam`]: Adam optimizer
//! - [`trainer`]: Training loop, class weighting and early stopping
//! - [`evaluate`]: Scoring dataset rows with a trained model
//! - [`importance`]: Permutation and occlusion feature importance
//! - [`artifact`]: JSON model format
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::AtomicBool;
//!
//! use riskcast_training::trainer::{TrainError, Trainer, TrainingConfig};
//!
//! let trainer = Trainer::new(&TrainingConfig {
//!     seed: Some(1),
//!     ..TrainingConfig::default()
//! });
//! let result = trainer.train(&[], &AtomicBool::new(false));
//! assert!(matches!(result, Err(TrainError::InsufficientData { rows: 0, .. })));
//! ```
//!
//! # Current Limitations
//!
//! - **Fixed architecture**: One hidden layer of 16 units over exactly 32 inputs
//! - **Single target**: Each run trains one label; the two default labels need two runs
//! - **Single-threaded**: Batches are processed sequentially

pub mod adam;
pub mod artifact;
pub mod evaluate;
pub mod importance;
pub mod model;
pub mod trainer;
