//! Two-layer perceptron for binary risk prediction.
//!
//! The network maps the 32 collected features to one probability:
//!
//! ```text
//! z1 = W1·x + b1      (16)
//! h  = relu(z1)       (16)
//! z2 = W2·h + b2      (1)
//! ŷ  = sigmoid(z2)
//! ```
//!
//! Weights are `f32`. Gradients share the model's shape and are accumulated per
//! sample with [`Gradients::accumulate`], then averaged over the mini-batch with
//! [`Gradients::scale`].
//!
//! # Examples
//!
//! ```
//! use rand::SeedableRng;
//! use rand_pcg::Pcg64Mcg;
//! use riskcast_training::model::{INPUT, Mlp};
//!
//! let mut rng = Pcg64Mcg::seed_from_u64(7);
//! let model = Mlp::random(&mut rng);
//! let p = model.predict(&[0.5; INPUT]);
//! assert!((0.0..=1.0).contains(&p));
//! assert_eq!(p, model.predict(&[0.5; INPUT]));
//! ```

use rand::Rng;
use rand_distr::StandardNormal;
use riskcast_collector::feature::FEATURE_COUNT;

/// Input width.
pub const INPUT: usize = FEATURE_COUNT;
/// Hidden layer width.
pub const HIDDEN: usize = 16;

const W1_INIT_STD: f32 = 0.06;
const W2_INIT_STD: f32 = 0.08;

/// Parameter tensors of [`Mlp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Tensor {
    #[display("W1")]
    W1,
    #[display("b1")]
    B1,
    #[display("W2")]
    W2,
    #[display("b2")]
    B2,
}

impl Tensor {
    /// Parameter tensors in storage order.
    pub const PARAMETERS: [Self; 4] = [Self::W1, Self::B1, Self::W2, Self::B2];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mlp {
    pub w1: [[f32; INPUT]; HIDDEN],
    pub b1: [f32; HIDDEN],
    pub w2: [f32; HIDDEN],
    pub b2: f32,
}

/// Intermediate values of one forward pass, kept for backpropagation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activations {
    pub z1: [f32; HIDDEN],
    pub h: [f32; HIDDEN],
    pub z2: f32,
    pub y_hat: f32,
}

/// Numerically stable logistic function.
#[must_use]
pub fn sigmoid(z: f32) -> f32 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Mlp {
    /// Returns a model with every parameter zero.
    #[must_use]
    pub fn zeros() -> Self {
        Self {
            w1: [[0.0; INPUT]; HIDDEN],
            b1: [0.0; HIDDEN],
            w2: [0.0; HIDDEN],
            b2: 0.0,
        }
    }

    /// Initializes weights from `N(0, 0.06)` (first layer) and `N(0, 0.08)` (second
    /// layer). Biases start at zero.
    ///
    /// # Arguments
    ///
    /// * `rng` - Random number generator
    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut model = Self::zeros();
        for w in model.w1.as_flattened_mut() {
            *w = rng.sample::<f32, _>(StandardNormal) * W1_INIT_STD;
        }
        for w in &mut model.w2 {
            *w = rng.sample::<f32, _>(StandardNormal) * W2_INIT_STD;
        }
        model
    }

    /// Runs the network on `x`, keeping the intermediate values.
    #[must_use]
    pub fn forward(&self, x: &[f32; INPUT]) -> Activations {
        let mut z1 = self.b1;
        for (z, row) in z1.iter_mut().zip(&self.w1) {
            *z += row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>();
        }
        let h = z1.map(|z| z.max(0.0));
        let z2 = self.b2 + self.w2.iter().zip(&h).map(|(w, v)| w * v).sum::<f32>();
        Activations {
            z1,
            h,
            z2,
            y_hat: sigmoid(z2),
        }
    }

    /// Probability of the positive class for `x`.
    #[must_use]
    pub fn predict(&self, x: &[f32; INPUT]) -> f32 {
        self.forward(x).y_hat
    }

    /// Returns the tensor with the given name as a flat slice.
    #[must_use]
    pub fn tensor(&self, tensor: Tensor) -> &[f32] {
        match tensor {
            Tensor::W1 => self.w1.as_flattened(),
            Tensor::B1 => &self.b1,
            Tensor::W2 => &self.w2,
            Tensor::B2 => std::slice::from_ref(&self.b2),
        }
    }

    pub(crate) fn tensors_mut(&mut self) -> [&mut [f32]; 4] {
        [
            self.w1.as_flattened_mut(),
            &mut self.b1,
            &mut self.w2,
            std::slice::from_mut(&mut self.b2),
        ]
    }

    pub(crate) fn tensors(&self) -> [&[f32]; 4] {
        Tensor::PARAMETERS.map(|t| self.tensor(t))
    }

    /// Returns the first parameter tensor holding `NaN` or an infinity.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<Tensor> {
        Tensor::PARAMETERS
            .into_iter()
            .find(|t| self.tensor(*t).iter().any(|v| !v.is_finite()))
    }
}

/// Loss gradients with the same shape as [`Mlp`].
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients(Mlp);

impl Default for Gradients {
    fn default() -> Self {
        Self(Mlp::zeros())
    }
}

impl Gradients {
    /// Adds the gradient of the weighted cross-entropy for one sample.
    ///
    /// Uses `dz2 = weight · (ŷ - target)`, the sigmoid and cross-entropy derivatives
    /// combined.
    ///
    /// # Arguments
    ///
    /// * `model` - The model `act` was computed with
    /// * `x` - The input of the forward pass
    /// * `act` - Activations returned by [`Mlp::forward`]
    /// * `target` - `0.0` or `1.0`
    /// * `weight` - Sample weight
    pub fn accumulate(
        &mut self,
        model: &Mlp,
        x: &[f32; INPUT],
        act: &Activations,
        target: f32,
        weight: f32,
    ) {
        let g = &mut self.0;
        let dz2 = weight * (act.y_hat - target);
        g.b2 += dz2;
        for i in 0..HIDDEN {
            g.w2[i] += dz2 * act.h[i];
            let dz1 = if act.z1[i] > 0.0 {
                dz2 * model.w2[i]
            } else {
                0.0
            };
            g.b1[i] += dz1;
            for (gw, xj) in g.w1[i].iter_mut().zip(x) {
                *gw += dz1 * xj;
            }
        }
    }

    /// Multiplies every component by `factor`.
    pub fn scale(&mut self, factor: f32) {
        for tensor in self.0.tensors_mut() {
            for v in tensor {
                *v *= factor;
            }
        }
    }

    #[must_use]
    pub fn first_non_finite(&self) -> Option<Tensor> {
        self.0.first_non_finite()
    }

    #[must_use]
    pub fn as_mlp(&self) -> &Mlp {
        &self.0
    }
}
