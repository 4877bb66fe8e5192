//! Adam optimizer over the parameters of [`Mlp`].

use crate::model::{Gradients, Mlp};

pub const BETA1: f32 = 0.9;
pub const BETA2: f32 = 0.999;
pub const EPSILON: f32 = 1e-8;

/// Adam state: first and second moment estimates for every parameter tensor plus
/// the step count.
///
/// The step count advances once per [`Adam::step`], i.e. once per mini-batch.
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    t: i32,
    m: Mlp,
    v: Mlp,
}

impl Adam {
    #[must_use]
    pub fn new(lr: f32) -> Self {
        Self {
            lr,
            t: 0,
            m: Mlp::zeros(),
            v: Mlp::zeros(),
        }
    }

    #[must_use]
    pub fn learning_rate(&self) -> f32 {
        self.lr
    }

    /// Number of updates applied so far.
    #[must_use]
    pub fn steps(&self) -> i32 {
        self.t
    }

    /// Applies one bias-corrected update: `θ -= lr · m̂ / (√v̂ + ε)`.
    pub fn step(&mut self, model: &mut Mlp, grads: &Gradients) {
        self.t = self.t.saturating_add(1);
        let correction1 = 1.0 - BETA1.powi(self.t);
        let correction2 = 1.0 - BETA2.powi(self.t);

        let params = model.tensors_mut();
        let first = self.m.tensors_mut();
        let second = self.v.tensors_mut();
        let grads = grads.as_mlp().tensors();
        for (((theta, m), v), g) in params.into_iter().zip(first).zip(second).zip(grads) {
            for (((theta, m), v), g) in theta.iter_mut().zip(m).zip(v).zip(g) {
                *m = BETA1 * *m + (1.0 - BETA1) * g;
                *v = BETA2 * *v + (1.0 - BETA2) * g * g;
                let m_hat = *m / correction1;
                let v_hat = *v / correction2;
                *theta -= self.lr * m_hat / (v_hat.sqrt() + EPSILON);
            }
        }
    }
}
