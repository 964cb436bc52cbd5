//! Feed-forward network backing the classifier.
//!
//! Fixed topology: input → 128 ReLU → 64 ReLU → softmax, with inverted
//! dropout of 0.2 after each hidden layer during fitting, optimized by Adam
//! (learning rate 0.001) on categorical cross-entropy. The trainer consumes
//! this module only through `fit_epoch`, `predict_proba`, the parameter
//! snapshot pair, and serde.

use rand::rngs::StdRng;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

/// First hidden layer width.
pub const HIDDEN_1: usize = 128;
/// Second hidden layer width.
pub const HIDDEN_2: usize = 64;
/// Dropout rate applied after each hidden layer while fitting.
pub const DROPOUT: f32 = 0.2;
/// Adam learning rate.
pub const LEARNING_RATE: f32 = 0.001;
/// Mini-batch size for one fitting epoch.
pub const BATCH_SIZE: usize = 32;

const EPS_LOG: f32 = 1e-7;

/// Network parameters. Weight matrices are flat row-major: row `j` of
/// `weights1` holds the input weights of hidden unit `j`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpNetwork {
    pub model_version: i64,
    pub input_len: usize,
    pub hidden1: usize,
    pub hidden2: usize,
    pub output_len: usize,
    weights1: Vec<f32>,
    bias1: Vec<f32>,
    weights2: Vec<f32>,
    bias2: Vec<f32>,
    weights3: Vec<f32>,
    bias3: Vec<f32>,
}

/// Independent deep copy of the parameters at one point in training.
///
/// Restoring from a snapshot must not alias live parameters, since they keep
/// mutating in later epochs.
#[derive(Debug, Clone)]
pub struct ParamSnapshot {
    weights1: Vec<f32>,
    bias1: Vec<f32>,
    weights2: Vec<f32>,
    bias2: Vec<f32>,
    weights3: Vec<f32>,
    bias3: Vec<f32>,
}

/// Loss/accuracy pair for one pass over a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    pub loss: f32,
    pub accuracy: f32,
}

impl MlpNetwork {
    /// Fresh network with small random weights and zero biases.
    pub fn new(input_len: usize, output_len: usize, rng: &mut StdRng) -> Self {
        let mut init = |len: usize| -> Vec<f32> {
            (0..len).map(|_| (rng.random::<f32>() - 0.5) * 0.1).collect()
        };
        let weights1 = init(HIDDEN_1 * input_len);
        let weights2 = init(HIDDEN_2 * HIDDEN_1);
        let weights3 = init(output_len * HIDDEN_2);
        Self {
            model_version: 1,
            input_len,
            hidden1: HIDDEN_1,
            hidden2: HIDDEN_2,
            output_len,
            weights1,
            bias1: vec![0.0; HIDDEN_1],
            weights2,
            bias2: vec![0.0; HIDDEN_2],
            weights3,
            bias3: vec![0.0; output_len],
        }
    }

    /// Check parameter vector lengths against the declared topology.
    pub fn validate(&self) -> Result<(), String> {
        if self.weights1.len() != self.hidden1 * self.input_len {
            return Err("weights1 length mismatch".to_string());
        }
        if self.bias1.len() != self.hidden1 {
            return Err("bias1 length mismatch".to_string());
        }
        if self.weights2.len() != self.hidden2 * self.hidden1 {
            return Err("weights2 length mismatch".to_string());
        }
        if self.bias2.len() != self.hidden2 {
            return Err("bias2 length mismatch".to_string());
        }
        if self.weights3.len() != self.output_len * self.hidden2 {
            return Err("weights3 length mismatch".to_string());
        }
        if self.bias3.len() != self.output_len {
            return Err("bias3 length mismatch".to_string());
        }
        Ok(())
    }

    /// Class probabilities for one input (no dropout).
    ///
    /// Returns an empty vector on an input length mismatch.
    pub fn predict_proba(&self, input: &[f32]) -> Vec<f32> {
        if input.len() != self.input_len || self.output_len == 0 {
            return Vec::new();
        }
        let act1 = dense_relu(input, &self.weights1, &self.bias1, self.hidden1);
        let act2 = dense_relu(&act1, &self.weights2, &self.bias2, self.hidden2);
        let logits = dense(&act2, &self.weights3, &self.bias3, self.output_len);
        softmax(&logits)
    }

    /// Index of the most probable class.
    pub fn predict_class_index(&self, input: &[f32]) -> usize {
        let proba = self.predict_proba(input);
        let mut best = 0usize;
        let mut best_val = f32::NEG_INFINITY;
        for (idx, &p) in proba.iter().enumerate() {
            if p > best_val {
                best_val = p;
                best = idx;
            }
        }
        best
    }

    /// Deep-copy the current parameters.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            weights1: self.weights1.clone(),
            bias1: self.bias1.clone(),
            weights2: self.weights2.clone(),
            bias2: self.bias2.clone(),
            weights3: self.weights3.clone(),
            bias3: self.bias3.clone(),
        }
    }

    /// Restore parameters from a snapshot taken on this network.
    pub fn restore(&mut self, snapshot: &ParamSnapshot) {
        self.weights1.copy_from_slice(&snapshot.weights1);
        self.bias1.copy_from_slice(&snapshot.bias1);
        self.weights2.copy_from_slice(&snapshot.weights2);
        self.bias2.copy_from_slice(&snapshot.bias2);
        self.weights3.copy_from_slice(&snapshot.weights3);
        self.bias3.copy_from_slice(&snapshot.bias3);
    }
}

/// Gradient (or moment) buffers shaped like the network parameters.
#[derive(Debug, Clone)]
struct ParamBuffers {
    weights1: Vec<f32>,
    bias1: Vec<f32>,
    weights2: Vec<f32>,
    bias2: Vec<f32>,
    weights3: Vec<f32>,
    bias3: Vec<f32>,
}

impl ParamBuffers {
    fn zeros_like(net: &MlpNetwork) -> Self {
        Self {
            weights1: vec![0.0; net.weights1.len()],
            bias1: vec![0.0; net.bias1.len()],
            weights2: vec![0.0; net.weights2.len()],
            bias2: vec![0.0; net.bias2.len()],
            weights3: vec![0.0; net.weights3.len()],
            bias3: vec![0.0; net.bias3.len()],
        }
    }
}

/// Adam state over all parameter tensors. Not persisted; a fresh optimizer
/// starts every training run.
#[derive(Debug)]
pub struct AdamOptimizer {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    step_count: i32,
    first_moment: ParamBuffers,
    second_moment: ParamBuffers,
}

impl AdamOptimizer {
    pub fn new(net: &MlpNetwork) -> Self {
        Self {
            learning_rate: LEARNING_RATE,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            step_count: 0,
            first_moment: ParamBuffers::zeros_like(net),
            second_moment: ParamBuffers::zeros_like(net),
        }
    }

    /// Apply one update from summed gradients over `batch_len` samples.
    fn step(&mut self, net: &mut MlpNetwork, grads: &ParamBuffers, batch_len: usize) {
        if batch_len == 0 {
            return;
        }
        self.step_count += 1;
        let scale = 1.0 / batch_len as f32;
        let (beta1, beta2) = (self.beta1, self.beta2);
        let (learning_rate, epsilon) = (self.learning_rate, self.epsilon);
        let correction1 = 1.0 - beta1.powi(self.step_count);
        let correction2 = 1.0 - beta2.powi(self.step_count);

        let tensors: [(&mut Vec<f32>, &Vec<f32>, &mut Vec<f32>, &mut Vec<f32>); 6] = [
            (
                &mut net.weights1,
                &grads.weights1,
                &mut self.first_moment.weights1,
                &mut self.second_moment.weights1,
            ),
            (
                &mut net.bias1,
                &grads.bias1,
                &mut self.first_moment.bias1,
                &mut self.second_moment.bias1,
            ),
            (
                &mut net.weights2,
                &grads.weights2,
                &mut self.first_moment.weights2,
                &mut self.second_moment.weights2,
            ),
            (
                &mut net.bias2,
                &grads.bias2,
                &mut self.first_moment.bias2,
                &mut self.second_moment.bias2,
            ),
            (
                &mut net.weights3,
                &grads.weights3,
                &mut self.first_moment.weights3,
                &mut self.second_moment.weights3,
            ),
            (
                &mut net.bias3,
                &grads.bias3,
                &mut self.first_moment.bias3,
                &mut self.second_moment.bias3,
            ),
        ];

        for (params, grad, first, second) in tensors {
            for i in 0..params.len() {
                let g = grad[i] * scale;
                first[i] = beta1 * first[i] + (1.0 - beta1) * g;
                second[i] = beta2 * second[i] + (1.0 - beta2) * g * g;
                let m_hat = first[i] / correction1;
                let v_hat = second[i] / correction2;
                params[i] -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            }
        }
    }
}

/// Run one fitting epoch over the whole training set in shuffled
/// mini-batches, returning the epoch's mean loss and accuracy.
pub fn fit_epoch(
    net: &mut MlpNetwork,
    optimizer: &mut AdamOptimizer,
    inputs: &[Vec<f32>],
    targets: &[usize],
    rng: &mut StdRng,
) -> EpochStats {
    debug_assert_eq!(inputs.len(), targets.len());
    let n = inputs.len();
    if n == 0 {
        return EpochStats {
            loss: 0.0,
            accuracy: 0.0,
        };
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut total_loss = 0.0f32;
    let mut correct = 0usize;

    for batch in order.chunks(BATCH_SIZE) {
        let mut grads = ParamBuffers::zeros_like(net);

        for &idx in batch {
            let input = &inputs[idx];
            let target = targets[idx];
            if input.len() != net.input_len || target >= net.output_len {
                continue;
            }

            // Forward with inverted dropout after each hidden layer.
            let pre1 = dense(input, &net.weights1, &net.bias1, net.hidden1);
            let mask1 = dropout_mask(net.hidden1, rng);
            let act1: Vec<f32> = pre1
                .iter()
                .zip(&mask1)
                .map(|(&v, &m)| v.max(0.0) * m)
                .collect();

            let pre2 = dense(&act1, &net.weights2, &net.bias2, net.hidden2);
            let mask2 = dropout_mask(net.hidden2, rng);
            let act2: Vec<f32> = pre2
                .iter()
                .zip(&mask2)
                .map(|(&v, &m)| v.max(0.0) * m)
                .collect();

            let logits = dense(&act2, &net.weights3, &net.bias3, net.output_len);
            let probs = softmax(&logits);

            total_loss += -(probs[target] + EPS_LOG).ln();
            if argmax(&probs) == target {
                correct += 1;
            }

            // Backward: softmax + cross-entropy, then through each layer.
            let mut delta3 = probs;
            delta3[target] -= 1.0;

            let mut delta_act2 = vec![0.0f32; net.hidden2];
            for c in 0..net.output_len {
                grads.bias3[c] += delta3[c];
                let base = c * net.hidden2;
                for h in 0..net.hidden2 {
                    grads.weights3[base + h] += delta3[c] * act2[h];
                    delta_act2[h] += delta3[c] * net.weights3[base + h];
                }
            }

            let mut delta_act1 = vec![0.0f32; net.hidden1];
            for h in 0..net.hidden2 {
                let mut d = delta_act2[h] * mask2[h];
                if pre2[h] <= 0.0 {
                    d = 0.0;
                }
                grads.bias2[h] += d;
                let base = h * net.hidden1;
                for j in 0..net.hidden1 {
                    grads.weights2[base + j] += d * act1[j];
                    delta_act1[j] += d * net.weights2[base + j];
                }
            }

            for h in 0..net.hidden1 {
                let mut d = delta_act1[h] * mask1[h];
                if pre1[h] <= 0.0 {
                    d = 0.0;
                }
                grads.bias1[h] += d;
                let base = h * net.input_len;
                for i in 0..net.input_len {
                    grads.weights1[base + i] += d * input[i];
                }
            }
        }

        optimizer.step(net, &grads, batch.len());
    }

    EpochStats {
        loss: total_loss / n as f32,
        accuracy: correct as f32 / n as f32,
    }
}

/// Loss/accuracy over a dataset without dropout or updates.
pub fn evaluate(net: &MlpNetwork, inputs: &[Vec<f32>], targets: &[usize]) -> EpochStats {
    let n = inputs.len();
    if n == 0 {
        return EpochStats {
            loss: 0.0,
            accuracy: 0.0,
        };
    }
    let mut total_loss = 0.0f32;
    let mut correct = 0usize;
    for (input, &target) in inputs.iter().zip(targets) {
        let probs = net.predict_proba(input);
        if probs.is_empty() || target >= probs.len() {
            continue;
        }
        total_loss += -(probs[target] + EPS_LOG).ln();
        if argmax(&probs) == target {
            correct += 1;
        }
    }
    EpochStats {
        loss: total_loss / n as f32,
        accuracy: correct as f32 / n as f32,
    }
}

fn dense(input: &[f32], weights: &[f32], bias: &[f32], out_len: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; out_len];
    for (j, slot) in out.iter_mut().enumerate() {
        let mut sum = bias[j];
        let base = j * input.len();
        for (i, &x) in input.iter().enumerate() {
            sum += weights[base + i] * x;
        }
        *slot = sum;
    }
    out
}

fn dense_relu(input: &[f32], weights: &[f32], bias: &[f32], out_len: usize) -> Vec<f32> {
    let mut out = dense(input, weights, bias, out_len);
    for v in &mut out {
        *v = v.max(0.0);
    }
    out
}

fn dropout_mask(len: usize, rng: &mut StdRng) -> Vec<f32> {
    let keep_scale = 1.0 / (1.0 - DROPOUT);
    (0..len)
        .map(|_| {
            if rng.random::<f32>() > DROPOUT {
                keep_scale
            } else {
                0.0
            }
        })
        .collect()
}

/// Numerically stable softmax; a zero sum yields the uniform distribution.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut out: Vec<f32> = raw.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = out.iter().sum();
    if sum == 0.0 {
        let uniform = 1.0 / raw.len() as f32;
        for v in &mut out {
            *v = uniform;
        }
        return out;
    }
    for v in &mut out {
        *v /= sum;
    }
    out
}

fn argmax(values: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = idx;
        }
    }
    best
}
