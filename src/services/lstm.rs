//! Single-layer LSTM regressor for one-step-ahead forecasting.
//!
//! The network is trained on (x_t, x_{t+1}) lag pairs of the min-max scaled
//! series with full backpropagation through time, MSE loss and Adam. All
//! randomness comes from a `StdRng` seeded per call.

use ndarray::{s, Array, Array1, Array2, Axis, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::errors::AnalyticsError;
use crate::models::{ForecastMethod, LstmConfig};

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;
const GRADIENT_CLIP_NORM: f64 = 5.0;

/// Outcome of training and predicting on one series.
#[derive(Debug, Clone, PartialEq)]
pub struct LstmFit {
    /// Next value in the original units
    pub prediction: f64,
    /// Training MSE (scaled units) before the first update
    pub initial_loss: f64,
    /// Training MSE (scaled units) at the final epoch
    pub final_loss: f64,
}

/// Train a fresh network on `values` and predict the value that follows.
///
/// A constant series has no scale to learn and returns its last value.
pub fn forecast_next(values: &[f64], config: &LstmConfig, seed: u64) -> Result<LstmFit, AnalyticsError> {
    validate_config(config)?;
    if values.len() < ForecastMethod::Lstm.min_periods() {
        return Err(AnalyticsError::InsufficientData {
            method: ForecastMethod::Lstm,
            required: ForecastMethod::Lstm.min_periods(),
            available: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AnalyticsError::InvalidParameter(
            "LSTM input contains non-finite values".to_string(),
        ));
    }

    let scaler = MinMaxScaler::fit(values);
    let last = values[values.len() - 1];
    if scaler.range == 0.0 {
        return Ok(LstmFit {
            prediction: last,
            initial_loss: 0.0,
            final_loss: 0.0,
        });
    }

    let scaled: Vec<f64> = values.iter().map(|v| scaler.transform(*v)).collect();
    let inputs = &scaled[..scaled.len() - 1];
    let targets = &scaled[1..];

    let mut rng = StdRng::seed_from_u64(seed);
    let mut network = Lstm::new(config.hidden_size, &mut rng);
    let mut optimizer = Adam::new(&network, config.learning_rate);

    let mut initial_loss = f64::NAN;
    let mut final_loss = f64::NAN;

    for epoch in 0..config.epochs {
        let (outputs, caches) = network.forward(inputs);
        let loss = mse(&outputs, targets);
        if epoch == 0 {
            initial_loss = loss;
        }
        final_loss = loss;

        let mut grads = network.backward(&caches, &outputs, targets);
        grads.clip(GRADIENT_CLIP_NORM);
        optimizer.step(&mut network, &grads);
    }

    let (outputs, _) = network.forward(&scaled);
    let scaled_prediction = outputs.last().copied().unwrap_or(scaled[scaled.len() - 1]);
    let prediction = scaler.inverse(scaled_prediction);

    debug!(
        "LSTM trained {} epochs on {} pairs: loss {:.6} -> {:.6}",
        config.epochs,
        inputs.len(),
        initial_loss,
        final_loss
    );

    if !prediction.is_finite() {
        return Err(AnalyticsError::InvalidParameter(
            "LSTM training diverged".to_string(),
        ));
    }

    Ok(LstmFit {
        prediction,
        initial_loss,
        final_loss,
    })
}

fn validate_config(config: &LstmConfig) -> Result<(), AnalyticsError> {
    if config.hidden_size == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "LSTM hidden size must be at least 1".to_string(),
        ));
    }
    if config.epochs == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "LSTM epochs must be at least 1".to_string(),
        ));
    }
    if !config.learning_rate.is_finite() || config.learning_rate <= 0.0 {
        return Err(AnalyticsError::InvalidParameter(format!(
            "LSTM learning rate must be positive, got {}",
            config.learning_rate
        )));
    }
    Ok(())
}

fn mse(outputs: &[f64], targets: &[f64]) -> f64 {
    let total: f64 = outputs
        .iter()
        .zip(targets)
        .map(|(y, t)| (y - t).powi(2))
        .sum();
    total / targets.len() as f64
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

struct MinMaxScaler {
    min: f64,
    range: f64,
}

impl MinMaxScaler {
    fn fit(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            min,
            range: max - min,
        }
    }

    fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range
    }

    fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.range + self.min
    }
}

/// Gate weights are stacked as [input, forget, output, candidate], each
/// block `hidden` rows, acting on `[x_t, h_{t-1}]`.
struct Lstm {
    hidden: usize,
    w: Array2<f64>,
    b: Array1<f64>,
    w_out: Array1<f64>,
    b_out: f64,
}

/// Activations saved during the forward pass for BPTT.
struct StepCache {
    z: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    o: Array1<f64>,
    g: Array1<f64>,
    c_prev: Array1<f64>,
    tanh_c: Array1<f64>,
    h: Array1<f64>,
}

struct Gradients {
    w: Array2<f64>,
    b: Array1<f64>,
    w_out: Array1<f64>,
    b_out: f64,
}

impl Lstm {
    fn new(hidden: usize, rng: &mut StdRng) -> Self {
        let k = 1.0 / (hidden as f64).sqrt();
        let w = Array2::from_shape_fn((4 * hidden, 1 + hidden), |_| rng.random_range(-k..k));
        let w_out = Array1::from_shape_fn(hidden, |_| rng.random_range(-k..k));

        // forget gate starts open
        let mut b = Array1::zeros(4 * hidden);
        b.slice_mut(s![hidden..2 * hidden]).fill(1.0);

        Self {
            hidden,
            w,
            b,
            w_out,
            b_out: 0.0,
        }
    }

    fn forward(&self, inputs: &[f64]) -> (Vec<f64>, Vec<StepCache>) {
        let hs = self.hidden;
        let mut h = Array1::<f64>::zeros(hs);
        let mut c = Array1::<f64>::zeros(hs);
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut caches = Vec::with_capacity(inputs.len());

        for &x in inputs {
            let mut z = Array1::<f64>::zeros(1 + hs);
            z[0] = x;
            z.slice_mut(s![1..]).assign(&h);

            let a = self.w.dot(&z) + &self.b;
            let i = a.slice(s![0..hs]).mapv(sigmoid);
            let f = a.slice(s![hs..2 * hs]).mapv(sigmoid);
            let o = a.slice(s![2 * hs..3 * hs]).mapv(sigmoid);
            let g = a.slice(s![3 * hs..4 * hs]).mapv(f64::tanh);

            let c_next = &f * &c + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            outputs.push(self.w_out.dot(&h_next) + self.b_out);
            caches.push(StepCache {
                z,
                i,
                f,
                o,
                g,
                c_prev: c,
                tanh_c,
                h: h_next.clone(),
            });

            c = c_next;
            h = h_next;
        }

        (outputs, caches)
    }

    fn backward(&self, caches: &[StepCache], outputs: &[f64], targets: &[f64]) -> Gradients {
        let hs = self.hidden;
        let steps = targets.len() as f64;
        let mut grads = Gradients {
            w: Array2::zeros(self.w.raw_dim()),
            b: Array1::zeros(self.b.len()),
            w_out: Array1::zeros(hs),
            b_out: 0.0,
        };
        let mut dh_next = Array1::<f64>::zeros(hs);
        let mut dc_next = Array1::<f64>::zeros(hs);

        for t in (0..caches.len()).rev() {
            let cache = &caches[t];
            let dy = 2.0 * (outputs[t] - targets[t]) / steps;

            grads.w_out.scaled_add(dy, &cache.h);
            grads.b_out += dy;

            let dh = &self.w_out * dy + &dh_next;
            let dc = &dh * &cache.o * &cache.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;

            let da_i = &dc * &cache.g * &cache.i.mapv(|v| v * (1.0 - v));
            let da_f = &dc * &cache.c_prev * &cache.f.mapv(|v| v * (1.0 - v));
            let da_o = &dh * &cache.tanh_c * &cache.o.mapv(|v| v * (1.0 - v));
            let da_g = &dc * &cache.i * &cache.g.mapv(|v| 1.0 - v * v);

            let mut da = Array1::<f64>::zeros(4 * hs);
            da.slice_mut(s![0..hs]).assign(&da_i);
            da.slice_mut(s![hs..2 * hs]).assign(&da_f);
            da.slice_mut(s![2 * hs..3 * hs]).assign(&da_o);
            da.slice_mut(s![3 * hs..4 * hs]).assign(&da_g);

            let outer = da
                .view()
                .insert_axis(Axis(1))
                .dot(&cache.z.view().insert_axis(Axis(0)));
            grads.w += &outer;
            grads.b += &da;

            let dz = self.w.t().dot(&da);
            dh_next = dz.slice(s![1..]).to_owned();
            dc_next = &dc * &cache.f;
        }

        grads
    }
}

impl Gradients {
    fn clip(&mut self, max_norm: f64) {
        let norm = (self.w.iter().map(|g| g * g).sum::<f64>()
            + self.b.iter().map(|g| g * g).sum::<f64>()
            + self.w_out.iter().map(|g| g * g).sum::<f64>()
            + self.b_out * self.b_out)
            .sqrt();

        if norm > max_norm {
            let scale = max_norm / norm;
            self.w *= scale;
            self.b *= scale;
            self.w_out *= scale;
            self.b_out *= scale;
        }
    }
}

/// First and second moment estimates for every parameter.
struct Adam {
    learning_rate: f64,
    step: i32,
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
    m_out: Array1<f64>,
    v_out: Array1<f64>,
    m_b_out: f64,
    v_b_out: f64,
}

impl Adam {
    fn new(network: &Lstm, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            step: 0,
            m_w: Array2::zeros(network.w.raw_dim()),
            v_w: Array2::zeros(network.w.raw_dim()),
            m_b: Array1::zeros(network.b.len()),
            v_b: Array1::zeros(network.b.len()),
            m_out: Array1::zeros(network.w_out.len()),
            v_out: Array1::zeros(network.w_out.len()),
            m_b_out: 0.0,
            v_b_out: 0.0,
        }
    }

    fn step(&mut self, network: &mut Lstm, grads: &Gradients) {
        self.step += 1;
        let lr = self.learning_rate;
        let bias1 = 1.0 - ADAM_BETA1.powi(self.step);
        let bias2 = 1.0 - ADAM_BETA2.powi(self.step);

        adam_update(&mut network.w, &mut self.m_w, &mut self.v_w, &grads.w, lr, bias1, bias2);
        adam_update(&mut network.b, &mut self.m_b, &mut self.v_b, &grads.b, lr, bias1, bias2);
        adam_update(
            &mut network.w_out,
            &mut self.m_out,
            &mut self.v_out,
            &grads.w_out,
            lr,
            bias1,
            bias2,
        );

        self.m_b_out = ADAM_BETA1 * self.m_b_out + (1.0 - ADAM_BETA1) * grads.b_out;
        self.v_b_out = ADAM_BETA2 * self.v_b_out + (1.0 - ADAM_BETA2) * grads.b_out * grads.b_out;
        network.b_out -= lr * (self.m_b_out / bias1) / ((self.v_b_out / bias2).sqrt() + ADAM_EPSILON);
    }
}

fn adam_update<D: ndarray::Dimension>(
    param: &mut Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    lr: f64,
    bias1: f64,
    bias2: f64,
) {
    Zip::from(param)
        .and(m)
        .and(v)
        .and(grad)
        .for_each(|p, m, v, &g| {
            *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
            *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
            *p -= lr * (*m / bias1) / ((*v / bias2).sqrt() + ADAM_EPSILON);
        });
}
