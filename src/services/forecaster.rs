//! LSTM forecaster
//!
//! Builds a fresh two-layer LSTM per request, fits it once over the training
//! windows and rolls it forward autoregressively:
//!
//! ```text
//! [batch, window, 1] -> LSTM(first, full sequence) -> LSTM(second, last hidden)
//!                    -> Linear(dense) -> Linear(1)
//! ```
//!
//! Training is a single epoch (by default) with no convergence check, so
//! forecasts are rough and vary from run to run.

use crate::error::{AppError, Result};
use crate::models::{ForecastConfig, ForecastPoint, PriceSeries};
use crate::services::preprocessor::{MinMaxScaler, Preprocessor, TrainingSet, Window};
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    module::{AutodiffModule, Module},
    nn::{
        loss::{MseLoss, Reduction},
        Linear, LinearConfig, Lstm, LstmConfig,
    },
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion, Tensor, TensorData,
    },
};
use chrono::{Days, NaiveDate};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info};

/// CPU backend with autodiff, used for training
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// CPU backend without autodiff, used for rollout
pub type InferenceBackend = NdArray<f32>;

/// Sequence regressor: a window of scaled closes in, the next scaled close out
#[derive(Module, Debug)]
pub struct PriceLstm<B: Backend> {
    encoder: Lstm<B>,
    summarizer: Lstm<B>,
    reduce: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> PriceLstm<B> {
    pub fn new(config: &ForecastConfig, device: &B::Device) -> Self {
        Self {
            encoder: LstmConfig::new(1, config.first_lstm_units, true).init(device),
            summarizer: LstmConfig::new(config.first_lstm_units, config.second_lstm_units, true)
                .init(device),
            reduce: LinearConfig::new(config.second_lstm_units, config.dense_units).init(device),
            output: LinearConfig::new(config.dense_units, 1).init(device),
        }
    }

    /// `[batch, window, 1]` -> `[batch, 1]`
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        let (sequence, _) = self.encoder.forward(input, None);
        let (_, state) = self.summarizer.forward(sequence, None);
        let x = self.reduce.forward(state.hidden);
        self.output.forward(x)
    }

    /// Predict the value following one window
    pub fn predict_next(&self, window: &[f64], device: &B::Device) -> f64 {
        let input = sequence_to_tensor::<B>(window, device);
        self.forward(input).into_scalar().elem::<f64>()
    }
}

/// Summary of one training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub epochs: usize,
    pub batches: usize,
    pub samples: usize,
    /// Mean MSE over all batches (scaled units)
    pub mean_loss: f64,
}

fn sequence_to_tensor<B: Backend>(values: &[f64], device: &B::Device) -> Tensor<B, 3> {
    let data: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    Tensor::from_data(TensorData::new(data, [1, values.len(), 1]), device)
}

fn windows_to_tensor<B: Backend>(windows: &[Window], window_length: usize, device: &B::Device) -> Tensor<B, 3> {
    let data: Vec<f32> = windows
        .iter()
        .flat_map(|w| w.inputs.iter().map(|&v| v as f32))
        .collect();
    Tensor::from_data(TensorData::new(data, [windows.len(), window_length, 1]), device)
}

fn targets_to_tensor<B: Backend>(windows: &[Window], device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = windows.iter().map(|w| w.target as f32).collect();
    Tensor::from_data(TensorData::new(data, [windows.len(), 1]), device)
}

/// Fit the model over the training windows in their original order
pub fn fit<B: AutodiffBackend>(
    model: PriceLstm<B>,
    training: &TrainingSet,
    config: &ForecastConfig,
    device: &B::Device,
) -> Result<(PriceLstm<B>, TrainingReport)> {
    if training.is_empty() {
        return Err(AppError::Model("no training windows".to_string()));
    }

    let mut model = model;
    let mut optimizer = AdamConfig::new().init::<B, PriceLstm<B>>();
    let loss_fn = MseLoss::new();

    let mut loss_sum = 0.0;
    let mut batches = 0usize;

    for epoch in 0..config.epochs {
        for batch in training.windows().chunks(config.batch_size) {
            let inputs = windows_to_tensor::<B>(batch, training.window_length(), device);
            let targets = targets_to_tensor::<B>(batch, device);

            let predictions = model.forward(inputs);
            let loss = loss_fn.forward(predictions, targets, Reduction::Mean);

            let grads = loss.backward();
            let loss_value = loss.into_scalar().elem::<f64>();
            if !loss_value.is_finite() {
                return Err(AppError::Model(format!(
                    "training diverged at epoch {} batch {}",
                    epoch + 1,
                    batches + 1
                )));
            }

            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            loss_sum += loss_value;
            batches += 1;
        }

        debug!(epoch = epoch + 1, batches, mean_loss = loss_sum / batches as f64, "Epoch finished");
    }

    let report = TrainingReport {
        epochs: config.epochs,
        batches,
        samples: training.len(),
        mean_loss: loss_sum / batches as f64,
    };

    Ok((model, report))
}

/// Autoregressive rollout: predict, record, slide the window by one
///
/// `predict` sees the current window (oldest first) and returns the next
/// scaled value. Non-finite predictions stop the rollout with an error.
pub fn rollout_with<F>(seed: &[f64], steps: usize, mut predict: F) -> Result<Vec<f64>>
where
    F: FnMut(&[f64]) -> f64,
{
    let mut window: VecDeque<f64> = seed.iter().copied().collect();
    let mut predictions = Vec::with_capacity(steps);

    for step in 0..steps {
        let prediction = predict(window.make_contiguous());
        if !prediction.is_finite() {
            return Err(AppError::Model(format!(
                "non-finite prediction at step {}",
                step + 1
            )));
        }

        predictions.push(prediction);
        window.pop_front();
        window.push_back(prediction);
    }

    Ok(predictions)
}

/// Roll a trained model forward `steps` times from `seed`
pub fn rollout<B: Backend>(
    model: &PriceLstm<B>,
    seed: &[f64],
    steps: usize,
    device: &B::Device,
) -> Result<Vec<f64>> {
    rollout_with(seed, steps, |window| model.predict_next(window, device))
}

/// Undo scaling with the original fit and date each value from tomorrow
pub fn to_forecast_points(raw: &[f64], scaler: MinMaxScaler, today: NaiveDate) -> Result<Vec<ForecastPoint>> {
    raw.iter()
        .enumerate()
        .map(|(i, &scaled)| {
            let date = today
                .checked_add_days(Days::new(i as u64 + 1))
                .ok_or_else(|| AppError::Other(format!("forecast date out of range: {} + {} days", today, i + 1)))?;
            let price = scaler.inverse_transform(scaled);
            if !price.is_finite() {
                return Err(AppError::Model(format!("non-finite price for {}", date)));
            }
            Ok(ForecastPoint { date, price })
        })
        .collect()
}

/// Per-request forecaster: preprocess, train from scratch, roll out
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: ForecastConfig,
    device: NdArrayDevice,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            device: NdArrayDevice::Cpu,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Build a new model and fit it once over `training`
    pub fn train(&self, training: &TrainingSet) -> Result<(PriceLstm<TrainingBackend>, TrainingReport)> {
        if training.window_length() != self.config.window_length {
            return Err(AppError::Model(format!(
                "training windows have length {}, model expects {}",
                training.window_length(),
                self.config.window_length
            )));
        }

        let model = PriceLstm::<TrainingBackend>::new(&self.config, &self.device);
        fit(model, training, &self.config, &self.device)
    }

    /// Full forecast for one series; `today` anchors the forecast dates
    pub fn forecast(&self, series: &PriceSeries, today: NaiveDate) -> Result<Vec<ForecastPoint>> {
        let started = Instant::now();
        let preprocessor = Preprocessor::new(self.config.window_length);
        let (scaled, training) = preprocessor.prepare(series)?;

        let (model, report) = self.train(&training)?;
        info!(
            ticker = series.ticker(),
            samples = report.samples,
            batches = report.batches,
            mean_loss = report.mean_loss,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model trained"
        );

        let model = model.valid();
        let seed = scaled.tail(self.config.window_length);
        let raw = rollout::<InferenceBackend>(&model, seed, self.config.horizon, &self.device)?;

        let points = to_forecast_points(&raw, scaled.scaler(), today)?;
        info!(
            ticker = series.ticker(),
            points = points.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Forecast complete"
        );

        Ok(points)
    }
}
