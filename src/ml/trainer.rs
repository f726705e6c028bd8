// ============================================================
// Layer 5 - Estimator Training Loop
// ============================================================
// Full-batch gradient descent with Adam on the Lasso objective:
//
//   loss = ½·mean((x·w + b - y)²) + alpha·Σ|w|
//
// Training runs on Autodiff<NdArray>; once the epochs are done
// model.valid() strips the autodiff wrapper and the plain NdArray
// module is what the pipeline keeps and the store persists.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::domain::error::FitError;
use crate::ml::model::{device, InferBackend, LinearRegressor, TrainBackend};

const LOG_EVERY: usize = 250;

/// Optimiser settings for one fit.
#[derive(Debug, Clone, Copy)]
pub struct FitSchedule {
    pub alpha:         f64,
    pub epochs:        usize,
    pub learning_rate: f64,
}

/// Fit a fresh regressor on a row-major `rows x cols` matrix.
pub fn fit_regressor(
    x:        &[f32],
    rows:     usize,
    cols:     usize,
    y:        &[f64],
    schedule: FitSchedule,
) -> Result<LinearRegressor<InferBackend>, FitError> {
    if rows == 0 || cols == 0 {
        return Err(FitError::EmptyTrainingSet);
    }
    if y.len() != rows {
        return Err(FitError::LengthMismatch { rows, targets: y.len() });
    }

    let device  = device();
    let inputs  = Tensor::<TrainBackend, 2>::from_data(TensorData::new(x.to_vec(), [rows, cols]), &device);
    let y32: Vec<f32> = y.iter().map(|&v| v as f32).collect();
    let targets = Tensor::<TrainBackend, 1>::from_data(TensorData::new(y32, [rows]), &device);

    let mut model: LinearRegressor<TrainBackend> = LinearRegressor::new(cols, &device);
    let mut optim = AdamConfig::new().init();
    let mse = MseLoss::new();

    for epoch in 1..=schedule.epochs {
        let preds = model.forward(inputs.clone());
        let loss = mse
            .forward(preds, targets.clone(), Reduction::Mean)
            .mul_scalar(0.5)
            + model.l1_norm().mul_scalar(schedule.alpha);

        let loss_value = scalar(loss.clone())?;
        if !loss_value.is_finite() {
            return Err(FitError::Diverged { epoch });
        }
        if epoch == 1 || epoch % LOG_EVERY == 0 || epoch == schedule.epochs {
            tracing::debug!("epoch {:>5}/{}  loss={:.6}", epoch, schedule.epochs, loss_value);
        }

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(schedule.learning_rate, model, grads);
    }

    Ok(model.valid())
}

/// Predict one value per row of a row-major `rows x cols` matrix.
pub fn predict_rows(
    model: &LinearRegressor<InferBackend>,
    x:     &[f32],
    rows:  usize,
    cols:  usize,
) -> Result<Vec<f64>, String> {
    if rows == 0 {
        return Ok(Vec::new());
    }
    let inputs = Tensor::<InferBackend, 2>::from_data(TensorData::new(x.to_vec(), [rows, cols]), &device());
    let out = model
        .forward(inputs)
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| format!("{e:?}"))?;
    Ok(out.into_iter().map(f64::from).collect())
}

fn scalar<B: Backend>(t: Tensor<B, 1>) -> Result<f32, FitError> {
    t.into_data()
        .to_vec::<f32>()
        .map_err(|e| FitError::Tensor(format!("{e:?}")))?
        .first()
        .copied()
        .ok_or_else(|| FitError::Tensor("empty loss tensor".to_string()))
}
