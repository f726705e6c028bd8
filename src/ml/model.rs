use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
};

/// CPU backend with gradients, used while fitting.
pub type TrainBackend = Autodiff<NdArray>;
/// Same backend without the autodiff graph, used for prediction and storage.
pub type InferBackend = NdArray;

pub fn device() -> NdArrayDevice {
    NdArrayDevice::default()
}

/// Linear estimator: `y = x·w + b`, one output per row.
#[derive(Module, Debug)]
pub struct LinearRegressor<B: Backend> {
    pub linear: Linear<B>,
}

impl<B: Backend> LinearRegressor<B> {
    /// Zero-initialised weights and bias. No random draw is involved,
    /// so two fits on the same data follow the same trajectory.
    pub fn new(n_features: usize, device: &B::Device) -> Self {
        let linear = LinearConfig::new(n_features, 1)
            .with_initializer(Initializer::Zeros)
            .init(device);
        Self { linear }
    }

    /// x: [rows, n_features] → [rows]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 1> {
        let [rows, _] = x.dims();
        self.linear.forward(x).reshape([rows])
    }

    /// Sum of absolute weights. The bias is not penalised.
    pub fn l1_norm(&self) -> Tensor<B, 1> {
        self.linear.weight.val().abs().sum()
    }

    pub fn n_features(&self) -> usize {
        let [n_features, _] = self.linear.weight.val().dims();
        n_features
    }
}
