//! CNN Hashing Network
//!
//! A compact convolutional feature extractor topped with a `num_bits` hash layer.
//! Outputs are squashed by `tanh`, so every embedding lies in (-1, 1) and its sign
//! is the binary hash code.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use super::FeatureExtractor;

/// Configuration for the HashNet model
#[derive(Config, Debug)]
pub struct HashNetConfig {
    /// Length of the produced hash code
    #[config(default = "48")]
    pub num_bits: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Base number of convolutional filters
    #[config(default = "32")]
    pub base_filters: usize,

    /// Number of conv blocks (each halves the spatial size)
    #[config(default = "3")]
    pub num_blocks: usize,

    /// Width of the hidden fully connected layer
    #[config(default = "256")]
    pub hidden_units: usize,

    /// Dropout rate before the hash layer
    #[config(default = "0.3")]
    pub dropout_rate: f64,
}

impl HashNetConfig {
    /// Initialize a new HashNet on the given device
    pub fn init<B: Backend>(&self, device: &B::Device) -> HashNet<B> {
        HashNet::new(self, device)
    }
}

/// Conv2d, BatchNorm, ReLU and a 2x2 max pool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B, 2>,
    pub relu: Relu,
    pub pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        Self {
            conv,
            bn: BatchNormConfig::new(out_channels).init(device),
            relu: Relu::new(),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Convolutional hashing network
///
/// Architecture:
/// - `num_blocks` conv blocks, doubling filters after each
/// - Global average pooling
/// - Hidden fully connected layer with dropout
/// - Hash layer with `tanh` activation
#[derive(Module, Debug)]
pub struct HashNet<B: Backend> {
    pub blocks: Vec<ConvBlock<B>>,
    pub global_pool: AdaptiveAvgPool2d,
    pub fc: Linear<B>,
    pub dropout: Dropout,
    pub hash: Linear<B>,
    num_bits: usize,
}

impl<B: Backend> HashNet<B> {
    pub fn new(config: &HashNetConfig, device: &B::Device) -> Self {
        let mut blocks = Vec::with_capacity(config.num_blocks);
        let mut channels = config.in_channels;
        let mut filters = config.base_filters;

        for _ in 0..config.num_blocks {
            blocks.push(ConvBlock::new(channels, filters, device));
            channels = filters;
            filters *= 2;
        }

        Self {
            blocks,
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc: LinearConfig::new(channels, config.hidden_units).init(device),
            dropout: DropoutConfig::new(config.dropout_rate).init(),
            hash: LinearConfig::new(config.hidden_units, config.num_bits).init(device),
            num_bits: config.num_bits,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, channels, height, width]
    ///
    /// # Returns
    /// * Embeddings of shape [batch_size, num_bits], each entry in (-1, 1)
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = x;
        for block in &self.blocks {
            x = block.forward(x);
        }

        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);

        self.hash.forward(x).tanh()
    }
}

impl<B: Backend> FeatureExtractor<B> for HashNet<B> {
    fn embed(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(images)
    }

    fn num_bits(&self) -> usize {
        self.num_bits
    }
}
