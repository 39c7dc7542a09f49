use anyhow::{ensure, Context, Result};
use photo_identify::{Classifier, ImageTensor, Label, Normalization, Preprocessing};
use std::path::PathBuf;
use tch::{
	nn::{ModuleT, VarStore},
	vision::{imagenet, resnet, vgg},
	Device, Kind, Tensor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Architecture {
	Vgg16,
	Resnet50,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ModelConfig {
	/// Pretrained ImageNet weights, in safetensors or libtorch format
	#[clap(long, env = "WEIGHTS_PATH", default_value = "weights/vgg16.safetensors")]
	pub weights: PathBuf,

	/// Network the weights were exported from
	#[clap(long, env = "MODEL_ARCH", value_enum, default_value_t = Architecture::Vgg16)]
	pub arch: Architecture,

	/// Pixel normalization the weights were trained with (torch or caffe)
	#[clap(long, env = "NORMALIZATION", default_value_t = Normalization::Torch)]
	pub normalization: Normalization,

	/// Stay on the CPU even when CUDA is available
	#[clap(long, env = "FORCE_CPU")]
	pub cpu: bool,
}

/// An ImageNet network loaded into libtorch.
pub struct TorchClassifier {
	model: Box<dyn ModuleT + Send>,
	device: Device,
	preprocessing: Preprocessing,
}

impl Classifier for TorchClassifier {
	type Config = ModelConfig;

	async fn setup(config: ModelConfig) -> Result<Self> {
		ensure!(
			config.weights.is_file(),
			"No weights found at {}",
			config.weights.display()
		);

		let device = if config.cpu {
			Device::Cpu
		} else {
			Device::cuda_if_available()
		};

		let mut vs = VarStore::new(device);
		let model: Box<dyn ModuleT + Send> = match config.arch {
			Architecture::Vgg16 => Box::new(vgg::vgg16(&vs.root(), imagenet::CLASS_COUNT)),
			Architecture::Resnet50 => Box::new(resnet::resnet50(&vs.root(), imagenet::CLASS_COUNT)),
		};

		vs.load(&config.weights)
			.with_context(|| format!("Failed to load weights from {}", config.weights.display()))?;

		tracing::debug!("Loaded {:?} on {device:?}", config.arch);

		Ok(Self {
			model,
			device,
			preprocessing: Preprocessing::default().with_normalization(config.normalization),
		})
	}

	fn preprocessing(&self) -> Preprocessing {
		self.preprocessing
	}

	fn predict(&self, input: &ImageTensor, top_k: usize) -> Result<Vec<Label>> {
		let top_k = i64::try_from(top_k)?.min(imagenet::CLASS_COUNT);
		let dims = dims(input.shape())?;

		let image = Tensor::from_slice(input.data())
			.view(dims)
			.to_device(self.device);
		let output = tch::no_grad(|| self.model.forward_t(&image, false)).softmax(-1, Kind::Float);

		Ok(imagenet::top(&output, top_k)
			.into_iter()
			.map(Label::from)
			.collect())
	}
}

fn dims(shape: [usize; 4]) -> Result<[i64; 4]> {
	let mut dims = [0; 4];
	for (dim, size) in dims.iter_mut().zip(shape) {
		*dim = i64::try_from(size)?;
	}

	Ok(dims)
}
