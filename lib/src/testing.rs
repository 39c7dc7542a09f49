use anyhow::{bail, ensure, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use photo_identify_core::{Classifier, ImageTensor, Label, Preprocessing};
use std::{io::Cursor, sync::Arc, time::Duration};
use tokio::sync::Notify;

use crate::runner::{Health, Runner};

pub enum StubConfig {
	Succeed,
	FailSetup,
	FailPredict,
	/// Stays in setup until the notify fires.
	SlowSetup(Arc<Notify>),
}

/// A classifier that always sees a cat.
pub struct Stub {
	fail_predict: bool,
}

impl Stub {
	pub const INPUT: Preprocessing = Preprocessing {
		width: 8,
		height: 8,
		filter: image::imageops::FilterType::Nearest,
		normalization: photo_identify_core::Normalization::Torch,
	};

	pub fn labels() -> Vec<Label> {
		vec![
			Label::new("tabby", 0.82),
			Label::new("tiger cat", 0.1),
			Label::new("Egyptian cat", 0.05),
			Label::new("lynx", 0.02),
			Label::new("Persian cat", 0.01),
			Label::new("Siamese cat", 0.0),
		]
	}
}

impl Classifier for Stub {
	type Config = StubConfig;

	async fn setup(config: Self::Config) -> Result<Self> {
		match config {
			StubConfig::Succeed => Ok(Self { fail_predict: false }),
			StubConfig::FailPredict => Ok(Self { fail_predict: true }),
			StubConfig::FailSetup => bail!("weights not found"),
			StubConfig::SlowSetup(loaded) => {
				loaded.notified().await;
				Ok(Self { fail_predict: false })
			},
		}
	}

	fn preprocessing(&self) -> Preprocessing {
		Self::INPUT
	}

	fn predict(&self, input: &ImageTensor, top_k: usize) -> Result<Vec<Label>> {
		ensure!(input.shape() == Self::INPUT.shape(), "unexpected input shape");

		if self.fail_predict {
			bail!("CUDA out of memory");
		}

		Ok(Self::labels().into_iter().take(top_k).collect())
	}
}

pub fn solid(width: u32, height: u32) -> DynamicImage {
	DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([120, 80, 40])))
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
	let mut bytes = Vec::new();
	solid(width, height)
		.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
		.unwrap();

	bytes
}

/// Wait for the runner to finish loading its model.
pub async fn ready(runner: &Runner) {
	for _ in 0..500 {
		if !matches!(runner.health(), Health::Starting) {
			return;
		}

		tokio::time::sleep(Duration::from_millis(10)).await;
	}

	panic!("runner did not finish setup");
}
