use image::{imageops::FilterType, DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// ImageNet channel means, RGB, for inputs scaled to `[0, 1]`
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations, RGB, for inputs scaled to `[0, 1]`
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// ImageNet channel means, BGR, for unscaled inputs
pub const CAFFE_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot preprocess an empty image ({width}x{height})")]
	EmptyImage { width: u32, height: u32 },

	#[error("Unknown normalization `{0}`, expected `torch` or `caffe`")]
	UnknownNormalization(String),
}

/// How pixel values are mapped before they reach the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
	/// RGB, scaled to `[0, 1]`, then standardized with the ImageNet mean and std.
	#[default]
	Torch,
	/// BGR, unscaled, with the ImageNet mean subtracted.
	Caffe,
}

impl Normalization {
	/// Returns the output channel and normalized value for an RGB `channel`.
	fn apply(self, channel: usize, value: u8) -> (usize, f32) {
		let value = f32::from(value);

		match self {
			Self::Torch => (
				channel,
				(value / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
			),
			Self::Caffe => {
				let bgr = 2 - channel;
				(bgr, value - CAFFE_MEAN[bgr])
			},
		}
	}
}

impl FromStr for Normalization {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"torch" => Ok(Self::Torch),
			"caffe" => Ok(Self::Caffe),
			_ => Err(Error::UnknownNormalization(s.to_string())),
		}
	}
}

impl fmt::Display for Normalization {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Torch => "torch",
			Self::Caffe => "caffe",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessing {
	pub width: u32,
	pub height: u32,
	pub filter: FilterType,
	pub normalization: Normalization,
}

impl Default for Preprocessing {
	fn default() -> Self {
		Self {
			width: 224,
			height: 224,
			filter: FilterType::Nearest,
			normalization: Normalization::Torch,
		}
	}
}

impl Preprocessing {
	/// The `[batch, channels, height, width]` shape of the tensors this produces.
	#[must_use]
	pub const fn shape(&self) -> [usize; 4] {
		[1, 3, self.height as usize, self.width as usize]
	}

	#[must_use]
	pub const fn with_normalization(mut self, normalization: Normalization) -> Self {
		self.normalization = normalization;
		self
	}
}

/// A single image laid out as a `1 x 3 x height x width` float tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
	data: Vec<f32>,
	width: u32,
	height: u32,
}

impl ImageTensor {
	#[must_use]
	pub fn data(&self) -> &[f32] {
		&self.data
	}

	#[must_use]
	pub const fn shape(&self) -> [usize; 4] {
		[1, 3, self.height as usize, self.width as usize]
	}

	/// Whether this tensor has the shape `preprocessing` produces.
	#[must_use]
	pub fn matches(&self, preprocessing: &Preprocessing) -> bool {
		self.shape() == preprocessing.shape()
			&& self.data.len() == self.shape().iter().product::<usize>()
	}
}

/// Resize `image` to the model's input size and normalize it.
///
/// The aspect ratio is not preserved and any alpha channel is dropped.
///
/// # Errors
///
/// Returns an error if the image has no pixels.
pub fn preprocess(image: &DynamicImage, preprocessing: &Preprocessing) -> Result<ImageTensor, Error> {
	let (width, height) = image.dimensions();
	if width == 0 || height == 0 {
		return Err(Error::EmptyImage { width, height });
	}

	let Preprocessing {
		width,
		height,
		filter,
		normalization,
	} = *preprocessing;

	let rgb = image.resize_exact(width, height, filter).to_rgb8();
	let plane = width as usize * height as usize;
	let mut data = vec![0.0; 3 * plane];

	for (x, y, pixel) in rgb.enumerate_pixels() {
		let offset = y as usize * width as usize + x as usize;

		for channel in 0..3 {
			let (target, value) = normalization.apply(channel, pixel[channel]);
			data[target * plane + offset] = value;
		}
	}

	Ok(ImageTensor {
		data,
		width,
		height,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{Rgb, RgbImage, Rgba, RgbaImage};

	fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
		DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
	}

	fn assert_close(a: f32, b: f32) {
		assert!((a - b).abs() < 1e-4, "{a} != {b}");
	}

	#[test]
	fn resizes_to_the_model_input() {
		let tensor = preprocess(&solid(640, 480, [0, 0, 0]), &Preprocessing::default()).unwrap();

		assert_eq!(tensor.shape(), [1, 3, 224, 224]);
		assert_eq!(tensor.data().len(), 3 * 224 * 224);
		assert!(tensor.matches(&Preprocessing::default()));
	}

	#[test]
	fn does_not_match_a_different_input_size() {
		let preprocessing = Preprocessing {
			width: 32,
			height: 16,
			..Preprocessing::default()
		};
		let tensor = preprocess(&solid(8, 8, [0, 0, 0]), &preprocessing).unwrap();

		assert_eq!(tensor.shape(), [1, 3, 16, 32]);
		assert!(!tensor.matches(&Preprocessing::default()));
	}

	#[test]
	fn torch_normalization_standardizes_each_channel() {
		let preprocessing = Preprocessing {
			width: 2,
			height: 2,
			..Preprocessing::default()
		};
		let tensor = preprocess(&solid(4, 4, [255, 0, 51]), &preprocessing).unwrap();
		let plane = 4;

		assert_close(tensor.data()[0], (1.0 - 0.485) / 0.229);
		assert_close(tensor.data()[plane], (0.0 - 0.456) / 0.224);
		assert_close(tensor.data()[2 * plane + 3], (0.2 - 0.406) / 0.225);
	}

	#[test]
	fn caffe_normalization_swaps_to_bgr() {
		let preprocessing = Preprocessing {
			width: 1,
			height: 1,
			..Preprocessing::default()
		}
		.with_normalization(Normalization::Caffe);
		let tensor = preprocess(&solid(3, 3, [200, 100, 50]), &preprocessing).unwrap();

		assert_close(tensor.data()[0], 50.0 - 103.939);
		assert_close(tensor.data()[1], 100.0 - 116.779);
		assert_close(tensor.data()[2], 200.0 - 123.68);
	}

	#[test]
	fn alpha_is_dropped() {
		let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0])));
		let preprocessing = Preprocessing {
			width: 2,
			height: 2,
			..Preprocessing::default()
		}
		.with_normalization(Normalization::Caffe);

		let tensor = preprocess(&image, &preprocessing).unwrap();

		assert_eq!(tensor.data().len(), 12);
		assert_close(tensor.data()[0], 30.0 - 103.939);
	}

	#[test]
	fn empty_images_are_rejected() {
		let image = DynamicImage::ImageRgb8(RgbImage::new(0, 10));

		assert!(matches!(
			preprocess(&image, &Preprocessing::default()),
			Err(Error::EmptyImage { width: 0, height: 10 })
		));
	}

	#[test]
	fn normalization_parses_case_insensitively() {
		assert_eq!("Caffe".parse::<Normalization>().unwrap(), Normalization::Caffe);
		assert_eq!("torch".parse::<Normalization>().unwrap(), Normalization::Torch);
		assert!("tensorflow".parse::<Normalization>().is_err());
	}
}
