use image::DynamicImage;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

use crate::helpers::base64_decode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unsupported URL scheme `{0}`, expected http, https or data")]
	UnsupportedScheme(String),

	#[error("Only base64 encoded data URLs are supported")]
	MalformedDataUrl,

	#[error("Failed to decode data URL: {0}")]
	Base64(#[from] base64::DecodeError),

	#[error("Failed to download image: {0}")]
	Download(#[from] reqwest::Error),

	#[error("Failed to download image: server answered {0}")]
	Status(StatusCode),

	#[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
	InvalidImage(#[from] image::ImageError),
}

/// Resolves the image URLs accepted by the JSON API into decoded images.
#[derive(Debug, Clone)]
pub struct Fetcher {
	client: Client,
}

impl Fetcher {
	/// # Errors
	///
	/// Returns an error if the HTTP client cannot be built.
	pub fn new(timeout: Duration) -> Result<Self, Error> {
		Ok(Self {
			client: Client::builder()
				.user_agent(format!("photo-identify/{}", env!("CARGO_PKG_VERSION")))
				.timeout(timeout)
				.build()?,
		})
	}

	/// Fetch the raw bytes behind `url`.
	pub async fn fetch(&self, url: &Url) -> Result<Vec<u8>, Error> {
		match url.scheme() {
			"data" => from_dataurl(url),
			"http" | "https" => {
				tracing::debug!("Downloading image from {url}");
				let response = self.client.get(url.clone()).send().await?;

				if !response.status().is_success() {
					return Err(Error::Status(response.status()));
				}

				let bytes = response.bytes().await?;
				tracing::debug!("Downloaded {} bytes from {url}", bytes.len());

				Ok(bytes.to_vec())
			},
			scheme => Err(Error::UnsupportedScheme(scheme.to_string())),
		}
	}

	pub async fn load(&self, url: &Url) -> Result<DynamicImage, Error> {
		let bytes = self.fetch(url).await?;

		Ok(image::load_from_memory(&bytes)?)
	}
}

/// Decode the payload of a base64 data URL.
pub fn from_dataurl(url: &Url) -> Result<Vec<u8>, Error> {
	let (media_type, data) = url
		.path()
		.split_once(',')
		.ok_or(Error::MalformedDataUrl)?;

	if !media_type.ends_with(";base64") {
		return Err(Error::MalformedDataUrl);
	}

	Ok(base64_decode(data)?)
}
