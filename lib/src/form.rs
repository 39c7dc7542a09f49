use axum::{
	body::Bytes,
	extract::{multipart::MultipartRejection, Multipart},
};
use image::{DynamicImage, GenericImageView};

use crate::helpers::to_dataurl;

/// Name of the file input on the upload form.
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
	#[error("This field is required.")]
	Required,

	#[error("No file was submitted. Check the encoding type on the form.")]
	NoFile,

	#[error("The submitted file is empty.")]
	Empty,

	#[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
	InvalidImage,

	#[error("Failed to read the upload: {0}")]
	Unreadable(String),
}

#[derive(Debug)]
struct UploadedFile {
	file_name: Option<String>,
	bytes: Bytes,
}

/// The single-file upload form served on `/`.
#[derive(Debug, Default)]
pub struct ImageUploadForm {
	image: Option<UploadedFile>,
	error: Option<FormError>,
}

/// An upload that passed validation.
#[derive(Debug)]
pub struct UploadedImage {
	pub file_name: String,
	pub bytes: Bytes,
	pub image: DynamicImage,
}

impl UploadedImage {
	pub fn to_dataurl(&self) -> String {
		to_dataurl(&self.bytes)
	}
}

impl ImageUploadForm {
	/// Read the form fields out of a multipart body. Fields other than `image` are skipped.
	pub async fn from_multipart(mut multipart: Multipart) -> Self {
		let mut form = Self::default();

		loop {
			let field = match multipart.next_field().await {
				Ok(Some(field)) => field,
				Ok(None) => break,
				Err(error) => {
					form.error = Some(FormError::Unreadable(error.to_string()));
					break;
				},
			};

			if field.name() != Some(IMAGE_FIELD) {
				continue;
			}

			let file_name = field.file_name().map(ToString::to_string);
			match field.bytes().await {
				Ok(bytes) => form.image = Some(UploadedFile { file_name, bytes }),
				Err(error) => {
					form.error = Some(FormError::Unreadable(error.to_string()));
					break;
				},
			}
		}

		form
	}

	/// A form whose body could not be read as multipart at all.
	pub fn rejected(rejection: &MultipartRejection) -> Self {
		Self {
			image: None,
			error: Some(FormError::Unreadable(rejection.to_string())),
		}
	}

	/// Check that an image was uploaded and decodes.
	pub fn validate(self) -> Result<UploadedImage, FormError> {
		if let Some(error) = self.error {
			return Err(error);
		}

		let file = self.image.ok_or(FormError::Required)?;
		let file_name = file.file_name.unwrap_or_default();

		match (file_name.is_empty(), file.bytes.is_empty()) {
			// Browsers send an empty, nameless part when no file was picked.
			(true, true) => return Err(FormError::Required),
			(true, false) => return Err(FormError::NoFile),
			(false, true) => return Err(FormError::Empty),
			(false, false) => {},
		}

		let image = image::load_from_memory(&file.bytes).map_err(|error| {
			tracing::debug!("Failed to decode upload {file_name:?}: {error}");
			FormError::InvalidImage
		})?;

		if image.dimensions().0 == 0 || image.dimensions().1 == 0 {
			return Err(FormError::InvalidImage);
		}

		Ok(UploadedImage {
			file_name,
			bytes: file.bytes,
			image,
		})
	}
}
