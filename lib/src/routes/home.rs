use aide::axum::ApiRouter;
use axum::{
	extract::{multipart::MultipartRejection, Multipart},
	http::StatusCode,
	response::Html,
	routing::get,
	Extension,
};

use crate::{errors::HTTPError, form::ImageUploadForm, runner::Runner, templates::Home};

pub fn handler() -> ApiRouter {
	ApiRouter::new().route("/", get(show).post(submit))
}

#[allow(clippy::unused_async)]
async fn show() -> Result<(StatusCode, Html<String>), HTTPError> {
	Home::default().respond(StatusCode::OK)
}

async fn submit(
	Extension(runner): Extension<Runner>,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Html<String>), HTTPError> {
	let form = match multipart {
		Ok(multipart) => ImageUploadForm::from_multipart(multipart).await,
		Err(rejection) => ImageUploadForm::rejected(&rejection),
	};

	let upload = match form.validate() {
		Ok(upload) => upload,
		Err(error) => {
			tracing::debug!("Rejected upload: {error}");

			return Home {
				errors: vec![error.to_string()],
				..Home::default()
			}
			.respond(StatusCode::OK);
		},
	};

	tracing::debug!("Classifying upload {:?}", upload.file_name);
	let img_data = Some(upload.to_dataurl());

	match runner.classify(upload.image).await {
		Ok(classification) => Home {
			prediction: classification.labels.iter().map(ToString::to_string).collect(),
			img_data,
			..Home::default()
		}
		.respond(StatusCode::OK),
		Err(error) => {
			tracing::error!("Failed to classify upload: {error}");

			Home {
				errors: vec![error.to_string()],
				img_data,
				..Home::default()
			}
			.respond(error.status_code())
		},
	}
}
