use aide::axum::{routing::post, ApiRouter};
use axum::Extension;
use axum_jsonschema::Json;
use chrono::Utc;
use photo_identify_core::http::{Input, Request, Response};

use crate::{
	errors::HTTPError,
	input::Fetcher,
	prediction::{Extension as ExtractSchema, ResponseHelpers},
	runner::{Error as RunnerError, Runner},
};

pub fn handler() -> ApiRouter {
	ApiRouter::new().api_route("/predictions", post(create_prediction))
}

async fn create_prediction(
	Extension(runner): Extension<Runner>,
	Extension(fetcher): Extension<Fetcher>,
	Extension(schema): ExtractSchema,
	Json(req): Json<Request>,
) -> Result<Json<Response>, HTTPError> {
	schema
		.validate(&req.input)
		.map_err(|e| e.fill_loc(&["body", "input"]))?;

	let input: Input = serde_json::from_value(req.input.clone())
		.map_err(|e| HTTPError::new(&e.to_string()))?;
	tracing::debug!(
		"Received prediction request for a {} URL ({} bytes)",
		input.image.scheme(),
		input.image.as_str().len()
	);

	runner.ensure_ready()?;
	let image = fetcher.load(&input.image).await?;

	let started_at = Utc::now();
	let response = match runner.classify(image).await {
		Ok(classification) => Response::success(req.input, classification, started_at),
		Err(error @ (RunnerError::NotReady | RunnerError::SetupFailed | RunnerError::Stopped)) => {
			return Err(error.into());
		},
		Err(error) => {
			tracing::error!("Prediction failed: {error}");
			Response::failed(req.input, &error, started_at)
		},
	};

	Ok(Json(response))
}
