use aide::OperationOutput;
use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use jsonschema::ErrorIterator;
use serde_json::{json, Value};

use crate::{input::Error as InputError, runner::Error as RunnerError};

#[derive(Debug)]
pub struct HTTPError {
	detail: Value,
	status_code: StatusCode,
}

impl HTTPError {
	pub fn new(detail: &str) -> Self {
		Self {
			detail: detail.into(),
			status_code: StatusCode::UNPROCESSABLE_ENTITY,
		}
	}

	pub const fn with_status(mut self, status_code: StatusCode) -> Self {
		self.status_code = status_code;
		self
	}
}

impl IntoResponse for HTTPError {
	fn into_response(self) -> Response {
		(self.status_code, Json(json!({ "detail": self.detail }))).into_response()
	}
}

impl OperationOutput for HTTPError {
	type Inner = Self;
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationError {
	msg: String,
	loc: Vec<String>,
}

#[derive(Debug, Clone, thiserror::Error, serde::Serialize)]
#[error("Validation Errors")]
pub struct ValidationErrorSet {
	errors: Vec<ValidationError>,
}

impl ValidationErrorSet {
	pub fn single(msg: impl Into<String>, loc: &[&str]) -> Self {
		Self {
			errors: vec![ValidationError {
				msg: msg.into(),
				loc: loc.iter().map(ToString::to_string).collect(),
			}],
		}
	}

	/// Prefix the location of every error with `loc`.
	pub fn fill_loc(mut self, loc: &[&str]) -> Self {
		for error in &mut self.errors {
			error.loc = loc
				.iter()
				.map(ToString::to_string)
				.chain(std::mem::take(&mut error.loc))
				.collect();
		}

		self
	}
}

impl From<ErrorIterator<'_>> for ValidationErrorSet {
	fn from(e: ErrorIterator<'_>) -> Self {
		Self {
			errors: e
				.map(|e| ValidationError {
					msg: e.to_string(),
					loc: e.instance_path.into_vec(),
				})
				.collect(),
		}
	}
}

impl From<ValidationErrorSet> for HTTPError {
	fn from(e: ValidationErrorSet) -> Self {
		Self {
			status_code: StatusCode::UNPROCESSABLE_ENTITY,
			detail: serde_json::to_value(e.errors).unwrap_or_default(),
		}
	}
}

impl From<RunnerError> for HTTPError {
	fn from(e: RunnerError) -> Self {
		Self::new(&e.to_string()).with_status(e.status_code())
	}
}

impl From<InputError> for HTTPError {
	fn from(e: InputError) -> Self {
		ValidationErrorSet::single(e.to_string(), &["body", "input", "image"]).into()
	}
}

impl From<askama::Error> for HTTPError {
	fn from(e: askama::Error) -> Self {
		tracing::error!("Failed to render template: {e}");

		Self::new("Failed to render page").with_status(StatusCode::INTERNAL_SERVER_ERROR)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fill_loc_prefixes_every_error() {
		let errors = ValidationErrorSet {
			errors: vec![
				ValidationError {
					msg: "missing".to_string(),
					loc: vec![],
				},
				ValidationError {
					msg: "not a uri".to_string(),
					loc: vec!["image".to_string()],
				},
			],
		}
		.fill_loc(&["body", "input"]);

		assert_eq!(errors.errors[0].loc, vec!["body", "input"]);
		assert_eq!(errors.errors[1].loc, vec!["body", "input", "image"]);
	}

	#[tokio::test]
	async fn validation_errors_render_as_detail_list() {
		let response = HTTPError::from(ValidationErrorSet::single("bad", &["body"])).into_response();
		assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

		let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
		let body: Value = serde_json::from_slice(&body).unwrap();

		assert_eq!(body, json!({ "detail": [{ "msg": "bad", "loc": ["body"] }] }));
	}
}
