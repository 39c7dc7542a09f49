use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use jsonschema::JSONSchema;
use map_macro::hash_map;
use photo_identify_core::http::{Input, Response, Status};
use schemars::schema_for;
use serde_json::Value;
use std::{fmt::Display, sync::Arc};

use crate::{errors::ValidationErrorSet, runner::Classification};

pub type Extension = axum::Extension<InputSchema>;

/// Compiled JSON schema for the `input` of a prediction request.
#[derive(Clone)]
pub struct InputSchema(Arc<JSONSchema>);

impl InputSchema {
	/// # Errors
	///
	/// Returns an error if the generated schema does not compile.
	pub fn new() -> Result<Self> {
		let schema = serde_json::to_value(schema_for!(Input))?;
		let compiled = JSONSchema::compile(&schema)
			.map_err(|e| anyhow!("Failed to compile input schema: {e}"))?;

		Ok(Self(Arc::new(compiled)))
	}

	pub fn validate(&self, input: &Value) -> Result<(), ValidationErrorSet> {
		self.0.validate(input)?;

		Ok(())
	}

	pub fn extension(self) -> Extension {
		axum::Extension(self)
	}
}

pub trait ResponseHelpers {
	fn success(input: Value, classification: Classification, started_at: DateTime<Utc>) -> Self;
	fn failed(input: Value, error: &impl Display, started_at: DateTime<Utc>) -> Self;
}

impl ResponseHelpers for Response {
	fn success(input: Value, classification: Classification, started_at: DateTime<Utc>) -> Self {
		Self {
			input: Some(input),
			output: Some(classification.labels),
			status: Status::Succeeded,
			started_at: Some(started_at),
			completed_at: Some(Utc::now()),
			metrics: Some(hash_map! {
				"predict_time".to_string() => classification.predict_time.as_secs_f64().into()
			}),
			..Self::default()
		}
	}

	fn failed(input: Value, error: &impl Display, started_at: DateTime<Utc>) -> Self {
		Self {
			input: Some(input),
			status: Status::Failed,
			started_at: Some(started_at),
			completed_at: Some(Utc::now()),
			error: Some(error.to_string()),
			..Self::default()
		}
	}
}
