use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
	Failed,
	Succeeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Label {
	/// Human readable class name
	pub name: String,
	/// Probability between 0 and 1
	pub probability: f64,
}

impl Label {
	pub fn new(name: impl Into<String>, probability: f64) -> Self {
		Self {
			name: name.into(),
			probability,
		}
	}
}

impl fmt::Display for Label {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {:.2}%", self.name, self.probability * 100.0)
	}
}

impl From<(f64, String)> for Label {
	fn from((probability, name): (f64, String)) -> Self {
		Self { name, probability }
	}
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Input {
	/// Image to classify, as an http(s) or data URL
	pub image: Url,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Request<T = Value> {
	pub input: T,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Response<Req = Value> {
	pub input: Option<Req>,
	pub output: Option<Vec<Label>>,

	pub started_at: Option<DateTime<Utc>>,
	pub completed_at: Option<DateTime<Utc>>,

	pub status: Status,
	pub error: Option<String>,

	pub metrics: Option<HashMap<String, Value>>,
}

impl Default for Response {
	fn default() -> Self {
		Self {
			error: None,
			input: None,
			output: None,
			metrics: None,
			status: Status::Failed,
			started_at: None,
			completed_at: Utc::now().into(),
		}
	}
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HTTPValidationError {
	pub detail: Vec<ValidationError>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationError {
	pub msg: String,
	pub loc: Vec<String>,
}
