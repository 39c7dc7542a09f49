use aide::{
	axum::{
		routing::{get, post},
		ApiRouter,
	},
	openapi::OpenApi,
};
use axum::Extension;
use axum_jsonschema::Json;
use schemars::JsonSchema;

use crate::{
	runner::{Health, Runner},
	shutdown::Shutdown,
};

pub fn handler() -> ApiRouter {
	ApiRouter::new()
		.api_route("/health-check", get(health_check))
		.api_route("/shutdown", post(shutdown))
		.route("/openapi.json", axum::routing::get(openapi))
}

#[derive(Debug, serde::Serialize, JsonSchema)]
pub struct HealthCheckSetup {
	/// Setup logs
	pub logs: String,
	/// Setup status
	pub status: String,
	/// Setup started time
	pub started_at: String,
	/// Setup completed time
	pub completed_at: Option<String>,
}

#[derive(Debug, serde::Serialize, JsonSchema)]
pub struct HealthCheck {
	/// Current health status
	pub status: Health,
	/// Setup information
	pub setup: HealthCheckSetup,
}

pub async fn health_check(Extension(runner): Extension<Runner>) -> Json<HealthCheck> {
	let setup = runner.setup().await;
	let status = match (&setup.completed_at, &setup.error) {
		(None, _) => "starting",
		(Some(_), None) => "succeeded",
		(Some(_), Some(_)) => "failed",
	};

	Json(HealthCheck {
		status: runner.health(),
		setup: HealthCheckSetup {
			status: status.to_string(),
			logs: setup.error.unwrap_or_default(),
			started_at: setup.started_at.to_rfc3339(),
			completed_at: setup.completed_at.map(|t| t.to_rfc3339()),
		},
	})
}

#[allow(clippy::unused_async)]
pub async fn shutdown(Extension(shutdown): Extension<Shutdown>) -> Json<String> {
	shutdown.start();

	Json(String::new())
}

#[allow(clippy::unused_async)]
async fn openapi(Extension(openapi): Extension<OpenApi>) -> axum::Json<OpenApi> {
	axum::Json(openapi)
}
