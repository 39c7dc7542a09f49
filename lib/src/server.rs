use aide::openapi::{self, OpenApi};
use anyhow::Result;
use axum::{extract::DefaultBodyLimit, http::Method, Extension, Router, Server};
use indexmap::indexmap;
use photo_identify_core::{
	http::{Input, Label, Request, Response},
	Classifier,
};
use schemars::{
	gen::{SchemaGenerator, SchemaSettings},
	schema::SchemaObject as Schema,
};
use tower_http::trace::TraceLayer;

use crate::{
	helpers::openapi::{replace_request_schema, replace_response_schema, schema_with_properties},
	input::Fetcher,
	prediction::InputSchema,
	routes,
	runner::Runner,
	settings::Settings,
	shutdown::Shutdown,
};

/// Load the classifier and serve it until shutdown is requested.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be installed or the server fails to bind.
pub async fn start<T: Classifier + 'static>(settings: Settings, config: T::Config) -> Result<()> {
	let shutdown = Shutdown::new()?;
	let runner = Runner::new::<T>(config, settings.top_k(), shutdown.clone());
	let router = router(&settings, runner, shutdown.clone())?;

	let addr = settings.addr();
	tracing::info!("Starting server on {addr}...");

	Server::try_bind(&addr)?
		.serve(router.into_make_service())
		.with_graceful_shutdown(shutdown.handle())
		.await?;

	tracing::info!("Server stopped");
	Ok(())
}

/// Assemble the application around an already started runner.
///
/// # Errors
///
/// Returns an error if the input schema does not compile or the HTTP client cannot be built.
pub fn router(settings: &Settings, runner: Runner, shutdown: Shutdown) -> Result<Router> {
	let (router, openapi) = routes_with_schema();

	Ok(router
		.layer(Extension(runner))
		.layer(shutdown.extension())
		.layer(InputSchema::new()?.extension())
		.layer(Extension(Fetcher::new(settings.fetch_timeout())?))
		.layer(Extension(openapi))
		.layer(DefaultBodyLimit::max(settings.max_upload_bytes))
		.layer(TraceLayer::new_for_http()))
}

/// The OpenAPI document describing the JSON API.
pub fn openapi() -> OpenApi {
	routes_with_schema().1
}

fn routes_with_schema() -> (Router, OpenApi) {
	let mut openapi = base_schema();
	let router = routes::handler().finish_api(&mut openapi);
	tweak_generated_schema(&mut openapi);

	(router, openapi)
}

fn base_schema() -> OpenApi {
	let mut generator = SchemaGenerator::new(SchemaSettings::openapi3().with(|settings| {
		settings.inline_subschemas = true;
	}));

	OpenApi {
		info: openapi::Info {
			title: "Photo Identify".to_string(),
			version: env!("CARGO_PKG_VERSION").to_string(),
			..openapi::Info::default()
		},
		components: Some(openapi::Components {
			schemas: indexmap! {
				"Input".to_string() => openapi::SchemaObject {
					example: None,
					external_docs: None,
					json_schema: schema_with_properties::<Input>(&mut generator, |name, schema, i| {
						schema.metadata().title = Some(titlecase::titlecase(&name));
						schema.extensions.insert("x-order".to_string(), (i + 1).into());
					})
				},
				"PredictionRequest".to_string() => openapi::SchemaObject {
					example: None,
					external_docs: None,
					json_schema: schema_with_properties::<Request>(&mut generator, |name, schema, _| {
						if name == "input" {
							schema.reference = Some("#/components/schemas/Input".to_string());
						}
					})
				},
				"Output".to_string() => openapi::SchemaObject {
					example: None,
					external_docs: None,
					json_schema: generator.subschema_for::<Vec<Label>>()
				},
				"PredictionResponse".to_string() => openapi::SchemaObject {
					example: None,
					external_docs: None,
					json_schema: schema_with_properties::<Response>(&mut generator, |name, schema, _| {
						if name == "input" {
							schema.reference = Some("#/components/schemas/Input".to_string());
						}

						if name == "output" {
							schema.reference = Some("#/components/schemas/Output".to_string());
						}
					})
				},
			},
			..openapi::Components::default()
		}),
		..OpenApi::default()
	}
}

fn tweak_generated_schema(openapi: &mut OpenApi) {
	let request = replace_request_schema(
		openapi,
		"/predictions",
		(Method::POST, "application/json"),
		Schema::new_ref("#/components/schemas/PredictionRequest".to_string()),
	);

	let response = replace_response_schema(
		openapi,
		"/predictions",
		(
			Method::POST,
			openapi::StatusCode::Code(200),
			"application/json",
		),
		Schema::new_ref("#/components/schemas/PredictionResponse".to_string()),
	);

	if request.is_none() || response.is_none() {
		tracing::warn!("Could not point /predictions at the prediction schemas");
	}
}
