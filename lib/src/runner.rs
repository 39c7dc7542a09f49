use atomic_enum::atomic_enum;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use photo_identify_core::{preprocess, tensor, Classifier, Label, Preprocessing};
use schemars::JsonSchema;
use std::{
	sync::{atomic::Ordering, Arc},
	time::Duration,
};
use tokio::{
	runtime::Handle,
	sync::{mpsc, oneshot, RwLock},
};

use crate::{helpers::with_timing, shutdown::Shutdown};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("The model is still loading")]
	NotReady,

	#[error("The model failed to load")]
	SetupFailed,

	#[error("The model worker has stopped")]
	Stopped,

	#[error("Failed to preprocess image: {0}")]
	Preprocess(#[from] tensor::Error),

	#[error("Preprocessed image has shape {actual:?}, the model expects {expected:?}")]
	Shape {
		actual: [usize; 4],
		expected: [usize; 4],
	},

	#[error("Failed to run prediction: {0}")]
	Prediction(#[from] anyhow::Error),
}

impl Error {
	pub const fn status_code(&self) -> StatusCode {
		match self {
			Self::NotReady | Self::SetupFailed | Self::Stopped => StatusCode::SERVICE_UNAVAILABLE,
			Self::Preprocess(_) => StatusCode::UNPROCESSABLE_ENTITY,
			Self::Shape { .. } | Self::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

#[atomic_enum]
#[derive(serde::Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
	Unknown,
	Starting,
	Ready,
	Busy,
	SetupFailed,
}

/// How and when the model was loaded.
#[derive(Debug, Clone)]
pub struct Setup {
	pub started_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	pub error: Option<String>,
}

/// The labels predicted for one image.
#[derive(Debug, Clone)]
pub struct Classification {
	pub labels: Vec<Label>,
	pub predict_time: Duration,
}

type Job = (oneshot::Sender<Result<Classification, Error>>, DynamicImage);

/// Owns the classifier on a dedicated thread and feeds it one image at a time.
#[derive(Clone)]
pub struct Runner {
	health: Arc<AtomicHealth>,
	setup: Arc<RwLock<Setup>>,
	sender: mpsc::Sender<Job>,
}

impl Runner {
	/// Load the classifier in the background. Shutdown is triggered if it fails to load.
	///
	/// # Panics
	///
	/// Panics if called outside of a tokio runtime.
	pub fn new<T: Classifier + 'static>(config: T::Config, top_k: usize, shutdown: Shutdown) -> Self {
		let health = Arc::new(AtomicHealth::new(Health::Starting));
		let setup = Arc::new(RwLock::new(Setup {
			started_at: Utc::now(),
			completed_at: None,
			error: None,
		}));
		let (sender, mut rx) = mpsc::channel::<Job>(1);

		let runtime = Handle::current();
		let worker_health = health.clone();
		let worker_setup = setup.clone();
		tokio::task::spawn_blocking(move || {
			tracing::info!("Loading model...");

			let classifier = match runtime.block_on(T::setup(config)) {
				Ok(classifier) => classifier,
				Err(error) => {
					tracing::error!("Failed to load model: {error:?}");

					let mut setup = worker_setup.blocking_write();
					setup.completed_at = Some(Utc::now());
					setup.error = Some(format!("{error:#}"));
					drop(setup);

					worker_health.store(Health::SetupFailed, Ordering::SeqCst);
					shutdown.start();
					return;
				},
			};

			worker_setup.blocking_write().completed_at = Some(Utc::now());
			worker_health.store(Health::Ready, Ordering::SeqCst);
			tracing::info!("Model loaded");

			let preprocessing = classifier.preprocessing();
			while let Some((tx, image)) = rx.blocking_recv() {
				worker_health.store(Health::Busy, Ordering::SeqCst);
				let result = classify(&classifier, &preprocessing, &image, top_k);
				worker_health.store(Health::Ready, Ordering::SeqCst);

				if tx.send(result).is_err() {
					tracing::debug!("Prediction finished after its request went away");
				}
			}

			tracing::debug!("All runner handles dropped, stopping model worker");
		});

		Self {
			health,
			setup,
			sender,
		}
	}

	pub fn health(&self) -> Health {
		self.health.load(Ordering::SeqCst)
	}

	pub async fn setup(&self) -> Setup {
		self.setup.read().await.clone()
	}

	/// Fails unless the model has finished loading.
	pub fn ensure_ready(&self) -> Result<(), Error> {
		match self.health() {
			Health::Unknown | Health::Starting => Err(Error::NotReady),
			Health::SetupFailed => Err(Error::SetupFailed),
			Health::Ready | Health::Busy => Ok(()),
		}
	}

	/// Classify `image`, waiting for any prediction already in flight.
	pub async fn classify(&self, image: DynamicImage) -> Result<Classification, Error> {
		self.ensure_ready()?;

		let (tx, rx) = oneshot::channel();
		self.sender
			.send((tx, image))
			.await
			.map_err(|_| Error::Stopped)?;

		rx.await.map_err(|_| Error::Stopped)?
	}
}

fn classify<T: Classifier>(
	classifier: &T,
	preprocessing: &Preprocessing,
	image: &DynamicImage,
	top_k: usize,
) -> Result<Classification, Error> {
	let tensor = preprocess(image, preprocessing)?;
	if !tensor.matches(preprocessing) {
		return Err(Error::Shape {
			actual: tensor.shape(),
			expected: preprocessing.shape(),
		});
	}

	let (labels, predict_time) = with_timing(|| classifier.predict(&tensor, top_k));
	let mut labels = labels?;
	labels.truncate(top_k);

	tracing::debug!("Prediction took {predict_time:?}");

	Ok(Classification {
		labels,
		predict_time,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{ready, solid, Stub, StubConfig};
	use tokio::sync::Notify;

	#[tokio::test]
	async fn classifies_once_ready() {
		let shutdown = Shutdown::detached();
		let runner = Runner::new::<Stub>(StubConfig::Succeed, 2, shutdown.clone());
		ready(&runner).await;

		let classification = runner.classify(solid(20, 10)).await.unwrap();

		assert_eq!(
			classification.labels,
			vec![Label::new("tabby", 0.82), Label::new("tiger cat", 0.1)]
		);
		assert!(matches!(runner.health(), Health::Ready));
		assert!(runner.setup().await.completed_at.is_some());
		assert!(!shutdown.is_requested());
	}

	#[tokio::test]
	async fn classify_waits_for_setup() {
		let loaded = Arc::new(Notify::new());
		let runner = Runner::new::<Stub>(StubConfig::SlowSetup(loaded.clone()), 5, Shutdown::detached());

		assert!(matches!(runner.health(), Health::Starting));
		assert!(matches!(runner.ensure_ready(), Err(Error::NotReady)));
		let error = runner.classify(solid(4, 4)).await.unwrap_err();
		assert!(matches!(error, Error::NotReady));
		assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
		assert!(runner.setup().await.completed_at.is_none());

		loaded.notify_one();
		ready(&runner).await;

		assert!(runner.ensure_ready().is_ok());
		assert!(runner.classify(solid(4, 4)).await.is_ok());
	}

	#[tokio::test]
	async fn queued_requests_are_all_served() {
		let runner = Runner::new::<Stub>(StubConfig::Succeed, 1, Shutdown::detached());
		ready(&runner).await;

		let results = classify_concurrently(&runner).await;

		assert!(results.iter().all(Result::is_ok));
	}

	async fn classify_concurrently(runner: &Runner) -> Vec<Result<Classification, Error>> {
		let handles = (0..4)
			.map(|_| {
				let runner = runner.clone();
				tokio::spawn(async move { runner.classify(solid(4, 4)).await })
			})
			.collect::<Vec<_>>();

		let mut results = Vec::new();
		for handle in handles {
			results.push(handle.await.unwrap());
		}

		results
	}

	#[tokio::test]
	async fn failed_setup_shuts_down() {
		let shutdown = Shutdown::detached();
		let runner = Runner::new::<Stub>(StubConfig::FailSetup, 5, shutdown.clone());

		tokio::time::timeout(Duration::from_secs(5), shutdown.handle())
			.await
			.expect("setup failure did not trigger shutdown");

		assert!(matches!(runner.health(), Health::SetupFailed));
		assert!(matches!(
			runner.classify(solid(4, 4)).await,
			Err(Error::SetupFailed)
		));
		assert!(runner.setup().await.error.unwrap().contains("weights not found"));
	}

	#[tokio::test]
	async fn prediction_errors_are_reported() {
		let runner = Runner::new::<Stub>(StubConfig::FailPredict, 5, Shutdown::detached());
		ready(&runner).await;

		let error = runner.classify(solid(4, 4)).await.unwrap_err();

		assert!(matches!(error, Error::Prediction(_)));
		assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
		assert!(matches!(runner.health(), Health::Ready));
	}

	#[tokio::test]
	async fn empty_images_are_rejected_before_the_model() {
		let runner = Runner::new::<Stub>(StubConfig::Succeed, 5, Shutdown::detached());
		ready(&runner).await;

		let error = runner.classify(solid(0, 0)).await.unwrap_err();

		assert!(matches!(error, Error::Preprocess(_)));
		assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
	}
}
