use std::{future::Future, io, sync::Arc};
use tokio::{signal, sync::watch};

/// A cloneable graceful-shutdown trigger.
#[derive(Debug, Clone)]
pub struct Shutdown {
	sender: Arc<watch::Sender<bool>>,
}

impl Shutdown {
	/// Create a shutdown trigger that also fires on Ctrl+C and SIGTERM.
	///
	/// # Errors
	///
	/// Returns an error if the signal handlers cannot be installed.
	pub fn new() -> io::Result<Self> {
		let shutdown = Self::detached();
		let signals = register_handlers()?;

		let handle = shutdown.clone();
		tokio::spawn(async move {
			signals.await;
			handle.start();
		});

		Ok(shutdown)
	}

	/// Create a shutdown trigger that only fires when [`Shutdown::start`] is called.
	#[must_use]
	pub fn detached() -> Self {
		let (sender, _) = watch::channel(false);

		Self {
			sender: Arc::new(sender),
		}
	}

	pub fn start(&self) {
		tracing::info!("Shutdown requested");
		self.sender.send_replace(true);
	}

	#[must_use]
	pub fn is_requested(&self) -> bool {
		*self.sender.borrow()
	}

	/// Resolves once shutdown has been requested.
	pub fn handle(&self) -> impl Future<Output = ()> + Send + 'static {
		let mut receiver = self.sender.subscribe();

		async move {
			loop {
				if *receiver.borrow_and_update() {
					return;
				}

				if receiver.changed().await.is_err() {
					std::future::pending::<()>().await;
				}
			}
		}
	}

	#[must_use]
	pub fn extension(&self) -> axum::Extension<Self> {
		axum::Extension(self.clone())
	}
}

fn register_handlers() -> io::Result<impl Future<Output = ()>> {
	#[cfg(unix)]
	let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

	Ok(async move {
		let ctrl_c = async {
			if let Err(error) = signal::ctrl_c().await {
				tracing::error!("Failed to listen for Ctrl+C: {error}");
				std::future::pending::<()>().await;
			}
		};

		#[cfg(unix)]
		let terminate = async {
			terminate.recv().await;
		};

		#[cfg(not(unix))]
		let terminate = std::future::pending::<()>();

		tokio::select! {
			() = ctrl_c => {},
			() = terminate => {},
		}

		tracing::info!("Received shutdown signal");
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn handle_resolves_after_start() {
		let shutdown = Shutdown::detached();
		let handle = tokio::spawn(shutdown.handle());

		assert!(!shutdown.is_requested());
		shutdown.clone().start();

		tokio::time::timeout(Duration::from_secs(1), handle)
			.await
			.expect("shutdown handle did not resolve")
			.unwrap();
		assert!(shutdown.is_requested());
	}

	#[tokio::test]
	async fn handle_created_after_start_resolves_immediately() {
		let shutdown = Shutdown::detached();
		shutdown.start();

		tokio::time::timeout(Duration::from_millis(100), shutdown.handle())
			.await
			.expect("shutdown handle did not resolve");
	}
}
