use anyhow::Result;
use std::future::Future;

use crate::{http::Label, tensor::ImageTensor, Preprocessing};

/// A pretrained image classifier
pub trait Classifier: Sized + Send {
	/// Whatever the classifier needs to locate and load its weights.
	type Config: Send + 'static;

	/// Load the model. Called once, before the first prediction.
	///
	/// # Errors
	///
	/// Returns an error if the weights cannot be loaded.
	fn setup(config: Self::Config) -> impl Future<Output = Result<Self>> + Send;

	/// The input size and normalization the model was trained with.
	fn preprocessing(&self) -> Preprocessing;

	/// Run a forward pass and return the `top_k` most likely labels, most likely first.
	///
	/// # Errors
	///
	/// Returns an error if the forward pass fails.
	fn predict(&self, input: &ImageTensor, top_k: usize) -> Result<Vec<Label>>;
}
