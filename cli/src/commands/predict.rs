use anyhow::{Context, Result};
use photo_identify::{preprocess, Classifier};
use std::path::Path;

use crate::model::{ModelConfig, TorchClassifier};

pub async fn handle(image: &Path, top_k: usize, model: ModelConfig) -> Result<()> {
	let bytes = std::fs::read(image)
		.with_context(|| format!("Failed to read {}", image.display()))?;
	let decoded = image::load_from_memory(&bytes)
		.with_context(|| format!("{} is not a supported image", image.display()))?;

	let classifier = TorchClassifier::setup(model).await?;
	let tensor = preprocess(&decoded, &classifier.preprocessing())?;

	for label in classifier.predict(&tensor, top_k)? {
		println!("{:50} {:5.2}%", label.name, 100.0 * label.probability);
	}

	Ok(())
}
