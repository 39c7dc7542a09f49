use anyhow::Result;
use photo_identify::Settings;

use crate::model::{ModelConfig, TorchClassifier};

pub async fn handle(settings: Settings, model: ModelConfig) -> Result<()> {
	tracing::info!(
		"Serving {:?} weights from {}",
		model.arch,
		model.weights.display()
	);

	photo_identify::start::<TorchClassifier>(settings, model).await
}
