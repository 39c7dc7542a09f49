use anyhow::Result;
use clap::Subcommand;
use photo_identify::Settings;
use std::path::PathBuf;

use crate::model::ModelConfig;

mod predict;
mod schema;
mod serve;

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Serve the upload form and the prediction API
	Serve {
		#[clap(flatten)]
		settings: Settings,
		#[clap(flatten)]
		model: ModelConfig,
	},

	/// Classify a local image and print the most likely labels
	Predict {
		/// Path to the image to classify
		image: PathBuf,
		/// How many labels to print
		#[clap(short = 'k', long, default_value_t = 5)]
		top_k: usize,
		#[clap(flatten)]
		model: ModelConfig,
	},

	/// Print the OpenAPI document of the prediction API
	Schema,
}

pub async fn exec(command: Command) -> Result<()> {
	match command {
		Command::Serve { settings, model } => serve::handle(settings, model).await,
		Command::Predict {
			image,
			top_k,
			model,
		} => predict::handle(&image, top_k, model).await,
		Command::Schema => schema::handle(),
	}
}
