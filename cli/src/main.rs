#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod model;

#[derive(Parser)]
#[clap(name = "photo-identify", version)]
/// Identify what a photo shows with a pretrained ImageNet classifier
struct Cli {
	#[clap(subcommand)]
	command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::registry()
		.with(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new("info,photo_identify=debug,tower_http=debug")),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let cli = Cli::parse();

	commands::exec(cli.command).await
}
