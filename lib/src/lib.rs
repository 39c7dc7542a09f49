#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub use photo_identify_core::{
	preprocess, Classifier, ImageTensor, Label, Normalization, Preprocessing,
};
pub use runner::{Classification, Health, Runner};
pub use server::{openapi, router, start};
pub use settings::Settings;
pub use shutdown::Shutdown;

mod errors;
mod form;
mod helpers;
mod input;
mod prediction;
mod routes;
mod runner;
mod server;
mod settings;
mod shutdown;
mod templates;

#[cfg(test)]
mod testing;
