#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod classifier;
pub mod http;
pub mod tensor;

pub use classifier::Classifier;
pub use http::Label;
pub use tensor::{preprocess, ImageTensor, Normalization, Preprocessing};
