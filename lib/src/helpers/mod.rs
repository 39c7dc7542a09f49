use base64::{engine::general_purpose::STANDARD as Base64, DecodeError, Engine};
use std::time::{Duration, Instant};

pub mod openapi;

pub fn base64_encode<T: AsRef<[u8]>>(bytes: T) -> String {
	Base64.encode(bytes)
}

pub fn base64_decode<T: AsRef<[u8]>>(bytes: T) -> Result<Vec<u8>, DecodeError> {
	Base64.decode(bytes)
}

pub fn with_timing<T>(cb: impl FnOnce() -> T) -> (T, Duration) {
	let start = Instant::now();
	let result = cb();

	(result, start.elapsed())
}

/// Encode `bytes` as a data URL, sniffing the mime type from the contents.
pub fn to_dataurl(bytes: &[u8]) -> String {
	let mime_type = tree_magic_mini::from_u8(bytes);

	format!("data:{mime_type};base64,{}", base64_encode(bytes))
}
