use std::{
	net::{IpAddr, Ipv4Addr, SocketAddr},
	time::Duration,
};

/// Server settings, read from flags or the environment.
#[derive(Debug, Clone, clap::Args)]
pub struct Settings {
	/// Address to listen on
	#[arg(long, env = "HOST", default_value = "0.0.0.0")]
	pub host: IpAddr,

	/// Port to listen on
	#[arg(long, env = "PORT", default_value_t = 5000)]
	pub port: u16,

	/// Number of labels returned for each image
	#[arg(long, env = "TOP_K", default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..=1000))]
	pub top_k: u16,

	/// Largest accepted request body, in bytes
	#[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
	pub max_upload_bytes: usize,

	/// How long to wait for images referenced by URL, in seconds
	#[arg(long, env = "FETCH_TIMEOUT", default_value_t = 30)]
	pub fetch_timeout: u64,
}

impl Settings {
	#[must_use]
	pub const fn addr(&self) -> SocketAddr {
		SocketAddr::new(self.host, self.port)
	}

	#[must_use]
	pub fn top_k(&self) -> usize {
		usize::from(self.top_k)
	}

	#[must_use]
	pub const fn fetch_timeout(&self) -> Duration {
		Duration::from_secs(self.fetch_timeout)
	}
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
			port: 5000,
			top_k: 5,
			max_upload_bytes: 10 * 1024 * 1024,
			fetch_timeout: 30,
		}
	}
}
