use askama::Template;
use axum::{http::StatusCode, response::Html};

use crate::errors::HTTPError;

/// The upload page, optionally showing the labels for the last upload.
#[derive(Debug, Default, Template)]
#[template(path = "home.html")]
pub struct Home {
	pub errors: Vec<String>,
	pub prediction: Vec<String>,
	pub img_data: Option<String>,
}

impl Home {
	pub fn respond(&self, status: StatusCode) -> Result<(StatusCode, Html<String>), HTTPError> {
		Ok((status, Html(self.render()?)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_page_only_has_the_form() {
		let html = Home::default().render().unwrap();

		assert!(html.contains(r#"enctype="multipart/form-data""#));
		assert!(html.contains(r#"name="image""#));
		assert!(!html.contains("<ol"));
	}

	#[test]
	fn predictions_and_errors_are_escaped() {
		let html = Home {
			errors: vec!["<b>bad</b>".to_string()],
			prediction: vec!["jack-o'-lantern: 50.00%".to_string()],
			img_data: Some("data:image/png;base64,AAAA".to_string()),
		}
		.render()
		.unwrap();

		assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
		assert!(html.contains("jack-o&#x27;-lantern: 50.00%") || html.contains("jack-o&#39;-lantern: 50.00%"));
		assert!(html.contains(r#"src="data:image/png;base64,AAAA""#));
	}
}
