use aide::axum::ApiRouter;

pub mod home;
pub mod predict;
pub mod system;

pub fn handler() -> ApiRouter {
	ApiRouter::new()
		.merge(home::handler())
		.merge(system::handler())
		.merge(predict::handler())
}
