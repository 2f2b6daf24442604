use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(upload_routes(config))
        .merge(image_routes())
        .merge(moderation_routes())
        .merge(submissions_routes())
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::upload::upload_slide))
        .layer(handlers::upload::upload_body_limit(config.upload.max_bytes))
}

fn image_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::slide::get_image))
        .routes(routes!(handlers::slide::get_image_by_name))
        .routes(routes!(handlers::slide::list_approved_images))
}

fn moderation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::slide::list_images))
        .routes(routes!(handlers::slide::approve_slide))
        .routes(routes!(handlers::slide::decline_slide))
        .routes(routes!(handlers::slide::edit_department))
        .routes(routes!(handlers::slide::delete_slide))
}

fn submissions_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::submissions::get_status,
        handlers::submissions::set_status
    ))
}
