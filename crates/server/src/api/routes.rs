use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{
    accounts, automate, automation, handlers, logs, media, middleware::metrics_middleware, posts,
    settings, ws,
};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let staging = &state.config().staging;
    let uploads = ServeDir::new(&staging.uploads_dir);
    let uploads_prefix = staging.uploads_url_prefix.trim_end_matches('/').to_string();

    // API routes
    let api_routes = Router::new()
        // Health, config, metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Posts
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/import", post(posts::import_posts))
        .route("/posts/export", get(posts::export_posts))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        // Accounts
        .route("/accounts", get(accounts::list_accounts))
        // Batch automation
        .route("/automation/status", get(automation::get_status))
        .route("/automation/start", post(automation::start))
        .route("/automation/stop", post(automation::stop))
        .route("/automation/reset", post(automation::reset))
        // Single job
        .route("/automate-batch", post(automate::automate_batch))
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).post(settings::save_settings),
        )
        // Uploads
        .route("/upload-image", post(media::upload_image))
        .route("/upload-video", post(media::upload_video))
        // Logs
        .route("/logs", get(logs::recent_logs))
        .route("/ws", get(ws::ws_handler))
        .layer(DefaultBodyLimit::max(media::MAX_UPLOAD_BYTES))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest_service(&uploads_prefix, uploads)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
