pub mod admin;
pub mod auth;
pub mod bookings;
pub mod campaigns;
pub mod dashboard;
pub mod health;
pub mod matches;
pub mod media_kits;
pub mod pitches;
pub mod podcasts;
pub mod questionnaires;
pub mod webhooks;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Every `/api` route.
fn api() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health::health))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key", post(auth::regenerate_api_key))
        // Podcasts
        .route(
            "/podcasts",
            get(podcasts::list_podcasts).post(podcasts::create_podcast),
        )
        .route(
            "/podcasts/{id}",
            get(podcasts::get_podcast)
                .put(podcasts::update_podcast)
                .delete(podcasts::delete_podcast),
        )
        // Campaigns
        .route(
            "/campaigns",
            get(campaigns::list_campaigns).post(campaigns::create_campaign),
        )
        .route(
            "/campaigns/{id}",
            get(campaigns::get_campaign)
                .patch(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route(
            "/campaigns/{id}/generate-bio",
            post(campaigns::generate_bio),
        )
        .route(
            "/campaigns/{id}/generate-angles",
            post(campaigns::generate_angles),
        )
        .route(
            "/campaigns/{id}/questionnaire",
            get(questionnaires::get_questionnaire).put(questionnaires::submit_questionnaire),
        )
        .route(
            "/campaigns/{id}/media-kit",
            get(media_kits::get_media_kit).put(media_kits::upsert_media_kit),
        )
        .route(
            "/public/media-kits/{slug}",
            get(media_kits::get_public_media_kit),
        )
        // Matching
        .route("/campaigns/{id}/discover", post(matches::discover))
        .route("/campaigns/{id}/matches", get(matches::list_matches))
        .route("/matches/{id}", patch(matches::review_match))
        // Pitches
        .route("/pitch-templates", get(pitches::list_templates))
        .route(
            "/pitches",
            get(pitches::list_pitches).post(pitches::create_pitch),
        )
        .route(
            "/pitches/{id}",
            get(pitches::get_pitch)
                .patch(pitches::update_pitch)
                .delete(pitches::delete_pitch),
        )
        .route("/pitches/{id}/send", post(pitches::send_pitch))
        .route("/pitches/{id}/status", post(pitches::update_pitch_status))
        .route("/webhooks/replies", post(webhooks::reply_received))
        // Bookings
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/{id}",
            get(bookings::get_booking)
                .patch(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        // Agency
        .route(
            "/admin/clients",
            get(admin::list_clients).post(admin::create_client),
        )
        .route("/admin/users/{id}/role", patch(admin::update_user_role))
        .route("/dashboard/stats", get(dashboard::stats))
}

/// Build the full application router. Static assets are served as a SPA
/// fallback when `web_dir` exists.
pub fn app(state: AppState, web_dir: Option<&Path>) -> Router {
    let mut app = Router::new().nest("/api", api());

    if let Some(web_dir) = web_dir.filter(|dir| dir.exists()) {
        tracing::info!("serving static files from {}", web_dir.display());
        let index_html = web_dir.join("index.html");
        app = app.fallback_service(ServeDir::new(web_dir).fallback(ServeFile::new(index_html)));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
