//! # mp-api
//!
//! The web routing and orchestration layer for the member portal's
//! content subsystem.

pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod principal;

use actix_web::web;

/// Configures the content routes.
///
/// # Developer Note
/// We use a scoped configuration so the main binary can mount the
/// support section under a different prefix if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/support")
            .route("/{kind}", web::get().to(handlers::list_contents))
            .route("/{kind}", web::post().to(handlers::create_content))
            .route("/{kind}/{id}", web::get().to(handlers::content_detail))
            .route("/{kind}/{id}", web::post().to(handlers::update_content))
            .route("/{kind}/{id}/delete", web::post().to(handlers::delete_content))
            .route(
                "/{kind}/{id}/download",
                web::get().to(handlers::download_attachment),
            ),
    );
}
