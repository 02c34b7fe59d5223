//! # Member-Portal Binary
//!
//! The entry point that assembles the content subsystem from its
//! plugins: SQLite persistence, local-disk file storage, and the
//! actix-web routing layer.

use actix_web::{web, App, HttpServer};
use mp_api::handlers::AppState;
use mp_core::models::Member;
use mp_db_sqlite::SqliteContentRepo;
use mp_service::ContentService;
use mp_storage_local::LocalFileStore;
use std::env;
use std::sync::Arc;
use uuid::Uuid;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:member_portal.db".to_string());
    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    // 1. Persistence plugin
    let repo = SqliteContentRepo::new(&database_url)
        .await
        .expect("Failed to init SQLite");

    // 2. Development convenience until the membership subsystem is
    //    wired in: make sure at least one member exists to author with.
    //    Fixed id so restarts reuse the same row.
    let demo = Member {
        id: Uuid::nil(),
        name: "demo".to_string(),
    };
    if let Err(e) = repo.upsert_member(&demo).await {
        log::warn!("could not seed demo member: {e}");
    } else {
        log::info!("demo member available as X-Member-Id: {}", demo.id);
    }

    // 3. Storage plugin + service
    let store = LocalFileStore::new(upload_dir);
    let service = ContentService::new(Arc::new(repo), Arc::new(store));

    let state = web::Data::new(AppState { service });

    log::info!("member-portal starting on http://{bind_addr}");

    HttpServer::new(move || {
        App::new()
            .wrap(mp_api::middleware::standard_middleware())
            .app_data(state.clone())
            .configure(mp_api::configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
