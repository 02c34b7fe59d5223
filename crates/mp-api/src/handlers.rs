//! # mp-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the
//! content service. Handlers stay thin: parse, call, map the result.

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpResponse, Responder};
use mp_core::error::AppError;
use mp_core::models::ContentKind;
use mp_service::{ContentService, DownloadOutcome};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::forms;
use crate::principal::RequirePrincipal;

/// State shared across all workers.
pub struct AppState {
    pub service: ContentService,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: i64,
}

/// URL segment to content kind ("board" and "resource" sections).
fn kind_from_path(segment: &str) -> Option<ContentKind> {
    match segment {
        "board" => Some(ContentKind::Post),
        "resource" => Some(ContentKind::Resource),
        _ => None,
    }
}

fn section_path(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Post => "/support/board",
        ContentKind::Resource => "/support/resource",
    }
}

fn error_response(err: AppError) -> HttpResponse {
    let message = err.to_string();
    match err {
        AppError::NotFound(_, _) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": message }))
        }
        AppError::Validation(_) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
        }
        AppError::Unauthorized(_) => {
            HttpResponse::Forbidden().json(serde_json::json!({ "error": message }))
        }
        AppError::Conflict(_) => {
            HttpResponse::Conflict().json(serde_json::json!({ "error": message }))
        }
        AppError::Storage(_) | AppError::Internal(_) => {
            log::error!("content operation failed: {message}");
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "internal error" }))
        }
    }
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Paged listing of a section (e.g., GET /support/board?page=0).
pub async fn list_contents(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let Some(kind) = kind_from_path(&path.into_inner()) else {
        return HttpResponse::NotFound().finish();
    };
    match data.service.list(kind, query.page).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => error_response(err),
    }
}

/// Detail view; counts the view.
pub async fn content_detail(
    data: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
) -> impl Responder {
    let (kind, id) = path.into_inner();
    if kind_from_path(&kind).is_none() {
        return HttpResponse::NotFound().finish();
    }
    match data.service.view(id, true).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(err) => error_response(err),
    }
}

/// Create from a multipart form, then redirect to the new detail page.
pub async fn create_content(
    data: web::Data<AppState>,
    path: web::Path<String>,
    principal: RequirePrincipal,
    payload: Multipart,
) -> actix_web::Result<HttpResponse> {
    let Some(kind) = kind_from_path(&path.into_inner()) else {
        return Ok(HttpResponse::NotFound().finish());
    };
    let mut form = forms::read_content_form(payload).await?;
    let file = form.file.take();
    let (draft, _) = form.into_parts();

    Ok(
        match data.service.create(&principal.0, kind, draft, file).await {
            Ok(id) => see_other(format!("{}/{id}", section_path(kind))),
            Err(err) => error_response(err),
        },
    )
}

/// Edit an existing record from a multipart form.
pub async fn update_content(
    data: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
    principal: RequirePrincipal,
    payload: Multipart,
) -> actix_web::Result<HttpResponse> {
    let (kind, id) = path.into_inner();
    let Some(kind) = kind_from_path(&kind) else {
        return Ok(HttpResponse::NotFound().finish());
    };
    let (draft, change) = forms::read_content_form(payload).await?.into_parts();

    Ok(
        match data.service.update(id, &principal.0, draft, change).await {
            Ok(()) => see_other(format!("{}/{id}", section_path(kind))),
            Err(err) => error_response(err),
        },
    )
}

pub async fn delete_content(
    data: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
    principal: RequirePrincipal,
) -> impl Responder {
    let (kind, id) = path.into_inner();
    let Some(kind) = kind_from_path(&kind) else {
        return HttpResponse::NotFound().finish();
    };
    match data.service.delete(id, &principal.0).await {
        Ok(()) => see_other(section_path(kind).to_string()),
        Err(err) => error_response(err),
    }
}

/// Streams the attachment, or degrades with a redirect.
///
/// A missing or unreadable file sends the client back to the detail
/// page; an unknown record id back to the section listing. Neither is
/// treated as a server failure.
pub async fn download_attachment(
    data: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
) -> impl Responder {
    let (kind, id) = path.into_inner();
    let Some(kind) = kind_from_path(&kind) else {
        return HttpResponse::NotFound().finish();
    };

    match data.service.prepare_download(id).await {
        Ok(DownloadOutcome::Ready(dl)) => {
            // The extension survives percent-encoding untouched, so the
            // encoded name is still good enough for type guessing
            let mime = mime_guess::from_path(&dl.encoded_filename).first_or_octet_stream();
            let mut response = HttpResponse::Ok();
            response
                .content_type(mime.as_ref())
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename*=UTF-8''{}", dl.encoded_filename),
                ))
                .no_chunking(dl.size_bytes);
            response.streaming(ReaderStream::new(dl.file))
        }
        Ok(DownloadOutcome::Unavailable) => see_other(format!("{}/{id}", section_path(kind))),
        Err(AppError::NotFound(_, _)) => see_other(section_path(kind).to_string()),
        Err(err) => error_response(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_segments_map_to_kinds() {
        assert_eq!(kind_from_path("board"), Some(ContentKind::Post));
        assert_eq!(kind_from_path("resource"), Some(ContentKind::Resource));
        assert_eq!(kind_from_path("notice"), None);
    }

    #[test]
    fn section_paths_round_trip() {
        for kind in [ContentKind::Post, ContentKind::Resource] {
            let seg = section_path(kind).rsplit('/').next().unwrap();
            assert_eq!(kind_from_path(seg), Some(kind));
        }
    }
}
