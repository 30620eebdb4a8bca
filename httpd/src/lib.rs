//! The HTTP edge: maps `GET`/`HEAD`/`PUT` onto a `FileService`.
//!
//! Grounded on `original_source/src/local/HTTPFileServer.cpp`'s
//! `process_request` dispatch, reimplemented as axum routes on the shape
//! of the teacher's `server/src/handlers.rs` (one handler function per
//! verb, state threaded through an `Arc`), but backed by
//! `flocons_core::FileService` instead of raw `std::fs` calls.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path as AxumPath, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use flocons_core::http_wire::{self, DirectoryListing, WireEntry, WireKind};
use flocons_core::{mime, File, FileService, FileServiceError, Path};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn FileService>,
}

/// Builds the router. Exposed separately from `serve` so integration
/// tests can drive it in-process with `tower::util::ServiceExt::oneshot`
/// instead of needing a bound socket for every scenario.
pub fn app(service: Arc<dyn FileService>) -> Router {
    let state = AppState { service };
    Router::new()
        .route("/", get(handle_get_root).head(handle_head_root).put(handle_put_root))
        .route("/*path", get(handle_get).head(handle_head).put(handle_put))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

pub async fn serve(service: Arc<dyn FileService>, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "flocons-httpd listening");
    axum::serve(listener, app(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async { tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler") };
    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn path_from_tail(tail: &str) -> Path {
    Path::parse(&format!("/{tail}"))
}

/// Maps a `FileServiceError` to the response described in spec §7/§4.8:
/// `NotFound` -> 404, `AlreadyExists` -> 409, everything else -> 500 with
/// the error message as the body.
fn error_response(err: FileServiceError) -> Response {
    let status = match &err {
        FileServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
        FileServiceError::AlreadyExists { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

fn html_listing(entries: &[WireEntry]) -> String {
    let mut out = String::from("<html><body><table>\n");
    for entry in entries {
        let size = entry.size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            entry.name,
            size,
            http_wire::format_last_modified(entry.mtime)
        ));
    }
    out.push_str("</table></body></html>\n");
    out
}

fn wire_entries(files: Vec<File>) -> Vec<WireEntry> {
    files
        .into_iter()
        .map(|file| match file {
            File::Directory(dir) => WireEntry {
                name: dir.path().basename().to_string(),
                kind: WireKind::Directory,
                size: None,
                mode: dir.meta.mode,
                mtime: dir.meta.mtime,
            },
            File::Regular(regular) => WireEntry {
                name: regular.meta.path.basename().to_string(),
                kind: WireKind::Regular,
                size: Some(regular.size),
                mode: regular.meta.mode,
                mtime: regular.meta.mtime,
            },
        })
        .collect()
}

async fn respond(state: AppState, path: Path, headers: HeaderMap, include_body: bool) -> Response {
    let file = match state.service.get_file(&path) {
        Ok(file) => file,
        Err(e) => return error_response(e),
    };

    match file {
        File::Directory(_) => {
            let entries = match state.service.list_files(&path) {
                Ok(files) => wire_entries(files),
                Err(e) => return error_response(e),
            };
            if wants_html(&headers) {
                let body = if include_body { html_listing(&entries) } else { String::new() };
                ([(axum::http::header::CONTENT_TYPE, http_wire::HTML_LISTING_MIME_TYPE)], body).into_response()
            } else {
                let body = if include_body {
                    serde_json::to_vec(&DirectoryListing { entries }).unwrap_or_default()
                } else {
                    Vec::new()
                };
                ([(axum::http::header::CONTENT_TYPE, http_wire::JSON_LISTING_MIME_TYPE)], body).into_response()
            }
        }
        File::Regular(regular) => {
            let mut response_headers = HeaderMap::new();
            let mime_type = regular.meta.mime_type();
            response_headers.insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static(mime_type));
            response_headers.insert(
                axum::http::header::CONTENT_LENGTH,
                HeaderValue::from_str(&regular.size.to_string()).unwrap(),
            );
            response_headers.insert(
                http_wire::HEADER_LAST_MODIFIED,
                HeaderValue::from_str(&http_wire::format_last_modified(regular.meta.mtime)).unwrap(),
            );
            response_headers.insert(
                http_wire::HEADER_FILE_MODE,
                HeaderValue::from_str(&http_wire::format_mode(regular.meta.mode)).unwrap(),
            );

            let body = if include_body {
                match regular.content() {
                    Ok(bytes) => bytes,
                    Err(e) => return error_response(e),
                }
            } else {
                Vec::new()
            };
            (response_headers, body).into_response()
        }
    }
}

async fn handle_get(State(state): State<AppState>, AxumPath(tail): AxumPath<String>, headers: HeaderMap) -> Response {
    respond(state, path_from_tail(&tail), headers, true).await
}

async fn handle_head(State(state): State<AppState>, AxumPath(tail): AxumPath<String>, headers: HeaderMap) -> Response {
    respond(state, path_from_tail(&tail), headers, false).await
}

async fn handle_put(State(state): State<AppState>, AxumPath(tail): AxumPath<String>, headers: HeaderMap, body: Bytes) -> Response {
    put_impl(state, path_from_tail(&tail), headers, body).await
}

async fn handle_get_root(State(state): State<AppState>, headers: HeaderMap) -> Response {
    respond(state, Path::root(), headers, true).await
}

async fn handle_head_root(State(state): State<AppState>, headers: HeaderMap) -> Response {
    respond(state, Path::root(), headers, false).await
}

async fn handle_put_root(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    put_impl(state, Path::root(), headers, body).await
}

/// `PUT` creates: a directory if `Content-Type: inode/directory`,
/// otherwise a regular file. Per the REDESIGN in SPEC_FULL §9, a `PUT` to
/// an existing regular file path returns `AlreadyExists` (409) rather
/// than overwriting -- the container format has no in-place overwrite.
async fn put_impl(state: AppState, path: Path, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(mime::DEFAULT_MIME_TYPE);

    if content_type == mime::DIRECTORY_MIME_TYPE {
        return match state.service.create_directory(&path) {
            Ok(_) => StatusCode::OK.into_response(),
            Err(e) => error_response(e),
        };
    }

    let mode = headers
        .get(http_wire::HEADER_FILE_MODE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| u32::from_str_radix(v, 8).ok())
        .unwrap_or(0o644);

    match state.service.create_regular_file(&path, mode, &body) {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flocons_core::service::LocalFileService;
    use tower::util::ServiceExt;

    fn test_service() -> (tempfile::TempDir, Arc<dyn FileService>) {
        let dir = tempfile::tempdir().unwrap();
        let service: Arc<dyn FileService> = Arc::new(LocalFileService::new("edge", dir.path()));
        (dir, service)
    }

    #[tokio::test]
    async fn head_on_missing_file_is_404() {
        let (_dir, service) = test_service();
        let router = app(service);
        let response = router
            .oneshot(axum::http::Request::builder().method("HEAD").uri("/nope.txt").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_then_get_round_trips_content() {
        let (_dir, service) = test_service();
        let router = app(service);

        let put = router
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .method("PUT")
                    .uri("/hello.txt")
                    .body(axum::body::Body::from("hi there"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(put.status(), StatusCode::OK);

        let get = router
            .oneshot(axum::http::Request::builder().method("GET").uri("/hello.txt").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(get.status(), StatusCode::OK);
        let body = axum::body::to_bytes(get.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hi there");
    }

    #[tokio::test]
    async fn put_twice_on_same_path_is_conflict() {
        let (_dir, service) = test_service();
        let router = app(service);

        for expected in [StatusCode::OK, StatusCode::CONFLICT] {
            let response = router
                .clone()
                .oneshot(
                    axum::http::Request::builder()
                        .method("PUT")
                        .uri("/dup.txt")
                        .body(axum::body::Body::from("x"))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn put_a_directory_then_get_it_back() {
        let (_dir, service) = test_service();
        let router = app(service);

        let put = router
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .method("PUT")
                    .uri("/test")
                    .header(axum::http::header::CONTENT_TYPE, mime::DIRECTORY_MIME_TYPE)
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(put.status(), StatusCode::OK);

        let get = router
            .oneshot(axum::http::Request::builder().method("GET").uri("/test").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(get.status(), StatusCode::OK);
        assert_eq!(
            get.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            http_wire::JSON_LISTING_MIME_TYPE
        );
    }
}
