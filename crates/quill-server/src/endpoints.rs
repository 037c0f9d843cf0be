// crates/quill-server/src/endpoints.rs
// ============================================================================
// Module: Quill Legacy Endpoints
// Description: Request decoding and response envelopes for the post endpoints.
// Purpose: Keep the wire contract of the `.php` endpoints the frontend calls.
// Dependencies: quill-core, axum, serde, serde_json
// ============================================================================

//! ## Overview
//! Each endpoint decodes its input leniently, runs one [`BlogService`]
//! operation on a blocking-capable context, and answers with a JSON envelope:
//! `{"success":true,...}` on success and `{"success":false,"message":...}` on
//! failure. `read_post_by_id.php` is the exception: it answers with a bare
//! post summary or `{"error":...}`.
//!
//! Store failures never reach the client. They answer `Database error
//! occurred` and the detail is recorded as a diagnostic event.
//!
//! [`BlogService`]: quill_core::BlogService

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::Form;
use axum::Json;
use axum::extract::FromRequest;
use axum::extract::Multipart;
use axum::extract::Query;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::CONTENT_LENGTH;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use bytes::Bytes;
use quill_core::CleanupReport;
use quill_core::ImageError;
use quill_core::ImageUpload;
use quill_core::Post;
use quill_core::PostDraft;
use quill_core::PostId;
use quill_core::PostSummary;
use quill_core::ServiceError;
use quill_core::ServiceFailure;
use quill_core::lenient_int;
use serde::Serialize;
use serde_json::Value;

use crate::audit::DiagnosticLevel;
use crate::audit::QuillAuditEvent;
use crate::audit::QuillAuditEventParams;
use crate::audit::QuillDiagnosticEvent;
use crate::server::ServerState;
use crate::telemetry::QuillEndpoint;
use crate::telemetry::QuillMethod;
use crate::telemetry::QuillMetricEvent;
use crate::telemetry::QuillOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Client message for any store failure.
const DATABASE_ERROR: &str = "Database error occurred";

/// Multipart field carrying the post image.
const IMAGE_FIELD: &str = "image";

/// Text fields read from post forms.
const TEXT_FIELDS: [&str; 3] = ["id", "title", "content"];

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Handles one request for `endpoint` and records it.
pub(crate) async fn dispatch(
    state: Arc<ServerState>,
    endpoint: QuillEndpoint,
    request: Request,
) -> Response {
    let started = Instant::now();
    let method = QuillMethod::from_http(request.method());
    let request_bytes = declared_length(request.headers());
    let reply = if request.method() == Method::OPTIONS {
        Reply::preflight()
    } else if !endpoint.accepts(request.method()) {
        Reply::failure(StatusCode::BAD_REQUEST, "method", "Invalid request method")
    } else {
        match endpoint {
            QuillEndpoint::GetPosts => get_posts(&state, request.uri()),
            QuillEndpoint::GetPostById => get_post_by_id(&state, request.uri()),
            QuillEndpoint::ReadPostById => read_post_by_id(&state, request.uri()),
            QuillEndpoint::CreatePost => create_post(&state, request).await,
            QuillEndpoint::UpdatePost => update_post(&state, request).await,
            QuillEndpoint::DeletePost => delete_post(&state, request).await,
        }
    };
    finish(&state, endpoint, method, request_bytes, started, reply)
}

/// Records audit and metric events, then renders the reply.
fn finish(
    state: &ServerState,
    endpoint: QuillEndpoint,
    method: QuillMethod,
    request_bytes: u64,
    started: Instant,
    reply: Reply,
) -> Response {
    let latency = started.elapsed();
    let status = reply.status.as_u16();
    for (level, message) in &reply.diagnostics {
        state.audit.record_diagnostic(&QuillDiagnosticEvent::new(*level, endpoint, message.clone()));
    }
    state.audit.record(&QuillAuditEvent::new(QuillAuditEventParams {
        endpoint,
        method,
        status,
        post_id: reply.post_id.map(PostId::get),
        error_kind: reply.error_kind,
        request_bytes,
        latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
    }));
    let event = QuillMetricEvent {
        endpoint,
        method,
        outcome: QuillOutcome::from_status(status),
        status,
    };
    state.metrics.record_request(event.clone());
    state.metrics.record_latency(event, latency);
    reply.into_response()
}

// ============================================================================
// SECTION: Read Endpoints
// ============================================================================

/// `get_posts.php`: one page of posts, newest first.
fn get_posts(state: &ServerState, uri: &Uri) -> Reply {
    let query = query_params(uri);
    let page = query.get("page").map(|value| lenient_int(value));
    let page_size = query.get("pageSize").map(|value| lenient_int(value));
    let request = state.service.page_request(page, page_size);
    match run_blocking(|| state.service.list(request)) {
        Ok(page) => Reply::json(
            StatusCode::OK,
            &PageEnvelope {
                success: true,
                data: page.posts,
                next_page: page.next_page,
                total: page.total,
                page: page.page,
                page_size: page.page_size,
            },
        ),
        Err(err) => Reply::failure(StatusCode::INTERNAL_SERVER_ERROR, "store", "Failed to fetch posts")
            .with_diagnostic(DiagnosticLevel::Error, err.to_string()),
    }
}

/// `get_post_by_id.php`: one post in the success envelope.
fn get_post_by_id(state: &ServerState, uri: &Uri) -> Reply {
    let Some(id) = query_params(uri).get("id").and_then(|value| PostId::parse_lenient(value))
    else {
        return Reply::failure(StatusCode::BAD_REQUEST, "missing_id", "Post id is required");
    };
    let reply = match run_blocking(|| state.service.get(id)) {
        Ok(post) => Reply::json(StatusCode::OK, &Envelope::data(post)),
        Err(err) => service_error(QuillEndpoint::GetPostById, &err),
    };
    reply.with_post(id)
}

/// `read_post_by_id.php`: a bare post summary, or `{"error": ...}`.
fn read_post_by_id(state: &ServerState, uri: &Uri) -> Reply {
    let Some(id) = query_params(uri).get("id").and_then(|value| PostId::parse_lenient(value))
    else {
        return Reply::bare_failure(StatusCode::BAD_REQUEST, "missing_id", "Post ID is required");
    };
    let reply = match run_blocking(|| state.service.get(id)) {
        Ok(post) => Reply::json(StatusCode::OK, &PostSummary::from(post)),
        Err(ServiceError::NotFound) => {
            Reply::bare_failure(StatusCode::NOT_FOUND, "not_found", "Post not found")
        }
        Err(err) => Reply::bare_failure(StatusCode::INTERNAL_SERVER_ERROR, "store", DATABASE_ERROR)
            .with_diagnostic(DiagnosticLevel::Error, err.to_string()),
    };
    reply.with_post(id)
}

// ============================================================================
// SECTION: Write Endpoints
// ============================================================================

/// `create_post.php`: form fields `title`, `content`, optional `image`.
async fn create_post(state: &ServerState, request: Request) -> Reply {
    let form = match read_post_form(request).await {
        Ok(form) => form,
        Err(reply) => return reply,
    };
    let draft = form.draft();
    match run_blocking(|| state.service.create(&draft, form.image)) {
        Ok(outcome) => {
            let id = outcome.value.id;
            Reply::json(
                StatusCode::CREATED,
                &Envelope::message("Post created successfully", outcome.value),
            )
            .with_post(id)
            .with_cleanup(QuillEndpoint::CreatePost, &outcome.cleanup)
        }
        Err(failure) => service_failure(QuillEndpoint::CreatePost, &failure),
    }
}

/// `update_post.php`: form fields `id`, `title`, `content`, optional `image`.
async fn update_post(state: &ServerState, request: Request) -> Reply {
    let form = match read_post_form(request).await {
        Ok(form) => form,
        Err(reply) => return reply,
    };
    let Some(id) = form.fields.get("id").and_then(|value| PostId::parse_lenient(value)) else {
        return service_error(QuillEndpoint::UpdatePost, &ServiceError::MissingId);
    };
    let draft = form.draft();
    let reply = match run_blocking(|| state.service.update(id, &draft, form.image)) {
        Ok(outcome) => Reply::json(
            StatusCode::OK,
            &Envelope::message("Post updated successfully", outcome.value),
        )
        .with_cleanup(QuillEndpoint::UpdatePost, &outcome.cleanup),
        Err(failure) => service_failure(QuillEndpoint::UpdatePost, &failure),
    };
    reply.with_post(id)
}

/// `delete_post.php`: JSON body `{"id": n}` with a number or numeric string.
async fn delete_post(state: &ServerState, request: Request) -> Reply {
    let body = match Bytes::from_request(request, &()).await {
        Ok(body) => body,
        Err(rejection) => return body_rejection(rejection.status()),
    };
    let Some(id) = json_post_id(&body) else {
        return service_error(QuillEndpoint::DeletePost, &ServiceError::MissingId);
    };
    let reply = match run_blocking(|| state.service.delete(id)) {
        Ok(outcome) => Reply::json(
            StatusCode::OK,
            &Envelope::message("Post deleted successfully", outcome.value),
        )
        .with_cleanup(QuillEndpoint::DeletePost, &outcome.cleanup),
        Err(failure) => service_failure(QuillEndpoint::DeletePost, &failure),
    };
    reply.with_post(id)
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

/// Maps a failed write, including its unwinding cleanup, to a reply.
fn service_failure(endpoint: QuillEndpoint, failure: &ServiceFailure) -> Reply {
    service_error(endpoint, &failure.error).with_cleanup(endpoint, &failure.cleanup)
}

/// Maps a service error to an enveloped reply.
fn service_error(endpoint: QuillEndpoint, error: &ServiceError) -> Reply {
    match error {
        ServiceError::Validation(err) => {
            Reply::failure(StatusCode::BAD_REQUEST, "validation", err.to_string())
        }
        ServiceError::MissingId => {
            Reply::failure(StatusCode::BAD_REQUEST, "missing_id", error.to_string())
        }
        ServiceError::NotFound => {
            let status = if endpoint == QuillEndpoint::GetPostById {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_REQUEST
            };
            Reply::failure(status, "not_found", error.to_string())
        }
        ServiceError::Image(ImageError::Io(detail)) => {
            Reply::failure(StatusCode::BAD_REQUEST, "image", "Image upload failed: Failed to save image")
                .with_diagnostic(DiagnosticLevel::Error, detail.clone())
        }
        ServiceError::Image(_) => Reply::failure(StatusCode::BAD_REQUEST, "image", error.to_string()),
        ServiceError::Store(err) => {
            Reply::failure(StatusCode::INTERNAL_SERVER_ERROR, "store", DATABASE_ERROR)
                .with_diagnostic(DiagnosticLevel::Error, err.to_string())
        }
    }
}

/// Maps a body extraction failure to a reply.
fn body_rejection(status: StatusCode) -> Reply {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        Reply::failure(StatusCode::PAYLOAD_TOO_LARGE, "body_too_large", "Request body too large")
    } else {
        Reply::failure(StatusCode::BAD_REQUEST, "form", "Invalid form data")
    }
}

// ============================================================================
// SECTION: Reply
// ============================================================================

/// Endpoint result before it is recorded and rendered.
struct Reply {
    /// Response status.
    status: StatusCode,
    /// JSON body; `None` renders an empty body.
    body: Option<Value>,
    /// Post the request resolved, for audit.
    post_id: Option<PostId>,
    /// Normalized error label, for audit.
    error_kind: Option<&'static str>,
    /// Internal detail to record.
    diagnostics: Vec<(DiagnosticLevel, String)>,
}

impl Reply {
    /// Empty `200` answer to `OPTIONS`.
    const fn preflight() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
            post_id: None,
            error_kind: None,
            diagnostics: Vec::new(),
        }
    }

    /// Serializes `payload` as the body.
    fn json(status: StatusCode, payload: &impl Serialize) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => Self {
                status,
                body: Some(body),
                post_id: None,
                error_kind: None,
                diagnostics: Vec::new(),
            },
            Err(err) => Self::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialization",
                "Response serialization failed",
            )
            .with_diagnostic(DiagnosticLevel::Error, err.to_string()),
        }
    }

    /// `{"success":false,"message":...}` failure.
    fn failure(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        let body = serde_json::json!({
            "success": false,
            "message": message.into(),
        });
        Self::error_body(status, kind, body)
    }

    /// `{"error":...}` failure used by `read_post_by_id.php`.
    fn bare_failure(status: StatusCode, kind: &'static str, message: &str) -> Self {
        Self::error_body(status, kind, serde_json::json!({ "error": message }))
    }

    /// Wraps a prepared error body.
    fn error_body(status: StatusCode, kind: &'static str, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
            post_id: None,
            error_kind: Some(kind),
            diagnostics: Vec::new(),
        }
    }

    /// Tags the reply with the post it concerns.
    fn with_post(mut self, id: PostId) -> Self {
        self.post_id = Some(id);
        self
    }

    /// Adds an internal diagnostic.
    fn with_diagnostic(mut self, level: DiagnosticLevel, message: impl Into<String>) -> Self {
        self.diagnostics.push((level, message.into()));
        self
    }

    /// Adds a warning per image removal that did not succeed.
    fn with_cleanup(mut self, endpoint: QuillEndpoint, cleanup: &CleanupReport) -> Self {
        for warning in cleanup.warnings() {
            self.diagnostics.push((
                DiagnosticLevel::Warn,
                format!(
                    "{}: could not delete image {}: {}",
                    endpoint.as_str(),
                    warning.image_path,
                    warning.error
                ),
            ));
        }
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => (self.status, [(CONTENT_TYPE, HeaderValue::from_static("application/json"))])
                .into_response(),
        }
    }
}

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Success envelope.
#[derive(Serialize)]
struct Envelope<T> {
    /// Always `true`.
    success: bool,
    /// Human-readable confirmation for write endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    /// Endpoint payload.
    data: T,
}

impl<T> Envelope<T> {
    /// Envelope without a message.
    const fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Envelope with a confirmation message.
    const fn message(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message: Some(message),
            data,
        }
    }
}

/// Listing envelope with paging metadata.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageEnvelope {
    /// Always `true`.
    success: bool,
    /// Posts on this page.
    data: Vec<Post>,
    /// Next page number, `null` on the last page.
    next_page: Option<u32>,
    /// Total number of posts.
    total: u64,
    /// One-based page number.
    page: u32,
    /// Posts per page.
    page_size: u32,
}

// ============================================================================
// SECTION: Input Decoding
// ============================================================================

/// Decoded post form.
#[derive(Default)]
struct PostForm {
    /// Text fields by name.
    fields: HashMap<String, String>,
    /// Image file, when the form carried one.
    image: Option<ImageUpload>,
}

impl PostForm {
    /// Builds the draft from the `title` and `content` fields.
    fn draft(&self) -> PostDraft {
        let field = |name: &str| self.fields.get(name).cloned().unwrap_or_default();
        PostDraft::new(field("title"), field("content"))
    }
}

/// Reads a multipart or url-encoded post form.
///
/// Any other content type yields an empty form, which then fails validation.
async fn read_post_form(request: Request) -> Result<PostForm, Reply> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|rejection| body_rejection(rejection.status()))?;
        read_multipart(multipart).await
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|rejection| body_rejection(rejection.status()))?;
        Ok(PostForm {
            fields,
            image: None,
        })
    } else {
        Ok(PostForm::default())
    }
}

/// Drains a multipart body into a post form. Later fields win.
async fn read_multipart(mut multipart: Multipart) -> Result<PostForm, Reply> {
    let mut form = PostForm::default();
    while let Some(field) =
        multipart.next_field().await.map_err(|err| body_rejection(err.status()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|err| body_rejection(err.status()))?;
            form.image = Some(ImageUpload::new(file_name, bytes.to_vec()));
        } else if TEXT_FIELDS.contains(&name.as_str()) {
            let text = field.text().await.map_err(|err| body_rejection(err.status()))?;
            form.fields.insert(name, text);
        } else {
            field.bytes().await.map_err(|err| body_rejection(err.status()))?;
        }
    }
    Ok(form)
}

/// Parses the query string, treating malformed input as empty.
fn query_params(uri: &Uri) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default()
}

/// Extracts the post id from a JSON body.
fn json_post_id(body: &[u8]) -> Option<PostId> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("id")? {
        Value::Number(number) => PostId::parse_lenient(&number.to_string()),
        Value::String(text) => PostId::parse_lenient(text),
        _ => None,
    }
}

/// Reads the declared request body size.
fn declared_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

/// Runs store work, shifting to a blocking context when available.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
