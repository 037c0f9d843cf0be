// crates/quill-server/tests/write_endpoints.rs
// ============================================================================
// Module: Write Endpoint Tests
// Description: Create, update, and delete over the HTTP surface.
// Purpose: Pin write envelopes, validation messages, and image handling.
// Dependencies: quill-server
// ============================================================================

//! ## Overview
//! Drives `create_post.php`, `update_post.php`, and `delete_post.php` with
//! multipart, url-encoded, and JSON bodies against in-memory backends.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use axum::http::Method;
use axum::http::StatusCode;
use quill_core::PostId;
use quill_core::PostStore;
use serde_json::Value;
use serde_json::json;

use crate::common::PNG;
use crate::common::START;
use crate::common::TestServer;
use crate::common::at;
use crate::common::form;
use crate::common::get;
use crate::common::json;
use crate::common::multipart;
use crate::common::test_server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Creates a post through the endpoint and returns its response data.
async fn create(server: &TestServer, title: &str, image: Option<(&str, &[u8])>) -> Value {
    let request = multipart(
        "/php/create_post.php",
        &[("title", title), ("content", "A body long enough to pass")],
        image,
    );
    let (status, body) = server.send_json(request).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

/// Reads a stored post's image path.
fn stored_image(server: &TestServer, id: i64) -> Option<String> {
    let id = PostId::from_raw(id).unwrap();
    server.posts.get(id).unwrap().unwrap().image_url
}

// ============================================================================
// SECTION: create_post.php
// ============================================================================

/// A multipart create stores the row and image and answers 201.
#[tokio::test]
async fn test_create_post_with_image() {
    let server = test_server();
    let request = multipart(
        "/php/create_post.php",
        &[("title", "  First post  "), ("content", "Hello from the first post")],
        Some(("photo.png", PNG)),
    );
    let (status, body) = server.send_json(request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Post created successfully");
    let data = &body["data"];
    assert_eq!(data["id"], 1);
    assert_eq!(data["title"], "First post");
    assert_eq!(data["content"], "Hello from the first post");
    assert_eq!(data["created_at"], at(START).to_string());
    let image_url = data["image_url"].as_str().unwrap();
    assert!(image_url.starts_with(&format!("uploads/post_{START}_")), "{image_url}");
    assert!(image_url.ends_with(".png"), "{image_url}");
    assert!(server.images.contains(image_url));

    let stored = server.posts.get(PostId::from_raw(1).unwrap()).unwrap().unwrap();
    assert_eq!(stored.author, "Admin");
    assert_eq!(stored.image_url.as_deref(), Some(image_url));
}

/// A file field with no selection creates a post without an image.
#[tokio::test]
async fn test_create_post_empty_file_selection() {
    let server = test_server();
    let data = create(&server, "No picture", Some(("", b""))).await;
    assert_eq!(data["image_url"], Value::Null);
    assert!(server.images.is_empty());
}

/// Url-encoded forms are accepted.
#[tokio::test]
async fn test_create_post_urlencoded() {
    let server = test_server();
    let request =
        form("/php/create_post.php", "title=Form+post&content=Posted+as+a+plain+form");
    let (status, body) = server.send_json(request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], "Form post");
}

/// Validation failures answer 400 and store nothing.
#[tokio::test]
async fn test_create_post_validation_messages() {
    let server = test_server();
    let cases = [
        (("ab", "Content that is long enough"), "Title is required and must be at least 3 characters"),
        (("   ", "Content that is long enough"), "Title is required and must be at least 3 characters"),
        (("Fine title", "too short"), "Content is required and must be at least 10 characters"),
    ];
    for ((title, content), message) in cases {
        let request =
            multipart("/php/create_post.php", &[("title", title), ("content", content)], None);
        let (status, body) = server.send_json(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{title}");
        assert_eq!(body, json!({"success": false, "message": message}));
    }
    assert_eq!(server.posts.count().unwrap(), 0);
}

/// A body with no form content type fails title validation.
#[tokio::test]
async fn test_create_post_json_body_is_not_a_form() {
    let server = test_server();
    let request = json(
        Method::POST,
        "/php/create_post.php",
        r#"{"title":"JSON title","content":"JSON content body"}"#,
    );
    let (status, body) = server.send_json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Title is required and must be at least 3 characters");
}

/// Non-image uploads are rejected before any row is written.
#[tokio::test]
async fn test_create_post_rejects_non_image() {
    let server = test_server();
    let request = multipart(
        "/php/create_post.php",
        &[("title", "With text file"), ("content", "Body that is long enough")],
        Some(("notes.png", b"plain text, not an image")),
    );
    let (status, body) = server.send_json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Image upload failed: Invalid image format. Allowed: JPEG, PNG, GIF, WebP"
    );
    assert_eq!(server.posts.count().unwrap(), 0);
    assert!(server.images.is_empty());
}

/// Uploads over the image ceiling report the ceiling in MB.
#[tokio::test]
async fn test_create_post_rejects_oversized_image() {
    let mut config = quill_config::QuillConfig::default();
    config.uploads.max_image_bytes = 1024 * 1024;
    let server = common::test_server_with(config);
    let mut big = PNG.to_vec();
    big.resize(1024 * 1024 + 1, 0);
    let request = multipart(
        "/php/create_post.php",
        &[("title", "Big picture"), ("content", "Body that is long enough")],
        Some(("big.png", &big)),
    );
    let (status, body) = server.send_json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Image upload failed: File size must not exceed 1MB");
}

// ============================================================================
// SECTION: update_post.php
// ============================================================================

/// Updating with a new image replaces and removes the old one.
#[tokio::test]
async fn test_update_post_replaces_image() {
    let server = test_server();
    let created = create(&server, "Original", Some(("one.png", PNG))).await;
    let old_image = created["image_url"].as_str().unwrap().to_string();
    server.clock.set(at(START + 60));

    let request = multipart(
        "/php/update_post.php",
        &[("id", "1"), ("title", "Edited"), ("content", "Edited body content")],
        Some(("two.png", PNG)),
    );
    let (status, body) = server.send_json(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post updated successfully");
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["title"], "Edited");
    assert_eq!(body["data"]["updated_at"], at(START + 60).to_string());
    let new_image = body["data"]["image_url"].as_str().unwrap();
    assert_ne!(new_image, old_image);
    assert!(server.images.contains(new_image));
    assert!(!server.images.contains(&old_image));
    assert_eq!(server.images.deleted(), vec![old_image]);
    assert_eq!(stored_image(&server, 1).as_deref(), Some(new_image));
}

/// Updating without a file keeps the current image.
#[tokio::test]
async fn test_update_post_keeps_image_without_upload() {
    let server = test_server();
    let created = create(&server, "Original", Some(("one.png", PNG))).await;
    let image = created["image_url"].as_str().unwrap().to_string();

    let request = multipart(
        "/php/update_post.php",
        &[("id", "1"), ("title", "Edited"), ("content", "Edited body content")],
        None,
    );
    let (status, body) = server.send_json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["image_url"], image.as_str());
    assert!(server.images.contains(&image));
    assert!(server.images.deleted().is_empty());
}

/// A missing id is reported before field validation.
#[tokio::test]
async fn test_update_post_requires_id() {
    let server = test_server();
    let request = multipart("/php/update_post.php", &[("title", "x")], None);
    let (status, body) = server.send_json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "message": "Post ID is required"}));
}

/// An unknown id answers 400, and an uploaded image is not kept.
#[tokio::test]
async fn test_update_post_unknown_id() {
    let server = test_server();
    let request = multipart(
        "/php/update_post.php",
        &[("id", "99"), ("title", "Edited"), ("content", "Edited body content")],
        Some(("two.png", PNG)),
    );
    let (status, body) = server.send_json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "message": "Post not found"}));
    assert!(server.images.is_empty());
}

/// Update validation uses the same messages as create.
#[tokio::test]
async fn test_update_post_validation() {
    let server = test_server();
    create(&server, "Original", None).await;
    let request = multipart(
        "/php/update_post.php",
        &[("id", "1"), ("title", "Edited"), ("content", "short")],
        None,
    );
    let (status, body) = server.send_json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Content is required and must be at least 10 characters");
}

// ============================================================================
// SECTION: delete_post.php
// ============================================================================

/// Deleting removes the row and its image.
#[tokio::test]
async fn test_delete_post_removes_row_and_image() {
    let server = test_server();
    let created = create(&server, "Doomed", Some(("one.png", PNG))).await;
    let image = created["image_url"].as_str().unwrap().to_string();

    let (status, body) =
        server.send_json(json(Method::DELETE, "/php/delete_post.php", r#"{"id": 1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "Post deleted successfully", "data": {"id": 1}})
    );
    assert!(!server.images.contains(&image));

    let (status, _) = server.send_json(get("/php/get_post_by_id.php?id=1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// POST with a numeric string id also deletes.
#[tokio::test]
async fn test_delete_post_accepts_post_and_string_id() {
    let server = test_server();
    create(&server, "Doomed", None).await;
    let (status, body) =
        server.send_json(json(Method::POST, "/php/delete_post.php", r#"{"id": "1"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(server.posts.count().unwrap(), 0);
}

/// Missing, malformed, and unknown ids answer 400.
#[tokio::test]
async fn test_delete_post_errors() {
    let server = test_server();
    for payload in ["", "not json", r#"{"post": 1}"#, r#"{"id": 0}"#] {
        let (status, body) =
            server.send_json(json(Method::DELETE, "/php/delete_post.php", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["message"], "Post ID is required", "{payload}");
    }
    let (status, body) =
        server.send_json(json(Method::DELETE, "/php/delete_post.php", r#"{"id": 5}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Post not found");
}
