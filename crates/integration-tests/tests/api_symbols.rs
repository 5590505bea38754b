use axum::http::{Method, StatusCode};
use integration_tests::{TestApp, PLACEHOLDER};
use serde_json::json;

#[tokio::test]
async fn duplicate_titles_are_rejected_but_duplication_is_not() {
    let app = TestApp::spawn().await;
    let first = app.create_symbol(json!({ "title": "Header A" })).await;

    let res = app.post("/api/v1/symbols", json!({ "title": "Header A" })).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["code"], "rest_cannot_create_post");
    assert_eq!(res.body["data"]["status"], 409);

    let res = app
        .post("/api/v1/symbols", json!({ "title": "Header A", "old_id": first }))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let new_id = res.body["id"].as_i64().unwrap();
    assert_eq!(res.body["title"], format!("Header A_{new_id}"));
}

#[tokio::test]
async fn duplicate_rename_avoids_existing_titles() {
    let app = TestApp::spawn().await;
    let source = app.create_symbol(json!({ "title": "Header A" })).await;
    // the duplicate below will get id source + 2
    let taken = format!("Header A_{}", source + 2);
    app.create_symbol(json!({ "title": &taken })).await;

    let res = app
        .post("/api/v1/symbols", json!({ "title": "Header A", "old_id": source }))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["id"], source + 2);
    assert_eq!(res.body["title"], format!("{taken}_2"));
}

#[tokio::test]
async fn raw_title_objects_are_checked_too() {
    let app = TestApp::spawn().await;
    app.create_symbol(json!({ "title": { "raw": "Footer" } })).await;

    let res = app.post("/api/v1/symbols", json!({ "title": "Footer" })).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn trashed_titles_can_be_reused() {
    let app = TestApp::spawn().await;
    let id = app.create_symbol(json!({ "title": "Banner" })).await;

    let res = app.delete(&format!("/api/v1/symbols/{id}")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "trash");

    app.create_symbol(json!({ "title": "Banner" })).await;
}

#[tokio::test]
async fn restoring_a_trashed_symbol_respects_live_titles() {
    let app = TestApp::spawn().await;
    let old = app.create_symbol(json!({ "title": "Banner" })).await;
    app.delete(&format!("/api/v1/symbols/{old}")).await;
    app.create_symbol(json!({ "title": "Banner" })).await;
    let uri = format!("/api/v1/symbols/{old}");

    let res = app.json(Method::PUT, &uri, Some(json!({ "status": "publish" }))).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(app.get(&uri).await.body["status"], "trash");

    let res = app
        .json(Method::PUT, &uri, Some(json!({ "status": "publish", "title": "Banner (old)" })))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "publish");
}

#[tokio::test]
async fn update_checks_titles_against_other_symbols_only() {
    let app = TestApp::spawn().await;
    app.create_symbol(json!({ "title": "One" })).await;
    let two = app.create_symbol(json!({ "title": "Two" })).await;
    let uri = format!("/api/v1/symbols/{two}");

    let res = app.json(Method::PUT, &uri, Some(json!({ "title": "One" }))).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .json(Method::PATCH, &uri, Some(json!({ "title": "Two", "tve_updated_post": "<p>hi</p>" })))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["tve_updated_post"], "<p>hi</p>");
}

#[tokio::test]
async fn duplicating_copies_the_thumbnail_byte_for_byte() {
    let app = TestApp::spawn().await;
    let source = app.create_symbol(json!({ "title": "Hero" })).await;
    app.put_thumb_file(source, b"\x89PNG fake thumbnail bytes");

    let copy = app
        .create_symbol(json!({ "title": "Hero", "old_id": source }))
        .await;

    assert_eq!(
        std::fs::read(app.thumb_path(copy)).unwrap(),
        std::fs::read(app.thumb_path(source)).unwrap()
    );
    let res = app.get(&format!("/api/v1/symbols/{copy}")).await;
    assert_eq!(res.body["thumb_url"], format!("/uploads/symbols/{copy}.png"));
}

#[tokio::test]
async fn duplicating_without_thumbnail_creates_no_file() {
    let app = TestApp::spawn().await;
    let source = app.create_symbol(json!({ "title": "Plain" })).await;

    let res = app
        .post("/api/v1/symbols", json!({ "title": "Plain", "old_id": source }))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);

    let copy = res.body["id"].as_i64().unwrap();
    assert!(!app.thumb_path(copy).exists());
    assert_eq!(res.body["thumb_url"], PLACEHOLDER);
}

#[tokio::test]
async fn failed_thumbnail_copy_is_a_server_error_after_the_rename() {
    let app = TestApp::spawn().await;
    let source = app.create_symbol(json!({ "title": "Hero" })).await;
    app.put_thumb_file(source, b"png");
    // the next symbol gets id source + 1; a directory in its place makes the copy fail
    std::fs::create_dir_all(app.thumb_path(source + 1)).unwrap();

    let res = app
        .post("/api/v1/symbols", json!({ "title": "Hero", "old_id": source }))
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["code"], "could_not_generate_file");

    let res = app.get(&format!("/api/v1/symbols/{}", source + 1)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["title"], format!("Hero_{}", source + 1));
}

#[tokio::test]
async fn css_ids_are_rewritten_on_duplicate() {
    let app = TestApp::spawn().await;
    let source = app
        .create_symbol(json!({ "title": "Card", "tve_custom_css": "#tve-1-block{color:red}" }))
        .await;
    assert_eq!(source, 1);

    let res = app
        .post(
            "/api/v1/symbols",
            json!({ "title": "Card", "old_id": source, "tve_custom_css": "#tve-1-block{color:red}" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["id"], 2);
    assert_eq!(res.body["tve_custom_css"], "#tve-2-block{color:red}");
}

#[tokio::test]
async fn move_symbol_is_exclusive_and_validated() {
    let app = TestApp::spawn().await;
    let headers = app.create_category("Headers").await;
    let footers = app.create_category("Footers").await;
    let id = app.create_symbol(json!({ "title": "Nav", "move_symbol": headers })).await;
    let uri = format!("/api/v1/symbols/{id}");

    let res = app.get(&uri).await;
    assert_eq!(res.body["categories"], json!([{ "id": headers, "name": "Headers", "slug": "headers" }]));

    let res = app.post(&uri, json!({ "move_symbol": footers })).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["categories"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["categories"][0]["name"], "Footers");

    let res = app.post(&uri, json!({ "move_symbol": 999 })).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["code"], "rest_term_invalid");
    assert_eq!(app.get(&uri).await.body["categories"][0]["name"], "Footers");

    let res = app.post(&uri, json!({ "move_symbol": 0 })).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["categories"], json!([]));
}

#[tokio::test]
async fn list_filters_and_reports_totals() {
    let app = TestApp::spawn().await;
    let headers = app.create_category("Headers").await;
    for i in 0..3 {
        app.create_symbol(json!({ "title": format!("Header {i}"), "move_symbol": headers }))
            .await;
    }
    app.create_symbol(json!({ "title": "Loose" })).await;

    let res = app.get("/api/v1/symbols?per_page=2").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers["x-total-count"], "4");
    assert_eq!(res.headers["x-total-pages"], "2");
    assert_eq!(res.body.as_array().unwrap().len(), 2);

    let res = app.get(&format!("/api/v1/symbols?category={headers}")).await;
    assert_eq!(res.headers["x-total-count"], "3");

    let res = app.get("/api/v1/symbols?category=0").await;
    assert_eq!(res.body[0]["title"], "Loose");
}

#[tokio::test]
async fn delete_trashes_then_removes() {
    let app = TestApp::spawn().await;
    let id = app.create_symbol(json!({ "title": "Temp" })).await;
    app.put_thumb_file(id, b"png");
    let uri = format!("/api/v1/symbols/{id}");

    assert_eq!(app.delete(&uri).await.status, StatusCode::OK);
    let res = app.delete(&uri).await;
    assert_eq!(res.status, StatusCode::GONE);

    let res = app.delete(&format!("{uri}?force=true")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["title"], "Temp");
    assert!(!app.thumb_path(id).exists());
    assert_eq!(app.get(&uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_symbol_is_not_found() {
    let app = TestApp::spawn().await;
    let res = app.get("/api/v1/symbols/41").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["code"], "rest_post_invalid_id");
}
