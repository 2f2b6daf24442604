use crate::common::{JPEG, PNG, TestApp, routes};

#[tokio::test]
async fn image_response_headers() {
    let app = TestApp::spawn().await;
    let id = app.upload_png("flyer.png").await;

    let res = app.get_raw(&routes::image(&id), None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.header("content-type"), Some("image/png"));
    assert_eq!(
        res.header("content-length"),
        Some(PNG.len().to_string().as_str())
    );
    assert_eq!(res.header("etag"), Some(format!("\"{id}\"").as_str()));
    assert!(
        res.header("content-disposition")
            .unwrap()
            .starts_with("inline; filename=\"flyer.png\"")
    );
}

#[tokio::test]
async fn matching_etag_returns_not_modified() {
    let app = TestApp::spawn().await;
    let id = app.upload_png("flyer.png").await;

    let res = app
        .get_raw(&routes::image(&id), Some(&format!("\"{id}\"")))
        .await;
    assert_eq!(res.status, 304);
    assert!(res.bytes.is_empty());
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let app = TestApp::spawn().await;
    let res = app
        .get_without_token(&routes::image("01936f0e-1234-7abc-8000-000000000001"))
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let app = TestApp::spawn().await;
    let res = app.get_without_token(&routes::image("not-a-uuid")).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn by_name_returns_latest_upload() {
    let app = TestApp::spawn().await;
    app.upload_png("poster.png").await;
    let res = app
        .upload("poster.jpg", "image/jpeg", JPEG.to_vec(), None)
        .await;
    assert_eq!(res.status, 201);

    // Same display name, different content: the newest wins.
    let mut newer = PNG.to_vec();
    newer.extend_from_slice(b"v2");
    let res = app.upload("poster.png", "image/png", newer.clone(), None).await;
    assert_eq!(res.status, 201);

    let fetched = app.get_raw(&routes::image_by_name("poster.png"), None).await;
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.bytes, newer);
}

#[tokio::test]
async fn by_name_unknown_is_not_found() {
    let app = TestApp::spawn().await;
    let res = app
        .get_without_token(&routes::image_by_name("missing.png"))
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn approved_list_is_empty_with_message() {
    let app = TestApp::spawn().await;
    let res = app.get_without_token(routes::LIST_APPROVED).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["total"], 0);
    assert!(res.body["slides"].as_array().unwrap().is_empty());
    assert!(res.body["message"].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;
    let res = app.get_without_token("/api-docs/openapi.json").await;
    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/upload"].is_object());
    assert!(res.body["paths"]["/approve-slide/{id}"].is_object());
}
