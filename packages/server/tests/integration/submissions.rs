use serde_json::json;

use crate::common::{PNG, TestApp, routes};

#[tokio::test]
async fn submissions_open_by_default() {
    let app = TestApp::spawn().await;
    let res = app.get_without_token(routes::SUBMISSIONS_STATUS).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["submissionsEnabled"], true);
}

#[tokio::test]
async fn closed_submissions_reject_uploads() {
    let app = TestApp::spawn().await;
    app.set_submissions(false).await;

    let res = app.upload("flyer.png", "image/png", PNG.to_vec(), None).await;
    assert_eq!(res.status, 503);
    assert_eq!(res.code(), "SUBMISSIONS_DISABLED");

    let all = app
        .get_with_token(routes::LIST_IMAGES, &app.moderator_token())
        .await;
    assert_eq!(all.body["total"], 0);

    let status = app.get_without_token(routes::SUBMISSIONS_STATUS).await;
    assert_eq!(status.body["submissionsEnabled"], false);
}

#[tokio::test]
async fn reopening_accepts_uploads_again() {
    let app = TestApp::spawn().await;
    app.set_submissions(false).await;
    app.set_submissions(true).await;

    let res = app.upload("flyer.png", "image/png", PNG.to_vec(), None).await;
    assert_eq!(res.status, 201, "{}", res.text);
}

#[tokio::test]
async fn flag_file_edited_by_hand_is_honored() {
    let app = TestApp::spawn().await;
    std::fs::write(
        &app.state.config.submissions.flag_path,
        br#"{"submissionsEnabled": false}"#,
    )
    .unwrap();

    let res = app.upload("flyer.png", "image/png", PNG.to_vec(), None).await;
    assert_eq!(res.status, 503);
}

#[tokio::test]
async fn changing_status_requires_moderator() {
    let app = TestApp::spawn().await;

    let res = app
        .put_without_token(routes::SUBMISSIONS_STATUS, &json!({ "submissionsEnabled": false }))
        .await;
    assert_eq!(res.status, 401);

    let res = app
        .put_with_token(
            routes::SUBMISSIONS_STATUS,
            &json!({ "submissionsEnabled": false }),
            &app.visitor_token(),
        )
        .await;
    assert_eq!(res.status, 403);

    let status = app.get_without_token(routes::SUBMISSIONS_STATUS).await;
    assert_eq!(status.body["submissionsEnabled"], true);
}

#[tokio::test]
async fn malformed_status_body_is_rejected() {
    let app = TestApp::spawn().await;
    let res = app
        .put_with_token(
            routes::SUBMISSIONS_STATUS,
            &json!({ "submissionsEnabled": "nope" }),
            &app.moderator_token(),
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
}
