use serde_json::json;

use crate::common::{TestApp, routes};

mod authorization {
    use super::*;

    #[tokio::test]
    async fn list_images_requires_token() {
        let app = TestApp::spawn().await;
        let res = app.get_without_token(routes::LIST_IMAGES).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let app = TestApp::spawn().await;
        let res = app.get_with_token(routes::LIST_IMAGES, "not.a.jwt").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_without_permission_is_forbidden() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;
        let token = app.visitor_token();

        let res = app.get_with_token(routes::LIST_IMAGES, &token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "PERMISSION_DENIED");

        let res = app
            .put_with_token(&routes::approve(&id), &json!({}), &token)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn decline_requires_token() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;
        let res = app.put_without_token(&routes::decline(&id), &json!({})).await;
        assert_eq!(res.status, 401);
    }
}

mod approval {
    use super::*;

    #[tokio::test]
    async fn approve_is_idempotent() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;
        let token = app.moderator_token();

        for _ in 0..2 {
            let res = app
                .put_with_token(&routes::approve(&id), &json!({}), &token)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.body["matchedCount"], 1);
            assert_eq!(res.body["message"], "Slide approved");
        }
    }

    #[tokio::test]
    async fn public_list_shows_only_approved() {
        let app = TestApp::spawn().await;
        let first = app.upload_png("first.png").await;
        let second = app.upload_png("second.png").await;
        let token = app.moderator_token();

        let res = app
            .put_with_token(&routes::approve(&second), &json!({}), &token)
            .await;
        assert_eq!(res.status, 200);

        let public = app.get_without_token(routes::LIST_APPROVED).await;
        assert_eq!(public.body["total"], 1);
        assert_eq!(public.body["slides"][0]["fileId"], second.as_str());
        assert_eq!(public.body["slides"][0]["status"], "approved");
        assert!(public.body.get("message").is_none());

        let all = app.get_with_token(routes::LIST_IMAGES, &token).await;
        assert_eq!(all.body["total"], 2);
        assert_eq!(all.body["slides"][0]["fileId"], first.as_str());
        assert_eq!(all.body["slides"][1]["fileId"], second.as_str());
    }

    #[tokio::test]
    async fn decline_hides_slide_again() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;
        let token = app.moderator_token();

        app.put_with_token(&routes::approve(&id), &json!({}), &token)
            .await;
        let res = app
            .put_with_token(&routes::decline(&id), &json!({}), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["matchedCount"], 1);
        assert_eq!(res.body["message"], "Slide declined");

        let public = app.get_without_token(routes::LIST_APPROVED).await;
        assert_eq!(public.body["total"], 0);
    }

    #[tokio::test]
    async fn decline_unknown_id_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .put_with_token(
                &routes::decline("01936f0e-1234-7abc-8000-000000000001"),
                &json!({}),
                &app.moderator_token(),
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }
}

mod department {
    use super::*;

    #[tokio::test]
    async fn edit_department_updates_record() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;
        let token = app.moderator_token();

        let res = app
            .put_with_token(
                &routes::edit_department(&id),
                &json!({ "department": "Mathematics" }),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["matchedCount"], 1);

        let all = app.get_with_token(routes::LIST_IMAGES, &token).await;
        assert_eq!(all.body["slides"][0]["department"], "Mathematics");
    }

    #[tokio::test]
    async fn blank_department_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;

        let res = app
            .put_with_token(
                &routes::edit_department(&id),
                &json!({ "department": "   " }),
                &app.moderator_token(),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_field_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;

        let res = app
            .put_with_token(
                &routes::edit_department(&id),
                &json!({ "dept": "Physics" }),
                &app.moderator_token(),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_removes_image_and_record() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;
        let token = app.moderator_token();

        let res = app.delete_with_token(&routes::delete(&id), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Slide deleted");

        let image = app.get_without_token(&routes::image(&id)).await;
        assert_eq!(image.status, 404);

        let all = app.get_with_token(routes::LIST_IMAGES, &token).await;
        assert_eq!(all.body["total"], 0);

        let again = app.delete_with_token(&routes::delete(&id), &token).await;
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn delete_cleans_record_whose_image_is_gone() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;
        let token = app.moderator_token();

        let blob_id = ::common::storage::BlobId::parse(&id).unwrap();
        assert!(app.state.blobs.delete(&blob_id).await.unwrap());

        let res = app.delete_with_token(&routes::delete(&id), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let all = app.get_with_token(routes::LIST_IMAGES, &token).await;
        assert_eq!(all.body["total"], 0);
    }
}
