use crate::common::{JPEG, PNG, TestApp, routes};

mod accepted {
    use super::*;

    #[tokio::test]
    async fn png_upload_is_stored_pending() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("Career Fair.png", "image/png", PNG.to_vec(), Some("Spring fair"))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["message"], "Image uploaded successfully");
        assert_eq!(res.body["file"]["filename"], "Career_Fair.png");
        assert_eq!(res.body["file"]["contentType"], "image/png");
        assert_eq!(res.body["file"]["length"], PNG.len());
        assert_eq!(res.body["metadata"]["description"], "Spring fair");
        assert_eq!(res.body["metadata"]["approved"], false);
    }

    #[tokio::test]
    async fn jpeg_extension_is_normalized() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("photo.JPEG", "image/jpeg", JPEG.to_vec(), None)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file"]["filename"], "photo.jpg");
        assert_eq!(res.body["file"]["contentType"], "image/jpeg");
        assert_eq!(res.body["metadata"]["description"], "");
    }

    #[tokio::test]
    async fn uploaded_bytes_round_trip() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;

        let res = app.get_raw(&routes::image(&id), None).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, PNG);
        assert_eq!(res.header("content-type"), Some("image/png"));
    }

    #[tokio::test]
    async fn new_upload_is_listed_for_moderators_only() {
        let app = TestApp::spawn().await;
        let id = app.upload_png("flyer.png").await;

        let all = app
            .get_with_token(routes::LIST_IMAGES, &app.moderator_token())
            .await;
        assert_eq!(all.status, 200);
        assert_eq!(all.body["total"], 1);
        assert_eq!(all.body["slides"][0]["fileId"], id.as_str());
        assert_eq!(all.body["slides"][0]["department"], "N/A");
        assert_eq!(all.body["slides"][0]["status"], "pending");

        let public = app.get_without_token(routes::LIST_APPROVED).await;
        assert_eq!(public.body["total"], 0);
    }

    #[tokio::test]
    async fn concurrent_same_name_uploads_both_succeed() {
        let app = TestApp::spawn().await;

        let (a, b) = tokio::join!(
            app.upload("same.png", "image/png", PNG.to_vec(), None),
            app.upload("same.png", "image/png", PNG.to_vec(), None),
        );
        assert_eq!(a.status, 201, "{}", a.text);
        assert_eq!(b.status, 201, "{}", b.text);
        assert_ne!(a.file_id(), b.file_id());

        let all = app
            .get_with_token(routes::LIST_IMAGES, &app.moderator_token())
            .await;
        assert_eq!(all.body["total"], 2);
    }
}

mod rejected {
    use super::*;

    #[tokio::test]
    async fn missing_file_field() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new().text("description", "no file here");

        let res = app.upload_form(form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "NO_FILE");
    }

    #[tokio::test]
    async fn empty_file() {
        let app = TestApp::spawn().await;
        let res = app.upload("empty.png", "image/png", Vec::new(), None).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "NO_FILE");
    }

    #[tokio::test]
    async fn disallowed_type() {
        let app = TestApp::spawn().await;
        let res = app
            .upload("anim.gif", "image/gif", b"GIF89a....".to_vec(), None)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "UNSUPPORTED_TYPE");
    }

    #[tokio::test]
    async fn extension_disagrees_with_declared_type() {
        let app = TestApp::spawn().await;
        let res = app.upload("flyer.jpg", "image/png", PNG.to_vec(), None).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "UNSUPPORTED_TYPE");
    }

    #[tokio::test]
    async fn signature_wins_over_declared_type() {
        let app = TestApp::spawn().await;
        let res = app.upload("x.png", "image/png", JPEG.to_vec(), None).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "SIGNATURE_MISMATCH");

        let all = app
            .get_with_token(routes::LIST_IMAGES, &app.moderator_token())
            .await;
        assert_eq!(all.body["total"], 0);
    }

    #[tokio::test]
    async fn text_disguised_as_png() {
        let app = TestApp::spawn().await;
        let res = app
            .upload("notes.png", "image/png", b"hello world".to_vec(), None)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "SIGNATURE_MISMATCH");
    }
}

mod size_limit {
    use super::*;

    const LIMIT: u64 = 256;

    fn png_of_len(len: usize) -> Vec<u8> {
        let mut bytes = PNG.to_vec();
        bytes.resize(len, 0);
        bytes
    }

    #[tokio::test]
    async fn exactly_max_is_accepted() {
        let app = TestApp::spawn_with(|c| c.upload.max_bytes = LIMIT).await;
        let res = app
            .upload("big.png", "image/png", png_of_len(LIMIT as usize), None)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file"]["length"], LIMIT);
    }

    #[tokio::test]
    async fn one_over_max_is_rejected() {
        let app = TestApp::spawn_with(|c| c.upload.max_bytes = LIMIT).await;
        let res = app
            .upload("big.png", "image/png", png_of_len(LIMIT as usize + 1), None)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "PAYLOAD_TOO_LARGE");

        let all = app
            .get_with_token(routes::LIST_IMAGES, &app.moderator_token())
            .await;
        assert_eq!(all.body["total"], 0);
    }
}
