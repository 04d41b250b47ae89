use std::sync::Arc;

use reqwest::Method;
use reqwest::multipart::Form;
use serde_json::json;

use crate::common::{TestApp, TestOptions, UnreachableBlobStore, base_form, image_part, routes};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-png-body";
const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

mod image_lifecycle {
    use super::*;

    #[tokio::test]
    async fn none_then_inline_then_upload() {
        let app = TestApp::spawn().await;

        let id = app.create_portfolio("Gallery", "AI/ML", false).await;
        let res = app.get(&routes::portfolio(&id)).await;
        assert_eq!(res.body["data"]["imageUrl"], "");

        let res = app
            .put(&routes::portfolio(&id), &json!({ "imageBase64": PNG_URI }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["imageUrl"], PNG_URI);
        assert_eq!(res.body["data"]["imageBase64"], PNG_URI);

        let form = Form::new().part("image", image_part(PNG_BYTES, "shot.png", "image/png"));
        let res = app
            .send_form(Method::PUT, &routes::portfolio(&id), form)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let data = &res.body["data"];
        assert!(data["imageBase64"].is_null());
        let image_id = data["imageId"].as_str().expect("imageId").to_string();
        assert_eq!(data["imageUrl"], format!("/portfolio/image/{image_id}"));

        let res = app
            .client
            .get(app.url(&format!("/portfolio/image/{image_id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(res.headers()["content-type"], "image/png");
        assert_eq!(
            res.headers()["content-length"],
            PNG_BYTES.len().to_string().as_str()
        );
        assert_eq!(res.headers()["cache-control"], "public, max-age=31536000");
        assert_eq!(res.bytes().await.unwrap().as_ref(), PNG_BYTES);
    }

    #[tokio::test]
    async fn create_with_multipart_upload() {
        let app = TestApp::spawn().await;

        let form = base_form("Uploaded", "Mobile App")
            .text("tags", "Flutter, Dart")
            .text("featured", "true")
            .part("image", image_part(PNG_BYTES, "app.png", "image/png"));
        let res = app.send_form(Method::POST, routes::PORTFOLIOS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let data = &res.body["data"];
        assert_eq!(data["tags"], json!(["Flutter", "Dart"]));
        assert_eq!(data["featured"], true);
        assert!(data["imageId"].is_string());
        assert_eq!(app.count_rows("image_file").await, 1);
    }

    #[tokio::test]
    async fn replacing_upload_releases_previous_blob() {
        let app = TestApp::spawn().await;

        let form = base_form("Swap", "Other")
            .part("image", image_part(PNG_BYTES, "a.png", "image/png"));
        let res = app.send_form(Method::POST, routes::PORTFOLIOS, form).await;
        let id = res.id();
        let first_image = res.body["data"]["imageId"].as_str().unwrap().to_string();

        let form = Form::new().part("image", image_part(b"second-image", "b.png", "image/png"));
        let res = app
            .send_form(Method::PUT, &routes::portfolio(&id), form)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(app.count_rows("image_file").await, 1);
        let res = app.get(&format!("/portfolio/image/{first_image}")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_releases_blob() {
        let app = TestApp::spawn().await;

        let form = base_form("Temporary", "Other")
            .part("image", image_part(PNG_BYTES, "t.png", "image/png"));
        let res = app.send_form(Method::POST, routes::PORTFOLIOS, form).await;
        let id = res.id();
        let image_id = res.body["data"]["imageId"].as_str().unwrap().to_string();

        let res = app.delete(&routes::portfolio(&id)).await;
        assert_eq!(res.status, 200);

        assert_eq!(app.count_rows("image_file").await, 0);
        let res = app.get(&format!("/portfolio/image/{image_id}")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn shared_bytes_survive_until_last_reference() {
        let app = TestApp::spawn().await;

        let mut ids = Vec::new();
        for title in ["One", "Two"] {
            let form = base_form(title, "Other")
                .part("image", image_part(PNG_BYTES, "same.png", "image/png"));
            let res = app.send_form(Method::POST, routes::PORTFOLIOS, form).await;
            ids.push((
                res.id(),
                res.body["data"]["imageId"].as_str().unwrap().to_string(),
            ));
        }

        app.delete(&routes::portfolio(&ids[0].0)).await;

        let res = app.get(&format!("/portfolio/image/{}", ids[1].1)).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn concurrent_delete_and_create_with_same_bytes_keep_new_image() {
        let app = TestApp::spawn().await;

        for round in 0..25 {
            let form = base_form("Old", "Other")
                .part("image", image_part(PNG_BYTES, "same.png", "image/png"));
            let old_id = app
                .send_form(Method::POST, routes::PORTFOLIOS, form)
                .await
                .id();

            let old_path = routes::portfolio(&old_id);
            let delete = app.delete(&old_path);
            let create = app.send_form(
                Method::POST,
                routes::PORTFOLIOS,
                base_form("New", "Other")
                    .part("image", image_part(PNG_BYTES, "same.png", "image/png")),
            );
            let (deleted, created) = tokio::join!(delete, create);
            assert_eq!(deleted.status, 200, "round {round}: {}", deleted.text);
            assert_eq!(created.status, 201, "round {round}: {}", created.text);

            let image_id = created.body["data"]["imageId"].as_str().unwrap();
            let res = app
                .client
                .get(app.url(&format!("/portfolio/image/{image_id}")))
                .send()
                .await
                .unwrap();
            assert_eq!(res.status().as_u16(), 200, "round {round}");
            assert_eq!(res.bytes().await.unwrap().as_ref(), PNG_BYTES);

            app.delete(&routes::portfolio(&created.id())).await;
        }
    }
}

mod image_validation {
    use super::*;

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let app = TestApp::spawn().await;

        let form = base_form("Doc", "Other")
            .part("image", image_part(b"%PDF-1.4", "doc.pdf", "application/pdf"));
        let res = app.send_form(Method::POST, routes::PORTFOLIOS, form).await;

        assert_eq!(res.status, 400);
        assert!(res.details().contains(&"Only image files are allowed".to_string()));
        assert_eq!(app.count_rows("portfolio").await, 0);
    }

    #[tokio::test]
    async fn create_prefers_upload_over_inline() {
        let app = TestApp::spawn().await;

        let form = base_form("Both", "Other")
            .text("imageBase64", PNG_URI)
            .part("image", image_part(PNG_BYTES, "x.png", "image/png"));
        let res = app.send_form(Method::POST, routes::PORTFOLIOS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let data = &res.body["data"];
        assert!(data["imageBase64"].is_null());
        let image_id = data["imageId"].as_str().expect("imageId");
        assert_eq!(data["imageUrl"], format!("/portfolio/image/{image_id}"));
        assert_eq!(app.count_rows("image_file").await, 1);
    }

    #[tokio::test]
    async fn update_with_upload_and_inline_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_portfolio("Both", "Other", false).await;

        let form = Form::new()
            .text("imageBase64", PNG_URI)
            .part("image", image_part(PNG_BYTES, "x.png", "image/png"));
        let res = app
            .send_form(Method::PUT, &routes::portfolio(&id), form)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.details(),
            vec!["Provide either an image file or imageBase64, not both"]
        );
        assert_eq!(app.count_rows("image_file").await, 0);
    }

    #[tokio::test]
    async fn malformed_inline_image_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::PORTFOLIOS,
                &json!({
                    "title": "Bad inline",
                    "description": "desc",
                    "category": "Other",
                    "imageBase64": "data:text/plain;base64,aGVsbG8=",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.details().len(), 1, "{}", res.text);
    }

    #[tokio::test]
    async fn malformed_or_unknown_image_ids_are_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get("/portfolio/image/garbage").await;
        assert_eq!(res.status, 404);

        let res = app
            .get("/portfolio/image/01936f0e-1234-7abc-8000-000000000001")
            .await;
        assert_eq!(res.status, 404);
    }
}

mod image_size_limit {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    async fn spawn_with_limit(max_image_size: u64) -> TestApp {
        TestApp::spawn_with(TestOptions {
            max_image_size,
            ..Default::default()
        })
        .await
    }

    #[tokio::test]
    async fn smaller_limit_applies_to_uploads_and_inline_images() {
        let app = spawn_with_limit(64).await;

        let form = base_form("Small", "Other")
            .part("image", image_part(&[1u8; 64], "ok.png", "image/png"));
        let res = app.send_form(Method::POST, routes::PORTFOLIOS, form).await;
        assert_eq!(res.status, 201, "{}", res.text);

        let inline = format!("data:image/png;base64,{}", STANDARD.encode([1u8; 65]));
        let res = app
            .post(
                routes::PORTFOLIOS,
                &json!({
                    "title": "Inline",
                    "description": "desc",
                    "category": "Other",
                    "imageBase64": inline,
                }),
            )
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.details(), vec!["imageBase64 payload exceeds 64 bytes"]);
        assert_eq!(app.count_rows("portfolio").await, 1);
    }

    #[tokio::test]
    async fn larger_limit_accepts_images_above_the_default() {
        let app = spawn_with_limit(8 * 1024 * 1024).await;
        let bytes = vec![3u8; 6 * 1024 * 1024];

        let form = base_form("Large", "Other")
            .part("image", image_part(&bytes, "large.png", "image/png"));
        let res = app.send_form(Method::POST, routes::PORTFOLIOS, form).await;
        assert_eq!(res.status, 201, "{}", res.text);

        let image_id = res.body["data"]["imageId"].as_str().unwrap().to_string();
        let res = app
            .client
            .get(app.url(&format!("/portfolio/image/{image_id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(res.bytes().await.unwrap().len(), bytes.len());
    }
}

mod image_store_unavailable {
    use super::*;
    use sea_orm::ConnectionTrait;
    use uuid::Uuid;

    /// Reference a blob that was never written, bypassing the upload path.
    async fn insert_image_row(app: &TestApp, portfolio_id: &str, image_id: Uuid, hash: &str) {
        app.db
            .execute_unprepared(&format!(
                "INSERT INTO image_file \
                 (id, portfolio_id, content_hash, filename, content_type, size, created_at) \
                 VALUES ('{image_id}', '{portfolio_id}', '{hash}', 'x.png', 'image/png', 3, now())"
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_succeeds_when_blob_store_is_unreachable() {
        let app = TestApp::spawn_with(TestOptions {
            blob_store: Some(Arc::new(UnreachableBlobStore)),
            ..Default::default()
        })
        .await;

        let id = app.create_portfolio("Stranded", "Other", false).await;
        let image_id = Uuid::now_v7();
        insert_image_row(&app, &id, image_id, &"ab".repeat(32)).await;
        app.db
            .execute_unprepared(&format!(
                "UPDATE portfolio SET image_id = '{image_id}' WHERE id = '{id}'"
            ))
            .await
            .unwrap();

        let res = app.delete(&routes::portfolio(&id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(app.get(&routes::portfolio(&id)).await.status, 404);
    }

    #[tokio::test]
    async fn unreadable_image_is_not_found() {
        let app = TestApp::spawn_with(TestOptions {
            blob_store: Some(Arc::new(UnreachableBlobStore)),
            ..Default::default()
        })
        .await;

        let id = app.create_portfolio("Dangling", "Other", false).await;
        let image_id = Uuid::now_v7();
        insert_image_row(&app, &id, image_id, &"cd".repeat(32)).await;

        let res = app.get(&format!("/portfolio/image/{image_id}")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn upload_failure_leaves_nothing_behind() {
        let app = TestApp::spawn_with(TestOptions {
            blob_store: Some(Arc::new(UnreachableBlobStore)),
            ..Default::default()
        })
        .await;

        let form = base_form("Nope", "Other")
            .part("image", image_part(PNG_BYTES, "n.png", "image/png"));
        let res = app.send_form(Method::POST, routes::PORTFOLIOS, form).await;

        assert_eq!(res.status, 500);
        assert_eq!(app.count_rows("portfolio").await, 0);
    }
}
