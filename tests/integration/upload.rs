use crate::common::TestApp;

mod valid_uploads {
    use super::*;

    #[tokio::test]
    async fn upload_stores_file_and_metadata() {
        let app = TestApp::spawn().await;
        let payload = vec![0xAAu8; 500 * 1024];

        let res = app.upload("photo.png", payload.clone(), "image/png").await;

        assert_eq!(res.status, 201, "{}", res.text);
        let filename = res.body["filename"].as_str().unwrap();
        assert_ne!(filename, "photo.png");
        assert_eq!(
            res.body["url"].as_str().unwrap(),
            format!("/images/{filename}")
        );

        // The bytes landed on disk under the generated name.
        let on_disk = std::fs::read(app.images_dir.path().join(filename)).unwrap();
        assert_eq!(on_disk.len(), payload.len());

        // Detail lookup agrees with what was uploaded.
        let detail = app.get(&format!("/upload/{filename}")).await;
        assert_eq!(detail.status, 200);
        assert_eq!(detail.body["size"].as_i64().unwrap(), 500 * 1024);
        assert_eq!(detail.body["file_type"].as_str().unwrap(), ".png");
        assert_eq!(detail.body["original_name"].as_str().unwrap(), "photo.png");
    }

    #[tokio::test]
    async fn repeated_uploads_of_the_same_name_never_collide() {
        let app = TestApp::spawn().await;

        let mut filenames = Vec::new();
        for _ in 0..5 {
            filenames.push(app.upload_ok("same.gif", b"GIF89a".to_vec(), "image/gif").await);
        }

        for (i, a) in filenames.iter().enumerate() {
            for b in &filenames[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(app.stored_file_count(), 5);
    }

    #[tokio::test]
    async fn concurrent_uploads_of_the_same_name_get_distinct_files() {
        let app = TestApp::spawn().await;
        let payload = b"GIF89a".to_vec();

        let (a, b, c, d) = tokio::join!(
            app.upload("race.gif", payload.clone(), "image/gif"),
            app.upload("race.gif", payload.clone(), "image/gif"),
            app.upload("race.gif", payload.clone(), "image/gif"),
            app.upload("race.gif", payload.clone(), "image/gif"),
        );

        let mut filenames = Vec::new();
        for res in [a, b, c, d] {
            assert_eq!(res.status, 201, "{}", res.text);
            filenames.push(res.body["filename"].as_str().unwrap().to_string());
        }
        for (i, a) in filenames.iter().enumerate() {
            for b in &filenames[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(app.stored_file_count(), 4);
    }

    #[tokio::test]
    async fn detail_is_stable_across_repeated_reads() {
        let app = TestApp::spawn().await;
        let filename = app.upload_ok("cat.jpg", vec![1u8; 64], "image/jpeg").await;

        let first = app.get(&format!("/upload/{filename}")).await;
        let second = app.get(&format!("/upload/{filename}")).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body, second.body);
    }
}

mod rejected_uploads {
    use super::*;

    #[tokio::test]
    async fn oversized_file_is_rejected_with_no_side_effects() {
        let app = TestApp::spawn().await;
        let two_mib = vec![0u8; 2 * 1024 * 1024];

        let res = app.upload("big.jpg", two_mib, "image/jpeg").await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(res.body["detail"].as_str().unwrap().contains("maximum size"));
        assert_eq!(app.stored_file_count(), 0);

        let list = app.get("/upload/").await;
        assert_eq!(list.body["pagination"]["total"].as_u64().unwrap(), 0);
    }

    #[tokio::test]
    async fn body_beyond_the_transport_limit_still_gets_a_structured_error() {
        let app = TestApp::spawn().await;
        // Past the route's body limit (4x the 1 MiB file cap), not just the
        // file cap itself.
        let five_mib = vec![0u8; 5 * 1024 * 1024];

        let res = app.upload("huge.png", five_mib, "image/png").await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(res.body["detail"].is_string(), "{}", res.text);
        assert_eq!(app.stored_file_count(), 0);
    }

    #[tokio::test]
    async fn unsupported_content_type_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload("notes.txt", b"hello".to_vec(), "text/plain").await;

        assert_eq!(res.status, 400);
        assert!(res.body["detail"].as_str().unwrap().contains("content type"));
        assert_eq!(app.stored_file_count(), 0);
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload("empty.png", Vec::new(), "image/png").await;

        assert_eq!(res.status, 400);
        assert_eq!(app.stored_file_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new().text("note", "no file here");

        let res = app
            .client
            .post(app.url("/upload/"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn second_file_field_is_rejected() {
        let app = TestApp::spawn().await;

        let first = reqwest::multipart::Part::bytes(b"a".to_vec())
            .file_name("a.png")
            .mime_str("image/png")
            .unwrap();
        let second = reqwest::multipart::Part::bytes(b"b".to_vec())
            .file_name("b.png")
            .mime_str("image/png")
            .unwrap();
        let form = reqwest::multipart::Form::new()
            .part("file", first)
            .part("file", second);

        let res = app
            .client
            .post(app.url("/upload/"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
        assert_eq!(app.stored_file_count(), 0);
    }
}

mod compensating_cleanup {
    use super::*;
    use sea_orm::{ConnectionTrait, DbBackend, Statement};

    #[tokio::test]
    async fn insert_failure_after_write_leaves_no_orphan_file() {
        let app = TestApp::spawn().await;

        // Sabotage the metadata table so the insert after the file write
        // fails; the pipeline must then remove the just-written file.
        app.db
            .execute(Statement::from_string(
                DbBackend::Postgres,
                "DROP TABLE images".to_string(),
            ))
            .await
            .unwrap();

        let res = app.upload("doomed.png", vec![9u8; 128], "image/png").await;

        assert_eq!(res.status, 500, "{}", res.text);
        assert_eq!(app.stored_file_count(), 0);
    }
}
