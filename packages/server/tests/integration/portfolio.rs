use serde_json::json;

use crate::common::{TestApp, routes};

mod portfolio_create {
    use super::*;

    #[tokio::test]
    async fn create_with_json_returns_entry() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::PORTFOLIOS,
                &json!({
                    "title": "  AI Chatbot  ",
                    "description": "Support bot",
                    "category": "AI/ML",
                    "tags": "NLP, Rust",
                    "url": "https://example.com",
                    "views": 999,
                    "likes": 42,
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["message"], "Portfolio created successfully");
        let data = &res.body["data"];
        assert_eq!(data["title"], "AI Chatbot");
        assert_eq!(data["category"], "AI/ML");
        assert_eq!(data["tags"], json!(["NLP", "Rust"]));
        assert_eq!(data["featured"], false);
        assert_eq!(data["views"], 0);
        assert_eq!(data["likes"], 0);
        assert_eq!(data["imageUrl"], "");
        assert!(data["createdAt"].is_string());
    }

    #[tokio::test]
    async fn invalid_category_is_rejected_and_not_persisted() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::PORTFOLIOS,
                &json!({
                    "title": "Thing",
                    "description": "Desc",
                    "category": "Invalid",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(
            res.details()
                .iter()
                .any(|d| d.starts_with("Category must be one of")),
            "{}",
            res.text
        );
        assert_eq!(app.count_rows("portfolio").await, 0);
    }

    #[tokio::test]
    async fn all_field_errors_are_reported_together() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::PORTFOLIOS,
                &json!({ "url": "not a url", "tags": ["x".repeat(60)] }),
            )
            .await;

        assert_eq!(res.status, 400);
        let details = res.details();
        assert!(details.contains(&"Title is required".to_string()));
        assert!(details.contains(&"Description is required".to_string()));
        assert!(details.contains(&"Category is required".to_string()));
        assert!(details.contains(&"URL must be a valid URL".to_string()));
        assert!(details.contains(&"Each tag must be at most 50 characters".to_string()));
    }

    #[tokio::test]
    async fn malformed_json_is_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::PORTFOLIOS))
            .header("content-type", "application/json")
            .body("{\"title\": ")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }
}

mod portfolio_read {
    use super::*;

    #[tokio::test]
    async fn each_read_increments_views() {
        let app = TestApp::spawn().await;
        let id = app.create_portfolio("Viewed", "Other", false).await;

        for expected in 1..=3 {
            let res = app.get(&routes::portfolio(&id)).await;
            assert_eq!(res.status, 200);
            assert_eq!(res.body["data"]["views"], expected);
        }
    }

    #[tokio::test]
    async fn concurrent_reads_do_not_lose_views() {
        let app = TestApp::spawn().await;
        let id = app.create_portfolio("Busy", "Other", false).await;
        let url = app.url(&routes::portfolio(&id));

        let mut reads = tokio::task::JoinSet::new();
        for _ in 0..10 {
            let client = app.client.clone();
            let url = url.clone();
            reads.spawn(async move { client.get(url).send().await.unwrap().status().as_u16() });
        }
        while let Some(status) = reads.join_next().await {
            assert_eq!(status.unwrap(), 200);
        }

        let res = app.get(&routes::portfolio(&id)).await;
        assert_eq!(res.body["data"]["views"], 11);
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::portfolio("not-an-id")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_ID");
        assert_eq!(res.body["error"], "Invalid portfolio ID");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get(&routes::portfolio("01936f0e-1234-7abc-8000-000000000001"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod portfolio_list {
    use super::*;

    #[tokio::test]
    async fn featured_entries_come_first_in_every_sort() {
        let app = TestApp::spawn().await;
        app.create_portfolio("Alpha", "Other", false).await;
        app.create_portfolio("Zulu", "Other", true).await;
        app.create_portfolio("Mike", "Other", false).await;

        for sort in ["newest", "popularity", "name", "views", "이름순"] {
            let res = app.get(&format!("{}?sort={sort}", routes::PORTFOLIOS)).await;
            assert_eq!(res.status, 200);
            let titles: Vec<&str> = res.body["data"]
                .as_array()
                .unwrap()
                .iter()
                .map(|p| p["title"].as_str().unwrap())
                .collect();
            assert_eq!(titles[0], "Zulu", "sort={sort}: {titles:?}");
        }

        let res = app.get(&format!("{}?sort=name", routes::PORTFOLIOS)).await;
        let titles: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Zulu", "Alpha", "Mike"]);
    }

    #[tokio::test]
    async fn pagination_metadata() {
        let app = TestApp::spawn().await;
        for i in 0..5 {
            app.create_portfolio(&format!("Entry {i}"), "Other", false).await;
        }

        let res = app
            .get(&format!("{}?page=2&limit=2", routes::PORTFOLIOS))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
        let p = &res.body["pagination"];
        assert_eq!(p["currentPage"], 2);
        assert_eq!(p["totalPages"], 3);
        assert_eq!(p["totalItems"], 5);
        assert_eq!(p["itemsPerPage"], 2);
        assert_eq!(p["hasNext"], true);
        assert_eq!(p["hasPrev"], true);
    }

    #[tokio::test]
    async fn filters_by_category_tags_and_search() {
        let app = TestApp::spawn().await;
        app.post(
            routes::PORTFOLIOS,
            &json!({
                "title": "Shop frontend",
                "description": "Storefront built with React",
                "category": "Web Development",
                "tags": ["React", "TypeScript"],
            }),
        )
        .await;
        app.post(
            routes::PORTFOLIOS,
            &json!({
                "title": "Vision model",
                "description": "Image classifier",
                "category": "AI/ML",
                "tags": ["PyTorch"],
                "featured": true,
            }),
        )
        .await;

        let total =
            |res: &crate::common::TestResponse| res.body["pagination"]["totalItems"].clone();

        let res = app
            .get(&format!("{}?category=AI/ML", routes::PORTFOLIOS))
            .await;
        assert_eq!(total(&res), 1);
        assert_eq!(res.body["data"][0]["title"], "Vision model");

        let res = app
            .get(&format!("{}?tags=Go,TypeScript", routes::PORTFOLIOS))
            .await;
        assert_eq!(total(&res), 1);
        assert_eq!(res.body["data"][0]["title"], "Shop frontend");

        let res = app.get(&format!("{}?search=classifier", routes::PORTFOLIOS)).await;
        assert_eq!(total(&res), 1);
        assert_eq!(res.body["data"][0]["title"], "Vision model");

        let res = app.get(&format!("{}?search=PyTorch", routes::PORTFOLIOS)).await;
        assert_eq!(total(&res), 1);

        let res = app.get(&format!("{}?featured=true", routes::PORTFOLIOS)).await;
        assert_eq!(total(&res), 1);

        // Unknown values leave the axis unfiltered.
        let res = app
            .get(&format!("{}?category=Cooking&featured=maybe", routes::PORTFOLIOS))
            .await;
        assert_eq!(total(&res), 2);
    }

    #[tokio::test]
    async fn search_matches_tag_words_case_insensitively() {
        let app = TestApp::spawn().await;
        app.post(
            routes::PORTFOLIOS,
            &json!({
                "title": "Release pipeline",
                "description": "Builds and ships containers",
                "category": "Cloud/DevOps",
                "tags": ["PyTorch", "GitHub Actions"],
            }),
        )
        .await;
        app.create_portfolio("Unrelated", "Other", false).await;

        for term in ["PyTorch", "pytorch", "GitHub", "actions", "github%20actions"] {
            let res = app
                .get(&format!("{}?search={term}", routes::PORTFOLIOS))
                .await;
            assert_eq!(res.body["pagination"]["totalItems"], 1, "search={term}");
            assert_eq!(res.body["data"][0]["title"], "Release pipeline");
        }
    }
}

mod portfolio_update {
    use super::*;

    #[tokio::test]
    async fn partial_update_changes_only_given_fields() {
        let app = TestApp::spawn().await;
        let id = app.create_portfolio("Before", "Other", false).await;

        let res = app
            .put(
                &routes::portfolio(&id),
                &json!({ "title": "After", "featured": true, "views": 100 }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let data = &res.body["data"];
        assert_eq!(data["title"], "After");
        assert_eq!(data["featured"], true);
        assert_eq!(data["description"], "Before description");
        assert_eq!(data["category"], "Other");
        assert_eq!(data["views"], 0);
        assert_ne!(data["updatedAt"], data["createdAt"]);
    }

    #[tokio::test]
    async fn empty_url_clears_link() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::PORTFOLIOS,
                &json!({
                    "title": "Linked",
                    "description": "Has a link",
                    "category": "Other",
                    "url": "https://example.com",
                }),
            )
            .await;
        let id = res.id();

        let res = app.put(&routes::portfolio(&id), &json!({ "url": "" })).await;

        assert_eq!(res.status, 200);
        assert!(res.body["data"]["url"].is_null());
    }

    #[tokio::test]
    async fn invalid_update_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_portfolio("Valid", "Other", false).await;

        let res = app
            .put(
                &routes::portfolio(&id),
                &json!({ "title": "", "category": "Nope" }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.details().len(), 2, "{}", res.text);
    }

    #[tokio::test]
    async fn update_unknown_entry_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .put(
                &routes::portfolio("01936f0e-1234-7abc-8000-000000000001"),
                &json!({ "title": "x" }),
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod portfolio_like {
    use super::*;

    #[tokio::test]
    async fn likes_move_both_ways_and_floor_at_zero() {
        let app = TestApp::spawn().await;
        let id = app.create_portfolio("Liked", "Other", false).await;

        let res = app.post(&routes::like(&id), &json!({ "increment": true })).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"]["likes"], 1);

        let res = app.post(&routes::like(&id), &json!({})).await;
        assert_eq!(res.body["data"]["likes"], 2);

        for expected in [1, 0, 0] {
            let res = app
                .post(&routes::like(&id), &json!({ "increment": false }))
                .await;
            assert_eq!(res.status, 200);
            assert_eq!(res.body["data"]["likes"], expected);
        }
    }

    #[tokio::test]
    async fn empty_body_counts_as_like() {
        let app = TestApp::spawn().await;
        let id = app.create_portfolio("Liked", "Other", false).await;

        let res = app
            .client
            .post(app.url(&routes::like(&id)))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn like_unknown_entry_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                &routes::like("01936f0e-1234-7abc-8000-000000000001"),
                &json!({ "increment": true }),
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod portfolio_delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_entry() {
        let app = TestApp::spawn().await;
        let id = app.create_portfolio("Doomed", "Other", false).await;

        let res = app.delete(&routes::portfolio(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["data"]["id"], id.as_str());

        let res = app.get(&routes::portfolio(&id)).await;
        assert_eq!(res.status, 404);

        let res = app.delete(&routes::portfolio(&id)).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_with_malformed_id_is_bad_request() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::portfolio("123")).await;

        assert_eq!(res.status, 400);
    }
}

mod portfolio_seed {
    use super::*;

    #[tokio::test]
    async fn seeding_fills_only_an_empty_table() {
        let app = TestApp::spawn().await;

        let inserted = portfolio_server::seed::seed_portfolios(&app.db).await.unwrap();
        assert!(inserted > 0);
        let again = portfolio_server::seed::seed_portfolios(&app.db).await.unwrap();
        assert_eq!(again, 0);

        let res = app.get(routes::PORTFOLIOS).await;
        assert_eq!(res.body["pagination"]["totalItems"], inserted);
        // Seed entries carry legacy image references.
        assert!(!res.body["data"][0]["imageUrl"].as_str().unwrap().is_empty());
    }
}
