//! WordPress adapter against a mocked REST API.

use content::UniversalContent;
use platforms::{
    PlatformAdapter, PlatformsConfig, PublishStatus, RemoteStatus, TransformOptions,
    WordPressAdapter, WordPressConfig,
};
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{basic_auth, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer, mappings: HashMap<String, String>) -> WordPressAdapter {
    let config = PlatformsConfig {
        wordpress: Some(WordPressConfig {
            site_url: server.uri(),
            username: "editor".to_string(),
            app_password: "abcd efgh".to_string(),
            field_mappings: mappings,
        }),
        ..Default::default()
    };
    WordPressAdapter::from_config(&config).unwrap()
}

fn article() -> UniversalContent {
    UniversalContent {
        title: "Hello REST".to_string(),
        content: "## Section\n\nBody text about rest.".to_string(),
        keywords: vec!["rest".to_string()],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_publish_creates_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(basic_auth("editor", "abcd efgh"))
        .and(body_partial_json(json!({
            "title": "Hello REST",
            "status": "publish",
            "slug": "hello-rest",
            "meta": { "_yoast_wpseo_focuskw": "rest" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 101,
            "link": "https://blog.example.com/hello-rest",
            "status": "publish"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter(&server, HashMap::new());
    let options = TransformOptions {
        status: PublishStatus::Publish,
        ..Default::default()
    };
    let post = adapter.transform(&article(), &options).content.unwrap();
    let result = adapter.publish(&post).await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.platform_id.as_deref(), Some("101"));
    assert_eq!(result.url.as_deref(), Some("https://blog.example.com/hello-rest"));
    assert!(result.published_at.is_some());
}

#[tokio::test]
async fn test_publish_resolves_terms() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(query_param("search", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "name": "Rustacean" },
            { "id": 4, "name": "Rust" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(query_param("search", "async"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(body_partial_json(json!({ "name": "async" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9, "name": "async" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(query_param("search", "Engineering"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "name": "engineering" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(body_partial_json(json!({ "tags": [4, 9], "categories": [2] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 102 })))
        .expect(1)
        .mount(&server)
        .await;

    let mut content = article();
    content.tags = vec!["rust".to_string(), "async".to_string()];
    content.category = Some("Engineering".to_string());
    content.featured_image = Some("https://cdn.example.com/hero.png".to_string());

    let adapter = adapter(&server, HashMap::new());
    let post = adapter
        .transform(&content, &TransformOptions::default())
        .content
        .unwrap();
    let result = adapter.publish(&post).await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.platform_id.as_deref(), Some("102"));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("https://cdn.example.com/hero.png") && w.contains("not attached")));
}

#[tokio::test]
async fn test_term_lookup_failure_fails_publish() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(401).set_body_string("rest_forbidden"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
        .expect(0)
        .mount(&server)
        .await;

    let mut content = article();
    content.tags = vec!["rust".to_string()];
    let adapter = adapter(&server, HashMap::new());
    let post = adapter
        .transform(&content, &TransformOptions::default())
        .content
        .unwrap();
    let result = adapter.publish(&post).await;

    assert!(!result.success);
    assert!(result.errors[0].contains("401"));
}

#[tokio::test]
async fn test_publish_applies_field_mappings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(body_partial_json(json!({ "post_title": "Hello REST" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let mappings = HashMap::from([("title".to_string(), "post_title".to_string())]);
    let adapter = adapter(&server, mappings);
    let post = adapter
        .transform(&article(), &TransformOptions::default())
        .content
        .unwrap();
    assert!(adapter.publish(&post).await.success);
}

#[tokio::test]
async fn test_api_error_is_folded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts/55"))
        .respond_with(ResponseTemplate::new(403).set_body_string("rest_cannot_edit"))
        .mount(&server)
        .await;

    let adapter = adapter(&server, HashMap::new());
    let post = adapter
        .transform(&article(), &TransformOptions::default())
        .content
        .unwrap();
    let result = adapter.update("55", &post).await;

    assert!(!result.success);
    assert!(result.platform_id.is_none());
    assert!(result.errors[0].contains("403"));
    assert!(result.errors[0].contains("rest_cannot_edit"));
}

#[tokio::test]
async fn test_delete_forces() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/wp-json/wp/v2/posts/9"))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted": true })))
        .expect(1)
        .mount(&server)
        .await;

    let result = adapter(&server, HashMap::new()).delete("9").await;
    assert!(result.success);
    assert_eq!(result.platform_id.as_deref(), Some("9"));
}

#[tokio::test]
async fn test_publishing_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts/12"))
        .and(query_param("context", "edit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "status": "future",
            "link": "https://blog.example.com/?p=12",
            "modified_gmt": "2024-05-01T10:30:00"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts/13"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts/14"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = adapter(&server, HashMap::new());

    let status = adapter.get_publishing_status("12").await;
    assert_eq!(status.status, RemoteStatus::Scheduled);
    assert!(status.last_modified.is_some());

    assert_eq!(
        adapter.get_publishing_status("13").await.status,
        RemoteStatus::Deleted
    );

    let failed = adapter.get_publishing_status("14").await;
    assert_eq!(failed.status, RemoteStatus::Unknown);
    assert!(failed.error.is_some());
}
