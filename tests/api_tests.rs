use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use feed_mixer::{
    aggregator::{Aggregator, AggregatorSettings, SelectionPolicy},
    api::{create_router, AppState, BatchLimits},
    db::MemorySessionStore,
    error::AppResult,
    models::{Page, RawItem, UserContext, VIDEO_KIND},
    services::{
        providers::{FeedProvider, FrequencySource},
        RecommendationService,
    },
};

const SESSION: HeaderName = HeaderName::from_static("x-session-id");

/// Music and Gaming feeds, `pages` pages of two videos each
struct ChartFeed {
    pages: usize,
}

#[async_trait::async_trait]
impl FeedProvider for ChartFeed {
    async fn fetch_category_top(&self, category_key: &str, cursor: Option<&str>) -> AppResult<Page> {
        let n: usize = cursor.map_or(0, |c| c.parse().unwrap());
        let items = (0..2)
            .map(|i| RawItem {
                id: format!("{}-{}-{}", category_key, n, i),
                kind: VIDEO_KIND.to_string(),
                title: format!("Chart video {}", i),
                thumbnail_url: Some("https://i.ytimg.com/vi/x/mqdefault.jpg".to_string()),
            })
            .collect();
        let next_cursor = (n + 1 < self.pages).then(|| (n + 1).to_string());
        Ok(Page { items, next_cursor })
    }

    fn supported_categories(&self) -> HashMap<String, String> {
        [
            ("Music".to_string(), "10".to_string()),
            ("Gaming".to_string(), "20".to_string()),
        ]
        .into()
    }

    fn name(&self) -> &'static str {
        "chart"
    }
}

struct LikedCategories(HashMap<String, u64>);

#[async_trait::async_trait]
impl FrequencySource for LikedCategories {
    async fn category_frequencies(&self, _user: &UserContext) -> AppResult<HashMap<String, u64>> {
        Ok(self.0.clone())
    }
}

fn create_test_server(policy: SelectionPolicy, pages: usize, liked: &[(&str, u64)]) -> TestServer {
    let liked = liked
        .iter()
        .map(|(name, count)| (name.to_string(), *count))
        .collect();
    let aggregator = Aggregator::new(
        Arc::new(ChartFeed { pages }),
        Arc::new(LikedCategories(liked)),
        AggregatorSettings {
            policy,
            ..AggregatorSettings::default()
        },
    );
    let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
    let state = AppState::new(
        RecommendationService::new(aggregator, store),
        BatchLimits::default(),
    );
    TestServer::new(create_router(state)).unwrap()
}

fn bearer() -> HeaderValue {
    HeaderValue::from_static("Bearer test-token")
}

fn ids(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(SelectionPolicy::Weighted, 5, &[]);
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let server = create_test_server(SelectionPolicy::Weighted, 5, &[("Music", 3)]);
    let response = server.get("/api/v1/recommendations").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_id_generated_and_echoed() {
    let server = create_test_server(SelectionPolicy::Weighted, 5, &[("Music", 3)]);

    let response = server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .await;
    response.assert_status_ok();
    assert!(!response.header(SESSION).is_empty());

    let response = server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .add_header(SESSION, HeaderValue::from_static("tab-1"))
        .await;
    assert_eq!(response.header(SESSION), "tab-1");
}

#[tokio::test]
async fn test_weighted_stream_pages_without_repeats() {
    let server = create_test_server(SelectionPolicy::Weighted, 3, &[("Music", 5), ("Gaming", 2)]);
    let session = HeaderValue::from_static("weighted-session");

    let mut seen = Vec::new();
    let mut token: Option<String> = None;
    for _ in 0..10 {
        let mut request = server
            .get("/api/v1/recommendations")
            .add_header(AUTHORIZATION, bearer())
            .add_header(SESSION, session.clone())
            .add_query_param("count", 2);
        if let Some(token) = &token {
            request = request.add_query_param("page_token", token);
        }

        let response = request.await;
        response.assert_status_ok();
        let body: Value = response.json();
        seen.extend(ids(&body));

        token = body["next_page_token"].as_str().map(str::to_string);
        if token.is_none() {
            break;
        }
    }

    // Three pages per category, one item taken per page
    assert_eq!(token, None);
    assert_eq!(seen.len(), 6);
    let unique: HashSet<&String> = seen.iter().collect();
    assert_eq!(unique.len(), seen.len());
}

#[tokio::test]
async fn test_round_robin_returns_whole_pages_in_turn() {
    let server = create_test_server(SelectionPolicy::RoundRobin, 5, &[("Music", 5), ("Gaming", 2)]);
    let session = HeaderValue::from_static("rr-session");

    let first: Value = server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .add_header(SESSION, session.clone())
        .await
        .json();
    assert_eq!(ids(&first), vec!["10-0-0", "10-0-1"]);
    assert_eq!(first["items"][0]["category"], "Music");
    assert_eq!(first["next_page_token"], "more");

    let second: Value = server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .add_header(SESSION, session.clone())
        .add_query_param("page_token", "more")
        .await
        .json();
    assert_eq!(ids(&second), vec!["20-0-0", "20-0-1"]);
}

#[tokio::test]
async fn test_no_usable_categories_ends_immediately() {
    let server = create_test_server(SelectionPolicy::Weighted, 5, &[("Education", 40)]);

    let response = server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(ids(&body).is_empty());
    assert!(body["next_page_token"].is_null());
}

#[tokio::test]
async fn test_finished_stream_is_not_restarted_by_missing_token() {
    let server = create_test_server(SelectionPolicy::Weighted, 1, &[("Music", 3)]);
    let session = HeaderValue::from_static("finished-session");

    let first: Value = server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .add_header(SESSION, session.clone())
        .add_query_param("count", 5)
        .await
        .json();
    assert_eq!(ids(&first), vec!["10-0-0"]);
    assert!(first["next_page_token"].is_null());

    let again: Value = server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .add_header(SESSION, session.clone())
        .add_query_param("count", 5)
        .await
        .json();
    assert!(ids(&again).is_empty());
    assert!(again["next_page_token"].is_null());
}

#[tokio::test]
async fn test_rejects_bad_count_and_token() {
    let server = create_test_server(SelectionPolicy::Weighted, 5, &[("Music", 3)]);

    server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .add_query_param("count", 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .add_query_param("page_token", "CAoQAA")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_session() {
    let server = create_test_server(SelectionPolicy::RoundRobin, 5, &[("Music", 5)]);
    let session = HeaderValue::from_static("reset-session");

    let first: Value = server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .add_header(SESSION, session.clone())
        .await
        .json();

    server
        .delete("/api/v1/recommendations/session")
        .add_header(SESSION, session.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // A resumed request after reset starts from the first page again
    let after: Value = server
        .get("/api/v1/recommendations")
        .add_header(AUTHORIZATION, bearer())
        .add_header(SESSION, session.clone())
        .add_query_param("page_token", "more")
        .await
        .json();
    assert_eq!(ids(&after), ids(&first));
}
