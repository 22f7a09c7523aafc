//! YouTube Data API v3 provider
//!
//! Serves both upstream roles:
//! 1. Category feeds: `/videos?chart=mostPopular&videoCategoryId=...`, paged by
//!    `pageToken`, public API key.
//! 2. Engagement signal: the user's liked videos (`/videos?myRating=like`,
//!    OAuth bearer token), counted per category and named through
//!    `/videoCategories`.
use crate::{
    error::{AppError, AppResult},
    models::{
        youtube::{ApiCategoryListResponse, ApiVideoListResponse},
        Page, UserContext,
    },
    services::providers::{FeedProvider, FrequencySource},
};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use std::{collections::HashMap, time::Duration};

/// Largest page the videos endpoint serves
const MAX_PAGE_SIZE: u32 = 50;

/// Categories the `mostPopular` chart can be listed for, by display name.
/// Other categories exist but reject chart requests.
const CHART_CATEGORIES: &[(&str, &str)] = &[
    ("Film & Animation", "1"),
    ("Autos & Vehicles", "2"),
    ("Music", "10"),
    ("Pets & Animals", "15"),
    ("Sports", "17"),
    ("Gaming", "20"),
    ("People & Blogs", "22"),
    ("Comedy", "23"),
    ("Entertainment", "24"),
    ("News & Politics", "25"),
    ("Howto & Style", "26"),
    ("Science & Technology", "28"),
];

#[derive(Clone)]
pub struct YouTubeProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    region_code: String,
    page_size: u32,
    max_liked_pages: usize,
}

impl YouTubeProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        region_code: String,
        page_size: u32,
        max_liked_pages: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            region_code,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            max_liked_pages,
        })
    }

    async fn send(request: RequestBuilder, endpoint: &str) -> AppResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            endpoint = %endpoint,
            status = %status,
            body = %body,
            "YouTube API request failed"
        );

        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized(
                "YouTube rejected the user's credentials".to_string(),
            ));
        }
        Err(AppError::ExternalApi(format!(
            "YouTube API returned status {}: {}",
            status, body
        )))
    }

    /// Counts liked videos per category id
    async fn liked_category_counts(&self, user: &UserContext) -> AppResult<HashMap<String, u64>> {
        let url = format!("{}/videos", self.api_url);
        let max_results = MAX_PAGE_SIZE.to_string();
        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut page_token: Option<String> = None;

        for _ in 0..self.max_liked_pages {
            let request = {
                let mut query = vec![
                    ("part", "snippet"),
                    ("myRating", "like"),
                    ("maxResults", max_results.as_str()),
                ];
                if let Some(token) = page_token.as_deref() {
                    query.push(("pageToken", token));
                }
                self.http_client
                    .get(&url)
                    .bearer_auth(&user.access_token)
                    .query(&query)
            };
            let response: ApiVideoListResponse = Self::send(request, "videos").await?.json().await?;

            for video in &response.items {
                if let Some(category_id) = video.snippet.as_ref().and_then(|s| s.category_id.clone())
                {
                    *counts.entry(category_id).or_default() += 1;
                }
            }

            page_token = response.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        Ok(counts)
    }

    /// Resolves category ids to display names. Unknown ids are left out.
    async fn category_names(&self, ids: &[&str]) -> AppResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/videoCategories", self.api_url);
        let joined = ids.join(",");
        let request = self.http_client.get(&url).query(&[
            ("part", "snippet"),
            ("id", joined.as_str()),
            ("key", self.api_key.as_str()),
        ]);
        let response: ApiCategoryListResponse =
            Self::send(request, "videoCategories").await?.json().await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|category| category.snippet.map(|s| (category.id, s.title)))
            .collect())
    }
}

#[async_trait::async_trait]
impl FeedProvider for YouTubeProvider {
    async fn fetch_category_top(
        &self,
        category_key: &str,
        cursor: Option<&str>,
    ) -> AppResult<Page> {
        let url = format!("{}/videos", self.api_url);
        let max_results = self.page_size.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("chart", "mostPopular"),
            ("videoCategoryId", category_key),
            ("regionCode", self.region_code.as_str()),
            ("maxResults", max_results.as_str()),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = cursor {
            query.push(("pageToken", token));
        }

        let request = self.http_client.get(&url).query(&query);
        let response = Self::send(request, "videos").await?;

        let response_text = response.text().await?;
        let parsed: ApiVideoListResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize YouTube chart response"
            );
            AppError::ExternalApi(format!("Failed to parse YouTube response: {}", e))
        })?;

        let page = Page::from(parsed);
        tracing::debug!(
            category = %category_key,
            items = page.items.len(),
            provider = "youtube",
            "Chart page fetched"
        );

        Ok(page)
    }

    fn supported_categories(&self) -> HashMap<String, String> {
        CHART_CATEGORIES
            .iter()
            .map(|(name, key)| (name.to_string(), key.to_string()))
            .collect()
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}

#[async_trait::async_trait]
impl FrequencySource for YouTubeProvider {
    async fn category_frequencies(&self, user: &UserContext) -> AppResult<HashMap<String, u64>> {
        let counts = self.liked_category_counts(user).await?;
        let ids: Vec<&str> = counts.keys().map(String::as_str).collect();
        let names = self.category_names(&ids).await?;

        let mut frequencies: HashMap<String, u64> = HashMap::new();
        for (id, count) in &counts {
            match names.get(id) {
                Some(name) => *frequencies.entry(name.clone()).or_default() += count,
                None => tracing::debug!(category_id = %id, "Liked category has no name, skipping"),
            }
        }

        tracing::info!(
            categories = frequencies.len(),
            liked = counts.values().sum::<u64>(),
            provider = "youtube",
            "Category frequencies computed"
        );

        Ok(frequencies)
    }
}
