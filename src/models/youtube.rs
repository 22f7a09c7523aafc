use serde::Deserialize;

use super::{Page, RawItem};

// ============================================================================
// YouTube Data API Types
// ============================================================================

/// Raw `videos.list` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideoListResponse {
    #[serde(default)]
    pub items: Vec<ApiVideo>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiVideo {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub snippet: Option<ApiVideoSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideoSnippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub thumbnails: Option<ApiThumbnails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiThumbnails {
    #[serde(default)]
    pub default: Option<ApiThumbnail>,
    #[serde(default)]
    pub medium: Option<ApiThumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiThumbnail {
    pub url: String,
}

/// Raw `videoCategories.list` response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCategoryListResponse {
    #[serde(default)]
    pub items: Vec<ApiCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCategory {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<ApiCategorySnippet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCategorySnippet {
    pub title: String,
}

impl ApiVideo {
    /// Returns `None` for entries missing an id, kind or title
    pub fn into_raw_item(self) -> Option<RawItem> {
        let snippet = self.snippet?;
        let thumbnail_url = snippet
            .thumbnails
            .and_then(|t| t.medium.or(t.default))
            .map(|t| t.url);

        Some(RawItem {
            id: self.id?,
            kind: self.kind?,
            title: snippet.title?,
            thumbnail_url,
        })
    }
}

impl From<ApiVideoListResponse> for Page {
    fn from(response: ApiVideoListResponse) -> Self {
        let next_cursor = response.next_page_token.filter(|token| !token.is_empty());
        Page {
            items: response
                .items
                .into_iter()
                .filter_map(ApiVideo::into_raw_item)
                .collect(),
            next_cursor,
        }
    }
}
