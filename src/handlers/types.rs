//! # Common API Types
//!
//! Shared response envelopes for list endpoints.

use serde::Serialize;
use url::form_urlencoded;

use crate::pagination::{Cursor, Page};

/// Navigation links for a page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLinks {
    /// Link reproducing the current page
    #[serde(rename = "self")]
    pub self_link: String,
    /// Link to the following page; null when this page is the last one
    pub next: Option<String>,
}

/// Envelope for every list endpoint.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    #[serde(rename = "_links")]
    pub links: PageLinks,
    pub limit: u64,
    /// Rows matching the filters across all pages
    pub total: u64,
    pub results: Vec<T>,
}

impl<T> ListResponse<T> {
    /// Builds the envelope for `page`, carrying `filters` into both links so
    /// that following `next` keeps the same result set.
    pub fn from_page<M>(page: Page<M>, path: &str, filters: &[(&str, Option<String>)]) -> Self
    where
        T: From<M>,
    {
        let extra = encode_filters(filters, page.limit);
        let next = page
            .has_next
            .then(|| page_link(path, &page.next, &extra));

        Self {
            links: PageLinks {
                self_link: page_link(path, &page.cursor, &extra),
                next,
            },
            limit: page.limit,
            total: page.total,
            results: page.items.into_iter().map(T::from).collect(),
        }
    }
}

fn encode_filters(filters: &[(&str, Option<String>)], limit: u64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in filters {
        if let Some(value) = value {
            query.append_pair(key, value);
        }
    }
    query.append_pair("limit", &limit.to_string());
    query.finish()
}

fn page_link(path: &str, cursor: &Cursor, extra: &str) -> String {
    format!("{}?{}&{}", path, cursor.to_query(), extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn page(has_next: bool) -> Page<u32> {
        Page {
            items: vec![1, 2],
            total: 5,
            limit: 2,
            cursor: Cursor::origin(),
            next: Cursor::new(
                chrono::DateTime::from_timestamp(1_514_764_800, 250_000_000).unwrap(),
                Uuid::nil(),
            ),
            has_next,
        }
    }

    #[test]
    fn test_links_carry_cursor_filters_and_limit() {
        let response: ListResponse<u32> = ListResponse::from_page(
            page(true),
            "/participants",
            &[
                ("study_id", Some("SD_ABCDEFGH".to_string())),
                ("gender", None),
            ],
        );

        assert_eq!(
            response.links.self_link,
            format!(
                "/participants?after=0.000000&after_uuid={}&study_id=SD_ABCDEFGH&limit=2",
                Uuid::nil()
            )
        );
        assert_eq!(
            response.links.next.as_deref(),
            Some(
                format!(
                    "/participants?after=1514764800.250000&after_uuid={}&study_id=SD_ABCDEFGH&limit=2",
                    Uuid::nil()
                )
                .as_str()
            )
        );
        assert_eq!(response.total, 5);
        assert_eq!(response.results, vec![1, 2]);
    }

    #[test]
    fn test_last_page_has_no_next_link() {
        let response: ListResponse<u32> = ListResponse::from_page(page(false), "/studies", &[]);

        assert!(response.links.next.is_none());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["_links"]["next"].is_null());
        assert!(json["_links"]["self"].is_string());
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_filter_values_are_url_encoded() {
        let response: ListResponse<u32> = ListResponse::from_page(
            page(false),
            "/genomic-files",
            &[("data_type", Some("Aligned Reads".to_string()))],
        );

        assert!(response.links.self_link.ends_with("data_type=Aligned+Reads&limit=2"));
    }
}
