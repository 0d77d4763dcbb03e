use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;
use crate::date::Timestamp;
use crate::error::CatalogError;
use crate::media::Asset;

/// The photo catalog the driver reads from and writes back to.
pub trait Catalog {
    /// One page (1-based) of assets taken during `day`, UTC.
    /// An empty page means there are no more.
    fn search_page(&self, day: NaiveDate, page: u32) -> Result<Vec<Asset>, CatalogError>;

    fn update_date_time_original(
        &self,
        asset_id: &str,
        timestamp: &Timestamp,
    ) -> Result<(), CatalogError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    page: u32,
    with_exif: bool,
    is_visible: bool,
    language: &'a str,
    taken_after: String,
    taken_before: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    assets: SearchAssets,
}

#[derive(Deserialize)]
struct SearchAssets {
    #[serde(default)]
    items: Vec<Asset>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest {
    date_time_original: String,
}

/// Blocking client for the Immich REST API.
pub struct ImmichClient {
    agent: ureq::Agent,
    api_url: String,
    api_key: String,
}

impl ImmichClient {
    pub fn new(config: &CatalogConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            agent,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}{}", self.api_url, path))
            .set("x-api-key", &self.api_key)
            .set("Accept", "application/json")
    }
}

impl Catalog for ImmichClient {
    fn search_page(&self, day: NaiveDate, page: u32) -> Result<Vec<Asset>, CatalogError> {
        let (taken_after, taken_before) = day_bounds(day);
        let body = SearchRequest {
            page,
            with_exif: true,
            is_visible: true,
            language: "en-US",
            taken_after,
            taken_before,
        };

        let response = check(self.request("POST", "/search/metadata").send_json(body))?;
        let result: SearchResponse = response.into_json()?;
        Ok(result.assets.items)
    }

    fn update_date_time_original(
        &self,
        asset_id: &str,
        timestamp: &Timestamp,
    ) -> Result<(), CatalogError> {
        let body = UpdateRequest {
            date_time_original: timestamp.to_string(),
        };
        check(
            self.request("PUT", &format!("/assets/{}", asset_id))
                .send_json(body),
        )?;
        Ok(())
    }
}

/// Search window covering one UTC calendar day.
pub fn day_bounds(day: NaiveDate) -> (String, String) {
    let date = day.format("%Y-%m-%d");
    (
        format!("{}T00:00:00.000Z", date),
        format!("{}T23:59:59.999Z", date),
    )
}

fn check(result: Result<ureq::Response, ureq::Error>) -> Result<ureq::Response, CatalogError> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(status, response)) => {
            let status_text = response.status_text().to_string();
            let body = response.into_string().unwrap_or_default();
            Err(CatalogError::Status {
                status,
                status_text,
                body,
            })
        }
        Err(ureq::Error::Transport(transport)) => Err(CatalogError::Transport(transport.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2023, 8, 1).unwrap();
        let (after, before) = day_bounds(day);
        assert_eq!(after, "2023-08-01T00:00:00.000Z");
        assert_eq!(before, "2023-08-01T23:59:59.999Z");
    }

    #[test]
    fn test_search_request_wire_names() {
        let (taken_after, taken_before) = day_bounds(NaiveDate::from_ymd_opt(2023, 8, 1).unwrap());
        let body = SearchRequest {
            page: 2,
            with_exif: true,
            is_visible: true,
            language: "en-US",
            taken_after,
            taken_before,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "page": 2,
                "withExif": true,
                "isVisible": true,
                "language": "en-US",
                "takenAfter": "2023-08-01T00:00:00.000Z",
                "takenBefore": "2023-08-01T23:59:59.999Z",
            })
        );
    }

    #[test]
    fn test_search_response_without_items() {
        let result: SearchResponse = serde_json::from_str(r#"{"assets": {"total": 0}}"#).unwrap();
        assert!(result.assets.items.is_empty());
    }
}
