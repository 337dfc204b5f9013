use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::model::{NewSearch, SearchHistoryEntry};

/// Client for the search history endpoints of a running weather server.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct LoggedSearch {
    search: SearchHistoryEntry,
}

impl HistoryClient {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// `GET /api/searches`
    pub async fn list(&self) -> Result<Vec<SearchHistoryEntry>> {
        let url = format!("{}/api/searches", self.base_url);

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach weather server at {}", self.base_url))?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("Search history request failed with status {status}"));
        }

        res.json().await.context("Failed to parse search history JSON")
    }

    /// `POST /api/search`; returns the entry as stored by the server.
    pub async fn log(&self, search: &NewSearch) -> Result<SearchHistoryEntry> {
        let url = format!("{}/api/search", self.base_url);
        let body = json!({
            "city": search.city,
            "country": search.country,
            "temperature": search.temperature,
        });

        let res = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach weather server at {}", self.base_url))?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("Logging search failed with status {status}"));
        }

        let logged: LoggedSearch = res.json().await.context("Failed to parse logged search JSON")?;
        Ok(logged.search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn list_parses_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/searches"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"city": "London", "country": "GB", "temperature": 14.2, "timestamp": "2024-05-01T12:00:00.000Z"},
                {"city": "Rome", "country": "", "temperature": null, "timestamp": "2024-05-01T11:00:00.000Z"}
            ])))
            .mount(&server)
            .await;

        let entries = HistoryClient::new(server.uri()).list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].city, "London");
        assert_eq!(entries[1].temperature, None);
    }

    #[tokio::test]
    async fn list_reports_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/searches"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = HistoryClient::new(server.uri()).list().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn log_posts_search_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_json(json!({"city": "Oslo", "country": "NO", "temperature": 3.5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Search logged successfully",
                "search": {"city": "Oslo", "country": "NO", "temperature": 3.5, "timestamp": "2024-05-01T12:00:00.000Z"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let search = NewSearch::new("Oslo").unwrap().with_country("NO").with_temperature(Some(3.5));
        let entry = HistoryClient::new(format!("{}/", server.uri())).log(&search).await.unwrap();
        assert_eq!(entry.city, "Oslo");
    }
}
