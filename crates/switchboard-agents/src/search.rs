//! Tavily-backed web search for the results agent

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SEARCH_API_URL: &str = "https://api.tavily.com/search";

/// Client for the Tavily search API
#[derive(Clone)]
pub struct SearchClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// A single search result
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: f64,
}

/// Response from the search API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub query: String,
}

/// Request body for the search API
#[derive(Serialize)]
struct SearchRequest {
    api_key: String,
    query: String,
    max_results: usize,
    include_answer: bool,
}

impl std::fmt::Debug for SearchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchRequest")
            .field("api_key", &"[REDACTED]")
            .field("query", &self.query)
            .field("max_results", &self.max_results)
            .field("include_answer", &self.include_answer)
            .finish()
    }
}

impl SearchClient {
    /// Create a new SearchClient with the given API key
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, SEARCH_API_URL)
    }

    /// Point the client at a different endpoint, for self-hosted
    /// proxies and tests.
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: base_url.into(),
        }
    }

    /// Run one search. Answers are requested so score questions come
    /// back as a sentence instead of a bare link list.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        let max_results = max_results.min(10);

        let request = SearchRequest {
            api_key: self.api_key.clone(),
            query: query.to_string(),
            max_results,
            include_answer: true,
        };

        debug!(query = query, max_results = max_results, "Search request");

        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .context("Failed to send search request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Search failed with status {status}: {body}");
        }

        let search_response: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        debug!(
            results = search_response.results.len(),
            has_answer = search_response.answer.is_some(),
            "Search response"
        );

        Ok(search_response)
    }

    /// Format a response as a chat reply: the answer first, then the
    /// top sources.
    pub fn format_reply(response: &SearchResponse) -> String {
        if response.answer.is_none() && response.results.is_empty() {
            return "No results found.".to_string();
        }

        let mut output = String::new();

        if let Some(answer) = &response.answer {
            output.push_str(answer);
        }

        if !response.results.is_empty() {
            if !output.is_empty() {
                output.push_str("\n\n");
            }
            output.push_str("Sources:\n");
            for (i, result) in response.results.iter().take(3).enumerate() {
                output.push_str(&format!("{}. {} ({})\n", i + 1, result.title, result.url));
            }
        }

        output.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_serialization() {
        let request = SearchRequest {
            api_key: "test-key".to_string(),
            query: "pirates reds final score".to_string(),
            max_results: 5,
            include_answer: true,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["api_key"], "test-key");
        assert_eq!(json["query"], "pirates reds final score");
        assert_eq!(json["max_results"], 5);
        assert_eq!(json["include_answer"], true);
    }

    #[test]
    fn test_search_response_deserialization() {
        let json = serde_json::json!({
            "answer": "The Pirates beat the Reds 5-3.",
            "query": "pirates score last night",
            "results": [
                {
                    "title": "Pirates vs Reds recap",
                    "url": "https://example.com/recap",
                    "content": "Full game recap.",
                    "score": 0.95
                }
            ]
        });

        let response: SearchResponse = serde_json::from_value(json).unwrap();
        assert_eq!(
            response.answer.as_deref(),
            Some("The Pirates beat the Reds 5-3.")
        );
        assert_eq!(response.query, "pirates score last night");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].title, "Pirates vs Reds recap");
        assert!((response.results[0].score - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_search_response_missing_optional_fields() {
        let json = serde_json::json!({
            "results": [
                {
                    "title": "Example",
                    "url": "https://example.com"
                }
            ]
        });

        let response: SearchResponse = serde_json::from_value(json).unwrap();
        assert!(response.answer.is_none());
        assert_eq!(response.query, "");
        assert!(response.results[0].content.is_none());
        assert!((response.results[0].score - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_reply_answer_then_sources() {
        let response = SearchResponse {
            answer: Some("The Pirates won 5-3.".to_string()),
            query: "pirates".to_string(),
            results: vec![
                SearchResult {
                    title: "Recap".to_string(),
                    url: "https://example.com/recap".to_string(),
                    content: None,
                    score: 0.9,
                },
                SearchResult {
                    title: "Box score".to_string(),
                    url: "https://example.com/box".to_string(),
                    content: None,
                    score: 0.8,
                },
            ],
        };

        let output = SearchClient::format_reply(&response);
        assert!(output.starts_with("The Pirates won 5-3."));
        assert!(output.contains("Sources:"));
        assert!(output.contains("1. Recap (https://example.com/recap)"));
        assert!(output.contains("2. Box score (https://example.com/box)"));
    }

    #[test]
    fn test_format_reply_caps_sources_at_three() {
        let results = (0..5)
            .map(|i| SearchResult {
                title: format!("Result {i}"),
                url: format!("https://example.com/{i}"),
                content: None,
                score: 0.5,
            })
            .collect();
        let response = SearchResponse {
            answer: None,
            query: String::new(),
            results,
        };

        let output = SearchClient::format_reply(&response);
        assert!(output.contains("3. Result 2"));
        assert!(!output.contains("Result 3"));
    }

    #[test]
    fn test_format_reply_empty() {
        let response = SearchResponse {
            answer: None,
            query: "nothing".to_string(),
            results: vec![],
        };

        assert_eq!(SearchClient::format_reply(&response), "No results found.");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = SearchClient::new("sk-secret".to_string());
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
