use crate::search::{ResultRecord, SearchBackend, SearchError};
use reqwest::Url;

/// Lookup backend speaking to the registry search API over HTTP.
///
/// Issues `GET <endpoint>?q=<query>` and expects a JSON array of records.
/// No timeout is configured: a hung request stays pending until it resolves
/// or the controller supersedes it.
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSearchBackend {
    pub fn new(endpoint: &str) -> Result<Self, SearchError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SearchError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SearchError::InvalidEndpoint(format!(
                "{}: unsupported scheme '{}'",
                endpoint,
                endpoint.scheme()
            )));
        }

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Pull a usable `error` string out of an error response body, if any.
    fn server_error_message(body: &str) -> Option<String> {
        let json: serde_json::Value = serde_json::from_str(body).ok()?;
        json.get("error")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn parse_records(body: &str) -> Result<Vec<ResultRecord>, SearchError> {
        serde_json::from_str(body).map_err(|e| SearchError::Malformed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn lookup(&self, query: &str) -> Result<Vec<ResultRecord>, SearchError> {
        tracing::debug!(
            query = %query,
            endpoint = %self.endpoint,
            "performing registry lookup"
        );

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = Self::server_error_message(&body);

            tracing::warn!(
                status = %status,
                error = ?message,
                "registry lookup api error"
            );

            return Err(SearchError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let records = Self::parse_records(&body).inspect_err(|e| {
            tracing::warn!(error = %e, "registry lookup returned an unreadable body");
        })?;

        tracing::debug!(
            query = %query,
            result_count = records.len(),
            "registry lookup completed"
        );

        Ok(records)
    }
}
