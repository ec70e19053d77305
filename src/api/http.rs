use super::{ApiError, DashboardApi, StartResponse};
use crate::report::{parse_reports, Report};
use reqwest::Client;
use tracing::debug;

/// `DashboardApi` over HTTP.
///
/// No request timeout is set: a hung call stays pending until the
/// transport gives up on its own.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("pulseboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn reports_url(&self) -> String {
        format!("{}/api/reports", self.base_url)
    }

    fn analyze_url(&self, slug: &str) -> String {
        format!("{}/api/analyze/{}", self.base_url, slug)
    }
}

#[async_trait::async_trait]
impl DashboardApi for HttpApi {
    async fn fetch_reports(&self) -> Result<Vec<Report>, ApiError> {
        let url = self.reports_url();
        debug!(%url, "fetching reports");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        Ok(parse_reports(&body)?)
    }

    async fn start_analysis(&self, slug: &str) -> Result<StartResponse, ApiError> {
        let url = self.analyze_url(slug);
        debug!(%url, "starting analysis");

        let resp = self.client.post(&url).send().await?;
        let status = resp.status().as_u16();

        // The body is informational only; a missing or odd body is not an error.
        let message = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

        Ok(StartResponse { status, message })
    }
}
