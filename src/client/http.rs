use crate::client::{Transport, TransportRequest, TransportResponse};
use crate::core::error::MaintenanceError;
use crate::core::settings::ApiSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;

const USER_AGENT: &str = concat!("maintenance-watch/", env!("CARGO_PKG_VERSION"));

pub struct HttpTransport {
    client: reqwest::Client,
    status_url: String,
    toggle_url: String,
    token: Option<String>,
    session_cookie: Option<String>,
}

impl HttpTransport {
    pub fn new(api: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            status_url: endpoint_url(&api.base_url, &api.status_path),
            toggle_url: endpoint_url(&api.base_url, &api.toggle_path),
            token: api.token.clone(),
            session_cookie: api.session_cookie.clone(),
        })
    }

    fn authorize(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        builder
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &TransportRequest,
    ) -> Result<TransportResponse, MaintenanceError> {
        let builder = match request {
            TransportRequest::FetchStatus => self
                .client
                .get(&self.status_url)
                .header(reqwest::header::CACHE_CONTROL, "no-cache"),
            TransportRequest::Toggle(body) => self.client.post(&self.toggle_url).json(body),
        };

        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| MaintenanceError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(?request, status, "Maintenance endpoint responded");
        Ok(TransportResponse { status, body })
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
