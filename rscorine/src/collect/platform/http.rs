use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{
    DatasetDescription, RasterPlatform, ReduceRequest, ReduceResponse, TileRequest, TileResponse,
};
use crate::collect::settings::PlatformSettings;
use crate::error::PlatformError;

/// Raster platform reached over its JSON/HTTP API.
///
/// Endpoints, relative to the configured base URL:
/// - `GET  v1/assets/{dataset}` describes bands and properties
/// - `POST v1/assets/{dataset}:reduceRegion` runs one reduction
/// - `POST v1/assets/{dataset}:tiles` returns an XYZ tile URL template
///
/// The dataset id is percent-encoded as a single path segment. One instance holds the
/// authenticated session for the whole run; the underlying client is shared between
/// worker threads.
pub struct HttpPlatform {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpPlatform {
    pub fn new(settings: &PlatformSettings) -> Result<Self, PlatformError> {
        settings
            .validate()
            .map_err(|e| PlatformError::Config(format!("{:#}", e)))?;

        let timeout = settings.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(PlatformError::Http)?;

        Ok(HttpPlatform {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            timeout,
        })
    }

    /// URL of an asset, optionally with a `:action` suffix
    pub fn asset_url(&self, dataset: &str, action: Option<&str>) -> String {
        let mut url = format!(
            "{}/v1/assets/{}",
            self.base_url,
            urlencoding::encode(dataset)
        );
        if let Some(action) = action {
            url.push(':');
            url.push_str(action);
        }
        url
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, PlatformError> {
        let request = match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .map_err(|e| PlatformError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(PlatformError::Status { status, body });
        }

        response
            .json::<T>()
            .map_err(|e| PlatformError::from_reqwest(e, self.timeout))
    }
}

impl RasterPlatform for HttpPlatform {
    fn describe(&self, dataset: &str) -> Result<DatasetDescription, PlatformError> {
        let url = self.asset_url(dataset, None);
        log::debug!("GET {}", url);
        self.send(self.client.get(&url))
    }

    fn reduce_region(
        &self,
        dataset: &str,
        request: &ReduceRequest,
    ) -> Result<ReduceResponse, PlatformError> {
        let url = self.asset_url(dataset, Some("reduceRegion"));
        log::debug!("POST {} reducer={:?}", url, request.reducer);
        self.send(self.client.post(&url).json(request))
    }

    fn tile_url(&self, dataset: &str, request: &TileRequest) -> Result<Option<String>, PlatformError> {
        let url = self.asset_url(dataset, Some("tiles"));
        log::debug!("POST {} ({} palette entries)", url, request.palette.len());
        let response: TileResponse = self.send(self.client.post(&url).json(request))?;
        Ok(Some(response.url_template))
    }
}
