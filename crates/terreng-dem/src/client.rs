//! Blocking HTTP client for the høydedata.no DTM ImageServer.

use crate::config::ServiceConfig;
use crate::request::{ExportImageRequest, FetchRequest};
use crate::response::ServiceResponse;
use crate::Result;
use reqwest::header::CONTENT_TYPE;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Where the GeoTIFF was written.
    pub path: PathBuf,
    /// Size of the written file.
    pub bytes_written: u64,
}

/// Client performing one `exportImage` call per fetch.
///
/// No retries and no caching: every fetch hits the service once.
pub struct HoydedataClient {
    config: ServiceConfig,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for HoydedataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoydedataClient")
            .field("endpoint", &self.config.endpoint.as_str())
            .field("spatial_ref", &self.config.spatial_ref)
            .finish()
    }
}

impl HoydedataClient {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("terrenghenter/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Download the raster described by `fetch` and write it to `fetch.output_path`.
    pub fn fetch(&self, fetch: &FetchRequest) -> Result<FetchOutcome> {
        let request = ExportImageRequest::for_fetch(&self.config, fetch);
        let response = self.execute(&request)?;
        let bytes_written = response.write_to(&fetch.output_path)?;

        info!(
            "saved {} bytes to {}",
            bytes_written,
            fetch.output_path.display()
        );
        Ok(FetchOutcome {
            path: fetch.output_path.clone(),
            bytes_written,
        })
    }

    /// Perform the HTTP GET and collect the response without judging it.
    pub fn execute(&self, request: &ExportImageRequest) -> Result<ServiceResponse> {
        info!(
            "requesting {} px image for bbox {} ({})",
            request.param("size").unwrap_or("?"),
            request.param("bbox").unwrap_or("?"),
            self.config.spatial_ref
        );
        let url = request.url();
        debug!("GET {}", url);

        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes()?.to_vec();

        debug!(
            "response HTTP {} ({}), {} bytes",
            status,
            content_type.as_deref().unwrap_or("no content type"),
            body.len()
        );
        Ok(ServiceResponse::new(status, content_type, body))
    }
}
