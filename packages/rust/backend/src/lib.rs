//! HTTP client for the pile-driving record service.
//!
//! Two endpoints are used:
//! - `GET {base}/getpilestodriving?project_id=N` lists piles still to be driven
//! - `POST {base}/` files a completed [`PileDrivingRecord`]
//!
//! Nothing here retries. Callers decide what the operator sees.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use pilelog_shared::{BackendConfig, PileDrivingRecord, PileLogError, Result, SubmissionResult};

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("PileLog/", env!("CARGO_PKG_VERSION"));

/// Path of the pile list endpoint, relative to the base URL.
const PILES_PATH: &str = "getpilestodriving";

// ---------------------------------------------------------------------------
// BackendClient
// ---------------------------------------------------------------------------

/// Thin wrapper over a shared `reqwest` client bound to one base URL.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for the configured backend.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PileLogError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the identifiers of piles awaiting driving for `project_id`.
    ///
    /// Order is preserved exactly as the backend returns it.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn fetch_piles(&self, project_id: i64) -> Result<Vec<String>> {
        let url = format!("{}/{PILES_PATH}", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("project_id", project_id)])
            .send()
            .await
            .map_err(|e| PileLogError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "pile list request rejected");
            return Err(PileLogError::Backend {
                status: status.to_string(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| PileLogError::Network(e.to_string()))?;

        let piles: Vec<String> = serde_json::from_str(&body)
            .map_err(|e| PileLogError::Decode(format!("pile list is not a JSON string array: {e}")))?;

        info!(count = piles.len(), "fetched piles to drive");
        Ok(piles)
    }

    /// Post a completed record. Only HTTP 200 counts as accepted.
    #[instrument(skip_all, fields(pile = %record.pile_number, base_url = %self.base_url))]
    pub async fn submit(&self, record: &PileDrivingRecord) -> SubmissionResult {
        let url = format!("{}/", self.base_url);

        if let Some(notes) = &record.notes {
            debug!(notes = %notes, "operator notes are not part of the backend schema");
        }

        let resp = match self.client.post(&url).json(record).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "record submission failed");
                return SubmissionResult::rejected(e.to_string());
            }
        };

        let status = resp.status();
        if status == StatusCode::OK {
            info!(%status, "record accepted");
            SubmissionResult::accepted(status.to_string())
        } else {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, body = %body, "record rejected");
            SubmissionResult::rejected(status.to_string())
        }
    }
}
