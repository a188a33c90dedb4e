//! Analysis polling endpoint.

use crate::ReputationClient;
use phishnet_core::{AnalysisObject, AnalysisPoll, AnalysisStatus, Envelope, PhishnetError, Result};

/// Analysis endpoints
pub struct AnalysesApi<'a> {
    client: &'a ReputationClient,
}

impl<'a> AnalysesApi<'a> {
    pub(crate) const fn new(client: &'a ReputationClient) -> Self {
        Self { client }
    }

    /// Fetch the current status of an analysis job
    pub async fn status(&self, job_id: &str) -> Result<AnalysisPoll> {
        let response = self.client.get(&format!("/analyses/{job_id}")).await?;

        if response.status().as_u16() != 200 {
            return Err(ReputationClient::status_error(response).await);
        }

        let raw_report: serde_json::Value = ReputationClient::read_json(response).await?;
        let envelope: Envelope<AnalysisObject> = serde_json::from_value(raw_report.clone())
            .map_err(|e| PhishnetError::MalformedResponse(e.to_string()))?;

        Ok(AnalysisPoll {
            status: AnalysisStatus::from_wire(&envelope.data.attributes.status),
            raw_report,
        })
    }
}
