//! File lookup and upload endpoints.

use crate::ReputationClient;
use phishnet_core::{Envelope, FileObject, Lookup, PhishnetError, ReputationReport, Result, UploadObject};
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// File endpoints
pub struct FilesApi<'a> {
    client: &'a ReputationClient,
}

impl<'a> FilesApi<'a> {
    pub(crate) const fn new(client: &'a ReputationClient) -> Self {
        Self { client }
    }

    /// Look up the last analysis for a SHA-256.
    ///
    /// `404` means the service has never seen the file.
    pub async fn lookup(&self, sha256: &str) -> Result<Lookup> {
        let response = self.client.get(&format!("/files/{sha256}")).await?;

        match response.status().as_u16() {
            200 => {
                let envelope: Envelope<FileObject> = ReputationClient::read_json(response).await?;
                let stats = envelope.data.attributes.last_analysis_stats;
                debug!(sha256, total = stats.total_engines(), "report found");
                Ok(Lookup::Found(ReputationReport::new(sha256, stats)))
            }
            404 => {
                debug!(sha256, "hash unknown to service");
                Ok(Lookup::NotFound)
            }
            _ => Err(ReputationClient::status_error(response).await),
        }
    }

    /// Upload a file for analysis and return the analysis job id
    pub async fn submit(&self, content: &[u8], filename: &str) -> Result<String> {
        let part = Part::bytes(content.to_vec()).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let response = self.client.post_multipart("/files", form).await?;

        match response.status().as_u16() {
            200 | 202 => {
                let envelope: Envelope<UploadObject> = ReputationClient::read_json(response).await?;
                let job_id = envelope.data.id;
                if job_id.is_empty() {
                    return Err(PhishnetError::MalformedResponse(
                        "upload response carried an empty data.id".into(),
                    ));
                }
                debug!(filename, job_id = %job_id, "file submitted");
                Ok(job_id)
            }
            _ => Err(ReputationClient::status_error(response).await),
        }
    }
}
