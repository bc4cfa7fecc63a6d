use std::path::PathBuf;

use async_trait::async_trait;
use survey_spec::{Receipt, SinkError, Submission, SubmissionSink};
use tracing::debug;

use crate::config::{Encoding, SinkKind, SubmissionConfig};

/// Writes each submission into its own file.
pub struct FileSink {
    dir: PathBuf,
    encoding: Encoding,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, encoding: Encoding) -> Self {
        Self {
            dir: dir.into(),
            encoding,
        }
    }

    fn file_name(&self, submission: &Submission) -> String {
        let extension = match self.encoding {
            Encoding::Json => "json",
            Encoding::Cbor => "cbor",
        };
        format!(
            "{}-{}.{}",
            submission.survey_id,
            submission.submitted_at.format("%Y%m%dT%H%M%S%.3fZ"),
            extension
        )
    }
}

#[async_trait]
impl SubmissionSink for FileSink {
    async fn submit(&self, submission: &Submission) -> Result<Receipt, SinkError> {
        let bytes = match self.encoding {
            Encoding::Json => serde_json::to_vec_pretty(submission)
                .map_err(|err| SinkError::Encode(err.to_string()))?,
            Encoding::Cbor => {
                serde_cbor::to_vec(submission).map_err(|err| SinkError::Encode(err.to_string()))?
            }
        };
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(self.file_name(submission));
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), "submission written");
        Ok(Receipt {
            reference: Some(path.display().to_string()),
        })
    }
}

/// POSTs the submission as JSON.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SubmissionSink for HttpSink {
    async fn submit(&self, submission: &Submission) -> Result<Receipt, SinkError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(submission)
            .send()
            .await
            .map_err(|err| SinkError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response.text().await;
        if !status.is_success() {
            return Err(rejection(status.as_u16(), body));
        }
        let body = body.map_err(|err| SinkError::Transport(err.to_string()))?;
        let reference = Some(body.trim().to_string()).filter(|body| !body.is_empty());
        Ok(Receipt { reference })
    }
}

fn rejection<E: std::fmt::Display>(status: u16, body: Result<String, E>) -> SinkError {
    SinkError::Rejected {
        status,
        body: body.unwrap_or_else(|err| format!("<unreadable body: {err}>")),
    }
}

/// Sink chosen by configuration.
pub enum ConfiguredSink {
    File(FileSink),
    Http(HttpSink),
}

impl ConfiguredSink {
    pub fn from_config(config: &SubmissionConfig) -> Result<Self, String> {
        match config.sink {
            SinkKind::File => Ok(ConfiguredSink::File(FileSink::new(
                config.output_dir.clone(),
                config.encoding,
            ))),
            SinkKind::Http => {
                let endpoint = config
                    .endpoint
                    .clone()
                    .filter(|endpoint| !endpoint.trim().is_empty())
                    .ok_or("the http sink needs submission.endpoint")?;
                Ok(ConfiguredSink::Http(HttpSink::new(endpoint)))
            }
        }
    }
}

#[async_trait]
impl SubmissionSink for ConfiguredSink {
    async fn submit(&self, submission: &Submission) -> Result<Receipt, SinkError> {
        match self {
            ConfiguredSink::File(sink) => sink.submit(submission).await,
            ConfiguredSink::Http(sink) => sink.submit(submission).await,
        }
    }
}
