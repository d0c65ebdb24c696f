use crate::config::UploadConfig;
use crate::encode::encode_content;
use crate::github::{ContentsApi, ProbeError, Transport, WritePayload, probe};
use crate::select::Candidate;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("cannot determine remote state: {0}")]
    Probe(#[from] ProbeError),
    #[error("cannot read local file: {0}")]
    Read(#[from] std::io::Error),
    #[error("write request failed: {0:#}")]
    Write(anyhow::Error),
    #[error("write rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub remote_path: String,
    /// HTTP status of the accepted write.
    pub result: Result<u16, UploadError>,
}

impl UploadOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl UploadSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Publishes local files to a branch, one file at a time.
pub struct Uploader<'a, T: ?Sized> {
    config: &'a UploadConfig,
    api: ContentsApi,
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> Uploader<'a, T> {
    pub fn new(config: &'a UploadConfig, transport: &'a T) -> Self {
        Self {
            config,
            api: ContentsApi::new(config),
            transport,
        }
    }

    /// Uploads every candidate and prints one status line per file.
    ///
    /// A failing file never stops the remaining ones.
    pub fn upload_all(&self, candidates: impl IntoIterator<Item = Candidate>) -> UploadSummary {
        let mut summary = UploadSummary::default();
        for candidate in candidates {
            let outcome = self.upload_file(&candidate);
            if outcome.succeeded() {
                summary.succeeded += 1;
                println!("✅ {}", outcome.remote_path);
            } else {
                summary.failed += 1;
                println!("❌ {}", outcome.remote_path);
            }
        }
        summary
    }

    pub fn upload_file(&self, candidate: &Candidate) -> UploadOutcome {
        let result = self.reconcile(candidate);
        match &result {
            Ok(status) => log::debug!("{}: HTTP {status}", candidate.remote_path),
            Err(UploadError::Probe(error)) => log::error!(
                "{}: {error}\n   Check: token permissions, existence of {}, and network connection",
                candidate.remote_path,
                self.config.full_repo_name()
            ),
            Err(UploadError::Read(error)) => log::error!(
                "cannot open {}: {error}",
                candidate.local_path.display()
            ),
            Err(error) => log::error!("{}: {error}", candidate.remote_path),
        }
        UploadOutcome {
            remote_path: candidate.remote_path.clone(),
            result,
        }
    }

    fn reconcile(&self, candidate: &Candidate) -> Result<u16, UploadError> {
        let state = probe(&self.api, self.transport, &candidate.remote_path)?;

        // The whole file is read and dropped before the next candidate starts.
        let content = encode_content(&std::fs::read(&candidate.local_path)?);

        let payload = WritePayload {
            message: &self.config.message,
            content,
            branch: &self.config.branch,
            sha: if state.exists { state.sha } else { None },
        };
        let request = self
            .api
            .put(&candidate.remote_path, &payload)
            .map_err(UploadError::Write)?;
        let response = self.transport.send(&request).map_err(UploadError::Write)?;
        match response.status {
            200 | 201 => Ok(response.status),
            status => Err(UploadError::Rejected {
                status,
                body: response.body,
            }),
        }
    }
}
