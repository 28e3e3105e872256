//! Validated, size-bounded download of a resolved link.

use super::temp_file::{remove_quietly, safe_file_name, TempPdf};
use super::DeliveryError;
use crate::acquisition::candidates::is_pdf_content_type;
use crate::acquisition::http_client::{HttpClient, StreamOutcome};
use crate::config::{MAX_UPLOAD_BYTES, MIN_PDF_SIZE_BYTES};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Fetches PDFs into temp files for upload.
#[derive(Clone)]
pub struct Delivery {
    http: HttpClient,
    temp_dir: PathBuf,
    min_size: u64,
    max_size: u64,
    probe_timeout: Duration,
    download_timeout: Duration,
}

impl Delivery {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            temp_dir: std::env::temp_dir(),
            min_size: MIN_PDF_SIZE_BYTES,
            max_size: MAX_UPLOAD_BYTES,
            probe_timeout: Duration::from_secs(15),
            download_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_size_bounds(mut self, min_size: u64, max_size: u64) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Probe `url`, stream it to a temp file, and check what arrived.
    ///
    /// On any error the partial file is already gone.
    #[instrument(skip(self, referer))]
    pub async fn download(
        &self,
        url: &str,
        referer: Option<&str>,
        title: &str,
    ) -> Result<TempPdf, DeliveryError> {
        let probe = self
            .http
            .head_check(url, referer, self.probe_timeout)
            .await
            .map_err(|e| DeliveryError::Network(format!("{e:#}")))?;

        let content_type = probe.content_type.unwrap_or_default();
        if !is_pdf_content_type(&content_type) {
            return Err(DeliveryError::NotPdf { content_type });
        }
        if let Some(len) = probe.content_length {
            if len < self.min_size {
                return Err(DeliveryError::TooSmall { bytes: len });
            }
            if len > self.max_size {
                return Err(DeliveryError::TooLarge {
                    limit: self.max_size,
                });
            }
        }

        let unique = uuid::Uuid::new_v4().simple().to_string();
        let path = self.temp_dir.join(safe_file_name(title, &unique[..8]));

        let outcome = self
            .http
            .stream_to_file(url, referer, &path, self.max_size, self.download_timeout)
            .await;

        let bytes = match outcome {
            Ok(StreamOutcome::Written {
                bytes,
                content_type: served,
            }) => {
                let served = served.unwrap_or_default();
                if served != content_type {
                    debug!(probed = %content_type, %served, "content type changed between probe and download");
                }
                bytes
            }
            Ok(StreamOutcome::BadStatus(status)) => {
                remove_quietly(&path).await;
                return Err(DeliveryError::HttpStatus(status));
            }
            Ok(StreamOutcome::TooLarge { limit }) => {
                remove_quietly(&path).await;
                return Err(DeliveryError::TooLarge { limit });
            }
            Err(e) => {
                remove_quietly(&path).await;
                warn!(error = %e, "download failed");
                return Err(DeliveryError::Network(format!("{e:#}")));
            }
        };

        let pdf = TempPdf::new(path, bytes);
        if bytes < self.min_size {
            pdf.discard().await;
            return Err(DeliveryError::TooSmall { bytes });
        }

        info!(bytes, path = %pdf.path().display(), "PDF downloaded");
        Ok(pdf)
    }
}
