//! tus 1.0 resumable transfer.
//!
//! The upload resource already exists (the API created it when issuing
//! the ticket), so a transfer is: `HEAD` to learn the server's offset,
//! then `PATCH` chunks from that offset until the whole file is there.

use bytes::Bytes;
use reqwest::header::{HeaderName, CONTENT_TYPE};
use reqwest::Method;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use vimeo_common::{Error, Result};

use super::retry::{RetryPolicy, RetryState};
use crate::request::PreparedRequest;
use crate::transport::{ApiResponse, Transport};

/// Protocol version sent in `Tus-Resumable`.
pub const TUS_VERSION: &str = "1.0.0";
/// Content type of PATCH bodies.
pub const OFFSET_CONTENT_TYPE: &str = "application/offset+octet-stream";

const TUS_RESUMABLE: &str = "tus-resumable";
const UPLOAD_OFFSET: &str = "upload-offset";

/// Progress callback: `(bytes_uploaded, bytes_total)`.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(u64, u64) + Send);

/// A single file transfer to an existing tus upload resource.
pub struct TusUpload<'a> {
    transport: &'a dyn Transport,
    upload_link: Url,
    chunk_size: u64,
    retry: RetryPolicy,
}

impl<'a> TusUpload<'a> {
    /// Prepare a transfer to `upload_link`.
    ///
    /// # Errors
    /// - `upload_link` is not an absolute URL
    /// - `chunk_size` is zero
    pub fn new(
        transport: &'a dyn Transport,
        upload_link: &str,
        chunk_size: u64,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let upload_link = Url::parse(upload_link)
            .map_err(|e| Error::InvalidInput(format!("Invalid upload link: {}", e)))?;
        if chunk_size == 0 {
            return Err(Error::InvalidInput("Chunk size must be positive".to_string()));
        }
        Ok(Self {
            transport,
            upload_link,
            chunk_size,
            retry,
        })
    }

    /// Send `path` (of `size` bytes), resuming after retryable failures.
    ///
    /// # Errors
    /// - The file cannot be opened or read
    /// - A non-retryable response (such as 404 or 410) from the server
    /// - `Error::Upload` once every retry has failed
    pub async fn perform(&self, path: &Path, size: u64, progress: ProgressFn<'_>) -> Result<()> {
        let mut file = File::open(path).await?;
        let mut offset = 0u64;
        let mut retries = RetryState::new(&self.retry);
        debug!(
            size,
            chunk_size = self.chunk_size,
            max_retries = self.retry.max_retries(),
            link = %self.upload_link,
            "starting tus transfer"
        );

        loop {
            match self.transfer(&mut file, size, &mut offset, progress).await {
                Ok(()) => {
                    info!(size, link = %self.upload_link, "upload complete");
                    return Ok(());
                }
                Err(err) if err.is_retryable() => match retries.next_delay(offset) {
                    Some(delay) => {
                        warn!(
                            "Attempt {} failed at offset {}: {}. Retrying in {:?}...",
                            retries.failures(),
                            offset,
                            err,
                            delay
                        );
                        sleep(delay).await;
                    }
                    None => {
                        return Err(Error::Upload(format!(
                            "giving up after {} attempts at offset {} of {}: {}",
                            retries.failures(),
                            offset,
                            size,
                            err
                        )));
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// One pass: learn the server offset, then PATCH until done.
    ///
    /// `offset` always holds the last offset the server confirmed.
    async fn transfer(
        &self,
        file: &mut File,
        size: u64,
        offset: &mut u64,
        progress: ProgressFn<'_>,
    ) -> Result<()> {
        let head = PreparedRequest::new(Method::HEAD, self.upload_link.clone())
            .with_header(HeaderName::from_static(TUS_RESUMABLE), TUS_VERSION)?;
        let response = self.transport.send(head).await?;
        let server_offset = read_offset(&response)?;
        if server_offset > size {
            return Err(Error::Upload(format!(
                "server offset {} exceeds file size {}",
                server_offset, size
            )));
        }

        *offset = server_offset;
        progress(*offset, size);

        while *offset < size {
            let len = self.chunk_size.min(size - *offset);
            file.seek(SeekFrom::Start(*offset)).await?;
            let mut chunk = vec![0u8; len as usize];
            file.read_exact(&mut chunk).await?;

            let patch = PreparedRequest::new(Method::PATCH, self.upload_link.clone())
                .with_header(HeaderName::from_static(TUS_RESUMABLE), TUS_VERSION)?
                .with_header(HeaderName::from_static(UPLOAD_OFFSET), &offset.to_string())?
                .with_header(CONTENT_TYPE, OFFSET_CONTENT_TYPE)?
                .with_body(Bytes::from(chunk));

            let response = self.transport.send(patch).await?;
            let next = read_offset(&response)?;
            if next <= *offset || next > size {
                return Err(Error::Upload(format!(
                    "server reported offset {} after sending {} bytes at {}",
                    next, len, offset
                )));
            }

            *offset = next;
            debug!(offset = *offset, size, "chunk accepted");
            progress(*offset, size);
        }

        Ok(())
    }
}

fn read_offset(response: &ApiResponse) -> Result<u64> {
    response
        .header(UPLOAD_OFFSET)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| Error::Upload("missing or invalid Upload-Offset header".to_string()))
}
