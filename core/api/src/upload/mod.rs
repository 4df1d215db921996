//! Video uploads.
//!
//! Uploading is two steps: ask the API for an upload ticket (which
//! creates the video and a tus upload resource), then send the file
//! bytes to the ticket's `upload_link`. The approach is always tus,
//! whatever the caller put in the parameters.

pub mod retry;
pub mod tus;

pub use retry::RetryPolicy;
pub use tus::{ProgressFn, TusUpload, OFFSET_CONTENT_TYPE, TUS_VERSION};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};

use vimeo_common::{Error, Result, VideoUri};

use crate::client::Vimeo;
use crate::request::RequestOptions;

/// Creates a new video and returns its upload ticket.
pub const UPLOAD_PATH: &str = "/me/videos?fields=uri,name,upload";

/// Upload approach the client always requests.
pub const TUS_APPROACH: &str = "tus";

/// The API's answer to an upload request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTicket {
    /// URI of the video being uploaded.
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub upload: Option<UploadDetails>,
}

/// Upload descriptor inside a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDetails {
    #[serde(default)]
    pub approach: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    /// Where the tus transfer goes.
    #[serde(default)]
    pub upload_link: Option<String>,
}

impl UploadTicket {
    fn upload_link(&self) -> Result<&str> {
        self.upload
            .as_ref()
            .and_then(|u| u.upload_link.as_deref())
            .ok_or_else(|| Error::Upload("upload ticket has no upload link".to_string()))
    }

    /// The ticket must be for a tus upload; other approaches need a
    /// different transfer.
    fn check_approach(&self) -> Result<()> {
        match self.upload.as_ref().and_then(|u| u.approach.as_deref()) {
            Some(approach) if approach != TUS_APPROACH => Err(Error::Upload(format!(
                "upload ticket uses the {} approach, expected {}",
                approach, TUS_APPROACH
            ))),
            _ => Ok(()),
        }
    }

    fn video_uri(&self) -> Result<VideoUri> {
        let uri = self
            .uri
            .as_deref()
            .ok_or_else(|| Error::Upload("upload ticket has no video URI".to_string()))?;
        VideoUri::new(uri)
    }
}

impl Vimeo {
    /// Upload a new video from a local file.
    ///
    /// `params` holds any video metadata to set (name, privacy, ...).
    /// `progress` is called with `(bytes_uploaded, bytes_total)` as the
    /// server confirms each chunk.
    ///
    /// # Errors
    /// - `Error::FileNotFound` if the file cannot be stat'ed
    /// - `Error::UploadInit` if the ticket request fails
    /// - Transfer errors from [`TusUpload::perform`]
    pub async fn upload<P>(
        &self,
        file: impl AsRef<Path>,
        params: Value,
        mut progress: P,
    ) -> Result<VideoUri>
    where
        P: FnMut(u64, u64) + Send,
    {
        let file = file.as_ref();
        let size = file_size(file).await?;
        let params = tus_params(params, size)?;

        info!(file = %file.display(), size, "starting upload");
        let options = RequestOptions::post(UPLOAD_PATH).with_query(Value::Object(params));
        let ticket = self.request_ticket(options).await?;

        self.perform_tus_upload(file, size, &ticket, &mut progress)
            .await
    }

    /// Upload a new version of an existing video.
    ///
    /// Returns `video_uri` once the new file has been transferred.
    pub async fn replace<P>(
        &self,
        file: impl AsRef<Path>,
        video_uri: &str,
        params: Value,
        mut progress: P,
    ) -> Result<VideoUri>
    where
        P: FnMut(u64, u64) + Send,
    {
        let video_uri = VideoUri::new(video_uri)?;
        let file = file.as_ref();
        let size = file_size(file).await?;
        let mut params = tus_params(params, size)?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        params.insert("file_name".to_string(), json!(file_name));

        info!(file = %file.display(), size, video = %video_uri, "replacing video");
        let options = RequestOptions::post(format!("{}/versions?fields=upload", video_uri))
            .with_query(Value::Object(params));
        let mut ticket = self.request_ticket(options).await?;
        ticket.uri = Some(video_uri.to_string());

        self.perform_tus_upload(file, size, &ticket, &mut progress)
            .await
    }

    async fn request_ticket(&self, options: RequestOptions) -> Result<UploadTicket> {
        let response = self
            .request(options)
            .await
            .map_err(|e| Error::UploadInit(Box::new(e)))?;
        response.json().map_err(|e| Error::UploadInit(Box::new(e)))
    }

    /// Transfer the file described by `ticket`.
    pub(crate) async fn perform_tus_upload(
        &self,
        file: &Path,
        size: u64,
        ticket: &UploadTicket,
        progress: ProgressFn<'_>,
    ) -> Result<VideoUri> {
        let uri = ticket.video_uri()?;
        let link = ticket.upload_link()?;
        ticket.check_approach()?;
        if let Some(expected) = ticket.upload.as_ref().and_then(|u| u.size) {
            if expected != size {
                warn!(expected, size, "upload ticket size differs from the file");
            }
        }
        debug!(video = %uri, link, "upload ticket issued");

        let upload = TusUpload::new(
            self.transport(),
            link,
            self.config().chunk_size,
            RetryPolicy::new(self.config().retry_delays()),
        )?;
        upload.perform(file, size, progress).await?;

        Ok(uri)
    }
}

/// Size of a regular file, or `FileNotFound`.
async fn file_size(path: &Path) -> Result<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        Ok(_) => {
            debug!(file = %path.display(), "upload source is not a regular file");
            Err(Error::FileNotFound(path.display().to_string()))
        }
        Err(e) => {
            debug!(file = %path.display(), error = %e, "cannot stat upload source");
            Err(Error::FileNotFound(path.display().to_string()))
        }
    }
}

/// Force `upload.approach = tus` and `upload.size = size` into `params`.
fn tus_params(params: Value, size: u64) -> Result<Map<String, Value>> {
    let mut params = match params {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        _ => {
            return Err(Error::InvalidInput(
                "Upload parameters must be an object".to_string(),
            ))
        }
    };

    let upload = params
        .entry("upload")
        .or_insert_with(|| Value::Object(Map::new()));
    if !upload.is_object() {
        *upload = Value::Object(Map::new());
    }
    if let Value::Object(upload) = upload {
        upload.insert("approach".to_string(), json!(TUS_APPROACH));
        upload.insert("size".to_string(), json!(size));
    }

    Ok(params)
}
