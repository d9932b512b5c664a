use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use shared::domain::ImageRef;

use crate::ClientError;

const FALLBACK_MIME: &str = "application/octet-stream";

/// An image the user picked, ready to be sent to the generation service.
///
/// The bytes are shared so the payload can travel through the effect queue
/// without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    file_name: String,
    mime_type: String,
    source: PathBuf,
    bytes: Arc<[u8]>,
}

impl UploadFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let file_name = file_name.into();
        Self {
            mime_type: guess_mime(&file_name),
            source: PathBuf::from(&file_name),
            file_name,
            bytes: bytes.into(),
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::ReadUpload {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self {
            mime_type: guess_mime(&file_name),
            source: path.to_path_buf(),
            file_name,
            bytes: bytes.into(),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Local reference used to show the upload before the service answers.
    pub fn preview(&self) -> ImageRef {
        ImageRef::Local(self.source.clone())
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("source", &self.source)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn guess_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(FALLBACK_MIME)
        .to_string()
}
