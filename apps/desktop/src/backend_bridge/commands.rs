//! Backend commands queued from UI to backend worker.

use client_core::session::SessionEffect;
use std::path::PathBuf;
use url::Url;

#[derive(Debug)]
pub enum BackendCommand {
    /// Run a session effect and report its completion.
    Run(SessionEffect),
    /// Read a local image; the completion carries `ticket` back.
    ReadUpload {
        ticket: u64,
        path: PathBuf,
    },
    SaveResult {
        url: Url,
        path: PathBuf,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Run(SessionEffect::Generate { .. }) => "generate",
            Self::Run(SessionEffect::RefreshHistory) => "refresh_history",
            Self::ReadUpload { .. } => "read_upload",
            Self::SaveResult { .. } => "save_result",
        }
    }
}
