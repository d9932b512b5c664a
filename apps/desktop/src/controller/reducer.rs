//! Applies user actions and backend completions to the owned UI model.

use std::path::PathBuf;

use chrono::Utc;
use client_core::{
    compare::{Catalog, CompareEvent, CompareState},
    session::{reduce, SessionEffect, SessionEvent, SessionState},
};

use crate::{backend_bridge::commands::BackendCommand, controller::events::UiEvent};

#[derive(Debug)]
pub struct AppModel {
    pub session: SessionState,
    pub compare: CompareState,
    pub catalog: Catalog,
    pub status: String,
    last_ticket: u64,
    awaited_upload: Option<u64>,
    history_requested: u64,
    history_settled: u64,
}

impl AppModel {
    /// Builds the model together with the startup commands.
    pub fn new(catalog: Catalog) -> (Self, Vec<BackendCommand>) {
        let (session, effects) = SessionState::initialize();
        let mut model = Self {
            session,
            compare: CompareState::default(),
            catalog,
            status: String::new(),
            last_ticket: 0,
            awaited_upload: None,
            history_requested: 0,
            history_settled: 0,
        };
        let commands = model.commands_for(effects);
        (model, commands)
    }

    /// Command to read a local image. Only the read issued last is turned
    /// into a session upload; `new` and `select` abandon it.
    pub fn request_upload(&mut self, path: PathBuf) -> BackendCommand {
        self.last_ticket += 1;
        if let Some(abandoned) = self.awaited_upload.replace(self.last_ticket) {
            tracing::debug!(abandoned, ticket = self.last_ticket, "upload read superseded");
        }
        BackendCommand::ReadUpload {
            ticket: self.last_ticket,
            path,
        }
    }

    /// Whether an issued upload read has not come back yet.
    pub fn upload_pending(&self) -> bool {
        self.awaited_upload.is_some()
    }

    /// Whether every dispatched history refresh has completed.
    pub fn history_settled(&self) -> bool {
        self.history_settled >= self.history_requested
    }

    pub fn apply_session(&mut self, event: SessionEvent) -> Vec<BackendCommand> {
        match &event {
            SessionEvent::StartNew | SessionEvent::HistoryItemSelected(_) => {
                self.awaited_upload = None;
            }
            SessionEvent::HistoryLoaded(_) | SessionEvent::HistoryFailed(_) => {
                self.history_settled += 1;
            }
            _ => {}
        }

        let state = std::mem::take(&mut self.session);
        let (next, effects) = reduce(state, event);
        self.session = next;
        if let Some(notice) = self.session.notice() {
            self.status = notice.to_string();
        }
        self.commands_for(effects)
    }

    fn commands_for(&mut self, effects: Vec<SessionEffect>) -> Vec<BackendCommand> {
        let mut commands = Vec::with_capacity(effects.len());
        for effect in effects {
            if matches!(effect, SessionEffect::RefreshHistory) {
                self.history_requested += 1;
            }
            commands.push(BackendCommand::Run(effect));
        }
        commands
    }

    /// Rolls back bookkeeping for a command the worker never received.
    pub fn command_rejected(&mut self, cmd: BackendCommand) -> Vec<BackendCommand> {
        let status = std::mem::take(&mut self.status);
        let followups = match cmd {
            BackendCommand::ReadUpload { ticket, .. } => {
                if self.awaited_upload == Some(ticket) {
                    self.awaited_upload = None;
                }
                Vec::new()
            }
            BackendCommand::Run(SessionEffect::RefreshHistory) => {
                self.history_requested = self.history_requested.saturating_sub(1);
                Vec::new()
            }
            BackendCommand::Run(SessionEffect::Generate { request, .. }) => {
                self.apply_session(SessionEvent::GenerationFailed {
                    request,
                    reason: "command was not queued".to_string(),
                })
            }
            BackendCommand::SaveResult { .. } => Vec::new(),
        };
        if self.status.is_empty() {
            self.status = status;
        }
        followups
    }

    pub fn apply_compare(&mut self, event: CompareEvent) {
        let state = std::mem::take(&mut self.compare);
        self.compare = state.apply(event);
    }

    pub fn apply_ui_event(&mut self, event: UiEvent) -> Vec<BackendCommand> {
        match event {
            UiEvent::Info(text) => {
                self.status = text;
                Vec::new()
            }
            UiEvent::Session(event) => self.apply_session(event),
            UiEvent::UploadRead { ticket, upload } => {
                if self.awaited_upload != Some(ticket) {
                    tracing::debug!(ticket, awaited = ?self.awaited_upload, "discarding stale upload read");
                    return Vec::new();
                }
                self.awaited_upload = None;
                self.apply_session(SessionEvent::FileSelected(upload))
            }
            UiEvent::UploadFailed { ticket, error } => {
                if self.awaited_upload != Some(ticket) {
                    tracing::debug!(ticket, "ignoring failure of abandoned upload read");
                    return Vec::new();
                }
                self.awaited_upload = None;
                self.apply_ui_event(UiEvent::Error(error))
            }
            UiEvent::ResultSaved { path, bytes } => {
                self.status = format!("saved {bytes} bytes to {}", path.display());
                Vec::new()
            }
            UiEvent::Error(err) => {
                tracing::warn!(context = ?err.context(), category = ?err.category(), "{}", err.message());
                self.status = err.user_text();
                Vec::new()
            }
        }
    }

    /// Command to download the current result, if it lives on the service.
    /// Without a path the result is saved under a timestamped name.
    pub fn save_result(&mut self, path: Option<PathBuf>) -> Option<BackendCommand> {
        let url = self.session.result().and_then(|result| result.as_url());
        let default_name = self.session.download_name(Utc::now());
        match (url, path.or(default_name.map(PathBuf::from))) {
            (Some(url), Some(path)) => Some(BackendCommand::SaveResult {
                url: url.clone(),
                path,
            }),
            _ => {
                self.status = "no generated result to save yet".to_string();
                None
            }
        }
    }
}
