//! Upload → generate → history workflow as a pure state machine.
//!
//! `reduce` never performs I/O. It returns the effects the caller must run;
//! `execute_effect` runs one against a [`StainService`] and yields the
//! completion event to feed back into `reduce`.

use chrono::{DateTime, Utc};
use shared::domain::{Direction, HistoryItem, ImageRef};
use tracing::{debug, info, warn};
use url::Url;

use crate::{StainService, UploadFile};

pub const GENERATION_FAILED_NOTICE: &str =
    "Failed to process image. Make sure the generation service is running.";

/// Sequence number of a dispatched generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestSeq(pub u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    input: Option<ImageRef>,
    result: Option<ImageRef>,
    is_generating: bool,
    direction: Direction,
    history: Vec<HistoryItem>,
    notice: Option<String>,
    last_issued: u64,
    pending: Option<RequestSeq>,
}

impl SessionState {
    /// Fresh session plus the startup history refresh.
    pub fn initialize() -> (SessionState, Vec<SessionEffect>) {
        (SessionState::default(), vec![SessionEffect::RefreshHistory])
    }

    pub fn input(&self) -> Option<&ImageRef> {
        self.input.as_ref()
    }

    pub fn result(&self) -> Option<&ImageRef> {
        self.result.as_ref()
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn pending_request(&self) -> Option<RequestSeq> {
        self.pending
    }

    /// Whether the results view replaces the empty upload prompt.
    pub fn has_content(&self) -> bool {
        self.input.is_some()
    }

    pub fn find_history(&self, id: &str) -> Option<&HistoryItem> {
        self.history.iter().find(|item| item.id.0 == id)
    }

    /// Suggested file name when saving the current result locally.
    pub fn download_name(&self, now: DateTime<Utc>) -> Option<String> {
        self.result
            .as_ref()
            .map(|_| format!("stainviz_{}.png", now.timestamp_millis()))
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    FileSelected(UploadFile),
    GenerationSucceeded { request: RequestSeq, result: Url },
    GenerationFailed { request: RequestSeq, reason: String },
    RefreshRequested,
    HistoryLoaded(Vec<HistoryItem>),
    HistoryFailed(String),
    HistoryItemSelected(HistoryItem),
    StartNew,
    DirectionChanged(Direction),
    DismissNotice,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    Generate {
        request: RequestSeq,
        upload: UploadFile,
        direction: Direction,
    },
    RefreshHistory,
}

pub fn reduce(mut state: SessionState, event: SessionEvent) -> (SessionState, Vec<SessionEffect>) {
    let mut effects = Vec::new();

    match event {
        SessionEvent::FileSelected(upload) => {
            state.last_issued += 1;
            let request = RequestSeq(state.last_issued);
            if let Some(superseded) = state.pending.replace(request) {
                debug!(superseded = superseded.0, request = request.0, "generation superseded");
            }
            state.input = Some(upload.preview());
            state.result = None;
            state.notice = None;
            state.is_generating = true;
            info!(
                request = request.0,
                file = upload.file_name(),
                direction = %state.direction,
                "generation dispatched"
            );
            effects.push(SessionEffect::Generate {
                request,
                upload,
                direction: state.direction,
            });
        }
        SessionEvent::GenerationSucceeded { request, result } => {
            if state.pending != Some(request) {
                discard_stale(&state, request);
            } else {
                info!(request = request.0, result = %result, "generation completed");
                state.pending = None;
                state.is_generating = false;
                state.result = Some(ImageRef::Remote(result));
                effects.push(SessionEffect::RefreshHistory);
            }
        }
        SessionEvent::GenerationFailed { request, reason } => {
            if state.pending != Some(request) {
                discard_stale(&state, request);
            } else {
                warn!(request = request.0, "generation failed: {reason}");
                state.pending = None;
                state.is_generating = false;
                state.result = None;
                state.notice = Some(GENERATION_FAILED_NOTICE.to_string());
            }
        }
        SessionEvent::RefreshRequested => effects.push(SessionEffect::RefreshHistory),
        SessionEvent::HistoryLoaded(items) => {
            debug!(items = items.len(), "history replaced");
            state.history = items;
        }
        SessionEvent::HistoryFailed(reason) => {
            warn!("history refresh failed, keeping {} items: {reason}", state.history.len());
        }
        SessionEvent::HistoryItemSelected(item) => {
            state.pending = None;
            state.is_generating = false;
            state.input = Some(ImageRef::Remote(item.bf_url));
            state.result = Some(ImageRef::Remote(item.he_url));
        }
        SessionEvent::StartNew => {
            state.pending = None;
            state.is_generating = false;
            state.input = None;
            state.result = None;
        }
        SessionEvent::DirectionChanged(direction) => state.direction = direction,
        SessionEvent::DismissNotice => state.notice = None,
    }

    (state, effects)
}

fn discard_stale(state: &SessionState, request: RequestSeq) {
    debug!(
        request = request.0,
        active = state.pending.map(|seq| seq.0),
        "discarding stale generation response"
    );
}

/// Performs one effect against the service and reports how it ended.
pub async fn execute_effect(service: &dyn StainService, effect: SessionEffect) -> SessionEvent {
    match effect {
        SessionEffect::Generate {
            request,
            upload,
            direction,
        } => match service.generate(upload, direction).await {
            Ok(result) => SessionEvent::GenerationSucceeded { request, result },
            Err(err) => SessionEvent::GenerationFailed {
                request,
                reason: err.to_string(),
            },
        },
        SessionEffect::RefreshHistory => match service.history().await {
            Ok(items) => SessionEvent::HistoryLoaded(items),
            Err(err) => SessionEvent::HistoryFailed(err.to_string()),
        },
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
