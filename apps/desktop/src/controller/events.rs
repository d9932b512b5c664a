//! UI/backend events and error modeling for the console controller.

use std::path::PathBuf;

use client_core::{session::SessionEvent, UploadFile};

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    Session(SessionEvent),
    UploadRead { ticket: u64, upload: UploadFile },
    UploadFailed { ticket: u64, error: UiError },
    ResultSaved { path: PathBuf, bytes: usize },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Service,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Upload,
    SaveResult,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("invalid")
            || lower.contains("unknown")
            || lower.contains("failed to read upload")
            || lower.contains("no such file")
            || lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if lower.contains("service returned http")
            || lower.contains("not initialized")
            || lower.contains("model")
        {
            UiErrorCategory::Service
        } else if lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("connection")
            || lower.contains("transport")
            || lower.contains("dns")
            || lower.contains("disconnected")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn user_text(&self) -> String {
        let hint = match self.category {
            UiErrorCategory::Transport => "check the service address/network and retry",
            UiErrorCategory::Service => "the generation service reported a problem",
            UiErrorCategory::Validation => "check the input and retry",
            UiErrorCategory::Unknown => "unexpected error",
        };
        format!("{} ({hint})", self.message)
    }
}
