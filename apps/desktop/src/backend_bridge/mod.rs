//! Backend worker: runs network effects off the UI thread.

pub mod commands;
pub mod runtime;
