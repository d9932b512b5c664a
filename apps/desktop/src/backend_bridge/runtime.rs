//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{session::execute_effect, ClientSettings, StainClient, UploadFile};
use crossbeam_channel::{Receiver, Sender};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{UiError, UiErrorContext, UiEvent},
};

/// Spawns the backend worker thread. Every command runs as its own task, so
/// completions may arrive in any order; the model sorts that out.
///
/// `ui_tx` must be unbounded: a dropped generation completion would leave
/// the session generating forever.
pub fn launch(
    settings: ClientSettings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let client = match StainClient::from_settings(&settings) {
                Ok(client) => Arc::new(client),
                Err(err) => {
                    let _ = ui_tx.send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err}"),
                    )));
                    tracing::error!("failed to build service client: {err}");
                    return;
                }
            };
            tracing::info!(api_url = client.api_url(), "backend worker ready");
            let _ = ui_tx.send(UiEvent::Info(format!(
                "using generation service at {}",
                client.api_url()
            )));

            while let Ok(cmd) = cmd_rx.recv() {
                let client = Arc::clone(&client);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let event = run_command(&client, cmd).await;
                    if ui_tx.send(event).is_err() {
                        tracing::warn!("ui event queue closed; dropping backend completion");
                    }
                });
            }
            tracing::debug!("command queue closed; backend worker exiting");
        });
    })
}

async fn run_command(client: &StainClient, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::Run(effect) => UiEvent::Session(execute_effect(client, effect).await),
        BackendCommand::ReadUpload { ticket, path } => match UploadFile::read(&path).await {
            Ok(upload) => UiEvent::UploadRead { ticket, upload },
            Err(err) => UiEvent::UploadFailed {
                ticket,
                error: UiError::from_message(UiErrorContext::Upload, err.to_string()),
            },
        },
        BackendCommand::SaveResult { url, path } => {
            let bytes = match client.fetch_result(&url).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    return UiEvent::Error(UiError::from_message(
                        UiErrorContext::SaveResult,
                        err.to_string(),
                    ))
                }
            };
            match tokio::fs::write(&path, &bytes).await {
                Ok(()) => UiEvent::ResultSaved {
                    path,
                    bytes: bytes.len(),
                },
                Err(err) => UiEvent::Error(UiError::from_message(
                    UiErrorContext::SaveResult,
                    format!("failed to write '{}': {err}", path.display()),
                )),
            }
        }
    }
}
