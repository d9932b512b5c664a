//! Console application shell: owns the model, feeds it user commands and
//! backend completions, and prints what changed.

use std::{
    io::{BufRead, Write},
    time::{Duration, Instant},
};

use anyhow::Result;
use client_core::{
    compare::{Catalog, CompareEvent, PointerInput},
    session::SessionEvent,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{events::UiEvent, orchestration::dispatch_backend_command, reducer::AppModel},
    ui::console::{self, UserCommand},
};

const WAIT_LIMIT: Duration = Duration::from_secs(300);

pub struct ConsoleApp {
    model: AppModel,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
}

impl ConsoleApp {
    pub fn new(catalog: Catalog, cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        let (model, startup) = AppModel::new(catalog);
        let mut app = Self {
            model,
            cmd_tx,
            ui_rx,
        };
        app.dispatch(startup);
        app
    }

    pub fn run(&mut self, input: impl BufRead, mut out: impl Write) -> Result<()> {
        writeln!(out, "StainViz: type 'help' for commands")?;
        for line in input.lines() {
            let line = line?;
            self.drain_events();
            self.flush_status(&mut out)?;

            match console::parse_command(&line) {
                Ok(None) => {}
                Ok(Some(UserCommand::Quit)) => break,
                Ok(Some(command)) => self.handle(command, &mut out)?,
                Err(message) => writeln!(out, "{message}")?,
            }
            self.flush_status(&mut out)?;
        }
        Ok(())
    }

    fn handle(&mut self, command: UserCommand, out: &mut impl Write) -> Result<()> {
        match command {
            UserCommand::Upload(path) => {
                let cmd = self.model.request_upload(path);
                self.dispatch(vec![cmd]);
            }
            UserCommand::Direction(direction) => {
                self.session(SessionEvent::DirectionChanged(direction));
                writeln!(out, "{}", direction.prompt())?;
            }
            UserCommand::History => {
                self.session(SessionEvent::RefreshRequested);
                self.wait_for(AppModel::history_settled, WAIT_LIMIT);
                write!(out, "{}", console::render_history(&self.model.session))?;
            }
            UserCommand::Select(id) => match self.model.session.find_history(&id).cloned() {
                Some(item) => {
                    self.session(SessionEvent::HistoryItemSelected(item));
                    write!(out, "{}", console::render_session(&self.model.session))?;
                }
                None => writeln!(out, "no history item with id '{id}'")?,
            },
            UserCommand::New => {
                self.session(SessionEvent::StartNew);
                write!(out, "{}", console::render_session(&self.model.session))?;
            }
            UserCommand::Dismiss => self.session(SessionEvent::DismissNotice),
            UserCommand::Save(path) => {
                if let Some(cmd) = self.model.save_result(path) {
                    self.dispatch(vec![cmd]);
                }
            }
            UserCommand::Wait => {
                self.wait_for(
                    |model| !model.upload_pending() && !model.session.is_generating(),
                    WAIT_LIMIT,
                );
                write!(out, "{}", console::render_session(&self.model.session))?;
            }
            UserCommand::Status => {
                self.drain_events();
                write!(out, "{}", console::render_session(&self.model.session))?;
            }
            UserCommand::Toggle(slot) => {
                self.model.apply_compare(CompareEvent::Toggle(slot));
                write!(out, "{}", console::render_compare(&self.model.compare, &self.model.catalog))?;
            }
            UserCommand::Pointer { client_x, bounds } => {
                self.model.apply_compare(CompareEvent::Pointer {
                    input: PointerInput::MouseDown { client_x },
                    bounds,
                });
                writeln!(out, "slider at {:.1}%", self.model.compare.slider())?;
            }
            UserCommand::ShowCompare => {
                write!(out, "{}", console::render_compare(&self.model.compare, &self.model.catalog))?;
            }
            UserCommand::Help => writeln!(out, "{}", console::HELP)?,
            UserCommand::Quit => {}
        }
        Ok(())
    }

    fn session(&mut self, event: SessionEvent) {
        let commands = self.model.apply_session(event);
        self.dispatch(commands);
    }

    fn dispatch(&mut self, commands: Vec<BackendCommand>) {
        for cmd in commands {
            if let Some(rejected) = dispatch_backend_command(&self.cmd_tx, cmd, &mut self.model.status) {
                let followups = self.model.command_rejected(rejected);
                self.dispatch(followups);
            }
        }
    }

    fn apply(&mut self, event: UiEvent) {
        let commands = self.model.apply_ui_event(event);
        self.dispatch(commands);
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply(event);
        }
    }

    /// Applies backend events until `done` holds or `limit` elapses.
    fn wait_for(&mut self, done: impl Fn(&AppModel) -> bool, limit: Duration) {
        let deadline = Instant::now() + limit;
        loop {
            self.drain_events();
            if done(&self.model) {
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.ui_rx.recv_timeout(remaining) {
                Ok(event) => self.apply(event),
                Err(RecvTimeoutError::Timeout) => return,
                Err(RecvTimeoutError::Disconnected) => {
                    self.model.status =
                        "Backend command processor disconnected; restart the app".to_string();
                    return;
                }
            }
        }
    }

    fn flush_status(&mut self, out: &mut impl Write) -> Result<()> {
        if !self.model.status.is_empty() {
            writeln!(out, "{}", std::mem::take(&mut self.model.status))?;
        }
        Ok(())
    }
}
