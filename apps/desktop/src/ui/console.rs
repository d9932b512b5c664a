//! Command parsing and text rendering for the console front end.

use std::{fmt::Write as _, path::PathBuf};

use client_core::{
    compare::{Catalog, CompareState, ContainerBounds, SlotId},
    session::SessionState,
};
use shared::domain::Direction;

pub const HELP: &str = "\
commands:
  upload <path>                       send an image for staining
  direction <forward|reverse>         choose the model for the next upload
  history                             refresh and list past generations
  select <id>                         show a past generation
  new                                 clear the current view
  dismiss                             hide the current notice
  save [path]                         download the current result
  wait                                block until the running generation ends
  status                              show the current session
  compare toggle <gt|ai|bf>           change which images are compared
  compare pointer <x> <left> <width>  move the split to a pointer position
  compare show                        describe the comparison frame
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Upload(PathBuf),
    Direction(Direction),
    History,
    Select(String),
    New,
    Dismiss,
    Save(Option<PathBuf>),
    Wait,
    Status,
    Toggle(SlotId),
    Pointer { client_x: f64, bounds: ContainerBounds },
    ShowCompare,
    Help,
    Quit,
}

/// Parses one input line; blank lines and `#` comments yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("upload", [_, ..]) => UserCommand::Upload(PathBuf::from(rest.join(" "))),
        ("direction", [dir]) => UserCommand::Direction(dir.parse().map_err(|e| format!("{e}"))?),
        ("history", []) => UserCommand::History,
        ("select", [id]) => UserCommand::Select((*id).to_string()),
        ("new", []) => UserCommand::New,
        ("dismiss", []) => UserCommand::Dismiss,
        ("save", []) => UserCommand::Save(None),
        ("save", [_, ..]) => UserCommand::Save(Some(PathBuf::from(rest.join(" ")))),
        ("wait", []) => UserCommand::Wait,
        ("status", []) => UserCommand::Status,
        ("compare", ["toggle", slot]) => {
            UserCommand::Toggle(slot.parse().map_err(|e| format!("{e}"))?)
        }
        ("compare", ["pointer", x, left, width]) => UserCommand::Pointer {
            client_x: parse_number(x)?,
            bounds: ContainerBounds {
                left: parse_number(left)?,
                width: parse_number(width)?,
            },
        },
        ("compare", ["show"]) => UserCommand::ShowCompare,
        ("help", []) => UserCommand::Help,
        ("quit" | "exit", []) => UserCommand::Quit,
        _ => return Err(format!("unrecognized command '{line}'; type 'help'")),
    };
    Ok(Some(command))
}

fn parse_number(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("'{raw}' is not a number"))
}

pub fn render_session(state: &SessionState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "model:  {} ({})", state.direction().model_label(), state.direction());
    if !state.has_content() {
        let _ = writeln!(out, "{}. Upload an image to start.", state.direction().prompt());
    } else {
        if let Some(input) = state.input() {
            let _ = writeln!(out, "input:  {input}");
        }
        match (state.result(), state.is_generating()) {
            (_, true) => {
                let _ = writeln!(out, "result: generating stain...");
            }
            (Some(result), false) => {
                let _ = writeln!(out, "result: {result}");
            }
            (None, false) => {
                let _ = writeln!(out, "result: -");
            }
        }
    }
    if let Some(notice) = state.notice() {
        let _ = writeln!(out, "notice: {notice}");
    }
    out
}

pub fn render_history(state: &SessionState) -> String {
    if state.history().is_empty() {
        return "No recent history\n".to_string();
    }
    let mut out = String::from("Recent\n");
    for item in state.history() {
        let _ = writeln!(out, "  [{}] {}  {}", item.id, item.display_time(), item.he_url);
    }
    out
}

pub fn render_compare(state: &CompareState, catalog: &Catalog) -> String {
    let frame = state.compose(catalog);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "base:    {} ({}, {})",
        frame.layers.base.label, frame.layers.base.color, frame.layers.base.source
    );
    let _ = writeln!(
        out,
        "overlay: {} ({}, {}) clipped to {:.1}%",
        frame.layers.overlay.label,
        frame.layers.overlay.color,
        frame.layers.overlay.source,
        frame.clip_end
    );
    for label in &frame.labels {
        let _ = writeln!(out, "label:   {:?} {}", label.side, label.text);
    }
    let selected: Vec<String> = state
        .selection()
        .members()
        .iter()
        .map(|id| id.to_string())
        .collect();
    let _ = writeln!(out, "selected: {}", selected.join(", "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::session::{reduce, SessionEvent};

    #[test]
    fn parses_commands_and_ignores_comments() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("# setup"), Ok(None));
        assert_eq!(
            parse_command("upload slides/my scan.png"),
            Ok(Some(UserCommand::Upload(PathBuf::from("slides/my scan.png"))))
        );
        assert_eq!(
            parse_command("direction reverse"),
            Ok(Some(UserCommand::Direction(Direction::Reverse)))
        );
        assert_eq!(
            parse_command("compare toggle bf"),
            Ok(Some(UserCommand::Toggle(SlotId::Brightfield)))
        );
        assert_eq!(
            parse_command("compare pointer 100 0 400"),
            Ok(Some(UserCommand::Pointer {
                client_x: 100.0,
                bounds: ContainerBounds {
                    left: 0.0,
                    width: 400.0
                }
            }))
        );
        assert_eq!(parse_command("save"), Ok(Some(UserCommand::Save(None))));
        assert_eq!(parse_command("EXIT"), Ok(Some(UserCommand::Quit)));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(parse_command("direction up").is_err());
        assert!(parse_command("compare pointer left 0 400").is_err());
        assert!(parse_command("select").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn empty_session_shows_upload_prompt() {
        let text = render_session(&SessionState::default());
        assert!(text.contains("Generate H&E from Brightfield"));
        assert!(text.contains("Brightfield Model"));
    }

    #[test]
    fn generating_session_shows_progress() {
        let (state, _) = reduce(
            SessionState::default(),
            SessionEvent::FileSelected(client_core::UploadFile::from_bytes("a.png", b"a".to_vec())),
        );
        let text = render_session(&state);
        assert!(text.contains("input:  a.png"));
        assert!(text.contains("generating stain"));
        assert_eq!(render_history(&state), "No recent history\n");
    }

    #[test]
    fn compare_rendering_names_layers() {
        let text = render_compare(&CompareState::default(), &Catalog::default());
        assert!(text.contains("base:    Ground Truth"));
        assert!(text.contains("overlay: AI Inferred"));
        assert!(text.contains("clipped to 50.0%"));
        assert!(text.contains("selected: gt, ai"));
    }
}
