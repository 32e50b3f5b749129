// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command loop vocabulary — parse one input line into a `Command`, then run
// it against the session and collect the lines to print.
//
// Pages are addressed by their 1-based display number, as shown by `list`.

use std::fmt;
use std::path::PathBuf;

use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::human_errors::humanize_error;
use heftwerk_core::types::EntryId;

use crate::services::config_store::ConfigStore;
use crate::state::Session;

pub const USAGE: &str = "\
Commands:
  add <path>...        add PDF files
  list                 show the pages in output order (> marks the preview)
  sources              show the selected files
  rm <n>               remove page n
  rotl <n> | rotr <n>  turn page n left / right by 90 degrees
  mv <from> <to>       move one page
  order <n>...         put pages in this order (others follow)
  show <n>             preview page n
  next | prev          step through the preview
  preview [file.png]   save the preview image (default preview.png)
  export [path]        write the merged PDF (default ./merged.pdf)
  config [save]        print or save the settings
  help                 this text
  quit                 leave";

const DEFAULT_PREVIEW_FILE: &str = "preview.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(Vec<PathBuf>),
    List,
    Sources,
    Remove(usize),
    Rotate { page: usize, delta: i32 },
    Move { from: usize, to: usize },
    Order(Vec<usize>),
    Show(usize),
    Next,
    Previous,
    Preview(Option<PathBuf>),
    Export(Option<PathBuf>),
    Config,
    ConfigSave,
    Help,
    Quit,
}

/// A line that does not form a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError(pub String);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, UsageError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("add", []) => return Err(UsageError("add needs at least one file".into())),
            ("add", paths) => Self::Add(paths.iter().map(PathBuf::from).collect()),
            ("list" | "ls", []) => Self::List,
            ("sources", []) => Self::Sources,
            ("rm", [n]) => Self::Remove(page_number(n)?),
            ("rotl", [n]) => Self::Rotate { page: page_number(n)?, delta: -90 },
            ("rotr", [n]) => Self::Rotate { page: page_number(n)?, delta: 90 },
            ("mv", [from, to]) => Self::Move {
                from: page_number(from)?,
                to: page_number(to)?,
            },
            ("order", []) => return Err(UsageError("order needs page numbers".into())),
            ("order", pages) => Self::Order(
                pages
                    .iter()
                    .map(|n| page_number(n))
                    .collect::<std::result::Result<_, _>>()?,
            ),
            ("show", [n]) => Self::Show(page_number(n)?),
            ("next" | "n", []) => Self::Next,
            ("prev" | "p", []) => Self::Previous,
            ("preview", []) => Self::Preview(None),
            ("preview", [path]) => Self::Preview(Some(PathBuf::from(path))),
            ("export", []) => Self::Export(None),
            ("export", [path]) => Self::Export(Some(PathBuf::from(path))),
            ("config", []) => Self::Config,
            ("config", ["save"]) => Self::ConfigSave,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit" | "q", []) => Self::Quit,
            (other, _) => return Err(UsageError(format!("unknown command or arguments: {other}"))),
        };
        Ok(Some(command))
    }
}

fn page_number(word: &str) -> std::result::Result<usize, UsageError> {
    match word.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(UsageError(format!("'{word}' is not a page number"))),
    }
}

/// What the loop should do after a command.
#[derive(Debug, Default)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            quit: false,
        }
    }
}

/// Run `command`. Errors become notice lines; nothing here ends the loop
/// except `quit`. A preview that failed to draw is reported after the reply.
pub async fn execute(session: &mut Session, store: &ConfigStore, command: Command) -> Reply {
    let mut reply = match run(session, store, command).await {
        Ok(reply) => reply,
        Err(e) => Reply::line(humanize_error(&e).to_string()),
    };
    if let Some(notice) = session.take_preview_notice() {
        reply.lines.push(notice.to_string());
    }
    reply
}

async fn run(session: &mut Session, store: &ConfigStore, command: Command) -> Result<Reply> {
    let reply = match command {
        Command::Add(paths) => {
            let report = session.add_files(&paths).await;
            let mut lines: Vec<String> = report
                .added
                .iter()
                .map(|(name, pages)| format!("added {name} ({pages} pages)"))
                .collect();
            lines.extend(report.notices.iter().map(ToString::to_string));
            lines.push(session.preview().page_info());
            Reply { lines, quit: false }
        }

        Command::List => Reply {
            lines: list_lines(session),
            quit: false,
        },

        Command::Sources => {
            let lines = session
                .library()
                .iter()
                .map(|document| {
                    format!(
                        "{}  {} pages  added {}",
                        document.name(),
                        document.page_count(),
                        document.added_at().format("%H:%M:%S")
                    )
                })
                .collect::<Vec<_>>();
            if lines.is_empty() {
                Reply::line("no files selected")
            } else {
                Reply { lines, quit: false }
            }
        }

        Command::Remove(page) => {
            let id = entry_id(session, page)?;
            match session.remove_page(&id).await? {
                Some(removed) => Reply::line(format!("removed {}", removed.label())),
                None => Reply::default(),
            }
        }

        Command::Rotate { page, delta } => {
            let id = entry_id(session, page)?;
            match session.rotate_page(&id, delta).await? {
                Some(rotation) => Reply::line(format!("page {page} now at {rotation}")),
                None => Reply::default(),
            }
        }

        Command::Move { from, to } => {
            let id = entry_id(session, from)?;
            match session.move_page(&id, to - 1).await? {
                Some(position) => Reply::line(format!("moved page {from} to {}", position + 1)),
                None => Reply::default(),
            }
        }

        Command::Order(pages) => {
            // Numbers past the end match nothing and are dropped.
            let order: Vec<EntryId> = pages
                .iter()
                .filter_map(|page| session.entry_at(*page).ok().map(|entry| entry.id()))
                .collect();
            let placed = session.reorder(&order).await?;
            Reply::line(format!("{placed} pages placed, {} in total", session.manifest().len()))
        }

        Command::Show(page) => {
            session.select_page(page).await?;
            Reply::line(session.preview().page_info())
        }

        Command::Next => {
            session.next().await?;
            Reply::line(session.preview().page_info())
        }

        Command::Previous => {
            session.previous().await?;
            Reply::line(session.preview().page_info())
        }

        Command::Preview(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_PREVIEW_FILE));
            session.save_preview(&path)?;
            Reply::line(format!("{} written to {}", session.preview().page_info(), path.display()))
        }

        Command::Export(path) => {
            let target = path.unwrap_or_else(|| PathBuf::from("."));
            let written = session.export_to(&target).await?;
            Reply::line(format!(
                "exported {} pages to {}",
                session.manifest().len(),
                written.display()
            ))
        }

        Command::Config => {
            let mut lines = vec![format!("# {}", store.path().display())];
            lines.push(serde_json::to_string_pretty(session.config())?);
            lines.push(format!("# preview backend in use: {}", session.preview().backend_name()));
            Reply { lines, quit: false }
        }

        Command::ConfigSave => {
            store.save(session.config())?;
            Reply::line(format!("settings saved to {}", store.path().display()))
        }

        Command::Help => Reply::line(USAGE),

        Command::Quit => Reply {
            lines: Vec::new(),
            quit: true,
        },
    };
    Ok(reply)
}

fn entry_id(session: &Session, page: usize) -> Result<EntryId> {
    session.entry_at(page).map(|entry| entry.id())
}

/// Manifest rows, one per page. The previewed page is marked with `>`.
pub fn list_lines(session: &Session) -> Vec<String> {
    if session.manifest().is_empty() {
        return vec!["no pages".into()];
    }
    let current = session.preview().current_page();
    session
        .manifest()
        .iter()
        .map(|entry| {
            let marker = if current == Some(entry.display_number) { '>' } else { ' ' };
            format!(
                "{marker} {:>3}. {}  {}",
                entry.display_number,
                entry.label(),
                entry.rotation
            )
        })
        .collect()
}

/// Map errors from startup into the same notice text the loop prints.
pub fn notice_line(err: &HeftwerkError) -> String {
    humanize_error(err).to_string()
}
