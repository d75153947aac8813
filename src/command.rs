//! Line commands understood by the interactive driver and `-e`.

use std::io::{self, Write};
use std::sync::OnceLock;

use gridcalc_core::{CellRef, ErrorKind, Sheet, SheetObserver};
use gridcalc_engine::builtins::FUNCTIONS;
use regex::Regex;

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Edit { label: String, text: String },
    Show(String),
    Grid,
    Deps(String),
    Functions,
    Help,
    Quit,
}

/// Matches `label = text`. A second `=` right after the first is an
/// equality test, not an assignment, so it is not accepted as the separator.
fn edit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?<label>[A-Za-z_][A-Za-z0-9_]*)\s*=(?<text>(?:[^=].*)?)$")
            .expect("edit regex must compile")
    })
}

/// Split `LABEL=TEXT`. Surrounding whitespace of the text is dropped.
pub fn parse_edit(line: &str) -> Result<Command, CommandError> {
    let caps = edit_re()
        .captures(line)
        .ok_or_else(|| CommandError::NotAnEdit(line.to_string()))?;
    Ok(Command::Edit {
        label: caps["label"].to_string(),
        text: caps["text"].trim().to_string(),
    })
}

/// Parse one input line. Blank lines and `#` comments yield None.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return parse_edit(line).map(Some);
    };

    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

    let command = match command {
        "q" | "quit" => Command::Quit,
        "grid" => Command::Grid,
        "functions" | "fn" => Command::Functions,
        "help" | "h" => Command::Help,
        "show" => Command::Show(arg.ok_or(CommandError::Usage(":show LABEL"))?.to_string()),
        "deps" => Command::Deps(arg.ok_or(CommandError::Usage(":deps LABEL"))?.to_string()),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Prints committed cells to stdout and rejected edits to stderr.
#[derive(Debug, Default)]
pub struct Console {
    rejected: usize,
}

impl Console {
    /// Number of edits rejected so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl SheetObserver for Console {
    fn on_display(&mut self, label: CellRef, text: &str) {
        println!("{label} = {text}");
    }

    fn on_error(&mut self, kind: ErrorKind, message: &str) {
        self.rejected += 1;
        eprintln!("error[{kind}]: {message}");
    }
}

/// Run one command. Returns `true` when the driver should stop.
pub fn execute(sheet: &mut Sheet<Console>, command: Command, out: &mut impl Write) -> io::Result<bool> {
    match command {
        Command::Edit { label, text } => {
            sheet.apply_edit(&label, &text);
        }
        Command::Show(label) => match sheet.find(&label) {
            Some(cell) => writeln!(out, "{label} [{}] = {}", cell.text(), cell.display())?,
            None => eprintln!("Error: no cell named '{label}'"),
        },
        Command::Grid => {
            for row in 0..sheet.rows() {
                let line: Vec<String> = (0..sheet.cols())
                    .map(|col| {
                        sheet
                            .cell(CellRef::new(row, col))
                            .map(|cell| cell.display())
                            .unwrap_or_default()
                    })
                    .collect();
                writeln!(out, "{}", line.join("\t"))?;
            }
        }
        Command::Deps(label) => match sheet.dependers(&label) {
            Ok(cells) => {
                let names: Vec<String> = cells.iter().map(CellRef::to_string).collect();
                writeln!(out, "{}", names.join(" "))?;
            }
            Err(err) => eprintln!("Error: {err}"),
        },
        Command::Functions => {
            for f in FUNCTIONS {
                writeln!(out, "{:<10} {:<14} {}", f.name, f.arity.to_string(), f.description)?;
            }
        }
        Command::Help => {
            for line in HELP {
                writeln!(out, "{line}")?;
            }
        }
        Command::Quit => return Ok(true),
    }
    Ok(false)
}

const HELP: &[&str] = &[
    "LABEL = TEXT     Set a cell (empty TEXT clears it)",
    ":show LABEL      Print a cell's text and value",
    ":grid            Print every value, one row per line",
    ":deps LABEL      Cells recomputed when LABEL changes, in order",
    ":functions       List builtin functions",
    ":quit            Exit",
];
