//! The `:` command line.
//!
//! Parsing is pure ([`parse`]); execution maps each command onto host
//! actions and reports the result on the status line.

use tracing::debug;

use crate::action::HostAction;
use crate::engine::Engine;
use crate::error::ExError;
use crate::traits::Host;
use crate::types::{PromptResult, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExCommand {
    Write,
    WriteQuit,
    WriteAll,
    WriteQuitAll,
    Quit,
    QuitAll,
    Xit,
    Edit,
    NewBuffer,
    Close,
    Only,
    Split,
    VSplit,
    BufferNext,
    BufferPrevious,
    BufferDelete,
    Buffer,
    Undo,
    Redo,
    File,
    Help,
    Read,
    Substitute,
    Global,
    VGlobal,
    Set,
}

/// One row of the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExCommandDef {
    pub name: &'static str,
    /// Shortest accepted prefix.
    pub min_abbrev: usize,
    pub allows_bang: bool,
    pub takes_args: bool,
    pub command: ExCommand,
}

const fn def(
    name: &'static str,
    min_abbrev: usize,
    allows_bang: bool,
    takes_args: bool,
    command: ExCommand,
) -> ExCommandDef {
    ExCommandDef {
        name,
        min_abbrev,
        allows_bang,
        takes_args,
        command,
    }
}

pub const EX_COMMANDS: &[ExCommandDef] = &[
    def("write", 1, true, true, ExCommand::Write),
    def("wq", 2, true, true, ExCommand::WriteQuit),
    def("wall", 2, true, false, ExCommand::WriteAll),
    def("wqall", 3, true, false, ExCommand::WriteQuitAll),
    def("xall", 2, true, false, ExCommand::WriteQuitAll),
    def("quit", 1, true, false, ExCommand::Quit),
    def("qall", 2, true, false, ExCommand::QuitAll),
    def("quitall", 5, true, false, ExCommand::QuitAll),
    def("xit", 1, true, true, ExCommand::Xit),
    def("exit", 3, true, true, ExCommand::Xit),
    def("edit", 1, true, true, ExCommand::Edit),
    def("enew", 3, true, false, ExCommand::NewBuffer),
    def("close", 3, true, false, ExCommand::Close),
    def("only", 2, true, false, ExCommand::Only),
    def("split", 2, false, true, ExCommand::Split),
    def("vsplit", 2, false, true, ExCommand::VSplit),
    def("bnext", 2, false, false, ExCommand::BufferNext),
    def("bprevious", 2, false, false, ExCommand::BufferPrevious),
    def("bNext", 2, false, false, ExCommand::BufferPrevious),
    def("bdelete", 2, true, true, ExCommand::BufferDelete),
    def("buffer", 1, false, true, ExCommand::Buffer),
    def("next", 1, true, false, ExCommand::BufferNext),
    def("previous", 4, true, false, ExCommand::BufferPrevious),
    def("undo", 1, false, false, ExCommand::Undo),
    def("redo", 3, false, false, ExCommand::Redo),
    def("file", 1, false, false, ExCommand::File),
    def("help", 1, false, true, ExCommand::Help),
    def("read", 1, true, true, ExCommand::Read),
    def("substitute", 1, false, true, ExCommand::Substitute),
    def("global", 1, true, true, ExCommand::Global),
    def("vglobal", 1, false, true, ExCommand::VGlobal),
    def("set", 2, false, true, ExCommand::Set),
];

/// Single-letter shorthands, consulted when prefix matching is not unique.
const ALIASES: &[(&str, &str)] = &[
    ("w", "write"),
    ("q", "quit"),
    ("e", "edit"),
    ("n", "next"),
    ("b", "buffer"),
    ("f", "file"),
    ("h", "help"),
    ("u", "undo"),
    ("r", "read"),
    ("s", "substitute"),
    ("g", "global"),
    ("v", "vglobal"),
    ("x", "xit"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    Current,
    Last,
    /// `%`, the whole buffer.
    All,
    Mark(char),
    Line(usize),
}

/// A parsed line range. Commands accept it but do not act on it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExRange {
    pub start: Address,
    pub end: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEx {
    Empty,
    /// `:42`
    GotoLine(usize),
    /// A range with no command after it, e.g. `:1,5`.
    RangeOnly(ExRange),
    /// `:!cmd`
    Shell {
        range: Option<ExRange>,
        command: String,
    },
    Command {
        range: Option<ExRange>,
        def: &'static ExCommandDef,
        bang: bool,
        args: Option<String>,
    },
}

pub fn parse(input: &str) -> Result<ParsedEx, ExError> {
    let line = input.trim();
    if line.is_empty() {
        return Ok(ParsedEx::Empty);
    }
    if line.bytes().all(|b| b.is_ascii_digit()) {
        let n = line
            .parse::<usize>()
            .map_err(|_| ExError::InvalidLine(line.to_string()))?;
        return Ok(ParsedEx::GotoLine(n));
    }

    let (range, rest) = parse_range(line)?;
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Ok(match range {
            Some(range) => ParsedEx::RangeOnly(range),
            None => ParsedEx::Empty,
        });
    }
    if let Some(command) = rest.strip_prefix('!') {
        return Ok(ParsedEx::Shell {
            range,
            command: command.trim().to_string(),
        });
    }

    let name_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    if name_len == 0 {
        return Err(ExError::NotAnEditorCommand(line.to_string()));
    }
    let def = resolve_name(&rest[..name_len])?;
    let mut after = &rest[name_len..];
    let bang = after.starts_with('!');
    if bang {
        if !def.allows_bang {
            return Err(ExError::BangNotAllowed(def.name));
        }
        after = &after[1..];
    }
    let args = after.trim();
    if !args.is_empty() && !def.takes_args {
        return Err(ExError::TrailingCharacters(args.to_string()));
    }
    Ok(ParsedEx::Command {
        range,
        def,
        bang,
        args: (!args.is_empty()).then(|| args.to_string()),
    })
}

pub fn resolve_name(name: &str) -> Result<&'static ExCommandDef, ExError> {
    resolve_in(EX_COMMANDS, ALIASES, name)
}

/// Exact name, then a unique qualifying prefix, then an alias.
fn resolve_in(
    table: &'static [ExCommandDef],
    aliases: &[(&str, &str)],
    name: &str,
) -> Result<&'static ExCommandDef, ExError> {
    if let Some(exact) = table.iter().find(|d| d.name == name) {
        return Ok(exact);
    }
    let candidates: Vec<&'static ExCommandDef> = table.iter().filter(|d| d.name.starts_with(name)).collect();
    let qualified: Vec<&'static ExCommandDef> = candidates
        .iter()
        .copied()
        .filter(|d| name.len() >= d.min_abbrev)
        .collect();
    if let [only] = qualified.as_slice() {
        return Ok(*only);
    }
    if let Some((_, full)) = aliases.iter().find(|(alias, _)| *alias == name)
        && let Some(def) = table.iter().find(|d| d.name == *full)
    {
        return Ok(def);
    }
    if candidates.is_empty() {
        Err(ExError::NotAnEditorCommand(name.to_string()))
    } else {
        Err(ExError::Ambiguous(name.to_string()))
    }
}

fn parse_range(input: &str) -> Result<(Option<ExRange>, &str), ExError> {
    let Some((start, rest)) = parse_address(input)? else {
        return Ok((None, input));
    };
    if start == Address::All {
        return Ok((Some(ExRange { start, end: None }), rest));
    }
    let Some(after) = rest.strip_prefix([',', ';']) else {
        return Ok((Some(ExRange { start, end: None }), rest));
    };
    match parse_address(after)? {
        Some((end, rest)) => Ok((
            Some(ExRange {
                start,
                end: Some(end),
            }),
            rest,
        )),
        None => Ok((Some(ExRange { start, end: None }), after)),
    }
}

fn parse_address(input: &str) -> Result<Option<(Address, &str)>, ExError> {
    let mut chars = input.chars();
    let address = match chars.next() {
        Some('%') => Address::All,
        Some('.') => Address::Current,
        Some('$') => Address::Last,
        Some('\'') => match chars.next() {
            Some(mark) => Address::Mark(mark),
            None => return Ok(None),
        },
        Some(c) if c.is_ascii_digit() => {
            let digits = input
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(input.len());
            let n = input[..digits]
                .parse::<usize>()
                .map_err(|_| ExError::InvalidLine(input[..digits].to_string()))?;
            return Ok(Some((Address::Line(n), &input[digits..])));
        }
        _ => return Ok(None),
    };
    Ok(Some((address, chars.as_str())))
}

impl Engine {
    /// Handles the text confirmed at the `:` prompt.
    ///
    /// The outcome is also written to the status line: a message on
    /// success, the error text on failure.
    pub async fn submit_command_line<H: Host>(
        &mut self,
        host: &mut H,
        result: PromptResult,
    ) -> Result<Option<String>, ExError> {
        let PromptResult::Confirmed(line) = result else {
            return Ok(None);
        };
        self.begin()?;
        let outcome = self.run_ex(host, &line).await;
        self.end();
        match &outcome {
            Ok(Some(message)) => host.set_status(Status::Message(message.clone())),
            Ok(None) => {}
            Err(err) => {
                debug!(target: "engine.ex", %line, error = %err, "command failed");
                host.set_status(Status::Error(err.to_string()));
            }
        }
        outcome
    }

    async fn run_ex<H: Host>(&mut self, host: &mut H, line: &str) -> Result<Option<String>, ExError> {
        let line = line.strip_prefix(':').unwrap_or(line);
        let parsed = parse(line)?;
        debug!(target: "engine.ex", ?parsed, "parsed");
        match parsed {
            ParsedEx::Empty => Ok(None),
            ParsedEx::GotoLine(n) => {
                self.goto_line(host, n).await?;
                Ok(None)
            }
            ParsedEx::RangeOnly(range) => {
                match range.end.unwrap_or(range.start) {
                    Address::Line(n) => self.goto_line(host, n).await?,
                    Address::Last => self.goto_line(host, usize::MAX).await?,
                    Address::Current | Address::All | Address::Mark(_) => {}
                }
                Ok(None)
            }
            ParsedEx::Shell { .. } => Err(ExError::NotImplemented("!")),
            ParsedEx::Command { def, bang, args, .. } => execute(host, def, bang, args),
        }
    }
}

fn guard_unsaved<H: Host>(host: &H, bang: bool) -> Result<(), ExError> {
    if !bang && host.is_modified() {
        return Err(ExError::UnsavedChanges);
    }
    Ok(())
}

fn save<H: Host>(host: &mut H, path: Option<String>) -> Result<(), ExError> {
    match path {
        Some(path) => host.invoke(&HostAction::SaveAs(path), 1)?,
        None => host.invoke(&HostAction::Save, 1)?,
    }
    Ok(())
}

fn execute<H: Host>(
    host: &mut H,
    def: &'static ExCommandDef,
    bang: bool,
    args: Option<String>,
) -> Result<Option<String>, ExError> {
    let run = |host: &mut H, action: HostAction| host.invoke(&action, 1).map_err(ExError::from);
    match def.command {
        ExCommand::Write => {
            let message = match &args {
                Some(path) => format!("\"{path}\" written"),
                None => "written".to_string(),
            };
            save(host, args)?;
            Ok(Some(message))
        }
        ExCommand::WriteQuit => {
            save(host, args)?;
            run(host, HostAction::Close)?;
            Ok(None)
        }
        ExCommand::WriteAll => {
            run(host, HostAction::SaveAll)?;
            Ok(Some("all buffers written".to_string()))
        }
        ExCommand::WriteQuitAll => {
            run(host, HostAction::SaveAll)?;
            run(host, HostAction::QuitAll)?;
            Ok(None)
        }
        ExCommand::Quit => {
            guard_unsaved(host, bang)?;
            run(host, HostAction::Close)?;
            Ok(None)
        }
        ExCommand::QuitAll => {
            guard_unsaved(host, bang)?;
            run(host, HostAction::QuitAll)?;
            Ok(None)
        }
        ExCommand::Xit => {
            if host.is_modified() {
                save(host, args)?;
            }
            run(host, HostAction::Close)?;
            Ok(None)
        }
        ExCommand::Edit => {
            match (args, bang) {
                (None, true) => run(host, HostAction::Revert)?,
                (None, false) => {
                    guard_unsaved(host, false)?;
                    run(host, HostAction::Revert)?;
                }
                (Some(path), bang) => {
                    guard_unsaved(host, bang)?;
                    run(host, HostAction::Edit(path))?;
                }
            }
            Ok(None)
        }
        ExCommand::NewBuffer => {
            guard_unsaved(host, bang)?;
            run(host, HostAction::NewBuffer)?;
            Ok(None)
        }
        ExCommand::Close => {
            guard_unsaved(host, bang)?;
            run(host, HostAction::Close)?;
            Ok(None)
        }
        ExCommand::Only => {
            run(host, HostAction::CloseOthers)?;
            Ok(None)
        }
        ExCommand::Split => {
            run(host, HostAction::SplitHorizontal(args))?;
            Ok(None)
        }
        ExCommand::VSplit => {
            run(host, HostAction::SplitVertical(args))?;
            Ok(None)
        }
        ExCommand::BufferNext => {
            run(host, HostAction::NextBuffer)?;
            Ok(None)
        }
        ExCommand::BufferPrevious => {
            run(host, HostAction::PreviousBuffer)?;
            Ok(None)
        }
        ExCommand::BufferDelete => {
            guard_unsaved(host, bang)?;
            run(host, HostAction::DeleteBuffer(args))?;
            Ok(None)
        }
        ExCommand::Buffer => {
            if let Some(name) = args {
                run(host, HostAction::SwitchBuffer(name))?;
            }
            Ok(None)
        }
        ExCommand::Undo => {
            run(host, HostAction::Undo)?;
            Ok(None)
        }
        ExCommand::Redo => {
            run(host, HostAction::Redo)?;
            Ok(None)
        }
        ExCommand::File => {
            run(host, HostAction::ShowFileInfo)?;
            Ok(None)
        }
        ExCommand::Help => {
            run(host, HostAction::ShowHelp(args))?;
            Ok(None)
        }
        ExCommand::Read | ExCommand::Substitute | ExCommand::Global | ExCommand::VGlobal | ExCommand::Set => {
            Err(ExError::NotImplemented(def.name))
        }
    }
}
