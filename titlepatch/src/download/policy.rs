//! Overwrite policy for packages that already exist on disk.
//!
//! The policy is a small state machine scoped to one run:
//!
//! ```text
//! AskEachTime --(answer: all)--> OverwriteAll   (never reverts)
//!      |  yes: download, stay
//!      |  no / anything else: skip, stay
//! SkipExisting: always skip, never asks
//! ```

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::manifest::UpdateRecord;

/// How to treat a package whose target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Ask for every existing file.
    AskEachTime,
    /// Replace every existing file without asking.
    OverwriteAll,
    /// Keep every existing file without asking.
    SkipExisting,
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverwritePolicy::AskEachTime => "ask",
            OverwritePolicy::OverwriteAll => "all",
            OverwritePolicy::SkipExisting => "skip",
        };
        f.write_str(name)
    }
}

impl FromStr for OverwritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(OverwritePolicy::AskEachTime),
            "all" | "overwrite" => Ok(OverwritePolicy::OverwriteAll),
            "skip" | "none" => Ok(OverwritePolicy::SkipExisting),
            other => Err(format!("expected ask, all or skip, got '{}'", other)),
        }
    }
}

/// Answer to an overwrite question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteAnswer {
    /// Replace this file.
    Yes,
    /// Keep this file.
    No,
    /// Replace this file and every later one.
    All,
}

impl OverwriteAnswer {
    /// Interpret a typed answer. Anything unrecognized means `No`.
    pub fn from_input(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => OverwriteAnswer::Yes,
            "a" | "all" => OverwriteAnswer::All,
            _ => OverwriteAnswer::No,
        }
    }
}

/// Source of overwrite answers while the policy is `AskEachTime`.
pub trait OverwritePrompt {
    /// Ask whether `existing` should be replaced by `record`.
    fn ask(&mut self, record: &UpdateRecord, existing: &Path) -> OverwriteAnswer;
}

/// What the orchestrator should do with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteDecision {
    Download,
    Skip,
}

/// Run-scoped overwrite state.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OverwriteState {
    policy: OverwritePolicy,
}

impl OverwriteState {
    pub(crate) fn new(policy: OverwritePolicy) -> Self {
        Self { policy }
    }

    pub(crate) fn policy(&self) -> OverwritePolicy {
        self.policy
    }

    /// Decide for a record whose target file already exists.
    pub(crate) fn decide(
        &mut self,
        record: &UpdateRecord,
        existing: &Path,
        prompt: &mut dyn OverwritePrompt,
    ) -> OverwriteDecision {
        match self.policy {
            OverwritePolicy::OverwriteAll => OverwriteDecision::Download,
            OverwritePolicy::SkipExisting => OverwriteDecision::Skip,
            OverwritePolicy::AskEachTime => match prompt.ask(record, existing) {
                OverwriteAnswer::Yes => OverwriteDecision::Download,
                OverwriteAnswer::No => OverwriteDecision::Skip,
                OverwriteAnswer::All => {
                    self.policy = OverwritePolicy::OverwriteAll;
                    OverwriteDecision::Download
                }
            },
        }
    }
}

/// Prompt that reads answers line by line from a reader.
///
/// With stdin/stdout this is the interactive console prompt. End of input
/// counts as `No`.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> OverwritePrompt for LinePrompt<R, W> {
    fn ask(&mut self, record: &UpdateRecord, existing: &Path) -> OverwriteAnswer {
        let _ = write!(
            self.output,
            "{} already exists ({} v{}). Overwrite? [y]es/[n]o/[a]ll: ",
            existing.display(),
            record.title_id,
            record.version
        );
        self.output.flush().ok();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => OverwriteAnswer::No,
            Ok(_) => OverwriteAnswer::from_input(&line),
        }
    }
}

/// Prompt that replays a fixed list of answers, then answers `No`.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<OverwriteAnswer>,
    asked: usize,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = OverwriteAnswer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: 0,
        }
    }

    /// Number of times the prompt was asked.
    pub fn asked(&self) -> usize {
        self.asked
    }
}

impl OverwritePrompt for ScriptedPrompt {
    fn ask(&mut self, _record: &UpdateRecord, _existing: &Path) -> OverwriteAnswer {
        self.asked += 1;
        self.answers.pop_front().unwrap_or(OverwriteAnswer::No)
    }
}
