//! The guarded save sequence: `git add -A`, `git commit -m`, `git push`
//!
//! ```text
//! Start -> Add -> Commit -> Push -> Done
//!   \________\_______\________\---> Aborted
//! ```
//!
//! Nothing runs until the user confirms. A failed step ends the session;
//! the only retry is the upstream repair inside [`GitRunner::run`].

use crate::error::{Error, Result};
use crate::explain::{ExplainMode, Explainer, Explanation};
use crate::process::ProcessLauncher;
use crate::runner::{CommandResult, GitRunner};
use std::fmt;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

/// Commit message used when the user just presses enter
pub const DEFAULT_COMMIT_MESSAGE: &str = "save changes";

/// Asks the user things
pub trait Prompter {
    /// Yes/no question. Anything but `y`/`yes` counts as no.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;

    /// Free-text question; an empty answer means `default`
    fn ask(&mut self, question: &str, default: &str) -> io::Result<String>;
}

/// `y` or `yes`, any case, surrounding whitespace ignored
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Prompter reading answers from a buffered reader, writing questions to
/// stderr
pub struct TerminalPrompter<R: BufRead> {
    input: R,
}

impl<R: BufRead> TerminalPrompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn read_answer(&mut self) -> io::Result<String> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead> Prompter for TerminalPrompter<R> {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        eprint!("{} [y/N] ", question);
        io::stderr().flush()?;
        Ok(is_affirmative(&self.read_answer()?))
    }

    fn ask(&mut self, question: &str, default: &str) -> io::Result<String> {
        eprint!("{} [{}]: ", question, default);
        io::stderr().flush()?;
        let answer = self.read_answer()?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }
}

/// Position in the save sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStep {
    Start,
    Add,
    Commit,
    Push,
    Done,
    Aborted,
}

impl SaveStep {
    /// 1-based index of a running step
    pub fn index(self) -> Option<usize> {
        match self {
            SaveStep::Add => Some(1),
            SaveStep::Commit => Some(2),
            SaveStep::Push => Some(3),
            _ => None,
        }
    }

    /// Said when the backend gives no usable answer
    fn fallback_phrase(self) -> &'static str {
        match self {
            SaveStep::Add => "staged all changes",
            SaveStep::Push => "uploaded commits",
            _ => "",
        }
    }
}

impl fmt::Display for SaveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaveStep::Start => "start",
            SaveStep::Add => "add",
            SaveStep::Commit => "commit",
            SaveStep::Push => "push",
            SaveStep::Done => "done",
            SaveStep::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// How a save sequence ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Completed,
    /// The user said no; nothing ran
    Declined,
    Aborted { step: SaveStep, output: String },
}

/// Options for one run of the sequence
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub message: Option<String>,
    /// Skip the confirmation question
    pub assume_yes: bool,
    /// Carry on to commit after a failed `git add`
    pub continue_on_add_failure: bool,
}

/// Ephemeral state for one sequence
#[derive(Debug, Clone)]
pub struct SaveSession {
    pub step: SaveStep,
    pub message: Option<String>,
    /// Backend failure already shown once
    backend_reported: bool,
}

impl SaveSession {
    pub fn new(message: Option<String>) -> Self {
        Self {
            step: SaveStep::Start,
            message,
            backend_reported: false,
        }
    }
}

/// Drives add → commit → push
pub struct SaveOrchestrator<'a, L: ProcessLauncher> {
    runner: &'a GitRunner<L>,
    explainer: &'a dyn Explainer,
    prompter: &'a mut dyn Prompter,
    out: &'a mut dyn Write,
}

impl<'a, L: ProcessLauncher> SaveOrchestrator<'a, L> {
    pub fn new(
        runner: &'a GitRunner<L>,
        explainer: &'a dyn Explainer,
        prompter: &'a mut dyn Prompter,
        out: &'a mut dyn Write,
    ) -> Self {
        Self {
            runner,
            explainer,
            prompter,
            out,
        }
    }

    /// Run the whole sequence
    pub fn run(&mut self, options: &SaveOptions) -> Result<SaveOutcome> {
        let mut session = SaveSession::new(options.message.clone());

        let shown_message = session
            .message
            .as_deref()
            .unwrap_or("<message>")
            .replace('"', "\\\"");
        writeln!(self.out, "githelp save will run:")?;
        writeln!(self.out, "  1. git add -A")?;
        writeln!(self.out, "  2. git commit -m \"{}\"", shown_message)?;
        writeln!(self.out, "  3. git push")?;
        self.out.flush()?;

        if !options.assume_yes
            && !self
                .prompter
                .confirm("Proceed?")
                .map_err(Error::Prompt)?
        {
            writeln!(self.out, "Cancelled. Nothing was run.")?;
            return Ok(SaveOutcome::Declined);
        }

        // add
        session.step = SaveStep::Add;
        let add = self.run_step(&session, &["add", "-A"])?;
        if !add.succeeded {
            if !options.continue_on_add_failure {
                return self.abort(&mut session, add);
            }
            warn!("git add failed, continuing to commit");
        }
        self.explain_step(&mut session, "git add -A", &add)?;

        // commit
        session.step = SaveStep::Commit;
        let message = match session.message.clone() {
            Some(message) => message,
            None => {
                let answer = self
                    .prompter
                    .ask("Commit message", DEFAULT_COMMIT_MESSAGE)
                    .map_err(Error::Prompt)?;
                session.message = Some(answer.clone());
                answer
            }
        };
        let commit = self.run_step(&session, &["commit", "-m", message.as_str()])?;
        if !commit.succeeded {
            return self.abort(&mut session, commit);
        }

        // push
        session.step = SaveStep::Push;
        let push = self.run_step(&session, &["push"])?;
        if !push.succeeded {
            return self.abort(&mut session, push);
        }
        self.explain_step(&mut session, "git push", &push)?;

        session.step = SaveStep::Done;
        info!("save sequence completed");
        writeln!(self.out, "Done. Your changes are saved and pushed.")?;
        Ok(SaveOutcome::Completed)
    }

    fn run_step(&mut self, session: &SaveSession, args: &[&str]) -> Result<CommandResult> {
        if let Some(index) = session.step.index() {
            writeln!(self.out, "[{}/3] git {}", index, args.join(" "))?;
        }
        let result = self.runner.run(args);
        let output = result.output.trim_end();
        if !output.is_empty() {
            writeln!(self.out, "{}", output)?;
        }
        Ok(result)
    }

    fn explain_step(
        &mut self,
        session: &mut SaveSession,
        command: &str,
        result: &CommandResult,
    ) -> Result<()> {
        let text = format!("$ {}\n{}", command, result.output.trim_end());
        let explanation = self.explainer.explain(&text, ExplainMode::Save);

        let phrase = match explanation.short_phrase() {
            Some(phrase) => phrase.to_string(),
            None => {
                let blank_answer = matches!(explanation, Explanation::Answer(_));
                if !blank_answer && !session.backend_reported {
                    writeln!(self.out, "{}", explanation.display_text())?;
                    session.backend_reported = true;
                }
                session.step.fallback_phrase().to_string()
            }
        };
        writeln!(self.out, "  -> {}", phrase)?;
        Ok(())
    }

    fn abort(&mut self, session: &mut SaveSession, result: CommandResult) -> Result<SaveOutcome> {
        let step = session.step;
        session.step = SaveStep::Aborted;
        warn!(%step, "save sequence aborted");
        writeln!(
            self.out,
            "Aborted: git {} failed. Later steps were not run.",
            step
        )?;
        Ok(SaveOutcome::Aborted {
            step,
            output: result.output,
        })
    }
}
