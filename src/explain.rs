//! Explanation gateway
//!
//! Hands text to a local text-generation backend (`ollama run <model>` by
//! default) and returns what it said. The backend being absent or failing
//! is an ordinary outcome, not an error: callers get an [`Explanation`] and
//! decide what to print.

use crate::config::ExplainConfig;
use crate::process::ProcessLauncher;
use tracing::{debug, warn};

/// Backend named in failure messages, whatever executable is configured
pub const BACKEND_NAME: &str = "ollama";

/// Guidance appended when the backend executable is missing
pub const INSTALL_HINT: &str =
    "To use this feature, install Ollama from https://ollama.com/download";

/// Which prompt template to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplainMode {
    /// Beginner-oriented explanation with examples
    Explain,
    /// A single short phrase for one step of `save`
    Save,
}

impl ExplainMode {
    /// Full prompt for `text`
    pub fn prompt(self, text: &str) -> String {
        match self {
            ExplainMode::Explain => format!(
                "you are a git tutor helping a beginner.\n\
                 explain the following git output in simple terms and keep it under 100 words.\n\
                 provide examples of how to use the commands involved.\n\
                 if the output shows an error, guide them towards fixing it.\n\
                 {}\n",
                text
            ),
            ExplainMode::Save => format!(
                "you are a git tutor.\n\
                 describe what the following git step did in a single phrase of at most 20 characters.\n\
                 do not use newlines. do not give examples.\n\
                 {}\n",
                text
            ),
        }
    }
}

/// Outcome of asking the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Explanation {
    Answer(String),
    /// The backend executable isn't installed
    BackendMissing,
    /// The backend ran but failed; carries its error output
    BackendError(String),
}

impl Explanation {
    pub fn is_answer(&self) -> bool {
        matches!(self, Explanation::Answer(_))
    }

    /// First non-empty line of an answer, trimmed
    pub fn short_phrase(&self) -> Option<&str> {
        match self {
            Explanation::Answer(text) => text.lines().map(str::trim).find(|l| !l.is_empty()),
            _ => None,
        }
    }

    /// Text to show the user. Failures use the fixed `githelp:` messages.
    pub fn display_text(&self) -> String {
        match self {
            Explanation::Answer(text) => text.clone(),
            Explanation::BackendMissing => format!(
                "githelp: `{}` command not found.\n{}",
                BACKEND_NAME, INSTALL_HINT
            ),
            Explanation::BackendError(detail) => {
                format!("githelp: {} returned an error:\n{}", BACKEND_NAME, detail)
            }
        }
    }
}

/// Turns text into a natural-language explanation
pub trait Explainer {
    fn explain(&self, text: &str, mode: ExplainMode) -> Explanation;
}

/// Explainer that runs `<program> run <model>` with the prompt on stdin
pub struct OllamaGateway<L: ProcessLauncher> {
    launcher: L,
    config: ExplainConfig,
}

impl<L: ProcessLauncher> OllamaGateway<L> {
    pub fn new(launcher: L, config: ExplainConfig) -> Self {
        Self { launcher, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl<L: ProcessLauncher> Explainer for OllamaGateway<L> {
    fn explain(&self, text: &str, mode: ExplainMode) -> Explanation {
        let args = vec!["run".to_string(), self.config.model.clone()];
        let prompt = mode.prompt(text);
        debug!(program = %self.config.program, model = %self.config.model, ?mode, "requesting explanation");

        match self.launcher.launch(&self.config.program, &args, Some(&prompt)) {
            Ok(output) if output.success => {
                Explanation::Answer(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
                let detail = if stderr.is_empty() {
                    match output.code {
                        Some(code) => format!("exited with status {}", code),
                        None => "terminated by signal".to_string(),
                    }
                } else {
                    stderr
                };
                warn!(program = %self.config.program, %detail, "explanation backend failed");
                Explanation::BackendError(detail)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(program = %self.config.program, "explanation backend not installed");
                Explanation::BackendMissing
            }
            Err(e) => {
                warn!(program = %self.config.program, error = %e, "could not start explanation backend");
                Explanation::BackendError(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedLauncher;

    fn gateway(launcher: ScriptedLauncher) -> OllamaGateway<ScriptedLauncher> {
        OllamaGateway::new(launcher, ExplainConfig::default())
    }

    #[test]
    fn test_answer_is_stdout() {
        let gw = gateway(ScriptedLauncher::new().ok("It shows your changes.\n"));
        let result = gw.explain("On branch main", ExplainMode::Explain);
        assert_eq!(result, Explanation::Answer("It shows your changes.\n".to_string()));

        let calls = gw.launcher.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "ollama");
        assert_eq!(calls[0].args, vec!["run", "llama2"]);
        let stdin = calls[0].stdin.as_deref().unwrap();
        assert!(stdin.contains("On branch main"));
        assert!(stdin.contains("100 words"));
    }

    #[test]
    fn test_configured_model_is_used() {
        let config = ExplainConfig {
            model: "mistral".to_string(),
            program: "ollama".to_string(),
        };
        let gw = OllamaGateway::new(ScriptedLauncher::new().ok("ok"), config);
        gw.explain("x", ExplainMode::Save);
        assert_eq!(gw.launcher.arg_lists(), vec![vec!["run", "mistral"]]);
        assert_eq!(gw.model(), "mistral");
    }

    #[test]
    fn test_missing_backend() {
        let gw = gateway(ScriptedLauncher::new().not_found());
        let result = gw.explain("On branch main", ExplainMode::Explain);
        assert_eq!(result, Explanation::BackendMissing);

        let text = result.display_text();
        assert!(text.starts_with("githelp: `ollama` command not found."));
        assert!(text.contains("https://ollama.com/download"));
    }

    #[test]
    fn test_backend_error_carries_stderr() {
        let gw = gateway(ScriptedLauncher::new().fail("model 'llama2' not found\n"));
        let result = gw.explain("x", ExplainMode::Explain);
        assert_eq!(
            result,
            Explanation::BackendError("model 'llama2' not found".to_string())
        );
        assert_eq!(
            result.display_text(),
            "githelp: ollama returned an error:\nmodel 'llama2' not found"
        );
    }

    #[test]
    fn test_backend_error_without_stderr() {
        let gw = gateway(ScriptedLauncher::new().fail(""));
        assert_eq!(
            gw.explain("x", ExplainMode::Explain),
            Explanation::BackendError("exited with status 1".to_string())
        );
    }

    #[test]
    fn test_failure_text_names_ollama_for_any_program_path() {
        let config = ExplainConfig {
            model: "llama2".to_string(),
            program: "/usr/local/bin/ollama".to_string(),
        };

        let gw = OllamaGateway::new(ScriptedLauncher::new().not_found(), config.clone());
        let missing = gw.explain("x", ExplainMode::Explain).display_text();
        assert!(missing.starts_with("githelp: `ollama` command not found.\n"));
        assert_eq!(gw.launcher.calls.borrow()[0].program, "/usr/local/bin/ollama");

        let gw = OllamaGateway::new(ScriptedLauncher::new().fail("boom"), config);
        let error = gw.explain("x", ExplainMode::Explain).display_text();
        assert_eq!(error, "githelp: ollama returned an error:\nboom");
    }

    #[test]
    fn test_save_prompt_is_terse() {
        let prompt = ExplainMode::Save.prompt("git add -A");
        assert!(prompt.contains("20 characters"));
        assert!(prompt.contains("do not give examples"));
        assert!(prompt.ends_with("git add -A\n"));
    }

    #[test]
    fn test_short_phrase() {
        let answer = Explanation::Answer("\n  staged changes  \nextra".to_string());
        assert_eq!(answer.short_phrase(), Some("staged changes"));
        assert_eq!(Explanation::Answer("   \n".to_string()).short_phrase(), None);
        assert_eq!(Explanation::BackendMissing.short_phrase(), None);
    }
}
