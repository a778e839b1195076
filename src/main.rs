use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use githelp::{
    render, render_menu, render_not_found, Config, ExplainMode, Explainer, GitRunner,
    OllamaGateway, OverlayStore, SaveOptions, SaveOrchestrator, SaveOutcome, SystemLauncher,
    TerminalPrompter,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `githelp=debug`
const LOG_ENV: &str = "GITHELP_LOG";

#[derive(Parser, Debug)]
#[command(name = "githelp")]
#[command(author, version, about = "Git tips, guarded saves, and plain-language explanations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available tip pages
    List,

    /// Show tips for a git subcommand
    Tips {
        /// Git subcommand, e.g. "push"
        subcommand: String,
    },

    /// Show tips for a git subcommand, then ask the AI to explain them
    Explain {
        /// Git subcommand, e.g. "push"
        subcommand: String,

        /// Only show the tip page
        #[arg(long)]
        no_ai: bool,
    },

    /// Stage, commit and push everything, asking first
    Save {
        /// Commit message (prompted for when omitted)
        #[arg(short, long)]
        message: Option<String>,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Run a git command and explain its output
    Run {
        /// Only show git's output
        #[arg(long)]
        no_ai: bool,

        /// Arguments passed to git, e.g. `status -s`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load();
    let code = match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            1
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Option<Command>, config: &Config) -> githelp::Result<i32> {
    let store = OverlayStore::locate(config.overlays.path.as_deref());
    let gateway = OllamaGateway::new(SystemLauncher, config.explain.clone());
    let runner = GitRunner::with_program(SystemLauncher, config.git.clone());

    match command {
        None | Some(Command::List) => {
            println!("{}", render_menu(&store));
        }
        Some(Command::Tips { subcommand }) => {
            print_tips(&store, &subcommand);
        }
        Some(Command::Explain { subcommand, no_ai }) => {
            let Some(page) = print_tips(&store, &subcommand) else {
                return Ok(0);
            };
            if !no_ai {
                print_explanation(&gateway, &page)?;
            }
        }
        Some(Command::Save { message, yes }) => {
            let options = SaveOptions {
                message,
                assume_yes: yes,
                continue_on_add_failure: config.save.continue_on_add_failure,
            };
            let mut prompter = TerminalPrompter::new(io::stdin().lock());
            let mut out = io::stdout().lock();
            let outcome =
                SaveOrchestrator::new(&runner, &gateway, &mut prompter, &mut out).run(&options)?;

            if let SaveOutcome::Aborted { step, .. } = outcome {
                eprintln!("{}", format!("githelp save stopped at `git {}`", step).red());
                return Ok(1);
            }
        }
        Some(Command::Run { no_ai, args }) => {
            let result = runner.run(args.as_slice());
            print!("{}", result.output);
            io::stdout().flush()?;

            if !no_ai {
                let text = format!("$ git {}\n{}", args.join(" "), result.output.trim_end());
                print_explanation(&gateway, &text)?;
            }
            if !result.succeeded {
                eprintln!("{}", "git command failed".red());
                return Ok(1);
            }
        }
        Some(Command::Completion { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "githelp", &mut io::stdout());
        }
    }
    Ok(0)
}

/// Print the tip page for `subcommand` and return it, or print the
/// not-found text and return `None`
fn print_tips(store: &OverlayStore, subcommand: &str) -> Option<String> {
    match store.load(subcommand) {
        Some(record) => {
            let page = render(&record);
            print!("{}", page);
            Some(page)
        }
        None => {
            println!("{}", render_not_found(subcommand));
            None
        }
    }
}

fn print_explanation(gateway: &dyn Explainer, text: &str) -> githelp::Result<()> {
    let explanation = gateway.explain(text, ExplainMode::Explain);
    let mut out = io::stdout().lock();
    if explanation.is_answer() {
        writeln!(out, "{}", "AI explanation".cyan().bold())?;
    }
    writeln!(out, "{}", explanation.display_text().trim_end())?;
    Ok(())
}
