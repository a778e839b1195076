//! Plain-text rendering of tip pages and the command menu

use crate::overlay::{OverlayRecord, OverlayStore};

/// First line of every tip page
pub const HEADER: &str = "githelp tips";

/// Operations shown at the top of the menu
const MENU_COMMANDS: &[(&str, &str)] = &[
    ("list", "List available tip pages"),
    ("tips <subcommand>", "Show tips for a git subcommand"),
    ("explain <subcommand>", "Show tips, then ask the AI to explain them"),
    ("run <git args...>", "Run a git command and explain its output"),
    ("save [--message TEXT]", "Stage, commit and push in one guarded step"),
];

fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|s| !s.is_empty())
}

/// Render one tip page. Sections whose field is missing or empty are left
/// out entirely.
pub fn render(record: &OverlayRecord) -> String {
    let mut lines: Vec<String> = vec![HEADER.to_string()];

    if let Some(summary) = non_empty(&record.summary) {
        lines.push(String::new());
        lines.push(summary.to_string());
    }

    if let Some(items) = record.when_to_use.as_ref().filter(|v| !v.is_empty()) {
        lines.push(String::new());
        lines.push("When to use".to_string());
        for item in items {
            lines.push(format!(" - {}", item));
        }
    }

    if let Some(examples) = record.examples.as_ref().filter(|v| !v.is_empty()) {
        lines.push(String::new());
        lines.push("Examples".to_string());
        for example in examples {
            lines.push(format!(" $ {}", example.cmd));
            if let Some(say) = non_empty(&example.say) {
                lines.push(format!("   {}", say));
            }
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Shown by `tips`/`explain` when there is no page for `command`
pub fn render_not_found(command: &str) -> String {
    format!("{}\n\nNo tips found for '{}'.", HEADER, command)
}

/// Command list plus every available tip page
pub fn render_menu(store: &OverlayStore) -> String {
    render_menu_with(&store.list_names())
}

fn render_menu_with(names: &[String]) -> String {
    let width = MENU_COMMANDS
        .iter()
        .map(|(usage, _)| usage.len())
        .max()
        .unwrap_or(0);

    let mut lines = vec!["Commands:".to_string()];
    for (usage, help) in MENU_COMMANDS {
        lines.push(format!("  - {:<width$}   {}", usage, help, width = width));
    }
    lines.push(String::new());

    if names.is_empty() {
        lines.push("No tip pages found.".to_string());
    } else {
        lines.push("Available tips:".to_string());
        for name in names {
            lines.push(format!("  - {}", name));
        }
    }
    lines.join("\n")
}
