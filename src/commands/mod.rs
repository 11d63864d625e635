//! Built-in REPL commands prefixed with `/`.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. The registry handles dispatch, alias resolution,
//! and help generation. Commands never touch the dashboard directly:
//! they return an [`Action`] for the REPL to apply.

mod cases;
mod config;
mod evaluate;
mod help;
mod quit;
mod refresh;
mod results;
mod select;

use async_trait::async_trait;
use std::sync::Arc;

use crate::banner::BannerInfo;
use crate::dashboard::{Action, DashboardState};

/// Session info available to commands during execution.
pub struct SessionInfo<'a> {
    pub banner: &'a BannerInfo<'a>,
    pub state: &'a DashboardState,
    /// A scoring call is currently in flight.
    pub evaluating: bool,
}

/// What the REPL should do after a command runs.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Not a command. The REPL treats the input as a case selection.
    NotACommand,
    /// Command handled, continue the REPL loop.
    Handled,
    /// Apply this action to the dashboard and print the new frame.
    Dispatch(Action),
    /// Exit the REPL.
    Quit,
}

/// A REPL command. Implement this trait to add new commands.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"/cases"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["/ls"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument hint shown in `/help`, e.g. `"<code|#>"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `/help`.
    fn description(&self) -> &str;

    /// Run the command. `args` is everything after the command word.
    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult;
}

/// Holds registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(help::HelpCommand),
            Arc::new(cases::CasesCommand),
            Arc::new(select::SelectCommand),
            Arc::new(evaluate::EvaluateCommand),
            Arc::new(results::ResultsCommand),
            Arc::new(refresh::RefreshCommand),
            Arc::new(config::ConfigCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    /// Register an additional command.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Dispatch input to a matching command, or return `NotACommand`.
    pub async fn dispatch(&self, input: &str, info: &SessionInfo<'_>) -> CommandResult {
        let input = input.trim();
        let (word, args) = input
            .split_once(char::is_whitespace)
            .map(|(w, a)| (w, a.trim()))
            .unwrap_or((input, ""));

        for command in &self.commands {
            if word == command.name() || command.aliases().contains(&word) {
                // /help needs the registry to list all commands
                if command.name() == "/help" {
                    print!("{}", self.help_text());
                    return CommandResult::Handled;
                }
                return command.execute(args, info).await;
            }
        }

        if word.starts_with('/') {
            println!("unknown command: {word}");
            println!("type /help for available commands");
            return CommandResult::Handled;
        }

        CommandResult::NotACommand
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.usage(), c.aliases()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out.push_str("\n  anything else is read as a case code or list number\n");
        out
    }

    /// All registered command names (for testing).
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases (for duplicate detection).
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let head = if usage.is_empty() {
        name.to_string()
    } else {
        format!("{name} {usage}")
    };
    if aliases.is_empty() {
        head
    } else {
        format!("{} ({})", head, aliases.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::model::{ProcurementCase, RecordId};

    pub(crate) fn test_info() -> SessionInfo<'static> {
        let config: &'static DashboardConfig = Box::leak(Box::new(DashboardConfig::default()));
        let banner: &'static BannerInfo<'static> =
            Box::leak(Box::new(BannerInfo::from_config(config, "demo")));
        let state: &'static DashboardState = Box::leak(Box::new(DashboardState {
            cases: vec![ProcurementCase {
                id: RecordId::Int(1),
                process_code: "LP-1".to_string(),
                contract_object: "Bridge".to_string(),
                estimated_value: Some(10.0),
                phase_status: "Evaluando Ofertas".to_string(),
            }],
            selected: Some(RecordId::Int(1)),
        }));
        SessionInfo {
            banner,
            state,
            evaluating: false,
        }
    }

    #[test]
    fn all_builtins_registered() {
        let reg = CommandRegistry::new();
        let names = reg.names();
        for name in [
            "/help", "/cases", "/select", "/evaluate", "/results", "/refresh", "/config", "/quit",
        ] {
            assert!(names.contains(&name), "missing: {name}");
        }
    }

    #[test]
    fn no_duplicate_triggers() {
        let reg = CommandRegistry::new();
        let triggers = reg.all_triggers();
        let mut seen = Vec::new();
        for t in &triggers {
            assert!(!seen.contains(t), "duplicate trigger: {t}");
            seen.push(t);
        }
    }

    #[test]
    fn help_text_includes_all_commands() {
        let reg = CommandRegistry::new();
        let text = reg.help_text();
        for name in reg.names() {
            assert!(text.contains(name), "help missing: {name}");
        }
        assert!(text.contains("/select <code|#>"));
    }

    #[tokio::test]
    async fn unknown_slash_command_is_handled() {
        let reg = CommandRegistry::new();
        assert_eq!(
            reg.dispatch("/foobar", &test_info()).await,
            CommandResult::Handled
        );
    }

    #[tokio::test]
    async fn non_command_passes_through() {
        let reg = CommandRegistry::new();
        assert_eq!(
            reg.dispatch("LP-1", &test_info()).await,
            CommandResult::NotACommand
        );
        assert_eq!(
            reg.dispatch("2", &test_info()).await,
            CommandResult::NotACommand
        );
    }

    #[tokio::test]
    async fn arguments_reach_command() {
        let reg = CommandRegistry::new();
        assert_eq!(
            reg.dispatch("/select   LP-1 ", &test_info()).await,
            CommandResult::Dispatch(Action::Select("LP-1".to_string()))
        );
    }

    #[tokio::test]
    async fn aliases_resolve() {
        let reg = CommandRegistry::new();
        assert_eq!(
            reg.dispatch("/eval", &test_info()).await,
            CommandResult::Dispatch(Action::Evaluate)
        );
        assert_eq!(reg.dispatch("exit", &test_info()).await, CommandResult::Quit);
    }

    #[tokio::test]
    async fn registered_command_works() {
        struct PingCommand;

        #[async_trait]
        impl Command for PingCommand {
            fn name(&self) -> &str {
                "/ping"
            }
            fn description(&self) -> &str {
                "pong"
            }
            async fn execute(&self, _args: &str, _info: &SessionInfo<'_>) -> CommandResult {
                CommandResult::Handled
            }
        }

        let mut reg = CommandRegistry::new();
        reg.register(Arc::new(PingCommand));
        assert!(reg.names().contains(&"/ping"));
        assert_eq!(
            reg.dispatch("/ping", &test_info()).await,
            CommandResult::Handled
        );
        assert!(reg.help_text().contains("/ping"));
    }

    #[test]
    fn format_label_variants() {
        assert_eq!(format_label("/cases", "", &[]), "/cases");
        assert_eq!(format_label("/help", "", &["/h", "/?"]), "/help (/h, /?)");
        assert_eq!(format_label("/select", "<code>", &["/s"]), "/select <code> (/s)");
    }
}
