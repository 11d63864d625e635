use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::banner::session_lines;

pub struct ConfigCommand;

#[async_trait]
impl Command for ConfigCommand {
    fn name(&self) -> &str {
        "/config"
    }

    fn description(&self) -> &str {
        "show the active configuration (keys redacted)"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        println!("   title     {}", info.banner.title);
        print!("{}", session_lines(info.banner));
        CommandResult::Handled
    }
}
