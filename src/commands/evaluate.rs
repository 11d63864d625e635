use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::dashboard::Action;

pub struct EvaluateCommand;

#[async_trait]
impl Command for EvaluateCommand {
    fn name(&self) -> &str {
        "/evaluate"
    }

    fn aliases(&self) -> &[&str] {
        &["/eval", "/run"]
    }

    fn description(&self) -> &str {
        "run automatic scoring for the selected case"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if info.evaluating {
            println!("  ! an evaluation is already running");
            return CommandResult::Handled;
        }
        if info.state.selected_case().is_none() {
            println!("  ! select a case first (/cases, /select <code|#>)");
            return CommandResult::Handled;
        }
        CommandResult::Dispatch(Action::Evaluate)
    }
}
