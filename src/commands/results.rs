use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::dashboard::Action;

pub struct ResultsCommand;

#[async_trait]
impl Command for ResultsCommand {
    fn name(&self) -> &str {
        "/results"
    }

    fn aliases(&self) -> &[&str] {
        &["/show"]
    }

    fn description(&self) -> &str {
        "show the ranked bids of the selected case"
    }

    async fn execute(&self, _args: &str, _info: &SessionInfo<'_>) -> CommandResult {
        CommandResult::Dispatch(Action::Rerun)
    }
}
