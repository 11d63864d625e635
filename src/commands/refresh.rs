use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::dashboard::Action;

pub struct RefreshCommand;

#[async_trait]
impl Command for RefreshCommand {
    fn name(&self) -> &str {
        "/refresh"
    }

    fn description(&self) -> &str {
        "clear cached data and reload from the store"
    }

    async fn execute(&self, _args: &str, _info: &SessionInfo<'_>) -> CommandResult {
        CommandResult::Dispatch(Action::Refresh)
    }
}
