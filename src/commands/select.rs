use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::dashboard::Action;

pub struct SelectCommand;

#[async_trait]
impl Command for SelectCommand {
    fn name(&self) -> &str {
        "/select"
    }

    fn aliases(&self) -> &[&str] {
        &["/s"]
    }

    fn usage(&self) -> &str {
        "<code|#>"
    }

    fn description(&self) -> &str {
        "select a case by process code or list number"
    }

    async fn execute(&self, args: &str, _info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            println!("usage: /select <code|#>");
            return CommandResult::Handled;
        }
        CommandResult::Dispatch(Action::Select(args.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_info;

    #[tokio::test]
    async fn missing_argument_is_handled() {
        assert_eq!(
            SelectCommand.execute("", &test_info()).await,
            CommandResult::Handled
        );
    }

    #[tokio::test]
    async fn dispatches_selection() {
        assert_eq!(
            SelectCommand.execute("2", &test_info()).await,
            CommandResult::Dispatch(Action::Select("2".to_string()))
        );
    }
}
