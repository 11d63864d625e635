use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::dashboard::DashboardState;

pub struct CasesCommand;

/// The selector listing: position, code, contract object.
fn case_list(state: &DashboardState) -> String {
    if state.cases.is_empty() {
        return "  no cases are pending evaluation\n".to_string();
    }
    let width = state
        .cases
        .iter()
        .map(|c| c.process_code.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (i, case) in state.cases.iter().enumerate() {
        let marker = if state.selected.as_ref() == Some(&case.id) {
            "▸"
        } else {
            " "
        };
        out.push_str(&format!(
            "  {marker} {:>2}. {:<width$}  {}\n",
            i + 1,
            case.process_code,
            case.contract_object
        ));
    }
    out
}

#[async_trait]
impl Command for CasesCommand {
    fn name(&self) -> &str {
        "/cases"
    }

    fn aliases(&self) -> &[&str] {
        &["/ls"]
    }

    fn description(&self) -> &str {
        "list cases pending evaluation"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        print!("{}", case_list(info.state));
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_info;

    #[test]
    fn empty_list_says_so() {
        assert!(case_list(&DashboardState::default()).contains("no cases"));
    }

    #[test]
    fn list_marks_selection() {
        let info = test_info();
        let text = case_list(info.state);
        assert!(text.contains("▸  1. LP-1  Bridge"));
    }

    #[tokio::test]
    async fn returns_handled() {
        assert_eq!(
            CasesCommand.execute("", &test_info()).await,
            CommandResult::Handled
        );
    }
}
