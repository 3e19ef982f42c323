use anyhow::Context;
use anyhow::Result;
use artops_lib::bailc;
use artops_lib::constants::CMD_STYLE;
use artops_lib::ctx;
use artops_lib::editor::answers::Question;
use artops_lib::editor::AnswerProvider;
use inquire::InquireError;
use inquire::error::InquireResult;

/// Correctly handles when the user cancels the operation
/// during an Inquire prompt.
pub fn ask<T>(inq: InquireResult<T>) -> Result<T> {
    match inq {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled) => {
            bailc!("The operation was canceled using the ESC key.", ; "",; "",)
        }
        Err(InquireError::OperationInterrupted) => {
            bailc!("The operation was interrupted using Ctrl+C.", ; "",; "",)
        }
        other => other.with_context(ctx!("Could not print a prompt", ; "", )),
    }
}

/// Asks for every replacement value on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl AnswerProvider for TerminalPrompt {
    fn answer(&mut self, question: &Question) -> Result<Option<String>> {
        let help = format!(
            "currently {CMD_STYLE}{}{CMD_STYLE:#}, leave empty to keep it",
            question.current
        );

        let answer = ask(
            inquire::Text::new(question.prompt.trim_end())
                .with_help_message(&help)
                .prompt(),
        )?;

        Ok(Some(answer))
    }
}
