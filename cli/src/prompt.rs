use crate::error::Error;
use async_trait::async_trait;
use std::io::{stdin, stdout, Write};

/// Interactive yes/no questions
#[async_trait]
pub(crate) trait Prompt: Send + Sync {
    /// Ask the question, the `name` identifies the answer in logs
    async fn confirm(&self, text: &str, name: &str) -> eyre::Result<bool>;
}

/// Ask in the terminal, an empty answer means yes
pub(crate) struct TerminalPrompt;

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn confirm(&self, text: &str, name: &str) -> eyre::Result<bool> {
        let generic_error = Error::new(
            "Failed to read the answer",
            Some("Run the command in an interactive terminal, or pass --yes."),
        );

        loop {
            print!(
                "\n{} {} {} ",
                console::style("?").green(),
                console::style(text).bold(),
                console::style("[Y/n]").dim()
            );

            stdout().flush().map_err(|e| {
                log::error!("Failed to write to stdout: {e:?}");
                generic_error.clone()
            })?;

            let mut input = String::new();

            let read = stdin().read_line(&mut input).map_err(|e| {
                log::error!("Failed to read from stdin: {e:?}");
                generic_error.clone()
            })?;

            // Closed stdin, nobody is there to answer
            if read == 0 {
                return Err(generic_error.into());
            }

            if let Some(answer) = parse_answer(&input) {
                log::debug!("Prompt {name} answered: {answer}");
                return Ok(answer);
            }

            println!("{}", console::style("Please answer y or n").yellow());
        }
    }
}

/// Confirm everything without asking, for non-interactive runs
pub(crate) struct AutoConfirm;

#[async_trait]
impl Prompt for AutoConfirm {
    async fn confirm(&self, text: &str, name: &str) -> eyre::Result<bool> {
        log::info!("Auto-confirmed {name}: {text}");
        Ok(true)
    }
}

fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_ref() {
        "" | "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answer_is_affirmative() {
        assert_eq!(parse_answer("\n"), Some(true));
        assert_eq!(parse_answer(" Yes\n"), Some(true));
        assert_eq!(parse_answer("N\n"), Some(false));
        assert_eq!(parse_answer("maybe\n"), None);
    }

    #[tokio::test]
    async fn auto_confirm_always_agrees() {
        assert!(AutoConfirm.confirm("Deploy?", "shouldDeploy").await.unwrap());
    }
}
