//! Terminal prompts.

use crate::output::render_table;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, MultiSelect};
use skylift_core::{Error, Result};
use skylift_deployer::{Prompt, Question};

/// Interactive prompt on the controlling terminal.
#[derive(Default)]
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self::default()
    }
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::Internal(format!("prompt failed: {}", e))
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &Question) -> Result<bool> {
        if let Some(details) = &question.details {
            eprintln!("{}\n", render_table(details));
        }

        Confirm::with_theme(&self.theme)
            .with_prompt(&question.message)
            .default(question.default)
            .interact_opt()
            .map_err(prompt_error)?
            .ok_or(Error::Cancelled)
    }

    fn select(&self, message: &str, items: &[String]) -> Result<Vec<String>> {
        let chosen = MultiSelect::with_theme(&self.theme)
            .with_prompt(message)
            .items(items)
            .interact_opt()
            .map_err(prompt_error)?
            .ok_or(Error::Cancelled)?;

        Ok(chosen.into_iter().map(|i| items[i].clone()).collect())
    }
}
