//! Yes/no questions for the operator.

use std::io::{self, BufRead, Write};

use crate::core::{GuardError, GuardResult};
use crate::utils::logging::console_uses_stderr;

/// Source of operator decisions
pub trait Prompter {
    /// Ask a yes/no question. An empty answer selects `default` when there is one.
    fn confirm(&mut self, question: &str, default: Option<bool>) -> GuardResult<bool>;

    /// Ask for a line of free text, returned trimmed
    fn read_line(&mut self, question: &str) -> GuardResult<String>;
}

fn choice_suffix(default: Option<bool>) -> &'static str {
    match default {
        Some(true) => " (Y/n): ",
        Some(false) => " (y/N): ",
        None => " (y/n): ",
    }
}

/// Decide what an answer means; None means ask again
pub fn interpret_answer(answer: &str, default: Option<bool>) -> Option<bool> {
    let answer = answer.trim();
    match answer.chars().next().map(|c| c.to_ascii_lowercase()) {
        None => default,
        Some('y') => Some(true),
        Some('n') => Some(false),
        Some(_) => None,
    }
}

/// Prompter reading from a terminal (or any reader/writer pair)
pub struct ConsolePrompter<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl ConsolePrompter<io::StdinLock<'static>, io::Stderr> {
    /// Questions on stderr, leaving stdout to the report
    pub fn stderr() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

/// Terminal prompter writing wherever console output currently goes
pub fn console_prompter() -> Box<dyn Prompter> {
    if console_uses_stderr() {
        Box::new(ConsolePrompter::stderr())
    } else {
        Box::new(ConsolePrompter::stdio())
    }
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, prompt: &str) -> GuardResult<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(GuardError::Input(format!(
                "input closed while waiting for an answer to: {}",
                prompt.trim_end()
            )));
        }
        Ok(line)
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn confirm(&mut self, question: &str, default: Option<bool>) -> GuardResult<bool> {
        let prompt = format!("{}{}", question, choice_suffix(default));
        loop {
            let answer = self.ask(&prompt)?;
            if let Some(decision) = interpret_answer(&answer, default) {
                log::debug!("'{}' answered {}", question, decision);
                return Ok(decision);
            }
        }
    }

    fn read_line(&mut self, question: &str) -> GuardResult<String> {
        writeln!(self.output, "{}", question)?;
        Ok(self.ask("")?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> ConsolePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        ConsolePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn suffix_reflects_default() {
        assert_eq!(choice_suffix(Some(true)), " (Y/n): ");
        assert_eq!(choice_suffix(Some(false)), " (y/N): ");
        assert_eq!(choice_suffix(None), " (y/n): ");
    }

    #[test]
    fn empty_answer_uses_default_when_defined() {
        assert_eq!(interpret_answer("\n", Some(true)), Some(true));
        assert_eq!(interpret_answer("", Some(false)), Some(false));
        assert_eq!(interpret_answer("", None), None);
    }

    #[test]
    fn first_letter_decides() {
        assert_eq!(interpret_answer("Yes please", None), Some(true));
        assert_eq!(interpret_answer("nope", Some(true)), Some(false));
        assert_eq!(interpret_answer("maybe", Some(true)), None);
    }

    #[test]
    fn reasks_until_recognised() {
        let mut p = prompter("\nwhat\nN\n");
        let answer = p.confirm("Remove entry?", None).expect("answer");
        assert!(!answer);

        let shown = String::from_utf8(p.output).unwrap();
        assert_eq!(shown.matches("Remove entry? (y/n): ").count(), 3);
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut p = prompter("");
        let err = p.confirm("Keep?", Some(true)).expect_err("eof");
        assert!(matches!(err, GuardError::Input(_)));
    }

    #[test]
    fn read_line_trims() {
        let mut p = prompter("  ssh-ed25519 AAAA key@host  \n");
        let line = p.read_line("Paste key:").expect("line");
        assert_eq!(line, "ssh-ed25519 AAAA key@host");
    }
}
