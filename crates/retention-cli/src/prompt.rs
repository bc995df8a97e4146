//! Interactive prompts for parameters not given on the command line.

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};

/// Line-oriented question/answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one answer line, without its line ending
    /// or surrounding whitespace.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question} ").context("write prompt")?;
        self.output.flush().context("flush prompt")?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("read answer")?;
        if read == 0 {
            bail!("input closed before answering: {question}");
        }
        Ok(line.trim().to_string())
    }
}

/// Dry-run answers: `yes` in any case enables dry-run, anything else disables it.
pub fn parse_dry_run_answer(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}
