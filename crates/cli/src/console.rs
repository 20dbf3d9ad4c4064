//! Terminal implementation of the operator console.
//!
//! Prompts and notices go to stderr so stdout stays clean for reports and
//! `--json` output. Answers are read line by line from stdin.

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::style::{style, Color, Stylize};
use rostersync_recon::Interactive;

const CONFIRM_COLOR: Color = Color::AnsiValue(40);
const WARN_COLOR: Color = Color::AnsiValue(202);
const ERROR_COLOR: Color = Color::AnsiValue(124);
const INDENT: &str = "   ";

pub struct TerminalConsole<R, W> {
    input: R,
    output: W,
    color: bool,
    depth: usize,
}

impl TerminalConsole<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        let color = io::stderr().is_terminal();
        Self::new(io::stdin().lock(), io::stderr(), color)
    }
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(input: R, output: W, color: bool) -> Self {
        Self {
            input,
            output,
            color,
            depth: 0,
        }
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn outdent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }

    fn line(&mut self, text: &str, color: Option<Color>) {
        let prefix = INDENT.repeat(self.depth);
        // Write errors are ignored.
        let _ = match color {
            Some(c) if self.color => writeln!(self.output, "{prefix}{}", style(text).with(c)),
            _ => writeln!(self.output, "{prefix}{text}"),
        };
    }

    /// Read one line; `None` on EOF or a read error.
    fn read_line(&mut self) -> Option<String> {
        let _ = self.output.flush();
        let mut buf = String::new();
        match self.input.read_line(&mut buf) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(buf.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl<R: BufRead, W: Write> Interactive for TerminalConsole<R, W> {
    fn choose_one(&mut self, prompt: &str, options: &[String]) -> Option<usize> {
        self.line(prompt, None);
        for (i, option) in options.iter().enumerate() {
            self.line(&format!("{:>3}) {option}", i + 1), None);
        }
        loop {
            let prefix = INDENT.repeat(self.depth);
            let _ = write!(self.output, "{prefix}Choice [1-{}, c to cancel]: ", options.len());
            let answer = self.read_line()?;
            let answer = answer.trim();
            if answer.is_empty() || answer.eq_ignore_ascii_case("c") || answer.eq_ignore_ascii_case("q") {
                return None;
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Some(n - 1),
                _ => self.line(&format!("'{answer}' is not a valid choice"), Some(WARN_COLOR)),
            }
        }
    }

    fn ask(&mut self, prompt: &str) -> String {
        let prefix = INDENT.repeat(self.depth);
        let _ = write!(self.output, "{prefix}{prompt} ");
        self.read_line().unwrap_or_default()
    }

    fn warn(&mut self, text: &str) {
        self.line(text, Some(WARN_COLOR));
    }

    fn error(&mut self, text: &str) {
        self.line(text, Some(ERROR_COLOR));
    }

    fn confirm(&mut self, text: &str) {
        self.line(text, Some(CONFIRM_COLOR));
    }
}
