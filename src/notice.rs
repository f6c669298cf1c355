//! RM-020: Colored stage notices for the operator.
//!
//! These are the human-facing status lines ("Building compiler...", "ok",
//! "failed"). Diagnostic detail goes through `log` instead.

use crate::process::CommandLine;
use std::io::IsTerminal;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

pub struct Notices<W> {
    out: W,
}

impl Notices<StandardStream> {
    /// Notices on stdout, colored only when stdout is a terminal and
    /// `NO_COLOR` is unset.
    pub fn stdout() -> Self {
        let choice = if std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self::new(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> Notices<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Stage start, on its own line.
    pub fn stage(&mut self, msg: &str) {
        self.colored(Color::Blue, msg, true);
    }

    /// Stage start, leaving the cursor on the line for a trailing verdict.
    pub fn stage_inline(&mut self, msg: &str) {
        self.colored(Color::Blue, &format!("{} ", msg), false);
    }

    pub fn running(&mut self, cmd: &CommandLine) {
        self.stage(&format!("Running '{}' ...", cmd));
    }

    pub fn done(&mut self, msg: &str) {
        self.colored(Color::Green, msg, true);
    }

    pub fn failure(&mut self, msg: &str) {
        self.colored(Color::Red, msg, true);
    }

    pub fn skipped(&mut self, msg: &str) {
        self.colored(Color::Yellow, msg, true);
    }

    pub fn plain(&mut self, msg: &str) {
        let _ = writeln!(self.out, "{}", msg);
    }

    pub fn plain_inline(&mut self, msg: &str) {
        let _ = write!(self.out, "{}", msg);
        let _ = self.out.flush();
    }

    pub fn colored(&mut self, color: Color, msg: &str, newline: bool) {
        let _ = self.out.set_color(ColorSpec::new().set_fg(Some(color)));
        let _ = if newline {
            writeln!(self.out, "{}", msg)
        } else {
            write!(self.out, "{}", msg)
        };
        let _ = self.out.reset();
        let _ = self.out.flush();
    }
}

#[cfg(test)]
pub(crate) fn capture() -> Notices<termcolor::Buffer> {
    Notices::new(termcolor::Buffer::no_color())
}

#[cfg(test)]
pub(crate) fn text(notices: Notices<termcolor::Buffer>) -> String {
    String::from_utf8_lossy(notices.into_inner().as_slice()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rm020_stage_lines() {
        let mut n = capture();
        n.stage_inline("Building instruction selection rules...");
        n.done("Done");
        n.stage("Building compiler...");
        n.failure("Error");
        assert_eq!(
            text(n),
            "Building instruction selection rules... Done\nBuilding compiler...\nError\n"
        );
    }

    #[test]
    fn test_rm020_running_quotes_command() {
        let mut n = capture();
        n.running(&CommandLine::new("cargo").args(["check", "--all"]));
        assert_eq!(text(n), "Running 'cargo check --all' ...\n");
    }

    #[test]
    fn test_rm020_ansi_buffer_colors() {
        let mut n = Notices::new(termcolor::Buffer::ansi());
        n.failure("failed");
        let out = String::from_utf8_lossy(n.into_inner().as_slice()).into_owned();
        assert!(out.contains("\x1b["));
        assert!(out.contains("failed"));
    }
}
