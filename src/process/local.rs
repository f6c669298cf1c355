//! RM-011: Local process execution via `std::process::Command`.

use super::{exit_code_of, CommandLine, ExecOutput, Runner};
use std::process::{Command, Stdio};

/// Runs commands on this machine. No timeout: a hung child blocks the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(cmd: &CommandLine) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(ref dir) = cmd.cwd {
            command.current_dir(dir);
        }
        for (key, value) in &cmd.envs {
            command.env(key, value);
        }
        command
    }
}

impl Runner for SystemRunner {
    fn status(&mut self, cmd: &CommandLine) -> std::io::Result<i32> {
        log::debug!("spawning {} (inherit stdio)", cmd);
        let status = Self::command(cmd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        let code = exit_code_of(status);
        log::debug!("{} exited with {}", cmd.program_lossy(), code);
        Ok(code)
    }

    fn capture(&mut self, cmd: &CommandLine) -> std::io::Result<ExecOutput> {
        log::debug!("spawning {} (captured)", cmd);
        let output = Self::command(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(ExecOutput {
            exit_code: exit_code_of(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandLine {
        CommandLine::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn test_rm011_status_success() {
        assert_eq!(SystemRunner.status(&sh("true")).unwrap(), 0);
    }

    #[test]
    fn test_rm011_status_passthrough() {
        assert_eq!(SystemRunner.status(&sh("exit 42")).unwrap(), 42);
    }

    #[test]
    fn test_rm011_capture_echo() {
        let out = SystemRunner.capture(&sh("echo hello")).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn test_rm011_capture_stderr() {
        let out = SystemRunner.capture(&sh("echo err >&2; exit 3")).unwrap();
        assert_eq!(out.exit_code, 3);
        assert!(out.stderr.contains("err"));
    }

    #[test]
    fn test_rm011_signal_killed() {
        let out = SystemRunner.capture(&sh("kill -9 $$")).unwrap();
        assert_eq!(out.exit_code, 128 + 9);
    }

    #[test]
    fn test_rm011_cwd_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = sh("pwd; echo $COLORED_OUTPUT")
            .current_dir(dir.path())
            .env("COLORED_OUTPUT", "off");
        let out = SystemRunner.capture(&cmd).unwrap();
        let lines: Vec<_> = out.stdout.lines().collect();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(lines[0]).canonicalize().unwrap(),
            expected
        );
        assert_eq!(lines[1], "off");
    }

    #[test]
    fn test_rm011_missing_program() {
        let err = SystemRunner
            .status(&CommandLine::new("rustiny-make-no-such-program"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
