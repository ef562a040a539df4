use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

/// The 8-bit status a process reports for `exit_code`.
///
/// Codes outside `0..=255` keep their low byte as `exit(3)` would, except
/// that a non-zero code whose low byte is 0 (256, 512, -256, ...) becomes
/// 255 so a simulated failure never reads as success.
pub fn exit_status_byte(exit_code: i32) -> u8 {
    match (exit_code, (exit_code & 0xff) as u8) {
        (0, _) => 0,
        (_, 0) => 255,
        (_, low) => low,
    }
}

/// Synthetic result of a simulated process.
///
/// A non-zero exit code is ordinary data: it is what the mocked command
/// "returned", not an engine failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub exit_code: i32,
    #[serde(default)]
    pub stdout: Vec<u8>,
    #[serde(default)]
    pub stderr: Vec<u8>,
    /// Simulated wall time reported to callers that measure it.
    #[serde(default)]
    pub elapsed: Duration,
}

impl Completion {
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    /// Exit code 0 with the given standard output.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self::new(0).with_stdout(stdout)
    }

    /// Non-zero exit with the given standard error.
    pub fn failure(exit_code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self::new(exit_code).with_stderr(stderr)
    }

    pub fn with_stdout(mut self, stdout: impl Into<Vec<u8>>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Convert into the same shape a spawned process would produce.
    #[cfg(unix)]
    pub fn into_output(self) -> std::process::Output {
        use std::os::unix::process::ExitStatusExt;

        // wait(2) status encoding: exit code lives in the second byte
        let code = i32::from(exit_status_byte(self.exit_code));
        let status = std::process::ExitStatus::from_raw(code << 8);
        std::process::Output {
            status,
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }
}
