//! Shared utilities for mockproc components

mod completion;
mod request;

pub use completion::{exit_status_byte, Completion};
pub use request::InvocationRequest;

/// Environment variable names used by the shim and trace sink
pub mod env_vars {
    pub const ROUTES_VAR: &str = "MOCKPROC_ROUTES"; // Path to the YAML route table
    pub const TRACE_LOG_VAR: &str = "MOCKPROC_TRACE_LOG"; // Path to JSONL trace log
    pub const SESSION_VAR: &str = "MOCKPROC_SESSION_ID"; // UUIDv7 for call correlation
    pub const DEPTH_VAR: &str = "MOCKPROC_DEPTH"; // Caller-assigned nesting depth, echoed into traces
    pub const STDIN_VAR: &str = "MOCKPROC_STDIN"; // "1" reads stdin into the request
    pub const LOG_VAR: &str = "MOCKPROC_LOG"; // tracing filter directives
    pub const LOG_OPTS_VAR: &str = "MOCKPROC_LOG_OPTS"; // "raw" disables redaction
    pub const FSYNC_VAR: &str = "MOCKPROC_FSYNC"; // "1" syncs trace writes
}

/// Standard log schema constants
pub mod log_schema {
    pub const SEQUENCE: &str = "seq";
    pub const SESSION_ID: &str = "session_id";
    pub const TIMESTAMP: &str = "ts";
    pub const COMPONENT: &str = "component";
    pub const ARGV: &str = "argv";
    pub const CWD: &str = "cwd";
    pub const OUTCOME: &str = "outcome";
    pub const ROUTE: &str = "route";
    pub const EXIT_CODE: &str = "exit_code";
    pub const ERROR: &str = "error";
}

/// File-name component of an executable token.
///
/// `/usr/bin/git` and `git` both yield `git`. Both separators are honoured so
/// that Windows-style tokens recorded on unix hosts compare the same way.
pub fn program_name(token: &str) -> &str {
    token.rsplit(['/', '\\']).next().unwrap_or(token)
}

/// Option names whose value is a credential, with or without leading dashes.
const SENSITIVE_KEYS: &[&str] = &["token", "password", "secret", "apikey", "api_key", "api-key"];

/// Flags that take a credential as the following token.
const SENSITIVE_FLAGS: &[&str] = &["--token", "--password", "--header"];

fn redaction_disabled() -> bool {
    std::env::var(env_vars::LOG_OPTS_VAR).as_deref() == Ok("raw")
}

/// Mask the value of a `key=value` argument whose key names a credential.
///
/// The key is compared whole, ignoring case and leading dashes, so
/// `--password=x` is masked while `user.signingkey=x` is left alone.
pub fn redact_sensitive(arg: &str) -> String {
    if redaction_disabled() {
        return arg.to_string();
    }

    if let Some((name, _)) = arg.split_once('=') {
        let key = name.trim_start_matches('-').to_ascii_lowercase();
        if SENSITIVE_KEYS.contains(&key.as_str()) {
            return format!("{name}=***");
        }
    }
    arg.to_string()
}

/// Redact an argument vector, masking the value that follows a sensitive flag.
///
/// The flag itself is kept so the recorded argv still shows its shape.
pub fn redact_argv(argv: &[String]) -> Vec<String> {
    if redaction_disabled() {
        return argv.to_vec();
    }

    let mut result = Vec::with_capacity(argv.len());
    let mut mask_next = false;

    for arg in argv {
        if mask_next {
            result.push("***".to_string());
            mask_next = false;
            continue;
        }
        mask_next = SENSITIVE_FLAGS.contains(&arg.as_str());
        result.push(redact_sensitive(arg));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_name() {
        assert_eq!(program_name("/usr/bin/git"), "git");
        assert_eq!(program_name("git"), "git");
        assert_eq!(program_name("C:\\Tools\\git.exe"), "git.exe");
        assert_eq!(program_name(""), "");
    }

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_redact_sensitive() {
        assert_eq!(redact_sensitive("normal_arg"), "normal_arg");
        assert_eq!(redact_sensitive("token=secret123"), "token=***");
        assert_eq!(redact_sensitive("--password=hunter2"), "--password=***");
        assert_eq!(redact_sensitive("API_KEY=abc"), "API_KEY=***");
        assert_eq!(redact_sensitive("--password"), "--password");
    }

    #[test]
    fn test_similar_keys_are_kept() {
        assert_eq!(
            redact_sensitive("user.signingkey=ABC"),
            "user.signingkey=ABC"
        );
        assert_eq!(redact_sensitive("MY_TOKEN_PATH=/tmp/x"), "MY_TOKEN_PATH=/tmp/x");
        assert_eq!(redact_sensitive("--format=%H"), "--format=%H");
    }

    #[test]
    fn test_redact_argv_masks_flag_value() {
        assert_eq!(
            redact_argv(&args(&["curl", "--header", "Authorization: x", "https://example.com"])),
            vec!["curl", "--header", "***", "https://example.com"]
        );
        assert_eq!(
            redact_argv(&args(&["git", "push", "--password", "hunter2", "origin"])),
            vec!["git", "push", "--password", "***", "origin"]
        );
    }

    #[test]
    fn test_short_flags_are_not_credentials() {
        let argv = args(&["git", "log", "-p", "HEAD~3"]);
        assert_eq!(redact_argv(&argv), argv);

        let argv = args(&["git", "config", "user.signingkey=ABC"]);
        assert_eq!(redact_argv(&argv), argv);

        let argv = args(&["grep", "-H", "needle", "file.txt"]);
        assert_eq!(redact_argv(&argv), argv);
    }
}
