use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single simulated process call.
///
/// The first argv token is the executable path or name; the rest are its
/// arguments. Requests are built once per call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub argv: Vec<String>,
    pub cwd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    /// Bytes supplied on standard input, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<u8>>,
}

impl InvocationRequest {
    pub fn new<I, S>(argv: I, cwd: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: cwd.into(),
            env: None,
            input: None,
        }
    }

    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// The executable token, or `None` for an empty argv.
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Arguments after the executable token.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    /// Argument at `index`, counting from the first token after the program.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args().get(index).map(String::as_str)
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.as_ref()?.get(key).map(String::as_str)
    }

    /// Shell-quoted command line, for diagnostics.
    pub fn command_line(&self) -> String {
        shell_words::join(&self.argv)
    }
}

impl fmt::Display for InvocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` (cwd: {})", self.command_line(), self.cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_and_args() {
        let req = InvocationRequest::new(["git", "remote", "get-url", "origin"], "/repo");
        assert_eq!(req.program(), Some("git"));
        assert_eq!(req.args(), ["remote", "get-url", "origin"]);
        assert_eq!(req.arg(2), Some("origin"));
        assert_eq!(req.arg(3), None);
    }

    #[test]
    fn test_empty_argv() {
        let req = InvocationRequest::new(Vec::<String>::new(), "/");
        assert_eq!(req.program(), None);
        assert!(req.args().is_empty());
    }

    #[test]
    fn test_env_lookup() {
        let req = InvocationRequest::new(["env"], "/").with_env([("LANG", "C")]);
        assert_eq!(req.env_var("LANG"), Some("C"));
        assert_eq!(req.env_var("HOME"), None);

        let bare = InvocationRequest::new(["env"], "/");
        assert_eq!(bare.env_var("LANG"), None);
    }

    #[test]
    fn test_display_quotes_arguments() {
        let req = InvocationRequest::new(["git", "commit", "-m", "two words"], "/repo");
        assert_eq!(req.to_string(), "`git commit -m 'two words'` (cwd: /repo)");
    }

    #[test]
    fn test_serde_omits_absent_fields() {
        let req = InvocationRequest::new(["ls"], "/tmp");
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("env").is_none());
        assert!(json.get("input").is_none());
        assert_eq!(json["argv"], serde_json::json!(["ls"]));
    }
}
