//! Shim invocation context read from the process environment
//!
//! The shim binary is copied (or linked) under the name of the tool it stands
//! in for. Everything else it needs comes from `MOCKPROC_*` variables.

use anyhow::{anyhow, Context, Result};
use mockproc_common::env_vars::{
    DEPTH_VAR, ROUTES_VAR, SESSION_VAR, STDIN_VAR, TRACE_LOG_VAR,
};
use mockproc_common::{program_name, InvocationRequest};
use std::env;
use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;

/// Execution context for a shim invocation
#[derive(Debug, Clone)]
pub struct ShimContext {
    /// Name the shim was invoked as (e.g. "git")
    pub command_name: String,
    /// Full argument vector, argv[0] as the caller spelled it
    pub argv: Vec<String>,
    /// Route table to resolve against
    pub routes_path: PathBuf,
    /// Optional JSONL trace log
    pub log_file: Option<PathBuf>,
    /// Session ID for call correlation
    pub session_id: String,
    /// Nesting depth set by whoever launched this call. The shim never
    /// spawns children, so it only echoes the value into the trace.
    pub depth: u32,
    /// Whether stdin is read into the request
    pub read_stdin: bool,
}

impl ShimContext {
    /// Create context from the current process arguments and environment
    pub fn from_env() -> Result<Self> {
        Self::from_parts(env::args_os().collect(), |key| env::var(key).ok())
    }

    /// Create context from an explicit argv and variable lookup.
    pub fn from_parts<F>(args: Vec<OsString>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let argv: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let command_name = argv
            .first()
            .map(|argv0| program_name(argv0).to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("Shim invoked without argv[0]"))?;

        let routes_path = lookup(ROUTES_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("{} is not set; no route table to resolve against", ROUTES_VAR))?;

        let log_file = lookup(TRACE_LOG_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let depth = lookup(DEPTH_VAR)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);

        // Inherit the session so nested calls correlate
        let session_id = lookup(SESSION_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());

        let read_stdin = lookup(STDIN_VAR).as_deref() == Some("1");

        Ok(Self {
            command_name,
            argv,
            routes_path,
            log_file,
            session_id,
            depth,
            read_stdin,
        })
    }

    /// Snapshot the invocation as a request: argv, current directory,
    /// environment and (when enabled) stdin.
    pub fn build_request(&self) -> Result<InvocationRequest> {
        let cwd = env::current_dir().context("Failed to get current directory")?;
        let mut request = InvocationRequest::new(self.argv.iter().cloned(), cwd.to_string_lossy())
            .with_env(env::vars_os().map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            }));

        if self.read_stdin {
            let mut input = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut input)
                .context("Failed to read stdin")?;
            request = request.with_input(input);
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx(argv: &[&str], vars: &[(&str, &str)]) -> Result<ShimContext> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ShimContext::from_parts(argv.iter().map(OsString::from).collect(), |key| {
            vars.get(key).cloned()
        })
    }

    #[test]
    fn test_command_name_is_basename_of_argv0() {
        let ctx = ctx(
            &["/tmp/shims/git", "status"],
            &[(ROUTES_VAR, "/tmp/routes.yaml")],
        )
        .unwrap();
        assert_eq!(ctx.command_name, "git");
        assert_eq!(ctx.argv, vec!["/tmp/shims/git", "status"]);
        assert_eq!(ctx.routes_path, PathBuf::from("/tmp/routes.yaml"));
        assert_eq!(ctx.depth, 0);
        assert!(ctx.log_file.is_none());
        assert!(!ctx.read_stdin);
    }

    #[test]
    fn test_session_and_depth_are_inherited() {
        let ctx = ctx(
            &["git"],
            &[
                (ROUTES_VAR, "r.yaml"),
                (SESSION_VAR, "session-1"),
                (DEPTH_VAR, "2"),
                (TRACE_LOG_VAR, "/tmp/trace.jsonl"),
                (STDIN_VAR, "1"),
            ],
        )
        .unwrap();
        assert_eq!(ctx.session_id, "session-1");
        assert_eq!(ctx.depth, 2);
        assert_eq!(ctx.log_file, Some(PathBuf::from("/tmp/trace.jsonl")));
        assert!(ctx.read_stdin);
    }

    #[test]
    fn test_fresh_session_is_uuid() {
        let ctx = ctx(&["git"], &[(ROUTES_VAR, "r.yaml"), (DEPTH_VAR, "junk")]).unwrap();
        assert!(uuid::Uuid::parse_str(&ctx.session_id).is_ok());
        assert_eq!(ctx.depth, 0);
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_process_environment() {
        env::set_var(ROUTES_VAR, "/tmp/from-env.yaml");
        env::set_var(SESSION_VAR, "env-session");
        let ctx = ShimContext::from_env();
        env::remove_var(ROUTES_VAR);
        env::remove_var(SESSION_VAR);

        let ctx = ctx.unwrap();
        assert_eq!(ctx.routes_path, PathBuf::from("/tmp/from-env.yaml"));
        assert_eq!(ctx.session_id, "env-session");
        assert!(!ctx.command_name.is_empty());

        let request = ctx.build_request().unwrap();
        assert_eq!(request.argv, ctx.argv);
        assert!(request.input.is_none());
        assert!(request.env.is_some());
    }

    #[test]
    fn test_missing_route_table_is_an_error() {
        let err = ctx(&["git"], &[]).unwrap_err();
        assert!(err.to_string().contains(ROUTES_VAR));

        let err = ctx(&[], &[(ROUTES_VAR, "r.yaml")]).unwrap_err();
        assert!(err.to_string().contains("argv[0]"));
    }
}
