//! Declarative route tables loaded from YAML.
//!
//! Tables describe fixed-outcome routes only; generators have to be
//! registered from code. Routes keep the order in which they appear.
//!
//! ```yaml
//! routes:
//!   - name: status
//!     program_name: git
//!     args: [status]
//!     cwd: /repo
//!     completion: { exit_code: 0, stdout: "nothing to commit\n" }
//!   - program_name: git
//!     args: [remote, get-url, { pattern: "origin|upstream" }]
//!     completion: { stdout: "git@example.com:repo.git\n" }
//!   - program_name: git
//!     completion: { exit_code: 128, stderr: "fatal: not a git repository\n" }
//! ```

use crate::dispatcher::Dispatcher;
use crate::matcher::{ArgMatcher, Arity, ProgramMatcher};
use crate::route::Route;
use anyhow::{anyhow, bail, Context, Result};
use mockproc_common::Completion;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTable {
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    #[serde(default)]
    pub name: Option<String>,
    /// Whole executable token.
    #[serde(default)]
    pub program: Option<String>,
    /// File-name component of the executable token.
    #[serde(default)]
    pub program_name: Option<String>,
    #[serde(default)]
    pub program_pattern: Option<String>,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    #[serde(default)]
    pub arity: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub stdin: Option<String>,
    #[serde(default)]
    pub completion: CompletionSpec,
}

/// One positional argument in a table: a plain scalar, `{pattern: ..}` or
/// `{any: true}`.
///
/// Unquoted YAML numbers and booleans (`args: [log, -n, 5]`) are exact tokens
/// spelled the way they appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSpec {
    Exact(String),
    Pattern { pattern: String },
    Wildcard { any: bool },
}

impl<'de> Deserialize<'de> for ArgSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        ArgSpec::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl ArgSpec {
    fn from_value(value: serde_yaml::Value) -> Result<Self> {
        use serde_yaml::Value;

        match value {
            Value::String(token) => Ok(Self::Exact(token)),
            Value::Number(number) => Ok(Self::Exact(number.to_string())),
            Value::Bool(flag) => Ok(Self::Exact(flag.to_string())),
            Value::Mapping(map) => {
                let mut pattern = None;
                let mut any = None;
                for (key, value) in map {
                    match (key.as_str(), value) {
                        (Some("pattern"), Value::String(p)) => pattern = Some(p),
                        (Some("any"), Value::Bool(b)) => any = Some(b),
                        (Some(key @ ("pattern" | "any")), other) => {
                            bail!("invalid value for argument key `{}`: {:?}", key, other)
                        }
                        (Some(key), _) => {
                            bail!("unknown argument key `{}` (expected pattern or any)", key)
                        }
                        (None, _) => bail!("argument keys must be strings"),
                    }
                }
                match (pattern, any) {
                    (Some(pattern), None) => Ok(Self::Pattern { pattern }),
                    (None, Some(any)) => Ok(Self::Wildcard { any }),
                    (Some(_), Some(_)) => bail!("an argument takes either `pattern` or `any`, not both"),
                    (None, None) => bail!("empty argument matcher"),
                }
            }
            other => bail!("unsupported argument {:?}", other),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionSpec {
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl From<CompletionSpec> for Completion {
    fn from(spec: CompletionSpec) -> Self {
        Completion::new(spec.exit_code)
            .with_stdout(spec.stdout)
            .with_stderr(spec.stderr)
            .with_elapsed(Duration::from_millis(spec.elapsed_ms))
    }
}

impl RouteTable {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|err| anyhow!("Failed to parse route table: {}", err))
    }

    /// Compile every spec, failing on the first invalid one.
    pub fn into_routes(self) -> Result<Vec<Route>> {
        self.routes
            .into_iter()
            .enumerate()
            .map(|(idx, spec)| {
                let label = spec.name.clone().unwrap_or_else(|| format!("#{idx}"));
                spec.into_route()
                    .with_context(|| format!("Invalid route {}", label))
            })
            .collect()
    }

    pub fn into_dispatcher(self) -> Result<Dispatcher> {
        Ok(Dispatcher::with_routes(self.into_routes()?))
    }
}

impl RouteSpec {
    fn program_matcher(&self) -> Result<ProgramMatcher> {
        match (&self.program, &self.program_name, &self.program_pattern) {
            (None, None, None) => Ok(ProgramMatcher::Any),
            (Some(program), None, None) => Ok(ProgramMatcher::exact(program.clone())),
            (None, Some(name), None) => Ok(ProgramMatcher::name(name.clone())),
            (None, None, Some(pattern)) => Ok(ProgramMatcher::pattern(pattern)?),
            _ => bail!("at most one of program, program_name and program_pattern may be set"),
        }
    }

    pub fn into_route(self) -> Result<Route> {
        let mut builder = Route::builder(self.program_matcher()?);

        if let Some(name) = self.name {
            builder = builder.named(name);
        }

        for arg in self.args {
            let matcher = match arg {
                ArgSpec::Exact(token) => ArgMatcher::Exact(token),
                ArgSpec::Pattern { pattern } => ArgMatcher::pattern(&pattern)?,
                ArgSpec::Wildcard { any: true } => ArgMatcher::Any,
                ArgSpec::Wildcard { any: false } => bail!("`any: false` is not a matcher"),
            };
            builder = builder.matcher(matcher);
        }

        if let Some(raw) = self.arity {
            let arity = Arity::parse_insensitive(&raw)
                .ok_or_else(|| anyhow!("invalid arity: {} (expected prefix or exact)", raw))?;
            builder = builder.arity(arity);
        }

        if let Some(cwd) = self.cwd {
            builder = builder.cwd(cwd);
        }
        for (key, value) in self.env {
            builder = builder.env(key, value);
        }
        if let Some(stdin) = self.stdin {
            builder = builder.input(stdin);
        }

        Ok(builder.complete(self.completion.into())?)
    }
}

/// Read and compile a route table file.
pub fn load_route_table(path: &Path) -> Result<Vec<Route>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read route table from {:?}", path))?;

    let routes = RouteTable::from_yaml_str(&content)
        .and_then(RouteTable::into_routes)
        .with_context(|| format!("Failed to load route table from {:?}", path))?;

    info!("Loaded {} routes from {:?}", routes.len(), path);
    Ok(routes)
}
