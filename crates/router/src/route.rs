//! Routes: an immutable matcher paired with an outcome.

use crate::error::{DispatchError, DispatchResult};
use crate::matcher::{ArgMatcher, Arity, ProgramMatcher};
use mockproc_common::{Completion, InvocationRequest};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Computes a completion from the request that matched.
pub type Generator =
    Arc<dyn Fn(&InvocationRequest) -> anyhow::Result<Completion> + Send + Sync + 'static>;

/// What a matching route produces.
#[derive(Clone)]
pub enum Outcome {
    Fixed(Completion),
    Generator(Generator),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(completion) => f.debug_tuple("Fixed").field(completion).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// A registered invocation shape and the outcome it simulates.
///
/// All constraints are conjunctive. Constraints left unset accept anything:
/// no `cwd` means any directory, no `env` entries means any environment.
#[derive(Debug, Clone)]
pub struct Route {
    name: Option<String>,
    program: ProgramMatcher,
    args: Vec<ArgMatcher>,
    arity: Arity,
    cwd: Option<String>,
    env: BTreeMap<String, String>,
    input: Option<Vec<u8>>,
    outcome: Outcome,
}

impl Route {
    pub fn builder(program: impl Into<ProgramMatcher>) -> RouteBuilder {
        RouteBuilder::new(program.into())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn program(&self) -> &ProgramMatcher {
        &self.program
    }

    pub fn args(&self) -> &[ArgMatcher] {
        &self.args
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Name used in diagnostics and history when the route has none.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let mut parts = vec![self.program.label()];
        parts.extend(self.args.iter().map(|m| match m {
            ArgMatcher::Exact(token) => token.clone(),
            ArgMatcher::Pattern(pattern) => format!("/{}/", pattern.as_str()),
            ArgMatcher::Any => "*".to_string(),
        }));
        if self.arity == Arity::Prefix {
            parts.push("...".to_string());
        }
        parts.join(" ")
    }

    /// Program, then positional arguments, then arity, then cwd, env and input.
    pub fn matches(&self, request: &InvocationRequest) -> bool {
        if !self.program.matches(request.program()) {
            return false;
        }

        let args = request.args();
        let arity_ok = match self.arity {
            Arity::Prefix => args.len() >= self.args.len(),
            Arity::Exact => args.len() == self.args.len(),
        };
        if !arity_ok {
            return false;
        }
        if !self
            .args
            .iter()
            .zip(args)
            .all(|(matcher, token)| matcher.matches(token))
        {
            return false;
        }

        if let Some(cwd) = &self.cwd {
            if cwd != &request.cwd {
                return false;
            }
        }

        if self
            .env
            .iter()
            .any(|(key, value)| request.env_var(key) != Some(value.as_str()))
        {
            return false;
        }

        match &self.input {
            Some(expected) => request.input.as_deref() == Some(expected.as_slice()),
            None => true,
        }
    }

    /// Tokens absorbed by pattern and wildcard positions, in order.
    ///
    /// Returns `None` when the route does not match `request`.
    pub fn captures<'r>(&self, request: &'r InvocationRequest) -> Option<Vec<&'r str>> {
        if !self.matches(request) {
            return None;
        }
        Some(
            self.args
                .iter()
                .zip(request.args())
                .filter(|(matcher, _)| matcher.captures())
                .map(|(_, token)| token.as_str())
                .collect(),
        )
    }

    /// Produce this route's completion for `request`.
    ///
    /// The caller is expected to have checked [`Route::matches`]. Generator
    /// errors and panics come back as [`DispatchError::GeneratorFailure`].
    pub fn resolve(&self, request: &InvocationRequest) -> DispatchResult<Completion> {
        match &self.outcome {
            Outcome::Fixed(completion) => Ok(completion.clone()),
            Outcome::Generator(generator) => {
                let failure = |message: String| DispatchError::GeneratorFailure {
                    route: self.label(),
                    request: request.clone(),
                    message,
                };
                match catch_unwind(AssertUnwindSafe(|| generator(request))) {
                    Ok(Ok(completion)) => Ok(completion),
                    Ok(Err(err)) => Err(failure(format!("{err:#}"))),
                    Err(panic) => Err(failure(panic_message(panic.as_ref()))),
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("generator panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("generator panicked: {msg}")
    } else {
        "generator panicked".to_string()
    }
}

/// Incremental construction of a [`Route`].
///
/// Pattern errors are held until the route is finished with
/// [`RouteBuilder::complete`] or [`RouteBuilder::generate`].
#[derive(Debug)]
pub struct RouteBuilder {
    name: Option<String>,
    program: ProgramMatcher,
    args: Vec<ArgMatcher>,
    arity: Arity,
    cwd: Option<String>,
    env: BTreeMap<String, String>,
    input: Option<Vec<u8>>,
    error: Option<DispatchError>,
}

impl RouteBuilder {
    fn new(program: ProgramMatcher) -> Self {
        Self {
            name: None,
            program,
            args: Vec::new(),
            arity: Arity::Prefix,
            cwd: None,
            env: BTreeMap::new(),
            input: None,
            error: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Exact argument at the next position.
    pub fn arg(mut self, token: impl Into<String>) -> Self {
        self.args.push(ArgMatcher::Exact(token.into()));
        self
    }

    /// Exact arguments at the next positions.
    pub fn args<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(tokens.into_iter().map(|t| ArgMatcher::Exact(t.into())));
        self
    }

    /// Whole-token regular expression at the next position.
    pub fn pattern(mut self, pattern: &str) -> Self {
        match ArgMatcher::pattern(pattern) {
            Ok(matcher) => self.args.push(matcher),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Wildcard at the next position.
    pub fn any(mut self) -> Self {
        self.args.push(ArgMatcher::Any);
        self
    }

    pub fn matcher(mut self, matcher: ArgMatcher) -> Self {
        self.args.push(matcher);
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    /// Require the argument count to equal the number of matchers.
    pub fn exact_arity(self) -> Self {
        self.arity(Arity::Exact)
    }

    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn complete(self, completion: Completion) -> DispatchResult<Route> {
        self.finish(Outcome::Fixed(completion))
    }

    pub fn generate<F>(self, generator: F) -> DispatchResult<Route>
    where
        F: Fn(&InvocationRequest) -> anyhow::Result<Completion> + Send + Sync + 'static,
    {
        self.finish(Outcome::Generator(Arc::new(generator)))
    }

    pub fn outcome(self, outcome: Outcome) -> DispatchResult<Route> {
        self.finish(outcome)
    }

    fn finish(self, outcome: Outcome) -> DispatchResult<Route> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(Route {
            name: self.name,
            program: self.program,
            args: self.args,
            arity: self.arity,
            cwd: self.cwd,
            env: self.env,
            input: self.input,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn req(argv: &[&str], cwd: &str) -> InvocationRequest {
        InvocationRequest::new(argv.iter().copied(), cwd)
    }

    #[test]
    fn test_prefix_arity_leaves_trailing_tokens_free() {
        let route = Route::builder("git")
            .arg("log")
            .complete(Completion::success(""))
            .unwrap();
        assert!(route.matches(&req(&["git", "log"], "/")));
        assert!(route.matches(&req(&["git", "log", "--oneline", "-5"], "/")));
        assert!(!route.matches(&req(&["git"], "/")));
        assert!(!route.matches(&req(&["git", "status"], "/")));
    }

    #[test]
    fn test_exact_arity_rejects_extra_tokens() {
        let route = Route::builder("git")
            .args(["rev-parse", "--show-toplevel"])
            .exact_arity()
            .complete(Completion::success("/repo\n"))
            .unwrap();
        assert!(route.matches(&req(&["git", "rev-parse", "--show-toplevel"], "/")));
        assert!(!route.matches(&req(&["git", "rev-parse", "--show-toplevel", "x"], "/")));
        assert!(!route.matches(&req(&["git", "rev-parse"], "/")));
    }

    #[test]
    fn test_bare_program_route_with_exact_arity() {
        let route = Route::builder("git")
            .exact_arity()
            .complete(Completion::failure(1, "usage: git\n"))
            .unwrap();
        assert!(route.matches(&req(&["git"], "/")));
        assert!(!route.matches(&req(&["git", "status"], "/")));
    }

    #[test]
    fn test_cwd_env_and_input_constraints() {
        let route = Route::builder("tool")
            .cwd("/repo")
            .env("LANG", "C")
            .input("yes\n")
            .complete(Completion::success("ok"))
            .unwrap();

        let matching = req(&["tool"], "/repo")
            .with_env([("LANG", "C"), ("HOME", "/root")])
            .with_input("yes\n");
        assert!(route.matches(&matching));

        assert!(!route.matches(&InvocationRequest {
            cwd: "/other".into(),
            ..matching.clone()
        }));
        assert!(!route.matches(&InvocationRequest {
            env: None,
            ..matching.clone()
        }));
        assert!(!route.matches(&InvocationRequest {
            input: Some(b"no\n".to_vec()),
            ..matching
        }));
    }

    #[test]
    fn test_captures_skip_exact_positions() {
        let route = Route::builder("git")
            .args(["remote", "get-url"])
            .any()
            .complete(Completion::default())
            .unwrap();
        let request = req(&["git", "remote", "get-url", "upstream", "--push"], "/");
        assert_eq!(route.captures(&request), Some(vec!["upstream"]));
        assert_eq!(route.captures(&req(&["git", "status"], "/")), None);
    }

    #[test]
    fn test_generator_error_becomes_generator_failure() {
        let route = Route::builder("git")
            .named("broken")
            .generate(|_| bail!("fixture misconfigured"))
            .unwrap();
        let err = route.resolve(&req(&["git"], "/")).unwrap_err();
        match err {
            DispatchError::GeneratorFailure {
                route,
                request,
                message,
            } => {
                assert_eq!(route, "broken");
                assert_eq!(request.argv, vec!["git"]);
                assert!(message.contains("fixture misconfigured"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_generator_panic_becomes_generator_failure() {
        let route = Route::builder("git")
            .generate(|req| {
                let name = req.arg(5).expect("sixth argument");
                Ok(Completion::success(name))
            })
            .unwrap();
        let err = route.resolve(&req(&["git"], "/")).unwrap_err();
        assert!(
            matches!(err, DispatchError::GeneratorFailure { ref message, .. } if message.contains("sixth argument")),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_builder_defers_pattern_errors() {
        let err = Route::builder("git")
            .pattern("[")
            .arg("status")
            .complete(Completion::default())
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidPattern { .. }));
    }

    #[test]
    fn test_labels() {
        let route = Route::builder("git")
            .arg("remote")
            .pattern("get-.*")
            .any()
            .complete(Completion::default())
            .unwrap();
        assert_eq!(route.label(), "git remote /get-.*/ * ...");

        let route = Route::builder(ProgramMatcher::Any)
            .exact_arity()
            .complete(Completion::default())
            .unwrap();
        assert_eq!(route.label(), "*");
    }
}
