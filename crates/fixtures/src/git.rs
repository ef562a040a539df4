use mockproc_router::{
    Completion, DispatchResult, Dispatcher, FixtureState, ProgramMatcher, Route,
};

const DETACHED_SHA: &str = "b8a315ed93c";

const USAGE: &str = "usage: git [--version] [--help] [-C <path>] [-c <name>=<value>]\n           <command> [<args>]\n";

const NOT_A_REPOSITORY: &str = "fatal: not a git repository (or any parent up to mount point)\nStopping at filesystem boundary (GIT_DISCOVERY_ACROSS_FILESYSTEM not set).\n";

/// Checkout state that several routes read and `checkout` rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitState {
    pub branch: String,
    pub detached: bool,
}

/// A mocked git working copy rooted at `path`.
///
/// ```rust
/// use mockproc_fixtures::GitRepo;
///
/// let repo = GitRepo::new("/work/project");
/// let git = repo.dispatcher()?;
/// let out = git.run(["git", "rev-parse", "--abbrev-ref", "HEAD"], "/work/project")?;
/// assert_eq!(out.stdout_text(), "main\n");
/// # Ok::<(), mockproc_router::DispatchError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: String,
    remote: String,
    program: ProgramMatcher,
    state: FixtureState<GitState>,
}

impl Default for GitRepo {
    fn default() -> Self {
        Self::new("/.invalid-git")
    }
}

impl GitRepo {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let basename = repo_basename(&path);
        Self {
            remote: format!("git@example.com:/mock/{basename}"),
            path,
            program: ProgramMatcher::name("git"),
            state: FixtureState::new(GitState {
                branch: "main".to_string(),
                detached: false,
            }),
        }
    }

    pub fn branch(self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.state.update(|s| s.branch = branch);
        self
    }

    pub fn detached(self, detached: bool) -> Self {
        self.state.update(|s| s.detached = detached);
        self
    }

    pub fn remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Match the executable some other way than by the file name `git`.
    pub fn program(mut self, program: ProgramMatcher) -> Self {
        self.program = program;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn remote_url(&self) -> &str {
        &self.remote
    }

    /// Shared checkout state; changes are visible to every route.
    pub fn state(&self) -> FixtureState<GitState> {
        self.state.clone()
    }

    pub fn routes(&self) -> DispatchResult<Vec<Route>> {
        let git = || Route::builder(self.program.clone()).cwd(self.path.clone());

        let status_state = self.state.clone();
        let abbrev_state = self.state.clone();
        let checkout_state = self.state.clone();
        let remote = self.remote.clone();

        Ok(vec![
            git().named("status").arg("status").generate(move |_| {
                let GitState { branch, detached } = status_state.get();
                let stdout = if detached {
                    format!("HEAD detached at {DETACHED_SHA}\nnothing to commit, working tree clean\n")
                } else {
                    format!(
                        "On branch {branch}\nYour branch is up to date with 'origin/{branch}'.\n\nnothing to commit, working tree clean\n"
                    )
                };
                Ok(Completion::success(stdout))
            })?,
            git()
                .named("rev-parse --show-toplevel")
                .args(["rev-parse", "--show-toplevel"])
                .complete(Completion::success(format!("{}\n", self.path)))?,
            git()
                .named("rev-parse --abbrev-ref HEAD")
                .args(["rev-parse", "--abbrev-ref", "HEAD"])
                .generate(move |_| {
                    let head = abbrev_state.read(|s| {
                        if s.detached {
                            "HEAD".to_string()
                        } else {
                            s.branch.clone()
                        }
                    });
                    Ok(Completion::success(format!("{head}\n")))
                })?,
            git()
                .named("remote get-url")
                .args(["remote", "get-url"])
                .any()
                .generate(move |request| {
                    let name = request.arg(2).unwrap_or_default();
                    if name == "origin" {
                        Ok(Completion::success(format!("{remote}\n")))
                    } else {
                        Ok(Completion::failure(
                            128,
                            format!("fatal: No such remote '{name}'\n"),
                        ))
                    }
                })?,
            git()
                .named("checkout")
                .arg("checkout")
                .pattern("[^-].*")
                .exact_arity()
                .generate(move |request| {
                    let target = request.arg(1).unwrap_or_default().to_string();
                    checkout_state.update(|s| {
                        s.branch = target.clone();
                        s.detached = false;
                    });
                    Ok(Completion::new(0)
                        .with_stderr(format!("Switched to branch '{target}'\n")))
                })?,
            git()
                .named("usage")
                .complete(Completion::failure(1, USAGE))?,
            Route::builder(self.program.clone())
                .named("not a repository")
                .complete(Completion::failure(128, NOT_A_REPOSITORY))?,
        ])
    }

    pub fn dispatcher(&self) -> DispatchResult<Dispatcher> {
        Ok(Dispatcher::with_routes(self.routes()?))
    }
}

fn repo_basename(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
