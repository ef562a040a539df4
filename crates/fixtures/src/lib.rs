//! Ready-made route sets for mocking common command-line tools.
//!
//! Each fixture follows the same three-tier layout: specific subcommand
//! routes first, then a bare-invocation route scoped to the fixture's
//! directory (usage error), then an unscoped fallback (environment error).

mod git;

pub use git::{GitRepo, GitState};
