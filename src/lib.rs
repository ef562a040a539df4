//! Route-based subprocess mocking.
//!
//! Register [`Route`]s on a [`Dispatcher`], hand it to code that shells out
//! through a [`CommandRunner`], then assert on the recorded history.
//!
//! ```rust
//! use mockproc::{Completion, Dispatcher, Route};
//!
//! let mut git = Dispatcher::new();
//! git.register(
//!     Route::builder("git")
//!         .args(["rev-parse", "--show-toplevel"])
//!         .cwd("/work/repo")
//!         .complete(Completion::success("/work/repo\n"))?,
//! );
//!
//! let out = git.run(["git", "rev-parse", "--show-toplevel"], "/work/repo")?;
//! assert_eq!(out.stdout_text(), "/work/repo\n");
//! assert!(git.run(["git", "log"], "/work/repo").unwrap_err().is_no_route());
//! assert_eq!(git.history().len(), 2);
//! # Ok::<(), mockproc::DispatchError>(())
//! ```
//!
//! Ready-made route sets live in [`fixtures`]; the JSONL trace sink and raw
//! history types in [`trace`].

pub use mockproc_router::*;

pub use mockproc_common as common;
pub use mockproc_fixtures as fixtures;
pub use mockproc_trace as trace;
