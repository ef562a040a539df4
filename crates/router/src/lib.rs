//! Route-based subprocess mocking.
//!
//! Tests register [`Route`]s describing the command invocations they expect
//! (program, positional argument matchers, working directory) and the
//! [`Completion`] each should produce. Code under test shells out through a
//! [`CommandRunner`]; the [`Dispatcher`] resolves each request to the first
//! matching route in registration order and records it for later assertions.
//!
//! ## Ordering
//!
//! Routes are never reordered. Register them from most to least specific:
//!
//! 1. specific subcommand + argument combinations,
//! 2. a bare-invocation route for the program in the recognised directory
//!    (usage error),
//! 3. a route with no `cwd` constraint (environment error such as "not a
//!    repository").
//!
//! A request that matches nothing fails with
//! [`DispatchError::NoRouteMatched`] instead of defaulting to a zero-valued
//! completion.
//!
//! ```rust
//! use mockproc_router::{Completion, Dispatcher, Route};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .register(Route::builder("git").arg("status").cwd("/repo").complete(Completion::success("clean\n"))?)
//!     .register(Route::builder("git").complete(Completion::failure(128, "fatal: not a git repository\n"))?);
//!
//! assert_eq!(dispatcher.run(["git", "status"], "/repo")?.exit_code, 0);
//! assert_eq!(dispatcher.run(["git", "status"], "/other")?.exit_code, 128);
//! assert_eq!(dispatcher.history().len(), 2);
//! # Ok::<(), mockproc_router::DispatchError>(())
//! ```

mod dispatcher;
mod error;
mod fixture;
mod matcher;
mod route;
mod runner;
mod table;

pub use dispatcher::{Dispatcher, RouteMatch};
pub use error::{DispatchError, DispatchResult};
pub use fixture::FixtureState;
pub use matcher::{ArgMatcher, Arity, ProgramMatcher, TokenPattern};
pub use route::{Generator, Outcome, Route, RouteBuilder};
pub use runner::CommandRunner;
pub use table::{load_route_table, ArgSpec, CompletionSpec, RouteSpec, RouteTable};

pub use mockproc_common::{Completion, InvocationRequest};
pub use mockproc_trace::{EntryOutcome, HistoryEntry, TraceSink};
