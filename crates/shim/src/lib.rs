//! mockproc command shim
//!
//! A single binary that stands in for any external command during tests.
//!
//! ## Architecture
//!
//! The shim works by:
//! 1. Being copied to the name of the command it replaces (git, svn, ...)
//! 2. Loading the YAML route table named by `MOCKPROC_ROUTES`
//! 3. Resolving its own argv, working directory and environment against it
//! 4. Replaying the matched completion and appending the call to the
//!    `MOCKPROC_TRACE_LOG` JSONL log
//!
//! An invocation that matches no route exits with 127 after printing a
//! diagnostic on stderr.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mockproc_shim::run_shim;
//!
//! fn main() -> anyhow::Result<()> {
//!     let exit_code = run_shim()?;
//!     std::process::exit(exit_code);
//! }
//! ```

pub use context::ShimContext;
pub use exec::{load_dispatcher, run_request, run_shim, NO_ROUTE_EXIT};

mod context;
mod exec;
pub mod logging;
