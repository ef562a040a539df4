//! Invocation history and trace output for mockproc.
//!
//! [`History`] is the in-memory, call-ordered log a dispatcher keeps for test
//! assertions. [`TraceSink`] optionally mirrors each finished entry to a JSONL
//! file so calls made from separate processes (see `mockproc-shim`) can be
//! inspected after the fact.

mod history;
mod output;

pub use history::{EntryOutcome, History, HistoryEntry};
pub use output::{entry_to_json, read_trace, TraceSink};

#[cfg(test)]
mod tests;
