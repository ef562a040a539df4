//! Main shim execution logic
//!
//! Loads the route table, resolves the current invocation against it, replays
//! the completion on stdout/stderr and mirrors the call to the trace log.

use anyhow::{Context, Result};
use mockproc_common::{Completion, InvocationRequest};
use mockproc_router::{DispatchError, Dispatcher, RouteTable};
use mockproc_trace::TraceSink;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

use crate::context::ShimContext;

/// Exit status when no route matches, the same as "command not found"
pub const NO_ROUTE_EXIT: i32 = 127;

/// Main shim execution function
pub fn run_shim() -> Result<i32> {
    let ctx = ShimContext::from_env()?;
    let request = ctx.build_request()?;
    run_request(&ctx, &request)
}

/// Resolve `request` against the context's route table and replay the
/// outcome on this process's stdout and stderr.
pub fn run_request(ctx: &ShimContext, request: &InvocationRequest) -> Result<i32> {
    let (dispatcher, table_digest) = load_dispatcher(&ctx.routes_path)?;
    debug!(
        command = %ctx.command_name,
        routes = dispatcher.routes().len(),
        "Resolving {}",
        request
    );

    let result = dispatcher.invoke(request);
    trace_calls(ctx, &dispatcher, &table_digest);

    match result {
        Ok(completion) => {
            replay(&completion)?;
            Ok(completion.exit_code)
        }
        Err(err @ DispatchError::NoRouteMatched { .. }) => {
            eprintln!("mockproc: {err}");
            Ok(NO_ROUTE_EXIT)
        }
        Err(err) => Err(err.into()),
    }
}

/// Compile the route table at `path` and return it with its sha256 digest.
pub fn load_dispatcher(path: &Path) -> Result<(Dispatcher, String)> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read route table from {:?}", path))?;
    let digest = format!("sha256:{:x}", Sha256::digest(content.as_bytes()));

    let dispatcher = RouteTable::from_yaml_str(&content)
        .and_then(RouteTable::into_dispatcher)
        .with_context(|| format!("Failed to load route table from {:?}", path))?;

    Ok((dispatcher, digest))
}

fn replay(completion: &Completion) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&completion.stdout)
        .and_then(|_| stdout.flush())
        .context("Failed to write stdout")?;

    let mut stderr = std::io::stderr().lock();
    stderr
        .write_all(&completion.stderr)
        .and_then(|_| stderr.flush())
        .context("Failed to write stderr")?;
    Ok(())
}

fn trace_calls(ctx: &ShimContext, dispatcher: &Dispatcher, table_digest: &str) {
    let Some(log_path) = &ctx.log_file else {
        return;
    };

    let extra = json!({
        "command": ctx.command_name,
        "depth": ctx.depth,
        "route_table_sha256": table_digest,
    });

    let written = TraceSink::open(log_path, ctx.session_id.clone()).and_then(|sink| {
        let sink = sink.with_component("shim");
        dispatcher
            .entries()
            .iter()
            .try_for_each(|entry| sink.record_with(entry, Some(&extra)))
    });

    // A broken trace log never changes what the caller sees
    if let Err(e) = written {
        warn!("Failed to log invocation to {:?}: {:#}", log_path, e);
    }
}
