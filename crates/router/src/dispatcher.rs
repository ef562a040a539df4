//! Ordered route resolution and invocation history.

use crate::error::{DispatchError, DispatchResult};
use crate::route::Route;
use mockproc_common::{Completion, InvocationRequest};
use mockproc_trace::{EntryOutcome, History, HistoryEntry, TraceSink};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-test registry that resolves requests against routes in registration
/// order.
///
/// Routes are registered through `&mut self` before the dispatcher is shared;
/// [`Dispatcher::invoke`] only needs `&self`, so an `Arc<Dispatcher>` can be
/// handed to concurrent workers. Only the history is mutated per call.
#[derive(Default)]
pub struct Dispatcher {
    routes: Vec<Route>,
    parent: Option<Arc<Dispatcher>>,
    history: History,
    trace: Option<TraceSink>,
}

/// Where a request resolved: which dispatcher layer and which route in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch {
    /// 0 for this dispatcher, 1 for its parent, and so on.
    pub depth: usize,
    pub index: usize,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routes<I>(routes: I) -> Self
    where
        I: IntoIterator<Item = Route>,
    {
        Self {
            routes: routes.into_iter().collect(),
            ..Default::default()
        }
    }

    /// A nested scope: own routes are tried first, then `parent`'s.
    ///
    /// Calls are recorded only in the history of the dispatcher that
    /// received them.
    pub fn layered(parent: Arc<Dispatcher>) -> Self {
        Self {
            parent: Some(parent),
            ..Default::default()
        }
    }

    /// Mirror every finished history entry to `sink`.
    pub fn with_trace(mut self, sink: TraceSink) -> Self {
        self.trace = Some(sink);
        self
    }

    /// Append `route` after every route registered so far.
    pub fn register(&mut self, route: Route) -> &mut Self {
        self.routes.push(route);
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First matching route, searching this layer then its parents.
    ///
    /// Does not record history or run generators.
    pub fn route_for(&self, request: &InvocationRequest) -> Option<RouteMatch> {
        let mut layer = Some(self);
        let mut depth = 0;
        while let Some(dispatcher) = layer {
            if let Some(index) = dispatcher.routes.iter().position(|r| r.matches(request)) {
                return Some(RouteMatch { depth, index });
            }
            layer = dispatcher.parent.as_deref();
            depth += 1;
        }
        None
    }

    /// Resolve `request` to a completion.
    ///
    /// The request is appended to the history before resolution, so it is
    /// recorded even when no route matches or the generator fails.
    pub fn invoke(&self, request: &InvocationRequest) -> DispatchResult<Completion> {
        let seq = self.history.begin(request);

        let result = match self.find(request) {
            Some(route) => {
                debug!(route = %route.label(), "Resolved {}", request);
                route.resolve(request).map(|completion| (route, completion))
            }
            None => {
                warn!("No route matched {}", request);
                Err(DispatchError::NoRouteMatched {
                    request: request.clone(),
                })
            }
        };

        let outcome = match &result {
            Ok((route, completion)) => EntryOutcome::Resolved {
                route: route.label(),
                exit_code: completion.exit_code,
            },
            Err(DispatchError::GeneratorFailure { route, message, .. }) => {
                warn!(route = %route, "Generator failed: {}", message);
                EntryOutcome::GeneratorFailed {
                    route: route.clone(),
                    message: message.clone(),
                }
            }
            Err(_) => EntryOutcome::NoRoute,
        };

        if let Some(entry) = self.history.finish(seq, outcome) {
            self.mirror(&entry);
        }

        result.map(|(_, completion)| completion)
    }

    /// Convenience wrapper building the request from parts.
    pub fn run<I, S>(&self, argv: I, cwd: &str) -> DispatchResult<Completion>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invoke(&InvocationRequest::new(argv, cwd))
    }

    /// Recorded requests in call order.
    pub fn history(&self) -> Vec<InvocationRequest> {
        self.history.requests()
    }

    /// Recorded requests with sequence numbers, timestamps and outcomes.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    /// Number of recorded calls whose argv equals `argv` exactly.
    pub fn invocation_count<S: AsRef<str>>(&self, argv: &[S]) -> usize {
        self.history.count_where(|entry| {
            entry.request.argv.len() == argv.len()
                && entry
                    .request
                    .argv
                    .iter()
                    .zip(argv)
                    .all(|(a, b)| a == b.as_ref())
        })
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    fn find(&self, request: &InvocationRequest) -> Option<&Route> {
        let RouteMatch { depth, index } = self.route_for(request)?;
        let mut layer = self;
        for _ in 0..depth {
            layer = layer.parent.as_deref()?;
        }
        layer.routes.get(index)
    }

    fn mirror(&self, entry: &HistoryEntry) {
        if let Some(sink) = &self.trace {
            if let Err(e) = sink.record(entry) {
                warn!("Failed to write trace record: {:#}", e);
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("layered", &self.parent.is_some())
            .field("history", &self.history.len())
            .finish()
    }
}

impl FromIterator<Route> for Dispatcher {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        Self::with_routes(iter)
    }
}
