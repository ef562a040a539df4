//! Seam between code that shells out and the dispatcher.
//!
//! Code under test takes a `&dyn CommandRunner` (or `Arc<dyn CommandRunner>`)
//! wherever it would otherwise spawn a process; tests hand it a
//! [`Dispatcher`].

use crate::dispatcher::Dispatcher;
use crate::error::DispatchResult;
use mockproc_common::{Completion, InvocationRequest};
use std::sync::Arc;

pub trait CommandRunner: Send + Sync {
    fn run(&self, request: &InvocationRequest) -> DispatchResult<Completion>;
}

impl CommandRunner for Dispatcher {
    fn run(&self, request: &InvocationRequest) -> DispatchResult<Completion> {
        self.invoke(request)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Arc<R> {
    fn run(&self, request: &InvocationRequest) -> DispatchResult<Completion> {
        (**self).run(request)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, request: &InvocationRequest) -> DispatchResult<Completion> {
        (**self).run(request)
    }
}
