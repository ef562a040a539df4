use mockproc_common::InvocationRequest;

/// Engine-level failures.
///
/// A simulated command that exits non-zero is *not* an error; it comes back
/// as an ordinary [`Completion`](mockproc_common::Completion).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no route matched {request}")]
    NoRouteMatched { request: InvocationRequest },

    #[error("route '{route}' failed to generate a completion for {request}: {message}")]
    GeneratorFailure {
        route: String,
        request: InvocationRequest,
        message: String,
    },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl DispatchError {
    /// The request that failed to resolve, if this error carries one.
    pub fn request(&self) -> Option<&InvocationRequest> {
        match self {
            Self::NoRouteMatched { request } | Self::GeneratorFailure { request, .. } => {
                Some(request)
            }
            Self::InvalidPattern { .. } => None,
        }
    }

    pub fn is_no_route(&self) -> bool {
        matches!(self, Self::NoRouteMatched { .. })
    }
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
