/// Route resolution failures.
///
/// All of these are user-visible but non-fatal: the map keeps working, it
/// just draws no route overlay. Failures are recovered into the published
/// `RouteState` and never propagate as panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// The provider answered with a non-success status code.
    Provider { status: String, info: String },
    /// The provider answered successfully but returned no usable path.
    EmptyRoute,
    /// The transport itself failed: network error, non-2xx, unreadable body.
    Transport(String),
    /// The response body did not match the expected shape.
    Malformed(String),
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::Provider { status, info } => {
                write!(f, "routing provider rejected request: status={status} info={info}")
            }
            RoutingError::EmptyRoute => write!(f, "routing provider returned no path"),
            RoutingError::Transport(msg) => write!(f, "routing transport failed: {msg}"),
            RoutingError::Malformed(msg) => write!(f, "malformed routing response: {msg}"),
        }
    }
}

impl std::error::Error for RoutingError {}
