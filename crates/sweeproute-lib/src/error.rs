use thiserror::Error;

/// Convenient result alias for the sweeproute library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The street graph (or its pruned form) is not a single connected
    /// component; no coverage route exists.
    #[error("street graph is not connected ({components} components)")]
    NotConnected { components: usize },

    /// Dead-end pruning removed every node; there is nothing to route.
    #[error("pruning removed the entire street network; nothing left to route")]
    DegenerateGraph,

    /// A solver produced an empty walk on a non-empty graph.
    #[error("route solver produced an empty walk")]
    EmptyRoute,

    /// Internal invariant violated: the odd-degree node set must have even
    /// cardinality in any finite graph (handshake lemma).
    #[error("odd-degree node set has odd cardinality ({count}); graph state is corrupt")]
    OddParity { count: usize },

    /// Internal invariant violated inside a solver.
    #[error("solver invariant violated: {message}")]
    SolverInvariant { message: String },

    /// The street-graph source returned no usable segments for the request.
    #[error("street source returned an empty network for the requested area")]
    EmptyNetwork,

    /// The street-graph source rejected the request parameters.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// A graph fixture document failed validation.
    #[error("invalid graph document: {message}")]
    InvalidGraphDocument { message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON parsing errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for CSV writing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Wrapper for ZIP archive errors (KMZ packaging).
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}
