use std::path::PathBuf;

use crate::NodeId;

/// Errors raised while building or relaxing routing tables
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("malformed hop `{token}`: {reason}")]
    MalformedHop { token: String, reason: String },

    #[error("invalid cost {cost} for hop via {next_hop}")]
    InvalidCost { next_hop: NodeId, cost: f64 },

    #[error("routing table of {owner} has no entry for {destination}")]
    UnknownDestination { owner: NodeId, destination: NodeId },
}

/// Errors that stop a simulation run
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("link file line {line}: {source}")]
    LinkFile {
        line: usize,
        #[source]
        source: RoutingError,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("inbox of node {0} is closed")]
    InboxClosed(NodeId),

    #[error("network did not converge within {0} rounds")]
    NotConverged(usize),

    #[error("link data defines no nodes")]
    EmptyNetwork,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("node worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to start worker pool: {0}")]
    Runtime(#[source] std::io::Error),
}
