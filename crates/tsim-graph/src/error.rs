use thiserror::Error;

use tsim_core::NodeId;

/// Errors from graph lookups and routing.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },

    #[error("unknown node {0:?}")]
    UnknownNode(String),

    #[error("no edge from {from} to {to}")]
    UnknownEdge { from: NodeId, to: NodeId },
}
