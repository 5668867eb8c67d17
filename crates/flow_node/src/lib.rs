//! The contract between the hosting flow-execution engine and adapter nodes.
//!
//! A node is anything implementing [`node::FlowNode`]: it is constructed from
//! immutable configuration, started once, and stopped once. Nodes that produce
//! values for the graph hand them over as [`message::FlowMessage`]s; nodes that
//! consume values receive raw JSON payloads. Status reporting goes through the
//! [`node::StatusSink`] seam so hosts can surface it however they like.

pub mod message;
pub mod node;
