//! Bridges an OT simulation message bus (ZeroMQ publish/subscribe) with a
//! flow-execution engine's node graph.
//!
//! Two independent adapters, sharing no state:
//! - [`inbound::InboundNode`] subscribes to the bus broadcast, filters tagged
//!   measurement/update records and emits matching values to the graph.
//! - [`outbound::OutboundNode`] takes values from the graph and pushes them
//!   back onto the bus as control updates.
//!
//! [`envelope`] is the wire codec, [`tags`] the record filter, [`bus`] the
//! socket plumbing. The node contract itself lives in the `flow_node` crate.

pub mod bus;
pub mod envelope;
pub mod inbound;
pub mod logger;
pub mod outbound;
pub mod settings;
pub mod tags;
