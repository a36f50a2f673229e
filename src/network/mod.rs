//! Packet network of VMs running the same program.
//!
//! Every node is a clone of one program, primed with its own address, and
//! exchanges `(x, y)` packets with the others through per-node FIFO queues.
//! A single loop services the nodes in address order; nothing runs in
//! parallel.
//!
//! - [`packet`]: packet type and reserved addresses
//! - [`node`]: one VM plus its queue and the per-node step policy
//! - [`switch`]: the scheduling loop, routing and the idle monitor
//! - [`errors`]: failures that end a run

pub mod errors;
pub mod node;
pub mod packet;
pub mod switch;
