//! Packets exchanged between network nodes.

use std::fmt;

/// Destination address of the monitor register.
pub const MONITOR_ADDRESS: i64 = 255;

/// Input value meaning "no packet waiting".
pub const NO_PACKET: i64 = -1;

/// An `(x, y)` pair routed between nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Packet {
    pub x: i64,
    pub y: i64,
}

impl Packet {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A packet together with the address it was sent to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub destination: i64,
    pub packet: Packet,
}
