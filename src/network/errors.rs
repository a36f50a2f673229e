use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::vm::State;
use thiserror::Error;

/// Errors that stop a network run.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// Node addresses must fit below the monitor address.
    #[error("network size {0} is outside 1..=255")]
    InvalidSize(usize),

    /// A node faulted.
    #[error("node {address} faulted: {error}")]
    Fault { address: usize, error: VMError },

    /// A node executed `halt`; nodes are expected to run forever.
    #[error("node {address} halted")]
    Halted { address: usize },

    /// A node suspended in the wrong state while priming or mid-packet.
    #[error("node {address} stopped in state {state:?}, expected {expected:?}")]
    UnexpectedState {
        address: usize,
        state: State,
        expected: State,
    },

    /// A node sent a packet to an address with no node and no monitor.
    #[error("node {from} sent a packet to unknown address {destination}")]
    UnknownDestination { from: usize, destination: i64 },
}
