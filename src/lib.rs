//! Intcode library.
//!
//! Provides the Intcode virtual machine and two ways of wiring several
//! machines together: amplifier circuits and packet networks.

pub mod circuit;
pub mod network;
pub mod utils;
pub mod virtual_machine;
