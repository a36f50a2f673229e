//! A single network node: one VM and its inbound packet queue.

use crate::network::errors::NetworkError;
use crate::network::packet::{Envelope, NO_PACKET, Packet};
use crate::virtual_machine::vm::{State, VM};
use std::collections::VecDeque;

/// One VM attached to the network.
#[derive(Clone, Debug)]
pub struct Node {
    address: usize,
    vm: VM,
    queue: VecDeque<Packet>,
}

impl Node {
    /// Boots `vm` and feeds it `address` as its first input.
    ///
    /// The VM is left at whatever suspension follows the address read.
    pub fn prime(address: usize, mut vm: VM) -> Result<Self, NetworkError> {
        let state = vm.run();
        let mut node = Self {
            address,
            vm,
            queue: VecDeque::new(),
        };
        node.expect_state(state, State::Input)?;
        node.vm.provide_input(address as i64);
        node.vm.run();
        Ok(node)
    }

    pub fn address(&self) -> usize {
        self.address
    }

    pub fn vm(&self) -> &VM {
        &self.vm
    }

    pub fn queue(&self) -> &VecDeque<Packet> {
        &self.queue
    }

    /// Appends `packet` to the inbound queue.
    pub fn enqueue(&mut self, packet: Packet) {
        self.queue.push_back(packet);
    }

    /// Returns `true` when the node is blocked on input with nothing queued.
    pub fn is_idle(&self) -> bool {
        self.vm.state() == State::Input && self.queue.is_empty()
    }

    fn expect_state(&self, state: State, expected: State) -> Result<(), NetworkError> {
        match state {
            s if s == expected => Ok(()),
            State::Error(error) => Err(NetworkError::Fault {
                address: self.address,
                error,
            }),
            state => Err(NetworkError::UnexpectedState {
                address: self.address,
                state,
                expected,
            }),
        }
    }

    /// Services the node's current suspension once.
    ///
    /// At input the node receives the next queued packet as two inputs, or
    /// [`NO_PACKET`] when the queue is empty. At output the three staged values
    /// are collected and returned for routing.
    pub fn step(&mut self) -> Result<Option<Envelope>, NetworkError> {
        match self.vm.state() {
            State::Input => {
                match self.queue.pop_front() {
                    Some(packet) => {
                        self.vm.provide_input(packet.x);
                        let state = self.vm.run();
                        self.expect_state(state, State::Input)?;
                        self.vm.provide_input(packet.y);
                    }
                    None => self.vm.provide_input(NO_PACKET),
                }
                self.vm.run();
                Ok(None)
            }
            State::Output => {
                let destination = self.vm.output();
                let x = self.next_output()?;
                let y = self.next_output()?;
                self.vm.run();
                Ok(Some(Envelope {
                    destination,
                    packet: Packet { x, y },
                }))
            }
            State::Halted => Err(NetworkError::Halted {
                address: self.address,
            }),
            state => self.expect_state(state, State::Input).map(|_| None),
        }
    }

    fn next_output(&mut self) -> Result<i64, NetworkError> {
        let state = self.vm.run();
        self.expect_state(state, State::Output)?;
        Ok(self.vm.output())
    }
}
