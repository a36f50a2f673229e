//! Round-robin packet switch driving every node of the network.

use crate::network::errors::NetworkError;
use crate::network::node::Node;
use crate::network::packet::{Envelope, MONITOR_ADDRESS, Packet};
use crate::virtual_machine::vm::{VM, VmConfig};
use crate::{info, trace};

/// Default number of nodes.
pub const NETWORK_SIZE: usize = 50;

/// Configuration options for a network run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Number of nodes, addressed `0..size`.
    pub size: usize,
    /// If set, packets sent to the monitor address are held and replayed to
    /// node 0 whenever the network goes idle. Otherwise the first such packet
    /// ends the run.
    pub monitor: bool,
    /// Trace every node's instructions and every routed packet.
    pub trace: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            size: NETWORK_SIZE,
            monitor: false,
            trace: false,
        }
    }
}

/// A fixed mesh of nodes running the same program.
///
/// Nodes are serviced one suspension at a time in address order. Each full
/// pass over the nodes is preceded by an idle check while the monitor is
/// enabled.
#[derive(Clone, Debug)]
pub struct Network {
    config: NetworkConfig,
    nodes: Vec<Node>,
    /// Last packet sent to the monitor address.
    nat: Option<Packet>,
    /// y of the last packet the monitor delivered.
    last_delivered: Option<i64>,
    passes: u64,
    routed: u64,
}

impl Network {
    /// Boots `config.size` copies of `program`, each primed with its address.
    pub fn new(program: &[i64], config: NetworkConfig) -> Result<Self, NetworkError> {
        if config.size == 0 || config.size > MONITOR_ADDRESS as usize {
            return Err(NetworkError::InvalidSize(config.size));
        }

        let base = VM::with_config(program, VmConfig { trace: config.trace });
        let nodes = (0..config.size)
            .map(|address| Node::prime(address, base.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Network {
            config,
            nodes,
            nat: None,
            last_delivered: None,
            passes: 0,
            routed: 0,
        })
    }

    pub fn config(&self) -> NetworkConfig {
        self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the packet held by the monitor register.
    pub fn nat(&self) -> Option<Packet> {
        self.nat
    }

    /// Returns the number of completed scheduling passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Returns the number of packets routed so far, monitor included.
    pub fn routed(&self) -> u64 {
        self.routed
    }

    /// Returns `true` when every node waits for input with an empty queue.
    pub fn is_idle(&self) -> bool {
        self.nodes.iter().all(Node::is_idle)
    }

    /// Runs until the configured termination condition and returns its y.
    ///
    /// Without the monitor that is the first packet sent to
    /// [`MONITOR_ADDRESS`]. With it, the run ends when two consecutive idle
    /// deliveries to node 0 carry the same y.
    pub fn run(&mut self) -> Result<i64, NetworkError> {
        loop {
            if self.config.monitor && self.is_idle() {
                if let Some(y) = self.wake() {
                    return Ok(y);
                }
            }

            for address in 0..self.nodes.len() {
                if let Some(envelope) = self.nodes[address].step()? {
                    if let Some(y) = self.route(address, envelope)? {
                        return Ok(y);
                    }
                }
            }
            self.passes += 1;
        }
    }

    /// Replays the monitor packet to node 0, or reports a repeated y.
    ///
    /// An empty monitor register delivers nothing.
    fn wake(&mut self) -> Option<i64> {
        let packet = self.nat?;
        if self.last_delivered == Some(packet.y) {
            info!("monitor delivered y={} twice in a row", packet.y);
            return Some(packet.y);
        }

        info!("network idle after {} passes, monitor sends {packet} to 0", self.passes);
        self.nodes[0].enqueue(packet);
        self.last_delivered = Some(packet.y);
        None
    }

    /// Delivers `envelope` sent by node `from`.
    fn route(&mut self, from: usize, envelope: Envelope) -> Result<Option<i64>, NetworkError> {
        let Envelope {
            destination,
            packet,
        } = envelope;
        self.routed += 1;
        if self.config.trace {
            trace!("{from} -> {destination}: {packet}");
        }

        if destination == MONITOR_ADDRESS {
            if !self.config.monitor {
                info!("node {from} sent {packet} to the monitor");
                return Ok(Some(packet.y));
            }
            self.nat = Some(packet);
            return Ok(None);
        }

        let node = usize::try_from(destination)
            .ok()
            .and_then(|address| self.nodes.get_mut(address))
            .ok_or(NetworkError::UnknownDestination { from, destination })?;
        node.enqueue(packet);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::errors::VMError;
    use crate::virtual_machine::vm::State;

    // Three-node relay. Node 0 sends (5, 7) to node 1; every node forwards
    // what it receives to the next address, and node 2 forwards to 255.
    const RELAY: &[i64] = &[
        3, 100, // in addr
        1008, 100, 0, 101, // eq addr, 0
        1006, 101, 15, // jz -> wait
        104, 1, 104, 5, 104, 7, // send (1, 5, 7)
        3, 102, // wait: in x
        1008, 102, -1, 103, // eq x, -1
        1005, 103, 15, // jnz -> wait
        3, 104, // in y
        1001, 100, 1, 105, // dest = addr + 1
        1008, 100, 2, 106, // eq addr, 2
        1006, 106, 41, // jz -> send
        1101, 0, 255, 105, // dest = 255
        4, 105, 4, 102, 4, 104, // send (dest, x, y)
        1105, 1, 15, // jmp wait
    ];

    // RELAY with node 0 reading one more input before it sends, so the
    // whole network is idle right after priming.
    const LATE_RELAY: &[i64] = &[
        3, 100, // in addr
        1008, 100, 0, 101, // eq addr, 0
        1006, 101, 17, // jz -> wait
        3, 107, // in (ignored)
        104, 1, 104, 5, 104, 7, // send (1, 5, 7)
        3, 102, // wait: in x
        1008, 102, -1, 103, // eq x, -1
        1005, 103, 17, // jnz -> wait
        3, 104, // in y
        1001, 100, 1, 105, // dest = addr + 1
        1008, 100, 2, 106, // eq addr, 2
        1006, 106, 43, // jz -> send
        1101, 0, 255, 105, // dest = 255
        4, 105, 4, 102, 4, 104, // send (dest, x, y)
        1105, 1, 17, // jmp wait
    ];

    // Single node. Sends (0, 1) to 255, then answers every packet with
    // (x, min(y + 1, 3)) to 255.
    const COUNTER: &[i64] = &[
        3, 100, // in addr
        104, 255, 104, 0, 104, 1, // send (255, 0, 1)
        3, 101, // wait: in x
        1008, 101, -1, 103, // eq x, -1
        1005, 103, 8, // jnz -> wait
        3, 102, // in y
        1007, 102, 3, 104, // lt y, 3
        1, 102, 104, 102, // y += (y < 3)
        104, 255, 4, 101, 4, 102, // send (255, x, y)
        1105, 1, 8, // jmp wait
    ];

    // Reads input forever without sending.
    const SILENT: &[i64] = &[3, 100, 3, 101, 1105, 1, 2];

    fn config(size: usize, monitor: bool) -> NetworkConfig {
        NetworkConfig {
            size,
            monitor,
            trace: false,
        }
    }

    #[test]
    fn default_config() {
        let config = NetworkConfig::default();
        assert_eq!(config.size, 50);
        assert!(!config.monitor);
        assert!(!config.trace);
    }

    #[test]
    fn first_monitor_packet_ends_run_without_monitor() {
        let mut network = Network::new(RELAY, config(3, false)).unwrap();
        assert_eq!(network.run(), Ok(7));
        assert_eq!(network.routed(), 3);
        assert_eq!(network.nat(), None);
    }

    #[test]
    fn first_sender_wins() {
        // Every node immediately sends (addr, addr + 100) to 255.
        let program = [3, 20, 104, 255, 4, 20, 1001, 20, 100, 21, 4, 21, 99];
        let mut network = Network::new(&program, config(50, false)).unwrap();
        assert_eq!(network.run(), Ok(100));
        assert_eq!(network.passes(), 0);
    }

    #[test]
    fn monitor_replays_until_y_repeats() {
        let mut network = Network::new(RELAY, config(3, true)).unwrap();
        assert_eq!(network.run(), Ok(7));
        assert_eq!(network.nat(), Some(Packet::new(5, 7)));
        assert_eq!(network.routed(), 6);
        assert!(network.is_idle());
    }

    #[test]
    fn idle_before_any_monitor_packet_keeps_running() {
        let mut network = Network::new(LATE_RELAY, config(3, false)).unwrap();
        assert!(network.is_idle());
        assert_eq!(network.run(), Ok(7));

        let mut network = Network::new(LATE_RELAY, config(3, true)).unwrap();
        assert!(network.is_idle());
        assert_eq!(network.nat(), None);
        assert_eq!(network.run(), Ok(7));
        assert_eq!(network.nat(), Some(Packet::new(5, 7)));
        assert_eq!(network.routed(), 6);
    }

    #[test]
    fn monitor_stops_only_on_consecutive_equal_y() {
        let mut network = Network::new(COUNTER, config(1, false)).unwrap();
        assert_eq!(network.run(), Ok(1));

        // Deliveries carry y = 1, 2, 3; the run ends when 3 comes round again.
        let mut network = Network::new(COUNTER, config(1, true)).unwrap();
        assert_eq!(network.run(), Ok(3));
        assert_eq!(network.routed(), 4);
        assert_eq!(network.nat(), Some(Packet::new(0, 3)));
    }

    #[test]
    fn unknown_destination() {
        let program = [3, 100, 104, 7, 104, 0, 104, 0, 99];
        let mut network = Network::new(&program, config(2, false)).unwrap();
        assert_eq!(
            network.run(),
            Err(NetworkError::UnknownDestination {
                from: 0,
                destination: 7
            })
        );

        let program = [3, 100, 104, -3, 104, 0, 104, 0, 99];
        let mut network = Network::new(&program, config(2, false)).unwrap();
        assert_eq!(
            network.run(),
            Err(NetworkError::UnknownDestination {
                from: 0,
                destination: -3
            })
        );
    }

    #[test]
    fn node_failures_stop_the_run() {
        let mut network = Network::new(&[3, 100, 99], config(2, false)).unwrap();
        assert_eq!(network.run(), Err(NetworkError::Halted { address: 0 }));

        let mut network = Network::new(&[3, 100, 42], config(2, true)).unwrap();
        assert_eq!(
            network.run(),
            Err(NetworkError::Fault {
                address: 0,
                error: VMError::InvalidOpcode { opcode: 42, pc: 2 }
            })
        );
    }

    #[test]
    fn priming_failures() {
        assert_eq!(
            Network::new(&[104, 1, 99], config(2, false)).unwrap_err(),
            NetworkError::UnexpectedState {
                address: 0,
                state: State::Output,
                expected: State::Input
            }
        );
    }

    #[test]
    fn size_bounds() {
        assert_eq!(
            Network::new(SILENT, config(0, false)).unwrap_err(),
            NetworkError::InvalidSize(0)
        );
        assert_eq!(
            Network::new(SILENT, config(256, false)).unwrap_err(),
            NetworkError::InvalidSize(256)
        );
        assert_eq!(Network::new(SILENT, config(255, false)).unwrap().nodes().len(), 255);
    }

    #[test]
    fn nodes_are_primed_with_their_addresses() {
        let network = Network::new(SILENT, config(4, false)).unwrap();
        for (address, node) in network.nodes().iter().enumerate() {
            assert_eq!(node.address(), address);
            assert_eq!(node.vm().read(100), address as i64);
        }
    }
}
