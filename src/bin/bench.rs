//! VM benchmark binary.
//!
//! Measures execution time for representative programs and compositions.
//! Run with: `cargo run --release --bin bench`

use std::time::{Duration, Instant};

use intcode::circuit::{FEEDBACK_PHASES, SERIES_PHASES, Wiring, max_signal};
use intcode::network::switch::{Network, NetworkConfig};
use intcode::virtual_machine::vm::VM;

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    result: i64,
    /// Number of instructions executed per run (None to omit column).
    instructions: Option<u64>,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations as u32
    }

    fn print(&self) {
        let avg = self.avg();
        let ns_per_op = avg.as_nanos();
        let ns_per_instr = self
            .instructions
            .filter(|&n| n > 0)
            .map(|n| format!("{:>8.1}", ns_per_op as f64 / n as f64))
            .unwrap_or_else(|| "       -".to_string());
        println!(
            "  {:<30} {:>7} iters {:>10.3} us/iter {:>14}  {} ns/instr",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            self.result,
            ns_per_instr,
        );
    }
}

fn bench<F>(
    name: &'static str,
    min_duration: Duration,
    instructions: Option<u64>,
    mut f: F,
) -> BenchResult
where
    F: FnMut() -> i64,
{
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let mut last = 0i64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        last = f();
        iterations += 1;
    }
    let total = start.elapsed();

    BenchResult {
        name,
        iterations,
        total,
        result: last,
        instructions,
    }
}

fn run_last_output(base: &VM) -> i64 {
    let outputs = base.clone().run_to_completion(&[]).expect("run failed");
    outputs.last().copied().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

/// Prints its own source.
const QUINE: &[i64] = &[
    109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
];

/// `acc = acc * 3 + 1`, 100K times, then prints `acc`.
const MUL_LOOP: &[i64] = &[
    1101, 100_000, 0, 100, // counter = 100000
    1002, 101, 3, 101, // acc *= 3
    1001, 101, 1, 101, // acc += 1
    1001, 100, -1, 100, // counter -= 1
    1005, 100, 4, // jnz counter -> 4
    4, 101, 99,
];
const MUL_LOOP_INSTRS: u64 = 1 + 100_000 * 4 + 2;

const AMPLIFIER: &[i64] = &[
    3, 31, 3, 32, 1002, 32, 10, 32, 1001, 31, -2, 31, 1007, 31, 0, 33, 1002, 33, 7, 33, 1, 33, 31,
    31, 1, 32, 31, 31, 4, 31, 99, 0, 0, 0,
];

const FEEDBACK_AMPLIFIER: &[i64] = &[
    3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28, 1005,
    28, 6, 99, 0, 0, 5,
];

/// Relays (5, 7) from node 0 through the highest node to the monitor.
const RELAY: &[i64] = &[
    3, 100, 1008, 100, 0, 101, 1006, 101, 15, 104, 1, 104, 5, 104, 7, 3, 102, 1008, 102, -1, 103,
    1005, 103, 15, 3, 104, 1001, 100, 1, 105, 1008, 100, 2, 106, 1006, 106, 41, 1101, 0, 255, 105,
    4, 105, 4, 102, 4, 104, 1105, 1, 15,
];

fn main() {
    let min = Duration::from_secs(2);

    println!("VM Benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<30} {:>7}       {:>14} {:>14}  {:>10}",
        "benchmark", "iters", "avg time", "result", "ns/instr"
    );
    println!("  {}", "-".repeat(84));

    // 1. Quine
    let quine = VM::new(QUINE);
    bench("quine", min, None, || run_last_output(&quine)).print();

    // 2. Multiply loop (100K iterations)
    let mul_loop = VM::new(MUL_LOOP);
    bench("mul_loop(100K)", min, Some(MUL_LOOP_INSTRS), || {
        run_last_output(&mul_loop)
    })
    .print();

    // 3. Series phase search (120 orderings)
    let amplifier = VM::new(AMPLIFIER);
    bench("series_search", min, None, || {
        max_signal(&amplifier, &SERIES_PHASES, Wiring::Series, 0)
            .expect("search failed")
            .signal
    })
    .print();

    // 4. Feedback phase search (120 orderings)
    let feedback = VM::new(FEEDBACK_AMPLIFIER);
    bench("feedback_search", min, None, || {
        max_signal(&feedback, &FEEDBACK_PHASES, Wiring::Feedback, 0)
            .expect("search failed")
            .signal
    })
    .print();

    // 5. Three-node network with the idle monitor
    let config = NetworkConfig {
        size: 3,
        monitor: true,
        trace: false,
    };
    bench("network_relay(3)", min, None, || {
        Network::new(RELAY, config)
            .and_then(|mut network| network.run())
            .expect("network failed")
    })
    .print();

    println!();
}
