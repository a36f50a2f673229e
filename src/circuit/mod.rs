//! Amplifier circuits built from clones of one VM.
//!
//! A circuit is a fixed sequence of stages, each an independent copy of the
//! same base [`VM`]. Every stage first reads its phase setting, then a signal,
//! and answers with a new signal for the next stage.
//!
//! - [`Circuit::run_series`]: one pass from the first stage to the last.
//! - [`Circuit::run_feedback`]: the last stage feeds the first until a stage
//!   halts.
//! - [`max_signal`]: tries every ordering of a phase set on fresh circuits.
//!
//! - [`permutation`]: ordering generator used by the search.

pub mod permutation;

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::vm::{State, VM};
use crate::{info, trace};
use std::fmt;
use thiserror::Error;

/// Phase settings used by series circuits.
pub const SERIES_PHASES: [i64; 5] = [0, 1, 2, 3, 4];

/// Phase settings used by feedback circuits.
pub const FEEDBACK_PHASES: [i64; 5] = [5, 6, 7, 8, 9];

/// How the stages of a circuit are connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wiring {
    Series,
    Feedback,
}

impl Wiring {
    /// Returns the phase set conventionally searched for this wiring.
    pub const fn default_phases(&self) -> [i64; 5] {
        match self {
            Wiring::Series => SERIES_PHASES,
            Wiring::Feedback => FEEDBACK_PHASES,
        }
    }
}

impl fmt::Display for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Wiring::Series => "series",
            Wiring::Feedback => "feedback",
        })
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CircuitError {
    #[error("circuit has no stages")]
    Empty,
    #[error("{supplied} phase settings for {stages} stages")]
    PhaseCount { stages: usize, supplied: usize },
    #[error("stage {stage} faulted: {error}")]
    Fault { stage: usize, error: VMError },
    #[error("stage {stage} stopped in state {state:?}, expected {expected:?}")]
    UnexpectedState {
        stage: usize,
        state: State,
        expected: State,
    },
    #[error("stage {stage} halted before the last stage produced a signal")]
    NoSignal { stage: usize },
}

/// Checks that `stage` suspended in the `expected` state.
fn expect_state(stage: usize, state: State, expected: State) -> Result<(), CircuitError> {
    match state {
        s if s == expected => Ok(()),
        State::Error(error) => Err(CircuitError::Fault { stage, error }),
        state => Err(CircuitError::UnexpectedState {
            stage,
            state,
            expected,
        }),
    }
}

/// A sequence of VMs wired output to input.
#[derive(Clone, Debug)]
pub struct Circuit {
    stages: Vec<VM>,
    trace: bool,
}

impl Circuit {
    /// Builds a circuit of `size` independent copies of `base`.
    pub fn new(base: &VM, size: usize) -> Self {
        Self {
            stages: vec![base.clone(); size],
            trace: base.config().trace,
        }
    }

    /// Builds a circuit of `size` stages each loaded with `program`.
    pub fn from_program(program: &[i64], size: usize) -> Self {
        Self::new(&VM::new(program), size)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[VM] {
        &self.stages
    }

    fn check_phases(&self, phases: &[i64]) -> Result<(), CircuitError> {
        if self.stages.is_empty() {
            return Err(CircuitError::Empty);
        }
        if phases.len() != self.stages.len() {
            return Err(CircuitError::PhaseCount {
                stages: self.stages.len(),
                supplied: phases.len(),
            });
        }
        Ok(())
    }

    /// Passes `input` through every stage once and returns the last output.
    ///
    /// Each stage must ask for its phase, then for the signal, then produce
    /// exactly one output. Any other state is an error naming the stage.
    pub fn run_series(&mut self, phases: &[i64], input: i64) -> Result<i64, CircuitError> {
        self.check_phases(phases)?;

        let mut signal = input;
        for (stage, (vm, &phase)) in self.stages.iter_mut().zip(phases).enumerate() {
            expect_state(stage, vm.run(), State::Input)?;
            vm.provide_input(phase);
            expect_state(stage, vm.run(), State::Input)?;
            vm.provide_input(signal);
            expect_state(stage, vm.run(), State::Output)?;
            signal = vm.output();
            if self.trace {
                trace!("stage {stage} phase {phase} -> {signal}");
            }
        }
        Ok(signal)
    }

    /// Loops the signal around the circuit until a stage halts.
    ///
    /// Phases are supplied on the first round only. The result is the last
    /// value produced by the final stage.
    pub fn run_feedback(&mut self, phases: &[i64], input: i64) -> Result<i64, CircuitError> {
        self.check_phases(phases)?;

        let last = self.stages.len() - 1;
        let mut signal = input;
        let mut result = None;
        let mut round = 0usize;
        loop {
            for (stage, vm) in self.stages.iter_mut().enumerate() {
                if round == 0 {
                    expect_state(stage, vm.run(), State::Input)?;
                    vm.provide_input(phases[stage]);
                }
                match vm.run() {
                    State::Halted => {
                        if self.trace {
                            trace!("stage {stage} halted in round {round}");
                        }
                        return result.ok_or(CircuitError::NoSignal { stage });
                    }
                    state => expect_state(stage, state, State::Input)?,
                }
                vm.provide_input(signal);
                expect_state(stage, vm.run(), State::Output)?;
                signal = vm.output();
                if stage == last {
                    result = Some(signal);
                }
            }
            if self.trace {
                trace!("round {round} -> {signal}");
            }
            round += 1;
        }
    }

    /// Runs the circuit with the given wiring.
    pub fn run(&mut self, wiring: Wiring, phases: &[i64], input: i64) -> Result<i64, CircuitError> {
        match wiring {
            Wiring::Series => self.run_series(phases, input),
            Wiring::Feedback => self.run_feedback(phases, input),
        }
    }
}

/// Best outcome of a phase search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseSearch {
    pub signal: i64,
    pub phases: Vec<i64>,
}

/// Runs a fresh circuit of `base` for every ordering of `phases` and returns
/// the largest final signal.
///
/// Ties keep the ordering found first. The first failing ordering aborts the
/// search with its error.
pub fn max_signal(
    base: &VM,
    phases: &[i64],
    wiring: Wiring,
    input: i64,
) -> Result<PhaseSearch, CircuitError> {
    if phases.is_empty() {
        return Err(CircuitError::Empty);
    }

    let mut best: Option<PhaseSearch> = None;
    let mut tried = 0usize;
    let mut order = phases.to_vec();
    permutation::try_for_each_permutation(&mut order, |perm| {
        let signal = Circuit::new(base, perm.len()).run(wiring, perm, input)?;
        tried += 1;
        if best.as_ref().is_none_or(|b| signal > b.signal) {
            best = Some(PhaseSearch {
                signal,
                phases: perm.to_vec(),
            });
        }
        Ok::<(), CircuitError>(())
    })?;

    let best = best.ok_or(CircuitError::Empty)?;
    info!(
        "{wiring} search over {tried} orderings: {} with phases {:?}",
        best.signal, best.phases
    );
    Ok(best)
}
