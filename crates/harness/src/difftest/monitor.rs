//! Run Monitor.
//!
//! This module wraps the comparator with the engine's exit-code signal and
//! classifies how a run ended: clean exit with a pass/fail payload, an
//! invalid-instruction fault, a detected divergence, or a stuck design.
//! The outcome maps to the process exit code (0 pass, 1 fail).

use crate::difftest::comparator::{Comparator, DivergenceReport, StepOutcome};
use crate::difftest::reference::ReferenceModel;
use crate::difftest::signals::{CommitBundle, ExitSignal};
use std::fmt;

/// Terminal classification of a run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The design exited its test with a passing payload.
    GoodTrap {
        /// Program counter of the exiting instruction.
        pc: u64,
        /// Clock cycles elapsed.
        cycles: u64,
    },
    /// The design exited its test with a failing payload.
    BadTrap {
        /// Program counter of the exiting instruction.
        pc: u64,
        /// Clock cycles elapsed.
        cycles: u64,
    },
    /// The design raised an invalid-instruction fault.
    InvalidInstruction {
        /// Program counter of the faulting instruction.
        pc: u64,
        /// Clock cycles elapsed.
        cycles: u64,
    },
    /// The comparator detected a state divergence.
    Diverged(Box<DivergenceReport>),
    /// No instruction committed for too many consecutive edges.
    Stuck {
        /// Clock cycles elapsed.
        cycles: u64,
    },
}

impl RunOutcome {
    /// Returns whether the run passed.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::GoodTrap { .. })
    }

    /// Process exit code for this outcome: 0 pass, 1 fail.
    pub fn exit_code(&self) -> i32 {
        if self.is_pass() { 0 } else { 1 }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodTrap { pc, cycles } => {
                writeln!(f, "Exit after {} clock cycles.", cycles)?;
                write!(f, "HIT GOOD TRAP at pc = {:#018x}", pc)
            }
            Self::BadTrap { pc, cycles } => {
                writeln!(f, "Exit after {} clock cycles.", cycles)?;
                write!(f, "HIT BAD TRAP at pc = {:#018x}", pc)
            }
            Self::InvalidInstruction { pc, cycles } => {
                writeln!(f, "Exit after {} clock cycles.", cycles)?;
                write!(f, "INVALID INSTRUCTION at pc = {:#018x}", pc)
            }
            Self::Diverged(report) => {
                writeln!(f, "Exit after {} clock cycles.", report.cycles)?;
                write!(f, "{}", report)
            }
            Self::Stuck { cycles } => {
                writeln!(f, "Exit after {} clock cycles.", cycles)?;
                write!(f, "DESIGN STUCK: no instruction committed")
            }
        }
    }
}

/// Drives the comparator once per clock edge and latches the run outcome.
pub struct Monitor<R: ReferenceModel> {
    comparator: Comparator<R>,
    outcome: Option<RunOutcome>,
}

impl<R: ReferenceModel> Monitor<R> {
    /// Creates a monitor over an initialized comparator.
    pub fn new(comparator: Comparator<R>) -> Self {
        Self {
            comparator,
            outcome: None,
        }
    }

    /// The wrapped comparator.
    pub fn comparator_mut(&mut self) -> &mut Comparator<R> {
        &mut self.comparator
    }

    /// Clock cycles elapsed.
    pub fn cycles(&self) -> u64 {
        self.comparator.cycles()
    }

    /// The latched outcome, once the run has ended.
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Offers one clock edge: runs the comparator on any committed
    /// instruction, then samples the exit-code signal. Returns the latched
    /// outcome once the run is over; the first latched outcome is final.
    pub fn on_edge(
        &mut self,
        commit: Option<&CommitBundle>,
        exit: ExitSignal,
    ) -> Option<&RunOutcome> {
        if self.outcome.is_some() {
            return self.outcome.as_ref();
        }

        match self.comparator.on_edge(commit, exit.is_exit()) {
            StepOutcome::Continue => {}
            StepOutcome::Diverged(report) => {
                self.outcome = Some(RunOutcome::Diverged(report));
                return self.outcome.as_ref();
            }
            StepOutcome::Stuck { .. } => {
                self.outcome = Some(RunOutcome::Stuck {
                    cycles: self.comparator.cycles(),
                });
                return self.outcome.as_ref();
            }
        }

        match exit {
            ExitSignal::Running => {}
            ExitSignal::Halt { failure, pc } => {
                self.outcome = Some(if failure {
                    RunOutcome::BadTrap {
                        pc,
                        cycles: self.comparator.cycles(),
                    }
                } else {
                    RunOutcome::GoodTrap {
                        pc,
                        cycles: self.comparator.cycles(),
                    }
                });
            }
            ExitSignal::InvalidInstruction { pc } => {
                self.outcome = Some(RunOutcome::InvalidInstruction {
                    pc,
                    cycles: self.comparator.cycles(),
                });
            }
        }

        self.outcome.as_ref()
    }
}
