//! Differential Execution Comparator.
//!
//! This module cross-checks the design's committed architectural state
//! against the reference model, instruction by instruction. It provides:
//! 1. **Classification:** Skip-class commits (interrupt entry, exit
//!    sequence, allowlisted CSRs, MMIO) state-sync the reference instead of
//!    re-executing through its decoder.
//! 2. **Comparison:** Normal-class commits step the reference once and diff
//!    every general register and tracked CSR through one static table.
//! 3. **Reporting:** The first mismatch produces a terminal divergence
//!    report carrying both full snapshots.
//! 4. **Liveness:** Too many consecutive commit-less edges classify the
//!    design as stuck, distinct from a divergence.

use crate::common::constants::{INSTRUCTION_SIZE_16, INSTRUCTION_SIZE_32, PRIV_MACHINE};
use crate::config::DifftestConfig;
use crate::difftest::reference::ReferenceModel;
use crate::difftest::signals::CommitBundle;
use crate::difftest::state::{ArchState, TrackedCsr};
use std::fmt;

/// The architectural field where a divergence was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffField {
    /// Committed program counter.
    Pc,
    /// General-purpose register with the given index.
    Gpr(usize),
    /// Tracked control/status register.
    Csr(TrackedCsr),
}

impl fmt::Display for DiffField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pc => f.write_str("pc"),
            Self::Gpr(i) => write!(f, "GPR[{}]", i),
            Self::Csr(csr) => f.write_str(csr.name()),
        }
    }
}

/// Diagnostic produced at the first design/reference mismatch.
///
/// Produced at most once per run; the run is over once it exists.
#[derive(Clone, Debug)]
pub struct DivergenceReport {
    /// Clock cycle count at the divergence.
    pub cycles: u64,
    /// Program counter of the diverging instruction.
    pub pc: u64,
    /// First mismatching field.
    pub field: DiffField,
    /// The design's value of the mismatching field.
    pub design_value: u64,
    /// The reference model's value of the mismatching field.
    pub reference_value: u64,
    /// Full design-side snapshot at the divergence.
    pub design: ArchState,
    /// Full reference-side snapshot at the divergence.
    pub reference: ArchState,
}

impl fmt::Display for DivergenceReport {
    /// Renders the full diagnostic: the mismatching field, then every
    /// general register pair and every tracked CSR pair.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Diff at pc = {:#018x}", self.field, self.pc)?;
        writeln!(
            f,
            "{} = {:#018x}\tref_{} = {:#018x}",
            self.field, self.design_value, self.field, self.reference_value
        )?;
        for (i, (dut, reference)) in self.design.gpr.iter().zip(&self.reference.gpr).enumerate() {
            writeln!(f, "GPR[{:2}] = {:#018x}\tref = {:#018x}", i, dut, reference)?;
        }
        for csr in TrackedCsr::ALL {
            writeln!(
                f,
                "{:8} = {:#018x}\tref = {:#018x}",
                csr.name(),
                self.design.csrs[csr],
                self.reference.csrs[csr]
            )?;
        }
        Ok(())
    }
}

/// Outcome of offering one clock edge to the comparator.
#[derive(Debug)]
pub enum StepOutcome {
    /// No mismatch; keep stepping.
    Continue,
    /// The design and reference disagree; terminal.
    Diverged(Box<DivergenceReport>),
    /// No instruction committed for too many consecutive edges; terminal.
    Stuck {
        /// Number of consecutive commit-less edges observed.
        idle_edges: u64,
    },
}

/// Differential comparator state machine.
///
/// Two states: running and diverged (terminal). Once diverged, further
/// edges are ignored.
pub struct Comparator<R: ReferenceModel> {
    reference: R,
    config: DifftestConfig,
    edges: u64,
    idle_edges: u64,
    diverged: bool,
}

impl<R: ReferenceModel> Comparator<R> {
    /// Creates a comparator over the given reference model.
    ///
    /// # Arguments
    ///
    /// * `reference` - The reference execution model (black box).
    /// * `config` - Skip-class CSR allowlist and liveness threshold.
    pub fn new(reference: R, config: DifftestConfig) -> Self {
        Self {
            reference,
            config,
            edges: 0,
            idle_edges: 0,
            diverged: false,
        }
    }

    /// Initializes the reference model and seeds its program counter,
    /// preserving the model's own reset values for everything else.
    ///
    /// # Arguments
    ///
    /// * `entry_pc` - Program counter both sides start from.
    pub fn reset(&mut self, entry_pc: u64) {
        self.reference.init(entry_pc);
        let mut state = self.reference.read_state();
        state.pc = entry_pc;
        self.reference.write_state(&state);
        self.edges = 0;
        self.idle_edges = 0;
        self.diverged = false;
    }

    /// Copies an image into the reference model's memory so both sides
    /// execute the same program.
    ///
    /// # Arguments
    ///
    /// * `addr` - Guest physical address of the image.
    /// * `data` - Image bytes.
    pub fn load_memory(&mut self, addr: u64, data: &[u8]) {
        self.reference.copy_to_ref(addr, data);
    }

    /// Clock cycles elapsed (two edges per cycle).
    pub fn cycles(&self) -> u64 {
        self.edges / 2
    }

    /// The wrapped reference model.
    pub fn reference_mut(&mut self) -> &mut R {
        &mut self.reference
    }

    /// Offers one clock edge to the comparator.
    ///
    /// `commit` carries the design's committed-instruction snapshot when an
    /// instruction retired on this edge; `exit_pending` mirrors the
    /// engine's exit-code signal. Callers stop stepping after the first
    /// non-`Continue` outcome.
    pub fn on_edge(&mut self, commit: Option<&CommitBundle>, exit_pending: bool) -> StepOutcome {
        self.edges += 1;
        if self.diverged {
            return StepOutcome::Continue;
        }

        let Some(bundle) = commit else {
            self.idle_edges += 1;
            if self.idle_edges >= self.config.stuck_threshold {
                return StepOutcome::Stuck {
                    idle_edges: self.idle_edges,
                };
            }
            return StepOutcome::Continue;
        };
        self.idle_edges = 0;

        let ref_state = self.reference.read_state();
        if bundle.pc != ref_state.pc {
            return self.diverge(DiffField::Pc, bundle.pc, ref_state.pc, bundle, ref_state);
        }

        if self.is_skip_class(bundle, exit_pending) {
            self.sync_reference(bundle);
            return StepOutcome::Continue;
        }

        self.reference.step(1);
        let ref_state = self.reference.read_state();

        for csr in TrackedCsr::ALL {
            if bundle.csrs[csr] != ref_state.csrs[csr] {
                return self.diverge(
                    DiffField::Csr(csr),
                    bundle.csrs[csr],
                    ref_state.csrs[csr],
                    bundle,
                    ref_state,
                );
            }
        }
        for i in 0..32 {
            if bundle.gpr[i] != ref_state.gpr[i] {
                return self.diverge(
                    DiffField::Gpr(i),
                    bundle.gpr[i],
                    ref_state.gpr[i],
                    bundle,
                    ref_state,
                );
            }
        }

        StepOutcome::Continue
    }

    /// A commit whose effects cannot be reproduced by re-executing it on
    /// the reference: interrupt entry, the exit sequence, an allowlisted
    /// CSR access, or any memory-mapped I/O access.
    fn is_skip_class(&self, bundle: &CommitBundle, exit_pending: bool) -> bool {
        if bundle.interrupt_entry() || bundle.mmio || exit_pending {
            return true;
        }
        bundle
            .csr_addr
            .is_some_and(|addr| self.config.skip_csrs.iter().any(|r| r.contains(addr)))
    }

    /// State-syncs the reference with the design's reported values and
    /// computes the reference PC for the next instruction: the trap vector
    /// (selected by the reported privilege) after an interrupt entry,
    /// otherwise the sequentially next PC.
    fn sync_reference(&mut self, bundle: &CommitBundle) {
        let mut state = self.reference.read_state();
        state.gpr = bundle.gpr;
        for csr in TrackedCsr::ALL {
            if csr != TrackedCsr::Priv {
                state.csrs[csr] = bundle.csrs[csr];
            }
        }
        if bundle.interrupt_entry() {
            state.csrs[TrackedCsr::Priv] = bundle.privilege;
            state.pc = if bundle.privilege == PRIV_MACHINE {
                state.csrs[TrackedCsr::Mtvec]
            } else {
                state.csrs[TrackedCsr::Stvec]
            };
        } else {
            let size = if bundle.compressed {
                INSTRUCTION_SIZE_16
            } else {
                INSTRUCTION_SIZE_32
            };
            state.pc = bundle.pc + size;
        }
        self.reference.write_state(&state);
    }

    fn diverge(
        &mut self,
        field: DiffField,
        design_value: u64,
        reference_value: u64,
        bundle: &CommitBundle,
        reference: ArchState,
    ) -> StepOutcome {
        self.diverged = true;
        StepOutcome::Diverged(Box::new(DivergenceReport {
            cycles: self.cycles(),
            pc: bundle.pc,
            field,
            design_value,
            reference_value,
            design: bundle.arch_state(),
            reference,
        }))
    }
}
