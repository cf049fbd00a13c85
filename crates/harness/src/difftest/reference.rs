//! Reference Execution Model.
//!
//! This module defines the contract for the instruction-accurate reference
//! model the comparator checks the design against. The model is a black
//! box: the harness only initializes it, steps it, and exchanges
//! architectural snapshots and memory contents with it.

use crate::difftest::state::ArchState;

/// An instruction-accurate reference executor used as ground truth.
///
/// Implementations wrap whatever actually computes instruction semantics
/// (an FFI'd interpreter, an in-process model, a scripted mock in tests).
pub trait ReferenceModel {
    /// Initializes the model with the given entry program counter.
    fn init(&mut self, entry_pc: u64);

    /// Executes exactly `n` instructions.
    fn step(&mut self, n: u64);

    /// Returns the model's current architectural snapshot.
    fn read_state(&mut self) -> ArchState;

    /// Overwrites the model's architectural state with the given snapshot.
    fn write_state(&mut self, state: &ArchState);

    /// Copies bytes into the model's memory at the given guest address.
    fn copy_to_ref(&mut self, addr: u64, data: &[u8]);

    /// Copies bytes out of the model's memory at the given guest address.
    fn copy_from_ref(&mut self, addr: u64, buf: &mut [u8]);
}
