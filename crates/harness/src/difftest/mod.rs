//! Differential Execution Checking.
//!
//! This module implements the instruction-by-instruction cross-check of the
//! design against a reference model. It provides:
//! 1. **State:** Architectural snapshots and the tracked-CSR table.
//! 2. **Signals:** Committed-instruction and exit-code signal bundles.
//! 3. **Reference:** The black-box reference model contract.
//! 4. **Comparator:** Skip-class state sync, uniform diffing, divergence reports.
//! 5. **Monitor:** Run-outcome classification and exit codes.

/// Per-edge comparison state machine and divergence reports.
pub mod comparator;

/// Run-outcome classification (good/bad trap, fault, divergence, stuck).
pub mod monitor;

/// Black-box reference model contract.
pub mod reference;

/// Design observable signal bundles.
pub mod signals;

/// Architectural snapshots and tracked CSRs.
pub mod state;

pub use comparator::{Comparator, DiffField, DivergenceReport, StepOutcome};
pub use monitor::{Monitor, RunOutcome};
pub use reference::ReferenceModel;
pub use signals::{CommitBundle, ExitSignal};
pub use state::{ArchState, CsrFile, TrackedCsr};
