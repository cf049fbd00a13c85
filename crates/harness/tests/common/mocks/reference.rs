//! Scripted reference model.
//!
//! Stands in for the real instruction-accurate executor: `step` replays a
//! pre-scripted sequence of architectural states, and every interaction is
//! counted so tests can assert the comparator's skip-class behavior
//! (reference must NOT be stepped) as well as the normal path.

use rvcosim_core::difftest::reference::ReferenceModel;
use rvcosim_core::difftest::state::ArchState;
use std::collections::VecDeque;

pub struct ScriptedReference {
    state: ArchState,
    script: VecDeque<ArchState>,
    pub steps: u64,
    pub state_writes: u64,
    pub memory_loads: Vec<(u64, Vec<u8>)>,
}

impl ScriptedReference {
    pub fn new() -> Self {
        Self {
            state: ArchState::default(),
            script: VecDeque::new(),
            steps: 0,
            state_writes: 0,
            memory_loads: Vec::new(),
        }
    }

    /// Appends the state the model will be in after its next scripted step.
    pub fn push_state(&mut self, state: ArchState) {
        self.script.push_back(state);
    }

    pub fn state(&self) -> ArchState {
        self.state
    }
}

impl Default for ScriptedReference {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceModel for ScriptedReference {
    fn init(&mut self, entry_pc: u64) {
        self.state = ArchState::default();
        self.state.pc = entry_pc;
    }

    fn step(&mut self, n: u64) {
        for _ in 0..n {
            self.steps += 1;
            if let Some(next) = self.script.pop_front() {
                self.state = next;
            }
        }
    }

    fn read_state(&mut self) -> ArchState {
        self.state
    }

    fn write_state(&mut self, state: &ArchState) {
        self.state = *state;
        self.state_writes += 1;
    }

    fn copy_to_ref(&mut self, addr: u64, data: &[u8]) {
        self.memory_loads.push((addr, data.to_vec()));
    }

    fn copy_from_ref(&mut self, _addr: u64, buf: &mut [u8]) {
        buf.fill(0);
    }
}
