//! Unit tests for the peripheral subsystem.

/// Bus routing and open-bus sentinel tests.
pub mod bus;

/// Read-only boot flash tests.
pub mod flash;



/// Serial port tests (ring FIFO, registers, interrupts).
pub mod uart;
