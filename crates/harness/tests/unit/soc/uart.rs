//! Serial Port Unit Tests.
//!
//! Verifies receive-ring ordering and overflow behavior, register-level
//! semantics (RBR/IER/IIR/LSR/MSR/SCR, DLAB gating), interrupt reporting,
//! and reset.

use proptest::prelude::*;
use rvcosim_core::soc::devices::Uart;
use rvcosim_core::soc::devices::uart::{RX_FIFO_CAPACITY, RxFifo};
use rvcosim_core::soc::traits::Device;

// ══════════════════════════════════════════════════════════
// 1. Receive ring
// ══════════════════════════════════════════════════════════

#[test]
fn fifo_pops_in_push_order() {
    let mut fifo = RxFifo::new();
    for b in [0x10u8, 0x20, 0x30] {
        assert!(fifo.push(b));
    }
    assert_eq!(fifo.pop(), Some(0x10));
    assert_eq!(fifo.pop(), Some(0x20));
    assert_eq!(fifo.pop(), Some(0x30));
    assert_eq!(fifo.pop(), None);
}

#[test]
fn fifo_empty_iff_head_equals_tail() {
    let mut fifo = RxFifo::new();
    assert!(fifo.is_empty());
    assert!(fifo.push(1));
    assert!(!fifo.is_empty());
    assert_eq!(fifo.pop(), Some(1));
    assert!(fifo.is_empty());
}

#[test]
fn fifo_full_drops_newest_and_keeps_contents() {
    let mut fifo = RxFifo::new();
    // One slot stays empty: usable capacity is one less than the ring size.
    for i in 0..RX_FIFO_CAPACITY - 1 {
        assert!(fifo.push(i as u8), "push {} should fit", i);
    }
    assert!(!fifo.push(0xEE));
    assert_eq!(fifo.len(), RX_FIFO_CAPACITY - 1);
    for i in 0..RX_FIFO_CAPACITY - 1 {
        assert_eq!(fifo.pop(), Some(i as u8));
    }
    assert_eq!(fifo.pop(), None);
}

#[test]
fn fifo_wraps_around() {
    let mut fifo = RxFifo::new();
    for round in 0..3 {
        for i in 0..RX_FIFO_CAPACITY - 1 {
            assert!(fifo.push((i + round) as u8));
        }
        for i in 0..RX_FIFO_CAPACITY - 1 {
            assert_eq!(fifo.pop(), Some((i + round) as u8));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any sequence of pushes not exceeding capacity dequeues in order.
    #[test]
    fn fifo_ordering_holds_for_any_sequence(
        bytes in proptest::collection::vec(any::<u8>(), 0..RX_FIFO_CAPACITY - 1)
    ) {
        let mut fifo = RxFifo::new();
        for &b in &bytes {
            prop_assert!(fifo.push(b));
        }
        for &b in &bytes {
            prop_assert_eq!(fifo.pop(), Some(b));
        }
        prop_assert_eq!(fifo.pop(), None);
    }
}

// ══════════════════════════════════════════════════════════
// 2. Receive register
// ══════════════════════════════════════════════════════════

#[test]
fn rbr_empty_returns_all_ones() {
    let mut uart = Uart::new(0x1000_0000, true);
    assert_eq!(uart.read_u8(0), 0xFF);
}

#[test]
fn rbr_pops_oldest_buffered_byte() {
    let mut uart = Uart::new(0x1000_0000, true);
    uart.push_input(b'a');
    uart.push_input(b'b');
    assert_eq!(uart.read_u8(0), b'a');
    assert_eq!(uart.read_u8(0), b'b');
    assert_eq!(uart.read_u8(0), 0xFF);
}

// ══════════════════════════════════════════════════════════
// 3. Line status
// ══════════════════════════════════════════════════════════

#[test]
fn lsr_transmitter_always_ready() {
    let mut uart = Uart::new(0, true);
    assert_eq!(uart.read_u8(5) & 0x60, 0x60);
}

#[test]
fn lsr_data_ready_mirrors_ring() {
    let mut uart = Uart::new(0, true);
    assert_eq!(uart.read_u8(5) & 0x01, 0);
    uart.push_input(0x42);
    assert_eq!(uart.read_u8(5) & 0x01, 0x01);
    let _ = uart.read_u8(0);
    assert_eq!(uart.read_u8(5) & 0x01, 0);
}

#[test]
fn msr_is_always_zero() {
    let mut uart = Uart::new(0, true);
    assert_eq!(uart.read_u8(6), 0);
}

// ══════════════════════════════════════════════════════════
// 4. Interrupts
// ══════════════════════════════════════════════════════════

#[test]
fn iir_no_interrupt_when_disabled() {
    let mut uart = Uart::new(0, true);
    uart.push_input(0x42);
    assert_eq!(uart.read_u8(2) & 0x0F, 0x01);
}

#[test]
fn iir_receive_available_beats_no_pending() {
    let mut uart = Uart::new(0, true);
    uart.write_u8(1, 0x01);
    assert_eq!(uart.read_u8(2) & 0x0F, 0x01); // enabled, nothing queued
    uart.push_input(0x42);
    assert_eq!(uart.read_u8(2) & 0x0F, 0x04); // enabled and queued
}

#[test]
fn ier_stores_only_receive_enable_bit() {
    let mut uart = Uart::new(0, true);
    uart.write_u8(1, 0xFF);
    assert_eq!(uart.read_u8(1), 0x01);
}

#[test]
fn interrupt_line_follows_ring_occupancy() {
    let mut uart = Uart::new(0, true);
    assert!(!uart.interrupt_pending());
    uart.push_input(0x42);
    assert!(uart.interrupt_pending());
    let _ = uart.read_u8(0);
    assert!(!uart.interrupt_pending());
}

// ══════════════════════════════════════════════════════════
// 5. Divisor latch gating
// ══════════════════════════════════════════════════════════

#[test]
fn dlab_reroutes_thr_and_ier_to_divisor() {
    let mut uart = Uart::new(0, true);
    uart.write_u8(3, 0x80); // set DLAB
    uart.write_u8(0, 0x0C); // DLL
    uart.write_u8(1, 0x01); // DLM
    assert_eq!(uart.read_u8(0), 0x0C);
    assert_eq!(uart.read_u8(1), 0x01);

    uart.write_u8(3, 0x03); // clear DLAB
    // The receive interrupt enable was never touched.
    assert_eq!(uart.read_u8(1), 0x00);
}

#[test]
fn dlab_read_does_not_consume_rx_data() {
    let mut uart = Uart::new(0, true);
    uart.push_input(0x42);
    uart.write_u8(3, 0x80);
    let _ = uart.read_u8(0); // divisor low, not RBR
    uart.write_u8(3, 0x00);
    assert_eq!(uart.read_u8(0), 0x42);
}

// ══════════════════════════════════════════════════════════
// 6. Scratch and reset
// ══════════════════════════════════════════════════════════

#[test]
fn scratch_stores_verbatim() {
    let mut uart = Uart::new(0, true);
    uart.write_u8(7, 0x55);
    assert_eq!(uart.read_u8(7), 0x55);
    uart.write_u8(7, 0xAA);
    assert_eq!(uart.read_u8(7), 0xAA);
}

#[test]
fn reset_clears_ring_scratch_and_dlab() {
    let mut uart = Uart::new(0, true);
    uart.push_input(0x42);
    uart.write_u8(7, 0x99);
    uart.write_u8(3, 0x80);

    uart.reset();

    assert_eq!(uart.read_u8(7), 0);
    assert_eq!(uart.read_u8(3) & 0x80, 0);
    assert_eq!(uart.read_u8(0), 0xFF); // ring drained
}

#[test]
fn push_after_reset_still_works() {
    let mut uart = Uart::new(0, true);
    uart.reset();
    uart.push_input(0x42);
    assert_eq!(uart.read_u8(0), 0x42);
}
