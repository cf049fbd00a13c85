//! Serial Port (UART).
//!
//! Implements a 16550-style register file over a mutex-guarded receive
//! ring buffer. A background thread feeds the ring with raw bytes from
//! stdin; the simulation-side register accesses never block. Terminal mode
//! (raw/canonical) is the surrounding process's concern, not this device's.

use crate::soc::traits::Device;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Receiver Buffer Register (Read) / Divisor Latch Low (DLAB=1).
const REG_RBR: u64 = 0;
/// Transmitter Holding Register (Write) / Divisor Latch Low (DLAB=1).
const REG_THR: u64 = 0;
/// Interrupt Enable Register / Divisor Latch High (DLAB=1).
const REG_IER: u64 = 1;
/// Interrupt Identity Register (Read).
const REG_IIR: u64 = 2;
/// FIFO Control Register (Write).
const REG_FCR: u64 = 2;
/// Line Control Register.
const REG_LCR: u64 = 3;
/// Modem Control Register.
const REG_MCR: u64 = 4;
/// Line Status Register.
const REG_LSR: u64 = 5;
/// Modem Status Register.
const REG_MSR: u64 = 6;
/// Scratch Register.
const REG_SCR: u64 = 7;

/// Interrupt Identity Register: No interrupt pending.
const IIR_NO_INTERRUPT: u8 = 0x01;

/// Interrupt Identity Register: Receiver Data Available interrupt.
const IIR_RDA: u8 = 0x04;

/// Interrupt Identity Register: Interrupt ID mask (bits 7:6).
const IIR_ID_MASK: u8 = 0xC0;

/// Line Status Register: Data ready bit (receiver has data).
const LSR_DATA_READY: u8 = 0x01;

/// Line Status Register: Transmitter Holding Register Empty.
const LSR_THRE: u8 = 0x20;

/// Line Status Register: Transmitter Empty (both THR and shift register empty).
const LSR_TEMT: u8 = 0x40;

/// Default Line Status Register value (transmitter always ready).
const LSR_DEFAULT: u8 = LSR_THRE | LSR_TEMT;

/// Line Control Register: Divisor Latch Access Bit.
const LCR_DLAB: u8 = 0x80;

/// Interrupt Enable Register: Receiver Data Available interrupt enable.
const IER_RDA: u8 = 0x01;

/// Value returned by the receive register when no data is buffered
/// (-1 as a signed byte).
const RX_EMPTY: u8 = 0xFF;

/// Threshold for flushing the transmit buffer to stdout (4 KiB).
const TX_BUFFER_FLUSH_THRESHOLD: usize = 4096;

/// Receive ring capacity in slots (one slot stays empty to distinguish
/// full from empty).
pub const RX_FIFO_CAPACITY: usize = 1024;

/// Bounded receive ring buffer.
///
/// `head == tail` means empty. A push into a full ring drops the incoming
/// byte and leaves prior contents intact. One mutex around the whole
/// struct guards head, tail, and contents together.
pub struct RxFifo {
    buf: [u8; RX_FIFO_CAPACITY],
    head: usize,
    tail: usize,
}

impl RxFifo {
    /// Creates an empty ring.
    pub const fn new() -> Self {
        Self {
            buf: [0; RX_FIFO_CAPACITY],
            head: 0,
            tail: 0,
        }
    }

    /// Enqueues one byte; returns `false` when the ring is full and the
    /// byte was dropped.
    pub fn push(&mut self, byte: u8) -> bool {
        let next = (self.tail + 1) % RX_FIFO_CAPACITY;
        if next == self.head {
            return false;
        }
        self.buf[self.tail] = byte;
        self.tail = next;
        true
    }

    /// Dequeues the oldest byte, if any.
    pub fn pop(&mut self) -> Option<u8> {
        if self.head == self.tail {
            return None;
        }
        let byte = self.buf[self.head];
        self.head = (self.head + 1) % RX_FIFO_CAPACITY;
        Some(byte)
    }

    /// Returns whether the ring holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Returns the number of buffered bytes.
    pub fn len(&self) -> usize {
        (self.tail + RX_FIFO_CAPACITY - self.head) % RX_FIFO_CAPACITY
    }

    /// Discards all buffered bytes.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}

impl Default for RxFifo {
    fn default() -> Self {
        Self::new()
    }
}

/// UART device structure.
///
/// Spawns a background thread that captures stdin bytes into the receive
/// ring. Output is buffered and flushed to stdout (or stderr) on newline.
pub struct Uart {
    /// Base physical address of the device.
    base_addr: u64,
    /// Receive ring shared with the producer thread.
    rx: Arc<Mutex<RxFifo>>,
    /// Producer stop flag, polled once per captured byte.
    running: Arc<AtomicBool>,
    /// Interrupt Enable Register (receive-available bit only).
    ier: u8,
    /// Line Control Register.
    lcr: u8,
    /// Modem Control Register.
    mcr: u8,
    /// Scratch Register.
    scr: u8,
    /// Divisor Latch (stored for read-back; baud is not modeled).
    div: u16,
    /// Buffer for outgoing bytes.
    tx_buffer: Vec<u8>,
    /// When true, output goes to stderr instead of stdout.
    to_stderr: bool,
}

impl Uart {
    /// Creates a new UART and starts its stdin capture thread.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - The base physical address of the UART window.
    /// * `to_stderr` - When true, write output to stderr instead of stdout.
    pub fn new(base_addr: u64, to_stderr: bool) -> Self {
        let rx = Arc::new(Mutex::new(RxFifo::new()));
        let running = Arc::new(AtomicBool::new(true));

        let thread_rx = Arc::clone(&rx);
        let thread_running = Arc::clone(&running);
        let _ = thread::spawn(move || {
            let mut byte = [0u8; 1];
            let stdin = io::stdin();
            let mut handle = stdin.lock();
            while thread_running.load(Ordering::Relaxed) {
                if handle.read_exact(&mut byte).is_err() {
                    break;
                }
                if let Ok(mut fifo) = thread_rx.lock() {
                    let _ = fifo.push(byte[0]);
                }
            }
        });

        Self {
            base_addr,
            rx,
            running,
            ier: 0,
            lcr: 0,
            mcr: 0,
            scr: 0,
            div: 0,
            tx_buffer: Vec::new(),
            to_stderr,
        }
    }

    /// Enqueues one received byte, exactly as the capture thread would.
    /// A full ring drops the byte.
    pub fn push_input(&self, byte: u8) {
        if let Ok(mut fifo) = self.rx.lock() {
            let _ = fifo.push(byte);
        }
    }

    /// Signals the capture thread to stop. The thread notices after its
    /// next captured byte (or stdin EOF); it is never joined.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Clears the receive ring, scratch register, and divisor-latch mode
    /// without stopping the capture thread.
    pub fn reset(&mut self) {
        if let Ok(mut fifo) = self.rx.lock() {
            fifo.clear();
        }
        self.scr = 0;
        self.lcr &= !LCR_DLAB;
    }

    fn dlab_set(&self) -> bool {
        self.lcr & LCR_DLAB != 0
    }

    fn rx_empty(&self) -> bool {
        self.rx.lock().map(|f| f.is_empty()).unwrap_or(true)
    }

    /// Reads RBR (pop the oldest byte, all-ones when empty) or DLL.
    fn read_rbr_or_dll(&mut self) -> u8 {
        if self.dlab_set() {
            (self.div & 0xFF) as u8
        } else {
            self.rx
                .lock()
                .ok()
                .and_then(|mut f| f.pop())
                .unwrap_or(RX_EMPTY)
        }
    }

    /// Reads IER or DLM depending on DLAB.
    fn read_ier_or_dlm(&self) -> u8 {
        if self.dlab_set() {
            (self.div >> 8) as u8
        } else {
            self.ier
        }
    }

    /// Reads IIR: receive-available beats no-pending when the receive
    /// interrupt is enabled and data is queued.
    fn read_iir(&self) -> u8 {
        let iir = if self.ier & IER_RDA != 0 && !self.rx_empty() {
            IIR_RDA
        } else {
            IIR_NO_INTERRUPT
        };
        IIR_ID_MASK | iir
    }

    /// Reads LSR: transmitter always ready, data-ready mirrors the ring.
    fn read_lsr(&self) -> u8 {
        let mut lsr = LSR_DEFAULT;
        if !self.rx_empty() {
            lsr |= LSR_DATA_READY;
        }
        lsr
    }

    /// Writes THR (queue byte for output) or DLL.
    fn write_thr_or_dll(&mut self, val: u8) {
        if self.dlab_set() {
            self.div = (self.div & 0xFF00) | u16::from(val);
        } else {
            self.tx_buffer.push(val);
            if val == b'\n' || self.tx_buffer.len() >= TX_BUFFER_FLUSH_THRESHOLD {
                self.flush_buffer();
            }
        }
    }

    /// Writes IER (receive-enable bit only) or DLM.
    fn write_ier_or_dlm(&mut self, val: u8) {
        if self.dlab_set() {
            self.div = (self.div & 0x00FF) | (u16::from(val) << 8);
        } else {
            self.ier = val & IER_RDA;
        }
    }

    /// Flushes the transmit buffer to stdout or stderr.
    fn flush_buffer(&mut self) {
        if self.tx_buffer.is_empty() {
            return;
        }
        if self.to_stderr {
            let mut out = io::stderr();
            let _ = out.write_all(&self.tx_buffer);
            let _ = out.flush();
        } else {
            let mut out = io::stdout();
            let _ = out.write_all(&self.tx_buffer);
            let _ = out.flush();
        }
        self.tx_buffer.clear();
    }
}

impl Drop for Uart {
    /// Flushes remaining output and releases the capture thread.
    fn drop(&mut self) {
        self.flush_buffer();
        self.shutdown();
    }
}

impl Device for Uart {
    /// Returns the device name.
    fn name(&self) -> &str {
        "UART0"
    }

    /// Returns the address range (Base, Size).
    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, 0x100)
    }

    /// Reads a byte register.
    fn read_u8(&mut self, offset: u64) -> u8 {
        match offset {
            REG_RBR => self.read_rbr_or_dll(),
            REG_IER => self.read_ier_or_dlm(),
            REG_IIR => self.read_iir(),
            REG_LCR => self.lcr,
            REG_MCR => self.mcr,
            REG_LSR => self.read_lsr(),
            REG_MSR => 0,
            REG_SCR => self.scr,
            _ => 0,
        }
    }

    /// Reads a word (delegates to read_u8).
    fn read_u32(&mut self, offset: u64) -> u32 {
        u32::from(self.read_u8(offset))
    }

    /// Reads a doubleword (delegates to read_u8).
    fn read_u64(&mut self, offset: u64) -> u64 {
        u64::from(self.read_u8(offset))
    }

    /// Writes a byte register.
    fn write_u8(&mut self, offset: u64, val: u8) {
        match offset {
            REG_THR => self.write_thr_or_dll(val),
            REG_IER => self.write_ier_or_dlm(val),
            REG_FCR => {}
            REG_LCR => self.lcr = val,
            REG_MCR => self.mcr = val,
            REG_SCR => self.scr = val,
            _ => {}
        }
    }

    /// Writes a word (delegates to write_u8).
    fn write_u32(&mut self, offset: u64, val: u32) {
        self.write_u8(offset, val as u8);
    }

    /// Writes a doubleword (delegates to write_u8).
    fn write_u64(&mut self, offset: u64, val: u64) {
        self.write_u8(offset, val as u8);
    }

    /// The interrupt line follows the receive ring: asserted while any
    /// byte is buffered. The per-clock edge detector lives outside.
    fn interrupt_pending(&self) -> bool {
        !self.rx_empty()
    }
}
