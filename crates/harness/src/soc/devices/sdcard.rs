//! SD/MMC Storage Controller.
//!
//! Models a simplified MMC host controller with a word-indexed register
//! file and a data-port FIFO streaming 512-byte blocks to and from a
//! backing image file. The command set and canned responses follow the
//! MMC protocol closely enough to satisfy a driver written against real
//! hardware (PIO only: no DMA, no interrupts).
//!
//! The backing image is optional. Without one the controller answers
//! commands in "no card" mode, but a data-port transfer attempted without
//! a card is a harness misconfiguration and aborts.

use crate::soc::traits::Device;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::{debug, warn};

use crate::loader;

/// Command register word index (low 6 bits select the MMC opcode).
pub const REG_CMD: usize = 0;
/// Command argument register word index.
pub const REG_ARG: usize = 1;
/// Timeout register word index (raw storage).
pub const REG_TIMEOUT: usize = 2;
/// Clock divider register word index (raw storage).
pub const REG_CDIV: usize = 3;
/// First response word index.
pub const REG_RESP0: usize = 4;
/// Second response word index.
pub const REG_RESP1: usize = 5;
/// Third response word index.
pub const REG_RESP2: usize = 6;
/// Fourth response word index.
pub const REG_RESP3: usize = 7;
/// Host status register word index.
pub const REG_STATUS: usize = 8;
/// Voltage register word index (raw storage).
pub const REG_VDD: usize = 12;
/// Extension data mode register word index (raw storage).
pub const REG_EDM: usize = 13;
/// Host configuration register word index (raw storage).
pub const REG_HCFG: usize = 14;
/// Host block count register word index (raw storage).
pub const REG_HBCT: usize = 15;
/// Data port register word index.
pub const REG_DATA: usize = 16;
/// Host block length configuration register word index (raw storage).
pub const REG_HBLC: usize = 20;

/// Number of raw register words the controller exposes. Reserved slots are
/// plain storage: drivers write then read them back.
const REG_COUNT: usize = 0x80;

/// Host status: data port has a word ready for PIO.
const HSTS_DATA_FLAG: u32 = 1 << 0;

// MMC command opcodes (protocol numbering).
const MMC_GO_IDLE_STATE: u32 = 0;
const MMC_SEND_OP_COND: u32 = 1;
const MMC_ALL_SEND_CID: u32 = 2;
const MMC_SET_RELATIVE_ADDR: u32 = 3;
const MMC_SLEEP_AWAKE: u32 = 5;
const MMC_SELECT_CARD: u32 = 7;
const MMC_SEND_EXT_CSD: u32 = 8;
const MMC_SEND_CSD: u32 = 9;
const MMC_STOP_TRANSMISSION: u32 = 12;
const MMC_SEND_STATUS: u32 = 13;
const MMC_READ_MULTIPLE_BLOCK: u32 = 18;
const MMC_SET_BLOCK_COUNT: u32 = 23;
const MMC_WRITE_MULTIPLE_BLOCK: u32 = 25;
const MMC_APP_CMD: u32 = 55;
/// SDIO probe the driver issues during identification; not an MMC command.
const SDIO_RW_DIRECT: u32 = 52;

/// Opcode field of the command register.
const CMD_OPCODE_MASK: u32 = 0x3F;

/// Advertised card capacity (16 GiB).
const CARD_CAPACITY: u64 = 16 * 1024 * 1024 * 1024;
/// CSD READ_BL_LEN field: log2 of the read block length.
const READ_BL_LEN: u32 = 15;
/// CSD C_SIZE_MULT field (3 bits).
const C_SIZE_MULT: u32 = 7;
/// Derived CSD device-size field encoding `CARD_CAPACITY`.
const C_SIZE: u32 = ((CARD_CAPACITY >> READ_BL_LEN) / (1 << (C_SIZE_MULT + 2)) - 1) as u32;

/// Transfer sector size in bytes.
const SECTOR_SIZE: u64 = 512;

/// Size of the extended CSD descriptor block streamed over the data port.
const EXT_CSD_SIZE: u32 = 512;
/// EXT_CSD byte offset of the revision field.
const EXT_CSD_REV_OFFSET: u32 = 192;
/// EXT_CSD revision value (rev 1.2, per JED84-A441 section 8.1).
const EXT_CSD_REV: u32 = 2;
/// EXT_CSD byte offset of the sector-count field.
const EXT_CSD_SEC_COUNT_OFFSET: u32 = 212;

/// SD/MMC storage controller device.
///
/// Holds the raw register file, the transfer state machine, and the
/// optional backing image file.
pub struct SdCard {
    /// Base physical address of the register window.
    base_addr: u64,
    /// Raw register file; reserved slots are preserved verbatim.
    regs: [u32; REG_COUNT],
    /// Backing image file; `None` means "no card present".
    backing: Option<File>,
    /// Sector address captured when the last transfer command was accepted.
    block_addr: u64,
    /// Requested transfer length in blocks.
    block_count: u32,
    /// Byte offset within the current transfer (resets on every transfer command).
    data_offset: u32,
    /// Direction of the current transfer.
    write_mode: bool,
    /// Data-port reads stream the synthetic EXT_CSD block while set.
    reading_ext_csd: bool,
}

impl SdCard {
    /// Creates a controller with no card bound.
    ///
    /// # Arguments
    ///
    /// * `base_addr` - The base physical address of the register window.
    pub fn new(base_addr: u64) -> Self {
        Self {
            base_addr,
            regs: [0; REG_COUNT],
            backing: None,
            block_addr: 0,
            block_count: 0,
            data_offset: 0,
            write_mode: false,
            reading_ext_csd: false,
        }
    }

    /// Binds the card image derived by filename convention from the boot
    /// image path (`<stem>-sdcard.img`). A missing image leaves the
    /// controller in "no card" mode; this is not an error.
    ///
    /// # Arguments
    ///
    /// * `boot_image_path` - Path of the primary boot image.
    pub fn bind_image(&mut self, boot_image_path: &str) {
        let Some(card_path) = loader::companion_path(boot_image_path, "-sdcard.img") else {
            return;
        };
        match OpenOptions::new().read(true).write(true).open(&card_path) {
            Ok(file) => {
                debug!(path = %card_path, "found sdcard");
                self.backing = Some(file);
            }
            Err(_) => debug!(path = %card_path, "no sdcard image, running without a card"),
        }
    }

    /// Binds an already-open backing file as the card image.
    pub fn bind_file(&mut self, file: File) {
        self.backing = Some(file);
    }

    /// Returns whether a card image is bound.
    pub fn card_present(&self) -> bool {
        self.backing.is_some()
    }

    /// Returns the transfer length captured by the last set-block-count command.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Returns the sector address of the current transfer. Only meaningful
    /// while a transfer is open.
    pub fn block_address(&self) -> u64 {
        self.block_addr
    }

    /// Returns the raw host status register.
    pub fn status(&self) -> u32 {
        self.regs[REG_STATUS]
    }

    /// Returns whether the data-ready status flag is set.
    pub fn status_data_ready(&self) -> bool {
        self.regs[REG_STATUS] & HSTS_DATA_FLAG != 0
    }

    fn set_status(&mut self, bits: u32) {
        self.regs[REG_STATUS] |= bits;
    }

    fn clear_status(&mut self, bits: u32) {
        self.regs[REG_STATUS] &= !bits;
    }

    /// Accepts a multi-block transfer command: captures the sector address
    /// from ARG, rewinds the data offset, seeks the backing file, and
    /// records the direction.
    fn prepare_transfer(&mut self, is_write: bool) {
        self.block_addr = u64::from(self.regs[REG_ARG]);
        self.data_offset = 0;
        self.write_mode = is_write;
        if let Some(file) = self.backing.as_mut() {
            if let Err(err) = file.seek(SeekFrom::Start(self.block_addr * SECTOR_SIZE)) {
                warn!(sector = self.block_addr, %err, "sdcard seek failed");
            }
        }
        self.set_status(HSTS_DATA_FLAG);
    }

    /// Dispatches the opcode written to the command register.
    fn dispatch(&mut self, cmd: u32) {
        match cmd {
            MMC_GO_IDLE_STATE => {}
            MMC_SEND_OP_COND => self.regs[REG_RESP0] = 0x80ff8000,
            MMC_ALL_SEND_CID => {
                self.regs[REG_RESP0] = 0x00000001;
                self.regs[REG_RESP1] = 0x00000000;
                self.regs[REG_RESP2] = 0x00000000;
                self.regs[REG_RESP3] = 0x15000000;
            }
            MMC_SEND_CSD => {
                self.regs[REG_RESP0] = 0x92404001;
                self.regs[REG_RESP1] = 0x124b97e3 | ((C_SIZE & 0x3) << 30);
                self.regs[REG_RESP2] = 0x0f508000 | (C_SIZE >> 2) | (READ_BL_LEN << 16);
                self.regs[REG_RESP3] = 0x9026012a;
            }
            MMC_SEND_EXT_CSD => {
                self.reading_ext_csd = true;
                self.data_offset = 0;
            }
            MMC_SLEEP_AWAKE | MMC_SET_RELATIVE_ADDR | MMC_SELECT_CARD | MMC_APP_CMD
            | SDIO_RW_DIRECT => {}
            MMC_SET_BLOCK_COUNT => self.block_count = self.regs[REG_ARG] & 0xffff,
            MMC_READ_MULTIPLE_BLOCK => self.prepare_transfer(false),
            MMC_WRITE_MULTIPLE_BLOCK => self.prepare_transfer(true),
            MMC_SEND_STATUS => {
                self.regs[REG_RESP0] = 0;
                self.regs[REG_RESP1] = 0;
                self.regs[REG_RESP2] = 0;
                self.regs[REG_RESP3] = 0;
            }
            MMC_STOP_TRANSMISSION => self.clear_status(HSTS_DATA_FLAG),
            _ => warn!(cmd, "unhandled sdcard command"),
        }
    }

    /// Synthetic EXT_CSD word at the given byte offset.
    fn ext_csd_word(offset: u32) -> u32 {
        match offset {
            EXT_CSD_REV_OFFSET => EXT_CSD_REV,
            EXT_CSD_SEC_COUNT_OFFSET => (CARD_CAPACITY / SECTOR_SIZE) as u32,
            _ => 0,
        }
    }

    /// One data-port access: streams the EXT_CSD block while armed,
    /// otherwise moves four bytes between the data register and the
    /// backing file in the recorded transfer direction.
    fn data_port_access(&mut self) -> u32 {
        if self.reading_ext_csd {
            let word = Self::ext_csd_word(self.data_offset);
            self.regs[REG_DATA] = word;
            if self.data_offset == EXT_CSD_SIZE - 4 {
                self.reading_ext_csd = false;
            }
            self.data_offset += 4;
            return word;
        }

        let Some(file) = self.backing.as_mut() else {
            panic!(
                "sdcard: data port accessed at offset {:#x} with no backing image",
                self.data_offset
            );
        };

        if self.write_mode {
            let word = self.regs[REG_DATA].to_le_bytes();
            if let Err(err) = file.write_all(&word) {
                warn!(%err, "sdcard write failed");
            }
        } else {
            let mut word = [0u8; 4];
            if let Err(err) = file.read_exact(&mut word) {
                warn!(%err, "sdcard read failed");
            }
            self.regs[REG_DATA] = u32::from_le_bytes(word);
        }
        self.data_offset += 4;
        self.regs[REG_DATA]
    }
}

impl Device for SdCard {
    /// Returns the device name.
    fn name(&self) -> &str {
        "SDCARD"
    }

    /// Returns the address range (Base, Size).
    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, (REG_COUNT * 4) as u64)
    }

    /// Reads a word from the register file.
    ///
    /// The data port performs one streaming step; every other register
    /// returns its last stored raw value.
    fn read_u32(&mut self, offset: u64) -> u32 {
        let idx = (offset >> 2) as usize % REG_COUNT;
        if idx == REG_DATA {
            self.data_port_access()
        } else {
            self.regs[idx]
        }
    }

    /// Writes a word to the register file, dispatching when the command
    /// register is the target.
    fn write_u32(&mut self, offset: u64, val: u32) {
        let idx = (offset >> 2) as usize % REG_COUNT;
        self.regs[idx] = val;
        if idx == REG_CMD {
            self.dispatch(val & CMD_OPCODE_MASK);
        }
    }

    /// Reads a byte (delegates to read_u32).
    fn read_u8(&mut self, offset: u64) -> u8 {
        (self.read_u32(offset & !3) >> ((offset & 3) * 8)) as u8
    }

    /// Reads a doubleword (delegates to read_u32).
    fn read_u64(&mut self, offset: u64) -> u64 {
        u64::from(self.read_u32(offset))
    }

    /// Writes a byte (delegates to write_u32).
    fn write_u8(&mut self, offset: u64, val: u8) {
        self.write_u32(offset & !3, u32::from(val));
    }

    /// Writes a doubleword (delegates to write_u32).
    fn write_u64(&mut self, offset: u64, val: u64) {
        self.write_u32(offset, val as u32);
    }
}
