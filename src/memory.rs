/*
    Copyright (C) 2023  Rafal Michalski

    This file is part of APPLERUSTY, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
/*! The address-space manager.

# Banks and pages

* The 16-bit virtual address space is partitioned into 256 pages of 256
  bytes each; the page index of an address is its high byte.
* Each page holds two independent entries: the bank serving its reads and
  the bank serving its writes. Either may be empty - the Apple bus answer
  for "no chip responded": reads return 0, writes disappear.
* Each bank is a fixed window into one of four images owned by
  [AddressSpace]: 64K main RAM, 64K auxiliary RAM, 16K system ROM and 4K
  peripheral ROM. Overlapping banks alias the same bytes; nothing is copied.

```text
        virtual                 main/aux RAM image
$0000 +--------------+        +--------------+ 0x0000
      | ZeroStackRam |        | ZeroStackRam |
$0200 +--------------+        +--------------+ 0x0200
      |              |        |              |
      |   MainRam    |        |   MainRam    |
      |              |        | (DisplayPage |
      |  (overlaid   |        |  and HiRes   |
      |   by Display |        |  windows     |
      |   and HiRes  |        |  alias into  |
      |   pages)     |        |  this range) |
$C000 +--------------+        +--------------+ 0xC000
      |  IoSwitches  |        | LangCardDx1  |
$C100 +--------------+        +--------------+ 0xD000
      | SystemCxRom  |        | LangCardDx2  |
$D000 +--------------+        +--------------+ 0xE000
      | SystemDefRom |        | LangCardEf   |
      | / LangCardDx |        |              |
$E000 +  / LangCardEf+        +--------------+ 0x10000
      |              |
$FFFF +--------------+
```

Both language-card Dx banks decode at `$D000..$DFFF`; only one is active
at a time. The mapping of every page is reprogrammed at run time by the
IOU through [AddressSpace::activate_bank] and
[AddressSpace::deactivate_bank].
*/
use core::fmt;
use std::io::{self, Read};

use bitflags::bitflags;
use log::debug;

#[cfg(feature = "snapshot")]
use core::convert::TryFrom;
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

mod banks;

pub use banks::{BankId, BankVariant};
use banks::{Backing, BankRole, BANK_DEFS, assert_catalogue_invariants, bank_index};

/// The size of each of the two RAM images.
pub const RAM_SIZE: usize = 0x1_0000;
/// The size of the system ROM image.
pub const SYSTEM_ROM_SIZE: usize = 0x4000;
/// The size of the peripheral ROM image.
pub const PERIPHERAL_ROM_SIZE: usize = 0x1000;
/// The size of a single page of the virtual address space.
pub const PAGE_SIZE: usize = 0x100;

const NUM_PAGES: usize = 256;

#[derive(Debug)]
pub enum MemoryError {
    /// The requested bank does not exist in the requested variant.
    InvalidBankVariant,
    Io(io::Error)
}

impl std::error::Error for MemoryError {}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            MemoryError::InvalidBankVariant => "No such variant of the memory bank",
            MemoryError::Io(err) => return err.fmt(f)
        })
    }
}

impl From<MemoryError> for io::Error {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::Io(err) => err,
            e => io::Error::new(io::ErrorKind::InvalidInput, e)
        }
    }
}

/// A type returned by some of [AddressSpace] methods.
pub type Result<T> = core::result::Result<T, MemoryError>;

bitflags! {
    /// A memory access type mask.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(try_from = "u8", into = "u8"))]
    #[derive(Default)]
    pub struct Access: u8 {
        const READ  = 0b01;
        const WRITE = 0b10;
        const RW    = 0b11;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU8AccessError(pub u8);

impl std::error::Error for TryFromU8AccessError {}

impl fmt::Display for TryFromU8AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer (0x{:x}) contains extraneous bits for `Access`", self.0)
    }
}

#[cfg(feature = "snapshot")]
impl TryFrom<u8> for Access {
    type Error = TryFromU8AccessError;
    fn try_from(access: u8) -> core::result::Result<Self, Self::Error> {
        Access::from_bits(access).ok_or(TryFromU8AccessError(access))
    }
}

#[cfg(feature = "snapshot")]
impl From<Access> for u8 {
    fn from(access: Access) -> u8 {
        access.bits()
    }
}

/// A byte-oriented memory interface, as seen by a MOS 6502 class CPU
/// emulator.
///
/// This is the only interface the CPU collaborator requires of the core.
/// [Iou][crate::chip::iou::Iou] implements it.
pub trait MemoryBus {
    /// Reads a single byte from the given address.
    fn load_byte(&mut self, addr: u16) -> u8;
    /// Writes a single byte to the given address.
    fn store_byte(&mut self, addr: u16, val: u8);
}

/// One page of the virtual address space: which bank serves reads and
/// which serves writes. Entries index into the bank catalogue.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
struct PageEntry {
    read: Option<u8>,
    write: Option<u8>,
}

/// The address-space manager.
///
/// Owns the physical memory images and the page table routing every CPU
/// access. The page table is reprogrammed through [AddressSpace::activate_bank]
/// and [AddressSpace::deactivate_bank]; byte-level CPU access is driven by
/// the IOU which owns this struct.
pub struct AddressSpace {
    main_ram: Box<[u8; RAM_SIZE]>,
    aux_ram: Box<[u8; RAM_SIZE]>,
    system_rom: Box<[u8; SYSTEM_ROM_SIZE]>,
    peripheral_rom: Box<[u8; PERIPHERAL_ROM_SIZE]>,
    pages: [PageEntry; NUM_PAGES],
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace {
    /// Creates the address space with all images zeroed and the power-on
    /// bank configuration in place: main zero page and stack, main lower
    /// RAM, main display page 1, the system ROMs for reads and the I/O
    /// switch page.
    pub fn new() -> Self {
        assert_catalogue_invariants();
        let mut mem = AddressSpace {
            main_ram: Box::new([0; RAM_SIZE]),
            aux_ram: Box::new([0; RAM_SIZE]),
            system_rom: Box::new([0; SYSTEM_ROM_SIZE]),
            peripheral_rom: Box::new([0; PERIPHERAL_ROM_SIZE]),
            pages: [PageEntry::default(); NUM_PAGES],
        };
        mem.reset_mapping();
        mem
    }

    /// Restores the power-on page table.
    pub(crate) fn reset_mapping(&mut self) {
        self.pages = [PageEntry::default(); NUM_PAGES];
        for &(id, access) in &[
            (BankId::ZeroStackRam, Access::RW),
            (BankId::MainRam,      Access::RW),
            (BankId::DisplayPage1, Access::RW),
            (BankId::SystemCxRom,  Access::READ),
            (BankId::SystemDefRom, Access::READ),
            (BankId::IoSwitches,   Access::RW),
        ] {
            let index = bank_index(id, BankVariant::Main).unwrap();
            self.activate_index(index, access);
        }
    }

    /// Routes the pages covered by the bank to the bank, for the access
    /// types given. Pages outside the bank's range are not touched.
    ///
    /// Activating an already active bank is an observable no-op.
    pub fn activate_bank(&mut self, id: BankId, variant: BankVariant, access: Access) -> Result<()> {
        let index = bank_index(id, variant).ok_or(MemoryError::InvalidBankVariant)?;
        self.activate_index(index, access);
        Ok(())
    }

    /// Clears the read and/or write entries of the pages covered by the
    /// bank, but only where they still point at this bank. A bank that has
    /// since been replaced by another activation is left alone.
    pub fn deactivate_bank(&mut self, id: BankId, variant: BankVariant, access: Access) -> Result<()> {
        let index = bank_index(id, variant).ok_or(MemoryError::InvalidBankVariant)?;
        self.deactivate_index(index, access);
        Ok(())
    }

    /// Which access types this bank presently serves.
    pub fn bank_access(&self, id: BankId, variant: BankVariant) -> Result<Access> {
        let index = bank_index(id, variant).ok_or(MemoryError::InvalidBankVariant)?;
        Ok(self.index_access(index))
    }

    pub(crate) fn activate_index(&mut self, index: usize, access: Access) {
        let bank = index as u8;
        for page in BANK_DEFS[index].page_range() {
            let entry = &mut self.pages[page];
            if access.contains(Access::READ) {
                entry.read = Some(bank);
            }
            if access.contains(Access::WRITE) {
                entry.write = Some(bank);
            }
        }
    }

    pub(crate) fn deactivate_index(&mut self, index: usize, access: Access) {
        let bank = index as u8;
        for page in BANK_DEFS[index].page_range() {
            let entry = &mut self.pages[page];
            if access.contains(Access::READ) && entry.read == Some(bank) {
                entry.read = None;
            }
            if access.contains(Access::WRITE) && entry.write == Some(bank) {
                entry.write = None;
            }
        }
    }

    /// Banks are mapped and unmapped wholesale, so sampling the bank's
    /// first page is representative of its whole range.
    pub(crate) fn index_access(&self, index: usize) -> Access {
        let entry = &self.pages[(BANK_DEFS[index].base >> 8) as usize];
        let mut access = Access::empty();
        if entry.read == Some(index as u8) {
            access |= Access::READ;
        }
        if entry.write == Some(index as u8) {
            access |= Access::WRITE;
        }
        access
    }

    /// The bank currently serving reads of the page containing `addr`.
    #[inline(always)]
    pub(crate) fn read_index(&self, addr: u16) -> Option<usize> {
        self.pages[(addr >> 8) as usize].read.map(usize::from)
    }

    /// The bank currently serving writes of the page containing `addr`.
    #[inline(always)]
    pub(crate) fn write_index(&self, addr: u16) -> Option<usize> {
        self.pages[(addr >> 8) as usize].write.map(usize::from)
    }

    /// The offset of `addr` within the bank. `addr` must lie within the
    /// bank's virtual range.
    #[inline(always)]
    pub(crate) fn bank_offset(index: usize, addr: u16) -> u16 {
        addr - BANK_DEFS[index].base
    }

    #[inline(always)]
    pub(crate) fn is_io_bank(index: usize) -> bool {
        BANK_DEFS[index].role == BankRole::Io
    }

    /// Reads a byte at the given offset within the bank. A bank with no
    /// backing storage reads as 0.
    #[inline]
    pub(crate) fn bank_load(&self, index: usize, offset: u16) -> u8 {
        let def = &BANK_DEFS[index];
        match def.backing {
            Some(backing) => self.image_ref(backing)[def.phys + offset as usize],
            None => 0
        }
    }

    /// Writes a byte at the given offset within the bank. Stores into ROM
    /// banks and banks with no backing storage are ignored.
    #[inline]
    pub(crate) fn bank_store(&mut self, index: usize, offset: u16, val: u8) {
        let def = &BANK_DEFS[index];
        match def.backing {
            Some(backing) if def.role != BankRole::Rom => {
                self.image_mut(backing)[def.phys + offset as usize] = val;
            }
            _ => {}
        }
    }

    fn image_ref(&self, backing: Backing) -> &[u8] {
        match backing {
            Backing::Main => &self.main_ram[..],
            Backing::Aux => &self.aux_ram[..],
            Backing::SystemRom => &self.system_rom[..],
            Backing::PeripheralRom => &self.peripheral_rom[..],
        }
    }

    fn image_mut(&mut self, backing: Backing) -> &mut [u8] {
        match backing {
            Backing::Main => &mut self.main_ram[..],
            Backing::Aux => &mut self.aux_ram[..],
            Backing::SystemRom => &mut self.system_rom[..],
            Backing::PeripheralRom => &mut self.peripheral_rom[..],
        }
    }

    /// Fills the 16K system ROM image from a reader.
    ///
    /// Bytes `0x0100..0x0FFF` of the image serve [BankId::SystemCxRom] at
    /// `$C100` and bytes `0x1000..0x3FFF` serve [BankId::SystemDefRom] at
    /// `$D000`. Results in an error when the reader holds less than the
    /// image size.
    pub fn load_system_rom<R: Read>(&mut self, mut rd: R) -> Result<()> {
        rd.read_exact(self.system_rom.as_mut()).map_err(MemoryError::Io)?;
        debug!("system rom: {} bytes loaded", SYSTEM_ROM_SIZE);
        Ok(())
    }

    /// Fills the 4K peripheral ROM image from a reader.
    ///
    /// Slot `n`'s page at `$Cn00` serves from bytes `n*0x100..n*0x100+0xFF`
    /// and the expansion ROM at `$C800` from bytes `0x0800..0x0FFF`.
    pub fn load_peripheral_rom<R: Read>(&mut self, mut rd: R) -> Result<()> {
        rd.read_exact(self.peripheral_rom.as_mut()).map_err(MemoryError::Io)?;
        debug!("peripheral rom: {} bytes loaded", PERIPHERAL_ROM_SIZE);
        Ok(())
    }

    /// Provides a view into the whole main RAM image.
    pub fn main_ram_ref(&self) -> &[u8] {
        &self.main_ram[..]
    }

    /// Provides a mutable view into the whole main RAM image.
    pub fn main_ram_mut(&mut self) -> &mut [u8] {
        &mut self.main_ram[..]
    }

    /// Provides a view into the whole auxiliary RAM image.
    pub fn aux_ram_ref(&self) -> &[u8] {
        &self.aux_ram[..]
    }

    /// Provides a mutable view into the whole auxiliary RAM image.
    pub fn aux_ram_mut(&mut self) -> &mut [u8] {
        &mut self.aux_ram[..]
    }

    #[cfg(test)]
    fn pages_snapshot(&self) -> Vec<PageEntry> {
        self.pages.to_vec()
    }
}
