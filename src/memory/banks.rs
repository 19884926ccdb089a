/*
    Copyright (C) 2023  Rafal Michalski

    This file is part of APPLERUSTY, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The static catalogue of memory banks.
//!
//! Every region of physical memory that can back some part of the virtual
//! address space is described here as a [BankDef]: a virtual base address,
//! a size, and a `(backing buffer, physical offset)` pair designating a
//! slice of one of the four images owned by
//! [AddressSpace][super::AddressSpace]. Banks never own memory and banks
//! backed by overlapping physical ranges alias the same bytes.
use core::ops::Range;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use super::{PERIPHERAL_ROM_SIZE, RAM_SIZE, SYSTEM_ROM_SIZE};

/// A symbolic identifier of a switchable memory bank.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BankId {
    /// `$C100..$CFFF` system ROM (internal Cx ROM).
    SystemCxRom,
    /// `$D000..$FFFF` system ROM (D, E and F pages).
    SystemDefRom,
    /// `$0000..$01FF` zero page and stack RAM.
    ZeroStackRam,
    /// `$0200..$BFFF` lower 48K RAM.
    MainRam,
    /// `$D000..$DFFF` language card Dx RAM, bank 1.
    LangCardDx1Ram,
    /// `$D000..$DFFF` language card Dx RAM, bank 2.
    LangCardDx2Ram,
    /// `$E000..$FFFF` language card EF RAM.
    LangCardEfRam,
    /// `$0400..$07FF` text and lo-res display page 1.
    DisplayPage1,
    /// `$0800..$0BFF` text and lo-res display page 2 (main RAM only).
    DisplayPage2,
    /// `$2000..$3FFF` hi-res display page 1.
    HiRes1,
    /// `$4000..$5FFF` hi-res display page 2 (main RAM only).
    HiRes2,
    /// `$C000..$C0FF` IOU soft-switch page.
    IoSwitches,
    /// `$C100..$C7FF` peripheral slot ROM.
    SlotRom,
    /// `$C800..$CFFF` peripheral expansion ROM.
    ExpansionRom,
}

/// Selects between the main and the auxiliary instance of a bank.
///
/// Banks that exist in a single instance (the ROM banks, the I/O switch
/// page, [BankId::DisplayPage2] and [BankId::HiRes2]) only accept
/// [BankVariant::Main].
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BankVariant {
    Main,
    Aux,
}

/// Which of the four images owned by the address space backs a bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Backing {
    Main,
    Aux,
    SystemRom,
    PeripheralRom,
}

/// The behavior of a bank under byte load and store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BankRole {
    /// Loads return, stores write.
    Ram,
    /// Loads return, stores are ignored.
    Rom,
    /// RAM observably; kept distinct so a video scanner can hook writes.
    Display,
    /// RAM observably; kept distinct so a video scanner can hook writes.
    HiRes,
    /// Loads and stores are IOU soft-switch accesses.
    Io,
}

/// A single catalogue entry.
#[derive(Debug)]
pub(crate) struct BankDef {
    pub id: BankId,
    pub variant: BankVariant,
    /// Virtual base address; always page aligned.
    pub base: u16,
    /// Size in bytes; a non-zero multiple of the page size.
    pub size: u16,
    /// Offset of the bank's first byte within its backing image.
    pub phys: usize,
    pub backing: Option<Backing>,
    pub role: BankRole,
}

impl BankDef {
    const fn new(
            id: BankId,
            variant: BankVariant,
            base: u16,
            size: u16,
            phys: usize,
            backing: Option<Backing>,
            role: BankRole
        ) -> Self
    {
        BankDef { id, variant, base, size, phys, backing, role }
    }

    /// The range of page-table indices covered by this bank.
    pub fn page_range(&self) -> Range<usize> {
        let p0 = (self.base >> 8) as usize;
        p0..p0 + (self.size >> 8) as usize
    }
}

use self::{BankId::*, BankRole::*, BankVariant::*};

/// All the banks there are. Page-table entries index into this table.
///
/// The physical placement of the RAM banks mirrors their virtual placement
/// with one exception: the two language-card Dx banks both decode at
/// `$D000` and occupy physical `0xC000..0xD000` (bank 1) and
/// `0xD000..0xE000` (bank 2) of their RAM image.
pub(crate) const BANK_DEFS: [BankDef; 21] = [
    BankDef::new(SystemCxRom,   Main, 0xC100, 0x0F00, 0x0100, Some(Backing::SystemRom), Rom),
    BankDef::new(SystemDefRom,  Main, 0xD000, 0x3000, 0x1000, Some(Backing::SystemRom), Rom),
    BankDef::new(ZeroStackRam,  Main, 0x0000, 0x0200, 0x0000, Some(Backing::Main), Ram),
    BankDef::new(MainRam,       Main, 0x0200, 0xBE00, 0x0200, Some(Backing::Main), Ram),
    BankDef::new(LangCardDx1Ram, Main, 0xD000, 0x1000, 0xC000, Some(Backing::Main), Ram),
    BankDef::new(LangCardDx2Ram, Main, 0xD000, 0x1000, 0xD000, Some(Backing::Main), Ram),
    BankDef::new(LangCardEfRam, Main, 0xE000, 0x2000, 0xE000, Some(Backing::Main), Ram),
    BankDef::new(DisplayPage1,  Main, 0x0400, 0x0400, 0x0400, Some(Backing::Main), Display),
    BankDef::new(DisplayPage2,  Main, 0x0800, 0x0400, 0x0800, Some(Backing::Main), Display),
    BankDef::new(HiRes1,        Main, 0x2000, 0x2000, 0x2000, Some(Backing::Main), HiRes),
    BankDef::new(HiRes2,        Main, 0x4000, 0x2000, 0x4000, Some(Backing::Main), HiRes),
    BankDef::new(ZeroStackRam,  Aux,  0x0000, 0x0200, 0x0000, Some(Backing::Aux), Ram),
    BankDef::new(MainRam,       Aux,  0x0200, 0xBE00, 0x0200, Some(Backing::Aux), Ram),
    BankDef::new(LangCardDx1Ram, Aux, 0xD000, 0x1000, 0xC000, Some(Backing::Aux), Ram),
    BankDef::new(LangCardDx2Ram, Aux, 0xD000, 0x1000, 0xD000, Some(Backing::Aux), Ram),
    BankDef::new(LangCardEfRam, Aux,  0xE000, 0x2000, 0xE000, Some(Backing::Aux), Ram),
    BankDef::new(DisplayPage1,  Aux,  0x0400, 0x0400, 0x0400, Some(Backing::Aux), Display),
    BankDef::new(HiRes1,        Aux,  0x2000, 0x2000, 0x2000, Some(Backing::Aux), HiRes),
    BankDef::new(IoSwitches,    Main, 0xC000, 0x0100, 0x0000, None, Io),
    BankDef::new(SlotRom,       Main, 0xC100, 0x0700, 0x0100, Some(Backing::PeripheralRom), Rom),
    BankDef::new(ExpansionRom,  Main, 0xC800, 0x0800, 0x0800, Some(Backing::PeripheralRom), Rom),
];

/// Resolves a `(id, variant)` pair to an index into [BANK_DEFS].
///
/// Returns `None` for a variant the catalogue does not provide.
pub(crate) fn bank_index(id: BankId, variant: BankVariant) -> Option<usize> {
    BANK_DEFS.iter().position(|def| def.id == id && def.variant == variant)
}

impl Backing {
    const fn image_size(self) -> usize {
        match self {
            Backing::Main|Backing::Aux => RAM_SIZE,
            Backing::SystemRom => SYSTEM_ROM_SIZE,
            Backing::PeripheralRom => PERIPHERAL_ROM_SIZE,
        }
    }
}

/// Panics when the static catalogue violates the bank invariants.
///
/// A violation can't arise from runtime input; this runs once during
/// construction as a bring-up check.
pub(crate) fn assert_catalogue_invariants() {
    for def in BANK_DEFS.iter() {
        assert!(def.size != 0 && def.size & 0xFF == 0,
                "bank {:?} size must be a non-zero multiple of 256", def.id);
        assert!(def.base & 0xFF == 0, "bank {:?} base must be page aligned", def.id);
        assert!(def.base as usize + def.size as usize <= 0x1_0000,
                "bank {:?} exceeds the address space", def.id);
        if let Some(backing) = def.backing {
            assert!(def.phys + def.size as usize <= backing.image_size(),
                    "bank {:?} exceeds its backing image", def.id);
        }
    }
}
