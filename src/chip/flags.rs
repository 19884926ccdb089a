/*
    Copyright (C) 2023  Rafal Michalski

    This file is part of APPLERUSTY, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
use core::fmt;

#[cfg(feature = "snapshot")]
use core::convert::TryFrom;
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use bitflags::bitflags;

bitflags! {
    /// The IOU soft-switch bitmap.
    ///
    /// Every switch holds a single bit; a switch has no data value, only
    /// an on/off state. All switches are off at power-on and after a reset.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(try_from = "u32", into = "u32"))]
    #[derive(Default)]
    pub struct SoftSwitches: u32 {
        /// Reads of `$0200..$BFFF` come from auxiliary RAM.
        const AUX_RAM_RD  = 0x0000_0001;
        /// Writes of `$0200..$BFFF` go to auxiliary RAM.
        const AUX_RAM_WRT = 0x0000_0002;
        /// The alternate character set is selected.
        const ALT_CHARSET = 0x0000_0004;
        /// Text display mode.
        const TEXT        = 0x0000_0008;
        /// Mixed text and graphics display mode.
        const MIXED       = 0x0000_0010;
        /// 80-column display mode.
        const COL_80      = 0x0000_0020;
        /// The display page region follows PAGE_2 instead of RAMRD/RAMWRT.
        const STORE_80    = 0x0000_0040;
        /// Display page 2 selected.
        const PAGE_2      = 0x0000_0080;
        /// Hi-res graphics enabled.
        const HIRES       = 0x0000_0100;
        /// Double hi-res graphics enabled.
        const DHIRES      = 0x0000_0200;
        /// `$C058..$C05F` act as DHIRES controls, annunciators are locked.
        const IOU_DIS     = 0x0000_0400;
        /// The auxiliary zero page and stack are switched in.
        const ALT_ZP      = 0x0000_0800;
        /// Reads of `$D000..$FFFF` come from language-card RAM.
        const LC_RAM_RD   = 0x0000_1000;
        /// Writes of `$D000..$FFFF` go to language-card RAM.
        const LC_RAM_WRT  = 0x0000_2000;
        /// Language-card Dx bank 2 selected instead of bank 1.
        const LC_BANK_2   = 0x0000_4000;
        /// Peripheral slot ROM selected over the internal Cx ROM.
        const CX_ROM      = 0x0000_8000;
        /// Slot 3 ROM selected.
        const C3_ROM      = 0x0001_0000;
        /// Vertical-blank interrupt status.
        const VBL_INT     = 0x0002_0000;
        const ANN_0       = 0x0004_0000;
        const ANN_1       = 0x0008_0000;
        const ANN_2       = 0x0010_0000;
        const ANN_3       = 0x0020_0000;
    }
}

bitflags! {
    /// Pending page-table update groups.
    ///
    /// Flipping a soft switch marks the update groups it affects; the IOU
    /// applies the marked reconfigurations once per `$C0xx` access, after
    /// the handler returns.
    #[derive(Default)]
    pub struct Remap: u8 {
        /// `$0200..$BFFF` routing with display and hi-res overlays.
        const SYSTEM_RAM = 0b001;
        /// `$0000..$01FF` zero page and stack routing.
        const ZPS_RAM    = 0b010;
        /// `$D000..$FFFF` language-card routing.
        const LC_RAM     = 0b100;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU32SoftSwitchesError(pub u32);

impl std::error::Error for TryFromU32SoftSwitchesError {}

impl fmt::Display for TryFromU32SoftSwitchesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer (0x{:x}) contains extraneous bits for `SoftSwitches`", self.0)
    }
}

#[cfg(feature = "snapshot")]
impl TryFrom<u32> for SoftSwitches {
    type Error = TryFromU32SoftSwitchesError;
    fn try_from(switches: u32) -> core::result::Result<Self, Self::Error> {
        SoftSwitches::from_bits(switches).ok_or(TryFromU32SoftSwitchesError(switches))
    }
}

#[cfg(feature = "snapshot")]
impl From<SoftSwitches> for u32 {
    fn from(switches: SoftSwitches) -> u32 {
        switches.bits()
    }
}

impl SoftSwitches {
    /// The annunciator switch with the given index, 0 to 3.
    pub fn annunciator(index: u8) -> SoftSwitches {
        SoftSwitches::from_bits_truncate(SoftSwitches::ANN_0.bits() << (index & 3))
    }

    /// Returns the page-table update groups affected by a change of any of
    /// the `changed` switches.
    ///
    /// This is the canonical encoding of which reconfiguration procedures
    /// a switch change requires. Most switches affect none: they are state
    /// the display or a peripheral layer samples, not memory routing.
    pub fn remap_groups(changed: SoftSwitches) -> Remap {
        let mut groups = Remap::empty();
        if changed.intersects(SoftSwitches::AUX_RAM_RD|SoftSwitches::AUX_RAM_WRT) {
            groups |= Remap::SYSTEM_RAM|Remap::LC_RAM;
        }
        if changed.intersects(SoftSwitches::STORE_80|SoftSwitches::PAGE_2|SoftSwitches::HIRES) {
            groups |= Remap::SYSTEM_RAM;
        }
        if changed.intersects(SoftSwitches::ALT_ZP) {
            groups |= Remap::ZPS_RAM;
        }
        if changed.intersects(SoftSwitches::LC_RAM_RD|SoftSwitches::LC_RAM_WRT|SoftSwitches::LC_BANK_2) {
            groups |= Remap::LC_RAM;
        }
        groups
    }
}
