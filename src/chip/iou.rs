/*
    Copyright (C) 2023  Rafal Michalski

    This file is part of APPLERUSTY, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
/*! An emulator of the Apple //e Input/Output Unit.

The IOU owns the [AddressSpace] and intercepts every CPU access routed to
the `$C000..$C0FF` page. The handler is selected by the high nibble of the
offset within the page:

```text
offset  read                                write
$0x     keyboard data                       set a switch from the $C00x table
$1x     switch state in bit 7;              $10: reset the keyboard strobe
        $10: keyboard latch
$5x     toggle display mode, annunciator    same as read
        or DHIRES switches
$7x     $7E/$7F: IOUDIS/DHIRES in bit 7,    $7E/$7F: IOUDIS off/on
        clears VBLINT
$8x     language card bank decode           ignored
other   0                                   ignored
```

Switch mutations do not reprogram the page table directly: every change
marks its update groups and the minimum set of reconfigurations runs once,
after the handler returns. The visible mapping after a `$C0xx` access
therefore reflects all switch mutations that access triggered.
*/
use core::mem;

use log::trace;

use crate::memory::{Access, AddressSpace, BankId, BankVariant, MemoryBus};
use crate::peripherals::{Keyboard, KeyboardInterface};
use super::{MemoryAccess, Remap, SoftSwitches};

/// Switches programmed by writes to `$C000..$C00F`; even offsets switch
/// off, odd offsets switch on.
const C00X_SWITCHES: [SoftSwitches; 8] = [
    SoftSwitches::STORE_80,
    SoftSwitches::AUX_RAM_RD,
    SoftSwitches::AUX_RAM_WRT,
    SoftSwitches::CX_ROM,
    SoftSwitches::ALT_ZP,
    SoftSwitches::C3_ROM,
    SoftSwitches::COL_80,
    SoftSwitches::ALT_CHARSET,
];

/// Switches reported in bit 7 by reads of `$C011..$C01F`.
const C01X_SWITCHES: [SoftSwitches; 15] = [
    SoftSwitches::LC_BANK_2,
    SoftSwitches::LC_RAM_RD,
    SoftSwitches::AUX_RAM_RD,
    SoftSwitches::AUX_RAM_WRT,
    SoftSwitches::CX_ROM,
    SoftSwitches::ALT_ZP,
    SoftSwitches::C3_ROM,
    SoftSwitches::STORE_80,
    SoftSwitches::VBL_INT,
    SoftSwitches::TEXT,
    SoftSwitches::MIXED,
    SoftSwitches::PAGE_2,
    SoftSwitches::HIRES,
    SoftSwitches::ALT_CHARSET,
    SoftSwitches::COL_80,
];

/// Switches toggled by accesses to `$C050..$C057`.
const C05X_SWITCHES: [SoftSwitches; 4] = [
    SoftSwitches::TEXT,
    SoftSwitches::MIXED,
    SoftSwitches::PAGE_2,
    SoftSwitches::HIRES,
];

/// The byte the display and language-card switch handlers leave on the bus.
const SWITCH_DATA: u8 = 0xA0;

/// The Apple //e IOU together with the address space it controls.
///
/// This is the complete memory core of the machine: a 6502 emulator drives
/// it through [MemoryBus] and the host reaches the underlying
/// [AddressSpace] through [MemoryAccess] for ROM loading and inspection.
pub struct Iou {
    mem: AddressSpace,
    keyboard: Keyboard,
    switches: SoftSwitches,
    pending: Remap,
}

impl Default for Iou {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAccess for Iou {
    type Memory = AddressSpace;

    #[inline(always)]
    fn memory_ref(&self) -> &Self::Memory {
        &self.mem
    }
    #[inline(always)]
    fn memory_mut(&mut self) -> &mut Self::Memory {
        &mut self.mem
    }
}

impl MemoryBus for Iou {
    #[inline(always)]
    fn load_byte(&mut self, addr: u16) -> u8 {
        Iou::load_byte(self, addr)
    }
    #[inline(always)]
    fn store_byte(&mut self, addr: u16, val: u8) {
        Iou::store_byte(self, addr, val)
    }
}

impl KeyboardInterface for Iou {
    fn is_key_down(&self) -> bool {
        self.keyboard.is_key_down()
    }
    fn key_data(&self) -> u8 {
        self.keyboard.key_data()
    }
    fn set_key(&mut self, val: u8) {
        self.keyboard.set_key(val)
    }
    fn release_key(&mut self) {
        self.keyboard.release_key()
    }
    fn reset_strobe(&mut self) {
        self.keyboard.reset_strobe()
    }
}

impl Iou {
    /// Creates the chip in its power-on state: every switch off, the
    /// address space in its power-on configuration.
    pub fn new() -> Self {
        Iou {
            mem: AddressSpace::new(),
            keyboard: Keyboard::default(),
            switches: SoftSwitches::empty(),
            pending: Remap::empty(),
        }
    }

    /// Emulates a **RESET**: clears every soft switch, restores the
    /// power-on page table and the keyboard latch. RAM and ROM contents
    /// are preserved.
    pub fn reset(&mut self) {
        self.switches = SoftSwitches::empty();
        self.pending = Remap::empty();
        self.mem.reset_mapping();
        self.keyboard.clear();
    }

    /// The current soft-switch bitmap.
    pub fn switches(&self) -> SoftSwitches {
        self.switches
    }

    /// Replaces the whole switch bitmap and reprograms the page table to
    /// match. For restoring a previously captured state.
    pub fn restore_switches(&mut self, switches: SoftSwitches) {
        self.switches = switches;
        self.pending = Remap::all();
        self.apply_pending();
    }

    /// Asserts the vertical-blank interrupt status bit.
    ///
    /// Meant for the host's video scanner; the bit is readable at `$C019`
    /// and cleared by reads of `$C07E`/`$C07F`.
    pub fn set_vbl_interrupt(&mut self) {
        self.switches.insert(SoftSwitches::VBL_INT);
    }

    /// Reads a single byte from the given address.
    ///
    /// A read of the `$C000..$C0FF` page runs the soft-switch handler and
    /// may reshape the visible memory layout before returning. A read of a
    /// page with no bank routed returns 0.
    pub fn load_byte(&mut self, addr: u16) -> u8 {
        match self.mem.read_index(addr) {
            Some(index) => {
                let offset = AddressSpace::bank_offset(index, addr);
                self.bank_read(index, offset)
            }
            None => 0
        }
    }

    /// Writes a single byte to the given address.
    ///
    /// A write of the `$C000..$C0FF` page runs the soft-switch handler. A
    /// write of a page with no bank routed, or routed to ROM, disappears.
    pub fn store_byte(&mut self, addr: u16, val: u8) {
        if let Some(index) = self.mem.write_index(addr) {
            let offset = AddressSpace::bank_offset(index, addr);
            self.bank_write(index, offset, val);
        }
    }

    /// Reads a 16-bit little-endian word starting at `addr`.
    ///
    /// When `addr` is the last byte of a page the high byte is read from
    /// `addr - 0xFF`, reproducing the 6502 indirect page-wrap quirk; both
    /// bytes come from the bank serving the low byte.
    pub fn load_address(&mut self, addr: u16) -> u16 {
        let index = match self.mem.read_index(addr) {
            Some(index) => index,
            None => return 0
        };
        let offset = AddressSpace::bank_offset(index, addr);
        let lo = self.bank_read(index, offset);
        let hi = self.bank_read(index, wrap_to_page(offset));
        u16::from_le_bytes([lo, hi])
    }

    /// Writes a 16-bit little-endian word starting at `addr`, with the
    /// same page-wrap rule as [Iou::load_address].
    pub fn store_address(&mut self, addr: u16, val: u16) {
        let index = match self.mem.write_index(addr) {
            Some(index) => index,
            None => return
        };
        let offset = AddressSpace::bank_offset(index, addr);
        let [lo, hi] = val.to_le_bytes();
        self.bank_write(index, offset, lo);
        self.bank_write(index, wrap_to_page(offset), hi);
    }

    /// Reads consecutive bytes starting at `addr` into `buf`.
    pub fn load_bytes(&mut self, addr: u16, buf: &mut [u8]) {
        for (i, p) in buf.iter_mut().enumerate() {
            *p = self.load_byte(addr.wrapping_add(i as u16));
        }
    }

    /// Writes the bytes of `buf` at consecutive addresses starting at `addr`.
    pub fn store_bytes(&mut self, addr: u16, buf: &[u8]) {
        for (i, p) in buf.iter().enumerate() {
            self.store_byte(addr.wrapping_add(i as u16), *p);
        }
    }

    /// Reads a byte without any side effects, for debuggers and monitors.
    ///
    /// The soft-switch page reads as 0.
    pub fn read_debug(&self, addr: u16) -> u8 {
        match self.mem.read_index(addr) {
            Some(index) => self.mem.bank_load(index, AddressSpace::bank_offset(index, addr)),
            None => 0
        }
    }

    #[inline]
    fn bank_read(&mut self, index: usize, offset: u16) -> u8 {
        if AddressSpace::is_io_bank(index) {
            self.read_switch(offset as u8)
        }
        else {
            self.mem.bank_load(index, offset)
        }
    }

    #[inline]
    fn bank_write(&mut self, index: usize, offset: u16, val: u8) {
        if AddressSpace::is_io_bank(index) {
            self.write_switch(offset as u8, val);
        }
        else {
            self.mem.bank_store(index, offset, val);
        }
    }

    /// The soft-switch read handler for offset `$00..$FF` within the
    /// `$C000` page. Normally reached through [Iou::load_byte] dispatch.
    pub fn read_switch(&mut self, offset: u8) -> u8 {
        let data = match offset >> 4 {
            0x0 => self.keyboard.key_data(),
            0x1 => self.read_status(offset),
            0x5 => self.access_display_switch(offset),
            0x7 => self.read_iou_lock(offset),
            0x8 => self.read_lang_card(offset),
            _ => 0
        };
        self.apply_pending();
        data
    }

    /// The soft-switch write handler. Normally reached through
    /// [Iou::store_byte] dispatch; the written value itself is irrelevant,
    /// only the address matters.
    pub fn write_switch(&mut self, offset: u8, _val: u8) {
        match offset >> 4 {
            0x0 => {
                let switch = C00X_SWITCHES[(offset >> 1) as usize & 7];
                self.set_switch(switch, offset & 1 != 0);
            }
            0x1 => if offset == 0x10 {
                self.keyboard.reset_strobe();
            },
            0x5 => {
                self.access_display_switch(offset);
            }
            0x7 => match offset {
                0x7E => self.set_switch(SoftSwitches::IOU_DIS, false),
                0x7F => self.set_switch(SoftSwitches::IOU_DIS, true),
                _ => {}
            },
            _ => {}
        }
        self.apply_pending();
    }

    /// `$C010..$C01F`: the keyboard latch and switch state in bit 7.
    fn read_status(&mut self, offset: u8) -> u8 {
        if offset == 0x10 {
            return if self.keyboard.is_key_down() {
                let data = self.keyboard.key_data();
                self.keyboard.reset_strobe();
                0x80|(data & 0x7F)
            }
            else {
                0
            };
        }
        let switch = C01X_SWITCHES[(offset & 0x0F) as usize - 1];
        if self.switches.contains(switch) { 0x80 } else { 0x00 }
    }

    /// `$C050..$C05F`: display mode, annunciator and DHIRES switches.
    /// Reads and writes are equivalent.
    fn access_display_switch(&mut self, offset: u8) -> u8 {
        let on = offset & 1 != 0;
        match offset {
            0x50..=0x57 => {
                let switch = C05X_SWITCHES[(offset >> 1) as usize & 3];
                self.set_switch(switch, on);
            }
            0x58..=0x5D => if !self.switches.contains(SoftSwitches::IOU_DIS) {
                self.set_switch(SoftSwitches::annunciator((offset >> 1) & 3), on);
            },
            0x5E|0x5F => if self.switches.contains(SoftSwitches::IOU_DIS) {
                self.set_switch(SoftSwitches::DHIRES, offset == 0x5E);
            }
            else {
                self.set_switch(SoftSwitches::ANN_3, on);
            },
            _ => unreachable!()
        }
        SWITCH_DATA
    }

    /// `$C07E`/`$C07F`: IOUDIS and DHIRES state in bit 7. Reading either
    /// acknowledges the vertical-blank interrupt.
    fn read_iou_lock(&mut self, offset: u8) -> u8 {
        let switch = match offset {
            0x7E => SoftSwitches::IOU_DIS,
            0x7F => SoftSwitches::DHIRES,
            _ => return 0
        };
        let data = if self.switches.contains(switch) { 0x80 } else { 0x00 };
        self.set_switch(SoftSwitches::VBL_INT, false);
        data
    }

    /// `$C080..$C08F`: the language card bank decode.
    ///
    /// The low nibble encodes three switches at once; bit 1 (the "z" bit)
    /// is ignored:
    ///
    /// ```text
    /// LCRAMRD  = !(bit0 ^ bit1)
    /// LCRAMWRT = bit0
    /// LCBANK2  = !bit3
    /// ```
    fn read_lang_card(&mut self, offset: u8) -> u8 {
        self.set_switch(SoftSwitches::LC_RAM_RD, (offset ^ (offset >> 1)) & 1 == 0);
        self.set_switch(SoftSwitches::LC_RAM_WRT, offset & 1 != 0);
        self.set_switch(SoftSwitches::LC_BANK_2, offset & 8 == 0);
        SWITCH_DATA
    }

    /// Sets a single switch, marking its update groups when its value
    /// actually changes. Writing the current value back never touches the
    /// page table.
    fn set_switch(&mut self, switch: SoftSwitches, on: bool) {
        if self.switches.contains(switch) != on {
            self.switches.toggle(switch);
            trace!("soft switch {:?}: {}", switch, on);
            self.pending |= SoftSwitches::remap_groups(switch);
        }
    }

    /// Applies and clears the pending page-table update groups.
    fn apply_pending(&mut self) {
        let pending = mem::take(&mut self.pending);
        if pending.is_empty() {
            return;
        }
        trace!("page table update: {:?}", pending);
        if pending.contains(Remap::ZPS_RAM) {
            self.remap_zero_stack();
        }
        if pending.contains(Remap::SYSTEM_RAM) {
            self.remap_system_ram();
        }
        if pending.contains(Remap::LC_RAM) {
            self.remap_lang_card();
        }
    }

    /// Selects the aux variant when the given switch is on.
    fn variant_for(&self, switch: SoftSwitches) -> BankVariant {
        if self.switches.contains(switch) {
            BankVariant::Aux
        }
        else {
            BankVariant::Main
        }
    }

    /// `$0000..$01FF`: zero page and stack follow ALTZP.
    fn remap_zero_stack(&mut self) {
        let variant = self.variant_for(SoftSwitches::ALT_ZP);
        self.mem.activate_bank(BankId::ZeroStackRam, variant, Access::RW).unwrap();
    }

    /// `$0200..$BFFF`: the lower RAM follows RAMRD/RAMWRT, then the
    /// display page region is overlaid on top.
    ///
    /// With 80STORE on, PAGE2 picks the main or the aux instance of
    /// display page 1 (and of hi-res page 1 when HIRES is on), hijacking
    /// that region away from RAMRD/RAMWRT. With 80STORE off, PAGE2 picks
    /// between the two main-RAM display (and hi-res) pages.
    fn remap_system_ram(&mut self) {
        let rd = self.variant_for(SoftSwitches::AUX_RAM_RD);
        let wr = self.variant_for(SoftSwitches::AUX_RAM_WRT);
        self.mem.activate_bank(BankId::MainRam, rd, Access::READ).unwrap();
        self.mem.activate_bank(BankId::MainRam, wr, Access::WRITE).unwrap();
        let page2 = self.switches.contains(SoftSwitches::PAGE_2);
        let hires = self.switches.contains(SoftSwitches::HIRES);
        if self.switches.contains(SoftSwitches::STORE_80) {
            let overlay = self.variant_for(SoftSwitches::PAGE_2);
            self.mem.activate_bank(BankId::DisplayPage1, overlay, Access::RW).unwrap();
            if hires {
                self.mem.activate_bank(BankId::HiRes1, overlay, Access::RW).unwrap();
            }
        }
        else {
            let display = if page2 { BankId::DisplayPage2 } else { BankId::DisplayPage1 };
            self.mem.activate_bank(display, BankVariant::Main, Access::RW).unwrap();
            if hires {
                let hires_bank = if page2 { BankId::HiRes2 } else { BankId::HiRes1 };
                self.mem.activate_bank(hires_bank, BankVariant::Main, Access::RW).unwrap();
            }
        }
    }

    /// `$D000..$FFFF`: ROM or language-card RAM, with the Dx region double
    /// banked. When language-card writing is off, writes are routed at the
    /// ROM bank, which drops them.
    fn remap_lang_card(&mut self) {
        let rd = self.variant_for(SoftSwitches::AUX_RAM_RD);
        let wr = self.variant_for(SoftSwitches::AUX_RAM_WRT);
        let dx_bank = if self.switches.contains(SoftSwitches::LC_BANK_2) {
            BankId::LangCardDx2Ram
        }
        else {
            BankId::LangCardDx1Ram
        };
        if self.switches.contains(SoftSwitches::LC_RAM_RD) {
            self.mem.activate_bank(BankId::LangCardEfRam, rd, Access::READ).unwrap();
            self.mem.activate_bank(dx_bank, rd, Access::READ).unwrap();
        }
        else {
            self.mem.activate_bank(BankId::SystemDefRom, BankVariant::Main, Access::READ).unwrap();
        }
        if self.switches.contains(SoftSwitches::LC_RAM_WRT) {
            self.mem.activate_bank(BankId::LangCardEfRam, wr, Access::WRITE).unwrap();
            self.mem.activate_bank(dx_bank, wr, Access::WRITE).unwrap();
        }
        else {
            self.mem.activate_bank(BankId::SystemDefRom, BankVariant::Main, Access::WRITE).unwrap();
        }
    }
}

/// The 6502 reads the high byte of a 16-bit word from the start of the
/// same page when the low byte sits at the end of it.
#[inline(always)]
fn wrap_to_page(offset: u16) -> u16 {
    if offset & 0xFF == 0xFF { offset - 0xFF } else { offset + 1 }
}
