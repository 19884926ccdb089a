/*
    applerusty: the memory-management core of an Apple //e emulator.
    Copyright (C) 2023  Rafal Michalski

    This library is free software: you can redistribute it and/or modify
    it under the terms of the GNU Lesser General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This library is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this library.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
//! **APPLERUSTY**: the core components of an Apple //e class emulator.
//!
//! This crate emulates the machine's 16-bit bank-switched address space and
//! the Input/Output Unit whose "soft switches" reshape that space in response
//! to reads and writes of the `$C000..$C0FF` page:
//!
//! * [memory] - the address-space manager: the bank catalogue, the page
//!   table routing every 256-byte page of the virtual address space, and
//!   ROM image loading;
//! * [chip] - the IOU: the soft-switch bitmap, the `$C0xx` handlers and the
//!   page-table reconfiguration they trigger;
//! * [peripherals] - the keyboard latch read through `$C000`/`$C010`.
//!
//! The CPU is not part of this crate. A MOS 6502 emulator drives the core
//! through the byte-oriented [memory::MemoryBus] interface implemented by
//! [chip::iou::Iou].
pub mod chip;
pub mod memory;
pub mod peripherals;

pub use chip::iou::Iou;
pub use chip::{MemoryAccess, SoftSwitches};
pub use memory::{Access, AddressSpace, BankId, BankVariant, MemoryBus};
pub use peripherals::{Keyboard, KeyboardInterface};
