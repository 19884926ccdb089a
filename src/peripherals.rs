/*
    Copyright (C) 2023  Rafal Michalski

    This file is part of APPLERUSTY, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Emulator components of the Apple //e peripheral devices.
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

const KEY_STROBE: u8 = 0x80;

/// An interface for feeding and probing the keyboard latch.
///
/// Implemented by [Keyboard] itself and forwarded by
/// [Iou][crate::chip::iou::Iou], so a host program can inject key strokes
/// through the chip.
pub trait KeyboardInterface {
    /// Returns `true` while a key is held down.
    fn is_key_down(&self) -> bool;
    /// Returns the latched key byte; bit 7 is the strobe.
    fn key_data(&self) -> u8;
    /// Latches a key byte with the strobe bit set and marks the key held.
    fn set_key(&mut self, val: u8);
    /// Marks the key released. The latched byte is unaffected.
    fn release_key(&mut self);
    /// Clears the strobe bit of the latched byte.
    fn reset_strobe(&mut self);
}

/// The keyboard latch.
///
/// The IOU reads the latch at `$C000`, reports and clears it at `$C010`.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Keyboard {
    keydata: u8,
    keydown: bool,
}

impl Keyboard {
    /// Empties the latch entirely.
    pub fn clear(&mut self) {
        *self = Keyboard::default();
    }
}

impl KeyboardInterface for Keyboard {
    fn is_key_down(&self) -> bool {
        self.keydown
    }

    fn key_data(&self) -> u8 {
        self.keydata
    }

    fn set_key(&mut self, val: u8) {
        self.keydata = val|KEY_STROBE;
        self.keydown = true;
    }

    fn release_key(&mut self) {
        self.keydown = false;
    }

    fn reset_strobe(&mut self) {
        self.keydata &= !KEY_STROBE;
    }
}
