//! Regression tests of the Apple //e bank-switching behavior: the language
//! card truth table, the auxiliary-memory switches and the 80STORE overlay.
use rand::prelude::*;

use applerusty::{Access, BankId, BankVariant, Iou, MemoryAccess};

const R: Access = Access::READ;
const W: Access = Access::WRITE;
const RW: Access = Access::RW;
const NONE: Access = Access::empty();

fn lang_card_access(iou: &Iou) -> (Access, Access, Access, Access) {
    let mem = iou.memory_ref();
    (mem.bank_access(BankId::LangCardEfRam, BankVariant::Main).unwrap(),
     mem.bank_access(BankId::LangCardDx1Ram, BankVariant::Main).unwrap(),
     mem.bank_access(BankId::LangCardDx2Ram, BankVariant::Main).unwrap(),
     mem.bank_access(BankId::SystemDefRom, BankVariant::Main).unwrap())
}

/// Every bank's access state, for whole-table comparisons.
fn access_map(iou: &Iou) -> Vec<Access> {
    use BankId::*;
    use BankVariant::*;
    let mem = iou.memory_ref();
    [(SystemCxRom, Main), (SystemDefRom, Main), (IoSwitches, Main),
     (SlotRom, Main), (ExpansionRom, Main), (DisplayPage2, Main), (HiRes2, Main),
     (ZeroStackRam, Main), (MainRam, Main), (LangCardDx1Ram, Main),
     (LangCardDx2Ram, Main), (LangCardEfRam, Main), (DisplayPage1, Main), (HiRes1, Main),
     (ZeroStackRam, Aux), (MainRam, Aux), (LangCardDx1Ram, Aux),
     (LangCardDx2Ram, Aux), (LangCardEfRam, Aux), (DisplayPage1, Aux), (HiRes1, Aux)]
        .iter()
        .map(|&(id, variant)| mem.bank_access(id, variant).unwrap())
        .collect()
}

#[test]
fn language_card_truth_table() {
    let cases: [(u16, Access, Access, Access, Access); 16] = [
        (0xC080, R,    NONE, R,    W),
        (0xC081, W,    NONE, W,    R),
        (0xC082, NONE, NONE, NONE, RW),
        (0xC083, RW,   NONE, RW,   NONE),
        (0xC084, R,    NONE, R,    W),
        (0xC085, W,    NONE, W,    R),
        (0xC086, NONE, NONE, NONE, RW),
        (0xC087, RW,   NONE, RW,   NONE),
        (0xC088, R,    R,    NONE, W),
        (0xC089, W,    W,    NONE, R),
        (0xC08A, NONE, NONE, NONE, RW),
        (0xC08B, RW,   RW,   NONE, NONE),
        (0xC08C, R,    R,    NONE, W),
        (0xC08D, W,    W,    NONE, R),
        (0xC08E, NONE, NONE, NONE, RW),
        (0xC08F, RW,   RW,   NONE, NONE),
    ];
    let mut iou = Iou::new();
    for &(addr, efram, dx1, dx2, defrom) in cases.iter() {
        assert_eq!(iou.load_byte(addr), 0xA0);
        let (got_ef, got_dx1, got_dx2, got_def) = lang_card_access(&iou);
        assert_eq!(got_ef, efram, "EFRAM after ${:04X}", addr);
        assert_eq!(got_dx1, dx1, "DX1RAM after ${:04X}", addr);
        assert_eq!(got_dx2, dx2, "DX2RAM after ${:04X}", addr);
        assert_eq!(got_def, defrom, "DEFROM after ${:04X}", addr);
    }
}

#[test]
fn language_card_ram_survives_bank_round_trip() {
    let mut iou = Iou::new();
    iou.load_byte(0xC083); // bank 2, read and write RAM
    iou.store_byte(0xD000, 0x21);
    iou.store_byte(0xFFFF, 0x42);
    assert_eq!(iou.load_byte(0xD000), 0x21);
    assert_eq!(iou.load_byte(0xFFFF), 0x42);
    iou.load_byte(0xC08B); // bank 1
    assert_eq!(iou.load_byte(0xD000), 0, "bank 1 is distinct storage");
    assert_eq!(iou.load_byte(0xFFFF), 0x42, "the EF region is shared by both Dx banks");
    iou.load_byte(0xC082); // back to ROM, writes dropped
    iou.store_byte(0xD000, 0xFF);
    iou.load_byte(0xC083);
    assert_eq!(iou.load_byte(0xD000), 0x21, "RAM kept its contents while ROM was in");
}

#[test]
fn switch_write_read_round_trip() {
    let cases: [(u16, u16, bool); 14] = [
        (0xC002, 0xC013, false), (0xC003, 0xC013, true),
        (0xC004, 0xC014, false), (0xC005, 0xC014, true),
        (0xC006, 0xC015, false), (0xC007, 0xC015, true),
        (0xC008, 0xC016, false), (0xC009, 0xC016, true),
        (0xC00A, 0xC017, false), (0xC00B, 0xC017, true),
        (0xC00C, 0xC01F, false), (0xC00D, 0xC01F, true),
        (0xC00E, 0xC01E, false), (0xC00F, 0xC01E, true),
    ];
    let mut iou = Iou::new();
    for &(write_addr, read_addr, expected) in cases.iter() {
        iou.store_byte(write_addr, 0);
        let expected = if expected { 0x80 } else { 0x00 };
        assert_eq!(iou.load_byte(read_addr), expected,
                   "${:04X} after a write of ${:04X}", read_addr, write_addr);
    }
}

#[test]
fn display_switches_report_through_c01x() {
    let mut iou = Iou::new();
    for &(set_addr, clear_addr, read_addr) in [
        (0xC051u16, 0xC050u16, 0xC01Au16), // TEXT
        (0xC053, 0xC052, 0xC01B),          // MIXED
        (0xC055, 0xC054, 0xC01C),          // PAGE2
        (0xC057, 0xC056, 0xC01D),          // HIRES
    ].iter() {
        assert_eq!(iou.load_byte(set_addr), 0xA0);
        assert_eq!(iou.load_byte(read_addr), 0x80);
        iou.load_byte(clear_addr);
        assert_eq!(iou.load_byte(read_addr), 0x00);
    }
}

#[test]
fn aux_ram_read_visibility() {
    let mut iou = Iou::new();
    iou.store_byte(0x2000, 0xAA);
    iou.store_byte(0xC003, 0); // AUXRAMRD on
    assert_eq!(iou.load_byte(0x2000), 0x00, "aux RAM starts zeroed");
    iou.store_byte(0xC002, 0); // AUXRAMRD off
    assert_eq!(iou.load_byte(0x2000), 0xAA);
}

#[test]
fn aux_ram_write_routing() {
    let mut iou = Iou::new();
    iou.store_byte(0xC005, 0); // AUXRAMWRT on
    iou.store_byte(0x1000, 0x3C);
    assert_eq!(iou.load_byte(0x1000), 0x00, "reads still come from main");
    assert_eq!(iou.memory_ref().aux_ram_ref()[0x1000], 0x3C);
    iou.store_byte(0xC003, 0); // AUXRAMRD on as well
    assert_eq!(iou.load_byte(0x1000), 0x3C);
}

#[test]
fn store_80_overlay_follows_page2() {
    let mut iou = Iou::new();
    iou.store_byte(0xC001, 0); // 80STORE on
    iou.load_byte(0xC055);     // PAGE2 on
    iou.store_byte(0x0500, 0x66);
    assert_eq!(iou.memory_ref().aux_ram_ref()[0x0500], 0x66,
               "with 80STORE and PAGE2 the text page writes land in aux");
    assert_eq!(iou.memory_ref().main_ram_ref()[0x0500], 0x00);
    iou.load_byte(0xC054);     // PAGE2 off
    iou.store_byte(0x0500, 0x77);
    assert_eq!(iou.memory_ref().main_ram_ref()[0x0500], 0x77);
    assert_eq!(iou.memory_ref().aux_ram_ref()[0x0500], 0x66);
}

#[test]
fn store_80_overlay_ignores_aux_ram_wrt() {
    let mut iou = Iou::new();
    iou.store_byte(0xC001, 0); // 80STORE on
    iou.load_byte(0xC055);     // PAGE2 on
    iou.store_byte(0xC004, 0); // AUXRAMWRT off, explicitly
    iou.store_byte(0x0400, 0x11);
    assert_eq!(iou.memory_ref().aux_ram_ref()[0x0400], 0x11);
    iou.load_byte(0xC054);     // PAGE2 off
    iou.store_byte(0xC005, 0); // AUXRAMWRT on
    iou.store_byte(0x0401, 0x22);
    assert_eq!(iou.memory_ref().main_ram_ref()[0x0401], 0x22,
               "with 80STORE the text page ignores AUXRAMWRT");
}

#[test]
fn store_80_hires_overlay() {
    let mut iou = Iou::new();
    iou.store_byte(0xC001, 0); // 80STORE on
    iou.load_byte(0xC057);     // HIRES on
    iou.load_byte(0xC055);     // PAGE2 on
    iou.store_byte(0x2100, 0x5D);
    assert_eq!(iou.memory_ref().aux_ram_ref()[0x2100], 0x5D);
    iou.load_byte(0xC054);     // PAGE2 off
    iou.store_byte(0x2100, 0x6E);
    assert_eq!(iou.memory_ref().main_ram_ref()[0x2100], 0x6E);
}

#[test]
fn page2_without_store_80_selects_display_page_2() {
    let mut iou = Iou::new();
    iou.load_byte(0xC055); // PAGE2 on, 80STORE off
    iou.store_byte(0x0900, 0x99);
    assert_eq!(iou.memory_ref().main_ram_ref()[0x0900], 0x99,
               "display page 2 is main RAM");
    assert_eq!(iou.memory_ref()
                  .bank_access(BankId::DisplayPage2, BankVariant::Main).unwrap(), RW);
}

#[test]
fn alt_zero_page_swap() {
    let mut iou = Iou::new();
    iou.store_byte(0x0000, 0x5A);
    iou.store_byte(0xC009, 0); // ALTZP on
    assert_eq!(iou.load_byte(0x0000), 0x00, "aux zero page starts zeroed");
    iou.store_byte(0x01FF, 0x13);
    iou.store_byte(0xC008, 0); // ALTZP off
    assert_eq!(iou.load_byte(0x0000), 0x5A);
    assert_eq!(iou.load_byte(0x01FF), 0x00);
    assert_eq!(iou.memory_ref().aux_ram_ref()[0x01FF], 0x13);
}

#[test]
fn word_page_wrap() {
    let mut iou = Iou::new();
    iou.store_byte(0x20FF, 0xCD);
    iou.store_byte(0x2000, 0xAB);
    iou.store_byte(0x2100, 0x11);
    assert_eq!(iou.load_address(0x20FF), 0xABCD,
               "the high byte comes from the start of the same page");
}

#[test]
fn redundant_switch_accesses_leave_the_mapping_intact() {
    let mut iou = Iou::new();
    // drive the machine into a non-trivial state
    iou.store_byte(0xC001, 0);
    iou.load_byte(0xC055);
    iou.load_byte(0xC057);
    iou.store_byte(0xC009, 0);
    iou.load_byte(0xC08B);
    let before = access_map(&iou);
    let switches = iou.switches();
    // every one of these repeats a switch value already in place
    iou.store_byte(0xC001, 0);
    iou.load_byte(0xC055);
    iou.load_byte(0xC057);
    iou.store_byte(0xC009, 0);
    iou.load_byte(0xC08B);
    assert_eq!(access_map(&iou), before);
    assert_eq!(iou.switches(), switches);
}

#[test]
fn random_ram_round_trip() {
    let mut rng = rand::thread_rng();
    let mut iou = Iou::new();
    let mut expected = vec![0u8; 0x10000];
    for _ in 0..1000 {
        let addr = rng.gen_range(0x0200..0xC000u16);
        let val: u8 = rng.gen();
        iou.store_byte(addr, val);
        expected[addr as usize] = val;
    }
    for addr in 0x0200..0xC000u16 {
        assert_eq!(iou.load_byte(addr), expected[addr as usize]);
    }
}

#[test]
fn rom_image_serves_cx_and_def_windows() {
    let mut iou = Iou::new();
    let mut image = vec![0u8; 0x4000];
    for (i, p) in image.iter_mut().enumerate() {
        *p = (i >> 8) as u8;
    }
    iou.memory_mut().load_system_rom(&image[..]).unwrap();
    assert_eq!(iou.load_byte(0xC100), 0x01);
    assert_eq!(iou.load_byte(0xCFFF), 0x0F);
    assert_eq!(iou.load_byte(0xD000), 0x10);
    assert_eq!(iou.load_byte(0xFFFC), 0x3F);
}

#[cfg(feature = "snapshot")]
#[test]
fn switch_state_snapshot_round_trip() {
    let mut iou = Iou::new();
    iou.store_byte(0xC001, 0);
    iou.load_byte(0xC055);
    iou.load_byte(0xC08B);
    iou.store_byte(0xC009, 0);
    let json = serde_json::to_string(&iou.switches()).unwrap();
    let switches: applerusty::SoftSwitches = serde_json::from_str(&json).unwrap();
    let mut restored = Iou::new();
    restored.restore_switches(switches);
    assert_eq!(restored.switches(), iou.switches());
    assert_eq!(access_map(&restored), access_map(&iou));
}
