use swiftlit_core::arm64::{decode, Insn, InstructionStore, MovWideOp, StoreError};
use swiftlit_core::memory::SparseImage;

mod common;

#[test]
fn decodes_sub_immediate() {
    let insn = decode(0x1000, common::sub_imm(1, 8, 0x20)).expect("decode");
    assert_eq!(insn, Insn::SubImm { sf: true, rd: 1, rn: 8, imm: 0x20 });
    assert_eq!(insn.destination(), Some(1));
    assert_eq!(insn.to_string(), "SUB X1, X8, #0x20");
}

#[test]
fn decodes_add_immediate_with_shift() {
    // ADD X2, X3, #0x5, LSL #12
    let raw = 0x9140_0000 | 0x5 << 10 | 3 << 5 | 2;
    let insn = decode(0x1000, raw).expect("decode");
    assert_eq!(insn, Insn::AddImm { sf: true, rd: 2, rn: 3, imm: 0x5000 });
}

#[test]
fn decodes_orr_bitmask_immediate() {
    let insn = decode(0x1000, common::orr_x1_x8_top_bit()).expect("decode");
    assert_eq!(
        insn,
        Insn::OrrImm { sf: true, rd: 1, rn: 8, imm: 0x8000_0000_0000_0000 }
    );
    assert_eq!(insn.to_string(), "ORR X1, X8, #0x8000000000000000");
}

#[test]
fn decodes_move_wide_family() {
    assert_eq!(
        decode(0, common::movz(8, 0x2050, 0)).expect("movz"),
        Insn::MovWide { sf: true, op: MovWideOp::Movz, rd: 8, imm16: 0x2050, shift: 0 }
    );
    assert_eq!(
        decode(0, common::movk(8, 0x1234, 1)).expect("movk"),
        Insn::MovWide { sf: true, op: MovWideOp::Movk, rd: 8, imm16: 0x1234, shift: 16 }
    );
    assert_eq!(
        decode(0, common::movn(0, 0, 0)).expect("movn"),
        Insn::MovWide { sf: true, op: MovWideOp::Movn, rd: 0, imm16: 0, shift: 0 }
    );
}

#[test]
fn decodes_register_move_alias() {
    let insn = decode(0, common::mov_reg(1, 8)).expect("decode");
    assert_eq!(insn, Insn::MovReg { sf: true, rd: 1, rm: 8 });
    assert_eq!(insn.to_string(), "MOV X1, X8");
}

#[test]
fn orr_register_with_nonzero_source_is_not_a_move() {
    // ORR X1, X2, X8 writes X1 but is no direct assignment.
    let raw = 0xAA00_0000 | 8 << 16 | 2 << 5 | 1;
    let insn = decode(0, raw).expect("decode");
    assert_eq!(insn, Insn::Other { writes: Some(1) });
}

#[test]
fn decodes_literal_load_target() {
    let insn = decode(0x1000, common::ldr_lit(8, 0x1000, 0x1018)).expect("decode");
    assert_eq!(insn, Insn::LdrLit { sf: true, rt: 8, target: 0x1018 });

    // Negative displacement.
    let insn = decode(0x1000, common::ldr_lit(8, 0x1000, 0xFF0)).expect("decode");
    assert_eq!(insn, Insn::LdrLit { sf: true, rt: 8, target: 0xFF0 });
}

#[test]
fn decodes_adrp_to_page_address() {
    // ADRP X0, page(+0x2000) from PC 0x1234: imm21 = 2, split immlo=2, immhi=0.
    let raw = 0x9000_0000 | 2 << 29;
    let insn = decode(0x1234, raw).expect("decode");
    assert_eq!(insn, Insn::Adrp { rd: 0, target: 0x3000 });
}

#[test]
fn calls_are_classified_as_calls() {
    assert_eq!(
        decode(0x1000, common::bl(0x1000, 0x2000)).expect("bl"),
        Insn::Call { target: Some(0x2000) }
    );
    // BLR X3
    let raw = 0xD63F_0000 | 3 << 5;
    assert_eq!(decode(0, raw).expect("blr"), Insn::Call { target: None });
}

#[test]
fn unknown_loads_report_their_destination() {
    let insn = decode(0, common::ldr_reg(8, 0)).expect("decode");
    assert_eq!(insn, Insn::Other { writes: Some(8) });
}

#[test]
fn branches_and_stores_report_no_destination() {
    assert_eq!(decode(0, common::ret()).expect("ret"), Insn::Other { writes: None });
    assert_eq!(decode(0, common::nop()).expect("nop"), Insn::Other { writes: None });
    // STR X8, [X0]
    let str_raw = 0xF900_0000 | 8;
    assert_eq!(decode(0, str_raw).expect("str"), Insn::Other { writes: None });
}

#[test]
fn writes_to_xzr_are_discarded() {
    let insn = decode(0, common::movz(31, 5, 0)).expect("decode");
    assert_eq!(insn.destination(), None);
}

#[test]
fn unallocated_move_wide_is_rejected() {
    // opc == 01 in the move-wide class is unallocated.
    let raw = 0x1280_0000 | 1 << 29;
    assert_eq!(decode(0, raw), None);
}

#[test]
fn decode_is_a_pure_function_of_bytes_and_address() {
    let raw = common::sub_imm(1, 8, 0x20);
    assert_eq!(decode(0x1000, raw), decode(0x1000, raw));
}

#[test]
fn store_reads_through_the_image() {
    let image = common::image_with(0x1000, &[common::sub_imm(1, 0, 0x20)]);
    let store = InstructionStore::new(&image);
    assert_eq!(
        store.decode_at(0x1000).expect("decode"),
        Insn::SubImm { sf: true, rd: 1, rn: 0, imm: 0x20 }
    );
}

#[test]
fn store_rejects_unmapped_and_misaligned_addresses() {
    let image = SparseImage::new();
    let store = InstructionStore::new(&image);
    assert_eq!(store.decode_at(0x1000), Err(StoreError::Unmapped(0x1000)));
    assert_eq!(store.decode_at(0x1002), Err(StoreError::Misaligned(0x1002)));
}
