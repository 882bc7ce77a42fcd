//! Shared test helpers: tiny ARM64 encoders and synthetic image builders.

#![allow(dead_code)]

use swiftlit_core::memory::SparseImage;

/// `MOVZ Xd, #imm16, LSL #(hw*16)`
pub fn movz(rd: u8, imm16: u16, hw: u8) -> u32 {
    0xD280_0000 | u32::from(hw) << 21 | u32::from(imm16) << 5 | u32::from(rd)
}

/// `MOVK Xd, #imm16, LSL #(hw*16)`
pub fn movk(rd: u8, imm16: u16, hw: u8) -> u32 {
    0xF280_0000 | u32::from(hw) << 21 | u32::from(imm16) << 5 | u32::from(rd)
}

/// `MOVN Xd, #imm16, LSL #(hw*16)`
pub fn movn(rd: u8, imm16: u16, hw: u8) -> u32 {
    0x9280_0000 | u32::from(hw) << 21 | u32::from(imm16) << 5 | u32::from(rd)
}

/// `ADD Xd, Xn, #imm12`
pub fn add_imm(rd: u8, rn: u8, imm12: u16) -> u32 {
    0x9100_0000 | u32::from(imm12) << 10 | u32::from(rn) << 5 | u32::from(rd)
}

/// `SUB Xd, Xn, #imm12`
pub fn sub_imm(rd: u8, rn: u8, imm12: u16) -> u32 {
    0xD100_0000 | u32::from(imm12) << 10 | u32::from(rn) << 5 | u32::from(rd)
}

/// `ORR X1, X8, #0x8000000000000000` — the second half of the string-site
/// template.
pub fn orr_x1_x8_top_bit() -> u32 {
    0xB241_0101
}

/// `MOV Xd, Xm` (the `ORR Xd, XZR, Xm` alias).
pub fn mov_reg(rd: u8, rm: u8) -> u32 {
    0xAA00_03E0 | u32::from(rm) << 16 | u32::from(rd)
}

/// `LDR Xt, target` (PC-relative literal load).
pub fn ldr_lit(rt: u8, pc: u64, target: u64) -> u32 {
    let imm19 = ((target as i64 - pc as i64) / 4) as u32 & 0x7_FFFF;
    0x5800_0000 | imm19 << 5 | u32::from(rt)
}

/// `LDR Xt, [Xn]` — a load the backward walk cannot follow.
pub fn ldr_reg(rt: u8, rn: u8) -> u32 {
    0xF940_0000 | u32::from(rn) << 5 | u32::from(rt)
}

/// `BL target`
pub fn bl(pc: u64, target: u64) -> u32 {
    let imm26 = ((target as i64 - pc as i64) / 4) as u32 & 0x3FF_FFFF;
    0x9400_0000 | imm26
}

pub fn nop() -> u32 {
    0xD503_201F
}

pub fn ret() -> u32 {
    0xD65F_03C0
}

pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Map `words` at `base` in a fresh image.
pub fn image_with(base: u64, words: &[u32]) -> SparseImage {
    let mut image = SparseImage::new();
    image.map(base, words_to_bytes(words));
    image
}
