//
// Copyright (C) 2023 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! The SIMPLE instruction set.

use std::{collections::HashMap, fmt::Display, ops::RangeInclusive};

use lazy_static::lazy_static;
use simple_as_proc_macro::instruction_set;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
	/// A register index, stored unsigned.
	Register,
	Unsigned,
	/// Stored in two's complement.
	Signed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
	pub name: char,
	pub kind: OperandKind,
	/// Field width in bits.
	pub width: u8,
}

impl Operand {
	/// The inclusive range of source values that fit in this field.
	pub fn range(&self) -> RangeInclusive<i64> {
		let width = self.width as u32;
		match self.kind {
			OperandKind::Register | OperandKind::Unsigned => 0..=((1i64 << width) - 1),
			OperandKind::Signed => -(1i64 << (width - 1))..=((1i64 << (width - 1)) - 1),
		}
	}

	/// Reduces `value` to its field bits, or `None` if it doesn't fit.
	pub fn field_value(&self, value: i64) -> Option<u16> {
		if !self.range().contains(&value) {
			return None;
		}

		let mask = (1i64 << self.width) - 1;
		Some((value & mask) as u16)
	}

	/// Inverse of [`Operand::field_value`].
	pub fn source_value(&self, field: u16) -> i64 {
		let field = field as i64;
		match self.kind {
			OperandKind::Signed if field & (1i64 << (self.width - 1)) != 0 => {
				field - (1i64 << self.width)
			},
			_ => field,
		}
	}
}

impl Display for Operand {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let range = self.range();
		write!(
			f,
			"{} ({}-bit {}, {}..={})",
			self.name,
			self.width,
			match self.kind {
				OperandKind::Register => "register",
				OperandKind::Unsigned => "unsigned",
				OperandKind::Signed => "signed",
			},
			range.start(),
			range.end()
		)
	}
}

instruction_set! {
	add d:reg, s:reg => [11 sss ddd 0000 0000];
	sub d:reg, s:reg => [11 sss ddd 0001 0000];
	and d:reg, s:reg => [11 sss ddd 0010 0000];
	or  d:reg, s:reg => [11 sss ddd 0011 0000];
	xor d:reg, s:reg => [11 sss ddd 0100 0000];
	cmp d:reg, s:reg => [11 sss ddd 0101 0000];
	mov d:reg, s:reg => [11 sss ddd 0110 0000];

	sll d:reg, n:uimm4 => [11 000 ddd 1000 nnnn];
	slr d:reg, n:uimm4 => [11 000 ddd 1001 nnnn];
	srl d:reg, n:uimm4 => [11 000 ddd 1010 nnnn];
	sra d:reg, n:uimm4 => [11 000 ddd 1011 nnnn];

	in  d:reg => [11 000 ddd 1100 0000];
	out s:reg => [11 sss 000 1101 0000];
	hlt       => [11 000 000 1111 0000];

	ld a:reg, i:simm8, b:reg => [00 aaa bbb iiiiiiii];
	st a:reg, i:simm8, b:reg => [01 aaa bbb iiiiiiii];
	li b:reg, i:simm8        => [10 000 bbb iiiiiiii];

	b   i:simm8 => [10 100 000 iiiiiiii];
	be  i:simm8 => [10 111 000 iiiiiiii];
	blt i:simm8 => [10 111 001 iiiiiiii];
	ble i:simm8 => [10 111 010 iiiiiiii];
	bne i:simm8 => [10 111 011 iiiiiiii];
}

lazy_static! {
	static ref MNEMONICS: HashMap<&'static str, Opcode> = Opcode::ALL
		.iter()
		.map(|&opcode| (opcode.mnemonic(), opcode))
		.collect();
}

impl Opcode {
	/// Looks up a canonical (upper-case) mnemonic.
	pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
		MNEMONICS.get(mnemonic).copied()
	}

	/// Finds the opcode whose fixed bits match `word`.
	///
	/// Any word is also a valid raw data word, so a match only says how the
	/// word would execute.
	pub fn decode(word: u16) -> Option<Self> {
		Self::ALL
			.iter()
			.copied()
			.find(|opcode| word & opcode.fixed_mask() == opcode.fixed_bits())
	}

	/// Renders `word` as assembly source for this opcode, e.g. `LD R1,-1(R2)`.
	pub fn disassemble(self, word: u16) -> String {
		let operands: Vec<String> = self
			.operands()
			.iter()
			.zip(self.unpack(word))
			.map(|(operand, field)| match operand.kind {
				OperandKind::Register => format!("R{}", field),
				_ => operand.source_value(field).to_string(),
			})
			.collect();

		match (self, operands.as_slice()) {
			(_, []) => self.mnemonic().to_string(),
			(Opcode::Ld | Opcode::St, [a, i, b]) => format!("{} {},{}({})", self.mnemonic(), a, i, b),
			_ => format!("{} {}", self.mnemonic(), operands.join(",")),
		}
	}
}

impl Display for Opcode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.mnemonic())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mnemonics_are_unique_and_found() {
		assert_eq!(MNEMONICS.len(), Opcode::ALL.len());
		for opcode in Opcode::ALL {
			assert_eq!(Opcode::from_mnemonic(opcode.mnemonic()), Some(opcode));
		}
		assert_eq!(Opcode::from_mnemonic("add"), None);
		assert_eq!(Opcode::from_mnemonic("NOP"), None);
	}

	#[test]
	fn field_layouts() {
		assert_eq!(Opcode::Add.pack(&[0, 7]), 0b11_111_000_0000_0000);
		assert_eq!(Opcode::Mov.pack(&[1, 2]), 0b11_010_001_0110_0000);
		assert_eq!(Opcode::Sra.pack(&[3, 15]), 0b11_000_011_1011_1111);
		assert_eq!(Opcode::In.pack(&[5]), 0b11_000_101_1100_0000);
		assert_eq!(Opcode::Out.pack(&[5]), 0b11_101_000_1101_0000);
		assert_eq!(Opcode::Hlt.pack(&[]), 0b11_000_000_1111_0000);
		assert_eq!(Opcode::St.pack(&[1, 0x80, 2]), 0b01_001_010_1000_0000);
		assert_eq!(Opcode::Li.pack(&[6, 5]), 0b10_000_110_0000_0101);
		assert_eq!(Opcode::B.pack(&[0xff]), 0b10_100_000_1111_1111);
		assert_eq!(Opcode::Bne.pack(&[1]), 0b10_111_011_0000_0001);
	}

	#[test]
	fn operands_describe_fields() {
		assert_eq!(
			Opcode::Ld.operands(),
			&[
				Operand {
					name: 'a',
					kind: OperandKind::Register,
					width: 3
				},
				Operand {
					name: 'i',
					kind: OperandKind::Signed,
					width: 8
				},
				Operand {
					name: 'b',
					kind: OperandKind::Register,
					width: 3
				},
			]
		);
		assert_eq!(Opcode::Slr.operands()[1].kind, OperandKind::Unsigned);
		assert!(Opcode::Hlt.operands().is_empty());
	}

	#[test]
	fn field_ranges() {
		let reg = Opcode::Add.operands()[0];
		assert_eq!(reg.range(), 0..=7);
		assert_eq!(reg.field_value(7), Some(7));
		assert_eq!(reg.field_value(8), None);
		assert_eq!(reg.field_value(-1), None);

		let disp = Opcode::B.operands()[0];
		assert_eq!(disp.range(), -128..=127);
		assert_eq!(disp.field_value(-1), Some(0xff));
		assert_eq!(disp.field_value(-128), Some(0x80));
		assert_eq!(disp.field_value(128), None);
		assert_eq!(disp.field_value(-129), None);
	}

	#[test]
	fn pack_unpack_every_field_value() {
		for opcode in Opcode::ALL {
			for (position, operand) in opcode.operands().iter().enumerate() {
				for value in operand.range() {
					let mut fields = vec![0u16; opcode.operands().len()];
					fields[position] = operand.field_value(value).unwrap();

					let word = opcode.pack(&fields);
					let unpacked = opcode.unpack(word);

					assert_eq!(unpacked, fields, "{} {}", opcode, operand);
					assert_eq!(operand.source_value(unpacked[position]), value);
					assert_eq!(Opcode::decode(word), Some(opcode));
				}
			}
		}
	}

	#[test]
	fn disassembly() {
		assert_eq!(Opcode::Ld.disassemble(0b00_001_010_1111_1111), "LD R1,-1(R2)");
		assert_eq!(Opcode::Add.disassemble(0b11_001_000_0000_0000), "ADD R0,R1");
		assert_eq!(Opcode::Hlt.disassemble(0b11_000_000_1111_0000), "HLT");
		assert_eq!(Opcode::Sll.disassemble(0b11_000_010_1000_0011), "SLL R2,3");
	}
}
