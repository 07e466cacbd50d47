//
// Copyright (C) 2023 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

use crate::{error::EncodeError, isa::Opcode, tokenizer::parse_integer};

/// A raw data word must fit a signed 16-bit value.
pub const RAW_WORD_MIN: i64 = i16::MIN as i64;
pub const RAW_WORD_MAX: i64 = i16::MAX as i64;

/// What a tokenized line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
	Instruction { mnemonic: String, operands: Vec<i64> },
	/// A bare integer; anything after it is kept so it can be rejected.
	RawWord { value: i64, extra: Vec<i64> },
}

fn is_integer_literal(text: &str) -> bool {
	let digits = text
		.strip_prefix('-')
		.or_else(|| text.strip_prefix('+'))
		.unwrap_or(text);

	!digits.is_empty() && digits.chars().all(|char| char.is_ascii_digit())
}

/// Decides whether `mnemonic` names an instruction or is a raw data word.
pub fn classify(mnemonic: &str, operands: Vec<i64>) -> Result<Statement, EncodeError> {
	if !is_integer_literal(mnemonic) {
		return Ok(Statement::Instruction {
			mnemonic: mnemonic.to_ascii_uppercase(),
			operands,
		});
	}

	let value = parse_integer(mnemonic)?;

	Ok(Statement::RawWord {
		value,
		extra: operands,
	})
}

fn encode_instruction(mnemonic: &str, operands: &[i64]) -> Result<u16, EncodeError> {
	let opcode = match Opcode::from_mnemonic(mnemonic) {
		Some(opcode) => opcode,
		None => return Err(EncodeError::UnknownMnemonic(mnemonic.to_string())),
	};

	let fields = opcode.operands();

	if fields.len() != operands.len() {
		return Err(EncodeError::ArityMismatch {
			mnemonic: mnemonic.to_string(),
			expected: fields.len(),
			found: operands.len(),
		});
	}

	let values = fields
		.iter()
		.zip(operands)
		.map(|(field, &value)| {
			field
				.field_value(value)
				.ok_or_else(|| EncodeError::OperandOutOfRange {
					mnemonic: mnemonic.to_string(),
					field: field.to_string(),
					value,
				})
		})
		.collect::<Result<Vec<_>, _>>()?;

	Ok(opcode.pack(&values))
}

fn encode_raw_word(value: i64, extra: &[i64]) -> Result<u16, EncodeError> {
	if !extra.is_empty() {
		return Err(EncodeError::ArityMismatch {
			mnemonic: value.to_string(),
			expected: 0,
			found: extra.len(),
		});
	}

	if !(RAW_WORD_MIN..=RAW_WORD_MAX).contains(&value) {
		return Err(EncodeError::OperandOutOfRange {
			mnemonic: value.to_string(),
			field: format!("a 16-bit data word ({}..={})", RAW_WORD_MIN, RAW_WORD_MAX),
			value,
		});
	}

	Ok(value as i16 as u16)
}

pub fn encode_statement(statement: &Statement) -> Result<u16, EncodeError> {
	match statement {
		Statement::Instruction { mnemonic, operands } => encode_instruction(mnemonic, operands),
		Statement::RawWord { value, extra } => encode_raw_word(*value, extra),
	}
}

/// Encodes one mnemonic (or bare integer) and its operands into a word.
pub fn encode(mnemonic: &str, operands: &[i64]) -> Result<u16, EncodeError> {
	let statement = classify(mnemonic, operands.to_vec())?;
	encode_statement(&statement)
}
