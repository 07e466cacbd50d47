//
// Copyright (C) 2023 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

use thiserror::Error;

/// Why a single line could not be turned into a word.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
	#[error("bad operand token \"{0}\"")]
	MalformedOperand(String),
	#[error("unknown mnemonic \"{0}\"")]
	UnknownMnemonic(String),
	#[error("wrong operand count for {mnemonic}: expected {expected}, found {found}")]
	ArityMismatch {
		mnemonic: String,
		expected: usize,
		found: usize,
	},
	#[error("operand out of range for {mnemonic}: {value} does not fit in {field}")]
	OperandOutOfRange {
		mnemonic: String,
		field: String,
		value: i64,
	},
}

/// The first failure of an assembly run, tied to its source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {source}")]
pub struct AssembleError {
	/// 1-based line number.
	pub line: usize,
	pub text: String,
	pub source: EncodeError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
	#[error("unsupported radix {0} (expected 2, 10 or 16)")]
	UnsupportedRadix(u32),
	#[error("unsupported word width {0} (instructions are 16 bits wide)")]
	UnsupportedWidth(u32),
	#[error("memory depth must be at least 1")]
	ZeroDepth,
	#[error("fill value {0} does not fit in a 16-bit word")]
	FillOutOfRange(i64),
	#[error("program of {words} words does not fit in a memory of depth {depth}")]
	CapacityExceeded { words: usize, depth: usize },
}
