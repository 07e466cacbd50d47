//
// Copyright (C) 2023 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

use log::{debug, trace};

use crate::{
	encoder::{classify, encode_statement},
	error::{AssembleError, EncodeError},
	isa::Opcode,
	tokenizer::tokenize,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
	/// 1-based.
	pub number: usize,
	pub text: String,
}

/// The assembled words, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program(Vec<u16>);

impl Program {
	pub fn words(&self) -> &[u16] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn into_words(self) -> Vec<u16> {
		self.0
	}

	/// One line per word: address, bit pattern and how the word would execute.
	pub fn listing(&self) -> String {
		let mut out = String::new();

		for (addr, &word) in self.0.iter().enumerate() {
			let decoded = match Opcode::decode(word) {
				Some(opcode) => opcode.disassemble(word),
				None => String::from("?"),
			};
			out.push_str(&format!(
				"{:5}  {:016b}  {:6}  {}\n",
				addr, word, word as i16, decoded
			));
		}

		out
	}
}

impl From<Vec<u16>> for Program {
	fn from(words: Vec<u16>) -> Self {
		Self(words)
	}
}

fn assemble_line(line: &SourceLine) -> Result<Option<u16>, EncodeError> {
	let tokenized = match tokenize(&line.text)? {
		Some(tokenized) => tokenized,
		None => return Ok(None),
	};

	let statement = classify(&tokenized.mnemonic, tokenized.operands)?;
	debug!("line {}: {:?}", line.number, statement);

	let word = encode_statement(&statement)?;
	trace!("encoding: {:#018b}", word);

	Ok(Some(word))
}

/// Assembles numbered source lines, stopping at the first error.
pub fn assemble_source<I>(lines: I) -> Result<Program, AssembleError>
where
	I: IntoIterator<Item = SourceLine>,
{
	let mut words = Vec::new();

	for line in lines {
		match assemble_line(&line) {
			Ok(Some(word)) => words.push(word),
			Ok(None) => {},
			Err(source) => {
				return Err(AssembleError {
					line: line.number,
					text: line.text,
					source,
				})
			},
		}
	}

	debug!("assembled {} words", words.len());

	Ok(Program(words))
}

/// Assembles `lines`, numbering them from 1.
pub fn assemble<I, S>(lines: I) -> Result<Program, AssembleError>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	assemble_source(
		lines
			.into_iter()
			.enumerate()
			.map(|(idx, text)| SourceLine {
				number: idx + 1,
				text: text.as_ref().to_string(),
			}),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn skips_blank_and_comment_lines() {
		let program = assemble(["", "// header", "LI R0,5", "   ", "HLT // done"]).unwrap();
		assert_eq!(
			program.words(),
			&[0b10_000_000_0000_0101, 0b11_000_000_1111_0000]
		);
	}

	#[test]
	fn raw_words_between_instructions() {
		let program = assemble(["B 1", "-2", "HLT"]).unwrap();
		assert_eq!(program.words()[1], 0xfffe);
		assert_eq!(program.len(), 3);
	}

	#[test]
	fn error_reports_first_failing_line() {
		let err = assemble(["LI R0,5", "", "FOO 1", "BAR"]).unwrap_err();
		assert_eq!(err.line, 3);
		assert_eq!(err.text, "FOO 1");
		assert_eq!(err.source, EncodeError::UnknownMnemonic("FOO".to_string()));
		assert_eq!(err.to_string(), "line 3: unknown mnemonic \"FOO\"");
	}

	#[test]
	fn error_categories() {
		let err = assemble(["ADD R1"]).unwrap_err();
		assert!(matches!(err.source, EncodeError::ArityMismatch { .. }));

		let err = assemble(["HLT", "LI R0,128"]).unwrap_err();
		assert_eq!(err.line, 2);
		assert!(matches!(
			err.source,
			EncodeError::OperandOutOfRange { value: 128, .. }
		));

		let err = assemble(["LI R0,x"]).unwrap_err();
		assert_eq!(err.source, EncodeError::MalformedOperand("x".to_string()));
	}

	#[test]
	fn listing_decodes_words() {
		let program = assemble(["LD R1,-1(R2)", "HLT"]).unwrap();
		let listing = program.listing();
		let lines: Vec<_> = listing.lines().collect();

		assert_eq!(lines.len(), 2);
		assert!(lines[0].contains("0000101011111111"));
		assert!(lines[0].ends_with("LD R1,-1(R2)"));
		assert!(lines[1].ends_with("HLT"));
	}
}
