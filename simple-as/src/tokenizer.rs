//
// Copyright (C) 2023 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

use pest::{iterators::Pair, Parser};

use crate::error::EncodeError;

pub const COMMENT_MARKER: &str = "//";

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct LineParser;

/// One source line split into its mnemonic and operands.
///
/// The mnemonic is the first run found on the line, upper-cased. It may be a
/// signed integer, in which case the line is a raw data word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedLine {
	pub mnemonic: String,
	pub operands: Vec<i64>,
}

fn strip_comment(line: &str) -> &str {
	match line.find(COMMENT_MARKER) {
		Some(idx) => &line[..idx],
		None => line,
	}
}

/// Parses an optionally-signed decimal integer.
///
/// Digit runs too large for `i64` saturate, so the field range check reports
/// them as out of range.
pub(crate) fn parse_integer(text: &str) -> Result<i64, EncodeError> {
	let unsigned = text.strip_prefix('+').unwrap_or(text);

	match unsigned.parse::<i64>() {
		Ok(value) => Ok(value),
		Err(_) => {
			let (negative, digits) = match unsigned.strip_prefix('-') {
				Some(digits) => (true, digits),
				None => (false, unsigned),
			};

			if digits.is_empty() || !digits.chars().all(|char| char.is_ascii_digit()) {
				return Err(EncodeError::MalformedOperand(text.to_string()));
			}

			Ok(if negative { i64::MIN } else { i64::MAX })
		},
	}
}

fn parse_operand(pair: Pair<Rule>) -> Result<i64, EncodeError> {
	match pair.as_rule() {
		Rule::number => parse_integer(pair.as_str()),
		Rule::register => match pair.into_inner().next() {
			Some(index) => parse_integer(index.as_str()),
			None => unreachable!(),
		},
		// letters can't be operands
		_ => Err(EncodeError::MalformedOperand(pair.as_str().to_string())),
	}
}

/// Splits `line` into tokens.
///
/// Returns `Ok(None)` for blank and comment lines. A line with text but no
/// letters or digits is malformed.
pub fn tokenize(line: &str) -> Result<Option<TokenizedLine>, EncodeError> {
	let code = strip_comment(line);

	if code.trim().is_empty() {
		return Ok(None);
	}

	let mut pairs = LineParser::parse(Rule::line, code)
		.map_err(|_| EncodeError::MalformedOperand(code.trim().to_string()))?;

	let malformed = || EncodeError::MalformedOperand(code.trim().to_string());

	let mut tokens = match pairs.next() {
		Some(line) => line.into_inner().filter(|pair| pair.as_rule() != Rule::EOI),
		None => return Err(malformed()),
	};

	let mnemonic = match tokens.next() {
		Some(head) => head.as_str().to_ascii_uppercase(),
		None => return Err(malformed()),
	};

	let operands = tokens.map(parse_operand).collect::<Result<Vec<_>, _>>()?;

	Ok(Some(TokenizedLine { mnemonic, operands }))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens(line: &str) -> (String, Vec<i64>) {
		let tokenized = tokenize(line).unwrap().unwrap();
		(tokenized.mnemonic, tokenized.operands)
	}

	#[test]
	fn register_operands() {
		assert_eq!(tokens("ADD R1,R2"), ("ADD".to_string(), vec![1, 2]));
		assert_eq!(tokens("  mov   r7 , r0"), ("MOV".to_string(), vec![7, 0]));
	}

	#[test]
	fn displacement_form_order() {
		assert_eq!(tokens("LD R1,-1(R2)"), ("LD".to_string(), vec![1, -1, 2]));
		assert_eq!(tokens("st r3, +12(r4)"), ("ST".to_string(), vec![3, 12, 4]));
		assert_eq!(tokens("LD R1,-1,R2"), ("LD".to_string(), vec![1, -1, 2]));
		assert_eq!(tokens("LD R1,-1,R2"), tokens("LD R1,-1(R2)"));
	}

	#[test]
	fn comments_are_stripped() {
		assert_eq!(tokens("ADD R1,R2 // comment"), tokens("ADD R1,R2"));
		assert_eq!(tokens("HLT// 1 2 3"), ("HLT".to_string(), vec![]));
		assert_eq!(tokenize("// just a comment").unwrap(), None);
		assert_eq!(tokenize("    // indented comment").unwrap(), None);
	}

	#[test]
	fn blank_lines_are_skipped() {
		assert_eq!(tokenize("").unwrap(), None);
		assert_eq!(tokenize(" \t ").unwrap(), None);
	}

	#[test]
	fn punctuation_only_lines_are_malformed() {
		assert_eq!(
			tokenize(", ( )"),
			Err(EncodeError::MalformedOperand(", ( )".to_string()))
		);
		assert_eq!(
			tokenize(",  // trailing comment"),
			Err(EncodeError::MalformedOperand(",".to_string()))
		);
	}

	#[test]
	fn bare_numbers() {
		assert_eq!(tokens("-42"), ("-42".to_string(), vec![]));
		assert_eq!(tokens("+7"), ("+7".to_string(), vec![]));
		assert_eq!(tokens("12 34"), ("12".to_string(), vec![34]));
	}

	#[test]
	fn signs_without_digits_separate() {
		assert_eq!(tokens("B --5"), ("B".to_string(), vec![-5]));
		assert_eq!(tokens("B - 5"), ("B".to_string(), vec![5]));
	}

	#[test]
	fn register_prefix_is_case_insensitive() {
		assert_eq!(tokens("in r5"), tokens("IN R5"));
		assert_eq!(tokens("OUT 5"), tokens("out r5"));
	}

	#[test]
	fn letters_after_mnemonic_are_malformed() {
		assert_eq!(
			tokenize("LI R0, foo"),
			Err(EncodeError::MalformedOperand("foo".to_string()))
		);
	}

	#[test]
	fn oversized_operands_saturate() {
		assert_eq!(
			tokens("LI R0,99999999999999999999"),
			("LI".to_string(), vec![0, i64::MAX])
		);
		assert_eq!(
			tokens("B -99999999999999999999"),
			("B".to_string(), vec![i64::MIN])
		);
		assert_eq!(
			tokens("OUT R99999999999999999999"),
			("OUT".to_string(), vec![i64::MAX])
		);
	}

	#[test]
	fn integer_parsing() {
		assert_eq!(parse_integer("+12"), Ok(12));
		assert_eq!(parse_integer("-0"), Ok(0));
		assert_eq!(parse_integer("123456789012345678901234"), Ok(i64::MAX));
		assert_eq!(
			parse_integer("R"),
			Err(EncodeError::MalformedOperand("R".to_string()))
		);
		assert_eq!(
			parse_integer("-"),
			Err(EncodeError::MalformedOperand("-".to_string()))
		);
	}
}
