//
// Copyright (C) 2023 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Memory initialization file output.

use log::debug;

use crate::{assembler::Program, error::FormatError};

pub const WORD_WIDTH: u32 = 16;
pub const DEFAULT_DEPTH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Radix {
	#[value(name = "2")]
	Binary,
	#[value(name = "10")]
	Decimal,
	#[value(name = "16")]
	Hexadecimal,
}

impl Radix {
	pub const fn keyword(&self) -> &'static str {
		match self {
			Radix::Binary => "BIN",
			Radix::Decimal => "DEC",
			Radix::Hexadecimal => "HEX",
		}
	}

	pub const fn base(&self) -> u32 {
		match self {
			Radix::Binary => 2,
			Radix::Decimal => 10,
			Radix::Hexadecimal => 16,
		}
	}

	/// Number of digits needed to write `max` in this radix.
	fn digits_for(&self, max: u64) -> usize {
		let base = self.base() as u64;
		let mut digits = 1;
		let mut rest = max / base;
		while rest > 0 {
			digits += 1;
			rest /= base;
		}
		digits
	}

	fn render_unsigned(&self, value: u64, digits: usize) -> String {
		match self {
			Radix::Binary => format!("{:0digits$b}", value, digits = digits),
			Radix::Decimal => value.to_string(),
			Radix::Hexadecimal => format!("{:0digits$X}", value, digits = digits),
		}
	}
}

impl TryFrom<u32> for Radix {
	type Error = FormatError;

	fn try_from(value: u32) -> Result<Self, Self::Error> {
		match value {
			2 => Ok(Radix::Binary),
			10 => Ok(Radix::Decimal),
			16 => Ok(Radix::Hexadecimal),
			_ => Err(FormatError::UnsupportedRadix(value)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
	pub address_radix: Radix,
	pub data_radix: Radix,
	/// Word width in bits.
	pub width: u32,
	/// Memory size in words.
	pub depth: usize,
	pub fill: i64,
}

impl Default for OutputConfig {
	fn default() -> Self {
		Self {
			address_radix: Radix::Decimal,
			data_radix: Radix::Decimal,
			width: WORD_WIDTH,
			depth: DEFAULT_DEPTH,
			fill: 0,
		}
	}
}

impl OutputConfig {
	pub fn validate(&self) -> Result<(), FormatError> {
		if self.width != WORD_WIDTH {
			return Err(FormatError::UnsupportedWidth(self.width));
		}

		if self.depth == 0 {
			return Err(FormatError::ZeroDepth);
		}

		self.fill_word().map(|_| ())
	}

	/// The fill value as a word; accepts either its signed or unsigned spelling.
	pub fn fill_word(&self) -> Result<u16, FormatError> {
		if (i16::MIN as i64..=u16::MAX as i64).contains(&self.fill) {
			Ok(self.fill as u16)
		} else {
			Err(FormatError::FillOutOfRange(self.fill))
		}
	}

	fn address(&self, addr: usize) -> String {
		let digits = self
			.address_radix
			.digits_for(self.depth.saturating_sub(1) as u64);
		self.address_radix.render_unsigned(addr as u64, digits)
	}

	fn data(&self, word: u16) -> String {
		match self.data_radix {
			// two's complement
			Radix::Decimal => (word as i16).to_string(),
			radix => {
				let max = (1u64 << self.width) - 1;
				radix.render_unsigned(word as u64, radix.digits_for(max))
			},
		}
	}
}

/// Renders `program` as a memory initialization file.
pub fn format(program: &Program, config: &OutputConfig) -> Result<String, FormatError> {
	config.validate()?;

	if program.len() > config.depth {
		return Err(FormatError::CapacityExceeded {
			words: program.len(),
			depth: config.depth,
		});
	}

	let fill = config.fill_word()?;
	let mut out = String::new();

	out.push_str(&format!("WIDTH={};\n", config.width));
	out.push_str(&format!("DEPTH={};\n", config.depth));
	out.push_str(&format!(
		"ADDRESS_RADIX={};\n",
		config.address_radix.keyword()
	));
	out.push_str(&format!("DATA_RADIX={};\n", config.data_radix.keyword()));
	out.push_str("CONTENT BEGIN\n");

	for (addr, &word) in program.words().iter().enumerate() {
		out.push_str(&format!(
			"{} : {};\n",
			config.address(addr),
			config.data(word)
		));
	}

	if program.len() < config.depth {
		out.push_str(&format!(
			"[{} ..{}] : {};\n",
			config.address(program.len()),
			config.address(config.depth - 1),
			config.data(fill)
		));
	}

	out.push_str("END;\n");

	debug!(
		"formatted {} of {} words ({} address, {} data)",
		program.len(),
		config.depth,
		config.address_radix.keyword(),
		config.data_radix.keyword()
	);

	Ok(out)
}
