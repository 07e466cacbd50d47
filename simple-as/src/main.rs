//
// Copyright (C) 2023 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

use std::{
	fs,
	io::{self, BufRead, Write},
	path::{Path, PathBuf},
	process::exit,
};

use clap::{ArgAction, Parser as ClapParser};
use log::{info, warn, LevelFilter};

use simple_as::{
	assemble,
	mif::{self, DEFAULT_DEPTH, WORD_WIDTH},
	OutputConfig, Radix,
};

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Assembly source; standard input is read when absent or "-"
	source: Option<PathBuf>,

	/// Memory initialization file to write instead of standard output
	#[arg(short, long)]
	output: Option<PathBuf>,

	#[arg(long, value_enum, default_value = "10")]
	address_radix: Radix,

	#[arg(long, value_enum, default_value = "10")]
	data_radix: Radix,

	/// Word width in bits
	#[arg(long, default_value_t = WORD_WIDTH)]
	width: u32,

	/// Memory size in words
	#[arg(long, default_value_t = DEFAULT_DEPTH)]
	depth: usize,

	/// Value for every word after the program
	#[arg(long, default_value_t = 0, allow_negative_numbers = true)]
	fill: i64,

	/// Print an annotated listing of the program to standard error
	#[arg(long)]
	listing: bool,

	#[arg(short, long, action = ArgAction::Count)]
	verbose: u8,
}

fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => LevelFilter::Warn,
		1 => LevelFilter::Info,
		2 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	};

	env_logger::Builder::new()
		.filter_level(level)
		.format_target(false)
		.format_timestamp(None)
		.parse_default_env()
		.init();
}

fn read_file(path: &Path) -> Vec<String> {
	match fs::read_to_string(path) {
		Ok(x) => x.lines().map(str::to_string).collect(),
		Err(e) => {
			eprintln!("Failed to read \"{}\": {}", path.display(), e);
			exit(1);
		},
	}
}

/// Reads standard input up to its end or the first empty line.
fn read_stdin() -> Vec<String> {
	let mut lines = Vec::new();

	for line in io::stdin().lock().lines() {
		match line {
			Ok(line) if line.trim().is_empty() => break,
			Ok(line) => lines.push(line),
			Err(e) => {
				eprintln!("Failed to read standard input: {}", e);
				exit(1);
			},
		}
	}

	lines
}

fn write_stdout(text: &str) {
	let mut stdout = io::stdout().lock();
	if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
		eprintln!("Failed to write to standard output: {}", e);
		exit(1);
	}
}

fn write_output(path: Option<&Path>, text: &str) {
	let path = match path {
		Some(path) => path,
		None => return write_stdout(text),
	};

	let mut output_file = match fs::File::create(path) {
		Ok(file) => file,
		Err(err) => {
			eprintln!("Failed to open output file \"{}\": {}", path.display(), err);
			warn!("writing the memory image to standard output instead");
			return write_stdout(text);
		},
	};

	match output_file.write_all(text.as_bytes()) {
		Ok(_) => info!("wrote {}", path.display()),
		Err(err) => {
			eprintln!("Failed to write to output file: {}", err);
			exit(1);
		},
	}
}

fn main() {
	let cli = Args::parse();

	init_logging(cli.verbose);

	let config = OutputConfig {
		address_radix: cli.address_radix,
		data_radix: cli.data_radix,
		width: cli.width,
		depth: cli.depth,
		fill: cli.fill,
	};

	if let Err(e) = config.validate() {
		eprintln!("Error: {}", e);
		exit(1);
	}

	let lines = match &cli.source {
		Some(path) if path.as_os_str() != "-" => read_file(path),
		_ => read_stdin(),
	};

	let program = match assemble(&lines) {
		Ok(program) => program,
		Err(e) => {
			eprintln!("Error: {}", e);
			exit(1);
		},
	};

	if cli.listing {
		eprint!("{}", program.listing());
	}

	let text = match mif::format(&program, &config) {
		Ok(text) => text,
		Err(e) => {
			eprintln!("Error: {}", e);
			exit(1);
		},
	};

	write_output(cli.output.as_deref(), &text);
}
