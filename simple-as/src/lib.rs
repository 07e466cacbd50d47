//
// Copyright (C) 2023 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Assembler for the 16-bit SIMPLE architecture.
//!
//! Source lines go through [`tokenizer::tokenize`], are classified and encoded
//! by [`encoder`], collected into a [`Program`] by [`assemble`] and finally
//! rendered as a memory initialization file by [`mif::format`].

extern crate pest;
#[macro_use]
extern crate pest_derive;

pub mod assembler;
pub mod encoder;
pub mod error;
pub mod isa;
pub mod mif;
pub mod tokenizer;

pub use assembler::{assemble, assemble_source, Program, SourceLine};
pub use encoder::encode;
pub use error::{AssembleError, EncodeError, FormatError};
pub use isa::Opcode;
pub use mif::{OutputConfig, Radix};
