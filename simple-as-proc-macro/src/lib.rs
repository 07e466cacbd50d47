//
// Copyright (C) 2023 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Expands a table of bit templates into the `Opcode` enum used by the assembler.
//!
//! Each entry looks like:
//!
//! ```text
//! ld a:reg, i:simm8, b:reg => [00 aaa bbb iiiiiiii];
//! ```
//!
//! The template must describe exactly 16 bits. `0`/`1` are fixed bits; a letter
//! marks a bit belonging to the operand with that name, most-significant bit
//! first. The expansion refers to `Operand` and `OperandKind`, which must be in
//! scope at the call site.

extern crate proc_macro;
#[macro_use]
extern crate quote;
extern crate proc_macro2;

use std::{collections::HashMap, iter::Peekable};

use proc_macro::{Delimiter, Spacing, TokenStream, TokenTree};
use proc_macro2::Literal;

const WORD_BITS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandType {
	Register,
	Unsigned(usize),
	Signed(usize),
}

#[derive(Debug, Clone)]
struct OperandDef {
	name: char,
	ty: OperandType,
	width: usize,
}

#[derive(Debug, Clone)]
struct InstructionDef {
	mnemonic: String,
	operands: Vec<OperandDef>,
	/// Template characters, most-significant bit first.
	template: Vec<char>,
}

impl OperandDef {
	fn ident(&self) -> proc_macro2::Ident {
		format_ident!("{}", self.name)
	}
}

impl InstructionDef {
	fn variant(&self) -> proc_macro2::Ident {
		let lower = self.mnemonic.to_ascii_lowercase();
		let mut chars = lower.chars();
		let capitalized: String = match chars.next() {
			Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
			None => panic!("Instruction must have a name"),
		};
		format_ident!("{}", capitalized)
	}

	fn fixed_mask(&self) -> u16 {
		self.template
			.iter()
			.rev()
			.enumerate()
			.filter(|(_, char)| **char == '0' || **char == '1')
			.fold(0u16, |acc, (idx, _)| acc | (1u16 << idx))
	}

	fn fixed_bits(&self) -> u16 {
		self.template
			.iter()
			.rev()
			.enumerate()
			.filter(|(_, char)| **char == '1')
			.fold(0u16, |acc, (idx, _)| acc | (1u16 << idx))
	}
}

fn parse_operand_type(typestring: &str) -> OperandType {
	if let Some(width) = typestring.strip_prefix("uimm") {
		match width.parse::<usize>() {
			Ok(width) => OperandType::Unsigned(width),
			Err(_) => panic!("Invalid immediate width in \"{}\"", typestring),
		}
	} else if let Some(width) = typestring.strip_prefix("simm") {
		match width.parse::<usize>() {
			Ok(width) => OperandType::Signed(width),
			Err(_) => panic!("Invalid immediate width in \"{}\"", typestring),
		}
	} else {
		match typestring {
			"reg" => OperandType::Register,
			_ => panic!("Invalid operand type \"{}\"", typestring),
		}
	}
}

fn parse_template(group: proc_macro::Group) -> Vec<char> {
	let mut string = String::new();

	for tok in group.stream() {
		match tok {
			TokenTree::Literal(lit) => string.push_str(&lit.to_string()),
			TokenTree::Ident(ident) => string.push_str(&ident.to_string()),
			_ => panic!("Invalid token \"{}\" in encoding", tok),
		}
	}

	string.chars().filter(|&char| char != '_').collect()
}

fn parse_instruction(tokens: Vec<TokenTree>) -> InstructionDef {
	let mut iter = tokens.into_iter().peekable();

	let mnemonic = match iter.next() {
		Some(TokenTree::Ident(ident)) => ident.to_string().to_ascii_uppercase(),
		_ => panic!("Expected an instruction name"),
	};

	let mut declared: Vec<(char, OperandType)> = Vec::new();

	let mut handle_tok = |iter: &mut Peekable<std::vec::IntoIter<TokenTree>>| {
		let argname = match iter.next() {
			Some(TokenTree::Ident(ident)) => {
				let as_str = ident.to_string();
				let mut chars = as_str.chars();
				match (chars.next(), chars.next()) {
					(Some(char), None) if char.is_ascii_lowercase() => char,
					_ => panic!("Operand name \"{}\" must be a single lowercase letter", as_str),
				}
			},
			_ => panic!("Operand should have an identifier naming it"),
		};

		match iter.next() {
			Some(TokenTree::Punct(punct)) if punct.as_char() == ':' => {},
			_ => panic!("Operand should have a colon-separated type"),
		}

		let ty = match iter.next() {
			Some(TokenTree::Ident(ident)) => parse_operand_type(&ident.to_string()),
			_ => panic!("Operand should have an identifier specifying its type"),
		};

		if declared.iter().any(|(name, _)| *name == argname) {
			panic!("Operand \"{}\" declared multiple times in {}", argname, mnemonic);
		}

		declared.push((argname, ty));

		// consume a comma if one exists
		match iter.peek() {
			Some(TokenTree::Punct(punct)) if punct.as_char() == ',' => {
				iter.next();
			},
			_ => {},
		}
	};

	while let Some(tok) = iter.peek() {
		match tok {
			TokenTree::Ident(_) => handle_tok(&mut iter),
			TokenTree::Punct(_) => break,
			_ => panic!("Unexpected token \"{}\"", tok),
		}
	}

	match iter.next() {
		Some(TokenTree::Punct(punct))
			if punct.as_char() == '=' && punct.spacing() == Spacing::Joint => {},
		_ => panic!("Expected \"=>\" after the operands of {}", mnemonic),
	}

	match iter.next() {
		Some(TokenTree::Punct(punct2)) if punct2.as_char() == '>' => {},
		_ => panic!("Expected \"=>\""),
	}

	let template = match iter.next() {
		Some(TokenTree::Group(group)) if group.delimiter() == Delimiter::Bracket => {
			parse_template(group)
		},
		_ => panic!("Expected bracketed encoding"),
	};

	if iter.peek().is_some() {
		panic!("Expected end of instruction after the encoding of {}", mnemonic);
	}

	if template.len() != WORD_BITS {
		panic!(
			"Expected {} characters for the encoding of {}, found {}",
			WORD_BITS,
			mnemonic,
			template.len()
		);
	}

	let mut widths: HashMap<char, usize> = HashMap::new();
	for char in template.iter() {
		match char {
			'0' | '1' => {},
			char if char.is_ascii_lowercase() => *widths.entry(*char).or_insert(0) += 1,
			_ => panic!("Invalid character \"{}\" in encoding of {}", char, mnemonic),
		}
	}

	for char in widths.keys() {
		if !declared.iter().any(|(name, _)| name == char) {
			panic!("Unknown identifier \"{}\" in encoding of {}", char, mnemonic);
		}
	}

	let operands = declared
		.into_iter()
		.map(|(name, ty)| {
			let width = match widths.get(&name) {
				Some(width) => *width,
				None => panic!("Operand \"{}\" of {} never appears in its encoding", name, mnemonic),
			};

			match ty {
				OperandType::Unsigned(declared) | OperandType::Signed(declared)
					if declared != width =>
				{
					panic!(
						"Operand \"{}\" of {} is declared {} bits wide but occupies {}",
						name, mnemonic, declared, width
					)
				},
				_ => {},
			}

			OperandDef { name, ty, width }
		})
		.collect();

	InstructionDef {
		mnemonic,
		operands,
		template,
	}
}

fn split_instructions(item: TokenStream) -> Vec<Vec<TokenTree>> {
	let mut tokens: Vec<_> = item.into_iter().collect();
	let mut instruction_sequences: Vec<Vec<TokenTree>> = Vec::new();

	loop {
		let idx = tokens
			.iter()
			.position(|tok| matches!(tok, TokenTree::Punct(punct) if punct.as_char() == ';'));

		let idx = match idx {
			Some(idx) => idx,
			None => {
				if !tokens.is_empty() {
					instruction_sequences.push(tokens);
				}
				break;
			},
		};

		let mut rest = tokens.split_off(idx);
		rest.remove(0);

		instruction_sequences.push(tokens);
		tokens = rest;
	}

	instruction_sequences
}

fn pack_body(instr: &InstructionDef) -> proc_macro2::TokenStream {
	let lets = instr.operands.iter().enumerate().map(|(position, operand)| {
		let ident = operand.ident();
		quote! { let #ident = fields[#position]; }
	});

	let fixed = Literal::u16_suffixed(instr.fixed_bits());
	let mut result = quote!(#fixed);
	let mut var_indices: HashMap<char, u32> = HashMap::new();

	for (idx, char) in instr.template.iter().rev().enumerate() {
		if !char.is_ascii_lowercase() {
			continue;
		}

		let bit_idx = Literal::u32_unsuffixed(idx as u32);
		let var_idx = var_indices.entry(*char).or_insert(0);
		let var_lit = Literal::u32_unsuffixed(*var_idx);
		let var = format_ident!("{}", char);

		result = quote! {
			(
				#result |
				(((#var >> #var_lit) & 1u16) << #bit_idx)
			)
		};
		*var_idx += 1;
	}

	quote! {
		{
			#(#lets)*
			#result
		}
	}
}

fn unpack_body(instr: &InstructionDef) -> proc_macro2::TokenStream {
	let lets = instr.operands.iter().map(|operand| {
		let ident = operand.ident();
		quote! { let mut #ident = 0u16; }
	});

	let mut var_indices: HashMap<char, u32> = HashMap::new();
	let mut steps = Vec::new();

	for (idx, char) in instr.template.iter().rev().enumerate() {
		if !char.is_ascii_lowercase() {
			continue;
		}

		let bit_idx = Literal::u32_unsuffixed(idx as u32);
		let var_idx = var_indices.entry(*char).or_insert(0);
		let var_lit = Literal::u32_unsuffixed(*var_idx);
		let var = format_ident!("{}", char);

		steps.push(quote! { #var |= ((word >> #bit_idx) & 1u16) << #var_lit; });
		*var_idx += 1;
	}

	let idents = instr.operands.iter().map(OperandDef::ident);

	quote! {
		{
			#(#lets)*
			#(#steps)*
			vec![#(#idents),*]
		}
	}
}

fn operand_descriptor(operand: &OperandDef) -> proc_macro2::TokenStream {
	let name = operand.name;
	let width = Literal::u8_unsuffixed(operand.width as u8);
	let kind = match operand.ty {
		OperandType::Register => quote!(OperandKind::Register),
		OperandType::Unsigned(_) => quote!(OperandKind::Unsigned),
		OperandType::Signed(_) => quote!(OperandKind::Signed),
	};

	quote! {
		Operand {
			name: #name,
			kind: #kind,
			width: #width,
		}
	}
}

/// Generates `pub enum Opcode` from a `;`-separated list of bit templates.
#[proc_macro]
pub fn instruction_set(item: TokenStream) -> TokenStream {
	let instrs: Vec<InstructionDef> = split_instructions(item)
		.into_iter()
		.map(parse_instruction)
		.collect();

	if instrs.is_empty() {
		panic!("Expected at least one instruction");
	}

	for (idx, instr) in instrs.iter().enumerate() {
		if instrs[..idx].iter().any(|prev| prev.mnemonic == instr.mnemonic) {
			panic!("Duplicate mnemonic \"{}\"", instr.mnemonic);
		}
	}

	let count = instrs.len();
	let variants: Vec<_> = instrs.iter().map(InstructionDef::variant).collect();
	let mnemonics = instrs.iter().map(|instr| instr.mnemonic.clone());
	let docs = instrs.iter().map(|instr| {
		let template: String = instr.template.iter().collect();
		format!("`{}` encoded as `{}`", instr.mnemonic, template)
	});
	let operand_lists = instrs.iter().map(|instr| {
		let descriptors = instr.operands.iter().map(operand_descriptor);
		quote!(&[#(#descriptors),*])
	});
	let masks = instrs
		.iter()
		.map(|instr| Literal::u16_suffixed(instr.fixed_mask()));
	let bits = instrs
		.iter()
		.map(|instr| Literal::u16_suffixed(instr.fixed_bits()));
	let packs = instrs.iter().map(pack_body);
	let unpacks = instrs.iter().map(unpack_body);

	quote! {
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		pub enum Opcode {
			#(
				#[doc = #docs]
				#variants,
			)*
		}

		impl Opcode {
			/// Every opcode, in table order.
			pub const ALL: [Opcode; #count] = [#(Opcode::#variants),*];

			/// The canonical (upper-case) mnemonic.
			pub const fn mnemonic(self) -> &'static str {
				match self {
					#(Self::#variants => #mnemonics,)*
				}
			}

			/// Operand descriptors in source order.
			pub const fn operands(self) -> &'static [Operand] {
				match self {
					#(Self::#variants => #operand_lists,)*
				}
			}

			/// Bits of the word that are fixed for this opcode.
			pub const fn fixed_mask(self) -> u16 {
				match self {
					#(Self::#variants => #masks,)*
				}
			}

			/// Values of the bits selected by [`Opcode::fixed_mask`].
			pub const fn fixed_bits(self) -> u16 {
				match self {
					#(Self::#variants => #bits,)*
				}
			}

			/// Packs operand field values (in source order, already reduced to
			/// their field width) into a word.
			///
			/// # Panics
			///
			/// Panics if `fields` holds fewer values than [`Opcode::operands`].
			pub fn pack(self, fields: &[u16]) -> u16 {
				match self {
					#(Self::#variants => #packs,)*
				}
			}

			/// Extracts the raw operand field values of `word`, in source order.
			pub fn unpack(self, word: u16) -> Vec<u16> {
				match self {
					#(Self::#variants => #unpacks,)*
				}
			}
		}
	}
	.into()
}
