/*!
  The human readable textual form of a program is called a listing. This module assembles a
  listing into instructions.

  A listing has one statement per line. Surrounding whitespace is ignored, as are blank lines.

  ```text
  # A comment. Only whole lines may be comments.
  label:
  mnemonic arg, arg, arg
  ```

  Arguments are one of

  ```text
  @label       the offset of the instruction following `label:`
  $3, $gpr1    a register, by index or by name
  42i          a signed 32 bit integer
  1.5f         a 32 bit float, stored as its raw bits
  ```

  Assembly takes two passes. The first builds the jump table from the label lines, so that a
  label may be used before the line it is defined on. The second parses every instruction
  line against that table. Any error aborts assembly of the whole listing.
*/

use std::collections::HashMap;
use std::convert::TryFrom;

use nom::{
  branch::alt,
  character::complete::{char as one_char, digit1},
  combinator::{all_consuming, map, peek, rest, verify},
  sequence::preceded,
  IResult
};
use string_cache::DefaultAtom;
use thiserror::Error;

use crate::bytecode::{Instruction, OpCode};
use crate::register::Register;

const COMMENT_PREFIX : char = '#';
const LABEL_SUFFIX   : char = ':';
const ARG_SEPARATOR  : char = ',';

/// Assembly errors. Every error carries the 1-based line of the listing it occurred on.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum AssemblyError {
  #[error("Error on line {line}: {mnemonic} is not an operation.")]
  UnknownMnemonic { line: usize, mnemonic: String },

  #[error("Error on line {line}: {opcode} takes at most {max} arguments but was given {given}.")]
  TooManyArgs { line: usize, opcode: OpCode, given: usize, max: usize },

  #[error("Error on line {line}: cannot parse argument `{contents}`.")]
  BadArg { line: usize, contents: String },

  #[error("Error on line {line}: `{raw}` is not a 32 bit integer.")]
  BadInt { line: usize, raw: String },

  #[error("Error on line {line}: `{raw}` is not a 32 bit float.")]
  BadFloat { line: usize, raw: String },

  #[error("Error on line {line}: `{raw}` is not a register.")]
  BadRegister { line: usize, raw: String },

  #[error("Error on line {line}: no label named `{label}`.")]
  BadJumpLabel { line: usize, label: String },

  #[error("Error on line {line}: label `{label}` is already defined.")]
  DuplicateLabel { line: usize, label: String },

  #[error("Error on line {line}: {value} does not fit in a 16 bit argument.")]
  ArgumentTooWide { line: usize, value: u32 },
}

impl AssemblyError {
  pub fn line(&self) -> usize {
    match self {
      | AssemblyError::UnknownMnemonic { line, .. }
      | AssemblyError::TooManyArgs     { line, .. }
      | AssemblyError::BadArg          { line, .. }
      | AssemblyError::BadInt          { line, .. }
      | AssemblyError::BadFloat        { line, .. }
      | AssemblyError::BadRegister     { line, .. }
      | AssemblyError::BadJumpLabel    { line, .. }
      | AssemblyError::DuplicateLabel  { line, .. }
      | AssemblyError::ArgumentTooWide { line, .. } => *line
    }
  }
}

/// A trimmed line of the listing that is neither blank nor a comment.
#[derive(Copy, Clone, Debug)]
struct SourceLine<'a> {
  number : usize,
  text   : &'a str
}

impl<'a> SourceLine<'a> {
  /// The label name, if this line defines a label.
  fn label(&self) -> Option<&'a str> {
    match self.text.ends_with(LABEL_SUFFIX) {
      true  => Some(&self.text[..self.text.len() - LABEL_SUFFIX.len_utf8()]),
      false => None
    }
  }
}

fn source_lines(listing: &str) -> impl Iterator<Item = SourceLine<'_>> {
  listing
    .lines()
    .enumerate()
    .map(|(i, line)| SourceLine { number: i + 1, text: line.trim() })
    .filter(|line| !line.text.is_empty() && !line.text.starts_with(COMMENT_PREFIX))
}

/// Maps a label to the offset of the first instruction after it.
struct JumpTable {
  offsets: HashMap<DefaultAtom, u32>
}

impl JumpTable {

  /// The label pre-pass. Labels count only the instruction lines before them.
  fn build(listing: &str) -> Result<JumpTable, AssemblyError> {
    let mut offsets = HashMap::new();
    let mut instruction_count: u32 = 0;

    for line in source_lines(listing) {
      match line.label() {

        Some(label) => {
          let name = DefaultAtom::from(label);
          if offsets.contains_key(&name) {
            return Err(AssemblyError::DuplicateLabel {
              line: line.number,
              label: label.to_string()
            });
          }
          offsets.insert(name, instruction_count);
        }

        None => {
          instruction_count += 1;
        }

      }
    }

    Ok(JumpTable { offsets })
  }

  fn resolve(&self, label: &str) -> Option<u32> {
    self.offsets.get(&DefaultAtom::from(label)).copied()
  }
}

// region Argument parsers

/// The syntactic class of an argument, decided by its prefix or suffix.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum ArgumentToken<'a> {
  Label(&'a str),
  Register(&'a str),
  Int(&'a str),
  Float(&'a str),
}

fn without_suffix(text: &str) -> &str {
  &text[..text.len() - 1]
}

/// Any text led by a decimal digit.
fn number(input: &str) -> IResult<&str, &str> {
  preceded(peek(digit1), rest)(input)
}

fn decimal(input: &str) -> IResult<&str, &str> {
  all_consuming(digit1)(input)
}

fn argument_token(input: &str) -> IResult<&str, ArgumentToken<'_>> {
  alt((
    map(preceded(one_char('@'), rest), ArgumentToken::Label),
    map(preceded(one_char('$'), rest), ArgumentToken::Register),
    map(
      verify(number, |text: &str| text.ends_with('i')),
      |text| ArgumentToken::Int(without_suffix(text))
    ),
    map(
      verify(number, |text: &str| text.ends_with('f')),
      |text| ArgumentToken::Float(without_suffix(text))
    ),
  ))(input)
}

fn register_index(text: &str) -> Option<u32> {
  match decimal(text) {
    Ok((_, digits)) => digits.parse::<u32>().ok(),
    Err(_)          => Register::from_mnemonic(text).map(|r| r.index() as u32)
  }
}

/// Parses one argument into the raw 32 bits it stands for.
fn parse_argument(line: usize, text: &str, jump_table: &JumpTable) -> Result<u32, AssemblyError> {
  let token = match argument_token(text) {
    Ok((_, token)) => token,
    Err(_) => {
      return Err(AssemblyError::BadArg { line, contents: text.to_string() });
    }
  };

  match token {

    ArgumentToken::Label(label) => {
      jump_table
        .resolve(label)
        .ok_or_else(|| AssemblyError::BadJumpLabel { line, label: text.to_string() })
    }

    ArgumentToken::Register(register) => {
      register_index(register)
        .ok_or_else(|| AssemblyError::BadRegister { line, raw: register.to_string() })
    }

    ArgumentToken::Int(int) => {
      int
        .parse::<i32>()
        .map(|value| value as u32)
        .map_err(|_| AssemblyError::BadInt { line, raw: text.to_string() })
    }

    ArgumentToken::Float(float) => {
      float
        .parse::<f32>()
        .map(f32::to_bits)
        .map_err(|_| AssemblyError::BadFloat { line, raw: text.to_string() })
    }

  }
}

// endregion

/// Narrows an argument to one of the 16 bit instruction fields.
fn short_argument(line: usize, args: &[u32], index: usize) -> Result<u16, AssemblyError> {
  let value = args.get(index).copied().unwrap_or(0);
  u16::try_from(value).map_err(|_| AssemblyError::ArgumentTooWide { line, value })
}

fn parse_opcode(line: usize, mnemonic: &str) -> Result<OpCode, AssemblyError> {
  OpCode::from_mnemonic(mnemonic)
    .ok_or_else(|| AssemblyError::UnknownMnemonic { line, mnemonic: mnemonic.to_string() })
}

fn parse_instruction(source: SourceLine<'_>, jump_table: &JumpTable) -> Result<Instruction, AssemblyError> {
  let line = source.number;

  let pivot = match source.text.find(char::is_whitespace) {
    Some(pivot) => pivot,
    None => {
      // A bare mnemonic.
      return Ok(Instruction::nullary(parse_opcode(line, source.text)?));
    }
  };

  let opcode = parse_opcode(line, &source.text[..pivot])?;
  let args =
    source.text[pivot..]
      .split(ARG_SEPARATOR)
      .map(str::trim)
      .map(|arg| parse_argument(line, arg, jump_table))
      .collect::<Result<Vec<u32>, AssemblyError>>()?;

  if args.len() > opcode.max_arg_count() {
    return Err(AssemblyError::TooManyArgs {
      line,
      opcode,
      given: args.len(),
      max: opcode.max_arg_count()
    });
  }

  match opcode.uses_long_arg() {

    true => {
      let long_arg = args.first().copied().unwrap_or(0);
      Ok(Instruction::with_long_arg(opcode, long_arg, short_argument(line, &args, 1)?))
    }

    false => {
      Ok(Instruction::new(
        opcode,
        short_argument(line, &args, 0)?,
        short_argument(line, &args, 1)?,
        short_argument(line, &args, 2)?,
      ))
    }

  }
}

/// Assembles a listing. Either every instruction line assembles, or the first error is returned.
pub fn parse_listing(listing: &str) -> Result<Vec<Instruction>, AssemblyError> {
  let jump_table = JumpTable::build(listing)?;

  source_lines(listing)
    .filter(|line| line.label().is_none())
    .map(|line| parse_instruction(line, &jump_table))
    .collect()
}
