//! A `Program` is the ordered sequence of instructions a virtual machine interprets.

use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::bytecode::{self, AssemblyError, DeserializeError, Instruction};

#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Program {
  listing: Vec<Instruction>
}

impl Program {

  pub fn new(listing: Vec<Instruction>) -> Program {
    Program { listing }
  }

  /// Assembles a text listing.
  pub fn from_listing(listing: &str) -> Result<Program, AssemblyError> {
    bytecode::parse_listing(listing).map(Program::new)
  }

  /// Loads a program previously produced by `to_bytes`.
  pub fn from_bytes(bytes: &[u8]) -> Result<Program, DeserializeError> {
    bytecode::deserialize(bytes).map(Program::new)
  }

  pub fn to_bytes(&self) -> Vec<u8> {
    bytecode::serialize(&self.listing)
  }

  pub fn instructions(&self) -> &[Instruction] {
    &self.listing
  }

  pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
    self.listing.iter()
  }

  pub fn len(&self) -> usize {
    self.listing.len()
  }

  pub fn is_empty(&self) -> bool {
    self.listing.is_empty()
  }

  pub fn push(&mut self, instruction: Instruction) {
    self.listing.push(instruction);
  }
}

impl From<Vec<Instruction>> for Program {
  fn from(listing: Vec<Instruction>) -> Program {
    Program::new(listing)
  }
}

impl FromStr for Program {
  type Err = AssemblyError;

  fn from_str(listing: &str) -> Result<Program, AssemblyError> {
    Program::from_listing(listing)
  }
}

/// Indexing past the end of the program panics: control flow has left the program.
impl Index<u32> for Program {
  type Output = Instruction;

  fn index(&self, index: u32) -> &Instruction {
    match self.listing.get(index as usize) {
      Some(instruction) => instruction,
      None => panic!(
        "Error: Instruction {} is outside of a program of {} instructions.",
        index,
        self.listing.len()
      )
    }
  }
}

impl IndexMut<u32> for Program {
  fn index_mut(&mut self, index: u32) -> &mut Instruction {
    let length = self.listing.len();
    match self.listing.get_mut(index as usize) {
      Some(instruction) => instruction,
      None => panic!(
        "Error: Instruction {} is outside of a program of {} instructions.",
        index,
        length
      )
    }
  }
}

/// One instruction per line, numbered from 1.
impl Display for Program {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}",
      self.listing
          .iter()
          .enumerate()
          .map(|(line, instruction)| format!("{} {}", line + 1, instruction))
          .collect::<Vec<String>>()
          .join("\n")
    )
  }
}
