/*!
  This module is responsible for the binary form of a sequence of instructions: each
  instruction's 8 byte little-endian raw value, concatenated in order, with no header,
  padding, or checksum.
*/

use thiserror::Error;

use super::Instruction;

#[derive(Error, Clone, Copy, Eq, PartialEq, Debug)]
pub enum DeserializeError {
  #[error("binary program of {length} bytes is not a whole number of 8 byte instructions")]
  Misaligned { length: usize },
}

pub fn serialize(instructions: &[Instruction]) -> Vec<u8> {
  let mut buffer = Vec::with_capacity(instructions.len() * Instruction::SIZE);
  for instruction in instructions {
    buffer.extend_from_slice(&instruction.to_bytes());
  }
  buffer
}

/**
  Decodes every consecutive 8 byte chunk of `bytes`. The buffer as a whole must be a
  multiple of 8 bytes long. A chunk that fails to decode on its own is skipped rather
  than failing the whole buffer.
*/
pub fn deserialize(bytes: &[u8]) -> Result<Vec<Instruction>, DeserializeError> {
  if bytes.len() % Instruction::SIZE != 0 {
    return Err(DeserializeError::Misaligned { length: bytes.len() });
  }

  let instructions =
    bytes.chunks(Instruction::SIZE)
         .filter_map(Instruction::from_bytes)
         .collect();
  Ok(instructions)
}
