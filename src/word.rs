/*!
  The `Word` is the unit of storage of the virtual machine: the register file and the stack
  are both sequences of words.

  A word is 32 untyped bits. The consumer decides how to read it: as a two's complement signed
  integer, a bool, a 16 bit address, or an IEEE-754 float. No conversion takes place, the
  accessors are plain bit casts. Reading a word as a type other than what was last written
  to it is undefined by contract: the result is whatever those bits happen to mean.
*/

use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Debug)]
pub struct Word(u32);

impl Word {
  /// An empty word containing zero.
  pub const ZERO: Word = Word(0);

  pub const fn from_raw(raw: u32) -> Word {
    Word(raw)
  }

  /// Packs the bit representation of `int` into the word.
  pub const fn from_int(int: i32) -> Word {
    Word(int as u32)
  }

  /// `true` is stored as `1`, `false` as `0`.
  pub const fn from_bool(bool: bool) -> Word {
    Word(bool as u32)
  }

  pub const fn from_address(address: u16) -> Word {
    Word(address as u32)
  }

  pub fn from_float(float: f32) -> Word {
    Word(float.to_bits())
  }

  // region Interpretations

  pub const fn raw(&self) -> u32 {
    self.0
  }

  pub const fn int(&self) -> i32 {
    self.0 as i32
  }

  /// Any non-zero word is `true`.
  pub const fn bool(&self) -> bool {
    self.0 != 0
  }

  /// The low 16 bits of the word.
  pub const fn address(&self) -> u16 {
    self.0 as u16
  }

  pub fn float(&self) -> f32 {
    f32::from_bits(self.0)
  }

  // endregion

  /// The word whose raw value is one greater. Used to advance the stack pointer.
  pub const fn next(&self) -> Word {
    Word(self.0.wrapping_add(1))
  }

  /// The word whose raw value is one less. Used to retreat the stack pointer.
  pub const fn previous(&self) -> Word {
    Word(self.0.wrapping_sub(1))
  }
}

impl From<i32> for Word {
  fn from(int: i32) -> Word {
    Word::from_int(int)
  }
}

impl From<bool> for Word {
  fn from(bool: bool) -> Word {
    Word::from_bool(bool)
  }
}

impl From<u16> for Word {
  fn from(address: u16) -> Word {
    Word::from_address(address)
  }
}

impl Display for Word {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "0x{:x}", self.0)
  }
}
