//! Mnemonic names for the slots of the register address space.

use std::convert::TryFrom;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/**
  Each register is an index into the register `AddressSpace`. The order the registers are
  listed below is significant, as it fixes their index.

  By convention the caller of a function places its arguments in the general purpose
  registers before `call`, and the callee leaves its return value in `gpr1`.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,  Debug,    Hash
)]
#[strum(serialize_all = "lowercase")]
#[repr(u16)]
pub enum Register {
  /// The condition register.
  Cond,
  /// The stack pointer. Holds the stack address the next `push` writes to.
  Sp,
  /// The first general purpose register. Contains the return value and first argument of
  /// functions by convention.
  Gpr1,
  Gpr2,
  Gpr3,
  Gpr4,
  Gpr5,
  Gpr6,
  Gpr7,
  Gpr8,
  Gpr9,
  Gpr10,
}

impl Register {
  /// The number of registers, which is also the size of the register address space.
  pub const COUNT: u16 = 12;

  pub fn from_mnemonic(mnemonic: &str) -> Option<Register> {
    Register::from_str(mnemonic).ok()
  }

  pub fn from_index(index: u16) -> Option<Register> {
    Register::try_from(index).ok()
  }

  pub fn index(&self) -> u16 {
    Into::<u16>::into(*self)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use strum::IntoEnumIterator;

  #[test]
  fn count_matches_variants(){
    assert_eq!(Register::iter().count(), Register::COUNT as usize);
  }

  #[test]
  fn fixed_indices(){
    assert_eq!(Register::Cond.index(), 0);
    assert_eq!(Register::Sp.index(), 1);
    assert_eq!(Register::Gpr1.index(), 2);
    assert_eq!(Register::Gpr10.index(), 11);
  }

  #[test]
  fn mnemonics(){
    assert_eq!(Register::from_mnemonic("sp"), Some(Register::Sp));
    assert_eq!(Register::from_mnemonic("gpr10"), Some(Register::Gpr10));
    assert_eq!(Register::from_mnemonic("gpr11"), None);
    assert_eq!(Register::Gpr3.to_string(), "gpr3");
  }

  #[test]
  fn index_round_trip(){
    for register in Register::iter() {
      assert_eq!(Register::from_index(register.index()), Some(register));
    }
    assert_eq!(Register::from_index(Register::COUNT), None);
  }
}
