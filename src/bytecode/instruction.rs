use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/**
  Opcodes of the virtual machine.

  Each opcode is bound to a fixed number starting at zero, so the order the opcodes are listed
  below is significant: it is the encoding. The mnemonics are the lowercased variant names,
  except that `li` also accepts the spelling `loadi`.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,  Debug,    Hash
)]
#[strum(serialize_all = "lowercase")]
#[repr(u16)]
pub enum OpCode {
  Noop,   // noop
  Halt,   // halt
  Jmp,    // jmp  @label
  Cond,   // cond @label, $test
  #[strum(to_string = "li", serialize = "loadi")]
  Li,     // li   <int>i, $dst
  Addi,   // addi $a, $b, $dst
  Subi,
  Muli,
  Divi,
  Icri,   // icri $a, 0i, $dst
  Dcri,
  Eqi,    // eqi  $a, $b, $dst
  Neqi,
  Lti,
  Ltei,
  Gti,
  Gtei,
  Shli,   // shli $value, $amount, $dst
  Shri,
  Andb,   // andb $a, $b, $dst
  Orb,
  Xorb,
  Or,     // or   $a, $b, $dst
  And,
  Push,   // push $src
  Pop,    // pop  $dst
  Call,   // call @label
  Ret,    // ret
  Sys,    // sys  <number>i
}

impl OpCode {
  pub fn code(&self) -> u16 {
    Into::<u16>::into(*self)
  }

  pub fn from_code(code: u16) -> Option<OpCode> {
    OpCode::try_from(code).ok()
  }

  pub fn from_mnemonic(mnemonic: &str) -> Option<OpCode> {
    OpCode::from_str(mnemonic).ok()
  }

  /// Whether the opcode reads `arg0` and `arg1` as one 32 bit long argument.
  pub fn uses_long_arg(&self) -> bool {
    match self {
      | OpCode::Jmp
      | OpCode::Cond
      | OpCode::Li
      | OpCode::Call
      | OpCode::Sys => true,
      _             => false
    }
  }

  /// The most arguments a listing may supply for this opcode.
  pub fn max_arg_count(&self) -> usize {
    match self.uses_long_arg() {
      true  => 2,
      false => 3
    }
  }
}

/**
  An instruction packed into an unsigned 64 bit integer:

  ```text
  0xAAAA_BBBB_CCCC_DDDD
      |    |    |    |
      |    |    |    +----- arg2
      |    |    +---------- arg1
      |    +--------------- arg0
      +-------------------- opcode
  ```

  When the opcode uses a long argument, `arg0` is its high half and `arg1` its low half.

  Decoding never validates the opcode field. Any 64 bit pattern is an `Instruction`; an
  unknown opcode number is only detected when `op_code()` is asked for it, which panics.
*/
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Instruction(u64);

impl Instruction {
  pub const SIZE: usize = 8;

  pub fn new(opcode: OpCode, arg0: u16, arg1: u16, arg2: u16) -> Instruction {
    Instruction(
      ((opcode.code() as u64) << 48) |
        ((arg0        as u64) << 32) |
        ((arg1        as u64) << 16) |
         (arg2        as u64)
    )
  }

  /// Splits `long_arg` into the `arg0`/`arg1` halves.
  pub fn with_long_arg(opcode: OpCode, long_arg: u32, arg2: u16) -> Instruction {
    Instruction::new(opcode, (long_arg >> 16) as u16, (long_arg & 0xFFFF) as u16, arg2)
  }

  /// An instruction with every argument zero.
  pub fn nullary(opcode: OpCode) -> Instruction {
    Instruction::new(opcode, 0, 0, 0)
  }

  pub const fn from_raw(raw: u64) -> Instruction {
    Instruction(raw)
  }

  /// Decodes a little-endian instruction. Fails only if `bytes` is not exactly 8 bytes long.
  pub fn from_bytes(bytes: &[u8]) -> Option<Instruction> {
    <[u8; Instruction::SIZE]>::try_from(bytes)
      .ok()
      .map(|b| Instruction(u64::from_le_bytes(b)))
  }

  pub fn to_bytes(&self) -> [u8; Instruction::SIZE] {
    self.0.to_le_bytes()
  }

  pub const fn raw(&self) -> u64 {
    self.0
  }

  // region Field projections

  /// The raw opcode field, which need not name a known opcode.
  pub const fn op_code_bits(&self) -> u16 {
    (self.0 >> 48) as u16
  }

  pub fn try_op_code(&self) -> Option<OpCode> {
    OpCode::from_code(self.op_code_bits())
  }

  /// Panics if the opcode field does not name a known opcode.
  pub fn op_code(&self) -> OpCode {
    match self.try_op_code() {
      Some(opcode) => opcode,
      None => panic!(
        "Error: Instruction 0x{:016x} has unknown opcode 0x{:x}.",
        self.0,
        self.op_code_bits()
      )
    }
  }

  pub const fn arg0(&self) -> u16 {
    (self.0 >> 32) as u16
  }

  pub const fn arg1(&self) -> u16 {
    (self.0 >> 16) as u16
  }

  pub const fn arg2(&self) -> u16 {
    self.0 as u16
  }

  pub const fn long_arg(&self) -> u32 {
    (self.0 >> 16) as u32
  }

  // endregion
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.try_op_code() {

      Some(opcode) if opcode.uses_long_arg() => {
        write!(f, "{} 0x{:x}, 0x{:x}", opcode, self.long_arg(), self.arg2())
      }

      Some(opcode) => {
        write!(f, "{} 0x{:x}, 0x{:x}, 0x{:x}", opcode, self.arg0(), self.arg1(), self.arg2())
      }

      None => {
        write!(f, "<invalid 0x{:016x}>", self.0)
      }

    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use strum::IntoEnumIterator;

  #[test]
  fn opcodes_number_from_zero(){
    for (i, opcode) in OpCode::iter().enumerate() {
      assert_eq!(opcode.code() as usize, i);
    }
    assert_eq!(OpCode::Noop.code(), 0);
    assert_eq!(OpCode::Sys.code(), 28);
    assert_eq!(OpCode::from_code(29), None);
  }

  #[test]
  fn mnemonics(){
    assert_eq!(OpCode::from_mnemonic("xorb"), Some(OpCode::Xorb));
    assert_eq!(OpCode::from_mnemonic("li"), Some(OpCode::Li));
    assert_eq!(OpCode::from_mnemonic("loadi"), Some(OpCode::Li));
    assert_eq!(OpCode::from_mnemonic("and"), Some(OpCode::And));
    assert_eq!(OpCode::from_mnemonic("ADDI"), None);
    assert_eq!(OpCode::Li.to_string(), "li");
    assert_eq!(OpCode::Gtei.to_string(), "gtei");
  }

  #[test]
  fn long_arg_opcodes(){
    let long: Vec<OpCode> = OpCode::iter().filter(OpCode::uses_long_arg).collect();
    assert_eq!(long, vec![OpCode::Jmp, OpCode::Cond, OpCode::Li, OpCode::Call, OpCode::Sys]);
    assert_eq!(OpCode::Call.max_arg_count(), 2);
    assert_eq!(OpCode::Addi.max_arg_count(), 3);
  }

  #[test]
  fn field_layout(){
    let instruction = Instruction::new(OpCode::Addi, 0x1234, 0x5678, 0x9ABC);
    assert_eq!(instruction.raw(), 0x0005_1234_5678_9ABC);
    assert_eq!(instruction.op_code(), OpCode::Addi);
    assert_eq!(instruction.arg0(), 0x1234);
    assert_eq!(instruction.arg1(), 0x5678);
    assert_eq!(instruction.arg2(), 0x9ABC);
  }

  #[test]
  fn long_arg_layout(){
    let instruction = Instruction::with_long_arg(OpCode::Li, 0xDEAD_BEEF, 0x0007);
    assert_eq!(instruction.long_arg(), 0xDEAD_BEEF);
    assert_eq!(instruction.arg0(), 0xDEAD);
    assert_eq!(instruction.arg1(), 0xBEEF);
    assert_eq!(instruction.arg2(), 0x0007);
  }

  #[test]
  fn bytes_round_trip(){
    let instructions = [
      Instruction::nullary(OpCode::Halt),
      Instruction::new(OpCode::Xorb, 0xFFFF, 0, 1),
      Instruction::with_long_arg(OpCode::Jmp, u32::max_value(), 0xFFFF),
      Instruction::from_raw(0xFFFF_0000_0000_0001),
    ];
    for instruction in instructions.iter() {
      assert_eq!(Instruction::from_bytes(&instruction.to_bytes()), Some(*instruction));
    }
  }

  #[test]
  fn bytes_are_little_endian(){
    let instruction = Instruction::with_long_arg(OpCode::Jmp, 3, 0);
    assert_eq!(instruction.to_bytes(), [0, 0, 3, 0, 0, 0, 2, 0]);
  }

  #[test]
  fn from_bytes_requires_eight_bytes(){
    assert_eq!(Instruction::from_bytes(&[0; 7]), None);
    assert_eq!(Instruction::from_bytes(&[0; 9]), None);
    assert_eq!(Instruction::from_bytes(&[]), None);
  }

  #[test]
  fn unknown_opcode_decodes(){
    let instruction = Instruction::from_bytes(&[0, 0, 0, 0, 0, 0, 0xFF, 0xFF]).unwrap();
    assert_eq!(instruction.try_op_code(), None);
    assert_eq!(instruction.op_code_bits(), 0xFFFF);
  }

  #[test]
  #[should_panic]
  fn unknown_opcode_dispatch_panics(){
    Instruction::from_raw(0x0100_0000_0000_0000).op_code();
  }

  #[test]
  fn display(){
    assert_eq!(Instruction::with_long_arg(OpCode::Li, 42, 11).to_string(), "li 0x2a, 0xb");
    assert_eq!(Instruction::new(OpCode::Addi, 2, 3, 4).to_string(), "addi 0x2, 0x3, 0x4");
    assert_eq!(
      Instruction::from_raw(0xFFFF_0000_0000_0000).to_string(),
      "<invalid 0xffff000000000000>"
    );
  }
}
