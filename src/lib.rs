/*!
  A register-based virtual machine.

  Programs are written as text listings, assembled into fixed 64 bit instructions, and
  interpreted against a register file and a stack, both of which are address spaces of
  32 bit words.

  ```
  use kvm::{Program, Register, VirtualMachine};

  let listing = "
    li 2i, $gpr1
    li 8i, $gpr2
    call @_add
    jmp @exit
  _add:
    addi $gpr1, $gpr2, $gpr3
    ret
  exit:
    halt
  ";
  let program = Program::from_listing(listing).unwrap();
  let mut vm  = VirtualMachine::from(program);
  vm.run();
  assert_eq!(vm.registers()[Register::Gpr3].int(), 10);
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address_space;
pub mod bytecode;
pub mod program;
pub mod register;
pub mod system_call;
pub mod vm;
pub mod word;

pub use address_space::AddressSpace;
pub use bytecode::{AssemblyError, DeserializeError, Instruction, OpCode};
pub use program::Program;
pub use register::Register;
pub use system_call::{SystemCall, SystemCallTable};
pub use vm::{VirtualMachine, DEFAULT_STACK_SIZE};
pub use word::Word;
