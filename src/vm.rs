/*!
  The interpreter. A `VirtualMachine` owns a program, a register address space, a stack
  address space, a program counter, and a running flag.

  `run()` starts at instruction 0 and repeatedly fetches the instruction at the counter,
  advances the counter past it, and executes it, until a `halt` clears the running flag.
  There is no instruction budget: a program that never halts runs forever.

  Unless noted otherwise, an instruction reads registers `arg0` and `arg1` and writes its
  result to register `arg2`:

  ```text
  jmp   counter := long
  cond  if r[arg2] != 0 { counter := long }
  li    r[arg2] := long
  push  stack[r[sp]] := r[arg0]; r[sp] += 1
  pop   r[sp] -= 1; r[arg0] := stack[r[sp]]
  call  stack[r[sp]] := counter; r[sp] += 1; counter := long
  ret   r[sp] -= 1; counter := stack[r[sp]]
  sys   system call number `long`
  ```

  `call` pushes the counter, which already points at the instruction after the `call`, so
  `ret` resumes there.

  Runtime violations are not recoverable. An address outside of either address space, a
  counter outside of the program, an unknown opcode, an unmapped system call, and a division
  by zero all panic.
*/

use std::fmt::{Display, Formatter};

use crate::address_space::{AddressSpace, TABLE_DISPLAY_FORMAT};
use crate::bytecode::{Instruction, OpCode};
use crate::program::Program;
use crate::register::Register;
use crate::system_call::SystemCallTable;
use crate::word::Word;

/// Number of words of stack a machine has unless told otherwise.
pub const DEFAULT_STACK_SIZE: u16 = 1024;

pub struct VirtualMachine {
  program      : Program,
  system_calls : SystemCallTable,

  // Memory Stores
  registers    : AddressSpace,
  stack        : AddressSpace,

  /// Index of the next instruction to fetch.
  counter      : u32,
  is_running   : bool,
}

impl VirtualMachine {

  pub fn new(program: Program, system_calls: SystemCallTable) -> VirtualMachine {
    VirtualMachine::with_stack_size(program, system_calls, DEFAULT_STACK_SIZE)
  }

  pub fn with_stack_size(
    program      : Program,
    system_calls : SystemCallTable,
    stack_size   : u16
  ) -> VirtualMachine
  {
    VirtualMachine {
      program,
      system_calls,
      registers  : AddressSpace::new(Register::COUNT),
      stack      : AddressSpace::new(stack_size),
      counter    : 0,
      is_running : false,
    }
  }

  // region Accessors

  pub fn program(&self) -> &Program {
    &self.program
  }

  pub fn registers(&self) -> &AddressSpace {
    &self.registers
  }

  /// For seeding registers before `run()`.
  pub fn registers_mut(&mut self) -> &mut AddressSpace {
    &mut self.registers
  }

  pub fn stack(&self) -> &AddressSpace {
    &self.stack
  }

  pub fn stack_mut(&mut self) -> &mut AddressSpace {
    &mut self.stack
  }

  pub fn counter(&self) -> u32 {
    self.counter
  }

  pub fn is_running(&self) -> bool {
    self.is_running
  }

  // endregion

  // region Interpretation

  /// Returns the instruction at the counter and advances the counter past it.
  pub fn fetch(&mut self) -> Instruction {
    let instruction = self.program[self.counter];
    self.counter = self.counter.wrapping_add(1);
    instruction
  }

  /// Fetches and executes a single instruction.
  pub fn step(&mut self) {
    let instruction = self.fetch();
    #[cfg(feature = "trace_computation")]
    println!("{:>6}: {}", self.counter.wrapping_sub(1), instruction);

    self.execute(instruction);

    #[cfg(feature = "trace_computation")]
    println!("{}", self);
  }

  /**
    Executes the program from its first instruction until it halts, blocking the calling
    thread. Registers and stack are not reset, so a caller may seed them beforehand and read
    the results afterward.
  */
  pub fn run(&mut self) {
    self.counter    = 0;
    self.is_running = true;

    #[cfg(feature = "trace_computation")]
    println!("{}", self);

    while self.is_running {
      self.step();
    }
  }

  /// Executes `i` against the registers and stack. May change the counter.
  pub fn execute(&mut self, i: Instruction) {
    match i.op_code() {

      OpCode::Noop => {}

      OpCode::Halt => {
        self.is_running = false;
      }

      OpCode::Jmp => {
        self.counter = i.long_arg();
      }

      OpCode::Cond => {
        if self.registers[i.arg2()].bool() {
          self.counter = i.long_arg();
        }
      }

      OpCode::Li => {
        self.registers[i.arg2()] = Word::from_raw(i.long_arg());
      }

      // region Integer arithmetic

      OpCode::Addi => self.integer_op(i, i32::wrapping_add),
      OpCode::Subi => self.integer_op(i, i32::wrapping_sub),
      OpCode::Muli => self.integer_op(i, i32::wrapping_mul),
      OpCode::Divi => self.integer_op(i, divide),

      OpCode::Icri => {
        self.registers[i.arg2()] = Word::from_int(self.registers[i.arg0()].int().wrapping_add(1));
      }

      OpCode::Dcri => {
        self.registers[i.arg2()] = Word::from_int(self.registers[i.arg0()].int().wrapping_sub(1));
      }

      OpCode::Shli => self.integer_op(i, shift_left),
      OpCode::Shri => self.integer_op(i, shift_right),

      // endregion

      // region Comparisons

      OpCode::Eqi  => self.comparison(i, |a, b| a == b),
      OpCode::Neqi => self.comparison(i, |a, b| a != b),
      OpCode::Lti  => self.comparison(i, |a, b| a <  b),
      OpCode::Ltei => self.comparison(i, |a, b| a <= b),
      OpCode::Gti  => self.comparison(i, |a, b| a >  b),
      OpCode::Gtei => self.comparison(i, |a, b| a >= b),

      // endregion

      // region Bitwise and logical

      OpCode::Andb => self.bitwise_op(i, |a, b| a & b),
      OpCode::Orb  => self.bitwise_op(i, |a, b| a | b),
      OpCode::Xorb => self.bitwise_op(i, |a, b| a ^ b),

      OpCode::Or => {
        let result = self.registers[i.arg0()].bool() || self.registers[i.arg1()].bool();
        self.registers[i.arg2()] = Word::from_bool(result);
      }

      OpCode::And => {
        let result = self.registers[i.arg0()].bool() && self.registers[i.arg1()].bool();
        self.registers[i.arg2()] = Word::from_bool(result);
      }

      // endregion

      // region Stack

      OpCode::Push => {
        let value = self.registers[i.arg0()];
        self.push(value);
      }

      OpCode::Pop => {
        let value = self.pop();
        self.registers[i.arg0()] = value;
      }

      OpCode::Call => {
        let return_address = Word::from_raw(self.counter);
        self.push(return_address);
        self.counter = i.long_arg();
      }

      OpCode::Ret => {
        self.counter = self.pop().raw();
      }

      // endregion

      OpCode::Sys => {
        self.system_calls.invoke(i.long_arg(), &mut self.registers, &mut self.stack);
      }

    }
  }

  fn integer_op<F>(&mut self, i: Instruction, op: F)
    where F: Fn(i32, i32) -> i32
  {
    let result = op(self.registers[i.arg0()].int(), self.registers[i.arg1()].int());
    self.registers[i.arg2()] = Word::from_int(result);
  }

  fn comparison<F>(&mut self, i: Instruction, op: F)
    where F: Fn(i32, i32) -> bool
  {
    let result = op(self.registers[i.arg0()].int(), self.registers[i.arg1()].int());
    self.registers[i.arg2()] = Word::from_bool(result);
  }

  fn bitwise_op<F>(&mut self, i: Instruction, op: F)
    where F: Fn(u32, u32) -> u32
  {
    let result = op(self.registers[i.arg0()].raw(), self.registers[i.arg1()].raw());
    self.registers[i.arg2()] = Word::from_raw(result);
  }

  fn push(&mut self, value: Word) {
    let sp = self.registers[Register::Sp];
    self.stack[sp.address()] = value;
    self.registers[Register::Sp] = sp.next();
  }

  fn pop(&mut self) -> Word {
    let sp = self.registers[Register::Sp].previous();
    self.registers[Register::Sp] = sp;
    self.stack[sp.address()]
  }

  // endregion
}

impl From<Program> for VirtualMachine {
  fn from(program: Program) -> VirtualMachine {
    VirtualMachine::new(program, SystemCallTable::new())
  }
}

/// Panics on a zero divisor, and on the overflow of `i32::MIN / -1`.
fn divide(dividend: i32, divisor: i32) -> i32 {
  if divisor == 0 {
    panic!("Error: Division of {} by zero.", dividend);
  }
  dividend / divisor
}

/// Shifts left by `amount`, or right by `-amount` if it is negative. Shifting by 32 or more
/// shifts every bit out.
fn shift_left(value: i32, amount: i32) -> i32 {
  match amount {
    a if a >= 32  => 0,
    a if a >= 0   => value << a,
    a if a <= -32 => value >> 31,
    a             => value >> -a,
  }
}

/// Arithmetic shift right by `amount`, or left by `-amount` if it is negative.
fn shift_right(value: i32, amount: i32) -> i32 {
  match amount {
    a if a >= 32  => value >> 31,
    a if a >= 0   => value >> a,
    a if a <= -32 => 0,
    a             => value << -a,
  }
}

impl Display for VirtualMachine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    // Only the occupied part of the stack.
    let depth = self.registers[Register::Sp].address() as usize;

    let register_table = self.registers.register_table();
    let stack_table    = self.stack.table('S', depth);

    let mut combined_table = table!([register_table, stack_table]);

    combined_table.set_titles(row![ub->"Registers", ub->"Stack"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let state = match self.is_running {
      true  => "Running",
      false => "Halted"
    };

    write!(f, "Counter: {}\t{}\n{}", self.counter, state, combined_table)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn run(listing: &str) -> VirtualMachine {
    let mut vm = VirtualMachine::from(Program::from_listing(listing).unwrap());
    vm.run();
    vm
  }

  fn register(vm: &VirtualMachine, index: u16) -> i32 {
    vm.registers()[index].int()
  }

  #[test]
  fn arithmetic(){
    let vm = run("loadi 2i, $2\nloadi 3i, $3\naddi $2, $3, $4\nhalt");
    assert_eq!(register(&vm, 4), 5);
    assert!(!vm.is_running());
    assert_eq!(vm.counter(), 4);
  }

  #[test]
  fn conditional_branch(){
    let listing = "loadi 2i, $0\nloadi 3i, $1\nlti $0,$1,$2\ncond @load42,$2\njmp @exit\nload42:\nloadi 42i,$11\nexit:\nhalt";
    let vm = run(listing);
    assert_eq!(register(&vm, 11), 42);
  }

  #[test]
  fn conditional_branch_not_taken(){
    let listing = "loadi 3i, $2\nloadi 2i, $3\nlti $2,$3,$4\ncond @load42,$4\njmp @exit\nload42:\nloadi 42i,$11\nexit:\nhalt";
    let vm = run(listing);
    assert_eq!(register(&vm, 11), 0);
  }

  #[test]
  fn call_and_return(){
    let listing = "li 2i,$gpr1\nli 8i,$gpr2\ncall @_add\njmp @exit\n_add:\naddi $gpr1,$gpr2,$gpr3\nret\nexit:\nhalt";
    let vm = run(listing);
    assert_eq!(vm.registers()[Register::Gpr3].int(), 10);
    assert_eq!(vm.registers()[Register::Sp], Word::ZERO);
    // The return address is left behind on the stack.
    assert_eq!(vm.stack()[0].raw(), 3);
  }

  #[test]
  fn nested_calls(){
    let listing = "
      li 3i, $gpr1
      call @outer
      halt
      outer:
        call @inner
        icri $gpr1, 0i, $gpr1
        ret
      inner:
        muli $gpr1, $gpr1, $gpr1
        ret
    ";
    let vm = run(listing);
    assert_eq!(vm.registers()[Register::Gpr1].int(), 10);
    assert_eq!(vm.registers()[Register::Sp], Word::ZERO);
  }

  #[test]
  fn countdown_loop(){
    let listing = "
      li 5i, $gpr1
      li 0i, $gpr2
      loop:
        addi $gpr2, $gpr1, $gpr2
        dcri $gpr1, 0i, $gpr1
        cond @loop, $gpr1
      halt
    ";
    let vm = run(listing);
    assert_eq!(vm.registers()[Register::Gpr2].int(), 15);
    assert_eq!(vm.registers()[Register::Gpr1].int(), 0);
  }

  #[test]
  fn integer_ops(){
    let mut vm = VirtualMachine::from(Program::from_listing("
      subi $2, $3, $4
      muli $2, $3, $5
      divi $2, $3, $6
      icri $2, 0i, $7
      dcri $3, 0i, $8
      halt
    ").unwrap());
    vm.registers_mut()[2] = Word::from_int(-7);
    vm.registers_mut()[3] = Word::from_int(2);
    vm.run();
    assert_eq!(register(&vm, 4), -9);
    assert_eq!(register(&vm, 5), -14);
    assert_eq!(register(&vm, 6), -3);
    assert_eq!(register(&vm, 7), -6);
    assert_eq!(register(&vm, 8), 1);
  }

  #[test]
  fn arithmetic_wraps(){
    let mut vm = VirtualMachine::from(Program::from_listing("addi $2, $3, $4\nicri $2, 0i, $5\nhalt").unwrap());
    vm.registers_mut()[2] = Word::from_int(i32::max_value());
    vm.registers_mut()[3] = Word::from_int(1);
    vm.run();
    assert_eq!(register(&vm, 4), i32::min_value());
    assert_eq!(register(&vm, 5), i32::min_value());
  }

  #[test]
  fn comparisons(){
    let mut vm = VirtualMachine::from(Program::from_listing("
      eqi  $2, $3, $4
      neqi $2, $3, $5
      lti  $2, $3, $6
      ltei $2, $2, $7
      gti  $2, $3, $8
      gtei $3, $2, $9
      halt
    ").unwrap());
    vm.registers_mut()[2] = Word::from_int(-1);
    vm.registers_mut()[3] = Word::from_int(1);
    vm.run();
    let results: Vec<i32> = (4..10).map(|r| register(&vm, r)).collect();
    assert_eq!(results, vec![0, 1, 1, 1, 0, 1]);
  }

  #[test]
  fn shifts(){
    assert_eq!(shift_left(1, 3), 8);
    assert_eq!(shift_left(1, 32), 0);
    assert_eq!(shift_left(8, -2), 2);
    assert_eq!(shift_left(-8, -40), -1);
    assert_eq!(shift_right(-8, 1), -4);
    assert_eq!(shift_right(-8, 40), -1);
    assert_eq!(shift_right(8, 40), 0);
    assert_eq!(shift_right(1, -4), 16);

    let vm = run("li 3i, $2\nli 2i, $3\nshli $2, $3, $4\nshri $4, $3, $5\nhalt");
    assert_eq!(register(&vm, 4), 12);
    assert_eq!(register(&vm, 5), 3);
  }

  #[test]
  fn bitwise_ops(){
    let vm = run("li 12i, $2\nli 10i, $3\nandb $2, $3, $4\norb $2, $3, $5\nxorb $2, $3, $6\nhalt");
    assert_eq!(register(&vm, 4), 8);
    assert_eq!(register(&vm, 5), 14);
    assert_eq!(register(&vm, 6), 6);
  }

  #[test]
  fn logical_ops(){
    let vm = run("li 4i, $2\nor $2, $3, $4\nand $2, $3, $5\nand $2, $2, $6\nor $3, $3, $7\nhalt");
    assert_eq!(register(&vm, 4), 1);
    assert_eq!(register(&vm, 5), 0);
    assert_eq!(register(&vm, 6), 1);
    assert_eq!(register(&vm, 7), 0);
  }

  #[test]
  fn push_and_pop(){
    let vm = run("li 7i, $gpr1\nli 9i, $gpr2\npush $gpr1\npush $gpr2\npop $gpr3\nhalt");
    assert_eq!(vm.registers()[Register::Gpr3].int(), 9);
    assert_eq!(vm.registers()[Register::Sp].raw(), 1);
    assert_eq!(vm.stack()[0].int(), 7);
    assert_eq!(vm.stack()[1].int(), 9);
  }

  #[test]
  fn float_bits_pass_through(){
    let vm = run("li 2.5f, $gpr1\nhalt");
    assert_eq!(vm.registers()[Register::Gpr1].float(), 2.5);
  }

  #[test]
  fn system_call(){
    let calls = SystemCallTable::new().with(5, |registers, stack| {
      let sum = registers[Register::Gpr1].int() + stack[0].int();
      registers[Register::Gpr2] = Word::from_int(sum);
    });
    let program = Program::from_listing("li 4i, $gpr1\npush $gpr1\nsys 5i\nhalt").unwrap();
    let mut vm = VirtualMachine::new(program, calls);
    vm.run();
    assert_eq!(vm.registers()[Register::Gpr2].int(), 8);
  }

  #[test]
  fn run_restarts_at_zero(){
    let mut vm = VirtualMachine::from(Program::from_listing("icri $gpr1, 0i, $gpr1\nhalt").unwrap());
    vm.run();
    vm.run();
    assert_eq!(vm.registers()[Register::Gpr1].int(), 2);
  }

  #[test]
  fn step_by_step(){
    let mut vm = VirtualMachine::from(Program::from_listing("li 1i, $gpr1\nhalt").unwrap());
    vm.step();
    assert_eq!(vm.counter(), 1);
    assert_eq!(vm.registers()[Register::Gpr1].int(), 1);
  }

  #[test]
  fn custom_stack_size(){
    let vm = VirtualMachine::with_stack_size(Program::default(), SystemCallTable::new(), 16);
    assert_eq!(vm.stack().size(), 16);
    assert_eq!(vm.registers().size(), Register::COUNT);
  }

  #[test]
  #[should_panic]
  fn unmapped_system_call(){
    run("sys 1i\nhalt");
  }

  #[test]
  #[should_panic]
  fn division_by_zero(){
    run("li 1i, $2\ndivi $2, $3, $4\nhalt");
  }

  #[test]
  #[should_panic]
  fn stack_underflow(){
    run("pop $gpr1\nhalt");
  }

  #[test]
  #[should_panic]
  fn stack_overflow(){
    let program = Program::from_listing("loop:\npush $gpr1\njmp @loop").unwrap();
    let mut vm = VirtualMachine::with_stack_size(program, SystemCallTable::new(), 4);
    vm.run();
  }

  #[test]
  #[should_panic]
  fn register_out_of_range(){
    run("li 1i, $12\nhalt");
  }

  #[test]
  #[should_panic]
  fn running_off_the_end(){
    run("noop");
  }

  #[test]
  #[should_panic]
  fn unknown_opcode(){
    let mut vm = VirtualMachine::from(Program::new(vec![Instruction::from_raw(0x00FF_0000_0000_0000)]));
    vm.run();
  }

  #[test]
  fn display(){
    let vm = run("li 7i, $gpr1\npush $gpr1\nhalt");
    let text = format!("{}", vm);
    assert!(text.starts_with("Counter: 3\tHalted"));
    assert!(text.contains("gpr1 ="));
    assert!(text.contains("S[0] ="));
  }
}
