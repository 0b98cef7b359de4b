/*!
  System calls are host functions a program reaches through the `sys` instruction. Each is
  given the register and stack address spaces of the machine for the duration of the call,
  and may read and modify both.
*/

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use crate::address_space::AddressSpace;

/// A host function taking `(registers, stack)`.
pub type SystemCall = Box<dyn FnMut(&mut AddressSpace, &mut AddressSpace)>;

/// The system calls available to a program, keyed by the number `sys` is given.
#[derive(Default)]
pub struct SystemCallTable {
  calls: HashMap<u32, SystemCall>
}

impl SystemCallTable {

  pub fn new() -> SystemCallTable {
    SystemCallTable { calls: HashMap::new() }
  }

  /// Builder form of `insert`.
  pub fn with<F>(mut self, number: u32, call: F) -> SystemCallTable
    where F: FnMut(&mut AddressSpace, &mut AddressSpace) + 'static
  {
    self.insert(number, call);
    self
  }

  /// Maps `number` to `call`, replacing any call already mapped to it.
  pub fn insert<F>(&mut self, number: u32, call: F)
    where F: FnMut(&mut AddressSpace, &mut AddressSpace) + 'static
  {
    self.calls.insert(number, Box::new(call));
  }

  pub fn contains(&self, number: u32) -> bool {
    self.calls.contains_key(&number)
  }

  pub fn len(&self) -> usize {
    self.calls.len()
  }

  pub fn is_empty(&self) -> bool {
    self.calls.is_empty()
  }

  /// Runs the call mapped to `number`. Panics if there is none.
  pub fn invoke(&mut self, number: u32, registers: &mut AddressSpace, stack: &mut AddressSpace) {
    match self.calls.get_mut(&number) {
      Some(call) => call(registers, stack),
      None       => panic!("Error: No system call is mapped to number {}.", number)
    }
  }
}

impl Debug for SystemCallTable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut numbers: Vec<&u32> = self.calls.keys().collect();
    numbers.sort();
    f.debug_struct("SystemCallTable").field("calls", &numbers).finish()
  }
}
