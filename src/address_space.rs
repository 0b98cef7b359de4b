/*!
  An `AddressSpace` is a fixed size, bounds checked sequence of `Word`s. The virtual machine
  has two of them: the register file and the stack.

  Address spaces have value semantics. Cloning one is logically a deep copy, but the words
  are held in reference counted storage that is only duplicated on the first write to a
  space whose storage is shared. Observably this is identical to copying eagerly.

  Addresses are unsigned 16 bit numbers. Accessing an address outside of the space is a
  contract violation and panics; programs are responsible for keeping their stack pointer
  and register operands in range.
*/

use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use prettytable::{format as TableFormat, Table};

use crate::register::Register;
use crate::word::Word;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AddressSpace {
  storage: Rc<Vec<Word>>
}

impl AddressSpace {

  /// Creates an address space holding `size` words, all zero.
  pub fn new(size: u16) -> AddressSpace {
    AddressSpace {
      storage: Rc::new(vec![Word::ZERO; size as usize])
    }
  }

  /// Number of words available in the address space.
  pub fn size(&self) -> u16 {
    self.storage.len() as u16
  }

  /// Reads the word at `address`, or `None` if the address is out of range.
  pub fn get(&self, address: u16) -> Option<Word> {
    self.storage.get(address as usize).copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Word> {
    self.storage.iter()
  }

  /// Whether `self` and `other` currently share backing storage, i.e. neither has been
  /// written to since one was cloned from the other.
  pub fn shares_storage_with(&self, other: &AddressSpace) -> bool {
    Rc::ptr_eq(&self.storage, &other.storage)
  }

  fn require_in_bounds(&self, address: u16) {
    if (address as usize) < self.storage.len() {
      return;
    }
    panic!(
      "Error: Address 0x{:x} is outside of an address space of size 0x{:x}.",
      address,
      self.storage.len()
    );
  }

  // region Display methods

  /// Builds a table of the first `count` words of the space, labeling rows `name[address]`.
  pub fn table(&self, name: char, count: usize) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, word) in self.storage.iter().enumerate().take(count) {
      table.add_row(row![r->format!("{}[{}] =", name, i), format!("{}", word)]);
    }
    table
  }

  /// Builds a table interpreting the space as the register file. Addresses
  /// without a mnemonic are labeled by number.
  pub fn register_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);

    for (i, word) in self.storage.iter().enumerate() {
      let name = match Register::from_index(i as u16) {
        Some(register) => register.to_string(),
        None           => format!("${}", i)
      };
      table.add_row(row![r->format!("{} =", name), format!("{}", word)]);
    }
    table
  }

  // endregion
}

impl Index<u16> for AddressSpace {
  type Output = Word;

  fn index(&self, address: u16) -> &Word {
    self.require_in_bounds(address);
    &self.storage[address as usize]
  }
}

impl IndexMut<u16> for AddressSpace {
  fn index_mut(&mut self, address: u16) -> &mut Word {
    self.require_in_bounds(address);
    // Copies the words first if another space still shares them.
    &mut Rc::make_mut(&mut self.storage)[address as usize]
  }
}

impl Index<Register> for AddressSpace {
  type Output = Word;

  fn index(&self, register: Register) -> &Word {
    &self[register.index()]
  }
}

impl IndexMut<Register> for AddressSpace {
  fn index_mut(&mut self, register: Register) -> &mut Word {
    &mut self[register.index()]
  }
}

/// Lists the non-zero words, one `address: word` pair per line.
impl Display for AddressSpace {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let lines =
      self.storage
          .iter()
          .enumerate()
          .filter(|(_, word)| **word != Word::ZERO)
          .map(|(address, word)| format!("0x{:x}: {}", address, word))
          .collect::<Vec<String>>();
    write!(f, "{}", lines.join("\n"))
  }
}

lazy_static! {
  pub(crate) static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}
