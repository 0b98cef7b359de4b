/*!

  Instructions are a fixed 64 bits: a 16 bit opcode followed by three 16 bit arguments. Some
  opcodes need a wider immediate or jump target than 16 bits, so for those the first two
  arguments are read together as a single 32 bit "long" argument. Whether an opcode does so
  is a fixed property of the opcode (`OpCode::uses_long_arg`).

  One design decision that needed to be made is whether to represent an instruction as an
  enum with one variant per opcode carrying its arguments, or as its packed bits. Instructions
  are stored, serialized and hashed as their raw 64 bit value, so the packed form is the
  representation, and the fields are projections of it.

  There are two ways to produce instructions:

    - `assembly` compiles a text listing, resolving labels to instruction offsets.
    - `binary` decodes the flat byte form that `binary::serialize` produces.

*/

mod assembly;
mod binary;
mod instruction;

pub use assembly::{parse_listing, AssemblyError};
pub use binary::{deserialize, serialize, DeserializeError};
pub use instruction::{Instruction, OpCode};
