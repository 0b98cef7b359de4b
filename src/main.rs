//! Assembles a listing, or loads a binary program, and runs it.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use kvm::{Program, Register, SystemCallTable, VirtualMachine, DEFAULT_STACK_SIZE};

const DEMO_LISTING: &str = "
_main:
   li 2i, $gpr1
   li 8i, $gpr2
   call @_add
   sys 0i
   jmp @exit
_add:
   addi $gpr1, $gpr2, $gpr1
   ret
exit:
   halt
";

#[derive(Parser, Debug)]
#[command(name = "kvm", about = "Runs a program on the kvm virtual machine")]
struct Args {
  /// Listing to assemble and run. Runs a built-in demo if omitted.
  program: Option<PathBuf>,

  /// Read PROGRAM as a serialized binary program instead of a listing.
  #[arg(long)]
  binary: bool,

  /// Write the program in binary form to this path before running it.
  #[arg(long, value_name = "PATH")]
  emit: Option<PathBuf>,

  /// Number of words of stack.
  #[arg(long, default_value_t = DEFAULT_STACK_SIZE)]
  stack_size: u16,
}

fn system_calls() -> SystemCallTable {
  SystemCallTable::new()
    .with(0, |registers, _| println!("{}", registers[Register::Gpr1].int()))
    .with(1, |registers, _| println!("{}", registers[Register::Gpr1].float()))
}

fn load(args: &Args) -> Result<Program, String> {
  let path = match &args.program {
    Some(path) => path,
    None       => return Program::from_listing(DEMO_LISTING).map_err(|e| e.to_string())
  };

  match args.binary {

    true => {
      let bytes = fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
      Program::from_bytes(&bytes).map_err(|e| format!("{}: {}", path.display(), e))
    }

    false => {
      let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
      Program::from_listing(&text).map_err(|e| format!("{}: {}", path.display(), e))
    }

  }
}

fn main() {
  let args = Args::parse();

  let program = match load(&args) {
    Ok(program) => program,
    Err(message) => {
      eprintln!("{}", message);
      process::exit(1);
    }
  };

  if let Some(path) = &args.emit {
    if let Err(e) = fs::write(path, program.to_bytes()) {
      eprintln!("{}: {}", path.display(), e);
      process::exit(1);
    }
  }

  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  println!("{}\n", program);

  let mut vm = VirtualMachine::with_stack_size(program, system_calls(), args.stack_size);
  vm.run();

  println!("\n{}", vm.registers().register_table());
}
