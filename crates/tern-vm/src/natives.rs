//! Native runtime primitives.
//!
//! These are callable by name from IR programs but have no IR body. The
//! symbol names match what the producing compiler emits. Strings follow
//! the producer's layout: a pointer to the first character word, with the
//! length stored in the word at `ptr - 1`.

use std::io::Write;

use crate::error::FaultKind;
use crate::eval::Machine;

/// The fixed set of native primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Native {
    /// `_eta_alloc(words) -> base`: fresh zero-filled heap block.
    Alloc,
    /// `_eta_out_of_bounds()`: the bounds-check trap; always faults.
    OutOfBounds,
    /// `_eta_printint(v)`: prints a decimal integer and newline.
    PrintInt,
    /// `_eta_print(ptr)`: prints a length-prefixed character array.
    Print,
    /// `_eta_println(ptr)`: like `_eta_print` plus a newline.
    PrintLn,
}

impl Native {
    pub const ALL: &'static [Native] = &[
        Native::Alloc,
        Native::OutOfBounds,
        Native::PrintInt,
        Native::Print,
        Native::PrintLn,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Native::Alloc => "_eta_alloc",
            Native::OutOfBounds => "_eta_out_of_bounds",
            Native::PrintInt => "_eta_printint",
            Native::Print => "_eta_print",
            Native::PrintLn => "_eta_println",
        }
    }

    pub fn invoke(self, machine: &mut Machine<'_>, args: &[i64]) -> Result<Vec<i64>, FaultKind> {
        match self {
            Native::Alloc => {
                let words = arg(self, args, 0)?;
                if words < 0 {
                    return Err(FaultKind::Native(format!(
                        "{}: negative size {}",
                        self.symbol(),
                        words
                    )));
                }
                let base = machine.mem.alloc(words as usize);
                Ok(vec![base])
            }
            Native::OutOfBounds => Err(FaultKind::BoundsTrap),
            Native::PrintInt => {
                let value = arg(self, args, 0)?;
                writeln!(machine.out, "{}", value)
                    .map_err(|e| FaultKind::Native(e.to_string()))?;
                Ok(Vec::new())
            }
            Native::Print => {
                let text = read_string(machine, arg(self, args, 0)?)?;
                write!(machine.out, "{}", text).map_err(|e| FaultKind::Native(e.to_string()))?;
                Ok(Vec::new())
            }
            Native::PrintLn => {
                let text = read_string(machine, arg(self, args, 0)?)?;
                writeln!(machine.out, "{}", text)
                    .map_err(|e| FaultKind::Native(e.to_string()))?;
                Ok(Vec::new())
            }
        }
    }
}

fn arg(native: Native, args: &[i64], index: usize) -> Result<i64, FaultKind> {
    args.get(index).copied().ok_or_else(|| {
        FaultKind::Native(format!(
            "{}: expected at least {} argument(s), got {}",
            native.symbol(),
            index + 1,
            args.len()
        ))
    })
}

/// Reads a length-prefixed character array into a host string. Words that
/// are not valid scalar values render as U+FFFD.
fn read_string(machine: &Machine<'_>, ptr: i64) -> Result<String, FaultKind> {
    // The pointer is program-supplied; address arithmetic must fault, not
    // overflow.
    let len_addr = ptr
        .checked_sub(1)
        .ok_or(FaultKind::MemoryOutOfRange { addr: ptr })?;
    let len = machine.mem.read(len_addr)?;
    if len < 0 {
        return Err(FaultKind::Native(format!("negative string length {}", len)));
    }
    let mut text = String::with_capacity(len as usize);
    for i in 0..len {
        let addr = ptr
            .checked_add(i)
            .ok_or(FaultKind::MemoryOutOfRange { addr: ptr })?;
        let word = machine.mem.read(addr)?;
        let ch = u32::try_from(word)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        text.push(ch);
    }
    Ok(text)
}
