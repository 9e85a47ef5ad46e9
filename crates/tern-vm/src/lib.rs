//! Tree IR interpreter for Tern.
//!
//! Executes the IR emitted by a compiler middle end directly, with no
//! lowering to machine code: a simulated word heap, per-call temporary
//! frames, a recursive evaluator, and name-based call dispatch. Used to
//! validate code generation and optimization passes by running programs
//! and observing results, so exact semantics matter more than speed.

use std::io::Write;

use tracing::debug;

use tern_ir::CompUnit;

mod code;
pub mod error;
mod eval;
pub mod frame;
pub mod memory;
mod natives;

pub use error::{Fault, FaultKind, LoadError};
pub use frame::{Frame, ARG_PREFIX};
pub use memory::Memory;

use code::LoadedUnit;
use eval::Machine;

/// Default bound on interpreted call depth. Deep enough for real programs,
/// shallow enough to fault before the host stack runs out.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1 << 14;

/// One interpreter session over a loaded compilation unit.
///
/// Memory lives as long as the session and is shared by every call made
/// through it; frames are created per call inside the evaluator. Each
/// session is independent: to run units concurrently, give each its own
/// `Interpreter`.
pub struct Interpreter {
    unit: LoadedUnit,
    memory: Memory,
    out: Box<dyn Write>,
    max_depth: usize,
    ctors_run: bool,
}

impl Interpreter {
    /// Loads a unit: validates names and labels, installs data segments,
    /// and linearizes function bodies. Native primitive output goes to
    /// stdout; use [`Interpreter::with_output`] to capture it.
    pub fn load(unit: &CompUnit) -> Result<Self, LoadError> {
        Self::with_output(unit, Box::new(std::io::stdout()))
    }

    /// Loads a unit with a custom sink for native primitive output.
    pub fn with_output(unit: &CompUnit, out: Box<dyn Write>) -> Result<Self, LoadError> {
        let mut memory = Memory::new();
        let loaded = LoadedUnit::load(unit, &mut memory)?;
        debug!(
            unit = %loaded.name,
            functions = loaded.functions.len(),
            ctors = loaded.ctors.len(),
            heap_words = memory.size(),
            "unit loaded"
        );
        Ok(Interpreter {
            unit: loaded,
            memory,
            out,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
            ctors_run: false,
        })
    }

    /// Overrides the call depth limit.
    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }

    /// Calls a function by name and yields its first return value, or 0
    /// if the callee returned no values.
    ///
    /// Global constructors run once, in declaration order with no
    /// arguments, before the first call on this session; a constructor
    /// fault surfaces from that call.
    pub fn call(&mut self, name: &str, args: &[i64]) -> Result<i64, Fault> {
        Ok(self.call_multi(name, args)?.first().copied().unwrap_or(0))
    }

    /// Like [`Interpreter::call`] but yields the full return-value list.
    pub fn call_multi(&mut self, name: &str, args: &[i64]) -> Result<Vec<i64>, Fault> {
        self.run_ctors()?;
        let mut machine = Machine::new(&self.unit, &mut self.memory, &mut *self.out, self.max_depth);
        machine.call(name, args)
    }

    /// The session heap. Exposed for hosts that want to inspect results
    /// written through `MEM`.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    fn run_ctors(&mut self) -> Result<(), Fault> {
        if self.ctors_run {
            return Ok(());
        }
        // Mark first: a faulting constructor leaves memory as the partial
        // run produced it, and re-running constructors is not defined.
        self.ctors_run = true;
        for i in 0..self.unit.ctors.len() {
            let name = self.unit.ctors[i].clone();
            debug!(ctor = %name, "running constructor");
            let mut machine =
                Machine::new(&self.unit, &mut self.memory, &mut *self.out, self.max_depth);
            machine.call(&name, &[])?;
        }
        Ok(())
    }
}
