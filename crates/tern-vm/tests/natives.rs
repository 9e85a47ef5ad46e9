//! Native runtime primitives: allocation, the bounds trap, and I/O.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tern_ir::parse_comp_unit;
use tern_vm::{FaultKind, Interpreter};

/// A Write sink the test can read back after the interpreter is done.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn load_with_output(src: &str) -> (Interpreter, SharedBuf) {
    let unit = parse_comp_unit(src).expect("parse failed");
    let buf = SharedBuf::default();
    let interp = Interpreter::with_output(&unit, Box::new(buf.clone())).expect("load failed");
    (interp, buf)
}

#[test]
fn test_alloc_returns_fresh_zeroed_block() {
    let (mut interp, _) = load_with_output(
        "(COMPUNIT u (FUNC f (SEQ \
           (MOVE (TEMP p) (CALL (NAME _eta_alloc) (CONST 8))) \
           (MOVE (TEMP q) (CALL (NAME _eta_alloc) (CONST 8))) \
           (RETURN (SUB (TEMP q) (TEMP p)) (MEM (TEMP p))))))",
    );
    let values = interp.call_multi("f", &[]).unwrap();
    // Blocks are distinct and zero-filled.
    assert!(values[0] >= 8);
    assert_eq!(values[1], 0);
}

#[test]
fn test_alloc_negative_size_faults() {
    let (mut interp, _) = load_with_output(
        "(COMPUNIT u (FUNC f (SEQ \
           (CALL_STMT (NAME _eta_alloc) (CONST -1)) \
           (RETURN ()))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::Native(_)));
}

#[test]
fn test_out_of_bounds_trap() {
    let (mut interp, _) = load_with_output(
        "(COMPUNIT u (FUNC f (SEQ \
           (CALL_STMT (NAME _eta_out_of_bounds)) \
           (RETURN (CONST 1)))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::BoundsTrap));
}

#[test]
fn test_printint_writes_decimal_lines() {
    let (mut interp, buf) = load_with_output(
        "(COMPUNIT u (FUNC f (SEQ \
           (CALL_STMT (NAME _eta_printint) (CONST 42)) \
           (CALL_STMT (NAME _eta_printint) (CONST -7)) \
           (RETURN ()))))",
    );
    interp.call("f", &[]).unwrap();
    assert_eq!(buf.contents(), "42\n-7\n");
}

#[test]
fn test_println_reads_length_prefixed_string() {
    // Layout: the length sits one word before the character pointer.
    let (mut interp, buf) = load_with_output(
        "(COMPUNIT u (DATA hi (2 104 105)) (FUNC f (SEQ \
           (CALL_STMT (NAME _eta_println) (ADD (NAME hi) (CONST 1))) \
           (RETURN ()))))",
    );
    interp.call("f", &[]).unwrap();
    assert_eq!(buf.contents(), "hi\n");
}

#[test]
fn test_print_builds_string_in_allocated_memory() {
    // Build "ok" at run time: alloc 3 words, store [2, 'o', 'k'], print
    // from base+1.
    let (mut interp, buf) = load_with_output(
        "(COMPUNIT u (FUNC f (SEQ \
           (MOVE (TEMP p) (CALL (NAME _eta_alloc) (CONST 3))) \
           (MOVE (MEM (TEMP p)) (CONST 2)) \
           (MOVE (MEM (ADD (TEMP p) (CONST 1))) (CONST 111)) \
           (MOVE (MEM (ADD (TEMP p) (CONST 2))) (CONST 107)) \
           (CALL_STMT (NAME _eta_print) (ADD (TEMP p) (CONST 1))) \
           (RETURN ()))))",
    );
    interp.call("f", &[]).unwrap();
    assert_eq!(buf.contents(), "ok");
}

#[test]
fn test_string_read_past_heap_is_memory_fault() {
    // Lying length walks past the allocation and must fault like any
    // other wild read.
    let (mut interp, _) = load_with_output(
        "(COMPUNIT u (FUNC f (SEQ \
           (MOVE (TEMP p) (CALL (NAME _eta_alloc) (CONST 2))) \
           (MOVE (MEM (TEMP p)) (CONST 100000)) \
           (CALL_STMT (NAME _eta_println) (ADD (TEMP p) (CONST 1))) \
           (RETURN ()))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::MemoryOutOfRange { .. }));
}

#[test]
fn test_extreme_pointer_is_memory_fault_not_overflow() {
    // The length lives at ptr - 1; for i64::MIN that address does not
    // exist, and the primitive must fault like any other wild read.
    let (mut interp, _) = load_with_output(
        "(COMPUNIT u (FUNC f (SEQ \
           (CALL_STMT (NAME _eta_println) (CONST -9223372036854775808)) \
           (RETURN ()))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::MemoryOutOfRange { .. }));
}

#[test]
fn test_declared_function_shadows_native_symbol() {
    let (mut interp, buf) = load_with_output(
        "(COMPUNIT u \
         (FUNC _eta_printint (RETURN (CONST 123))) \
         (FUNC f (RETURN (CALL (NAME _eta_printint) (CONST 42)))))",
    );
    assert_eq!(interp.call("f", &[]).unwrap(), 123);
    assert_eq!(buf.contents(), "");
}
