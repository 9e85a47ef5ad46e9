//! Fault taxonomy: every failure class surfaces as a typed fault naming
//! the function it occurred in, and execution never continues past one.

use tern_ir::parse_comp_unit;
use tern_vm::{FaultKind, Interpreter};

fn load(src: &str) -> Interpreter {
    let unit = parse_comp_unit(src).expect("parse failed");
    Interpreter::load(&unit).expect("load failed")
}

#[test]
fn test_unbound_temporary_faults() {
    let mut interp = load("(COMPUNIT u (FUNC f (RETURN (TEMP ghost))))");
    let fault = interp.call("f", &[]).unwrap_err();
    assert_eq!(fault.func, "f");
    assert!(matches!(fault.kind, FaultKind::UnboundTemp(name) if name == "ghost"));
}

#[test]
fn test_unresolved_call_faults_instead_of_returning_zero() {
    let mut interp = load("(COMPUNIT u (FUNC f (RETURN (CALL (NAME nothing)))))");
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::UnresolvedCall(name) if name == "nothing"));
}

#[test]
fn test_unknown_entry_name_faults() {
    let mut interp = load("(COMPUNIT u (FUNC f (RETURN ())))");
    let fault = interp.call("missing", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::UnresolvedCall(_)));
}

#[test]
fn test_division_by_zero_reports_operands() {
    let mut interp = load("(COMPUNIT u (FUNC f (RETURN (DIV (CONST 5) (CONST 0)))))");
    let fault = interp.call("f", &[]).unwrap_err();
    match fault.kind {
        FaultKind::DivideByZero { op, left, right } => {
            assert_eq!(op, "DIV");
            assert_eq!(left, 5);
            assert_eq!(right, 0);
        }
        other => panic!("expected DivideByZero, got {:?}", other),
    }
}

#[test]
fn test_modulo_by_zero_faults() {
    let mut interp = load("(COMPUNIT u (FUNC f (RETURN (MOD (CONST 5) (CONST 0)))))");
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::DivideByZero { op: "MOD", .. }));
}

#[test]
fn test_negative_address_is_memory_fault_not_unbound_temp() {
    let mut interp = load("(COMPUNIT u (FUNC f (RETURN (MEM (CONST -4)))))");
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(
        fault.kind,
        FaultKind::MemoryOutOfRange { addr: -4 }
    ));
}

#[test]
fn test_wild_write_faults() {
    let mut interp = load(
        "(COMPUNIT u (FUNC f (SEQ \
           (MOVE (MEM (CONST 1000000)) (CONST 1)) \
           (RETURN ()))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::MemoryOutOfRange { .. }));
}

#[test]
fn test_jump_to_unknown_label_faults() {
    let mut interp = load("(COMPUNIT u (FUNC f (SEQ (JUMP (NAME nowhere)) (RETURN ()))))");
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::UnknownLabel(name) if name == "nowhere"));
}

#[test]
fn test_cjump_to_unknown_label_faults() {
    let mut interp = load(
        "(COMPUNIT u (FUNC f (SEQ (CJUMP (CONST 1) nowhere) (RETURN ()))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::UnknownLabel(_)));
}

#[test]
fn test_indirect_jump_out_of_range_faults() {
    let mut interp = load(
        "(COMPUNIT u (FUNC f (SEQ \
           (JUMP (CONST 99)) \
           (RETURN ()))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::BadJumpTarget(99)));
}

#[test]
fn test_indirect_call_through_non_callable_address_faults() {
    // NAME of a data segment is a valid address but not a callable one.
    let mut interp = load(
        "(COMPUNIT u (DATA d (1 2)) (FUNC f (RETURN (CALL (NAME d)))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::BadCallTarget(_)));
}

#[test]
fn test_fall_off_end_is_missing_return() {
    let mut interp = load("(COMPUNIT u (FUNC f (MOVE (TEMP x) (CONST 1))))");
    let fault = interp.call("f", &[]).unwrap_err();
    assert_eq!(fault.func, "f");
    assert!(matches!(fault.kind, FaultKind::MissingReturn));
}

#[test]
fn test_unbounded_recursion_exceeds_depth_limit() {
    let mut interp = load("(COMPUNIT u (FUNC f (RETURN (CALL (NAME f)))))");
    interp.set_max_call_depth(64);
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::CallDepthExceeded(64)));
}

#[test]
fn test_void_callee_in_expression_position_faults() {
    let mut interp = load(
        "(COMPUNIT u \
         (FUNC noop (RETURN ())) \
         (FUNC f (RETURN (CALL (NAME noop)))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::NoReturnValue));
}

#[test]
fn test_return_inside_eseq_faults() {
    let mut interp = load(
        "(COMPUNIT u (FUNC f (RETURN (ESEQ (RETURN (CONST 1)) (CONST 2)))))",
    );
    let fault = interp.call("f", &[]).unwrap_err();
    assert!(matches!(fault.kind, FaultKind::ControlFlowInExpr("RETURN")));
}

#[test]
fn test_faulting_ctor_surfaces_from_first_call() {
    let mut interp = load(
        "(COMPUNIT u boom \
         (FUNC boom (RETURN (DIV (CONST 1) (CONST 0)))) \
         (FUNC main (RETURN (CONST 0))))",
    );
    let fault = interp.call("main", &[]).unwrap_err();
    assert_eq!(fault.func, "boom");
    assert!(matches!(fault.kind, FaultKind::DivideByZero { .. }));
}

#[test]
fn test_fault_message_names_function_and_kind() {
    let mut interp = load("(COMPUNIT u (FUNC f (RETURN (TEMP ghost))))");
    let fault = interp.call("f", &[]).unwrap_err();
    let message = fault.to_string();
    assert!(message.contains("f"));
    assert!(message.contains("ghost"));
}
