//! Load-time and run-time error types.
//!
//! Load errors are fatal to the whole unit and surface before anything
//! executes. Faults abort the current top-level call; the interpreter never
//! continues past one.

use thiserror::Error;

/// Errors detected while loading a compilation unit, before execution.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("duplicate function name '{0}'")]
    DuplicateFunction(String),

    #[error("duplicate data segment name '{0}'")]
    DuplicateData(String),

    #[error("function {func}: duplicate label '{label}'")]
    DuplicateLabel { func: String, label: String },

    #[error("constructor '{0}' does not name a declared function")]
    UnresolvedCtor(String),
}

/// A runtime fault: the kind of failure plus the function it occurred in.
#[derive(Debug, Error)]
#[error("fault in {func}: {kind}")]
pub struct Fault {
    pub func: String,
    pub kind: FaultKind,
}

impl Fault {
    pub fn new(func: impl Into<String>, kind: FaultKind) -> Self {
        Fault {
            func: func.into(),
            kind,
        }
    }
}

/// The taxonomy of runtime faults. Every one is fatal to the call that
/// raised it; there is no best-effort continuation.
#[derive(Debug, Error)]
pub enum FaultKind {
    #[error("read of unbound temporary '{0}'")]
    UnboundTemp(String),

    #[error("call target '{0}' is neither a declared function nor a native primitive")]
    UnresolvedCall(String),

    #[error("{op} by zero ({left} {op} {right})")]
    DivideByZero {
        op: &'static str,
        left: i64,
        right: i64,
    },

    #[error("memory access out of range at address {addr}")]
    MemoryOutOfRange { addr: i64 },

    #[error("out-of-bounds trap raised")]
    BoundsTrap,

    #[error("jump to unknown label '{0}'")]
    UnknownLabel(String),

    #[error("jump target {0} is not a label of the current function")]
    BadJumpTarget(i64),

    #[error("call target address {0} does not name a function or native primitive")]
    BadCallTarget(i64),

    #[error("{0} inside an expression is not a valid control transfer")]
    ControlFlowInExpr(&'static str),

    #[error("function body ended without RETURN")]
    MissingReturn,

    #[error("call used as an expression but callee returned no values")]
    NoReturnValue,

    #[error("call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),

    #[error("native primitive error: {0}")]
    Native(String),
}
