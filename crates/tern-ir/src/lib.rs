//! Tree IR for Tern: node types, the textual S-expression format, and
//! static well-formedness checks.
//!
//! This crate owns the program representation the interpreter executes.
//! It deliberately knows nothing about execution; see `tern-vm` for that.

pub mod check;
pub mod ir;
pub mod parse;
pub mod print;


pub use ir::{BinOp, CompUnit, Data, Dest, Expr, FuncDecl, Stmt};
pub use parse::{parse_comp_unit, ParseError};
