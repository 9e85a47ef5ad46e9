//! Static well-formedness checks.
//!
//! These never run implicitly; the interpreter executes any tree it is
//! handed. Tools that want to assert a unit is in lowered shape before
//! running it call these explicitly.

use thiserror::Error;

use crate::ir::{CompUnit, Dest, Expr, Stmt};

/// A well-formedness violation, tagged with the offending function.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("function {func}: ESEQ is not allowed in canonical form")]
    ESeqPresent { func: String },

    #[error("function {func}: expression-position CALL is not allowed in canonical form")]
    ExprCall { func: String },

    #[error("function {func}: BINOP with two constant operands is not const-folded")]
    FoldableBinOp { func: String },
}

/// Checks that a unit is in canonical form: no `ESEQ` anywhere, and calls
/// appearing only as statement-level `CALL_STMT` operations.
pub fn check_canonical(unit: &CompUnit) -> Result<(), CheckError> {
    for func in &unit.functions {
        canonical_stmt(&func.body, &func.name)?;
    }
    Ok(())
}

/// Checks that no binary operation has two constant operands.
pub fn check_const_folded(unit: &CompUnit) -> Result<(), CheckError> {
    for func in &unit.functions {
        folded_stmt(&func.body, &func.name)?;
    }
    Ok(())
}

fn canonical_stmt(stmt: &Stmt, func: &str) -> Result<(), CheckError> {
    match stmt {
        Stmt::Move { dest, src } => {
            if let Dest::Mem(addr) = dest {
                canonical_expr(addr, func)?;
            }
            canonical_expr(src, func)
        }
        Stmt::CallStmt { target, args } => {
            canonical_expr(target, func)?;
            args.iter().try_for_each(|a| canonical_expr(a, func))
        }
        Stmt::Exp(e) => canonical_expr(e, func),
        Stmt::Seq(stmts) => stmts.iter().try_for_each(|s| canonical_stmt(s, func)),
        Stmt::Jump(target) => canonical_expr(target, func),
        Stmt::CJump { cond, .. } => canonical_expr(cond, func),
        Stmt::Label(_) => Ok(()),
        Stmt::Return(values) => values.iter().try_for_each(|v| canonical_expr(v, func)),
    }
}

fn canonical_expr(expr: &Expr, func: &str) -> Result<(), CheckError> {
    match expr {
        Expr::Const(_) | Expr::Temp(_) | Expr::Name(_) => Ok(()),
        Expr::Mem(addr) => canonical_expr(addr, func),
        Expr::BinOp { left, right, .. } => {
            canonical_expr(left, func)?;
            canonical_expr(right, func)
        }
        Expr::Call { .. } => Err(CheckError::ExprCall {
            func: func.to_string(),
        }),
        Expr::ESeq { .. } => Err(CheckError::ESeqPresent {
            func: func.to_string(),
        }),
    }
}

fn folded_stmt(stmt: &Stmt, func: &str) -> Result<(), CheckError> {
    match stmt {
        Stmt::Move { dest, src } => {
            if let Dest::Mem(addr) = dest {
                folded_expr(addr, func)?;
            }
            folded_expr(src, func)
        }
        Stmt::CallStmt { target, args } => {
            folded_expr(target, func)?;
            args.iter().try_for_each(|a| folded_expr(a, func))
        }
        Stmt::Exp(e) => folded_expr(e, func),
        Stmt::Seq(stmts) => stmts.iter().try_for_each(|s| folded_stmt(s, func)),
        Stmt::Jump(target) => folded_expr(target, func),
        Stmt::CJump { cond, .. } => folded_expr(cond, func),
        Stmt::Label(_) => Ok(()),
        Stmt::Return(values) => values.iter().try_for_each(|v| folded_expr(v, func)),
    }
}

fn folded_expr(expr: &Expr, func: &str) -> Result<(), CheckError> {
    match expr {
        Expr::Const(_) | Expr::Temp(_) | Expr::Name(_) => Ok(()),
        Expr::Mem(addr) => folded_expr(addr, func),
        Expr::BinOp { left, right, .. } => {
            if matches!(**left, Expr::Const(_)) && matches!(**right, Expr::Const(_)) {
                return Err(CheckError::FoldableBinOp {
                    func: func.to_string(),
                });
            }
            folded_expr(left, func)?;
            folded_expr(right, func)
        }
        Expr::Call { target, args } => {
            folded_expr(target, func)?;
            args.iter().try_for_each(|a| folded_expr(a, func))
        }
        Expr::ESeq { stmt, value } => {
            folded_stmt(stmt, func)?;
            folded_expr(value, func)
        }
    }
}
