//! Pretty-printing of IR back to its textual form.
//!
//! `Display` output re-parses to an identical tree, so the printer doubles
//! as the canonical serialization for tooling that wants text rather than
//! JSON.

use std::fmt;

use crate::ir::{CompUnit, Data, Dest, Expr, FuncDecl, Stmt};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(n) => write!(f, "(CONST {})", n),
            Expr::Temp(t) => write!(f, "(TEMP {})", t),
            Expr::Mem(addr) => write!(f, "(MEM {})", addr),
            Expr::BinOp { op, left, right } => {
                write!(f, "({} {} {})", op.mnemonic(), left, right)
            }
            Expr::Call { target, args } => {
                write!(f, "(CALL {}", target)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Name(n) => write!(f, "(NAME {})", n),
            Expr::ESeq { stmt, value } => write!(f, "(ESEQ {} {})", stmt, value),
        }
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dest::Temp(t) => write!(f, "(TEMP {})", t),
            Dest::Mem(addr) => write!(f, "(MEM {})", addr),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Move { dest, src } => write!(f, "(MOVE {} {})", dest, src),
            Stmt::CallStmt { target, args } => {
                write!(f, "(CALL_STMT {}", target)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            Stmt::Exp(e) => write!(f, "(EXP {})", e),
            Stmt::Seq(stmts) => {
                write!(f, "(SEQ")?;
                for s in stmts {
                    write!(f, " {}", s)?;
                }
                write!(f, ")")
            }
            Stmt::Jump(target) => write!(f, "(JUMP {})", target),
            Stmt::CJump {
                cond,
                if_true,
                if_false,
            } => {
                write!(f, "(CJUMP {} {}", cond, if_true)?;
                if let Some(l) = if_false {
                    write!(f, " {}", l)?;
                }
                write!(f, ")")
            }
            Stmt::Label(l) => write!(f, "(LABEL {})", l),
            Stmt::Return(values) => {
                if values.is_empty() {
                    write!(f, "(RETURN ())")
                } else {
                    write!(f, "(RETURN")?;
                    for v in values {
                        write!(f, " {}", v)?;
                    }
                    write!(f, ")")
                }
            }
        }
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(DATA {} (", self.name)?;
        for (i, w) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", w)?;
        }
        write!(f, "))")
    }
}

impl fmt::Display for FuncDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(FUNC {} {})", self.name, self.body)
    }
}

impl fmt::Display for CompUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(COMPUNIT {}", self.name)?;
        for ctor in &self.ctors {
            write!(f, "\n  {}", ctor)?;
        }
        for data in &self.data {
            write!(f, "\n  {}", data)?;
        }
        for func in &self.functions {
            write!(f, "\n  {}", func)?;
        }
        write!(f, ")")
    }
}
