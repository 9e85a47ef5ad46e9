//! IR node types.
//!
//! The tree mirrors what a compiler middle end emits: a compilation unit of
//! data segments and functions, where each function body is a statement tree
//! over 64-bit integer expressions. All variant sets are closed; evaluation
//! and validation are exhaustive matches over them.

use serde::{Deserialize, Serialize};

/// A compilation unit: global constructors, data segments, and functions.
///
/// Constructor entries name functions that must run once, in order, before
/// the program's entry function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompUnit {
    pub name: String,
    pub ctors: Vec<String>,
    pub data: Vec<Data>,
    pub functions: Vec<FuncDecl>,
}

impl CompUnit {
    pub fn new(name: impl Into<String>) -> Self {
        CompUnit {
            name: name.into(),
            ctors: Vec::new(),
            data: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Looks up a function by name.
    pub fn function(&self, name: &str) -> Option<&FuncDecl> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Looks up a data segment by name.
    pub fn data_segment(&self, name: &str) -> Option<&Data> {
        self.data.iter().find(|d| d.name == name)
    }
}

/// A named global data segment: a fixed sequence of 64-bit words
/// materialized into memory at load time. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub name: String,
    pub words: Vec<i64>,
}

/// A function declaration. The body is almost always a `SEQ`; it is shared
/// read-only across all calls to the function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    pub body: Stmt,
}

/// The destination of a `MOVE`: a frame temporary or a memory location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dest {
    Temp(String),
    Mem(Expr),
}

/// IR statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Evaluate `src` and store it into `dest`.
    Move { dest: Dest, src: Expr },
    /// Call for side effect only; all return values are discarded.
    CallStmt { target: Expr, args: Vec<Expr> },
    /// Evaluate an expression for side effect; the value is discarded.
    Exp(Expr),
    /// Sequential composition.
    Seq(Vec<Stmt>),
    /// Unconditional jump; the target must evaluate to a label `NAME`.
    Jump(Expr),
    /// Conditional jump. With no false label, a zero condition falls
    /// through to the next statement.
    CJump {
        cond: Expr,
        if_true: String,
        if_false: Option<String>,
    },
    /// A named program point. Zero-width: executing it is a no-op.
    Label(String),
    /// Evaluate all expressions left to right, then unwind the current
    /// call with the resulting value list.
    Return(Vec<Expr>),
}

/// IR expressions. Every expression evaluates to a single `i64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Const(i64),
    /// Read of a frame temporary. Reading a never-written temporary is a
    /// runtime fault, not an implicit zero.
    Temp(String),
    /// Word-sized memory read at the evaluated address.
    Mem(Box<Expr>),
    /// Binary operation; `left` is evaluated before `right`.
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call in expression position: yields the first return value.
    Call { target: Box<Expr>, args: Vec<Expr> },
    /// The address/identity of a label, function, or data segment.
    Name(String),
    /// Execute `stmt` for its side effects, then evaluate `value`.
    ESeq { stmt: Box<Stmt>, value: Box<Expr> },
}

impl Expr {
    /// Convenience constructor for a binary operation.
    pub fn binop(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn mem(addr: Expr) -> Expr {
        Expr::Mem(Box::new(addr))
    }

    pub fn eseq(stmt: Stmt, value: Expr) -> Expr {
        Expr::ESeq {
            stmt: Box::new(stmt),
            value: Box::new(value),
        }
    }

    pub fn call(target: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            target: Box::new(target),
            args,
        }
    }
}

/// Binary operators over 64-bit integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// High 64 bits of the full signed 128-bit product.
    HMul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    LShift,
    RShift,
    ARShift,
    Eq,
    Neq,
    Lt,
    /// Unsigned less-than over the operands' bit patterns.
    Ult,
    Gt,
    Leq,
    Geq,
}

impl BinOp {
    /// Applies the operator. Returns `None` only for division or modulo
    /// by zero; every other operation is total.
    ///
    /// `ADD`/`SUB`/`MUL` wrap on overflow. Shifts use the low 6 bits of
    /// the right operand. `DIV`/`MOD` truncate toward zero. Comparisons
    /// yield 1 or 0.
    pub fn apply(self, l: i64, r: i64) -> Option<i64> {
        let v = match self {
            BinOp::Add => l.wrapping_add(r),
            BinOp::Sub => l.wrapping_sub(r),
            BinOp::Mul => l.wrapping_mul(r),
            BinOp::HMul => ((l as i128 * r as i128) >> 64) as i64,
            BinOp::Div => {
                if r == 0 {
                    return None;
                }
                l.wrapping_div(r)
            }
            BinOp::Mod => {
                if r == 0 {
                    return None;
                }
                l.wrapping_rem(r)
            }
            BinOp::And => l & r,
            BinOp::Or => l | r,
            BinOp::Xor => l ^ r,
            BinOp::LShift => l.wrapping_shl((r & 0x3f) as u32),
            BinOp::RShift => ((l as u64).wrapping_shr((r & 0x3f) as u32)) as i64,
            BinOp::ARShift => l.wrapping_shr((r & 0x3f) as u32),
            BinOp::Eq => (l == r) as i64,
            BinOp::Neq => (l != r) as i64,
            BinOp::Lt => (l < r) as i64,
            BinOp::Ult => ((l as u64) < (r as u64)) as i64,
            BinOp::Gt => (l > r) as i64,
            BinOp::Leq => (l <= r) as i64,
            BinOp::Geq => (l >= r) as i64,
        };
        Some(v)
    }

    /// The keyword used in the textual format.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "ADD",
            BinOp::Sub => "SUB",
            BinOp::Mul => "MUL",
            BinOp::HMul => "HMUL",
            BinOp::Div => "DIV",
            BinOp::Mod => "MOD",
            BinOp::And => "AND",
            BinOp::Or => "OR",
            BinOp::Xor => "XOR",
            BinOp::LShift => "LSHIFT",
            BinOp::RShift => "RSHIFT",
            BinOp::ARShift => "ARSHIFT",
            BinOp::Eq => "EQ",
            BinOp::Neq => "NEQ",
            BinOp::Lt => "LT",
            BinOp::Ult => "ULT",
            BinOp::Gt => "GT",
            BinOp::Leq => "LEQ",
            BinOp::Geq => "GEQ",
        }
    }

    /// Parses a textual mnemonic. Case-sensitive.
    pub fn from_mnemonic(s: &str) -> Option<BinOp> {
        let op = match s {
            "ADD" => BinOp::Add,
            "SUB" => BinOp::Sub,
            "MUL" => BinOp::Mul,
            "HMUL" => BinOp::HMul,
            "DIV" => BinOp::Div,
            "MOD" => BinOp::Mod,
            "AND" => BinOp::And,
            "OR" => BinOp::Or,
            "XOR" => BinOp::Xor,
            "LSHIFT" => BinOp::LShift,
            "RSHIFT" => BinOp::RShift,
            "ARSHIFT" => BinOp::ARShift,
            "EQ" => BinOp::Eq,
            "NEQ" => BinOp::Neq,
            "LT" => BinOp::Lt,
            "ULT" => BinOp::Ult,
            "GT" => BinOp::Gt,
            "LEQ" => BinOp::Leq,
            "GEQ" => BinOp::Geq,
            _ => return None,
        };
        Some(op)
    }
}
