//! The recursive evaluator and call dispatcher.
//!
//! Two mutually recursive judgments drive execution: expression evaluation
//! to an `i64`, and statement execution to a [`Control`] signal over the
//! function's linearized body. Sub-expressions evaluate strictly left to
//! right; that order is observable through `ESEQ` and `CALL` side effects
//! and must not be changed.

use std::io::Write;

use tracing::trace;

use tern_ir::{Dest, Expr, Stmt};

use crate::code::{Callee, FuncCode, LoadedUnit};
use crate::error::{Fault, FaultKind};
use crate::frame::Frame;
use crate::memory::Memory;

/// Control-flow signal produced by executing one statement.
enum Control {
    /// Advance to the next statement.
    Next,
    /// Transfer to the given position in the linearized body.
    Jump(usize),
    /// Unwind the current call with these values.
    Return(Vec<i64>),
}

/// One evaluation session over a loaded unit. Borrows the unit read-only
/// and the session memory and output sink mutably; the call stack is the
/// host stack, bounded by an explicit depth counter.
pub(crate) struct Machine<'a> {
    pub unit: &'a LoadedUnit,
    pub mem: &'a mut Memory,
    pub out: &'a mut dyn Write,
    depth: usize,
    max_depth: usize,
}

impl<'a> Machine<'a> {
    pub fn new(
        unit: &'a LoadedUnit,
        mem: &'a mut Memory,
        out: &'a mut dyn Write,
        max_depth: usize,
    ) -> Self {
        Machine {
            unit,
            mem,
            out,
            depth: 0,
            max_depth,
        }
    }

    /// Calls a function or native primitive by name and yields its full
    /// return-value list.
    pub fn call(&mut self, name: &str, args: &[i64]) -> Result<Vec<i64>, Fault> {
        if let Some(func) = self.unit.function(name) {
            return self.call_user(func, args);
        }
        let addr = self
            .unit
            .addr_of(name)
            .ok_or_else(|| Fault::new(name, FaultKind::UnresolvedCall(name.to_string())))?;
        self.call_addr(addr, args, name)
    }

    /// Dispatches a call to an already-resolved address.
    fn call_addr(&mut self, addr: i64, args: &[i64], caller: &str) -> Result<Vec<i64>, Fault> {
        match self.unit.callee_at(addr) {
            Some(Callee::User(index)) => {
                let func = &self.unit.functions[index];
                self.call_user(func, args)
            }
            Some(Callee::Native(native)) => {
                trace!(native = native.symbol(), ?args, "native call");
                native
                    .invoke(self, args)
                    .map_err(|kind| Fault::new(caller, kind))
            }
            None => Err(Fault::new(caller, FaultKind::BadCallTarget(addr))),
        }
    }

    fn call_user(&mut self, func: &FuncCode, args: &[i64]) -> Result<Vec<i64>, Fault> {
        if self.depth >= self.max_depth {
            return Err(Fault::new(
                &func.name,
                FaultKind::CallDepthExceeded(self.max_depth),
            ));
        }
        self.depth += 1;
        trace!(func = %func.name, ?args, depth = self.depth, "enter");
        let result = self.run_body(func, Frame::with_args(args));
        self.depth -= 1;
        if let Ok(values) = &result {
            trace!(func = %func.name, ?values, "return");
        }
        result
    }

    /// Walks the linearized body from the top until a `Return` signal.
    /// Falling off the end is a fault.
    fn run_body(&mut self, func: &FuncCode, mut frame: Frame) -> Result<Vec<i64>, Fault> {
        let mut pc = 0usize;
        while pc < func.body.len() {
            match self.exec_stmt(func, &func.body[pc], &mut frame)? {
                Control::Next => pc += 1,
                Control::Jump(target) => pc = target,
                Control::Return(values) => return Ok(values),
            }
        }
        Err(Fault::new(&func.name, FaultKind::MissingReturn))
    }

    fn exec_stmt(
        &mut self,
        func: &FuncCode,
        stmt: &Stmt,
        frame: &mut Frame,
    ) -> Result<Control, Fault> {
        match stmt {
            Stmt::Move { dest, src } => {
                match dest {
                    Dest::Temp(name) => {
                        let value = self.eval_expr(func, src, frame)?;
                        frame.write(name, value);
                    }
                    Dest::Mem(addr_expr) => {
                        // Address first, then value: source order.
                        let addr = self.eval_expr(func, addr_expr, frame)?;
                        let value = self.eval_expr(func, src, frame)?;
                        self.mem
                            .write(addr, value)
                            .map_err(|kind| Fault::new(&func.name, kind))?;
                    }
                }
                Ok(Control::Next)
            }
            Stmt::CallStmt { target, args } => {
                self.eval_call(func, target, args, frame)?;
                Ok(Control::Next)
            }
            Stmt::Exp(expr) => {
                self.eval_expr(func, expr, frame)?;
                Ok(Control::Next)
            }
            // Seq survives here only when nested inside an ESEQ stmt; the
            // top-level spine was flattened at load.
            Stmt::Seq(stmts) => {
                for s in stmts {
                    match self.exec_stmt(func, s, frame)? {
                        Control::Next => {}
                        other => return Ok(other),
                    }
                }
                Ok(Control::Next)
            }
            Stmt::Jump(target) => self.exec_jump(func, target, frame),
            Stmt::CJump {
                cond,
                if_true,
                if_false,
            } => {
                let value = self.eval_expr(func, cond, frame)?;
                if value != 0 {
                    Ok(Control::Jump(self.resolve_label(func, if_true)?))
                } else if let Some(label) = if_false {
                    Ok(Control::Jump(self.resolve_label(func, label)?))
                } else {
                    Ok(Control::Next)
                }
            }
            Stmt::Label(_) => Ok(Control::Next),
            Stmt::Return(exprs) => {
                let mut values = Vec::with_capacity(exprs.len());
                for e in exprs {
                    values.push(self.eval_expr(func, e, frame)?);
                }
                Ok(Control::Return(values))
            }
        }
    }

    fn exec_jump(
        &mut self,
        func: &FuncCode,
        target: &Expr,
        frame: &mut Frame,
    ) -> Result<Control, Fault> {
        // The common case is a direct NAME target, which must be a label
        // of this function.
        if let Expr::Name(label) = target {
            if func.labels.contains_key(label.as_str()) || !self.resolves_globally(label) {
                return Ok(Control::Jump(self.resolve_label(func, label)?));
            }
        }
        // Indirect jump: the value must be a position in this body, which
        // is what NAME of a local label evaluates to.
        let value = self.eval_expr(func, target, frame)?;
        if value >= 0 && (value as usize) < func.body.len() {
            Ok(Control::Jump(value as usize))
        } else {
            Err(Fault::new(&func.name, FaultKind::BadJumpTarget(value)))
        }
    }

    fn resolves_globally(&self, name: &str) -> bool {
        self.mem.segment(name).is_some() || self.unit.addr_of(name).is_some()
    }

    fn resolve_label(&self, func: &FuncCode, label: &str) -> Result<usize, Fault> {
        func.labels.get(label).copied().ok_or_else(|| {
            Fault::new(&func.name, FaultKind::UnknownLabel(label.to_string()))
        })
    }

    fn eval_expr(&mut self, func: &FuncCode, expr: &Expr, frame: &mut Frame) -> Result<i64, Fault> {
        match expr {
            Expr::Const(n) => Ok(*n),
            Expr::Temp(name) => frame
                .read(name)
                .map_err(|kind| Fault::new(&func.name, kind)),
            Expr::Mem(addr_expr) => {
                let addr = self.eval_expr(func, addr_expr, frame)?;
                self.mem
                    .read(addr)
                    .map_err(|kind| Fault::new(&func.name, kind))
            }
            Expr::BinOp { op, left, right } => {
                let l = self.eval_expr(func, left, frame)?;
                let r = self.eval_expr(func, right, frame)?;
                op.apply(l, r).ok_or_else(|| {
                    Fault::new(
                        &func.name,
                        FaultKind::DivideByZero {
                            op: op.mnemonic(),
                            left: l,
                            right: r,
                        },
                    )
                })
            }
            Expr::Call { target, args } => {
                let values = self.eval_call(func, target, args, frame)?;
                values
                    .first()
                    .copied()
                    .ok_or_else(|| Fault::new(&func.name, FaultKind::NoReturnValue))
            }
            Expr::Name(name) => self.eval_name(func, name),
            Expr::ESeq { stmt, value } => {
                match self.exec_stmt(func, stmt, frame)? {
                    Control::Next => {}
                    Control::Jump(_) => {
                        return Err(Fault::new(
                            &func.name,
                            FaultKind::ControlFlowInExpr("JUMP"),
                        ))
                    }
                    Control::Return(_) => {
                        return Err(Fault::new(
                            &func.name,
                            FaultKind::ControlFlowInExpr("RETURN"),
                        ))
                    }
                }
                self.eval_expr(func, value, frame)
            }
        }
    }

    /// `NAME` resolution order: a label of the current function, then a
    /// data segment, then a callable (function or native primitive).
    fn eval_name(&self, func: &FuncCode, name: &str) -> Result<i64, Fault> {
        if let Some(&index) = func.labels.get(name) {
            return Ok(index as i64);
        }
        if let Some(addr) = self.mem.segment(name) {
            return Ok(addr);
        }
        if let Some(addr) = self.unit.addr_of(name) {
            return Ok(addr);
        }
        Err(Fault::new(
            &func.name,
            FaultKind::UnresolvedCall(name.to_string()),
        ))
    }

    /// Shared call path for `CALL` and `CALL_STMT`: target first, then
    /// arguments left to right, then dispatch.
    fn eval_call(
        &mut self,
        func: &FuncCode,
        target: &Expr,
        args: &[Expr],
        frame: &mut Frame,
    ) -> Result<Vec<i64>, Fault> {
        let target_addr = self.eval_expr(func, target, frame)?;
        let mut values = Vec::with_capacity(args.len());
        for a in args {
            values.push(self.eval_expr(func, a, frame)?);
        }
        self.call_addr(target_addr, &values, &func.name)
    }
}
