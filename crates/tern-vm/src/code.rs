//! Loaded, executable form of a compilation unit.
//!
//! At load time every function body is linearized: the `SEQ` spine is
//! flattened into one statement vector per function, and a label index maps
//! label names to positions in that vector. Jumps manipulate the position
//! directly at run time.

use std::collections::HashMap;

use tern_ir::{CompUnit, FuncDecl, Stmt};

use crate::error::LoadError;
use crate::memory::Memory;
use crate::natives::Native;

/// One function, linearized for execution.
#[derive(Debug)]
pub(crate) struct FuncCode {
    pub name: String,
    pub body: Vec<Stmt>,
    pub labels: HashMap<String, usize>,
}

impl FuncCode {
    fn build(decl: &FuncDecl) -> Result<FuncCode, LoadError> {
        let mut body = Vec::new();
        flatten(&decl.body, &mut body);

        let mut labels = HashMap::new();
        for (index, stmt) in body.iter().enumerate() {
            if let Stmt::Label(name) = stmt {
                if labels.insert(name.clone(), index).is_some() {
                    return Err(LoadError::DuplicateLabel {
                        func: decl.name.clone(),
                        label: name.clone(),
                    });
                }
            }
        }

        Ok(FuncCode {
            name: decl.name.clone(),
            body,
            labels,
        })
    }
}

fn flatten(stmt: &Stmt, out: &mut Vec<Stmt>) {
    match stmt {
        Stmt::Seq(stmts) => {
            for s in stmts {
                flatten(s, out);
            }
        }
        other => out.push(other.clone()),
    }
}

/// What a call-target address resolves to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Callee {
    /// Index into [`LoadedUnit::functions`].
    User(usize),
    Native(Native),
}

/// A compilation unit after loading: linearized functions, the symbol
/// table of callable addresses, and the constructor run list.
#[derive(Debug)]
pub(crate) struct LoadedUnit {
    pub name: String,
    pub functions: Vec<FuncCode>,
    by_name: HashMap<String, usize>,
    /// Address assigned to each callable name (user functions and natives).
    addr_of: HashMap<String, i64>,
    callee_at: HashMap<i64, Callee>,
    pub ctors: Vec<String>,
}

impl LoadedUnit {
    /// Loads a unit: installs data segments into `memory` in declaration
    /// order, linearizes every function, and assigns callable addresses.
    pub fn load(unit: &CompUnit, memory: &mut Memory) -> Result<LoadedUnit, LoadError> {
        let mut functions = Vec::with_capacity(unit.functions.len());
        let mut by_name = HashMap::new();
        for (index, decl) in unit.functions.iter().enumerate() {
            if by_name.insert(decl.name.clone(), index).is_some() {
                return Err(LoadError::DuplicateFunction(decl.name.clone()));
            }
            functions.push(FuncCode::build(decl)?);
        }

        for ctor in &unit.ctors {
            if !by_name.contains_key(ctor) {
                return Err(LoadError::UnresolvedCtor(ctor.clone()));
            }
        }

        for data in &unit.data {
            if memory.segment(&data.name).is_some() {
                return Err(LoadError::DuplicateData(data.name.clone()));
            }
            memory.alloc_segment(&data.name, &data.words);
        }

        // Every callable name gets one word of memory as its address, so
        // NAME values share the data address space and indirect calls can
        // round-trip through integers.
        let mut addr_of = HashMap::new();
        let mut callee_at = HashMap::new();
        for (index, func) in functions.iter().enumerate() {
            let addr = memory.alloc(1);
            addr_of.insert(func.name.clone(), addr);
            callee_at.insert(addr, Callee::User(index));
        }
        for native in Native::ALL {
            if addr_of.contains_key(native.symbol()) {
                // A declared function shadows the native of the same name.
                continue;
            }
            let addr = memory.alloc(1);
            addr_of.insert(native.symbol().to_string(), addr);
            callee_at.insert(addr, Callee::Native(*native));
        }

        Ok(LoadedUnit {
            name: unit.name.clone(),
            functions,
            by_name,
            addr_of,
            callee_at,
            ctors: unit.ctors.clone(),
        })
    }

    pub fn function(&self, name: &str) -> Option<&FuncCode> {
        self.by_name.get(name).map(|&i| &self.functions[i])
    }

    /// Address of a callable name, if any.
    pub fn addr_of(&self, name: &str) -> Option<i64> {
        self.addr_of.get(name).copied()
    }

    /// Callee registered at an address, if any.
    pub fn callee_at(&self, addr: i64) -> Option<Callee> {
        self.callee_at.get(&addr).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_ir::parse_comp_unit;

    fn load(src: &str) -> Result<(LoadedUnit, Memory), LoadError> {
        let unit = parse_comp_unit(src).unwrap();
        let mut memory = Memory::new();
        let loaded = LoadedUnit::load(&unit, &mut memory)?;
        Ok((loaded, memory))
    }

    #[test]
    fn test_flattens_nested_seq() {
        let (loaded, _) = load(
            "(COMPUNIT u (FUNC f (SEQ \
               (MOVE (TEMP x) (CONST 1)) \
               (SEQ (LABEL a) (SEQ (LABEL b))) \
               (RETURN ()))))",
        )
        .unwrap();
        let f = loaded.function("f").unwrap();
        assert_eq!(f.body.len(), 4);
        assert_eq!(f.labels["a"], 1);
        assert_eq!(f.labels["b"], 2);
    }

    #[test]
    fn test_duplicate_label_is_load_error() {
        let err = load("(COMPUNIT u (FUNC f (SEQ (LABEL a) (LABEL a) (RETURN ()))))")
            .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateLabel { .. }));
    }

    #[test]
    fn test_duplicate_function_is_load_error() {
        let err = load("(COMPUNIT u (FUNC f (RETURN ())) (FUNC f (RETURN ())))").unwrap_err();
        assert!(matches!(err, LoadError::DuplicateFunction(_)));
    }

    #[test]
    fn test_unresolved_ctor_is_load_error() {
        let err = load("(COMPUNIT u boot (FUNC f (RETURN ())))").unwrap_err();
        assert!(matches!(err, LoadError::UnresolvedCtor(_)));
    }

    #[test]
    fn test_data_segments_install_in_order() {
        let (_, memory) = load(
            "(COMPUNIT u (DATA a (10 20)) (DATA b (30)) (FUNC f (RETURN ())))",
        )
        .unwrap();
        let a = memory.segment("a").unwrap();
        let b = memory.segment("b").unwrap();
        assert!(a < b);
        assert_eq!(memory.read(a).unwrap(), 10);
        assert_eq!(memory.read(a + 1).unwrap(), 20);
        assert_eq!(memory.read(b).unwrap(), 30);
    }

    #[test]
    fn test_callable_addresses_are_distinct() {
        let (loaded, _) = load("(COMPUNIT u (FUNC f (RETURN ())) (FUNC g (RETURN ())))").unwrap();
        let f = loaded.addr_of("f").unwrap();
        let g = loaded.addr_of("g").unwrap();
        assert_ne!(f, g);
        assert!(matches!(loaded.callee_at(f), Some(Callee::User(_))));
        assert!(loaded.addr_of("_eta_alloc").is_some());
    }
}
