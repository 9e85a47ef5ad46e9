//! Parser for the textual IR format.
//!
//! The grammar is a small parenthesized keyword language, so a hand-written
//! lexer plus recursive descent is all that is needed. Keywords are
//! case-sensitive; atoms are bareword identifiers; numbers are signed
//! 64-bit literals.

use thiserror::Error;

use crate::ir::{BinOp, CompUnit, Data, Dest, Expr, FuncDecl, Stmt};

/// Errors that can occur while parsing IR text.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: unexpected character '{ch}'")]
    UnexpectedChar { line: usize, ch: char },

    #[error("line {line}: number literal '{text}' out of 64-bit range")]
    BadNumber { line: usize, text: String },

    #[error("line {line}: expected {expected}, found {found}")]
    Unexpected {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("unexpected end of input (expected {expected})")]
    UnexpectedEof { expected: &'static str },

    #[error("line {line}: unknown keyword '{word}'")]
    UnknownKeyword { line: usize, word: String },

    #[error("compilation unit declares no functions")]
    NoFunctions,

    #[error("line {line}: trailing input after compilation unit")]
    TrailingInput { line: usize },
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    LParen,
    RParen,
    Atom(String),
    Number(i64),
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::LParen => "'('".to_string(),
            Tok::RParen => "')'".to_string(),
            Tok::Atom(a) => format!("'{}'", a),
            Tok::Number(n) => format!("number {}", n),
        }
    }
}

fn lex(src: &str) -> Result<Vec<(Tok, usize)>, ParseError> {
    let mut out = Vec::new();
    let mut line = 1usize;
    let mut chars = src.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                out.push((Tok::LParen, line));
                chars.next();
            }
            ')' => {
                out.push((Tok::RParen, line));
                chars.next();
            }
            c if is_atom_char(c) => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if is_atom_char(c) {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if looks_numeric(&word) {
                    let n: i64 = word
                        .parse()
                        .map_err(|_| ParseError::BadNumber {
                            line,
                            text: word.clone(),
                        })?;
                    out.push((Tok::Number(n), line));
                } else {
                    out.push((Tok::Atom(word), line));
                }
            }
            other => return Err(ParseError::UnexpectedChar { line, ch: other }),
        }
    }
    Ok(out)
}

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && c != '(' && c != ')'
}

fn looks_numeric(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a full compilation unit from IR text.
pub fn parse_comp_unit(src: &str) -> Result<CompUnit, ParseError> {
    let tokens = lex(src)?;
    let mut p = Parser { tokens, pos: 0 };
    let unit = p.comp_unit()?;
    if let Some((_, line)) = p.peek_with_line() {
        return Err(ParseError::TrailingInput { line });
    }
    Ok(unit)
}

struct Parser {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_with_line(&self) -> Option<(&Tok, usize)> {
        self.tokens.get(self.pos).map(|(t, l)| (t, *l))
    }

    fn peek2(&self) -> Option<&Tok> {
        self.tokens.get(self.pos + 1).map(|(t, _)| t)
    }

    fn next(&mut self, expected: &'static str) -> Result<(Tok, usize), ParseError> {
        match self.tokens.get(self.pos) {
            Some((t, l)) => {
                self.pos += 1;
                Ok((t.clone(), *l))
            }
            None => Err(ParseError::UnexpectedEof { expected }),
        }
    }

    fn expect_lparen(&mut self) -> Result<(), ParseError> {
        match self.next("'('")? {
            (Tok::LParen, _) => Ok(()),
            (t, line) => Err(ParseError::Unexpected {
                line,
                expected: "'('",
                found: t.describe(),
            }),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.next("')'")? {
            (Tok::RParen, _) => Ok(()),
            (t, line) => Err(ParseError::Unexpected {
                line,
                expected: "')'",
                found: t.describe(),
            }),
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        match self.next("name")? {
            (Tok::Atom(a), _) => Ok(a),
            (t, line) => Err(ParseError::Unexpected {
                line,
                expected: "name",
                found: t.describe(),
            }),
        }
    }

    fn expect_number(&mut self) -> Result<i64, ParseError> {
        match self.next("number")? {
            (Tok::Number(n), _) => Ok(n),
            (t, line) => Err(ParseError::Unexpected {
                line,
                expected: "number",
                found: t.describe(),
            }),
        }
    }

    fn expect_keyword(&mut self, word: &'static str) -> Result<(), ParseError> {
        match self.next(word)? {
            (Tok::Atom(a), _) if a == word => Ok(()),
            (t, line) => Err(ParseError::Unexpected {
                line,
                expected: word,
                found: t.describe(),
            }),
        }
    }

    fn comp_unit(&mut self) -> Result<CompUnit, ParseError> {
        self.expect_lparen()?;
        self.expect_keyword("COMPUNIT")?;
        let mut unit = CompUnit::new(self.expect_name()?);

        // Constructor names appear as bare atoms before any data or
        // function declarations.
        while let Some(Tok::Atom(_)) = self.peek() {
            unit.ctors.push(self.expect_name()?);
        }

        while self.peek() == Some(&Tok::LParen)
            && matches!(self.peek2(), Some(Tok::Atom(a)) if a == "DATA")
        {
            unit.data.push(self.data_segment()?);
        }

        while self.peek() == Some(&Tok::LParen) {
            unit.functions.push(self.func_decl()?);
        }

        if unit.functions.is_empty() {
            return Err(ParseError::NoFunctions);
        }
        self.expect_rparen()?;
        Ok(unit)
    }

    fn data_segment(&mut self) -> Result<Data, ParseError> {
        self.expect_lparen()?;
        self.expect_keyword("DATA")?;
        let name = self.expect_name()?;
        self.expect_lparen()?;
        let mut words = Vec::new();
        while let Some(Tok::Number(_)) = self.peek() {
            words.push(self.expect_number()?);
        }
        self.expect_rparen()?;
        self.expect_rparen()?;
        Ok(Data { name, words })
    }

    fn func_decl(&mut self) -> Result<FuncDecl, ParseError> {
        self.expect_lparen()?;
        self.expect_keyword("FUNC")?;
        let name = self.expect_name()?;
        let body = self.stmt()?;
        self.expect_rparen()?;
        Ok(FuncDecl { name, body })
    }

    fn stmt(&mut self) -> Result<Stmt, ParseError> {
        self.expect_lparen()?;
        let (tok, line) = self.next("statement keyword")?;
        let word = match tok {
            Tok::Atom(a) => a,
            other => {
                return Err(ParseError::Unexpected {
                    line,
                    expected: "statement keyword",
                    found: other.describe(),
                })
            }
        };
        let stmt = match word.as_str() {
            "MOVE" => {
                let dest = self.dest()?;
                let src = self.expr()?;
                Stmt::Move { dest, src }
            }
            "CALL_STMT" => {
                let target = self.expr()?;
                let args = self.expr_list()?;
                Stmt::CallStmt { target, args }
            }
            "EXP" => Stmt::Exp(self.expr()?),
            "SEQ" => {
                let mut stmts = vec![self.stmt()?];
                while self.peek() == Some(&Tok::LParen) {
                    stmts.push(self.stmt()?);
                }
                Stmt::Seq(stmts)
            }
            "JUMP" => Stmt::Jump(self.expr()?),
            "CJUMP" => {
                let cond = self.expr()?;
                let if_true = self.expect_name()?;
                let if_false = match self.peek() {
                    Some(Tok::Atom(_)) => Some(self.expect_name()?),
                    _ => None,
                };
                Stmt::CJump {
                    cond,
                    if_true,
                    if_false,
                }
            }
            "LABEL" => Stmt::Label(self.expect_name()?),
            "RETURN" => {
                // "(RETURN ())" is the explicit zero-value form.
                if self.peek() == Some(&Tok::LParen) && self.peek2() == Some(&Tok::RParen) {
                    self.expect_lparen()?;
                    self.expect_rparen()?;
                    Stmt::Return(Vec::new())
                } else {
                    Stmt::Return(self.expr_list()?)
                }
            }
            other => {
                return Err(ParseError::UnknownKeyword {
                    line,
                    word: other.to_string(),
                })
            }
        };
        self.expect_rparen()?;
        Ok(stmt)
    }

    fn dest(&mut self) -> Result<Dest, ParseError> {
        self.expect_lparen()?;
        let (tok, line) = self.next("TEMP or MEM")?;
        let dest = match tok {
            Tok::Atom(a) if a == "TEMP" => Dest::Temp(self.expect_name()?),
            Tok::Atom(a) if a == "MEM" => Dest::Mem(self.expr()?),
            other => {
                return Err(ParseError::Unexpected {
                    line,
                    expected: "TEMP or MEM",
                    found: other.describe(),
                })
            }
        };
        self.expect_rparen()?;
        Ok(dest)
    }

    fn expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = Vec::new();
        while self.peek() == Some(&Tok::LParen) {
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        self.expect_lparen()?;
        let (tok, line) = self.next("expression keyword")?;
        let word = match tok {
            Tok::Atom(a) => a,
            other => {
                return Err(ParseError::Unexpected {
                    line,
                    expected: "expression keyword",
                    found: other.describe(),
                })
            }
        };
        let expr = match word.as_str() {
            "CONST" => Expr::Const(self.expect_number()?),
            "TEMP" => Expr::Temp(self.expect_name()?),
            "MEM" => Expr::mem(self.expr()?),
            "CALL" => {
                let target = self.expr()?;
                let args = self.expr_list()?;
                Expr::Call {
                    target: Box::new(target),
                    args,
                }
            }
            "NAME" => Expr::Name(self.expect_name()?),
            "ESEQ" => {
                let stmt = self.stmt()?;
                let value = self.expr()?;
                Expr::eseq(stmt, value)
            }
            other => match BinOp::from_mnemonic(other) {
                Some(op) => {
                    let left = self.expr()?;
                    let right = self.expr()?;
                    Expr::binop(op, left, right)
                }
                None => {
                    return Err(ParseError::UnknownKeyword {
                        line,
                        word: other.to_string(),
                    })
                }
            },
        };
        self.expect_rparen()?;
        Ok(expr)
    }
}
