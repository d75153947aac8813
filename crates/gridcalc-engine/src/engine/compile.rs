//! Formula compilation: text to [`Expr`].
//!
//! Formulas use a small expression grammar with keyword logic operators:
//!
//! ```text
//! expr        := conditional
//! conditional := or_expr ( "if" or_expr "else" conditional )?
//! or_expr     := and_expr ( "or" and_expr )*
//! and_expr    := not_expr ( "and" not_expr )*
//! not_expr    := "not" not_expr | comparison
//! comparison  := additive ( ("=="|"!="|"<"|"<="|">"|">=") additive )?
//! additive    := term ( ("+"|"-") term )*
//! term        := unary ( ("*"|"/"|"//"|"%") unary )*
//! unary       := ("-"|"+") unary | power
//! power       := primary ( "**" unary )?
//! primary     := NUMBER | STRING | "True" | "False" | NAME
//!              | NAME "(" args? ")" | "(" expr ")"
//! ```
//!
//! Compilation never evaluates anything and always gives the same result for
//! the same text.

use thiserror::Error;

use super::ast::{BinaryOp, Expr, LogicalOp, Node, UnaryOp};

/// Limit on recursive nesting (parentheses, calls, unary prefixes,
/// exponents, conditionals). Each level costs a dozen parser frames.
pub const MAX_NESTING: usize = 64;

/// Limit on nesting plus operator chain length, which bounds the depth of
/// the tree the evaluator walks.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid syntax in {label} at offset {offset}: {message}")]
pub struct CompileError {
    pub label: String,
    pub offset: usize,
    pub message: String,
}

/// Compile formula text. `label` names the cell for error messages.
pub fn compile(text: &str, label: &str) -> Result<Expr, CompileError> {
    let tokens = tokenize(text).map_err(|(offset, message)| CompileError {
        label: label.to_string(),
        offset,
        message,
    })?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
        depth: 0,
    };
    let root = parser.parse().map_err(|(offset, message)| CompileError {
        label: label.to_string(),
        offset,
        message,
    })?;
    Ok(Expr::new(text, root))
}

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    Number(f64),
    Str(String),
    Name(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
    End,
}

#[derive(Clone, Debug)]
struct Token {
    tok: Tok,
    offset: usize,
}

type Failure = (usize, String);

/// Operators, longest first so `**` wins over `*`.
const OPERATORS: &[&str] = &[
    "**", "//", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "<", ">",
];

fn tokenize(text: &str) -> Result<Vec<Token>, Failure> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let start = i;

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if b.is_ascii_digit() || (b == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            i = scan_number(bytes, i);
            let literal = &text[start..i];
            let n = literal
                .parse::<f64>()
                .map_err(|_| (start, format!("invalid number literal {literal:?}")))?;
            tokens.push(Token {
                tok: Tok::Number(n),
                offset: start,
            });
            continue;
        }

        if b.is_ascii_alphabetic() || b == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Token {
                tok: Tok::Name(text[start..i].to_string()),
                offset: start,
            });
            continue;
        }

        if b == b'"' || b == b'\'' {
            let (s, end) = scan_string(text, i)?;
            tokens.push(Token {
                tok: Tok::Str(s),
                offset: start,
            });
            i = end;
            continue;
        }

        let tok = match b {
            b'(' => Some(Tok::LParen),
            b')' => Some(Tok::RParen),
            b',' => Some(Tok::Comma),
            _ => None,
        };
        if let Some(tok) = tok {
            tokens.push(Token { tok, offset: start });
            i += 1;
            continue;
        }

        let rest = &text[i..];
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                tokens.push(Token {
                    tok: Tok::Op(*op),
                    offset: start,
                });
                i += op.len();
            }
            None => {
                let ch = rest.chars().next().unwrap_or('?');
                return Err((start, format!("unexpected character {ch:?}")));
            }
        }
    }

    tokens.push(Token {
        tok: Tok::End,
        offset: text.len(),
    });
    Ok(tokens)
}

fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

/// Scan a quoted string starting at `start`; returns the unescaped contents
/// and the offset just past the closing quote.
fn scan_string(text: &str, start: usize) -> Result<(String, usize), Failure> {
    let mut chars = text[start..].char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err((start, "unterminated string".to_string()));
    };
    let mut out = String::new();

    while let Some((idx, ch)) = chars.next() {
        if ch == quote {
            return Ok((out, start + idx + ch.len_utf8()));
        }
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some((esc_idx, esc)) = chars.next() else {
            break;
        };
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            other => {
                return Err((
                    start + esc_idx,
                    format!("unknown escape sequence \\{other}"),
                ));
            }
        }
    }

    Err((start, "unterminated string".to_string()))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
    depth: usize,
}

impl Parser {
    fn parse(&mut self) -> Result<Node, Failure> {
        if self.peek() == &Tok::End {
            return Err((0, "empty expression".to_string()));
        }
        let node = self.expression()?;
        if self.peek() != &Tok::End {
            return Err(self.unexpected());
        }
        Ok(node)
    }

    fn peek(&self) -> &Tok {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].tok
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].offset
    }

    fn advance(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Tok::Name(name) if name == keyword)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let found = self.is_keyword(keyword);
        if found {
            self.advance();
        }
        found
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Tok::Op(op) if ops.contains(op) => {
                let op = *op;
                self.advance();
                Some(op)
            }
            _ => None,
        }
    }

    fn unexpected(&self) -> Failure {
        let found = match self.peek() {
            Tok::Number(n) => format!("number {n}"),
            Tok::Str(s) => format!("string {s:?}"),
            Tok::Name(name) => format!("name '{name}'"),
            Tok::Op(op) => format!("'{op}'"),
            Tok::LParen => "'('".to_string(),
            Tok::RParen => "')'".to_string(),
            Tok::Comma => "','".to_string(),
            Tok::End => "end of formula".to_string(),
        };
        (self.offset(), format!("unexpected {found}"))
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Failure>) -> Result<T, Failure> {
        if self.nesting >= MAX_NESTING || self.depth >= MAX_DEPTH {
            return Err((self.offset(), "expression nested too deeply".to_string()));
        }
        self.nesting += 1;
        self.depth += 1;
        let result = f(self);
        self.nesting -= 1;
        self.depth -= 1;
        result
    }

    /// Count one more link of a left-associative operator chain against the
    /// nesting limit. The caller releases `chain` levels when it returns.
    fn extend_chain(&mut self, chain: &mut usize) -> Result<(), Failure> {
        if self.depth >= MAX_DEPTH {
            return Err((self.offset(), "expression nested too deeply".to_string()));
        }
        self.depth += 1;
        *chain += 1;
        Ok(())
    }

    fn expression(&mut self) -> Result<Node, Failure> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Node, Failure> {
        let then = self.or_expr()?;
        if !self.eat_keyword("if") {
            return Ok(then);
        }
        let cond = self.or_expr()?;
        if !self.eat_keyword("else") {
            return Err((self.offset(), "expected 'else'".to_string()));
        }
        let otherwise = self.nested(Self::conditional)?;
        Ok(Node::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn or_expr(&mut self) -> Result<Node, Failure> {
        let mut lhs = self.and_expr()?;
        let mut chain = 0;
        while self.eat_keyword("or") {
            self.extend_chain(&mut chain)?;
            let rhs = self.and_expr()?;
            lhs = Node::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Node, Failure> {
        let mut lhs = self.not_expr()?;
        let mut chain = 0;
        while self.eat_keyword("and") {
            self.extend_chain(&mut chain)?;
            let rhs = self.not_expr()?;
            lhs = Node::Logical {
                op: LogicalOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Node, Failure> {
        if self.eat_keyword("not") {
            let operand = self.nested(Self::not_expr)?;
            return Ok(Node::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Node, Failure> {
        const COMPARISONS: &[&str] = &["==", "!=", "<", "<=", ">", ">="];
        let lhs = self.additive()?;
        let Some(op) = self.eat_op(COMPARISONS) else {
            return Ok(lhs);
        };
        let rhs = self.additive()?;
        if matches!(self.peek(), Tok::Op(next) if COMPARISONS.contains(next)) {
            return Err((
                self.offset(),
                "chained comparisons are not supported".to_string(),
            ));
        }
        Ok(Node::Binary {
            op: binary_op(op),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn additive(&mut self) -> Result<Node, Failure> {
        let mut lhs = self.term()?;
        let mut chain = 0;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            self.extend_chain(&mut chain)?;
            let rhs = self.term()?;
            lhs = Node::Binary {
                op: binary_op(op),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Node, Failure> {
        let mut lhs = self.unary()?;
        let mut chain = 0;
        while let Some(op) = self.eat_op(&["*", "/", "//", "%"]) {
            self.extend_chain(&mut chain)?;
            let rhs = self.unary()?;
            lhs = Node::Binary {
                op: binary_op(op),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node, Failure> {
        match self.eat_op(&["-", "+"]) {
            Some(op) => {
                let operand = self.nested(Self::unary)?;
                let op = if op == "-" { UnaryOp::Neg } else { UnaryOp::Pos };
                Ok(Node::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<Node, Failure> {
        let base = self.primary()?;
        if self.eat_op(&["**"]).is_none() {
            return Ok(base);
        }
        // Right-associative, and the exponent may carry its own sign.
        let exponent = self.nested(Self::unary)?;
        Ok(Node::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(base),
            rhs: Box::new(exponent),
        })
    }

    fn primary(&mut self) -> Result<Node, Failure> {
        match self.peek().clone() {
            Tok::Number(n) => {
                self.advance();
                Ok(Node::Number(n))
            }
            Tok::Str(s) => {
                self.advance();
                Ok(Node::Text(s))
            }
            Tok::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Tok::Name(name) => match name.as_str() {
                "True" => {
                    self.advance();
                    Ok(Node::Bool(true))
                }
                "False" => {
                    self.advance();
                    Ok(Node::Bool(false))
                }
                "and" | "or" | "not" | "if" | "else" => Err(self.unexpected()),
                _ => {
                    self.advance();
                    if self.peek() == &Tok::LParen {
                        self.advance();
                        let args = self.arguments()?;
                        Ok(Node::Call { callee: name, args })
                    } else {
                        Ok(Node::Name(name))
                    }
                }
            },
            _ => Err(self.unexpected()),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Node>, Failure> {
        let mut args = Vec::new();
        if self.peek() == &Tok::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.peek() {
                Tok::Comma => {
                    self.advance();
                    // Trailing comma before ')' is allowed.
                    if self.peek() == &Tok::RParen {
                        self.advance();
                        return Ok(args);
                    }
                }
                Tok::RParen => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err((self.offset(), "expected ',' or ')'".to_string())),
            }
        }
    }

    fn expect_rparen(&mut self) -> Result<(), Failure> {
        if self.peek() == &Tok::RParen {
            self.advance();
            Ok(())
        } else {
            Err((self.offset(), "expected ')'".to_string()))
        }
    }
}

fn binary_op(op: &str) -> BinaryOp {
    match op {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "//" => BinaryOp::FloorDiv,
        "%" => BinaryOp::Mod,
        "**" => BinaryOp::Pow,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::Le,
        ">" => BinaryOp::Gt,
        _ => BinaryOp::Ge,
    }
}
