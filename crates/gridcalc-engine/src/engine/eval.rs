//! Tree-walking evaluation of compiled formulas.
//!
//! Evaluation only reads the symbol table. Every runtime fault (unknown
//! name, type mismatch, arithmetic fault, bad call) comes back as an
//! [`EvalError`]; nothing is written anywhere.

use std::cmp::Ordering;
use thiserror::Error;

use super::ast::{BinaryOp, Expr, LogicalOp, Node, UnaryOp};
use super::{SymbolTable, UnknownSymbol, Value};
use crate::builtins::MathFault;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UnknownSymbol(String),

    #[error("unsupported operand type(s) for {op}: '{lhs}' and '{rhs}'")]
    BinaryTypeMismatch {
        op: String,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("bad operand type for {op}: '{operand}'")]
    UnaryTypeMismatch { op: String, operand: &'static str },

    #[error("{function}() argument must be a number, not '{found}'")]
    ArgumentType {
        function: &'static str,
        found: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("math domain error in {0}")]
    Domain(String),

    #[error("numerical result out of range in {0}")]
    Overflow(String),

    #[error("{function}() takes {expected} argument(s) ({found} given)")]
    Arity {
        function: &'static str,
        expected: String,
        found: usize,
    },

    #[error("'{0}' is not callable")]
    NotCallable(String),
}

impl From<UnknownSymbol> for EvalError {
    fn from(err: UnknownSymbol) -> Self {
        EvalError::UnknownSymbol(err.0)
    }
}

/// Evaluate a compiled expression against the symbol table.
pub fn evaluate(expr: &Expr, symbols: &SymbolTable) -> Result<Value, EvalError> {
    eval_node(expr.root(), symbols)
}

fn eval_node(node: &Node, symbols: &SymbolTable) -> Result<Value, EvalError> {
    match node {
        Node::Number(n) => Ok(Value::Number(*n)),
        Node::Text(s) => Ok(Value::Text(s.clone())),
        Node::Bool(b) => Ok(Value::Bool(*b)),
        Node::Name(name) => Ok(symbols.get(name)?.clone()),
        Node::Unary { op, operand } => {
            let value = eval_node(operand, symbols)?;
            unary(*op, value)
        }
        Node::Binary { op, lhs, rhs } => {
            let lhs = eval_node(lhs, symbols)?;
            let rhs = eval_node(rhs, symbols)?;
            binary(*op, lhs, rhs)
        }
        Node::Logical { op, lhs, rhs } => {
            let lhs = eval_node(lhs, symbols)?;
            match (op, lhs.is_truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(lhs),
                _ => eval_node(rhs, symbols),
            }
        }
        Node::Conditional {
            cond,
            then,
            otherwise,
        } => {
            if eval_node(cond, symbols)?.is_truthy() {
                eval_node(then, symbols)
            } else {
                eval_node(otherwise, symbols)
            }
        }
        Node::Call { callee, args } => call(callee, args, symbols),
    }
}

fn call(callee: &str, args: &[Node], symbols: &SymbolTable) -> Result<Value, EvalError> {
    let function = match symbols.get(callee)? {
        Value::Builtin(f) => *f,
        _ => return Err(EvalError::NotCallable(callee.to_string())),
    };
    if !function.arity.accepts(args.len()) {
        return Err(EvalError::Arity {
            function: function.name,
            expected: function.arity.to_string(),
            found: args.len(),
        });
    }

    let mut numbers = Vec::with_capacity(args.len());
    for arg in args {
        let value = eval_node(arg, symbols)?;
        let n = value.as_number().ok_or(EvalError::ArgumentType {
            function: function.name,
            found: value.type_name(),
        })?;
        numbers.push(n);
    }

    (function.call)(&numbers).map_err(|fault| match fault {
        MathFault::Domain => EvalError::Domain(function.name.to_string()),
        MathFault::Overflow => EvalError::Overflow(function.name.to_string()),
    })
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!value.is_truthy()));
    }
    let n = value.as_number().ok_or(EvalError::UnaryTypeMismatch {
        op: op.to_string(),
        operand: value.type_name(),
    })?;
    Ok(Value::Number(if op == UnaryOp::Neg { -n } else { n }))
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(loose_eq(&lhs, &rhs))),
        BinaryOp::Ne => return Ok(Value::Bool(!loose_eq(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            return compare(op, &lhs, &rhs);
        }
        BinaryOp::Add => {
            if let (Some(a), Some(b)) = (lhs.as_text(), rhs.as_text()) {
                return Ok(Value::Text(format!("{a}{b}")));
            }
        }
        _ => {}
    }

    let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
        return Err(mismatch(op, &lhs, &rhs));
    };

    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            // Result takes the sign of the divisor.
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
        }
        BinaryOp::Pow => power(a, b)?,
        _ => unreachable!("comparisons handled above"),
    };
    Ok(Value::Number(result))
}

fn power(base: f64, exp: f64) -> Result<f64, EvalError> {
    if base == 0.0 && exp < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    if base < 0.0 && exp.fract() != 0.0 && exp.is_finite() {
        return Err(EvalError::Domain("**".to_string()));
    }
    let result = base.powf(exp);
    if result.is_infinite() && base.is_finite() && exp.is_finite() {
        return Err(EvalError::Overflow("**".to_string()));
    }
    Ok(result)
}

fn mismatch(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::BinaryTypeMismatch {
        op: op.to_string(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

/// Formula equality: numeric across numbers and bools, textual across text
/// and empty, false across unrelated types.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (lhs.as_text(), rhs.as_text()) {
        return a == b;
    }
    match (lhs, rhs) {
        (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
        _ => false,
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let ordering = if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        a.partial_cmp(&b)
    } else if let (Some(a), Some(b)) = (lhs.as_text(), rhs.as_text()) {
        Some(a.cmp(b))
    } else {
        return Err(mismatch(op, lhs, rhs));
    };

    // NaN compares false against everything.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let holds = match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Value::Bool(holds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::math_namespace;
    use crate::engine::compile;

    fn table() -> SymbolTable {
        let mut symbols = SymbolTable::new();
        symbols.import_namespace(math_namespace());
        symbols.set("a0", Value::Number(5.0));
        symbols.set("a1", Value::from("hello"));
        symbols.set("a2", Value::Empty);
        symbols
    }

    fn eval(text: &str) -> Result<Value, EvalError> {
        let expr = compile(text, "z0").unwrap();
        evaluate(&expr, &table())
    }

    fn number(text: &str) -> f64 {
        match eval(text) {
            Ok(Value::Number(n)) => n,
            other => panic!("{text:?} gave {other:?}"),
        }
    }

    #[test]
    fn arithmetic() {
        assert_eq!(number("a0 * 2"), 10.0);
        assert_eq!(number("1 + 2 * 3 - 4 / 2"), 5.0);
        assert_eq!(number("-2 ** 2"), -4.0);
        assert_eq!(number("2 ** -1"), 0.5);
        assert_eq!(number("2 ** 3 ** 2"), 512.0);
        assert_eq!(number("True + 1"), 2.0);
    }

    #[test]
    fn floor_division_and_modulo_follow_the_divisor() {
        assert_eq!(number("7 // 2"), 3.0);
        assert_eq!(number("-7 // 2"), -4.0);
        assert_eq!(number("7 % 3"), 1.0);
        assert_eq!(number("-7 % 3"), 2.0);
        assert_eq!(number("7 % -3"), -2.0);
    }

    #[test]
    fn builtins() {
        assert!((number("sin(pi / 2)") - 1.0).abs() < 1e-12);
        assert_eq!(number("sqrt(16) + fabs(-1)"), 5.0);
        assert_eq!(number("max(1, a0, 3)"), 5.0);
    }

    #[test]
    fn builtin_is_a_value() {
        assert!(matches!(eval("sqrt"), Ok(Value::Builtin(f)) if f.name == "sqrt"));
    }

    #[test]
    fn text_concatenation() {
        assert_eq!(eval("a1 + ' world'"), Ok(Value::from("hello world")));
        assert_eq!(eval("a2 + 'x'"), Ok(Value::from("x")));
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(eval("a0 > 3"), Ok(Value::Bool(true)));
        assert_eq!(eval("a1 == 'hello'"), Ok(Value::Bool(true)));
        assert_eq!(eval("a1 == 5"), Ok(Value::Bool(false)));
        assert_eq!(eval("a2 == ''"), Ok(Value::Bool(true)));
        assert_eq!(eval("nan == nan"), Ok(Value::Bool(false)));
        assert_eq!(eval("not a2"), Ok(Value::Bool(true)));
        assert_eq!(eval("0 or 'x'"), Ok(Value::from("x")));
        assert_eq!(eval("0 and undefined_name"), Ok(Value::Number(0.0)));
        assert_eq!(eval("'yes' if a0 > 1 else 1 / 0"), Ok(Value::from("yes")));
    }

    #[test]
    fn unknown_symbol() {
        assert_eq!(
            eval("a0 + missing"),
            Err(EvalError::UnknownSymbol("missing".to_string()))
        );
        assert_eq!(
            eval("__name__"),
            Err(EvalError::UnknownSymbol("__name__".to_string()))
        );
    }

    #[test]
    fn type_mismatches() {
        assert_eq!(
            eval("a1 * 2"),
            Err(EvalError::BinaryTypeMismatch {
                op: "*".to_string(),
                lhs: "text",
                rhs: "number",
            })
        );
        assert!(matches!(eval("a2 + 1"), Err(EvalError::BinaryTypeMismatch { .. })));
        assert!(matches!(eval("-a1"), Err(EvalError::UnaryTypeMismatch { .. })));
        assert!(matches!(eval("a1 < 1"), Err(EvalError::BinaryTypeMismatch { .. })));
        assert!(matches!(eval("sqrt(a1)"), Err(EvalError::ArgumentType { function: "sqrt", .. })));
    }

    #[test]
    fn arithmetic_faults() {
        assert_eq!(eval("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1 % 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("0 ** -1"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("sqrt(-1)"), Err(EvalError::Domain("sqrt".to_string())));
        assert_eq!(eval("(-8) ** 0.5"), Err(EvalError::Domain("**".to_string())));
        assert_eq!(eval("10.0 ** 400"), Err(EvalError::Overflow("**".to_string())));
    }

    #[test]
    fn call_errors() {
        assert_eq!(eval("a0(1)"), Err(EvalError::NotCallable("a0".to_string())));
        assert_eq!(
            eval("sqrt(1, 2)"),
            Err(EvalError::Arity {
                function: "sqrt",
                expected: "exactly 1".to_string(),
                found: 2,
            })
        );
    }

    #[test]
    fn evaluation_does_not_touch_the_table() {
        let symbols = table();
        let before = symbols.snapshot();
        let expr = compile("a0 + 1 / 0", "b0").unwrap();
        assert!(evaluate(&expr, &symbols).is_err());
        assert_eq!(symbols.snapshot(), before);
    }
}
