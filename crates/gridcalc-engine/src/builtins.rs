//! Builtin numeric namespace: constants and functions formulas may use.
//!
//! Conventions:
//! - Names follow the usual math-library spelling (`sqrt`, `atan2`, `pi`).
//! - Every function takes numbers and is listed in `FUNCTIONS`; nothing
//!   outside this table is callable from a formula.
//! - Module metadata uses the reserved `__` prefix and is filtered out by
//!   [`SymbolTable::import_namespace`](crate::engine::SymbolTable::import_namespace).

use std::f64::consts;
use std::fmt;

use crate::engine::Value;

/// Failure raised by a builtin, named by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFault {
    /// Argument outside the function's domain.
    Domain,
    /// Result too large to represent.
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exact(k) => n == k,
            Arity::Between(lo, hi) => (lo..=hi).contains(&n),
            Arity::AtLeast(lo) => n >= lo,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arity::Exact(k) => write!(f, "exactly {k}"),
            Arity::Between(lo, hi) => write!(f, "{lo} to {hi}"),
            Arity::AtLeast(lo) => write!(f, "at least {lo}"),
        }
    }
}

pub struct BuiltinFn {
    pub name: &'static str,
    pub arity: Arity,
    pub call: fn(&[f64]) -> Result<Value, MathFault>,
    pub description: &'static str,
}

impl fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinFn")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Wrap a float result, turning NaN and infinities produced from finite
/// arguments into faults.
fn checked(args: &[f64], result: f64) -> Result<Value, MathFault> {
    if args.iter().all(|a| a.is_finite()) {
        if result.is_nan() {
            return Err(MathFault::Domain);
        }
        if result.is_infinite() {
            return Err(MathFault::Overflow);
        }
    }
    Ok(Value::Number(result))
}

fn unary(args: &[f64], f: fn(f64) -> f64) -> Result<Value, MathFault> {
    checked(args, f(args[0]))
}

fn binary(args: &[f64], f: fn(f64, f64) -> f64) -> Result<Value, MathFault> {
    checked(args, f(args[0], args[1]))
}

fn log(args: &[f64]) -> Result<Value, MathFault> {
    let x = args[0];
    if x <= 0.0 {
        return Err(MathFault::Domain);
    }
    match args.get(1) {
        None => checked(args, x.ln()),
        Some(&base) if base <= 0.0 || base == 1.0 => Err(MathFault::Domain),
        Some(&base) => checked(args, x.ln() / base.ln()),
    }
}

fn log_with(args: &[f64], f: fn(f64) -> f64) -> Result<Value, MathFault> {
    if args[0] <= 0.0 {
        return Err(MathFault::Domain);
    }
    checked(args, f(args[0]))
}

/// Largest float below which every integer is exactly representable.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0; // 2^53

fn integral(x: f64) -> Result<u64, MathFault> {
    if x.fract() != 0.0 || !x.is_finite() || x < 0.0 {
        return Err(MathFault::Domain);
    }
    if x > MAX_EXACT_INT {
        return Err(MathFault::Overflow);
    }
    Ok(x as u64)
}

fn factorial(args: &[f64]) -> Result<Value, MathFault> {
    let n = integral(args[0])?;
    // 171! no longer fits in an f64.
    if n > 170 {
        return Err(MathFault::Overflow);
    }
    Ok(Value::Number((1..=n).map(|k| k as f64).product()))
}

fn gcd(args: &[f64]) -> Result<Value, MathFault> {
    let (mut a, mut b) = (integral(args[0].abs())?, integral(args[1].abs())?);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    Ok(Value::Number(a as f64))
}

fn fmod(args: &[f64]) -> Result<Value, MathFault> {
    if args[1] == 0.0 {
        return Err(MathFault::Domain);
    }
    checked(args, args[0] % args[1])
}

fn pow(args: &[f64]) -> Result<Value, MathFault> {
    let (base, exp) = (args[0], args[1]);
    if base == 0.0 && exp < 0.0 {
        return Err(MathFault::Domain);
    }
    checked(args, base.powf(exp))
}

fn round_half_even(x: f64) -> f64 {
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        x.round()
    }
}

fn round(args: &[f64]) -> Result<Value, MathFault> {
    let x = args[0];
    let digits = args.get(1).copied().unwrap_or(0.0);
    if digits.fract() != 0.0 {
        return Err(MathFault::Domain);
    }
    if !x.is_finite() {
        return checked(args, x);
    }
    // Past the f64 exponent range the scale is inf or zero.
    if digits > 308.0 {
        return Ok(Value::Number(x));
    }
    if digits < -308.0 {
        return Ok(Value::Number(0.0f64.copysign(x)));
    }

    let digits = digits as i32;
    let rounded = if digits >= 0 {
        let scale = 10f64.powi(digits);
        let scaled = x * scale;
        if !scaled.is_finite() {
            return Ok(Value::Number(x));
        }
        round_half_even(scaled) / scale
    } else {
        let scale = 10f64.powi(-digits);
        round_half_even(x / scale) * scale
    };
    checked(args, rounded)
}

/// NaN in, NaN out.
fn min(args: &[f64]) -> Result<Value, MathFault> {
    if args.iter().any(|a| a.is_nan()) {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(args.iter().copied().fold(f64::INFINITY, f64::min)))
}

fn max(args: &[f64]) -> Result<Value, MathFault> {
    if args.iter().any(|a| a.is_nan()) {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(
        args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    ))
}

fn log1p(args: &[f64]) -> Result<Value, MathFault> {
    if args[0] <= -1.0 {
        return Err(MathFault::Domain);
    }
    checked(args, args[0].ln_1p())
}

/// Gamma and log-gamma have poles at zero and the negative integers.
fn gamma_with(args: &[f64], f: fn(f64) -> f64) -> Result<Value, MathFault> {
    let x = args[0];
    if x <= 0.0 && x.fract() == 0.0 {
        return Err(MathFault::Domain);
    }
    checked(args, f(x))
}

fn isqrt(args: &[f64]) -> Result<Value, MathFault> {
    let n = integral(args[0])?;
    let mut r = (n as f64).sqrt() as u64;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    Ok(Value::Number(r as f64))
}

/// n * (n - 1) * ... * (n - k + 1), accumulated in floating point.
fn falling_product(n: u64, k: u64) -> f64 {
    (0..k).map(|i| (n - i) as f64).product()
}

fn comb(args: &[f64]) -> Result<Value, MathFault> {
    let (n, k) = (integral(args[0])?, integral(args[1])?);
    if k > n {
        return Ok(Value::Number(0.0));
    }
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 1..=k {
        result = result * (n - k + i) as f64 / i as f64;
    }
    checked(args, result.round())
}

fn perm(args: &[f64]) -> Result<Value, MathFault> {
    let n = integral(args[0])?;
    let k = match args.get(1) {
        Some(&k) => integral(k)?,
        None => n,
    };
    if k > n {
        return Ok(Value::Number(0.0));
    }
    checked(args, falling_product(n, k))
}

fn ldexp(args: &[f64]) -> Result<Value, MathFault> {
    let (x, exp) = (args[0], args[1]);
    if exp.fract() != 0.0 || !exp.is_finite() {
        return Err(MathFault::Domain);
    }
    // Anything past this saturates to zero or infinity anyway.
    let exp = exp.clamp(-4096.0, 4096.0) as i32;
    checked(args, libm::ldexp(x, exp))
}

fn remainder(args: &[f64]) -> Result<Value, MathFault> {
    if args[1] == 0.0 || args[0].is_infinite() {
        return Err(MathFault::Domain);
    }
    checked(args, libm::remainder(args[0], args[1]))
}

macro_rules! unary_fn {
    ($name:literal, $f:expr, $desc:literal) => {
        BuiltinFn {
            name: $name,
            arity: Arity::Exact(1),
            call: |args| unary(args, $f),
            description: $desc,
        }
    };
}

macro_rules! binary_fn {
    ($name:literal, $f:expr, $desc:literal) => {
        BuiltinFn {
            name: $name,
            arity: Arity::Exact(2),
            call: |args| binary(args, $f),
            description: $desc,
        }
    };
}

pub static FUNCTIONS: &[BuiltinFn] = &[
    unary_fn!("sqrt", f64::sqrt, "Square root"),
    unary_fn!("exp", f64::exp, "e raised to the power x"),
    unary_fn!("sin", f64::sin, "Sine of x radians"),
    unary_fn!("cos", f64::cos, "Cosine of x radians"),
    unary_fn!("tan", f64::tan, "Tangent of x radians"),
    unary_fn!("asin", f64::asin, "Arc sine, in radians"),
    unary_fn!("acos", f64::acos, "Arc cosine, in radians"),
    unary_fn!("atan", f64::atan, "Arc tangent, in radians"),
    unary_fn!("sinh", f64::sinh, "Hyperbolic sine"),
    unary_fn!("cosh", f64::cosh, "Hyperbolic cosine"),
    unary_fn!("tanh", f64::tanh, "Hyperbolic tangent"),
    unary_fn!("asinh", f64::asinh, "Inverse hyperbolic sine"),
    unary_fn!("acosh", f64::acosh, "Inverse hyperbolic cosine"),
    unary_fn!("atanh", f64::atanh, "Inverse hyperbolic tangent"),
    unary_fn!("fabs", f64::abs, "Absolute value"),
    unary_fn!("abs", f64::abs, "Absolute value"),
    unary_fn!("floor", f64::floor, "Largest integer <= x"),
    unary_fn!("ceil", f64::ceil, "Smallest integer >= x"),
    unary_fn!("trunc", f64::trunc, "x with its fractional part removed"),
    unary_fn!("degrees", f64::to_degrees, "Radians to degrees"),
    unary_fn!("radians", f64::to_radians, "Degrees to radians"),
    binary_fn!("atan2", f64::atan2, "Arc tangent of y/x, in radians"),
    binary_fn!("hypot", f64::hypot, "Euclidean norm sqrt(x*x + y*y)"),
    binary_fn!("copysign", f64::copysign, "x with the sign of y"),
    BuiltinFn {
        name: "log",
        arity: Arity::Between(1, 2),
        call: log,
        description: "Natural logarithm, or logarithm to the given base",
    },
    BuiltinFn {
        name: "log10",
        arity: Arity::Exact(1),
        call: |args| log_with(args, f64::log10),
        description: "Base-10 logarithm",
    },
    BuiltinFn {
        name: "log2",
        arity: Arity::Exact(1),
        call: |args| log_with(args, f64::log2),
        description: "Base-2 logarithm",
    },
    BuiltinFn {
        name: "pow",
        arity: Arity::Exact(2),
        call: pow,
        description: "x raised to the power y",
    },
    BuiltinFn {
        name: "fmod",
        arity: Arity::Exact(2),
        call: fmod,
        description: "Remainder of x / y with the sign of x",
    },
    BuiltinFn {
        name: "factorial",
        arity: Arity::Exact(1),
        call: factorial,
        description: "n! for a non-negative integer n",
    },
    BuiltinFn {
        name: "gcd",
        arity: Arity::Exact(2),
        call: gcd,
        description: "Greatest common divisor of two integers",
    },
    BuiltinFn {
        name: "isnan",
        arity: Arity::Exact(1),
        call: |args| Ok(Value::Bool(args[0].is_nan())),
        description: "True if x is NaN",
    },
    BuiltinFn {
        name: "isinf",
        arity: Arity::Exact(1),
        call: |args| Ok(Value::Bool(args[0].is_infinite())),
        description: "True if x is positive or negative infinity",
    },
    BuiltinFn {
        name: "isfinite",
        arity: Arity::Exact(1),
        call: |args| Ok(Value::Bool(args[0].is_finite())),
        description: "True if x is neither infinite nor NaN",
    },
    BuiltinFn {
        name: "round",
        arity: Arity::Between(1, 2),
        call: round,
        description: "x rounded to n digits (half to even)",
    },
    unary_fn!("cbrt", f64::cbrt, "Cube root"),
    unary_fn!("expm1", f64::exp_m1, "exp(x) - 1, accurate for small x"),
    unary_fn!("erf", libm::erf, "Error function"),
    unary_fn!("erfc", libm::erfc, "Complementary error function 1 - erf(x)"),
    BuiltinFn {
        name: "log1p",
        arity: Arity::Exact(1),
        call: log1p,
        description: "Natural logarithm of 1 + x, accurate for small x",
    },
    BuiltinFn {
        name: "gamma",
        arity: Arity::Exact(1),
        call: |args| gamma_with(args, libm::tgamma),
        description: "Gamma function",
    },
    BuiltinFn {
        name: "lgamma",
        arity: Arity::Exact(1),
        call: |args| gamma_with(args, libm::lgamma),
        description: "Natural logarithm of the absolute value of gamma(x)",
    },
    BuiltinFn {
        name: "isqrt",
        arity: Arity::Exact(1),
        call: isqrt,
        description: "Integer square root of a non-negative integer",
    },
    BuiltinFn {
        name: "comb",
        arity: Arity::Exact(2),
        call: comb,
        description: "Ways to choose k items from n without order",
    },
    BuiltinFn {
        name: "perm",
        arity: Arity::Between(1, 2),
        call: perm,
        description: "Ways to choose k items from n with order (k defaults to n)",
    },
    BuiltinFn {
        name: "ldexp",
        arity: Arity::Exact(2),
        call: ldexp,
        description: "x * 2**i",
    },
    BuiltinFn {
        name: "remainder",
        arity: Arity::Exact(2),
        call: remainder,
        description: "x minus the nearest multiple of y (IEEE 754 remainder)",
    },
    BuiltinFn {
        name: "min",
        arity: Arity::AtLeast(1),
        call: min,
        description: "Smallest argument (NaN if any argument is NaN)",
    },
    BuiltinFn {
        name: "max",
        arity: Arity::AtLeast(1),
        call: max,
        description: "Largest argument (NaN if any argument is NaN)",
    },
];

pub const CONSTANTS: &[(&str, f64)] = &[
    ("pi", consts::PI),
    ("e", consts::E),
    ("tau", consts::TAU),
    ("inf", f64::INFINITY),
    ("nan", f64::NAN),
];

pub fn lookup(name: &str) -> Option<&'static BuiltinFn> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// The math namespace as name/value pairs, module metadata included.
/// Reserved `__` names are left for the importer to drop.
pub fn math_namespace() -> Vec<(&'static str, Value)> {
    let mut pairs: Vec<(&'static str, Value)> = vec![
        ("__name__", Value::from("math")),
        (
            "__doc__",
            Value::from("Mathematical functions and constants."),
        ),
    ];
    pairs.extend(CONSTANTS.iter().map(|&(name, n)| (name, Value::Number(n))));
    pairs.extend(FUNCTIONS.iter().map(|f| (f.name, Value::Builtin(f))));
    pairs
}
