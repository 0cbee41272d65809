//! Shared expression evaluator.
//!
//! Pipeline: sanitize the display vocabulary into evaluator form, convert
//! non-decimal numerals to decimal, tokenize, then run a shunting-yard
//! evaluation over `rug::Float` values. Programmer evaluations run with
//! integer semantics and are bounds-checked against the 63-bit signed
//! range. Results are memoized per evaluator instance in a bounded
//! first-in-first-out cache; the cache is a pure key-value store and
//! disabling it cannot change any observable result.

use crate::base::Base;
use crate::error::CalcError;
use crate::settings::AngleUnit;
use lazy_static::lazy_static;
use regex::Regex;
use rug::ops::Pow;
use rug::{Float, Integer};
use std::collections::{HashMap, VecDeque};

/// The 63-bit signed magnitude bound for programmer evaluations.
pub const MAX_VALUE: i64 = i64::MAX;
pub const MIN_VALUE: i64 = i64::MIN;

const CACHE_CAP: usize = 256;

lazy_static! {
    /// Literal division-by-zero marker: `/0` not followed by more digits
    /// or a fraction point. Checked after whitespace removal.
    static ref DIV_BY_ZERO: Regex = Regex::new(r"/-?0(?:[^.0-9]|$)").unwrap();
    /// Dangling binary operator right before a close paren, left behind by
    /// the auto-close leniency.
    static ref OP_BEFORE_CLOSE: Regex = Regex::new(r"(?:yroot|<<|>>|[+\-*/%^])\)").unwrap();
}

/// Options an evaluation is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvalOptions {
    pub base: Base,
    /// Programmer semantics: truncating division, integer modulo, shifts,
    /// and the i64 bounds check.
    pub integer: bool,
    pub angle_unit: AngleUnit,
    /// Working precision in bits.
    pub prec: u32,
}

impl EvalOptions {
    pub fn standard(prec: u32) -> Self {
        EvalOptions {
            base: Base::Decimal,
            integer: false,
            angle_unit: AngleUnit::Radians,
            prec,
        }
    }

    pub fn programmer(base: Base) -> Self {
        EvalOptions {
            base,
            integer: true,
            angle_unit: AngleUnit::Radians,
            prec: 192,
        }
    }

    pub fn scientific(angle_unit: AngleUnit, prec: u32) -> Self {
        EvalOptions {
            base: Base::Decimal,
            integer: false,
            angle_unit,
            prec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    expr: String,
    opts: EvalOptions,
}

/// Memoizing evaluator. One instance per engine; the cache is never
/// shared across instances.
#[derive(Debug, Default)]
pub struct Evaluator {
    cache: HashMap<CacheKey, Result<Float, CalcError>>,
    order: VecDeque<CacheKey>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&mut self, expr: &str, opts: &EvalOptions) -> Result<Float, CalcError> {
        let key = CacheKey {
            expr: expr.to_owned(),
            opts: opts.clone(),
        };
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(expr, "evaluator cache hit");
            return hit.clone();
        }
        let result = evaluate_uncached(expr, opts);
        if self.order.len() >= CACHE_CAP {
            if let Some(evicted) = self.order.pop_front() {
                self.cache.remove(&evicted);
            }
        }
        self.order.push_back(key.clone());
        self.cache.insert(key, result.clone());
        result
    }
}

/// One-shot evaluation without the cache. The cached path must agree with
/// this function for every input.
pub fn evaluate_uncached(expr: &str, opts: &EvalOptions) -> Result<Float, CalcError> {
    if expr.trim().is_empty() {
        return Ok(Float::with_val(opts.prec, 0));
    }
    let sanitized = sanitize(expr);
    if sanitized.is_empty() {
        return Ok(Float::with_val(opts.prec, 0));
    }
    if DIV_BY_ZERO.is_match(&sanitized) {
        return Err(CalcError::DivisionByZero);
    }
    let decimal = if opts.base != Base::Decimal {
        decimalize(&sanitized, opts.base)?
    } else {
        sanitized
    };
    tracing::debug!(expr = %decimal, "evaluating");
    let tokens = tokenize(&decimal, opts)?;
    let value = run_tokens(tokens, opts)?;
    finish(value, opts)
}

/// Truncate a value to an integer within the 63-bit signed bound.
pub fn integer_value(v: &Float) -> Result<i64, CalcError> {
    if !v.is_finite() {
        return Err(CalcError::InvalidExpression);
    }
    let int = v
        .clone()
        .trunc()
        .to_integer()
        .ok_or(CalcError::InvalidExpression)?;
    int.to_i64().ok_or(CalcError::Overflow)
}

/// Normalize display spellings to evaluator form and drop whitespace:
/// `×`→`*`, `÷`→`/`, `−`→`-`, `π`→`pi`, `√`→`sqrt`, trailing dangling
/// operators stripped, operators dangling before an auto-closed paren
/// removed.
fn sanitize(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    for c in expr.chars() {
        match c {
            '×' => out.push('*'),
            '÷' => out.push('/'),
            '−' => out.push('-'),
            'π' => out.push_str("pi"),
            '√' => out.push_str("sqrt"),
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    loop {
        let cleaned = OP_BEFORE_CLOSE.replace_all(&out, ")");
        if cleaned == out {
            break;
        }
        out = cleaned.into_owned();
    }
    loop {
        let Some(suffix) = ["yroot", "<<", ">>", "+", "-", "*", "/", "%", "^"]
            .iter()
            .find(|op| out.ends_with(**op))
        else {
            break;
        };
        out.truncate(out.len() - suffix.len());
    }
    out
}

/// Replace every maximal numeral substring with its decimal rendering,
/// passing operators and parens through untouched.
fn decimalize(expr: &str, base: Base) -> Result<String, CalcError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_alphanumeric() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                i += 1;
            }
            let run: String = chars[start..i].iter().collect();
            let parsed = Integer::from_str_radix(&run, base.radix() as i32)
                .map_err(|_| CalcError::InvalidExpression)?;
            out.push_str(&parsed.to_string());
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Open,
    Close,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Shl,
    Shr,
    Yroot,
    Neg,
    Func(Func),
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Shift,
    Addition,
    Multiplication,
    Exponentiation,
    UnaryNegation,
    Function,
    Highest,
}

impl Op {
    fn precedence(self) -> Precedence {
        match self {
            Op::Shl | Op::Shr => Precedence::Shift,
            Op::Add | Op::Sub => Precedence::Addition,
            Op::Mul | Op::Div | Op::Mod => Precedence::Multiplication,
            Op::Pow | Op::Yroot => Precedence::Exponentiation,
            Op::Neg => Precedence::UnaryNegation,
            Op::Func(_) => Precedence::Function,
            Op::Open | Op::Close => Precedence::Highest,
        }
    }

    fn right_assoc(self) -> bool {
        matches!(self, Op::Pow | Op::Yroot | Op::Neg | Op::Func(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sec,
    Csc,
    Cot,
    Asec,
    Acsc,
    Acot,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Sech,
    Csch,
    Coth,
    Asech,
    Acsch,
    Acoth,
    Ln,
    Log,
    Sqrt,
    Sqr,
    Cube,
    Recip,
    Exp,
    Abs,
    Dms,
    Deg,
}

impl Func {
    fn from_name(name: &str) -> Option<Func> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sec" => Func::Sec,
            "csc" => Func::Csc,
            "cot" => Func::Cot,
            "asec" => Func::Asec,
            "acsc" => Func::Acsc,
            "acot" => Func::Acot,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "asinh" => Func::Asinh,
            "acosh" => Func::Acosh,
            "atanh" => Func::Atanh,
            "sech" => Func::Sech,
            "csch" => Func::Csch,
            "coth" => Func::Coth,
            "asech" => Func::Asech,
            "acsch" => Func::Acsch,
            "acoth" => Func::Acoth,
            "ln" => Func::Ln,
            "log" => Func::Log,
            "sqrt" => Func::Sqrt,
            "sqr" => Func::Sqr,
            "cube" => Func::Cube,
            "recip" => Func::Recip,
            "exp" => Func::Exp,
            "abs" => Func::Abs,
            "dms" => Func::Dms,
            "deg" => Func::Deg,
            _ => return None,
        })
    }

    fn apply(self, v: Float, opts: &EvalOptions) -> Result<Float, CalcError> {
        let prec = opts.prec;
        Ok(match self {
            Func::Sin => to_radians(v, opts).sin(),
            Func::Cos => to_radians(v, opts).cos(),
            Func::Tan => to_radians(v, opts).tan(),
            Func::Sec => safe_recip(to_radians(v, opts).cos())?,
            Func::Csc => safe_recip(to_radians(v, opts).sin())?,
            Func::Cot => safe_recip(to_radians(v, opts).tan())?,
            Func::Asin => from_radians(v.asin(), opts),
            Func::Acos => from_radians(v.acos(), opts),
            Func::Atan => from_radians(v.atan(), opts),
            Func::Asec => from_radians(safe_recip(v)?.acos(), opts),
            Func::Acsc => from_radians(safe_recip(v)?.asin(), opts),
            Func::Acot => from_radians(safe_recip(v)?.atan(), opts),
            Func::Sinh => v.sinh(),
            Func::Cosh => v.cosh(),
            Func::Tanh => v.tanh(),
            Func::Asinh => v.asinh(),
            Func::Acosh => v.acosh(),
            Func::Atanh => v.atanh(),
            Func::Sech => safe_recip(v.cosh())?,
            Func::Csch => safe_recip(v.sinh())?,
            Func::Coth => safe_recip(v.tanh())?,
            Func::Asech => safe_recip(v)?.acosh(),
            Func::Acsch => safe_recip(v)?.asinh(),
            Func::Acoth => safe_recip(v)?.atanh(),
            Func::Ln => v.ln(),
            Func::Log => v.log10(),
            Func::Sqrt => v.sqrt(),
            Func::Sqr => v.square(),
            Func::Cube => {
                let sq = v.clone().square();
                sq * v
            }
            Func::Recip => safe_recip(v)?,
            Func::Exp => v.exp(),
            Func::Abs => v.abs(),
            Func::Dms => {
                // dd.dddd -> dd.mmss
                let sign = v.is_sign_negative();
                let a = v.abs();
                let d = a.clone().trunc();
                let seconds = (a - &d) * 3600;
                let minutes = Float::with_val(prec, &seconds / 60).trunc();
                let seconds = seconds - Float::with_val(prec, &minutes * 60);
                let result: Float = d + minutes / 100 + seconds / 10000;
                if sign {
                    -result
                } else {
                    result
                }
            }
            Func::Deg => {
                // dd.mmss -> dd.dddd
                let sign = v.is_sign_negative();
                let a = v.abs();
                let d = a.clone().trunc();
                let frac = a - &d;
                let minutes = Float::with_val(prec, &frac * 100).trunc();
                let seconds = frac * 10000 - Float::with_val(prec, &minutes * 100);
                let result: Float = d + minutes / 60 + seconds / 3600;
                if sign {
                    -result
                } else {
                    result
                }
            }
        })
    }
}

#[derive(Debug, Clone)]
enum Token {
    Number(Float),
    Op(Op),
}

fn tokenize(expr: &str, opts: &EvalOptions) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // exponent suffix produced by prior results, e.g. 2.8e40
            if i < chars.len() && chars[i] == 'e' {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let parsed = Float::parse(&literal).map_err(|_| CalcError::InvalidExpression)?;
            tokens.push(Token::Number(Float::with_val(opts.prec, parsed)));
            continue;
        }
        if c.is_ascii_lowercase() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();
            match name.as_str() {
                "pi" => tokens.push(Token::Number(Float::with_val(
                    opts.prec,
                    rug::float::Constant::Pi,
                ))),
                "e" => tokens.push(Token::Number(Float::with_val(opts.prec, 1).exp())),
                "yroot" => tokens.push(Token::Op(Op::Yroot)),
                other => match Func::from_name(other) {
                    Some(f) => tokens.push(Token::Op(Op::Func(f))),
                    None => return Err(CalcError::InvalidExpression),
                },
            }
            continue;
        }
        let op = match c {
            '(' => Op::Open,
            ')' => Op::Close,
            '+' => Op::Add,
            '*' => Op::Mul,
            '/' => Op::Div,
            '%' => Op::Mod,
            '^' => Op::Pow,
            '-' => {
                let unary = match tokens.last() {
                    None => true,
                    Some(Token::Op(op)) => *op != Op::Close,
                    Some(Token::Number(_)) => false,
                };
                if unary {
                    Op::Neg
                } else {
                    Op::Sub
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'<') {
                    i += 1;
                    Op::Shl
                } else {
                    return Err(CalcError::InvalidExpression);
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'>') {
                    i += 1;
                    Op::Shr
                } else {
                    return Err(CalcError::InvalidExpression);
                }
            }
            _ => return Err(CalcError::InvalidExpression),
        };
        tokens.push(Token::Op(op));
        i += 1;
    }
    Ok(tokens)
}

fn run_tokens(tokens: Vec<Token>, opts: &EvalOptions) -> Result<Float, CalcError> {
    let mut output: Vec<Float> = Vec::new();
    let mut ops: Vec<Op> = Vec::new();
    for token in tokens {
        match token {
            Token::Number(v) => output.push(v),
            Token::Op(Op::Open) => ops.push(Op::Open),
            Token::Op(Op::Close) => {
                while let Some(&top) = ops.last() {
                    if top == Op::Open {
                        break;
                    }
                    ops.pop();
                    apply_op(&mut output, top, opts)?;
                }
                if ops.pop() != Some(Op::Open) {
                    return Err(CalcError::InvalidExpression);
                }
            }
            Token::Op(op) => {
                while let Some(&top) = ops.last() {
                    if top == Op::Open {
                        break;
                    }
                    let pops = top.precedence() > op.precedence()
                        || (top.precedence() == op.precedence() && !op.right_assoc());
                    if !pops {
                        break;
                    }
                    ops.pop();
                    apply_op(&mut output, top, opts)?;
                }
                ops.push(op);
            }
        }
    }
    while let Some(op) = ops.pop() {
        if op == Op::Open {
            return Err(CalcError::InvalidExpression);
        }
        apply_op(&mut output, op, opts)?;
    }
    if output.len() != 1 {
        return Err(CalcError::InvalidExpression);
    }
    output.pop().ok_or(CalcError::InvalidExpression)
}

fn apply_op(output: &mut Vec<Float>, op: Op, opts: &EvalOptions) -> Result<(), CalcError> {
    tracing::trace!(?op, "apply");
    match op {
        Op::Neg => {
            let v = output.pop().ok_or(CalcError::InvalidExpression)?;
            output.push(-v);
        }
        Op::Func(f) => {
            let v = output.pop().ok_or(CalcError::InvalidExpression)?;
            output.push(f.apply(v, opts)?);
        }
        _ => {
            let b = output.pop().ok_or(CalcError::InvalidExpression)?;
            let a = output.pop().ok_or(CalcError::InvalidExpression)?;
            output.push(apply_binary(a, b, op, opts)?);
        }
    }
    Ok(())
}

fn apply_binary(a: Float, b: Float, op: Op, opts: &EvalOptions) -> Result<Float, CalcError> {
    let prec = opts.prec;
    match op {
        Op::Add => Ok(a + b),
        Op::Sub => Ok(a - b),
        Op::Mul => Ok(a * b),
        Op::Div => {
            if b.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            if opts.integer {
                let quotient = to_integer(&a)? / to_integer(&b)?;
                Ok(Float::with_val(prec, quotient))
            } else {
                Ok(a / b)
            }
        }
        Op::Mod => {
            if b.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            if opts.integer {
                let rem = to_integer(&a)? % to_integer(&b)?;
                Ok(Float::with_val(prec, rem))
            } else {
                let q = Float::with_val(prec, &a / &b).floor();
                Ok(a - b * q)
            }
        }
        Op::Pow => {
            let result = a.pow(&b);
            if opts.integer {
                Ok(result.trunc())
            } else {
                Ok(result)
            }
        }
        Op::Yroot => {
            if b.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            let odd_root = b.is_integer()
                && b.clone()
                    .to_integer()
                    .map(|i| i.is_odd())
                    .unwrap_or(false);
            let inv = safe_recip(b)?;
            if a.is_sign_negative() && odd_root {
                Ok(-((-a).pow(&inv)))
            } else {
                Ok(a.pow(&inv))
            }
        }
        Op::Shl | Op::Shr => {
            let value = to_integer(&a)?;
            let count = to_integer(&b)?
                .to_u32()
                .filter(|c| *c <= 63)
                .ok_or(CalcError::Overflow)?;
            let shifted = if op == Op::Shl {
                value << count
            } else {
                value >> count
            };
            Ok(Float::with_val(prec, shifted))
        }
        _ => Err(CalcError::InvalidExpression),
    }
}

fn finish(value: Float, opts: &EvalOptions) -> Result<Float, CalcError> {
    if opts.integer {
        let bounded = integer_value(&value)?;
        Ok(Float::with_val(opts.prec, bounded))
    } else if !value.is_finite() {
        Err(CalcError::InvalidExpression)
    } else {
        Ok(value)
    }
}

fn to_integer(v: &Float) -> Result<Integer, CalcError> {
    if !v.is_finite() || !v.is_integer() {
        return Err(CalcError::InvalidExpression);
    }
    v.clone().to_integer().ok_or(CalcError::InvalidExpression)
}

fn safe_recip(v: Float) -> Result<Float, CalcError> {
    if v.is_zero() {
        return Err(CalcError::DivisionByZero);
    }
    Ok(v.recip())
}

fn to_radians(v: Float, opts: &EvalOptions) -> Float {
    match opts.angle_unit {
        AngleUnit::Radians => v,
        AngleUnit::Degrees => {
            let pi = Float::with_val(opts.prec, rug::float::Constant::Pi);
            v * pi / 180
        }
        AngleUnit::Gradians => {
            let pi = Float::with_val(opts.prec, rug::float::Constant::Pi);
            v * pi / 200
        }
    }
}

fn from_radians(v: Float, opts: &EvalOptions) -> Float {
    match opts.angle_unit {
        AngleUnit::Radians => v,
        AngleUnit::Degrees => {
            let pi = Float::with_val(opts.prec, rug::float::Constant::Pi);
            v * 180 / pi
        }
        AngleUnit::Gradians => {
            let pi = Float::with_val(opts.prec, rug::float::Constant::Pi);
            v * 200 / pi
        }
    }
}
