//! Default Evaluator
//!
//! A small expression evaluator used when no custom evaluator is configured.
//! It tokenizes and parses the line, then walks the tree against the
//! per-line [`EvalContext`]. Syntax errors are reported as a synchronous
//! failure; runtime errors and `throw` are reported through [`Done`].

use tracing::debug;

use super::context::EvalContext;
use super::lexer::Lexer;
use super::numeric::string_to_number;
use super::parser::{BinaryOp, Expr, Parser, Stmt, UnaryOp};
use crate::repl::backend_trait::{settled, Done, EvalFuture, Evaluator};
use crate::repl::value::{to_display_string, Value};

/// Built-in expression evaluator
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEvaluator;

impl DefaultEvaluator {
    /// Create a new evaluator
    pub fn new() -> Self {
        Self
    }

    /// Evaluate code directly, returning the value of the last statement
    pub fn evaluate(
        &self,
        code: &str,
        context: &EvalContext,
    ) -> Result<Value, Value> {
        let program = parse(code)?;
        Interpreter { context }.run(&program)
    }
}

impl Evaluator for DefaultEvaluator {
    fn eval(
        &self,
        code: &str,
        context: EvalContext,
        source: &str,
        done: Done,
    ) -> Result<EvalFuture, Value> {
        if code.trim().is_empty() {
            done.empty();
            return Ok(settled());
        }

        let program = parse(code)?;
        debug!(source, statements = program.len(), "evaluating");
        match (Interpreter { context: &context }).run(&program) {
            Ok(value) => done.value(value),
            Err(thrown) => done.error(thrown),
        };
        Ok(settled())
    }
}

fn parse(code: &str) -> Result<Vec<Stmt>, Value> {
    let tokens = Lexer::new(code).tokenize()?;
    Parser::new(tokens).parse_program()
}

struct Interpreter<'a> {
    context: &'a EvalContext,
}

impl Interpreter<'_> {
    fn run(
        &self,
        program: &[Stmt],
    ) -> Result<Value, Value> {
        let mut last = Value::Undefined;
        for stmt in program {
            match stmt {
                Stmt::Expr(expr) => last = self.eval(expr)?,
                Stmt::Throw(expr) => return Err(self.eval(expr)?),
            }
        }
        Ok(last)
    }

    fn eval(
        &self,
        expr: &Expr,
    ) -> Result<Value, Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::BigInt(n) => Ok(Value::BigInt(*n)),
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Ident(name) => self.lookup(name),
            Expr::Array(items) => {
                let values = items.iter().map(|e| self.eval(e)).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(values))
            }
            Expr::Object(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for (key, e) in entries {
                    values.push((key.clone(), self.eval(e)?));
                }
                Ok(Value::object(values))
            }
            Expr::Unary(UnaryOp::TypeOf, operand) => {
                // `typeof` on an undeclared name is not an error
                if let Expr::Ident(name) = operand.as_ref() {
                    if self.context.get(name).is_none() && builtin(name).is_none() {
                        return Ok(Value::from("undefined"));
                    }
                }
                Ok(Value::from(self.eval(operand)?.type_of()))
            }
            Expr::Unary(op, operand) => unary(*op, self.eval(operand)?),
            Expr::Binary(BinaryOp::And, l, r) => {
                let left = self.eval(l)?;
                if left.is_truthy() {
                    self.eval(r)
                } else {
                    Ok(left)
                }
            }
            Expr::Binary(BinaryOp::Or, l, r) => {
                let left = self.eval(l)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(r)
                }
            }
            Expr::Binary(op, l, r) => binary(*op, self.eval(l)?, self.eval(r)?),
            Expr::Call { callee, args, .. } => {
                let args = args.iter().map(|e| self.eval(e)).collect::<Result<Vec<_>, _>>()?;
                self.call(callee, args)
            }
        }
    }

    fn lookup(
        &self,
        name: &str,
    ) -> Result<Value, Value> {
        if let Some(value) = self.context.get(name) {
            return Ok(value.clone());
        }
        builtin(name).ok_or_else(|| Value::error("ReferenceError", format!("{} is not defined", name)))
    }

    fn call(
        &self,
        callee: &str,
        args: Vec<Value>,
    ) -> Result<Value, Value> {
        let target = self.lookup(callee)?;
        let Value::Function(Some(name)) = &target else {
            return Err(type_error(format!("{} is not a function", callee)));
        };

        let first = args.into_iter().next().unwrap_or(Value::Undefined);
        match name.as_str() {
            "Error" | "TypeError" | "RangeError" | "SyntaxError" | "ReferenceError" => {
                let message = if first.is_undefined() { String::new() } else { to_string(&first)? };
                Ok(Value::error(name.clone(), message))
            }
            "Symbol" => {
                let desc = if first.is_undefined() { String::new() } else { to_string(&first)? };
                Ok(Value::Symbol(desc))
            }
            "String" => Ok(Value::String(to_string(&first)?)),
            "Number" => Ok(Value::Number(to_number(&first)?)),
            "Boolean" => Ok(Value::Bool(first.is_truthy())),
            _ => Err(type_error(format!("{} is not a function", callee))),
        }
    }
}

const BUILTINS: &[&str] = &[
    "Error",
    "TypeError",
    "RangeError",
    "SyntaxError",
    "ReferenceError",
    "Symbol",
    "String",
    "Number",
    "Boolean",
];

fn builtin(name: &str) -> Option<Value> {
    BUILTINS
        .contains(&name)
        .then(|| Value::Function(Some(name.to_string())))
}

fn type_error(message: impl Into<String>) -> Value {
    Value::error("TypeError", message)
}

fn to_number(value: &Value) -> Result<f64, Value> {
    match value {
        Value::Undefined => Ok(f64::NAN),
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => Ok(*n),
        Value::String(s) => Ok(string_to_number(s).unwrap_or(f64::NAN)),
        Value::BigInt(_) => Err(type_error("Cannot convert a BigInt value to a number")),
        Value::Symbol(_) => Err(type_error("Cannot convert a Symbol value to a number")),
        Value::Array(_) => Ok(string_to_number(&to_display_string(value)).unwrap_or(f64::NAN)),
        Value::Proxy(p) => to_number(&p.target),
        Value::Object(_) | Value::Function(_) | Value::Error(_) => Ok(f64::NAN),
    }
}

fn to_string(value: &Value) -> Result<String, Value> {
    match value {
        Value::Symbol(_) => Err(type_error("Cannot convert a Symbol value to a string")),
        other => Ok(to_display_string(other)),
    }
}

/// Primitive conversion for `+` and comparisons: containers become strings
fn to_primitive(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Error(_) => {
            Value::String(to_display_string(&value))
        }
        Value::Proxy(p) => to_primitive(p.target.clone()),
        other => other,
    }
}

fn unary(
    op: UnaryOp,
    value: Value,
) -> Result<Value, Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Plus => Ok(Value::Number(to_number(&value)?)),
        UnaryOp::Neg => match value {
            Value::BigInt(n) => n
                .checked_neg()
                .map(Value::BigInt)
                .ok_or_else(|| Value::error("RangeError", "Maximum BigInt size exceeded")),
            other => Ok(Value::Number(-to_number(&other)?)),
        },
        UnaryOp::TypeOf => Ok(Value::from(value.type_of())),
    }
}

fn binary(
    op: BinaryOp,
    left: Value,
    right: Value,
) -> Result<Value, Value> {
    match op {
        BinaryOp::StrictEq => return Ok(Value::Bool(left.strict_eq(&right))),
        BinaryOp::StrictNe => return Ok(Value::Bool(!left.strict_eq(&right))),
        BinaryOp::LooseEq => return Ok(Value::Bool(loose_eq(&left, &right)?)),
        BinaryOp::LooseNe => return Ok(Value::Bool(!loose_eq(&left, &right)?)),
        _ => {}
    }

    let left = to_primitive(left);
    let right = to_primitive(right);

    if op == BinaryOp::Add {
        if let (Value::String(_), _) | (_, Value::String(_)) = (&left, &right) {
            return Ok(Value::String(format!("{}{}", to_string(&left)?, to_string(&right)?)));
        }
    }

    if matches!(op, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge) {
        return compare(op, &left, &right);
    }

    match (&left, &right) {
        (Value::BigInt(a), Value::BigInt(b)) => bigint_arith(op, *a, *b),
        (Value::BigInt(_), _) | (_, Value::BigInt(_)) => {
            Err(type_error("Cannot mix BigInt and other types, use explicit conversions"))
        }
        _ => {
            let (a, b) = (to_number(&left)?, to_number(&right)?);
            let n = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                BinaryOp::Pow => js_pow(a, b),
                _ => f64::NAN,
            };
            Ok(Value::Number(n))
        }
    }
}

/// `**` differs from `powf` for `1 ** ±Infinity` and `1 ** NaN`
fn js_pow(
    base: f64,
    exp: f64,
) -> f64 {
    if exp.is_nan() || (base.abs() == 1.0 && exp.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exp)
}

fn bigint_arith(
    op: BinaryOp,
    a: i128,
    b: i128,
) -> Result<Value, Value> {
    let overflow = || Value::error("RangeError", "Maximum BigInt size exceeded");
    let result = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Div | BinaryOp::Rem if b == 0 => {
            return Err(Value::error("RangeError", "Division by zero"));
        }
        BinaryOp::Div => a.checked_div(b).ok_or_else(overflow)?,
        BinaryOp::Rem => a.checked_rem(b).ok_or_else(overflow)?,
        BinaryOp::Pow => {
            if b < 0 {
                return Err(Value::error("RangeError", "Exponent must be non-negative"));
            }
            let exp = u32::try_from(b).map_err(|_| overflow())?;
            a.checked_pow(exp).ok_or_else(overflow)?
        }
        _ => return Ok(Value::Undefined),
    };
    Ok(Value::BigInt(result))
}

fn compare(
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Result<Value, Value> {
    let ordering = if let (Value::String(a), Value::String(b)) = (left, right) {
        Some(a.cmp(b))
    } else {
        let a = numeric_for_compare(left)?;
        let b = numeric_for_compare(right)?;
        a.partial_cmp(&b)
    };

    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => false,
    };
    Ok(Value::Bool(result))
}

fn numeric_for_compare(value: &Value) -> Result<f64, Value> {
    match value {
        Value::BigInt(n) => Ok(*n as f64),
        other => to_number(other),
    }
}

fn loose_eq(
    left: &Value,
    right: &Value,
) -> Result<bool, Value> {
    Ok(match (left, right) {
        (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
        (Value::Number(_) | Value::String(_) | Value::Bool(_), Value::Number(_) | Value::String(_) | Value::Bool(_))
            if !matches!((left, right), (Value::String(_), Value::String(_))) =>
        {
            to_number(left)? == to_number(right)?
        }
        (Value::BigInt(a), Value::Number(b)) | (Value::Number(b), Value::BigInt(a)) => *a as f64 == *b,
        _ => left.strict_eq(right),
    })
}
