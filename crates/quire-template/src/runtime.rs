//! Script interpreter.
//!
//! Values are plain [`serde_json::Value`]s. Reading a missing variable, field
//! or index yields `null`; reads never create anything.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::TemplateError;
use crate::escape::escape_html;
use crate::script::ast::{BinaryOp, Expr, Stmt, UnaryOp};

/// Host-provided template functions.
///
/// Built-in functions (`escape`, `len`, `upper`, `lower`, `trim`, `join`,
/// `default`, `contains`, `json`) are resolved first, so a host cannot
/// shadow them.
pub trait Functions {
    /// Call `name` with evaluated arguments.
    ///
    /// Returns `None` if this host does not provide `name`.
    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, TemplateError>>;
}

/// No host functions.
impl Functions for () {
    fn call(&self, _name: &str, _args: &[Value]) -> Option<Result<Value, TemplateError>> {
        None
    }
}

/// Run `program` and return the produced output.
pub(crate) fn execute(
    program: &[Stmt],
    globals: &Map<String, Value>,
    functions: &dyn Functions,
) -> Result<String, TemplateError> {
    let mut interpreter = Interpreter {
        globals,
        scopes: vec![HashMap::new()],
        functions,
        out: String::new(),
    };
    interpreter.run(program)?;
    Ok(interpreter.out)
}

struct Interpreter<'a> {
    globals: &'a Map<String, Value>,
    scopes: Vec<HashMap<String, Value>>,
    functions: &'a dyn Functions,
    out: String,
}

impl Interpreter<'_> {
    fn run(&mut self, stmts: &[Stmt]) -> Result<(), TemplateError> {
        for stmt in stmts {
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn scoped(&mut self, vars: HashMap<String, Value>, body: &[Stmt]) -> Result<(), TemplateError> {
        self.scopes.push(vars);
        let result = self.run(body);
        self.scopes.pop();
        result
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<(), TemplateError> {
        match stmt {
            Stmt::Text(text) => self.out.push_str(text),
            Stmt::Escape(expr) => {
                let value = self.eval(expr)?;
                self.out.push_str(&escape_html(&to_output(&value)));
            }
            Stmt::Echo(expr) => {
                let value = self.eval(expr)?;
                self.out.push_str(&to_output(&value));
            }
            Stmt::Let(name, expr) => {
                let value = self.eval(expr)?;
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name.clone(), value);
                }
            }
            Stmt::If {
                branches,
                otherwise,
            } => {
                for (condition, body) in branches {
                    if truthy(&self.eval(condition)?) {
                        return self.scoped(HashMap::new(), body);
                    }
                }
                self.scoped(HashMap::new(), otherwise)?;
            }
            Stmt::For {
                key,
                value,
                iter,
                body,
            } => {
                let items: Vec<(Value, Value)> = match self.eval(iter)? {
                    Value::Null => Vec::new(),
                    Value::Array(items) => items
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| (Value::from(i), item))
                        .collect(),
                    Value::Object(map) => map
                        .into_iter()
                        .map(|(k, v)| (Value::String(k), v))
                        .collect(),
                    other => {
                        return Err(TemplateError::runtime(format!(
                            "cannot iterate over {}",
                            type_name(&other)
                        )));
                    }
                };
                for (k, v) in items {
                    let mut vars = HashMap::from([(value.clone(), v)]);
                    if let Some(key) = key {
                        vars.insert(key.clone(), k);
                    }
                    self.scoped(vars, body)?;
                }
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Value {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, TemplateError> {
        Ok(match expr {
            Expr::Literal(value) => value.clone(),
            Expr::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Var(name) => self.lookup(name),
            Expr::Field(target, name) => match self.eval(target)? {
                Value::Object(mut map) => map.remove(name).unwrap_or(Value::Null),
                _ => Value::Null,
            },
            Expr::Index(target, index) => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                index_value(target, &index)
            }
            Expr::Call(name, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(name, &args)?
            }
            Expr::Unary(UnaryOp::Not, operand) => Value::Bool(!truthy(&self.eval(operand)?)),
            Expr::Unary(UnaryOp::Neg, operand) => {
                let value = self.eval(operand)?;
                arithmetic(BinaryOp::Sub, &Value::from(0), &value)?
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if truthy(&lhs) { self.eval(rhs)? } else { lhs }
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if truthy(&lhs) { lhs } else { self.eval(rhs)? }
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary(*op, &lhs, &rhs)?
            }
        })
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, TemplateError> {
        builtin(name, args)
            .or_else(|| self.functions.call(name, args))
            .unwrap_or_else(|| Err(TemplateError::runtime(format!("unknown function `{name}`"))))
    }
}

fn index_value(target: Value, index: &Value) -> Value {
    match (target, index) {
        (Value::Array(mut items), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < items.len())
            .map_or(Value::Null, |i| items.swap_remove(i)),
        (Value::Object(mut map), Value::String(key)) => map.remove(key).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// String form used when a value is written to the output.
pub(crate) fn to_output(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, TemplateError> {
    Ok(match op {
        BinaryOp::Concat => Value::String(to_output(lhs) + &to_output(rhs)),
        BinaryOp::Eq => Value::Bool(loose_eq(lhs, rhs)),
        BinaryOp::Ne => Value::Bool(!loose_eq(lhs, rhs)),
        BinaryOp::Lt => Value::Bool(compare(lhs, rhs)? == Ordering::Less),
        BinaryOp::Le => Value::Bool(compare(lhs, rhs)? != Ordering::Greater),
        BinaryOp::Gt => Value::Bool(compare(lhs, rhs)? == Ordering::Greater),
        BinaryOp::Ge => Value::Bool(compare(lhs, rhs)? != Ordering::Less),
        _ => arithmetic(op, lhs, rhs)?,
    })
}

/// Equality with `1 == 1.0`.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Result<Ordering, TemplateError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b))
            .ok_or_else(|| TemplateError::runtime("numbers are not comparable")),
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(TemplateError::runtime(format!(
            "cannot compare {} with {}",
            type_name(lhs),
            type_name(rhs)
        ))),
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, TemplateError> {
    let (Value::Number(a), Value::Number(b)) = (lhs, rhs) else {
        return Err(TemplateError::runtime(format!(
            "cannot apply {op:?} to {} and {}",
            type_name(lhs),
            type_name(rhs)
        )));
    };

    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        let exact = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div if b == 0 => return Err(TemplateError::runtime("division by zero")),
            BinaryOp::Div => a.checked_rem(b).filter(|&r| r == 0).and(a.checked_div(b)),
            BinaryOp::Rem if b == 0 => return Err(TemplateError::runtime("division by zero")),
            BinaryOp::Rem => a.checked_rem(b),
            _ => None,
        };
        if let Some(n) = exact {
            return Ok(Value::from(n));
        }
    }

    let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) else {
        return Err(TemplateError::runtime("number out of range"));
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => return Err(TemplateError::runtime("division by zero")),
        BinaryOp::Div => a / b,
        BinaryOp::Rem if b == 0.0 => return Err(TemplateError::runtime("division by zero")),
        BinaryOp::Rem => a % b,
        _ => return Err(TemplateError::runtime(format!("{op:?} is not arithmetic"))),
    };
    Number::from_f64(result)
        .map(Value::Number)
        .ok_or_else(|| TemplateError::runtime("arithmetic result is not a finite number"))
}

fn builtin(name: &str, args: &[Value]) -> Option<Result<Value, TemplateError>> {
    let result = match name {
        "escape" => arity(name, args, 1, 1)
            .map(|()| Value::String(escape_html(&to_output(&args[0])))),
        "len" => arity(name, args, 1, 1).and_then(|()| length(&args[0])),
        "upper" => arity(name, args, 1, 1).map(|()| Value::String(to_output(&args[0]).to_uppercase())),
        "lower" => arity(name, args, 1, 1).map(|()| Value::String(to_output(&args[0]).to_lowercase())),
        "trim" => arity(name, args, 1, 1).map(|()| Value::String(to_output(&args[0]).trim().to_owned())),
        "join" => arity(name, args, 1, 2).and_then(|()| join(&args[0], args.get(1))),
        "default" => arity(name, args, 2, 2).map(|()| match &args[0] {
            Value::Null => args[1].clone(),
            Value::String(s) if s.is_empty() => args[1].clone(),
            other => other.clone(),
        }),
        "contains" => arity(name, args, 2, 2).map(|()| Value::Bool(contains(&args[0], &args[1]))),
        "json" => arity(name, args, 1, 1).map(|()| Value::String(args[0].to_string())),
        _ => return None,
    };
    Some(result)
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), TemplateError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    };
    Err(TemplateError::runtime(format!(
        "`{name}` takes {expected} argument(s), got {}",
        args.len()
    )))
}

fn length(value: &Value) -> Result<Value, TemplateError> {
    let len = match value {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(TemplateError::runtime(format!(
                "`len` is not defined for {}",
                type_name(other)
            )));
        }
    };
    Ok(Value::from(len))
}

fn join(items: &Value, separator: Option<&Value>) -> Result<Value, TemplateError> {
    let separator = separator.map(to_output).unwrap_or_default();
    match items {
        Value::Null => Ok(Value::String(String::new())),
        Value::Array(items) => Ok(Value::String(
            items.iter().map(to_output).collect::<Vec<_>>().join(&separator),
        )),
        other => Err(TemplateError::runtime(format!(
            "`join` expects an array, got {}",
            type_name(other)
        ))),
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => s.contains(to_output(needle).as_str()),
        Value::Array(items) => items.iter().any(|item| loose_eq(item, needle)),
        Value::Object(map) => map.contains_key(&to_output(needle)),
        _ => false,
    }
}
