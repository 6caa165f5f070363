//! Values crossing the script boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::api::ScriptHost;
use crate::dom::{WidgetId, WidgetKind};
use crate::error::{HostError, HostResult, ScriptError};

/// Something a script can hand to the host to be invoked later.
pub trait Callable {
    fn call(&self, host: &mut ScriptHost) -> Result<(), ScriptError>;
}

impl<F> Callable for F
where
    F: Fn(&mut ScriptHost) -> Result<(), ScriptError>,
{
    fn call(&self, host: &mut ScriptHost) -> Result<(), ScriptError> {
        self(host)
    }
}

/// Shared handle to a script function. Only lives on the script thread.
#[derive(Clone)]
pub struct Callback(Rc<dyn Callable>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ScriptHost) -> Result<(), ScriptError> + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, host: &mut ScriptHost) -> Result<(), ScriptError> {
        self.0.call(host)
    }

    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0))
    }
}

/// Opaque reference to a live widget. Scripts receive these from the host
/// and cannot construct them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetHandle {
    id: WidgetId,
    kind: WidgetKind,
}

impl WidgetHandle {
    pub(crate) fn new(id: WidgetId, kind: WidgetKind) -> Self {
        Self { id, kind }
    }

    pub fn id(self) -> WidgetId {
        self.id
    }

    pub fn kind(self) -> WidgetKind {
        self.kind
    }
}

impl fmt::Display for WidgetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.kind, self.id)
    }
}

/// A script-side value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Widget(WidgetHandle),
    Function(Callback),
    /// Ordered sequence, 1-based on the script side.
    List(Vec<Value>),
    Table(BTreeMap<String, Value>),
}

impl Value {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut ScriptHost) -> Result<(), ScriptError> + 'static,
    {
        Value::Function(Callback::new(f))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Widget(handle) => handle.kind().type_name(),
            Value::Function(_) => "function",
            Value::List(_) | Value::Table(_) => "table",
        }
    }

    pub fn as_widget(&self) -> Option<WidgetHandle> {
        match self {
            Value::Widget(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Look up a table field. Lists answer to 1-based integer keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Table(entries) => entries.get(key),
            Value::List(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| items.get(i)),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(entries) => {
                Value::Table(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Integer(a), Value::Number(b)) | (Value::Number(b), Value::Integer(a)) => *a as f64 == *b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Widget(a), Value::Widget(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Widget(handle) => write!(f, "{handle}"),
            Value::Function(callback) => write!(f, "function: {:p}", Rc::as_ptr(&callback.0)),
            Value::List(items) => write!(f, "table: [{} items]", items.len()),
            Value::Table(entries) => write!(f, "table: {{{} keys}}", entries.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<WidgetHandle> for Value {
    fn from(value: WidgetHandle) -> Self {
        Value::Widget(value)
    }
}

impl From<Callback> for Value {
    fn from(value: Callback) -> Self {
        Value::Function(value)
    }
}

// ---------------------------------------------------------------------------
// Argument checking
// ---------------------------------------------------------------------------

/// Positional arguments of one binding call, with typed accessors that
/// produce `InvalidArgument` errors naming the call.
pub struct Args<'a> {
    call: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(call: &'a str, values: &'a [Value]) -> Self {
        Self { call, values }
    }

    fn error(&self, message: impl Into<String>) -> HostError {
        HostError::invalid_argument(self.call, message)
    }

    /// Require between `min` and `max` arguments.
    pub fn expect_count(&self, min: usize, max: usize) -> HostResult<()> {
        let n = self.values.len();
        if n < min || n > max {
            let expected = if min == max { min.to_string() } else { format!("{min} to {max}") };
            return Err(self.error(format!("expected {expected} argument(s), got {n}")));
        }
        Ok(())
    }

    fn get(&self, index: usize) -> &'a Value {
        const NIL: &Value = &Value::Nil;
        self.values.get(index).unwrap_or(NIL)
    }

    fn mismatch(&self, index: usize, expected: &str) -> HostError {
        self.error(format!(
            "argument #{} expected {expected}, got {}",
            index + 1,
            self.get(index).type_name()
        ))
    }

    /// A string. Numbers are converted the way scripts print them.
    pub fn string(&self, index: usize) -> HostResult<String> {
        match self.get(index) {
            Value::String(s) => Ok(s.clone()),
            v @ (Value::Integer(_) | Value::Number(_)) => Ok(v.to_string()),
            _ => Err(self.mismatch(index, "string")),
        }
    }

    /// An integer. Numbers with no fractional part count.
    pub fn integer(&self, index: usize) -> HostResult<i64> {
        match self.get(index) {
            Value::Integer(n) => Ok(*n),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 => Ok(*n as i64),
            Value::Number(n) => Err(self.error(format!("argument #{} has no integer representation: {n}", index + 1))),
            _ => Err(self.mismatch(index, "integer")),
        }
    }

    pub fn number(&self, index: usize) -> HostResult<f64> {
        match self.get(index) {
            Value::Integer(n) => Ok(*n as f64),
            Value::Number(n) => Ok(*n),
            _ => Err(self.mismatch(index, "number")),
        }
    }

    pub fn callback(&self, index: usize) -> HostResult<Callback> {
        match self.get(index) {
            Value::Function(callback) => Ok(callback.clone()),
            _ => Err(self.mismatch(index, "function")),
        }
    }

    /// A callback, or nil/absent.
    pub fn optional_callback(&self, index: usize) -> HostResult<Option<Callback>> {
        match self.get(index) {
            Value::Nil => Ok(None),
            _ => self.callback(index).map(Some),
        }
    }
}
