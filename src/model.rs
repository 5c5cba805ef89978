/// The concrete scalar kinds a field may coerce into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Plain text; conversion never fails.
    Text,
    /// A signed integer (`i64`).
    Integer,
    /// A real number (`f64`).
    Real,
    /// A boolean toggle.
    Boolean,
}

impl ScalarKind {
    pub(crate) fn repr(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Integer => "int",
            ScalarKind::Real => "real",
            ScalarKind::Boolean => "bool",
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.repr())
    }
}

/// The cardinality of inputs to match for a single field.
///
/// Inspired by argparse: <https://docs.python.org/3/library/argparse.html#nargs>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Precisely one value.
    One,
    /// `*`: may be any number of values, including `0`.
    ZeroOrMore,
    /// `N`: precisely `N` values.
    Exactly(u8),
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A runtime value: the result of coercing input text, or a schema-declared default.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Real value.
    Real(f64),
    /// Boolean value.
    Boolean(bool),
    /// Variable-length sequence of values.
    List(Vec<Value>),
    /// Fixed-length sequence of values.
    Tuple(Vec<Value>),
}

impl Value {
    /// Build a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// The scalar kind of this value, or `None` for sequences.
    pub(crate) fn kind(&self) -> Option<ScalarKind> {
        match self {
            Value::Text(_) => Some(ScalarKind::Text),
            Value::Integer(_) => Some(ScalarKind::Integer),
            Value::Real(_) => Some(ScalarKind::Real),
            Value::Boolean(_) => Some(ScalarKind::Boolean),
            Value::List(_) | Value::Tuple(_) => None,
        }
    }

    pub(crate) fn is_truthy(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(value) => write!(f, "'{value}'"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Real(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::List(values) => {
                let inner: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", inner.join(", "))
            }
            Value::Tuple(values) => {
                let inner: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", inner.join(", "))
            }
        }
    }
}
