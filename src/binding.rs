use indexmap::IndexMap;
use thiserror::Error;

use crate::error::SchemaError;
use crate::model::{Arity, ScalarKind, Value};
use crate::resolve::Resolution;

/// A per-invocation coercion failure, surfaced through the host parser's
/// invalid-value convention.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoercionError {
    /// The input text is outside the field's enumerated choice set.
    #[error("invalid choice '{token}' (choose from {choices}).")]
    InvalidChoice {
        /// The rejected input text.
        token: String,
        /// The allowed choices, comma separated.
        choices: String,
    },

    /// No candidate kind both converted the input and passed its literal gate.
    #[error("cannot convert '{token}' to any of the allowed kinds: {kinds}. Errors: [{errors}]")]
    NoKindAccepted {
        /// The rejected input text.
        token: String,
        /// Every kind attempted, comma separated, in registration order.
        kinds: String,
        /// The per-kind failure, comma separated, aligned with `kinds`.
        errors: String,
    },
}

/// The text-to-value strategy bound to one leaf argument.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Coercion {
    /// Presence of the flag flips the recorded boolean default.
    Toggle { default: bool },
    /// Restricted to exactly these values (the union of all literal sets).
    Choices(Vec<Value>),
    /// Ordered kind fallback; `Some(gate)` restricts a kind to its own literals.
    Convert(Vec<(ScalarKind, Option<Vec<Value>>)>),
    /// Unconstrained text passthrough.
    Text,
}

impl Coercion {
    /// Coerce one input token.
    ///
    /// Never called for `Toggle`: toggles take no value.
    pub(crate) fn coerce(&self, token: &str) -> Result<Value, CoercionError> {
        match self {
            Coercion::Toggle { .. } => {
                unreachable!("internal error - must not coerce on a toggle")
            }
            Coercion::Text => Ok(Value::text(token)),
            Coercion::Choices(choices) => {
                for choice in choices {
                    let kind = choice
                        .kind()
                        .expect("internal error - choices must be scalar values");
                    if let Ok(value) = convert(kind, token) {
                        if &value == choice {
                            return Ok(value);
                        }
                    }
                }
                Err(CoercionError::InvalidChoice {
                    token: token.to_string(),
                    choices: join(choices.iter()),
                })
            }
            Coercion::Convert(kinds) => {
                let mut errors: Vec<String> = Vec::default();
                for (kind, gate) in kinds {
                    let value = match convert(*kind, token) {
                        Ok(value) => value,
                        Err(error) => {
                            errors.push(error);
                            continue;
                        }
                    };
                    match gate {
                        Some(literals) if !literals.contains(&value) => {
                            errors.push(format!(
                                "{kind} restricted to {}",
                                join(literals.iter())
                            ));
                        }
                        _ => return Ok(value),
                    }
                }
                Err(CoercionError::NoKindAccepted {
                    token: token.to_string(),
                    kinds: join(kinds.iter().map(|(kind, _)| kind)),
                    errors: errors.join(", "),
                })
            }
        }
    }
}

fn convert(kind: ScalarKind, token: &str) -> Result<Value, String> {
    match kind {
        ScalarKind::Text => Ok(Value::text(token)),
        ScalarKind::Integer => token
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| format!("int: {e}")),
        ScalarKind::Real => token
            .parse::<f64>()
            .map(Value::Real)
            .map_err(|e| format!("real: {e}")),
        ScalarKind::Boolean => token
            .parse::<bool>()
            .map(Value::Boolean)
            .map_err(|e| format!("bool: {e}")),
    }
}

fn join<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items
        .map(|item| item.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// One concrete argument specification: everything the host parser needs to
/// bind a single leaf field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArgSpec {
    // The field name; also the stored destination on the flat outcome.
    pub name: String,
    // The dash-separated surface form; flags carry no `--` prefix here.
    pub display: String,
    pub positional: bool,
    pub arity: Arity,
    pub default: Option<Value>,
    pub coercion: Coercion,
    pub help: Option<String>,
}

impl ArgSpec {
    pub(crate) fn type_repr(&self) -> String {
        match &self.coercion {
            Coercion::Toggle { .. } => "flag".to_string(),
            Coercion::Text => "text".to_string(),
            Coercion::Choices(_) => "choice".to_string(),
            Coercion::Convert(kinds) => kinds
                .iter()
                .map(|(kind, _)| kind.repr())
                .collect::<Vec<&str>>()
                .join("|"),
        }
    }
}

/// Combine a field's name, class-level default, and resolution into a spec.
pub(crate) fn build(
    name: &str,
    default: Option<&Value>,
    resolution: &Resolution,
    docs: &IndexMap<String, String>,
) -> Result<ArgSpec, SchemaError> {
    let positional = default.is_none();
    let display = name.replace('_', "-");

    let coercion = if resolution.is_boolean {
        // The toggle action supplies the default implicitly.
        Coercion::Toggle {
            default: default.map(Value::is_truthy).unwrap_or(false),
        }
    } else if !resolution.allowed.is_empty()
        && resolution.allowed.values().all(|allowed| !allowed.any)
    {
        Coercion::Choices(
            resolution
                .allowed
                .values()
                .flat_map(|allowed| allowed.literals.iter().cloned())
                .collect(),
        )
    } else if !resolution.allowed.is_empty() {
        Coercion::Convert(
            resolution
                .allowed
                .iter()
                .map(|(kind, allowed)| {
                    let gate = if allowed.any {
                        None
                    } else {
                        Some(allowed.literals.clone())
                    };
                    (*kind, gate)
                })
                .collect(),
        )
    } else {
        Coercion::Text
    };

    let default = match &coercion {
        Coercion::Toggle { .. } => None,
        _ => default.cloned(),
    };

    Ok(ArgSpec {
        name: name.to_string(),
        display,
        positional,
        arity: resolution.arity,
        default,
        coercion,
        help: docs.get(name).cloned(),
    })
}
