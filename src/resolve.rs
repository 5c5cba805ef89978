use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::model::{Arity, ScalarKind, Value};
use crate::schema::TypeExpr;

/// What a single concrete kind admits: any convertible value, an enumerated
/// literal set, or both (mixed literal+kind unions).
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Allowed {
    pub any: bool,
    pub literals: Vec<Value>,
}

/// The normalized resolution of one field's declared type expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution {
    // Registration order is semantic: coercion tries kinds in this order.
    pub allowed: IndexMap<ScalarKind, Allowed>,
    pub is_boolean: bool,
    pub arity: Arity,
}

enum WorkItem<'e> {
    Expr(&'e TypeExpr),
    Lit(&'e Value),
}

/// Expand a declared type expression into its normalized resolution.
///
/// Maintains a work queue seeded with the expression; unions and literal sets
/// flatten back onto the queue, scalars and literal constants record into the
/// per-kind allowed map. Anything outside the supported shapes is fatal.
pub(crate) fn resolve(field: &str, expr: &TypeExpr) -> Result<Resolution, SchemaError> {
    let mut queue: VecDeque<WorkItem<'_>> = VecDeque::default();

    let arity = match expr {
        TypeExpr::List(element) => {
            queue.push_back(WorkItem::Expr(element));
            Arity::ZeroOrMore
        }
        TypeExpr::Tuple(elements) => {
            if elements.is_empty() || elements.len() > u8::MAX as usize {
                return Err(SchemaError::UnsupportedType {
                    field: field.to_string(),
                    detail: format!("tuple of {} elements", elements.len()),
                });
            }
            for element in elements {
                queue.push_back(WorkItem::Expr(element));
            }
            Arity::Exactly(elements.len() as u8)
        }
        other => {
            queue.push_back(WorkItem::Expr(other));
            Arity::One
        }
    };

    let mut allowed: IndexMap<ScalarKind, Allowed> = IndexMap::default();
    let mut is_boolean = false;

    while let Some(item) = queue.pop_front() {
        match item {
            WorkItem::Expr(TypeExpr::Union(alternatives)) => {
                for alternative in alternatives {
                    queue.push_back(WorkItem::Expr(alternative));
                }
            }
            WorkItem::Expr(TypeExpr::Literal(values)) => {
                for value in values {
                    queue.push_back(WorkItem::Lit(value));
                }
            }
            WorkItem::Expr(TypeExpr::Text) => {
                allowed.entry(ScalarKind::Text).or_default().any = true;
            }
            WorkItem::Expr(TypeExpr::Integer) => {
                allowed.entry(ScalarKind::Integer).or_default().any = true;
            }
            WorkItem::Expr(TypeExpr::Real) => {
                allowed.entry(ScalarKind::Real).or_default().any = true;
            }
            WorkItem::Expr(TypeExpr::Boolean) => {
                is_boolean = true;
            }
            WorkItem::Expr(TypeExpr::List(_)) => {
                return Err(SchemaError::UnsupportedType {
                    field: field.to_string(),
                    detail: "list nested below the top level".to_string(),
                });
            }
            WorkItem::Expr(TypeExpr::Tuple(_)) => {
                return Err(SchemaError::UnsupportedType {
                    field: field.to_string(),
                    detail: "tuple nested below the top level".to_string(),
                });
            }
            WorkItem::Lit(value) => match value.kind() {
                Some(kind) => {
                    allowed.entry(kind).or_default().literals.push(value.clone());
                }
                None => {
                    return Err(SchemaError::UnsupportedType {
                        field: field.to_string(),
                        detail: format!("sequence literal {value}"),
                    });
                }
            },
        }
    }

    // Boolean is exclusive: a toggle cannot coexist with any other coercion.
    if is_boolean && !allowed.is_empty() {
        return Err(SchemaError::BooleanConflict {
            field: field.to_string(),
        });
    }

    if is_boolean && arity != Arity::One {
        return Err(SchemaError::UnsupportedType {
            field: field.to_string(),
            detail: "boolean toggle cannot repeat".to_string(),
        });
    }

    Ok(Resolution {
        allowed,
        is_boolean,
        arity,
    })
}
