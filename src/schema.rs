use indexmap::IndexMap;

use crate::model::Value;

/// A declared type expression for a single schema field.
///
/// This is the closed set of shapes the compiler understands; anything outside
/// it fails the build (see [`SchemaError::UnsupportedType`](crate::SchemaError)).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Accepts any text.
    Text,
    /// Accepts any integer.
    Integer,
    /// Accepts any real number.
    Real,
    /// A boolean toggle.
    Boolean,
    /// Accepts only the enumerated literal values.
    Literal(Vec<Value>),
    /// Accepts any of the alternatives, tried in order.
    Union(Vec<TypeExpr>),
    /// A variable-length list of the element expression.
    List(Box<TypeExpr>),
    /// A fixed-length tuple; each element has its own expression.
    Tuple(Vec<TypeExpr>),
}

impl TypeExpr {
    /// Shorthand for a literal-value set of texts.
    ///
    /// ### Example
    /// ```
    /// use argbind::TypeExpr;
    ///
    /// let mode = TypeExpr::literal_texts(["fast", "safe"]);
    /// ```
    pub fn literal_texts<I: IntoIterator<Item = S>, S: Into<String>>(values: I) -> Self {
        TypeExpr::Literal(values.into_iter().map(Value::text).collect())
    }

    /// Shorthand for a variable-length list of the element expression.
    pub fn list(element: TypeExpr) -> Self {
        TypeExpr::List(Box::new(element))
    }
}

/// The class-level default stored on a field, tagged by binding strategy.
#[derive(Debug, Clone)]
pub(crate) enum FieldDefault {
    /// A plain default value; the field binds as an optional flag.
    Literal(Value),
    /// A nested schema dispatched via an explicit sub-command token.
    SubCommand(Schema),
    /// A nested schema flattened into the parent's flag namespace.
    Group(Schema),
}

#[derive(Debug, Clone)]
pub(crate) struct FieldDecl {
    pub name: String,
    pub type_expr: Option<TypeExpr>,
    pub default: Option<FieldDefault>,
}

/// A declarative description of a structured value: an ordered sequence of
/// named fields, each with a declared type expression and an optional default.
///
/// A field with no default is required/positional; one with a default is
/// optional/flagged; one whose default is itself a schema nests as a
/// sub-command or argument group.
///
/// ### Example
/// ```
/// use argbind::{Schema, TypeExpr, Value};
///
/// let schema = Schema::new("Job")
///     .field("name", TypeExpr::Text)
///     .option("retries", TypeExpr::Integer, Value::Integer(3))
///     .option(
///         "mode",
///         TypeExpr::literal_texts(["fast", "safe"]),
///         Value::text("safe"),
///     );
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDecl>,
    docs: IndexMap<String, String>,
    extra_defaults: IndexMap<String, Value>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::default(),
            docs: IndexMap::default(),
            extra_defaults: IndexMap::default(),
        }
    }

    /// Declare a required field (no default): binds as a positional argument.
    pub fn field(mut self, name: impl Into<String>, type_expr: TypeExpr) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            type_expr: Some(type_expr),
            default: None,
        });
        self
    }

    /// Declare an optional field (with a default): binds as a flagged argument.
    pub fn option(
        mut self,
        name: impl Into<String>,
        type_expr: TypeExpr,
        default: Value,
    ) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            type_expr: Some(type_expr),
            default: Some(FieldDefault::Literal(default)),
        });
        self
    }

    /// Declare an assignment-only field: a default value with no explicit type.
    ///
    /// The type falls back to [`TypeExpr::Text`].
    pub fn assign(mut self, name: impl Into<String>, default: Value) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            type_expr: None,
            default: Some(FieldDefault::Literal(default)),
        });
        self
    }

    /// Nest a sub-schema as a dispatchable sub-command.
    ///
    /// The field name (dash-separated) becomes the dispatch token in argv; the
    /// remainder of argv parses under the child's own grammar.
    pub fn subcommand(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            type_expr: None,
            default: Some(FieldDefault::SubCommand(schema)),
        });
        self
    }

    /// Nest a sub-schema as a named argument group.
    ///
    /// The group's fields flatten into this schema's flag namespace, but report
    /// back under the group's own structured sub-value.
    pub fn group(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            type_expr: None,
            default: Some(FieldDefault::Group(schema)),
        });
        self
    }

    /// Attach help text to a field.
    ///
    /// The per-field text is caller-supplied; extracting it from source
    /// comments is outside this crate.
    pub fn doc(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.docs.insert(field.into(), text.into());
        self
    }

    /// Stamp an extra stored default onto the compiled node.
    ///
    /// Extra defaults are not arguments; they reappear verbatim in the
    /// reconstructed value (unless shadowed by a real field).
    pub fn extra_default(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra_defaults.insert(name.into(), value);
        self
    }

    /// The schema's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered list of field names to bind.
    ///
    /// Required fields (no default) come first in declaration order, then all
    /// defaulted fields (values, sub-commands, groups) in declaration order.
    /// Reserved `__name__` style fields are always excluded.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| field.default.is_none() && !is_reserved(&field.name))
            .map(|field| field.name.as_str())
            .collect();
        names.extend(
            self.fields
                .iter()
                .filter(|field| field.default.is_some() && !is_reserved(&field.name))
                .map(|field| field.name.as_str()),
        );
        names
    }

    pub(crate) fn decl(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub(crate) fn docs(&self) -> &IndexMap<String, String> {
        &self.docs
    }

    pub(crate) fn extra_defaults(&self) -> &IndexMap<String, Value> {
        &self.extra_defaults
    }
}

// The reserved pattern for internal bookkeeping names.
pub(crate) fn is_reserved(name: &str) -> bool {
    name.len() >= 4 && name.starts_with("__") && name.ends_with("__")
}
