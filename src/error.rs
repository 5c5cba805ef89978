use thiserror::Error;

/// A fatal schema compilation error.
///
/// Any of these abort the build before a parser is exposed to the caller; an
/// invalid schema never produces a usable parser.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The declared type expression falls outside the supported shapes.
    #[error("unsupported type expression for field '{field}': {detail}.")]
    UnsupportedType {
        /// The offending field.
        field: String,
        /// What made the expression unsupported.
        detail: String,
    },

    /// A field resolved to a boolean toggle while also claiming non-boolean alternatives.
    #[error("field '{field}' mixes a boolean toggle with non-boolean alternatives.")]
    BooleanConflict {
        /// The offending field.
        field: String,
    },

    /// Two sibling fields (possibly across flattened groups) bind the same name.
    #[error("duplicate parameter name '{name}' within '{schema}'.")]
    DuplicateName {
        /// The colliding name.
        name: String,
        /// The schema owning the colliding namespace.
        schema: String,
    },

    /// A sub-command was nested inside an argument group.
    #[error("field '{field}' nests a sub-command inside an argument group.")]
    SubCommandInGroup {
        /// The offending field.
        field: String,
    },
}
