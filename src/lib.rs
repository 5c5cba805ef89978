//! Compile declarative schemas into command line parsers.
//!
//! A [`Schema`] declares named, typed fields; compiling it produces a parser
//! whose positional and optional arguments mirror the declarations, and whose
//! parse result is reassembled into a [`SchemaValue`] matching the schema's
//! nested shape.
//!
//! ```
//! use argbind::{Schema, SchemaParser, TypeExpr, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::new("Job")
//!     .field("name", TypeExpr::Text)
//!     .option("retries", TypeExpr::Integer, Value::Integer(3))
//!     .option(
//!         "mode",
//!         TypeExpr::Literal(vec![Value::text("safe"), Value::text("fast")]),
//!         Value::text("safe"),
//!     );
//!
//! let parser = SchemaParser::compile("runner", &schema)?;
//! let job = parser.parse_tokens(&["job1", "--retries", "5"])?;
//!
//! assert_eq!(job.name(), "Job");
//! assert_eq!(job.value("name"), Some(&Value::text("job1")));
//! assert_eq!(job.value("retries"), Some(&Value::Integer(5)));
//! assert_eq!(job.value("mode"), Some(&Value::text("safe")));
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]
mod binding;
mod error;
mod model;
mod outcome;
mod parser;
mod reconstruct;
mod resolve;
mod schema;
mod tree;

pub use binding::CoercionError;
pub use error::SchemaError;
pub use model::{Arity, ScalarKind, Value};
pub use outcome::ParseOutcome;
pub use parser::SchemaParser;
pub use reconstruct::{FieldValue, SchemaValue};
pub use schema::{Schema, TypeExpr};
pub use tree::{NodeId, Registry};

#[cfg(test)]
pub(crate) mod test {
    macro_rules! assert_contains {
        ($base:expr, $sub:expr) => {
            assert!(
                $base.contains($sub),
                "'{b}' does not contain '{s}'",
                b = $base,
                s = $sub,
            );
        };
    }

    pub(crate) use assert_contains;
}
