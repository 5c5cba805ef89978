use clap::Command;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::error::SchemaError;
use crate::reconstruct::SchemaValue;
use crate::schema::Schema;
use crate::tree::{NodeId, Registry};

/// A compiled schema, ready to parse command lines.
///
/// Compilation binds the schema tree into a [`Registry`] and builds the host
/// parser once; each parse run clones the host command, so a single compiled
/// parser may be reused across runs.
#[derive(Debug)]
pub struct SchemaParser {
    program: String,
    registry: Registry,
    root: NodeId,
    command: Command,
}

impl SchemaParser {
    /// Compile a schema into a parser for the named program.
    pub fn compile(program: impl Into<String>, schema: &Schema) -> Result<Self, SchemaError> {
        let program = program.into();
        let mut registry = Registry::new();
        let root = registry.bind(schema)?;
        let command = registry.command(root, &program).no_binary_name(true);

        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "Compiled schema '{schema}' for program '{program}'.",
                schema = schema.name(),
            );
        }

        Ok(Self {
            program,
            registry,
            root,
            command,
        })
    }

    /// The program name the parser was compiled for.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The bound registry backing this parser.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The root node of the bound schema tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Parse explicit tokens (program name excluded).
    pub fn parse_tokens(&self, tokens: &[&str]) -> Result<SchemaValue, clap::Error> {
        let matches = self.command.clone().try_get_matches_from(tokens)?;
        let outcome = self.registry.outcome(self.root, &matches);
        Ok(self.registry.reconstruct(&outcome))
    }

    /// Parse the process command line, exiting with the host parser's error
    /// rendering (usage or help text) on failure.
    pub fn parse(&self) -> SchemaValue {
        let tokens: Vec<String> = std::env::args().skip(1).collect();
        let borrowed: Vec<&str> = tokens.iter().map(String::as_str).collect();
        match self.parse_tokens(&borrowed) {
            Ok(value) => value,
            Err(error) => error.exit(),
        }
    }
}
