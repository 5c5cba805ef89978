use std::collections::HashMap;

use clap::ArgMatches;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::binding::{ArgSpec, Coercion};
use crate::model::{Arity, Value};
use crate::tree::{NodeId, Registry};

/// The flat result of one parse run: field name to converted value, plus the
/// dispatch bookkeeping (the deepest node actually matched).
///
/// The matched node's parent chain inside the registry is what allows the
/// reconstructor to rewrap ancestors without re-deriving the dispatch path.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub(crate) values: HashMap<String, Value>,
    pub(crate) matched: NodeId,
}

impl ParseOutcome {
    /// The deepest node dispatched into (the root when no sub-command ran).
    pub fn matched(&self) -> NodeId {
        self.matched
    }

    /// Look up one flat field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

impl Registry {
    /// Flatten the host parser's result into a [`ParseOutcome`].
    ///
    /// Follows the sub-command dispatch chain to the deepest matched node and
    /// collects that node's leaf values (its flattened groups included).
    pub fn outcome(&self, root: NodeId, matches: &ArgMatches) -> ParseOutcome {
        let mut matched = root;
        let mut deepest = matches;
        while let Some((token, sub_matches)) = deepest.subcommand() {
            match self.node(matched).sub_command_for_token(token) {
                Some(child) => {
                    matched = child;
                    deepest = sub_matches;
                }
                None => break,
            }
        }

        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "Dispatch matched node {index} ('{schema}').",
                index = matched.0,
                schema = self.node(matched).schema_name,
            );
        }

        let mut values: HashMap<String, Value> = HashMap::default();
        for spec in self.namespace_leaves(matched) {
            if let Some(value) = extract(spec, deepest) {
                values.insert(spec.name.clone(), value);
            }
        }

        ParseOutcome { values, matched }
    }
}

fn extract(spec: &ArgSpec, matches: &ArgMatches) -> Option<Value> {
    match &spec.coercion {
        Coercion::Toggle { .. } => Some(Value::Boolean(matches.get_flag(&spec.name))),
        _ => match spec.arity {
            Arity::One => matches
                .get_one::<Value>(&spec.name)
                .cloned()
                .or_else(|| spec.default.clone()),
            Arity::ZeroOrMore => matches
                .get_many::<Value>(&spec.name)
                .map(|values| Value::List(values.cloned().collect()))
                .or_else(|| spec.default.clone())
                .or(Some(Value::List(Vec::default()))),
            Arity::Exactly(_) => matches
                .get_many::<Value>(&spec.name)
                .map(|values| Value::Tuple(values.cloned().collect()))
                .or_else(|| spec.default.clone()),
        },
    }
}
