use indexmap::IndexMap;

use crate::binding::Coercion;
use crate::model::Value;
use crate::outcome::ParseOutcome;
use crate::tree::{NodeId, Registry};

/// One field of a reconstructed value: a leaf value or a nested sub-value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A leaf value.
    Value(Value),
    /// A nested structured value (sub-command or group).
    Nested(SchemaValue),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Value(value) => write!(f, "{value}"),
            FieldValue::Nested(value) => write!(f, "{value}"),
        }
    }
}

/// A structured value mirroring the shape of the schema it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaValue {
    name: String,
    fields: IndexMap<String, FieldValue>,
}

impl SchemaValue {
    pub(crate) fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::default(),
        }
    }

    pub(crate) fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    /// The name of the schema this value was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Look up a leaf field value.
    pub fn value(&self, field: &str) -> Option<&Value> {
        match self.fields.get(field) {
            Some(FieldValue::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Look up a nested sub-value (sub-command or group).
    pub fn nested(&self, field: &str) -> Option<&SchemaValue> {
        match self.fields.get(field) {
            Some(FieldValue::Nested(value)) => Some(value),
            _ => None,
        }
    }

    /// Iterate the fields in schema declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl std::fmt::Display for SchemaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner: Vec<String> = self
            .fields
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        write!(f, "{}({})", self.name, inner.join(", "))
    }
}

impl Registry {
    /// Rebuild the nested structured value for a parse outcome.
    ///
    /// Populates the deepest matched node's own fields (routing group-owned
    /// fields into per-group sub-values), then walks the parent chain,
    /// rewrapping each ancestor around the child under the recorded attach
    /// name. Reconstruction reads only; repeating it yields an equal value.
    pub fn reconstruct(&self, outcome: &ParseOutcome) -> SchemaValue {
        let mut id = outcome.matched();
        let mut value = self.node_value(id, outcome);

        loop {
            let node = self.node(id);
            match (&node.attach_name, node.parent) {
                (Some(attach), Some(parent)) => {
                    let mut wrapper = SchemaValue::empty(self.node(parent).schema_name.clone());
                    wrapper.insert(attach.clone(), FieldValue::Nested(value));
                    value = wrapper;
                    id = parent;
                }
                _ => break,
            }
        }

        value
    }

    fn node_value(&self, id: NodeId, outcome: &ParseOutcome) -> SchemaValue {
        let node = self.node(id);
        let mut value = SchemaValue::empty(node.schema_name.clone());

        for spec in &node.leaves {
            match outcome.get(&spec.name) {
                Some(flat) => value.insert(spec.name.clone(), FieldValue::Value(flat.clone())),
                None => {
                    // Forward-compatible: an outcome may omit a field; fall
                    // back to the stored default where one exists.
                    if let Some(default) = &spec.default {
                        value.insert(spec.name.clone(), FieldValue::Value(default.clone()));
                    } else if let Coercion::Toggle { default } = &spec.coercion {
                        value.insert(
                            spec.name.clone(),
                            FieldValue::Value(Value::Boolean(*default)),
                        );
                    }
                }
            }
        }

        for (name, group) in node.groups() {
            let nested = self.node_value(group, outcome);
            value.insert(name.to_string(), FieldValue::Nested(nested));
        }

        for (name, extra) in &node.extra_defaults {
            if value.get(name).is_none() {
                value.insert(name.clone(), FieldValue::Value(extra.clone()));
            }
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Schema, TypeExpr};
    use crate::test::assert_contains;

    fn parse(schema: &Schema, tokens: &[&str]) -> SchemaValue {
        let mut registry = Registry::new();
        let root = registry.bind(schema).unwrap();
        let matches = registry
            .command(root, "program")
            .no_binary_name(true)
            .try_get_matches_from(tokens)
            .unwrap();
        let outcome = registry.outcome(root, &matches);
        registry.reconstruct(&outcome)
    }

    #[test]
    fn leaf_fields() {
        let schema = Schema::new("Job")
            .field("name", TypeExpr::Text)
            .option("retries", TypeExpr::Integer, Value::Integer(3));

        let value = parse(&schema, &["job1", "--retries", "5"]);

        assert_eq!(value.name(), "Job");
        assert_eq!(value.value("name"), Some(&Value::text("job1")));
        assert_eq!(value.value("retries"), Some(&Value::Integer(5)));
    }

    #[test]
    fn parent_chain_rewraps() {
        let leaf = Schema::new("Leaf").option("depth", TypeExpr::Integer, Value::Integer(0));
        let mid = Schema::new("Mid").subcommand("leaf_ns", leaf);
        let schema = Schema::new("Root").subcommand("mid_ns", mid);

        let value = parse(&schema, &["mid-ns", "leaf-ns", "--depth", "2"]);

        assert_eq!(value.name(), "Root");
        let mid_value = value.nested("mid_ns").unwrap();
        assert_eq!(mid_value.name(), "Mid");
        let leaf_value = mid_value.nested("leaf_ns").unwrap();
        assert_eq!(leaf_value.name(), "Leaf");
        assert_eq!(leaf_value.value("depth"), Some(&Value::Integer(2)));
    }

    #[test]
    fn group_fields_route_to_sub_value() {
        let server = Schema::new("Server")
            .option("port", TypeExpr::Integer, Value::Integer(8080))
            .option("host", TypeExpr::Text, Value::text("localhost"));
        let schema = Schema::new("Root")
            .field("name", TypeExpr::Text)
            .group("server", server);

        let value = parse(&schema, &["job1", "--port", "9090"]);

        // Flattened on the command line, nested in the result.
        assert_eq!(value.value("port"), None);
        let group = value.nested("server").unwrap();
        assert_eq!(group.name(), "Server");
        assert_eq!(group.value("port"), Some(&Value::Integer(9090)));
        assert_eq!(group.value("host"), Some(&Value::text("localhost")));
    }

    #[test]
    fn extra_defaults_stamped() {
        let schema = Schema::new("Job")
            .field("name", TypeExpr::Text)
            .extra_default("version", Value::Integer(2))
            // A real field shadows an extra default of the same name.
            .extra_default("name", Value::text("shadowed"));

        let value = parse(&schema, &["job1"]);

        assert_eq!(value.value("version"), Some(&Value::Integer(2)));
        assert_eq!(value.value("name"), Some(&Value::text("job1")));
    }

    #[test]
    fn reconstruction_is_idempotent() {
        let schema = Schema::new("Job")
            .field("name", TypeExpr::Text)
            .option("retries", TypeExpr::Integer, Value::Integer(3));
        let mut registry = Registry::new();
        let root = registry.bind(&schema).unwrap();
        let matches = registry
            .command(root, "program")
            .no_binary_name(true)
            .try_get_matches_from(["job1"])
            .unwrap();
        let outcome = registry.outcome(root, &matches);

        let first = registry.reconstruct(&outcome);
        let second = registry.reconstruct(&outcome);

        assert_eq!(first, second);
    }

    #[test]
    fn display_repr() {
        let schema = Schema::new("Job")
            .field("name", TypeExpr::Text)
            .option("retries", TypeExpr::Integer, Value::Integer(3));

        let value = parse(&schema, &["job1"]);
        let repr = value.to_string();

        assert_contains!(repr.as_str(), "Job(");
        assert_contains!(repr.as_str(), "name='job1'");
        assert_contains!(repr.as_str(), "retries=3");
    }
}
