use std::collections::HashSet;

use clap::builder::ValueParser;
use clap::{Arg, ArgAction, Command};
use indexmap::IndexMap;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::binding::{self, ArgSpec, Coercion};
use crate::error::SchemaError;
use crate::model::{Arity, Value};
use crate::resolve;
use crate::schema::{FieldDefault, Schema, TypeExpr};

/// Addresses one compiled node within a [`Registry`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// How a child sub-schema binds onto its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildKind {
    /// Mutually exclusive dispatch: one of possibly many children per run.
    SubCommand,
    /// Always-present named sub-collection sharing the parent's flag namespace.
    Group,
}

/// One compiled parser-building unit: a schema bound into the tree.
///
/// Created once per attach site at build time; immutable thereafter. Read
/// during both parser construction and result reconstruction.
#[derive(Debug)]
pub(crate) struct BoundNode {
    pub schema_name: String,
    // The field name under which the parent refers to this node; root has none.
    pub attach_name: Option<String>,
    pub parent: Option<NodeId>,
    pub leaves: Vec<ArgSpec>,
    pub children: Vec<(String, NodeId, ChildKind)>,
    pub extra_defaults: IndexMap<String, Value>,
    // A node with sub-command children but no leaves of its own must dispatch.
    pub dispatch_required: bool,
}

impl BoundNode {
    pub(crate) fn sub_command_for_token(&self, token: &str) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(name, _, kind)| {
                *kind == ChildKind::SubCommand && name.replace('_', "-") == token
            })
            .map(|(_, id, _)| *id)
    }

    pub(crate) fn groups(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children
            .iter()
            .filter(|(_, _, kind)| *kind == ChildKind::Group)
            .map(|(name, id, _)| (name.as_str(), *id))
    }
}

/// The arena of compiled schema nodes.
///
/// Populate via [`Registry::bind`] during a single-threaded setup phase; reads
/// are `&self` and the registry is effectively frozen once parsing begins.
#[derive(Debug, Default)]
pub struct Registry {
    nodes: Vec<BoundNode>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a schema (and its nested sub-schemas) into bound nodes.
    ///
    /// Each attach site compiles to its own node: two fields sharing one
    /// schema produce independent nodes, so stamped defaults never cross-talk.
    pub fn bind(&mut self, schema: &Schema) -> Result<NodeId, SchemaError> {
        self.bind_at(schema, None, None, false)
    }

    fn bind_at(
        &mut self,
        schema: &Schema,
        attach_name: Option<String>,
        parent: Option<NodeId>,
        in_group: bool,
    ) -> Result<NodeId, SchemaError> {
        let id = NodeId(self.nodes.len());
        self.nodes.push(BoundNode {
            schema_name: schema.name().to_string(),
            attach_name,
            parent,
            leaves: Vec::default(),
            children: Vec::default(),
            extra_defaults: schema.extra_defaults().clone(),
            dispatch_required: false,
        });

        let mut leaves: Vec<ArgSpec> = Vec::default();
        let mut children: Vec<(String, NodeId, ChildKind)> = Vec::default();

        for name in schema.field_names() {
            let decl = schema
                .decl(name)
                .expect("internal error - field_names must map to declarations");

            match &decl.default {
                Some(FieldDefault::SubCommand(sub)) => {
                    if in_group {
                        return Err(SchemaError::SubCommandInGroup {
                            field: name.to_string(),
                        });
                    }
                    let child =
                        self.bind_at(sub, Some(name.to_string()), Some(id), false)?;
                    children.push((name.to_string(), child, ChildKind::SubCommand));
                }
                Some(FieldDefault::Group(sub)) => {
                    let child = self.bind_at(sub, Some(name.to_string()), Some(id), true)?;
                    children.push((name.to_string(), child, ChildKind::Group));
                }
                other => {
                    let default = match other {
                        Some(FieldDefault::Literal(value)) => Some(value),
                        _ => None,
                    };
                    // An assignment-only field falls back to plain text.
                    let fallback = TypeExpr::Text;
                    let type_expr = decl.type_expr.as_ref().unwrap_or(&fallback);
                    let resolution = resolve::resolve(name, type_expr)?;
                    leaves.push(binding::build(name, default, &resolution, schema.docs())?);
                }
            }
        }

        let dispatch_required = leaves.is_empty()
            && children
                .iter()
                .any(|(_, _, kind)| *kind == ChildKind::SubCommand);

        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "Bound '{schema}' as node {index} ({leaves} leaves, {children} children).",
                schema = schema.name(),
                index = id.0,
                leaves = leaves.len(),
                children = children.len(),
            );
        }

        {
            let node = &mut self.nodes[id.0];
            node.leaves = leaves;
            node.children = children;
            node.dispatch_required = dispatch_required;
        }

        // Groups flatten into their owning command's namespace, so uniqueness
        // is checked per command owner, after the whole sub-tree exists.
        if !in_group {
            self.check_namespace(id)?;
        }

        Ok(id)
    }

    fn check_namespace(&self, id: NodeId) -> Result<(), SchemaError> {
        let mut taken: HashSet<&str> = HashSet::default();
        for name in self.namespace_names(id) {
            if !taken.insert(name) {
                return Err(SchemaError::DuplicateName {
                    name: name.to_string(),
                    schema: self.node(id).schema_name.clone(),
                });
            }
        }
        Ok(())
    }

    // Every name one command owner binds: leaf specs, child attach names (a
    // sub-command token or group heading collides with a leaf too), and the
    // names inside flattened groups.
    fn namespace_names(&self, id: NodeId) -> Vec<&str> {
        let node = self.node(id);
        let mut names: Vec<&str> = node.leaves.iter().map(|spec| spec.name.as_str()).collect();
        for (name, child, kind) in &node.children {
            names.push(name.as_str());
            if *kind == ChildKind::Group {
                names.extend(self.namespace_names(*child));
            }
        }
        names
    }

    // The leaves bound onto one command: the node's own plus all transitively
    // flattened group leaves.
    pub(crate) fn namespace_leaves(&self, id: NodeId) -> Vec<&ArgSpec> {
        let node = self.node(id);
        let mut specs: Vec<&ArgSpec> = node.leaves.iter().collect();
        for (_, group, _) in node
            .children
            .iter()
            .filter(|(_, _, kind)| *kind == ChildKind::Group)
        {
            specs.extend(self.namespace_leaves(*group));
        }
        specs
    }

    pub(crate) fn node(&self, id: NodeId) -> &BoundNode {
        &self.nodes[id.0]
    }

    /// Register a compiled node with the host parser: build the `clap` command
    /// tree rooted at `id`.
    pub fn command(&self, id: NodeId, program: &str) -> Command {
        let node = self.node(id);
        let mut command = Command::new(program.to_string());

        for spec in &node.leaves {
            command = command.arg(arg_from(spec, None));
        }
        for (name, group, _) in node
            .children
            .iter()
            .filter(|(_, _, kind)| *kind == ChildKind::Group)
        {
            command = self.push_group_args(command, name, *group);
        }
        for (name, child, _) in node
            .children
            .iter()
            .filter(|(_, _, kind)| *kind == ChildKind::SubCommand)
        {
            command = command.subcommand(self.command(*child, &name.replace('_', "-")));
        }

        if node.dispatch_required {
            command = command.subcommand_required(true);
        }

        command
    }

    fn push_group_args(&self, mut command: Command, heading: &str, id: NodeId) -> Command {
        let node = self.node(id);
        for spec in &node.leaves {
            command = command.arg(arg_from(spec, Some(heading)));
        }
        for (name, group, _) in node
            .children
            .iter()
            .filter(|(_, _, kind)| *kind == ChildKind::Group)
        {
            command = self.push_group_args(command, name, *group);
        }
        command
    }
}

fn arg_from(spec: &ArgSpec, heading: Option<&str>) -> Arg {
    let mut arg = Arg::new(spec.name.clone());

    match &spec.coercion {
        Coercion::Toggle { default } => {
            let action = if *default {
                ArgAction::SetFalse
            } else {
                ArgAction::SetTrue
            };
            arg = arg.long(spec.display.clone()).action(action);
        }
        coercion => {
            let coercion = coercion.clone();
            arg = arg
                .value_parser(ValueParser::new(move |token: &str| coercion.coerce(token)))
                .value_name(format!("{}: {}", spec.display, spec.type_repr()));
            arg = match spec.arity {
                Arity::One => arg.num_args(1),
                Arity::ZeroOrMore => arg.num_args(0..),
                Arity::Exactly(n) => arg.num_args(n as usize),
            };
            if spec.positional {
                arg = arg.required(!matches!(spec.arity, Arity::ZeroOrMore));
            } else {
                arg = arg.long(spec.display.clone()).required(false);
            }
        }
    }

    if let Some(help) = &spec.help {
        arg = arg.help(help.clone());
    }
    if let Some(heading) = heading {
        arg = arg.help_heading(heading.replace('_', "-"));
    }

    arg
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn bind_flat_schema() {
        // Setup
        let schema = Schema::new("Job")
            .field("name", TypeExpr::Text)
            .option("retries", TypeExpr::Integer, Value::Integer(3));
        let mut registry = Registry::new();

        // Execute
        let root = registry.bind(&schema).unwrap();

        // Verify
        let node = registry.node(root);
        assert_eq!(node.schema_name, "Job");
        assert_eq!(node.attach_name, None);
        assert_eq!(node.parent, None);
        assert_eq!(node.leaves.len(), 2);
        assert!(node.children.is_empty());
        assert!(!node.dispatch_required);
    }

    #[test]
    fn bind_sub_command_chain() {
        // Setup
        let leaf = Schema::new("Leaf").option("depth", TypeExpr::Integer, Value::Integer(0));
        let mid = Schema::new("Mid").subcommand("leaf_ns", leaf);
        let root_schema = Schema::new("Root").subcommand("mid_ns", mid);
        let mut registry = Registry::new();

        // Execute
        let root = registry.bind(&root_schema).unwrap();

        // Verify
        let root_node = registry.node(root);
        assert!(root_node.dispatch_required);
        assert_eq!(root_node.children.len(), 1);

        let mid_id = root_node.sub_command_for_token("mid-ns").unwrap();
        let mid_node = registry.node(mid_id);
        assert_eq!(mid_node.attach_name, Some("mid_ns".to_string()));
        assert_eq!(mid_node.parent, Some(root));
        assert!(mid_node.dispatch_required);

        let leaf_id = mid_node.sub_command_for_token("leaf-ns").unwrap();
        let leaf_node = registry.node(leaf_id);
        assert_eq!(leaf_node.attach_name, Some("leaf_ns".to_string()));
        assert_eq!(leaf_node.parent, Some(mid_id));
        assert!(!leaf_node.dispatch_required);
        assert_eq!(leaf_node.leaves.len(), 1);
    }

    #[test]
    fn dispatch_optional_with_own_leaves() {
        let schema = Schema::new("Root")
            .field("name", TypeExpr::Text)
            .subcommand("sub_ns", Schema::new("Sub"));
        let mut registry = Registry::new();

        let root = registry.bind(&schema).unwrap();

        assert!(!registry.node(root).dispatch_required);
    }

    #[test]
    fn bind_group_shares_namespace() {
        // Setup
        let server = Schema::new("Server")
            .option("port", TypeExpr::Integer, Value::Integer(8080));
        let schema = Schema::new("Root")
            .field("name", TypeExpr::Text)
            .group("server", server);
        let mut registry = Registry::new();

        // Execute
        let root = registry.bind(&schema).unwrap();

        // Verify
        let names: Vec<&str> = registry
            .namespace_leaves(root)
            .into_iter()
            .map(|spec| spec.name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "port"]);

        let (group_name, group_id) = registry.node(root).groups().next().unwrap();
        assert_eq!(group_name, "server");
        assert_eq!(registry.node(group_id).parent, Some(root));
    }

    #[test]
    fn duplicate_sibling_names() {
        let schema = Schema::new("Root")
            .field("name", TypeExpr::Text)
            .option("name", TypeExpr::Integer, Value::Integer(0));
        let mut registry = Registry::new();

        let error = registry.bind(&schema).unwrap_err();

        assert_eq!(
            error,
            SchemaError::DuplicateName {
                name: "name".to_string(),
                schema: "Root".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_across_group_flattening() {
        // The group's flags share the parent's namespace, so a collision with a
        // parent field is a build error.
        let group = Schema::new("Group").option("name", TypeExpr::Text, Value::text(""));
        let schema = Schema::new("Root")
            .field("name", TypeExpr::Text)
            .group("extra", group);
        let mut registry = Registry::new();

        let error = registry.bind(&schema).unwrap_err();

        assert_matches!(error, SchemaError::DuplicateName { ref name, .. } => {
            assert_eq!(name, "name");
        });
    }

    #[test]
    fn leaf_and_sub_command_share_name() {
        // Both surface as the token "run" on the root command.
        let schema = Schema::new("Root")
            .field("run", TypeExpr::Text)
            .subcommand("run", Schema::new("Run"));
        let mut registry = Registry::new();

        let error = registry.bind(&schema).unwrap_err();

        assert_eq!(
            error,
            SchemaError::DuplicateName {
                name: "run".to_string(),
                schema: "Root".to_string(),
            }
        );
    }

    #[test]
    fn leaf_and_group_share_name() {
        let group = Schema::new("Server").option("port", TypeExpr::Integer, Value::Integer(0));
        let schema = Schema::new("Root")
            .field("server", TypeExpr::Text)
            .group("server", group);
        let mut registry = Registry::new();

        let error = registry.bind(&schema).unwrap_err();

        assert_matches!(error, SchemaError::DuplicateName { ref name, .. } => {
            assert_eq!(name, "server");
        });
    }

    #[test]
    fn same_name_across_sub_commands_is_fine() {
        // Sub-commands own separate namespaces.
        let a = Schema::new("A").option("level", TypeExpr::Integer, Value::Integer(0));
        let b = Schema::new("B").option("level", TypeExpr::Integer, Value::Integer(0));
        let schema = Schema::new("Root").subcommand("a", a).subcommand("b", b);
        let mut registry = Registry::new();

        registry.bind(&schema).unwrap();
    }

    #[test]
    fn sub_command_inside_group() {
        let inner = Schema::new("Inner");
        let group = Schema::new("Group").subcommand("inner", inner);
        let schema = Schema::new("Root").group("grouped", group);
        let mut registry = Registry::new();

        let error = registry.bind(&schema).unwrap_err();

        assert_eq!(
            error,
            SchemaError::SubCommandInGroup {
                field: "inner".to_string(),
            }
        );
    }

    #[test]
    fn shared_schema_compiles_per_attach_site() {
        // Two attach sites of one schema must not share a node.
        let shared = Schema::new("Shared").option("x", TypeExpr::Integer, Value::Integer(0));
        let schema = Schema::new("Root")
            .subcommand("first", shared.clone())
            .subcommand("second", shared);
        let mut registry = Registry::new();

        let root = registry.bind(&schema).unwrap();

        let first = registry.node(root).sub_command_for_token("first").unwrap();
        let second = registry.node(root).sub_command_for_token("second").unwrap();
        assert_ne!(first, second);
        assert_eq!(registry.node(first).schema_name, "Shared");
        assert_eq!(registry.node(second).schema_name, "Shared");
    }

    #[test]
    fn build_error_propagates_from_nested_schema() {
        let bad = Schema::new("Bad").field("broken", TypeExpr::list(TypeExpr::list(TypeExpr::Text)));
        let schema = Schema::new("Root").subcommand("bad", bad);
        let mut registry = Registry::new();

        let error = registry.bind(&schema).unwrap_err();

        assert_matches!(error, SchemaError::UnsupportedType { ref field, .. } => {
            assert_eq!(field, "broken");
        });
    }

    #[test]
    fn command_structure() {
        // Spot-check the registered clap surface.
        let sub = Schema::new("Sub").option("depth", TypeExpr::Integer, Value::Integer(0));
        let schema = Schema::new("Root")
            .field("name", TypeExpr::Text)
            .subcommand("sub_ns", sub);
        let mut registry = Registry::new();
        let root = registry.bind(&schema).unwrap();

        let command = registry.command(root, "program");

        assert_eq!(command.get_name(), "program");
        let subcommands: Vec<&str> = command.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(subcommands, vec!["sub-ns"]);
        let positionals: Vec<String> = command
            .get_positionals()
            .map(|arg| arg.get_id().to_string())
            .collect();
        assert_eq!(positionals, vec!["name".to_string()]);
    }
}
