//! Named schema lookup.

use crate::config::project_config_schema;
use crate::model::user::{
    create_user_schema, user_list_response_schema, user_list_schema, user_response_schema,
    user_schema,
};
use crate::validation::schema::{Schema, SchemaExt};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Names of the built-in schemas.
pub mod names {
    pub const USER: &str = "user";
    pub const USER_LIST: &str = "userList";
    pub const USER_RESPONSE: &str = "userResponse";
    pub const USER_LIST_RESPONSE: &str = "userListResponse";
    pub const CREATE_USER: &str = "createUser";
    pub const PROJECT_CONFIG: &str = "projectConfig";
}

static BUILTIN: Lazy<Arc<SchemaRegistry>> = Lazy::new(|| {
    Arc::new(
        SchemaRegistryBuilder::new()
            .register(names::USER, user_schema())
            .register(names::USER_LIST, user_list_schema())
            .register(names::USER_RESPONSE, user_response_schema())
            .register(names::USER_LIST_RESPONSE, user_list_response_schema())
            .register(names::CREATE_USER, create_user_schema())
            .register(names::PROJECT_CONFIG, project_config_schema())
            .build(),
    )
});

/// Schemas keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry of built-in schemas.
    pub fn builtin() -> Arc<SchemaRegistry> {
        BUILTIN.clone()
    }

    /// Register `schema` under `name`, replacing any previous entry.
    ///
    /// The stored schema carries `name`, which labels its diagnostics.
    pub fn register(&mut self, name: &str, schema: impl Into<Schema>) {
        let schema = schema.named(name);
        self.schemas.insert(name.to_string(), Arc::new(schema));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Fluent construction of a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    registry: SchemaRegistry,
}

impl SchemaRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a copy of the built-in schemas.
    pub fn with_builtins() -> Self {
        Self {
            registry: SchemaRegistry::builtin().as_ref().clone(),
        }
    }

    pub fn register(mut self, name: &str, schema: impl Into<Schema>) -> Self {
        self.registry.register(name, schema);
        self
    }

    pub fn build(self) -> SchemaRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered_in_order() {
        let registry = SchemaRegistry::builtin();
        let all: Vec<&str> = registry.names().collect();
        assert_eq!(
            all,
            vec![
                "user",
                "userList",
                "userResponse",
                "userListResponse",
                "createUser",
                "projectConfig"
            ]
        );
    }

    #[test]
    fn registered_schemas_carry_their_name() {
        let registry = SchemaRegistryBuilder::new()
            .register("flag", Schema::boolean())
            .build();
        let schema = registry.get("flag").unwrap();
        assert_eq!(schema.name(), Some("flag"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn builder_extends_builtins() {
        let registry = SchemaRegistryBuilder::with_builtins()
            .register("tag", Schema::string().min_length(1))
            .build();
        assert!(registry.contains(names::USER));
        assert!(registry.contains("tag"));
        assert_eq!(registry.len(), 7);
    }
}
