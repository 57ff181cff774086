//! Schema definition: object types, fields and the schema itself.

use serde_json::Value;
use uuid::Uuid;

use crate::schema::types::{ResolveParams, ResolveResult, Resolver, RootHook};

/// Identity of a schema instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(Uuid);

impl SchemaId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access a schema gives to instrumentation.
pub trait SchemaFields {
    /// Stable identity of this schema instance.
    fn id(&self) -> SchemaId;

    /// Visit every field of every type with mutable access to its resolver.
    fn for_each_field_mut(&mut self, visit: &mut dyn FnMut(&str, &str, &mut Option<Resolver>));

    /// Install the hook run once per operation before field resolution.
    fn set_root_hook(&mut self, hook: RootHook);

    /// Remove and return the installed root hook, if any.
    fn take_root_hook(&mut self) -> Option<RootHook>;
}

/// Output type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Leaf value returned as-is.
    Scalar,
    /// Named object type; sub-selections resolve against it.
    Object(String),
    List(Box<FieldType>),
}

impl FieldType {
    pub fn object(name: impl Into<String>) -> Self {
        FieldType::Object(name.into())
    }

    pub fn list(of: FieldType) -> Self {
        FieldType::List(Box::new(of))
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// Without a resolver the field reads `source[name]`.
    pub resolve: Option<Resolver>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            resolve: None,
        }
    }

    pub fn resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(ResolveParams) -> ResolveResult + Send + Sync + 'static,
    {
        self.resolve = Some(Resolver::new(f));
        self
    }
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub fields: Vec<Field>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// An executable schema.
pub struct Schema {
    id: SchemaId,
    query_type: String,
    types: Vec<ObjectType>,
    root_hook: Option<RootHook>,
}

impl Schema {
    pub fn new(query_type: impl Into<String>) -> Self {
        Self {
            id: SchemaId::new(),
            query_type: query_type.into(),
            types: Vec::new(),
            root_hook: None,
        }
    }

    pub fn with_type(mut self, object: ObjectType) -> Self {
        self.types.push(object);
        self
    }

    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    pub fn get_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn get_field(&self, type_name: &str, field_name: &str) -> Option<&Field> {
        self.get_type(type_name).and_then(|t| t.get_field(field_name))
    }

    pub fn root_hook(&self) -> Option<&RootHook> {
        self.root_hook.as_ref()
    }

    pub fn types(&self) -> &[ObjectType] {
        &self.types
    }

    /// The root value as seen by fields after the root hook, if any, ran.
    pub(crate) fn run_root_hook(
        &self,
        root: Value,
        context: &crate::schema::types::ResolveContext,
        info: &crate::schema::types::ResolveInfo,
    ) -> Value {
        match &self.root_hook {
            Some(hook) => hook(root, &serde_json::Map::new(), context, info),
            None => root,
        }
    }
}

/// A clone is a distinct schema instance with its own identity.
impl Clone for Schema {
    fn clone(&self) -> Self {
        Self {
            id: SchemaId::new(),
            query_type: self.query_type.clone(),
            types: self.types.clone(),
            root_hook: self.root_hook.clone(),
        }
    }
}

impl SchemaFields for Schema {
    fn id(&self) -> SchemaId {
        self.id
    }

    fn for_each_field_mut(&mut self, visit: &mut dyn FnMut(&str, &str, &mut Option<Resolver>)) {
        for object in &mut self.types {
            for field in &mut object.fields {
                visit(&object.name, &field.name, &mut field.resolve);
            }
        }
    }

    fn set_root_hook(&mut self, hook: RootHook) {
        self.root_hook = Some(hook);
    }

    fn take_root_hook(&mut self) -> Option<RootHook> {
        self.root_hook.take()
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("id", &self.id)
            .field("query_type", &self.query_type)
            .field("types", &self.types.len())
            .field("root_hook", &self.root_hook.is_some())
            .finish()
    }
}
