//! The Type Registry: the append-only map from a reflected Rust type to its
//! inferred GraphQL type node.

use std::collections::HashMap;

use crate::ast::Type;
use crate::reflect::Reflect;
use crate::schema::meta::{Argument, Field, MetaType, PlaceholderMeta};

/// Accumulates [`MetaType`] entries as the engine reflects over registered
/// procedures and the types they reference. Interning is idempotent: asking
/// for the same Rust type twice returns the same `Type` literal without
/// rebuilding its metadata.
pub struct TypeRegistry {
    pub(crate) types: HashMap<String, MetaType>,
}

impl TypeRegistry {
    pub fn new() -> TypeRegistry {
        TypeRegistry { types: HashMap::new() }
    }

    /// Intern `T`, inserting a placeholder first so that a type which
    /// references itself (directly or through a cycle) terminates instead of
    /// recursing forever while its own `build_meta` is still running.
    pub fn get_type<T: Reflect>(&mut self) -> Type {
        let name = T::type_name();

        if !self.types.contains_key(&name) {
            self.types.insert(name.clone(), MetaType::Placeholder(PlaceholderMeta { of_type: Type::Named(name.clone()) }));
            let meta = T::build_meta(self);
            self.types.insert(name.clone(), meta);
        }

        let named = Type::NonNullNamed(name);
        let wrapped = if T::is_list() { Type::NonNullList(Box::new(named)) } else { named };

        if T::is_optional() {
            match wrapped {
                Type::NonNullNamed(n) => Type::Named(n),
                Type::NonNullList(l) => Type::List(l),
                t => t,
            }
        } else {
            wrapped
        }
    }

    /// Intern a type under an explicit name and node, bypassing reflection.
    /// Used for schema-introspection types (`__Schema`, `__Type`, ...) that
    /// are hand-built rather than reflected from a user type.
    pub fn intern_named(&mut self, name: &str, node: MetaType) {
        self.types.insert(name.to_owned(), node);
    }

    /// Retroactively marks the object type named `type_name` as implementing
    /// `interface_name`. Used when an interface is inferred from a set of
    /// variants (see `GraphyAbstract`) after each variant's own object meta
    /// has already been built without knowing the interface existed.
    pub fn mark_implements(&mut self, type_name: &str, interface_name: &str) {
        if let Some(MetaType::Object(object)) = self.types.get_mut(type_name) {
            if !object.interface_names.iter().any(|n| n == interface_name) {
                object.interface_names.push(interface_name.to_owned());
            }
        }
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn field<T: Reflect>(&mut self, name: &str) -> Field {
        let field_type = self.get_type::<T>();
        Field {
            name: name.to_owned(),
            description: None,
            arguments: Vec::new(),
            field_type,
            deprecation_reason: None,
        }
    }

    pub fn arg<T: Reflect>(&mut self, name: &str) -> Argument {
        let arg_type = self.get_type::<T>();
        Argument::new(name, arg_type)
    }

    /// Consume the registry and hand back its raw contents. Called once, by
    /// [`crate::schema::model::SchemaType::build`].
    pub fn into_types(self) -> HashMap<String, MetaType> {
        self.types
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
