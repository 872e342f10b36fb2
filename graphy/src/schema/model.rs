//! The immutable schema snapshot produced from a [`TypeRegistry`] plus the
//! root field descriptors accumulated by [`crate::engine::Engine`]
//! registrations.

use std::collections::HashMap;
use std::fmt;

use crate::ast::Type;
use crate::schema::meta::{Argument, Field, InterfaceMeta, MetaType, ObjectMeta, PlaceholderMeta, UnionMeta};
use crate::schema::registry::TypeRegistry;

pub const QUERY_TYPE_NAME: &str = "Query";
pub const MUTATION_TYPE_NAME: &str = "Mutation";
pub const SUBSCRIPTION_TYPE_NAME: &str = "Subscription";

/// A fully-resolved schema: every named type reachable from the three root
/// operation types, plus the directives known to the validator.
pub struct SchemaType {
    types: HashMap<String, MetaType>,
    has_mutation: bool,
    has_subscription: bool,
    directives: HashMap<String, DirectiveType>,
}

pub enum TypeType<'a> {
    Concrete(&'a MetaType),
    NonNull(Box<TypeType<'a>>),
    List(Box<TypeType<'a>>),
}

pub struct DirectiveType {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub arguments: Vec<Argument>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
}

impl SchemaType {
    /// Assemble the snapshot. `registry` holds every type reflected so far;
    /// `query_fields`/`mutation_fields`/`subscription_fields` are the root
    /// operations registered on the engine. When `enable_introspection` is
    /// set, `__schema` and `__type` are appended to the query root.
    pub fn build(
        mut registry: TypeRegistry,
        query_fields: Vec<Field>,
        mutation_fields: Vec<Field>,
        subscription_fields: Vec<Field>,
        enable_introspection: bool,
    ) -> SchemaType {
        let has_mutation = !mutation_fields.is_empty();
        let has_subscription = !subscription_fields.is_empty();

        // Built-in scalars are always defined, whether or not a registered
        // field happens to reference them, so a variable declaration can
        // name `Int`/`String`/etc. even when no field output does.
        registry.get_type::<i32>();
        registry.get_type::<f64>();
        registry.get_type::<bool>();
        registry.get_type::<String>();
        registry.get_type::<crate::reflect::Id>();

        registry.intern_named(QUERY_TYPE_NAME, ObjectMeta::new(QUERY_TYPE_NAME, query_fields).into_meta());
        if has_mutation {
            registry.intern_named(MUTATION_TYPE_NAME, ObjectMeta::new(MUTATION_TYPE_NAME, mutation_fields).into_meta());
        }
        if has_subscription {
            registry.intern_named(
                SUBSCRIPTION_TYPE_NAME,
                ObjectMeta::new(SUBSCRIPTION_TYPE_NAME, subscription_fields).into_meta(),
            );
        }

        let mut directives = HashMap::new();
        directives.insert("skip".to_owned(), DirectiveType::new_skip(&mut registry));
        directives.insert("include".to_owned(), DirectiveType::new_include(&mut registry));

        if enable_introspection {
            crate::introspection::install(&mut registry);
        }

        let types = registry.into_types();

        for meta_type in types.values() {
            if let MetaType::Placeholder(PlaceholderMeta { of_type }) = meta_type {
                panic!("type {of_type:?} is still a placeholder after schema construction");
            }
        }

        SchemaType { types, has_mutation, has_subscription, directives }
    }

    pub fn add_directive(&mut self, directive: DirectiveType) {
        self.directives.insert(directive.name.clone(), directive);
    }

    pub fn type_by_name(&self, name: &str) -> Option<TypeType<'_>> {
        self.types.get(name).map(TypeType::Concrete)
    }

    pub fn concrete_type_by_name(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn query_type(&self) -> TypeType<'_> {
        TypeType::Concrete(self.types.get(QUERY_TYPE_NAME).expect("query root always present"))
    }

    pub fn concrete_query_type(&self) -> &MetaType {
        self.types.get(QUERY_TYPE_NAME).expect("query root always present")
    }

    pub fn mutation_type(&self) -> Option<TypeType<'_>> {
        self.has_mutation.then(|| TypeType::Concrete(self.types.get(MUTATION_TYPE_NAME).unwrap()))
    }

    pub fn concrete_mutation_type(&self) -> Option<&MetaType> {
        self.has_mutation.then(|| self.types.get(MUTATION_TYPE_NAME).unwrap())
    }

    pub fn subscription_type(&self) -> Option<TypeType<'_>> {
        self.has_subscription.then(|| TypeType::Concrete(self.types.get(SUBSCRIPTION_TYPE_NAME).unwrap()))
    }

    pub fn concrete_subscription_type(&self) -> Option<&MetaType> {
        self.has_subscription.then(|| self.types.get(SUBSCRIPTION_TYPE_NAME).unwrap())
    }

    pub fn type_list(&self) -> Vec<TypeType<'_>> {
        self.types.values().map(TypeType::Concrete).collect()
    }

    pub fn concrete_type_list(&self) -> Vec<&MetaType> {
        self.types.values().collect()
    }

    pub fn make_type(&self, t: &Type) -> TypeType<'_> {
        match t {
            Type::NonNullNamed(n) => TypeType::NonNull(Box::new(self.type_by_name(n).expect("type not found in schema"))),
            Type::NonNullList(inner) => TypeType::NonNull(Box::new(TypeType::List(Box::new(self.make_type(inner))))),
            Type::Named(n) => self.type_by_name(n).expect("type not found in schema"),
            Type::List(inner) => TypeType::List(Box::new(self.make_type(inner))),
        }
    }

    pub fn directive_list(&self) -> Vec<&DirectiveType> {
        self.directives.values().collect()
    }

    pub fn directive_by_name(&self, name: &str) -> Option<&DirectiveType> {
        self.directives.get(name)
    }

    pub fn type_overlap(&self, t1: &MetaType, t2: &MetaType) -> bool {
        if std::ptr::eq(t1, t2) {
            return true;
        }

        match (t1.is_abstract(), t2.is_abstract()) {
            (true, true) => self.possible_types(t1).iter().any(|t| self.is_possible_type(t2, t)),
            (true, false) => self.is_possible_type(t1, t2),
            (false, true) => self.is_possible_type(t2, t1),
            (false, false) => false,
        }
    }

    pub fn possible_types(&self, t: &MetaType) -> Vec<&MetaType> {
        match t {
            MetaType::Union(UnionMeta { of_type_names, .. }) => {
                of_type_names.iter().flat_map(|n| self.concrete_type_by_name(n)).collect()
            }
            MetaType::Interface(InterfaceMeta { name, .. }) => self
                .concrete_type_list()
                .into_iter()
                .filter(|t| match t {
                    MetaType::Object(ObjectMeta { interface_names, .. }) => {
                        interface_names.iter().any(|iname| iname == name)
                    }
                    _ => false,
                })
                .collect(),
            _ => panic!("possible_types called on a non-abstract meta type"),
        }
    }

    pub fn is_possible_type(&self, abstract_type: &MetaType, possible_type: &MetaType) -> bool {
        self.possible_types(abstract_type).into_iter().any(|t| std::ptr::eq(t, possible_type))
    }

    pub fn is_subtype(&self, sub_type: &Type, super_type: &Type) -> bool {
        use Type::*;

        if super_type == sub_type {
            return true;
        }

        match (super_type, sub_type) {
            (NonNullNamed(super_name), NonNullNamed(sub_name))
            | (Named(super_name), Named(sub_name))
            | (Named(super_name), NonNullNamed(sub_name)) => self.is_named_subtype(sub_name, super_name),
            (NonNullList(super_inner), NonNullList(sub_inner))
            | (List(super_inner), List(sub_inner))
            | (List(super_inner), NonNullList(sub_inner)) => self.is_subtype(sub_inner, super_inner),
            _ => false,
        }
    }

    pub fn is_named_subtype(&self, sub_type_name: &str, super_type_name: &str) -> bool {
        if sub_type_name == super_type_name {
            return true;
        }
        match (self.concrete_type_by_name(sub_type_name), self.concrete_type_by_name(super_type_name)) {
            (Some(sub_type), Some(super_type)) => super_type.is_abstract() && self.is_possible_type(super_type, sub_type),
            _ => false,
        }
    }
}

impl<'a> TypeType<'a> {
    /// The composite type at this position, stripping any `NonNull`/`List`
    /// wrappers — a selection set applies to the named type underneath,
    /// regardless of how many layers of nullability or list-ness wrap it.
    pub fn to_concrete(&self) -> Option<&'a MetaType> {
        match self {
            TypeType::Concrete(t) => Some(t),
            TypeType::NonNull(inner) | TypeType::List(inner) => inner.to_concrete(),
        }
    }

    /// Is `null` a legal value for this position?
    pub fn is_nullable(&self) -> bool {
        !matches!(self, TypeType::NonNull(_))
    }
}

impl DirectiveType {
    pub fn new(name: &str, locations: &[DirectiveLocation], arguments: Vec<Argument>) -> DirectiveType {
        DirectiveType { name: name.to_owned(), description: None, locations: locations.to_vec(), arguments }
    }

    fn new_skip(registry: &mut TypeRegistry) -> DirectiveType {
        Self::new(
            "skip",
            &[DirectiveLocation::Field, DirectiveLocation::FragmentSpread, DirectiveLocation::InlineFragment],
            vec![registry.arg::<bool>("if")],
        )
    }

    fn new_include(registry: &mut TypeRegistry) -> DirectiveType {
        Self::new(
            "include",
            &[DirectiveLocation::Field, DirectiveLocation::FragmentSpread, DirectiveLocation::InlineFragment],
            vec![registry.arg::<bool>("if")],
        )
    }

    pub fn description(mut self, description: &str) -> DirectiveType {
        self.description = Some(description.to_owned());
        self
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DirectiveLocation::Query => "query",
            DirectiveLocation::Mutation => "mutation",
            DirectiveLocation::Subscription => "subscription",
            DirectiveLocation::Field => "field",
            DirectiveLocation::FragmentDefinition => "fragment definition",
            DirectiveLocation::FragmentSpread => "fragment spread",
            DirectiveLocation::InlineFragment => "inline fragment",
        })
    }
}

impl<'a> fmt::Display for TypeType<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeType::Concrete(t) => f.write_str(t.name().unwrap_or("?")),
            TypeType::List(i) => write!(f, "[{i}]"),
            TypeType::NonNull(i) => write!(f, "{i}!"),
        }
    }
}
