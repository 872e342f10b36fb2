//! Types used to describe an inferred GraphQL schema.

use std::fmt;
use std::sync::Arc;

use crate::ast::{InputValue, Type};

/// A predicate that decides whether an [`InputValue`] is assignable to a
/// scalar, enum or input-object type. Reflector-generated code supplies this
/// closure; the validator and binder call it without knowing the concrete
/// Rust type behind it.
pub type InputParseFn = Arc<dyn Fn(&InputValue) -> bool + Send + Sync>;

pub struct ScalarMeta {
    pub name: String,
    pub description: Option<String>,
    pub try_parse_fn: InputParseFn,
}

#[derive(Debug, Clone)]
pub struct ListMeta {
    pub of_type: Type,
}

#[derive(Debug, Clone)]
pub struct NullableMeta {
    pub of_type: Type,
}

#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub interface_names: Vec<String>,
}

pub struct EnumMeta {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValue>,
    pub try_parse_fn: InputParseFn,
}

#[derive(Debug, Clone)]
pub struct InterfaceMeta {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub possible_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UnionMeta {
    pub name: String,
    pub description: Option<String>,
    pub of_type_names: Vec<String>,
}

pub struct InputObjectMeta {
    pub name: String,
    pub description: Option<String>,
    pub input_fields: Vec<Argument>,
    pub try_parse_fn: InputParseFn,
}

/// Inserted while a type's descriptor is still being built, so recursive
/// references (an object field returning its own type) resolve instead of
/// recursing forever during registration.
#[derive(Debug, Clone)]
pub struct PlaceholderMeta {
    pub of_type: Type,
}

pub enum MetaType {
    Scalar(ScalarMeta),
    List(ListMeta),
    Nullable(NullableMeta),
    Object(ObjectMeta),
    Enum(EnumMeta),
    Interface(InterfaceMeta),
    Union(UnionMeta),
    InputObject(InputObjectMeta),
    Placeholder(PlaceholderMeta),
}

/// The kind discriminant exposed by `__TypeKind` in introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<Argument>,
    pub field_type: Type,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub name: String,
    pub description: Option<String>,
    pub arg_type: Type,
    pub default_value: Option<InputValue>,
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

impl MetaType {
    /// Lists, non-null wrappers and placeholders have no name of their own.
    pub fn name(&self) -> Option<&str> {
        match self {
            MetaType::Scalar(ScalarMeta { name, .. })
            | MetaType::Object(ObjectMeta { name, .. })
            | MetaType::Enum(EnumMeta { name, .. })
            | MetaType::Interface(InterfaceMeta { name, .. })
            | MetaType::Union(UnionMeta { name, .. })
            | MetaType::InputObject(InputObjectMeta { name, .. }) => Some(name),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            MetaType::Scalar(ScalarMeta { description, .. })
            | MetaType::Object(ObjectMeta { description, .. })
            | MetaType::Enum(EnumMeta { description, .. })
            | MetaType::Interface(InterfaceMeta { description, .. })
            | MetaType::Union(UnionMeta { description, .. })
            | MetaType::InputObject(InputObjectMeta { description, .. }) => description.as_deref(),
            _ => None,
        }
    }

    /// # Panics
    /// Panics on `Nullable` and `Placeholder`, neither of which is a concrete
    /// introspectable kind.
    pub fn type_kind(&self) -> TypeKind {
        match self {
            MetaType::Scalar(_) => TypeKind::Scalar,
            MetaType::List(_) => TypeKind::List,
            MetaType::Nullable(_) => panic!("placeholder/nullable meta has no TypeKind"),
            MetaType::Object(_) => TypeKind::Object,
            MetaType::Enum(_) => TypeKind::Enum,
            MetaType::Interface(_) => TypeKind::Interface,
            MetaType::Union(_) => TypeKind::Union,
            MetaType::InputObject(_) => TypeKind::InputObject,
            MetaType::Placeholder(_) => panic!("placeholder/nullable meta has no TypeKind"),
        }
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        match self {
            MetaType::Object(ObjectMeta { fields, .. })
            | MetaType::Interface(InterfaceMeta { fields, .. }) => {
                fields.iter().find(|f| f.name == name)
            }
            _ => None,
        }
    }

    pub fn input_field_by_name(&self, name: &str) -> Option<&Argument> {
        match self {
            MetaType::InputObject(InputObjectMeta { input_fields, .. }) => {
                input_fields.iter().find(|f| f.name == name)
            }
            _ => None,
        }
    }

    pub fn as_type(&self) -> Type {
        match self {
            MetaType::Scalar(ScalarMeta { name, .. })
            | MetaType::Object(ObjectMeta { name, .. })
            | MetaType::Enum(EnumMeta { name, .. })
            | MetaType::Interface(InterfaceMeta { name, .. })
            | MetaType::Union(UnionMeta { name, .. })
            | MetaType::InputObject(InputObjectMeta { name, .. }) => {
                Type::NonNullNamed(name.clone())
            }
            MetaType::List(ListMeta { of_type }) => Type::NonNullList(Box::new(of_type.clone())),
            MetaType::Nullable(NullableMeta { of_type }) => match of_type {
                Type::NonNullNamed(inner) => Type::Named(inner.clone()),
                Type::NonNullList(inner) => Type::List(inner.clone()),
                t => t.clone(),
            },
            MetaType::Placeholder(PlaceholderMeta { of_type }) => of_type.clone(),
        }
    }

    /// Only scalars, enums and input objects carry a parse predicate.
    pub fn input_value_parse_fn(&self) -> Option<&InputParseFn> {
        match self {
            MetaType::Scalar(ScalarMeta { try_parse_fn, .. })
            | MetaType::Enum(EnumMeta { try_parse_fn, .. })
            | MetaType::InputObject(InputObjectMeta { try_parse_fn, .. }) => Some(try_parse_fn),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, MetaType::Object(_) | MetaType::Interface(_) | MetaType::Union(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, MetaType::Enum(_) | MetaType::Scalar(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, MetaType::Interface(_) | MetaType::Union(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, MetaType::Scalar(_) | MetaType::Enum(_) | MetaType::InputObject(_))
    }
}

impl ScalarMeta {
    pub fn new(name: &str, try_parse_fn: InputParseFn) -> ScalarMeta {
        ScalarMeta { name: name.to_owned(), description: None, try_parse_fn }
    }

    pub fn description(mut self, description: &str) -> ScalarMeta {
        self.description = Some(description.to_owned());
        self
    }

    pub fn into_meta(self) -> MetaType {
        MetaType::Scalar(self)
    }
}

impl ListMeta {
    pub fn new(of_type: Type) -> ListMeta {
        ListMeta { of_type }
    }

    pub fn into_meta(self) -> MetaType {
        MetaType::List(self)
    }
}

impl NullableMeta {
    pub fn new(of_type: Type) -> NullableMeta {
        NullableMeta { of_type }
    }

    pub fn into_meta(self) -> MetaType {
        MetaType::Nullable(self)
    }
}

impl ObjectMeta {
    pub fn new(name: &str, fields: Vec<Field>) -> ObjectMeta {
        ObjectMeta { name: name.to_owned(), description: None, fields, interface_names: Vec::new() }
    }

    pub fn description(mut self, description: &str) -> ObjectMeta {
        self.description = Some(description.to_owned());
        self
    }

    pub fn interfaces(mut self, interfaces: &[Type]) -> ObjectMeta {
        self.interface_names = interfaces.iter().map(|t| t.innermost_name().to_owned()).collect();
        self
    }

    pub fn into_meta(self) -> MetaType {
        MetaType::Object(self)
    }
}

impl EnumMeta {
    pub fn new(name: &str, values: Vec<EnumValue>, try_parse_fn: InputParseFn) -> EnumMeta {
        EnumMeta { name: name.to_owned(), description: None, values, try_parse_fn }
    }

    pub fn description(mut self, description: &str) -> EnumMeta {
        self.description = Some(description.to_owned());
        self
    }

    pub fn into_meta(self) -> MetaType {
        MetaType::Enum(self)
    }
}

impl InterfaceMeta {
    pub fn new(name: &str, fields: Vec<Field>) -> InterfaceMeta {
        InterfaceMeta { name: name.to_owned(), description: None, fields, possible_types: Vec::new() }
    }

    pub fn description(mut self, description: &str) -> InterfaceMeta {
        self.description = Some(description.to_owned());
        self
    }

    pub fn into_meta(self) -> MetaType {
        MetaType::Interface(self)
    }
}

impl UnionMeta {
    pub fn new(name: &str, of_types: &[Type]) -> UnionMeta {
        UnionMeta {
            name: name.to_owned(),
            description: None,
            of_type_names: of_types.iter().map(|t| t.innermost_name().to_owned()).collect(),
        }
    }

    pub fn description(mut self, description: &str) -> UnionMeta {
        self.description = Some(description.to_owned());
        self
    }

    pub fn into_meta(self) -> MetaType {
        MetaType::Union(self)
    }
}

impl InputObjectMeta {
    pub fn new(name: &str, input_fields: Vec<Argument>, try_parse_fn: InputParseFn) -> InputObjectMeta {
        InputObjectMeta { name: name.to_owned(), description: None, input_fields, try_parse_fn }
    }

    pub fn description(mut self, description: &str) -> InputObjectMeta {
        self.description = Some(description.to_owned());
        self
    }

    pub fn into_meta(self) -> MetaType {
        MetaType::InputObject(self)
    }
}

impl Field {
    pub fn description(mut self, description: &str) -> Field {
        self.description = Some(description.to_owned());
        self
    }

    pub fn argument(mut self, argument: Argument) -> Field {
        self.arguments.push(argument);
        self
    }

    pub fn deprecated(mut self, reason: &str) -> Field {
        self.deprecation_reason = Some(reason.to_owned());
        self
    }
}

impl Argument {
    pub fn new(name: &str, arg_type: Type) -> Argument {
        Argument { name: name.to_owned(), description: None, arg_type, default_value: None }
    }

    pub fn description(mut self, description: &str) -> Argument {
        self.description = Some(description.to_owned());
        self
    }

    pub fn default_value(mut self, default_value: InputValue) -> Argument {
        self.default_value = Some(default_value);
        self
    }
}

impl EnumValue {
    pub fn new(name: &str) -> EnumValue {
        EnumValue { name: name.to_owned(), description: None, deprecation_reason: None }
    }

    pub fn description(mut self, description: &str) -> EnumValue {
        self.description = Some(description.to_owned());
        self
    }

    pub fn deprecated(mut self, reason: &str) -> EnumValue {
        self.deprecation_reason = Some(reason.to_owned());
        self
    }
}

impl fmt::Debug for ScalarMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarMeta").field("name", &self.name).field("description", &self.description).finish()
    }
}

impl fmt::Debug for EnumMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("values", &self.values)
            .finish()
    }
}

impl fmt::Debug for InputObjectMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputObjectMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_fields", &self.input_fields)
            .finish()
    }
}
