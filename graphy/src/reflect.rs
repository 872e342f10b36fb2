//! Compile-time schema reflection.
//!
//! Rust has no runtime reflection, so [`graphy_macros`] generates an
//! implementation of [`Reflect`] (and, for inputs, [`FromInput`]) for every
//! `#[derive(GraphyObject)]`, `#[derive(GraphyInputObject)]` and
//! `#[derive(GraphyEnum)]` type at compile time. The registry interprets
//! those descriptors at startup to assemble the schema; nothing here walks
//! actual Rust type information at runtime.

use std::any::Any;
use std::sync::Arc;

use crate::ast::{InputValue, Type};
use crate::schema::meta::{Argument, EnumMeta, EnumValue, Field, InputObjectMeta, MetaType, ScalarMeta};
use crate::schema::registry::TypeRegistry;

/// Implemented by every type that can appear somewhere in the inferred
/// schema, in either input or output position.
pub trait Reflect: Any + Send + Sync {
    /// The GraphQL name this type is published under.
    fn type_name() -> String
    where
        Self: Sized;

    /// Build (or retrieve, if already interned) this type's registry entry.
    fn build_meta(registry: &mut TypeRegistry) -> MetaType
    where
        Self: Sized;

    /// Whether this Rust type represents GraphQL's nullable wrapper
    /// (`Option<T>`). The registry consults this to decide whether to wrap
    /// the inner type's `Type::NonNull*` literal or leave it nullable.
    fn is_optional() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Whether this Rust type represents GraphQL's list wrapper (`Vec<T>`).
    /// Consulted the same way as [`Self::is_optional`], so the registry can
    /// wrap the inner type's literal in `Type::List`/`Type::NonNullList`
    /// instead of reflecting the element type as if it were the whole field.
    fn is_list() -> bool
    where
        Self: Sized,
    {
        false
    }
}

/// Converts a parsed or bound [`InputValue`] into a concrete Rust value.
/// Implemented by the macros for input objects and enums, and manually here
/// for scalars and standard containers.
pub trait FromInput: Sized {
    fn from_input(value: &InputValue) -> Option<Self>;
}

/// The dual of [`FromInput`]: losslessly turns a Rust value back into an
/// [`InputValue`], used to materialise default argument values for
/// introspection.
pub trait ToInput {
    fn to_input(&self) -> InputValue;
}

/// Implemented by a materialised input type that can reject itself
/// independent of the ambient scope (e.g. "start must be before end").
/// Checked once coercion from [`InputValue`] succeeds, before the resolver
/// that declared the argument runs.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// The scope-aware counterpart of [`Validate`], for checks that need
/// context the value itself doesn't carry (e.g. "this id belongs to the
/// caller").
pub trait ValidateWithScope<S> {
    fn validate_with_scope(&self, scope: &S) -> Result<(), String>;
}

macro_rules! scalar_reflect {
    ($ty:ty, $name:expr, $from:expr) => {
        impl Reflect for $ty {
            fn type_name() -> String {
                $name.to_owned()
            }

            fn build_meta(_registry: &mut TypeRegistry) -> MetaType {
                let parse_fn: Arc<dyn Fn(&InputValue) -> bool + Send + Sync> =
                    Arc::new(|v: &InputValue| <$ty as FromInput>::from_input(v).is_some());
                ScalarMeta::new($name, parse_fn).into_meta()
            }
        }

        impl FromInput for $ty {
            fn from_input(value: &InputValue) -> Option<Self> {
                #[allow(clippy::redundant_closure_call)]
                ($from)(value)
            }
        }
    };
}

scalar_reflect!(i32, "Int", |v: &InputValue| match v {
    InputValue::Int(i) => i32::try_from(*i).ok(),
    _ => None,
});
scalar_reflect!(i64, "Int", |v: &InputValue| match v {
    InputValue::Int(i) => Some(*i),
    _ => None,
});
scalar_reflect!(f64, "Float", |v: &InputValue| match v {
    InputValue::Float(f) => Some(*f),
    InputValue::Int(i) => Some(*i as f64),
    _ => None,
});
scalar_reflect!(bool, "Boolean", |v: &InputValue| match v {
    InputValue::Boolean(b) => Some(*b),
    _ => None,
});
scalar_reflect!(String, "String", |v: &InputValue| match v {
    InputValue::String(s) => Some(s.clone()),
    _ => None,
});

/// The `ID` scalar: serialises like `String` but is a distinct GraphQL type,
/// conventionally used for opaque identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Id(pub String);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

scalar_reflect!(Id, "ID", |v: &InputValue| match v {
    InputValue::String(s) => Some(Id(s.clone())),
    InputValue::Int(i) => Some(Id(i.to_string())),
    _ => None,
});

impl Reflect for chrono::DateTime<chrono::Utc> {
    fn type_name() -> String {
        "DateTime".to_owned()
    }

    fn build_meta(_registry: &mut TypeRegistry) -> MetaType {
        let parse_fn: Arc<dyn Fn(&InputValue) -> bool + Send + Sync> =
            Arc::new(|v: &InputValue| <chrono::DateTime<chrono::Utc> as FromInput>::from_input(v).is_some());
        ScalarMeta::new("DateTime", parse_fn)
            .description("An RFC 3339 timestamp, serialised as a string.")
            .into_meta()
    }
}

impl FromInput for chrono::DateTime<chrono::Utc> {
    fn from_input(value: &InputValue) -> Option<Self> {
        match value {
            InputValue::String(s) => chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&chrono::Utc)),
            _ => None,
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_name() -> String {
        T::type_name()
    }

    fn build_meta(registry: &mut TypeRegistry) -> MetaType {
        T::build_meta(registry)
    }

    fn is_optional() -> bool {
        true
    }

    fn is_list() -> bool {
        T::is_list()
    }
}

impl<T: FromInput> FromInput for Option<T> {
    fn from_input(value: &InputValue) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_input(value).map(Some)
        }
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_name() -> String {
        T::type_name()
    }

    fn build_meta(registry: &mut TypeRegistry) -> MetaType {
        T::build_meta(registry)
    }

    fn is_list() -> bool {
        true
    }
}

impl<T: FromInput> FromInput for Vec<T> {
    fn from_input(value: &InputValue) -> Option<Self> {
        match value {
            InputValue::List(items) => items.iter().map(|s| T::from_input(&s.item)).collect(),
            _ => None,
        }
    }
}

/// Generated by `#[derive(GraphyEnum)]` to describe one member of a Rust
/// `enum` alongside its GraphQL name.
pub struct EnumVariantDescriptor {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub deprecation_reason: Option<&'static str>,
}

/// Helper used by generated enum code to build an [`EnumMeta`] from a list of
/// variant descriptors plus a parse closure.
pub fn build_enum_meta(
    name: &str,
    variants: &[EnumVariantDescriptor],
    try_parse_fn: Arc<dyn Fn(&InputValue) -> bool + Send + Sync>,
) -> MetaType {
    let values = variants
        .iter()
        .map(|v| {
            let mut ev = EnumValue::new(v.name);
            if let Some(d) = v.description {
                ev = ev.description(d);
            }
            if let Some(r) = v.deprecation_reason {
                ev = ev.deprecated(r);
            }
            ev
        })
        .collect();
    EnumMeta::new(name, values, try_parse_fn).into_meta()
}

/// One field of a generated input object, as handed to
/// [`build_input_object_meta`] by macro-generated code.
pub struct InputFieldDescriptor {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub type_literal: Type,
    pub default_value: Option<InputValue>,
}

pub fn build_input_object_meta(
    name: &str,
    fields: Vec<InputFieldDescriptor>,
    try_parse_fn: Arc<dyn Fn(&InputValue) -> bool + Send + Sync>,
) -> MetaType {
    let input_fields = fields
        .into_iter()
        .map(|f| {
            let mut arg = Argument::new(f.name, f.type_literal);
            if let Some(d) = f.description {
                arg = arg.description(d);
            }
            if let Some(dv) = f.default_value {
                arg = arg.default_value(dv);
            }
            arg
        })
        .collect();
    InputObjectMeta::new(name, input_fields, try_parse_fn).into_meta()
}

/// One field of a generated object type, as handed to
/// [`build_object_meta`] by macro-generated code. The resolver body itself
/// lives in the derive macro's generated `GraphyObject::resolve_field` match
/// arm, not in this descriptor.
pub struct FieldDescriptor {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub arguments: Vec<Argument>,
    pub type_literal: Type,
    pub deprecation_reason: Option<&'static str>,
}

/// The fields shared, by name, across every set in `field_sets` — used by the
/// `GraphyAbstract` derive to decide whether an enum of object variants
/// reflects as an `Interface` (a non-empty common field set) or a `Union`
/// (no fields in common beyond `__typename`). Field order and definition
/// (type, arguments, description) are taken from the first set that defines
/// the name; variants are trusted to agree on what a shared field means.
pub fn common_fields(field_sets: &[Vec<Field>]) -> Vec<Field> {
    let Some((first, rest)) = field_sets.split_first() else {
        return Vec::new();
    };
    first
        .iter()
        .filter(|field| rest.iter().all(|set| set.iter().any(|f| f.name == field.name)))
        .cloned()
        .collect()
}

pub fn build_object_meta(name: &str, fields: Vec<FieldDescriptor>, interfaces: &[Type]) -> MetaType {
    let fields = fields
        .into_iter()
        .map(|f| {
            let mut field = Field {
                name: f.name.to_owned(),
                description: f.description.map(str::to_owned),
                arguments: f.arguments,
                field_type: f.type_literal,
                deprecation_reason: f.deprecation_reason.map(str::to_owned),
            };
            if field.description.is_none() {
                field.description = None;
            }
            field
        })
        .collect();
    crate::schema::meta::ObjectMeta::new(name, fields).interfaces(interfaces).into_meta()
}
