//! The GraphQL query-language abstract syntax tree.
//!
//! Every node that can appear in an error path or diagnostic carries its
//! [`Spanning`] source location; nodes synthesised at runtime (e.g. default
//! argument values) use [`Spanning::unlocated`].

use std::collections::HashMap;

use crate::position::Spanning;

/// A type literal as written in a document. Carries no semantic information
/// and may name a type that does not exist in the schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Named(String),
    List(Box<Type>),
    NonNullNamed(String),
    NonNullList(Box<Type>),
}

impl Type {
    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Named(n) | Type::NonNullNamed(n) => Some(n),
            _ => None,
        }
    }

    pub fn innermost_name(&self) -> &str {
        match self {
            Type::Named(n) | Type::NonNullNamed(n) => n,
            Type::List(l) | Type::NonNullList(l) => l.innermost_name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Type::NonNullNamed(_) | Type::NonNullList(_))
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Named(n) => write!(f, "{n}"),
            Type::NonNullNamed(n) => write!(f, "{n}!"),
            Type::List(t) => write!(f, "[{t}]"),
            Type::NonNullList(t) => write!(f, "[{t}]!"),
        }
    }
}

/// A literal or variable-carrying value from the query document. Lists and
/// objects are spanned so coercion errors can report a precise location.
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    Variable(String),
    List(Vec<Spanning<InputValue>>),
    Object(Vec<(Spanning<String>, Spanning<InputValue>)>),
}

impl InputValue {
    pub fn null() -> InputValue {
        InputValue::Null
    }

    pub fn int(i: i64) -> InputValue {
        InputValue::Int(i)
    }

    pub fn float(f: f64) -> InputValue {
        InputValue::Float(f)
    }

    pub fn boolean(b: bool) -> InputValue {
        InputValue::Boolean(b)
    }

    pub fn string(s: impl Into<String>) -> InputValue {
        InputValue::String(s.into())
    }

    pub fn enum_value(s: impl Into<String>) -> InputValue {
        InputValue::Enum(s.into())
    }

    pub fn variable(s: impl Into<String>) -> InputValue {
        InputValue::Variable(s.into())
    }

    pub fn list(items: Vec<InputValue>) -> InputValue {
        InputValue::List(items.into_iter().map(Spanning::unlocated).collect())
    }

    pub fn object(fields: HashMap<String, InputValue>) -> InputValue {
        InputValue::Object(
            fields
                .into_iter()
                .map(|(k, v)| (Spanning::unlocated(k), Spanning::unlocated(v)))
                .collect(),
        )
    }

    /// Convert a `serde_json::Value` into an `InputValue`. No enum or
    /// variable variants are ever produced by this conversion; the result is
    /// always unlocated.
    pub fn from_json(value: serde_json::Value) -> InputValue {
        match value {
            serde_json::Value::Null => InputValue::Null,
            serde_json::Value::Bool(b) => InputValue::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    InputValue::Int(i)
                } else {
                    InputValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => InputValue::String(s),
            serde_json::Value::Array(a) => {
                InputValue::list(a.into_iter().map(InputValue::from_json).collect())
            }
            serde_json::Value::Object(o) => InputValue::object(
                o.into_iter()
                    .map(|(k, v)| (k, InputValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Resolve every `Variable` leaf against a concrete variable set.
    pub fn into_const(self, vars: &HashMap<String, InputValue>) -> InputValue {
        match self {
            InputValue::Variable(v) => vars.get(&v).cloned().unwrap_or(InputValue::Null),
            InputValue::List(l) => {
                InputValue::List(l.into_iter().map(|s| s.map(|v| v.into_const(vars))).collect())
            }
            InputValue::Object(o) => InputValue::Object(
                o.into_iter()
                    .map(|(k, v)| (k, v.map(|v| v.into_const(vars))))
                    .collect(),
            ),
            v => v,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, InputValue::Null)
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, InputValue::Variable(_))
    }

    pub fn as_string_value(&self) -> Option<&str> {
        match self {
            InputValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Recursively collect every variable name referenced by this value.
    pub fn referenced_variables(&self) -> Vec<&str> {
        match self {
            InputValue::Variable(name) => vec![name.as_str()],
            InputValue::List(l) => l.iter().flat_map(|v| v.item.referenced_variables()).collect(),
            InputValue::Object(o) => {
                o.iter().flat_map(|(_, v)| v.item.referenced_variables()).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDefinition {
    pub var_type: Spanning<Type>,
    pub default_value: Option<Spanning<InputValue>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    pub items: Vec<(Spanning<String>, Spanning<InputValue>)>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Spanning<InputValue>> {
        self.items.iter().find(|(k, _)| k.item == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Spanning<String>, Spanning<InputValue>)> {
        self.items.iter()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableDefinitions {
    pub items: Vec<(Spanning<String>, VariableDefinition)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub alias: Option<Spanning<String>>,
    pub name: Spanning<String>,
    pub arguments: Option<Spanning<Arguments>>,
    pub directives: Option<Vec<Spanning<Directive>>>,
    pub selection_set: Option<Vec<Selection>>,
}

impl Field {
    /// The name this field's result is published under: the alias if
    /// present, otherwise the field name itself.
    pub fn response_key(&self) -> &str {
        self.alias.as_ref().unwrap_or(&self.name).item.as_str()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSpread {
    pub name: Spanning<String>,
    pub directives: Option<Vec<Spanning<Directive>>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<Spanning<String>>,
    pub directives: Option<Vec<Spanning<Directive>>>,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Field(Spanning<Field>),
    FragmentSpread(Spanning<FragmentSpread>),
    InlineFragment(Spanning<InlineFragment>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Directive {
    pub name: Spanning<String>,
    pub arguments: Option<Spanning<Arguments>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub operation_type: OperationType,
    pub name: Option<Spanning<String>>,
    pub variable_definitions: Option<Spanning<VariableDefinitions>>,
    pub directives: Option<Vec<Spanning<Directive>>>,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub name: Spanning<String>,
    pub type_condition: Spanning<String>,
    pub directives: Option<Vec<Spanning<Directive>>>,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Definition {
    Operation(Spanning<Operation>),
    Fragment(Spanning<Fragment>),
}

pub type Document = Vec<Definition>;
