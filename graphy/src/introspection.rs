//! Schema introspection: the `__schema`, `__type` and `__typename` meta
//! fields. Their shape is hand-built here (there is no corresponding Rust
//! struct to reflect); resolution is special-cased directly in the executor
//! rather than going through the ordinary [`crate::reflect::Reflect`]
//! machinery, since these types describe the schema itself rather than any
//! value flowing through it.

use crate::ast::{InputValue, Type};
use crate::resolve::ArgumentValues;
use crate::schema::meta::{Argument, EnumMeta, EnumValue, Field, MetaType, ObjectMeta, TypeKind};
use crate::schema::model::{DirectiveLocation, DirectiveType, QUERY_TYPE_NAME, SchemaType};
use crate::schema::registry::TypeRegistry;
use crate::value::Value;

fn named(name: &str) -> Type {
    Type::NonNullNamed(name.to_owned())
}

fn nullable_named(name: &str) -> Type {
    Type::Named(name.to_owned())
}

fn list_of(name: &str) -> Type {
    Type::NonNullList(Box::new(named(name)))
}

fn field(name: &str, field_type: Type) -> Field {
    Field { name: name.to_owned(), description: None, arguments: Vec::new(), field_type, deprecation_reason: None }
}

fn noop_parse() -> crate::schema::meta::InputParseFn {
    std::sync::Arc::new(|_| false)
}

pub fn install(registry: &mut TypeRegistry) {
    registry.intern_named(
        "__TypeKind",
        EnumMeta::new(
            "__TypeKind",
            ["SCALAR", "OBJECT", "INTERFACE", "UNION", "ENUM", "INPUT_OBJECT", "LIST", "NON_NULL"]
                .iter()
                .map(|n| EnumValue::new(n))
                .collect(),
            noop_parse(),
        )
        .into_meta(),
    );

    registry.intern_named(
        "__DirectiveLocation",
        EnumMeta::new(
            "__DirectiveLocation",
            ["QUERY", "MUTATION", "SUBSCRIPTION", "FIELD", "FRAGMENT_DEFINITION", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"]
                .iter()
                .map(|n| EnumValue::new(n))
                .collect(),
            noop_parse(),
        )
        .into_meta(),
    );

    registry.intern_named(
        "__InputValue",
        ObjectMeta::new(
            "__InputValue",
            vec![
                field("name", named("String")),
                field("description", nullable_named("String")),
                field("type", named("__Type")),
                field("defaultValue", nullable_named("String")),
            ],
        )
        .into_meta(),
    );

    registry.intern_named(
        "__EnumValue",
        ObjectMeta::new(
            "__EnumValue",
            vec![
                field("name", named("String")),
                field("description", nullable_named("String")),
                field("isDeprecated", named("Boolean")),
                field("deprecationReason", nullable_named("String")),
            ],
        )
        .into_meta(),
    );

    registry.intern_named(
        "__Field",
        ObjectMeta::new(
            "__Field",
            vec![
                field("name", named("String")),
                field("description", nullable_named("String")),
                Field { arguments: vec![], ..field("args", list_of("__InputValue")) },
                field("type", named("__Type")),
                field("isDeprecated", named("Boolean")),
                field("deprecationReason", nullable_named("String")),
            ],
        )
        .into_meta(),
    );

    registry.intern_named(
        "__Type",
        ObjectMeta::new(
            "__Type",
            vec![
                field("kind", named("__TypeKind")),
                field("name", nullable_named("String")),
                field("description", nullable_named("String")),
                field("fields", Type::List(Box::new(named("__Field")))),
                field("interfaces", Type::List(Box::new(named("__Type")))),
                field("possibleTypes", Type::List(Box::new(named("__Type")))),
                field("enumValues", Type::List(Box::new(named("__EnumValue")))),
                field("inputFields", Type::List(Box::new(named("__InputValue")))),
                field("ofType", nullable_named("__Type")),
            ],
        )
        .into_meta(),
    );

    registry.intern_named(
        "__Directive",
        ObjectMeta::new(
            "__Directive",
            vec![
                field("name", named("String")),
                field("description", nullable_named("String")),
                field("locations", list_of("__DirectiveLocation")),
                field("args", list_of("__InputValue")),
            ],
        )
        .into_meta(),
    );

    registry.intern_named(
        "__Schema",
        ObjectMeta::new(
            "__Schema",
            vec![
                field("types", list_of("__Type")),
                field("queryType", named("__Type")),
                field("mutationType", nullable_named("__Type")),
                field("subscriptionType", nullable_named("__Type")),
                field("directives", list_of("__Directive")),
            ],
        )
        .into_meta(),
    );

    if let Some(MetaType::Object(ObjectMeta { fields, .. })) = registry.types.get_mut(QUERY_TYPE_NAME) {
        fields.push(field("__schema", named("__Schema")));
        fields.push(Field {
            arguments: vec![Argument::new("name", named("String"))],
            ..field("__type", nullable_named("__Type"))
        });
    }
}

/// Resolves `__schema`. The full standard field set is always returned
/// regardless of which of them the caller actually selected — see
/// `DESIGN.md` for why introspection skips the ordinary per-field dynamic
/// dispatch path that the rest of the executor uses.
pub fn resolve_schema(schema: &SchemaType) -> Value {
    let mut types: Vec<Value> = schema.concrete_type_list().into_iter().filter(|t| t.name().is_some()).map(|t| describe_named(t, schema)).collect();
    types.sort_by(|a, b| type_name_of(a).cmp(type_name_of(b)));

    Value::object()
        .field("types", Value::List(types))
        .field("queryType", describe_named(schema.concrete_query_type(), schema))
        .field("mutationType", schema.concrete_mutation_type().map(|t| describe_named(t, schema)).unwrap_or(Value::Null))
        .field("subscriptionType", schema.concrete_subscription_type().map(|t| describe_named(t, schema)).unwrap_or(Value::Null))
        .field("directives", Value::List(schema.directive_list().into_iter().map(|d| describe_directive(d, schema)).collect()))
        .build()
}

/// Resolves `__type(name: ...)`.
pub fn resolve_type(schema: &SchemaType, args: &ArgumentValues) -> Value {
    match args.get::<String>("name") {
        Ok(name) => schema.concrete_type_by_name(&name).map(|t| describe_named(t, schema)).unwrap_or(Value::Null),
        Err(_) => Value::Null,
    }
}

fn type_name_of(v: &Value) -> &str {
    match v {
        Value::Object(fields) => match fields.get("name") {
            Some(Value::String(s)) => s.as_str(),
            _ => "",
        },
        _ => "",
    }
}

fn kind_name(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Scalar => "SCALAR",
        TypeKind::Object => "OBJECT",
        TypeKind::Interface => "INTERFACE",
        TypeKind::Union => "UNION",
        TypeKind::Enum => "ENUM",
        TypeKind::InputObject => "INPUT_OBJECT",
        TypeKind::List => "LIST",
        TypeKind::NonNull => "NON_NULL",
    }
}

fn describe_named(meta: &MetaType, schema: &SchemaType) -> Value {
    let mut builder = Value::object()
        .field("kind", Value::String(kind_name(meta.type_kind()).to_owned()))
        .field("name", meta.name().map(Value::from).unwrap_or(Value::Null))
        .field("description", meta.description().map(Value::from).unwrap_or(Value::Null))
        .field("ofType", Value::Null);

    let fields_value = match meta {
        MetaType::Object(ObjectMeta { fields, .. }) => Some(Value::List(fields.iter().map(|f| describe_field(f, schema)).collect())),
        MetaType::Interface(crate::schema::meta::InterfaceMeta { fields, .. }) => {
            Some(Value::List(fields.iter().map(|f| describe_field(f, schema)).collect()))
        }
        _ => None,
    };
    builder = builder.field("fields", fields_value.unwrap_or(Value::Null));

    let interfaces_value = match meta {
        MetaType::Object(ObjectMeta { interface_names, .. }) => Some(Value::List(
            interface_names.iter().filter_map(|n| schema.concrete_type_by_name(n)).map(|t| describe_named(t, schema)).collect(),
        )),
        _ => None,
    };
    builder = builder.field("interfaces", interfaces_value.unwrap_or(Value::Null));

    let possible_types_value = if meta.is_abstract() {
        Some(Value::List(schema.possible_types(meta).into_iter().map(|t| describe_named(t, schema)).collect()))
    } else {
        None
    };
    builder = builder.field("possibleTypes", possible_types_value.unwrap_or(Value::Null));

    let enum_values = match meta {
        MetaType::Enum(EnumMeta { values, .. }) => Some(Value::List(
            values
                .iter()
                .map(|v| {
                    Value::object()
                        .field("name", Value::from(v.name.clone()))
                        .field("description", v.description.clone().map(Value::from).unwrap_or(Value::Null))
                        .field("isDeprecated", Value::from(v.deprecation_reason.is_some()))
                        .field("deprecationReason", v.deprecation_reason.clone().map(Value::from).unwrap_or(Value::Null))
                        .build()
                })
                .collect(),
        )),
        _ => None,
    };
    builder = builder.field("enumValues", enum_values.unwrap_or(Value::Null));

    let input_fields = match meta {
        MetaType::InputObject(crate::schema::meta::InputObjectMeta { input_fields, .. }) => {
            Some(Value::List(input_fields.iter().map(|a| describe_input_value(a, schema)).collect()))
        }
        _ => None,
    };
    builder = builder.field("inputFields", input_fields.unwrap_or(Value::Null));

    builder.build()
}

fn describe_ast_type(t: &Type, schema: &SchemaType) -> Value {
    match t {
        Type::NonNullNamed(_) | Type::NonNullList(_) => Value::object()
            .field("kind", Value::String("NON_NULL".to_owned()))
            .field("name", Value::Null)
            .field("description", Value::Null)
            .field("fields", Value::Null)
            .field("interfaces", Value::Null)
            .field("possibleTypes", Value::Null)
            .field("enumValues", Value::Null)
            .field("inputFields", Value::Null)
            .field("ofType", describe_ast_type(&nullable_of(t), schema))
            .build(),
        Type::Named(name) => schema.concrete_type_by_name(name).map(|m| describe_named(m, schema)).unwrap_or(Value::Null),
        Type::List(inner) => Value::object()
            .field("kind", Value::String("LIST".to_owned()))
            .field("name", Value::Null)
            .field("description", Value::Null)
            .field("fields", Value::Null)
            .field("interfaces", Value::Null)
            .field("possibleTypes", Value::Null)
            .field("enumValues", Value::Null)
            .field("inputFields", Value::Null)
            .field("ofType", describe_ast_type(inner, schema))
            .build(),
    }
}

fn nullable_of(t: &Type) -> Type {
    match t {
        Type::NonNullNamed(n) => Type::Named(n.clone()),
        Type::NonNullList(inner) => Type::List(inner.clone()),
        other => other.clone(),
    }
}

fn describe_field(f: &Field, schema: &SchemaType) -> Value {
    Value::object()
        .field("name", Value::from(f.name.clone()))
        .field("description", f.description.clone().map(Value::from).unwrap_or(Value::Null))
        .field("args", Value::List(f.arguments.iter().map(|a| describe_input_value(a, schema)).collect()))
        .field("type", describe_ast_type(&f.field_type, schema))
        .field("isDeprecated", Value::from(f.deprecation_reason.is_some()))
        .field("deprecationReason", f.deprecation_reason.clone().map(Value::from).unwrap_or(Value::Null))
        .build()
}

fn describe_input_value(arg: &Argument, schema: &SchemaType) -> Value {
    Value::object()
        .field("name", Value::from(arg.name.clone()))
        .field("description", arg.description.clone().map(Value::from).unwrap_or(Value::Null))
        .field("type", describe_ast_type(&arg.arg_type, schema))
        .field("defaultValue", arg.default_value.as_ref().map(|v| Value::from(render_input_value(v))).unwrap_or(Value::Null))
        .build()
}

fn describe_directive(d: &DirectiveType, schema: &SchemaType) -> Value {
    Value::object()
        .field("name", Value::from(d.name.clone()))
        .field("description", d.description.clone().map(Value::from).unwrap_or(Value::Null))
        .field("locations", Value::List(d.locations.iter().map(|l| Value::from(directive_location_name(l))).collect()))
        .field("args", Value::List(d.arguments.iter().map(|a| describe_input_value(a, schema)).collect()))
        .build()
}

fn directive_location_name(l: &DirectiveLocation) -> &'static str {
    match l {
        DirectiveLocation::Query => "QUERY",
        DirectiveLocation::Mutation => "MUTATION",
        DirectiveLocation::Subscription => "SUBSCRIPTION",
        DirectiveLocation::Field => "FIELD",
        DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
        DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
        DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
    }
}

/// A compact, non-round-trippable textual rendering of a literal, good
/// enough for introspection's `defaultValue` display field.
fn render_input_value(v: &InputValue) -> String {
    match v {
        InputValue::Null => "null".to_owned(),
        InputValue::Int(i) => i.to_string(),
        InputValue::Float(f) => f.to_string(),
        InputValue::String(s) => format!("{s:?}"),
        InputValue::Boolean(b) => b.to_string(),
        InputValue::Enum(e) => e.clone(),
        InputValue::Variable(name) => format!("${name}"),
        InputValue::List(items) => format!("[{}]", items.iter().map(|s| render_input_value(&s.item)).collect::<Vec<_>>().join(", ")),
        InputValue::Object(fields) => {
            format!("{{{}}}", fields.iter().map(|(k, v)| format!("{}: {}", k.item, render_input_value(&v.item))).collect::<Vec<_>>().join(", "))
        }
    }
}
