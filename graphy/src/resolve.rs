//! Runtime field resolution: the dynamic-dispatch half of the engine.
//!
//! [`Reflect`](crate::reflect::Reflect) describes *shape*; the types in this
//! module describe *behaviour*. A resolved field is always one of four
//! tagged variants ([`FieldValue`]) rather than a trait object hierarchy, so
//! the executor can recurse into it without knowing which concrete Rust type
//! produced it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::ast::InputValue;
use crate::error::GraphyError;
use crate::reflect::FromInput;
use crate::value::Value;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fully variable-substituted arguments for a single field invocation.
#[derive(Clone, Debug, Default)]
pub struct ArgumentValues(pub(crate) HashMap<String, InputValue>);

impl ArgumentValues {
    pub fn new(values: HashMap<String, InputValue>) -> ArgumentValues {
        ArgumentValues(values)
    }

    /// Coerce a named argument, falling back to `InputValue::Null` (which in
    /// turn coerces to `None` for `Option<T>` parameters) when absent.
    pub fn get<T: FromInput>(&self, name: &str) -> Result<T, GraphyError> {
        let value = self.0.get(name).cloned().unwrap_or(InputValue::Null);
        T::from_input(&value).ok_or_else(|| {
            GraphyError::Variable(format!("argument `{name}` could not be coerced to the expected type"))
        })
    }

    /// As [`Self::get`], but also runs the target type's
    /// [`crate::reflect::Validate`] hook, per the engine's input-validation
    /// rule (the Reflector marks a type as validated when it implements this
    /// trait; the check runs once, here, at argument-materialisation time).
    pub fn get_validated<T: FromInput + crate::reflect::Validate>(&self, name: &str) -> Result<T, GraphyError> {
        let value = self.get::<T>(name)?;
        value.validate().map_err(GraphyError::validation)?;
        Ok(value)
    }

    /// As [`Self::get_validated`], but for input types whose validator needs
    /// the ambient scope.
    pub fn get_validated_with_scope<S, T: FromInput + crate::reflect::ValidateWithScope<S>>(
        &self,
        name: &str,
        scope: &S,
    ) -> Result<T, GraphyError> {
        let value = self.get::<T>(name)?;
        value.validate_with_scope(scope).map_err(GraphyError::validation)?;
        Ok(value)
    }
}

/// The result of resolving one field: either a value ready to serialise, or
/// an object/list that still needs its own selection set applied.
pub enum FieldValue<S> {
    Null,
    Leaf(Value),
    Object(Box<dyn GraphyObject<S>>),
    List(Vec<FieldValue<S>>),
}

impl<S> FieldValue<S> {
    pub fn leaf(value: impl Into<Value>) -> FieldValue<S> {
        FieldValue::Leaf(value.into())
    }

    pub fn object(obj: impl GraphyObject<S> + 'static) -> FieldValue<S> {
        FieldValue::Object(Box::new(obj))
    }
}

/// Converts a resolver's return value into the tagged [`FieldValue`] the
/// executor operates on. Implemented for leaf scalars, `Option<T>`, `Vec<T>`,
/// and (via the object derive macro) every `#[derive(GraphyObject)]` type.
pub trait IntoFieldValue<S> {
    fn into_field_value(self) -> FieldValue<S>;
}

macro_rules! leaf_into_field_value {
    ($ty:ty) => {
        impl<S> IntoFieldValue<S> for $ty {
            fn into_field_value(self) -> FieldValue<S> {
                FieldValue::Leaf(self.into())
            }
        }
    };
}

leaf_into_field_value!(i32);
leaf_into_field_value!(i64);
leaf_into_field_value!(f64);
leaf_into_field_value!(bool);
leaf_into_field_value!(String);

impl<S> IntoFieldValue<S> for crate::reflect::Id {
    fn into_field_value(self) -> FieldValue<S> {
        FieldValue::Leaf(Value::String(self.0))
    }
}

impl<S> IntoFieldValue<S> for chrono::DateTime<chrono::Utc> {
    fn into_field_value(self) -> FieldValue<S> {
        FieldValue::Leaf(Value::String(self.to_rfc3339()))
    }
}

impl<S, T: IntoFieldValue<S>> IntoFieldValue<S> for Option<T> {
    fn into_field_value(self) -> FieldValue<S> {
        match self {
            Some(v) => v.into_field_value(),
            None => FieldValue::Null,
        }
    }
}

impl<S, T: IntoFieldValue<S>> IntoFieldValue<S> for Vec<T> {
    fn into_field_value(self) -> FieldValue<S> {
        FieldValue::List(self.into_iter().map(IntoFieldValue::into_field_value).collect())
    }
}

/// A value that knows how to resolve one of its own fields. Generated by
/// `#[derive(GraphyObject)]` / the `#[graphy_object]` attribute macro;
/// hand-written implementations are legal too (e.g. for interface/union
/// dispatch wrappers).
pub trait GraphyObject<S: ?Sized>: Send + Sync {
    /// The concrete GraphQL object name this value resolves as — used by the
    /// executor to pick a fragment's branch under an interface or union and
    /// to answer `__typename`.
    fn graphy_type_name(&self) -> &'static str;

    fn resolve_field<'a>(
        &'a self,
        field_name: &'a str,
        args: &'a ArgumentValues,
        scope: &'a Arc<S>,
    ) -> BoxFuture<'a, Result<FieldValue<S>, GraphyError>>;
}

/// Adapts an arbitrary async host procedure into the boxed, type-erased form
/// the engine stores per registered root operation. The ambient scope is
/// always the procedure's first parameter and is never exposed as a GraphQL
/// argument; remaining parameters become declared arguments in declaration
/// order.
pub type RootResolver<S> =
    Arc<dyn Fn(Arc<S>, ArgumentValues) -> BoxFuture<'static, Result<FieldValue<S>, GraphyError>> + Send + Sync>;

/// Implemented for async host procedures of arity 0 through 4 (beyond the
/// implicit scope parameter), mirroring how extractor-based web frameworks
/// (e.g. the handler traits in `axum`) turn ordinary functions into a single
/// boxed, object-safe form instead of requiring callers to box each one by
/// hand.
pub trait IntoRootResolver<S, Args> {
    fn into_root_resolver(self) -> RootResolver<S>;

    /// Reflects this procedure's signature into a [`Field`](crate::schema::meta::Field)
    /// descriptor: its declared arguments (named from `parameter_names`,
    /// falling back to synthetic `arg0`, `arg1`, … when the caller supplies
    /// fewer names than parameters) and its return type.
    fn reflect_field(name: &str, parameter_names: &[&str], registry: &mut crate::schema::registry::TypeRegistry) -> crate::schema::meta::Field;
}

macro_rules! impl_into_root_resolver {
    ($($arg:ident : $name:literal),*) => {
        impl<S, F, Fut, R, E, $($arg),*> IntoRootResolver<S, ($($arg,)*)> for F
        where
            S: Send + Sync + 'static,
            F: Fn(Arc<S>, $($arg),*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Result<R, E>> + Send + 'static,
            R: IntoFieldValue<S> + crate::reflect::Reflect + Send + 'static,
            E: Into<GraphyError>,
            $($arg: FromInput + crate::reflect::Reflect + Send + 'static),*
        {
            #[allow(unused_variables, non_snake_case)]
            fn into_root_resolver(self) -> RootResolver<S> {
                Arc::new(move |scope: Arc<S>, args: ArgumentValues| {
                    let procedure = self.clone();
                    $(let $arg = args.get::<$arg>($name);)*
                    let fut = async move {
                        $(let $arg = $arg?;)*
                        let result = procedure(scope, $($arg),*).await.map_err(Into::into)?;
                        Ok(result.into_field_value())
                    };
                    Box::pin(fut) as BoxFuture<'static, Result<FieldValue<S>, GraphyError>>
                })
            }

            #[allow(unused_variables, unused_mut)]
            fn reflect_field(name: &str, parameter_names: &[&str], registry: &mut crate::schema::registry::TypeRegistry) -> crate::schema::meta::Field {
                let mut field = registry.field::<R>(name);
                let mut index = 0usize;
                $(
                    let arg_name = parameter_names.get(index).copied().unwrap_or($name);
                    field = field.argument(registry.arg::<$arg>(arg_name));
                    index += 1;
                )*
                field
            }
        }
    };
}

impl_into_root_resolver!();
impl_into_root_resolver!(A1: "arg0");
impl_into_root_resolver!(A1: "arg0", A2: "arg1");
impl_into_root_resolver!(A1: "arg0", A2: "arg1", A3: "arg2");
impl_into_root_resolver!(A1: "arg0", A2: "arg1", A3: "arg2", A4: "arg3");

/// A subscription's source stream: one item per published event, already
/// converted to the tagged [`FieldValue`] form.
pub type SubscriptionStream<S> = Pin<Box<dyn futures::Stream<Item = Result<FieldValue<S>, GraphyError>> + Send>>;

/// Boxed, type-erased form of a registered subscription root procedure. The
/// procedure is invoked once, to obtain the producer; the driver then polls
/// the returned stream for the lifetime of the subscription.
pub type SubscriptionRootResolver<S> =
    Arc<dyn Fn(Arc<S>, ArgumentValues) -> BoxFuture<'static, Result<SubscriptionStream<S>, GraphyError>> + Send + Sync>;

/// The subscription analogue of [`IntoRootResolver`]: implemented for async
/// host procedures of arity 0 through 4 whose output is itself a
/// `futures::Stream`, i.e. the procedure sets up a producer rather than
/// returning a single value.
pub trait IntoSubscriptionResolver<S, Args> {
    fn into_subscription_resolver(self) -> SubscriptionRootResolver<S>;

    /// As [`IntoRootResolver::reflect_field`], reflecting the stream's item
    /// type as the field's return type rather than the stream itself.
    fn reflect_field(name: &str, parameter_names: &[&str], registry: &mut crate::schema::registry::TypeRegistry) -> crate::schema::meta::Field;
}

macro_rules! impl_into_subscription_resolver {
    ($($arg:ident : $name:literal),*) => {
        impl<S, F, Fut, Strm, R, E, $($arg),*> IntoSubscriptionResolver<S, ($($arg,)*)> for F
        where
            S: Send + Sync + 'static,
            F: Fn(Arc<S>, $($arg),*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Result<Strm, E>> + Send + 'static,
            Strm: futures::Stream<Item = Result<R, E>> + Send + 'static,
            R: IntoFieldValue<S> + crate::reflect::Reflect + Send + 'static,
            E: Into<GraphyError> + 'static,
            $($arg: FromInput + crate::reflect::Reflect + Send + 'static),*
        {
            #[allow(unused_variables, non_snake_case)]
            fn into_subscription_resolver(self) -> SubscriptionRootResolver<S> {
                Arc::new(move |scope: Arc<S>, args: ArgumentValues| {
                    let procedure = self.clone();
                    $(let $arg = args.get::<$arg>($name);)*
                    let fut = async move {
                        $(let $arg = $arg?;)*
                        let stream = procedure(scope, $($arg),*).await.map_err(Into::into)?;
                        let mapped =
                            futures::StreamExt::map(stream, |item| item.map(IntoFieldValue::into_field_value).map_err(Into::into));
                        Ok(Box::pin(mapped) as SubscriptionStream<S>)
                    };
                    Box::pin(fut) as BoxFuture<'static, Result<SubscriptionStream<S>, GraphyError>>
                })
            }

            #[allow(unused_variables, unused_mut)]
            fn reflect_field(name: &str, parameter_names: &[&str], registry: &mut crate::schema::registry::TypeRegistry) -> crate::schema::meta::Field {
                let mut field = registry.field::<R>(name);
                let mut index = 0usize;
                $(
                    let arg_name = parameter_names.get(index).copied().unwrap_or($name);
                    field = field.argument(registry.arg::<$arg>(arg_name));
                    index += 1;
                )*
                field
            }
        }
    };
}

impl_into_subscription_resolver!();
impl_into_subscription_resolver!(A1: "arg0");
impl_into_subscription_resolver!(A1: "arg0", A2: "arg1");
impl_into_subscription_resolver!(A1: "arg0", A2: "arg1", A3: "arg2");
impl_into_subscription_resolver!(A1: "arg0", A2: "arg1", A3: "arg2", A4: "arg3");
