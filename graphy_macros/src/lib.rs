//! Derive and attribute macros that generate [`graphy`]'s reflection and
//! resolution trait impls from ordinary struct/enum/impl definitions, so
//! embedders never hand-write a [`Reflect`](graphy::Reflect) impl.
//!
//! - `#[derive(GraphyObject)]` — flat output objects whose fields are plain
//!   data (`Clone`); each field becomes a resolver that clones itself.
//! - `#[derive(GraphyInputObject)]` — input objects coerced from a parsed
//!   document's argument/variable values.
//! - `#[derive(GraphyEnum)]` — C-like enums, both as output leaves and input
//!   enums.
//! - `#[graphy_object]` — applied to an `impl` block whose methods are async
//!   resolvers with arbitrary bodies (the `Object` side of the split, for
//!   fields that need to run logic rather than just expose data).

mod attr;

use attr::FieldMeta;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, FnArg, ImplItem, ItemImpl, Pat, ReturnType, Type};

/// Generates `Reflect` + `IntoFieldValue<S>` (for every `S`) + `GraphyObject<S>`
/// for a struct whose fields are cloned directly into their resolved value.
#[proc_macro_derive(GraphyObject, attributes(graphy))]
pub fn derive_graphy_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    graphy_object_impl(input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn graphy_object_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let type_name = ident.to_string();
    let fields = named_fields(&input, "GraphyObject")?;

    let mut descriptors = Vec::new();
    let mut resolve_arms = Vec::new();

    for field in fields {
        let meta = FieldMeta::resolve(&field.attrs)?;
        if meta.excluded {
            continue;
        }
        let field_ident = field.ident.as_ref().expect("named field");
        let gql_name = meta.name.unwrap_or_else(|| field_ident.to_string());
        let description = opt_str_token(&meta.description);
        let field_ty = &field.ty;

        descriptors.push(quote! {
            ::graphy::reflect::FieldDescriptor {
                name: #gql_name,
                description: #description,
                arguments: ::std::vec::Vec::new(),
                type_literal: registry.get_type::<#field_ty>(),
                deprecation_reason: ::std::option::Option::None,
            }
        });

        resolve_arms.push(quote! {
            #gql_name => {
                let value = self.#field_ident.clone();
                ::std::boxed::Box::pin(async move {
                    ::std::result::Result::Ok(::graphy::resolve::IntoFieldValue::<S>::into_field_value(value))
                }) as ::graphy::resolve::BoxFuture<'a, ::std::result::Result<::graphy::resolve::FieldValue<S>, ::graphy::GraphyError>>
            }
        });
    }

    Ok(quote! {
        impl ::graphy::reflect::Reflect for #ident {
            fn type_name() -> ::std::string::String {
                #type_name.to_owned()
            }

            fn build_meta(registry: &mut ::graphy::schema::registry::TypeRegistry) -> ::graphy::schema::meta::MetaType {
                let fields = ::std::vec![ #(#descriptors),* ];
                ::graphy::reflect::build_object_meta(#type_name, fields, &[])
            }
        }

        impl<S: ::std::marker::Send + ::std::marker::Sync + 'static> ::graphy::resolve::IntoFieldValue<S> for #ident {
            fn into_field_value(self) -> ::graphy::resolve::FieldValue<S> {
                ::graphy::resolve::FieldValue::object(self)
            }
        }

        impl<S: ::std::marker::Send + ::std::marker::Sync + 'static> ::graphy::resolve::GraphyObject<S> for #ident {
            fn graphy_type_name(&self) -> &'static str {
                #type_name
            }

            fn resolve_field<'a>(
                &'a self,
                field_name: &'a str,
                _args: &'a ::graphy::resolve::ArgumentValues,
                _scope: &'a ::std::sync::Arc<S>,
            ) -> ::graphy::resolve::BoxFuture<'a, ::std::result::Result<::graphy::resolve::FieldValue<S>, ::graphy::GraphyError>> {
                match field_name {
                    #(#resolve_arms,)*
                    other => {
                        let message = ::std::format!("type `{}` has no field `{}`", #type_name, other);
                        ::std::boxed::Box::pin(async move { ::std::result::Result::Err(::graphy::GraphyError::Resolver(message)) })
                    }
                }
            }
        }
    })
}

/// Generates `Reflect` + `FromInput` + `ToInput` for a struct consumed only
/// as an argument or variable value.
#[proc_macro_derive(GraphyInputObject, attributes(graphy))]
pub fn derive_graphy_input_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    graphy_input_object_impl(input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn graphy_input_object_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let type_name = ident.to_string();
    let fields = named_fields(&input, "GraphyInputObject")?;

    let mut descriptors = Vec::new();
    let mut from_input_fields = Vec::new();
    let mut to_input_fields = Vec::new();

    for field in fields {
        let meta = FieldMeta::resolve(&field.attrs)?;
        if meta.excluded {
            continue;
        }
        let field_ident = field.ident.as_ref().expect("named field");
        let gql_name = meta.name.unwrap_or_else(|| field_ident.to_string());
        let description = opt_str_token(&meta.description);
        let field_ty = &field.ty;

        descriptors.push(quote! {
            ::graphy::reflect::InputFieldDescriptor {
                name: #gql_name,
                description: #description,
                type_literal: registry.get_type::<#field_ty>(),
                default_value: ::std::option::Option::None,
            }
        });

        from_input_fields.push(quote! {
            #field_ident: {
                let raw = fields
                    .iter()
                    .find(|(key, _)| key.item == #gql_name)
                    .map(|(_, value)| value.item.clone())
                    .unwrap_or(::graphy::InputValue::Null);
                <#field_ty as ::graphy::FromInput>::from_input(&raw)?
            }
        });

        to_input_fields.push(quote! {
            (#gql_name.to_owned(), ::graphy::ToInput::to_input(&self.#field_ident))
        });
    }

    let try_parse_body = quote! {
        |value: &::graphy::InputValue| {
            match value {
                ::graphy::InputValue::Object(_) => <#ident as ::graphy::FromInput>::from_input(value).is_some(),
                _ => false,
            }
        }
    };

    Ok(quote! {
        impl ::graphy::reflect::Reflect for #ident {
            fn type_name() -> ::std::string::String {
                #type_name.to_owned()
            }

            fn build_meta(registry: &mut ::graphy::schema::registry::TypeRegistry) -> ::graphy::schema::meta::MetaType {
                let fields = ::std::vec![ #(#descriptors),* ];
                let try_parse_fn: ::std::sync::Arc<dyn ::std::ops::Fn(&::graphy::InputValue) -> bool + ::std::marker::Send + ::std::marker::Sync> =
                    ::std::sync::Arc::new(#try_parse_body);
                ::graphy::reflect::build_input_object_meta(#type_name, fields, try_parse_fn)
            }
        }

        impl ::graphy::FromInput for #ident {
            fn from_input(value: &::graphy::InputValue) -> ::std::option::Option<Self> {
                let fields = match value {
                    ::graphy::InputValue::Object(fields) => fields,
                    _ => return ::std::option::Option::None,
                };
                ::std::option::Option::Some(#ident {
                    #(#from_input_fields),*
                })
            }
        }

        impl ::graphy::ToInput for #ident {
            fn to_input(&self) -> ::graphy::InputValue {
                let entries: ::std::collections::HashMap<::std::string::String, ::graphy::InputValue> =
                    ::std::vec![ #(#to_input_fields),* ].into_iter().collect();
                ::graphy::InputValue::object(entries)
            }
        }
    })
}

/// Generates `Reflect` + `FromInput` + `ToInput` for a unit-variant enum.
#[proc_macro_derive(GraphyEnum, attributes(graphy))]
pub fn derive_graphy_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    graphy_enum_impl(input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn graphy_enum_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let type_name = ident.to_string();
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input, "GraphyEnum can only be derived for enums"));
    };

    let mut descriptors = Vec::new();
    let mut from_input_arms = Vec::new();
    let mut to_input_arms = Vec::new();

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(variant, "GraphyEnum variants must be unit variants"));
        }
        let meta = FieldMeta::resolve(&variant.attrs)?;
        let variant_ident = &variant.ident;
        let gql_name = meta.name.unwrap_or_else(|| variant_ident.to_string());
        let description = opt_str_token(&meta.description);

        descriptors.push(quote! {
            ::graphy::reflect::EnumVariantDescriptor {
                name: #gql_name,
                description: #description,
                deprecation_reason: ::std::option::Option::None,
            }
        });

        from_input_arms.push(quote! { #gql_name => ::std::option::Option::Some(#ident::#variant_ident) });
        to_input_arms.push(quote! { #ident::#variant_ident => #gql_name });
    }

    let try_parse_body = quote! {
        |value: &::graphy::InputValue| <#ident as ::graphy::FromInput>::from_input(value).is_some()
    };

    Ok(quote! {
        impl ::graphy::reflect::Reflect for #ident {
            fn type_name() -> ::std::string::String {
                #type_name.to_owned()
            }

            fn build_meta(_registry: &mut ::graphy::schema::registry::TypeRegistry) -> ::graphy::schema::meta::MetaType {
                let variants = ::std::vec![ #(#descriptors),* ];
                let try_parse_fn: ::std::sync::Arc<dyn ::std::ops::Fn(&::graphy::InputValue) -> bool + ::std::marker::Send + ::std::marker::Sync> =
                    ::std::sync::Arc::new(#try_parse_body);
                ::graphy::reflect::build_enum_meta(#type_name, &variants, try_parse_fn)
            }
        }

        impl ::graphy::FromInput for #ident {
            fn from_input(value: &::graphy::InputValue) -> ::std::option::Option<Self> {
                match value {
                    ::graphy::InputValue::Enum(name) | ::graphy::InputValue::String(name) => match name.as_str() {
                        #(#from_input_arms,)*
                        _ => ::std::option::Option::None,
                    },
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl ::graphy::ToInput for #ident {
            fn to_input(&self) -> ::graphy::InputValue {
                let name = match self {
                    #(#to_input_arms),*
                };
                ::graphy::InputValue::Enum(name.to_owned())
            }
        }

        impl<S> ::graphy::resolve::IntoFieldValue<S> for #ident {
            fn into_field_value(self) -> ::graphy::resolve::FieldValue<S> {
                let name = match self {
                    #(#to_input_arms),*
                };
                ::graphy::resolve::FieldValue::leaf(name.to_owned())
            }
        }
    })
}

/// Generates `Reflect` + `IntoFieldValue<S>` for an enum whose variants each
/// wrap exactly one concrete object type — GraphQL's "abstract container".
/// Whether the container interns as an `Interface` or a `Union` is decided
/// the first time it's reflected, not by the user: if every variant's object
/// shares a common field set, it's an `Interface` (and each variant is
/// retroactively marked as implementing it); otherwise it's a `Union`.
#[proc_macro_derive(GraphyAbstract)]
pub fn derive_graphy_abstract(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    graphy_abstract_impl(input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn graphy_abstract_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let type_name = ident.to_string();
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input, "GraphyAbstract can only be derived for enums"));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(&input, "GraphyAbstract requires at least one variant"));
    }

    let mut variant_idents = Vec::new();
    let mut variant_tys = Vec::new();
    let mut seen_tys = Vec::new();
    for variant in &data.variants {
        let Fields::Unnamed(unnamed) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "GraphyAbstract variants must wrap a single unnamed field, e.g. `Dog(DogType)`",
            ));
        };
        if unnamed.unnamed.len() != 1 {
            return Err(syn::Error::new_spanned(variant, "GraphyAbstract variants must wrap exactly one type"));
        }
        let ty = unnamed.unnamed.first().expect("checked len == 1").ty.clone();
        let rendered = quote!(#ty).to_string();
        if seen_tys.contains(&rendered) {
            return Err(syn::Error::new_spanned(variant, "each variant must wrap a different type"));
        }
        seen_tys.push(rendered);
        variant_idents.push(variant.ident.clone());
        variant_tys.push(ty);
    }

    let dispatch_arms = variant_idents
        .iter()
        .map(|v| quote! { #ident::#v(inner) => ::graphy::resolve::FieldValue::object(inner) });

    Ok(quote! {
        impl ::graphy::reflect::Reflect for #ident {
            fn type_name() -> ::std::string::String {
                #type_name.to_owned()
            }

            fn build_meta(registry: &mut ::graphy::schema::registry::TypeRegistry) -> ::graphy::schema::meta::MetaType {
                let member_types = ::std::vec![ #(registry.get_type::<#variant_tys>()),* ];
                let member_names: ::std::vec::Vec<::std::string::String> =
                    member_types.iter().map(::graphy::Type::innermost_name).map(::std::borrow::ToOwned::to_owned).collect();

                let field_sets: ::std::vec::Vec<::std::vec::Vec<::graphy::schema::meta::Field>> = member_names
                    .iter()
                    .map(|name| match registry.lookup_by_name(name) {
                        ::std::option::Option::Some(::graphy::schema::meta::MetaType::Object(object)) => object.fields.clone(),
                        _ => ::std::vec::Vec::new(),
                    })
                    .collect();

                let common_fields = ::graphy::reflect::common_fields(&field_sets);

                if common_fields.is_empty() {
                    ::graphy::schema::meta::UnionMeta::new(#type_name, &member_types).into_meta()
                } else {
                    for name in &member_names {
                        registry.mark_implements(name, #type_name);
                    }
                    ::graphy::schema::meta::InterfaceMeta::new(#type_name, common_fields).into_meta()
                }
            }
        }

        impl<S: ::std::marker::Send + ::std::marker::Sync + 'static> ::graphy::resolve::IntoFieldValue<S> for #ident {
            fn into_field_value(self) -> ::graphy::resolve::FieldValue<S> {
                match self {
                    #(#dispatch_arms),*
                }
            }
        }
    })
}

/// Generates `Reflect` + `GraphyObject<S>` + `IntoFieldValue<S>` for a type
/// whose fields are resolved by async methods on an `impl` block rather than
/// cloned directly, for fields that run logic (fetch, compute, delegate) as
/// opposed to exposing a stored value.
#[proc_macro_attribute]
pub fn graphy_object(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item_impl = parse_macro_input!(item as ItemImpl);
    graphy_object_attr_impl(item_impl).unwrap_or_else(syn::Error::into_compile_error).into()
}

struct ResolverMethod {
    name: syn::Ident,
    gql_name: String,
    description: Option<String>,
    scope_ident: syn::Ident,
    arg_idents: Vec<syn::Ident>,
    arg_names: Vec<String>,
    arg_tys: Vec<Type>,
    ok_ty: Type,
}

fn graphy_object_attr_impl(item_impl: ItemImpl) -> syn::Result<TokenStream2> {
    if !item_impl.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&item_impl.generics, "#[graphy_object] does not support generic impls"));
    }
    let self_ty = &item_impl.self_ty;
    let type_name = match &**self_ty {
        Type::Path(p) => p.path.segments.last().expect("non-empty path").ident.to_string(),
        _ => return Err(syn::Error::new_spanned(self_ty, "#[graphy_object] requires a plain named Self type")),
    };

    let mut methods = Vec::new();
    for item in &item_impl.items {
        let ImplItem::Fn(method) = item else { continue };
        if method.sig.asyncness.is_none() {
            return Err(syn::Error::new_spanned(&method.sig, "#[graphy_object] methods must be `async fn`"));
        }
        let meta = FieldMeta::resolve(&method.attrs)?;
        if meta.excluded {
            continue;
        }
        let gql_name = meta.name.unwrap_or_else(|| method.sig.ident.to_string());

        let mut inputs = method.sig.inputs.iter();
        match inputs.next() {
            Some(FnArg::Receiver(_)) => {}
            _ => return Err(syn::Error::new_spanned(&method.sig, "resolver methods must take `&self`")),
        }

        let scope_arg = inputs.next().ok_or_else(|| {
            syn::Error::new_spanned(&method.sig, "resolver methods must take the ambient scope as their second parameter")
        })?;
        let scope_ident = format_ident!("__scope");
        let _ = scope_arg;

        let mut arg_idents = Vec::new();
        let mut arg_names = Vec::new();
        let mut arg_tys = Vec::new();
        for input in inputs {
            let FnArg::Typed(pat_ty) = input else {
                return Err(syn::Error::new_spanned(input, "unsupported argument pattern"));
            };
            let Pat::Ident(pat_ident) = &*pat_ty.pat else {
                return Err(syn::Error::new_spanned(&pat_ty.pat, "resolver arguments must be simple identifiers"));
            };
            arg_names.push(pat_ident.ident.to_string());
            arg_idents.push(pat_ident.ident.clone());
            arg_tys.push((*pat_ty.ty).clone());
        }

        let ok_ty = match &method.sig.output {
            ReturnType::Type(_, ty) => extract_ok_type(ty)?,
            ReturnType::Default => return Err(syn::Error::new_spanned(&method.sig, "resolver methods must return Result<T, E>")),
        };

        methods.push(ResolverMethod {
            name: method.sig.ident.clone(),
            gql_name,
            description: meta.description,
            scope_ident,
            arg_idents,
            arg_names,
            arg_tys,
            ok_ty,
        });
    }

    let mut descriptors = Vec::new();
    let mut resolve_arms = Vec::new();

    for m in &methods {
        let ResolverMethod { name, gql_name, description, scope_ident, arg_idents, arg_names, arg_tys, ok_ty } = m;
        let description_tok = opt_str_token(description);

        descriptors.push(quote! {
            ::graphy::reflect::FieldDescriptor {
                name: #gql_name,
                description: #description_tok,
                arguments: ::std::vec![ #(registry.arg::<#arg_tys>(#arg_names)),* ],
                type_literal: registry.get_type::<#ok_ty>(),
                deprecation_reason: ::std::option::Option::None,
            }
        });

        resolve_arms.push(quote! {
            #gql_name => {
                #(let #arg_idents = args.get::<#arg_tys>(#arg_names);)*
                ::std::boxed::Box::pin(async move {
                    #(let #arg_idents = #arg_idents?;)*
                    let result = self.#name(#scope_ident, #(#arg_idents),*).await.map_err(::std::convert::Into::into)?;
                    ::std::result::Result::Ok(::graphy::resolve::IntoFieldValue::<S>::into_field_value(result))
                }) as ::graphy::resolve::BoxFuture<'a, ::std::result::Result<::graphy::resolve::FieldValue<S>, ::graphy::GraphyError>>
            }
        });
    }

    Ok(quote! {
        #item_impl

        impl ::graphy::reflect::Reflect for #self_ty {
            fn type_name() -> ::std::string::String {
                #type_name.to_owned()
            }

            fn build_meta(registry: &mut ::graphy::schema::registry::TypeRegistry) -> ::graphy::schema::meta::MetaType {
                let fields = ::std::vec![ #(#descriptors),* ];
                ::graphy::reflect::build_object_meta(#type_name, fields, &[])
            }
        }

        impl<S: ::std::marker::Send + ::std::marker::Sync + 'static> ::graphy::resolve::IntoFieldValue<S> for #self_ty {
            fn into_field_value(self) -> ::graphy::resolve::FieldValue<S> {
                ::graphy::resolve::FieldValue::object(self)
            }
        }

        impl<S: ::std::marker::Send + ::std::marker::Sync + 'static> ::graphy::resolve::GraphyObject<S> for #self_ty {
            fn graphy_type_name(&self) -> &'static str {
                #type_name
            }

            fn resolve_field<'a>(
                &'a self,
                field_name: &'a str,
                args: &'a ::graphy::resolve::ArgumentValues,
                scope: &'a ::std::sync::Arc<S>,
            ) -> ::graphy::resolve::BoxFuture<'a, ::std::result::Result<::graphy::resolve::FieldValue<S>, ::graphy::GraphyError>> {
                let __scope = scope;
                match field_name {
                    #(#resolve_arms,)*
                    other => {
                        let message = ::std::format!("type `{}` has no field `{}`", #type_name, other);
                        ::std::boxed::Box::pin(async move { ::std::result::Result::Err(::graphy::GraphyError::Resolver(message)) })
                    }
                }
            }
        }
    })
}

fn extract_ok_type(ty: &Type) -> syn::Result<Type> {
    if let Type::Path(p) = ty {
        if let Some(segment) = p.path.segments.last() {
            if segment.ident == "Result" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(ok_ty)) = args.args.first() {
                        return Ok(ok_ty.clone());
                    }
                }
            }
        }
    }
    Err(syn::Error::new_spanned(ty, "resolver methods must return Result<T, E>"))
}

fn named_fields<'a>(input: &'a DeriveInput, macro_name: &str) -> syn::Result<impl Iterator<Item = &'a syn::Field>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, format!("{macro_name} can only be derived for structs")));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(&input.ident, format!("{macro_name} requires named fields")));
    };
    Ok(fields.named.iter())
}

fn opt_str_token(value: &Option<String>) -> TokenStream2 {
    match value {
        Some(s) => quote! { ::std::option::Option::Some(#s) },
        None => quote! { ::std::option::Option::None },
    }
}
