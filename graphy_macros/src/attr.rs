//! Parses the `graphy`/`serde` field-metadata grammar: a comma-separated
//! attribute where the first bare token is a name override, `name=`/
//! `description=` are recognised keys, and a lone `-` excludes the field.

use syn::Attribute;

#[derive(Default)]
pub struct FieldMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub excluded: bool,
}

impl FieldMeta {
    /// Resolve the effective metadata for one struct field / enum variant:
    /// a `graphy` attribute wins outright once it names a field (or excludes
    /// it). An empty or absent `graphy` attribute falls through to
    /// `serde(rename = ...)` for the name, so `#[graphy("")] #[serde(rename =
    /// "j3")]` still resolves to `j3`.
    pub fn resolve(attrs: &[Attribute]) -> syn::Result<FieldMeta> {
        if let Some(mut graphy) = find_graphy_attr(attrs)? {
            let has_name = graphy.name.as_deref().is_some_and(|n| !n.is_empty());
            if graphy.excluded || has_name {
                return Ok(graphy);
            }
            graphy.name = find_serde_rename(attrs)?;
            return Ok(graphy);
        }
        if let Some(name) = find_serde_rename(attrs)? {
            return Ok(FieldMeta { name: Some(name), description: None, excluded: false });
        }
        Ok(FieldMeta::default())
    }
}

fn find_graphy_attr(attrs: &[Attribute]) -> syn::Result<Option<FieldMeta>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("graphy")) else {
        return Ok(None);
    };
    let tokens = attr.meta.require_list()?.tokens.to_string();
    Ok(Some(parse_tokens(&tokens)))
}

/// Only `rename = "..."` is recognised; other `serde` sub-attributes
/// (`skip_serializing_if`, `default`, ...) are this library's business, not
/// ours, and are ignored here.
fn find_serde_rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("serde")) else {
        return Ok(None);
    };
    let tokens = attr.meta.require_list()?.tokens.to_string();
    for part in split_top_level_commas(&tokens) {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("rename").and_then(|rest| rest.trim_start().strip_prefix('=')) {
            return Ok(Some(unquote(value.trim())));
        }
    }
    Ok(None)
}

fn parse_tokens(tokens: &str) -> FieldMeta {
    let mut meta = FieldMeta::default();
    for (index, raw) in split_top_level_commas(tokens).into_iter().enumerate() {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        if token == "\"-\"" || token == "-" {
            meta.excluded = true;
            continue;
        }
        if let Some(value) = token.strip_prefix("name").and_then(|rest| rest.trim_start().strip_prefix('=')) {
            meta.name = Some(unquote(value.trim()));
        } else if let Some(value) =
            token.strip_prefix("description").and_then(|rest| rest.trim_start().strip_prefix('='))
        {
            meta.description = Some(unquote(value.trim()));
        } else if index == 0 && !token.contains('=') {
            meta.name = Some(unquote(token));
        }
    }
    meta
}

fn unquote(s: &str) -> String {
    s.trim_matches('"').to_owned()
}

/// Splits on commas that aren't inside a `"..."` string literal.
fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    for c in s.chars() {
        match c {
            '"' => {
                in_string = !in_string;
                current.push(c);
            }
            ',' if !in_string => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}
