//! Utility functions for macro implementations

use syn::ext::IdentExt;
use syn::{Attribute, Ident, LitStr, Result, ReturnType, Type};

/// Per-method options from `#[rpc(...)]`
#[derive(Debug, Default)]
pub struct MethodMeta {
    pub name: Option<String>,
    pub skip: bool,
}

/// Read and strip every `#[rpc(...)]` attribute
pub fn take_method_meta(attrs: &mut Vec<Attribute>) -> Result<MethodMeta> {
    let mut meta_out = MethodMeta::default();

    for attr in attrs.iter() {
        if !attr.path().is_ident("rpc") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value = meta.value()?;
                let s: LitStr = value.parse()?;
                if s.value().is_empty() || s.value().contains('.') {
                    return Err(meta.error("method name must be non-empty and contain no '.'"));
                }
                meta_out.name = Some(s.value());
            } else if meta.path.is_ident("skip") {
                meta_out.skip = true;
            } else {
                return Err(meta.error("expected `name = \"...\"` or `skip`"));
            }
            Ok(())
        })?;
    }

    attrs.retain(|attr| !attr.path().is_ident("rpc"));
    Ok(meta_out)
}

/// Convert snake_case to PascalCase: `return_string` becomes `ReturnString`
pub fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    let mut result = first.to_uppercase().collect::<String>();
                    result.push_str(&chars.collect::<String>().to_lowercase());
                    result
                }
            }
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Name a method is exposed under when no `#[rpc(name = ...)]` is given
pub fn exposed_method_name(ident: &Ident) -> String {
    to_pascal_case(&ident.unraw().to_string())
}

/// Class name of an impl block's self type: the last path segment
pub fn class_name_of(self_ty: &Type) -> Option<String> {
    match self_ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.unraw().to_string()),
        Type::Group(group) => class_name_of(&group.elem),
        Type::Paren(paren) => class_name_of(&paren.elem),
        _ => None,
    }
}

/// How a method's return value is turned into a response result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// No return type, or `()`
    Unit,
    /// A type named `Result`: `Ok` is the result, `Err` an internal error
    Result,
    /// Any other serializable value
    Value,
}

pub fn classify_return(output: &ReturnType) -> ReturnKind {
    match output {
        ReturnType::Default => ReturnKind::Unit,
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Tuple(tuple) if tuple.elems.is_empty() => ReturnKind::Unit,
            Type::Path(type_path)
                if type_path
                    .path
                    .segments
                    .last()
                    .is_some_and(|segment| segment.ident == "Result") =>
            {
                ReturnKind::Result
            }
            _ => ReturnKind::Value,
        },
    }
}

/// Reject parameter types that cannot be deserialized into an owned value
pub fn check_param_type(ty: &Type) -> Result<()> {
    match ty {
        Type::Reference(_) => Err(syn::Error::new_spanned(
            ty,
            "rpc method parameters must be owned types; borrowed parameters cannot be deserialized",
        )),
        Type::ImplTrait(_) => Err(syn::Error::new_spanned(
            ty,
            "rpc method parameters cannot use `impl Trait`",
        )),
        Type::Group(group) => check_param_type(&group.elem),
        Type::Paren(paren) => check_param_type(&paren.elem),
        _ => Ok(()),
    }
}
