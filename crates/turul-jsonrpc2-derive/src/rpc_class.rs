//! Implementation of the #[rpc_class] attribute macro

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    FnArg, ImplItem, ImplItemFn, ItemImpl, Lit, Meta, Result, Token, Type, Visibility,
    punctuated::Punctuated,
};

use crate::utils::{
    ReturnKind, check_param_type, class_name_of, classify_return, exposed_method_name,
    take_method_meta,
};

/// One exposed method of the class
struct RpcMethod {
    ident: syn::Ident,
    name: String,
    params: Vec<Type>,
    returns: ReturnKind,
}

pub fn rpc_class_impl(
    args: Punctuated<Meta, Token![,]>,
    mut input: ItemImpl,
) -> Result<TokenStream> {
    let mut class_name = None;

    for arg in args {
        match arg {
            Meta::NameValue(nv) if nv.path.is_ident("name") => {
                if let syn::Expr::Lit(expr_lit) = &nv.value
                    && let Lit::Str(s) = &expr_lit.lit
                {
                    if s.value().is_empty() || s.value().contains('.') {
                        return Err(syn::Error::new_spanned(
                            s,
                            "class name must be non-empty and contain no '.'",
                        ));
                    }
                    class_name = Some(s.value());
                } else {
                    return Err(syn::Error::new_spanned(
                        &nv.value,
                        "expected a string literal",
                    ));
                }
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "unknown argument; expected `name = \"...\"`",
                ));
            }
        }
    }

    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[rpc_class] must be applied to an inherent impl block",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[rpc_class] does not support generic impl blocks",
        ));
    }

    let class_name = match class_name {
        Some(name) => name,
        None => class_name_of(&input.self_ty).ok_or_else(|| {
            syn::Error::new_spanned(
                &input.self_ty,
                "cannot derive a class name from this type; use #[rpc_class(name = \"...\")]",
            )
        })?,
    };

    let mut methods = Vec::new();
    let mut seen = HashSet::new();
    for item in &mut input.items {
        if let ImplItem::Fn(method) = item
            && let Some(rpc_method) = collect_method(method)?
        {
            if !seen.insert(rpc_method.name.clone()) {
                return Err(syn::Error::new_spanned(
                    &method.sig.ident,
                    format!("duplicate rpc method name: {}", rpc_method.name),
                ));
            }
            methods.push(rpc_method);
        }
    }

    let self_ty = &input.self_ty;
    let arity_arms = methods.iter().map(|m| {
        let name = &m.name;
        let arity = m.params.len();
        quote! { #name => ::core::option::Option::Some(#arity), }
    });
    let invoke_arms = methods.iter().map(generate_invoke_arm);
    let names = methods.iter().map(|m| &m.name);

    let expanded = quote! {
        #input

        impl ::turul_jsonrpc2::__private::RpcObject for #self_ty {
            fn method_arity(&self, __method: &str) -> ::core::option::Option<usize> {
                match __method {
                    #(#arity_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_mut, unused_variables)]
            fn invoke(
                &mut self,
                __method: &str,
                __params: ::std::vec::Vec<::turul_jsonrpc2::__private::Value>,
            ) -> ::core::result::Result<
                ::core::option::Option<::turul_jsonrpc2::__private::Value>,
                ::turul_jsonrpc2::__private::InvokeError,
            > {
                let mut __params = __params.into_iter();
                match __method {
                    #(#invoke_arms)*
                    _ => ::core::result::Result::Err(
                        ::turul_jsonrpc2::__private::InvokeError::UnknownMethod(
                            ::std::string::ToString::to_string(__method),
                        ),
                    ),
                }
            }

            fn method_names(&self) -> &'static [&'static str] {
                &[#(#names),*]
            }
        }

        impl ::turul_jsonrpc2::__private::RpcClass for #self_ty {
            fn class_name() -> &'static str {
                #class_name
            }
        }
    };

    Ok(expanded)
}

/// Inspect one fn of the impl block; `None` when it is not exposed
fn collect_method(method: &mut ImplItemFn) -> Result<Option<RpcMethod>> {
    let meta = take_method_meta(&mut method.attrs)?;
    if meta.skip || !matches!(method.vis, Visibility::Public(_)) {
        return Ok(None);
    }

    // Associated functions are not methods
    let Some(receiver) = method.sig.receiver() else {
        return Ok(None);
    };
    if receiver.reference.is_none() || receiver.colon_token.is_some() {
        return Err(syn::Error::new_spanned(
            receiver,
            "rpc methods must take `&self` or `&mut self`",
        ));
    }
    if let Some(asyncness) = &method.sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "rpc methods are invoked synchronously and cannot be async",
        ));
    }
    if !method.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &method.sig.generics,
            "rpc methods cannot be generic",
        ));
    }

    let mut params = Vec::new();
    for input in method.sig.inputs.iter() {
        if let FnArg::Typed(pat_type) = input {
            check_param_type(&pat_type.ty)?;
            params.push(pat_type.ty.as_ref().clone());
        }
    }

    Ok(Some(RpcMethod {
        ident: method.sig.ident.clone(),
        name: meta
            .name
            .unwrap_or_else(|| exposed_method_name(&method.sig.ident)),
        params,
        returns: classify_return(&method.sig.output),
    }))
}

fn generate_invoke_arm(method: &RpcMethod) -> TokenStream {
    let name = &method.name;
    let ident = &method.ident;
    let types = &method.params;
    let args: Vec<_> = (0..types.len()).map(|i| format_ident!("__arg{}", i)).collect();
    let indices: Vec<usize> = (0..types.len()).collect();

    let call = quote! { self.#ident(#(#args),*) };
    let result = match method.returns {
        ReturnKind::Unit => quote! {
            #call;
            ::core::result::Result::Ok(::core::option::Option::None)
        },
        ReturnKind::Value => quote! {
            ::turul_jsonrpc2::__private::encode_result(#call)
        },
        ReturnKind::Result => quote! {
            match #call {
                ::core::result::Result::Ok(__value) => {
                    ::turul_jsonrpc2::__private::encode_result(__value)
                }
                ::core::result::Result::Err(__error) => ::core::result::Result::Err(
                    ::turul_jsonrpc2::__private::InvokeError::failed(__error),
                ),
            }
        },
    };

    quote! {
        #name => {
            #(
                let #args: #types = ::turul_jsonrpc2::__private::bind_param(
                    __method,
                    #indices,
                    __params.next().unwrap_or_default(),
                )?;
            )*
            #result
        }
    }
}
