//! # JSON-RPC Class Macros
//!
//! Procedural macros that turn an ordinary `impl` block into a class the
//! `turul-jsonrpc2` server can dispatch `"Class.Method"` calls to.
//!
//! ## Code Organization
//!
//! - **Attribute Macro**: `#[rpc_class]` in the rpc_class module
//! - **Utilities**: naming, attribute parsing and return classification in utils

use proc_macro::TokenStream;
use syn::{ItemImpl, Meta, Token, parse_macro_input, punctuated::Punctuated};

mod rpc_class;
mod utils;

#[cfg(test)]
mod tests;

/// Attribute macro exposing the public methods of an `impl` block over JSON-RPC
///
/// Every `pub fn` taking `&self` or `&mut self` becomes callable as
/// `"Class.Method"`. The class name defaults to the type name and the method
/// name to the PascalCase form of the Rust name (`return_string` becomes
/// `ReturnString`). Parameters are bound positionally and must implement
/// `serde::de::DeserializeOwned`; a parameter that fails to deserialize is
/// reported as `Invalid params` without calling the method.
///
/// Return values are handled by shape:
/// - no return type or `()`: the response carries no `result`
/// - `Result<T, E>`: `Ok` is serialized as the result, `Err` becomes
///   `Internal error` whose message is `E`'s `Display` text
/// - anything else: serialized as the result
///
/// # Attributes
///
/// - `#[rpc_class(name = "...")]` - override the class name
/// - `#[rpc(name = "...")]` on a method - override the exposed method name
/// - `#[rpc(skip)]` on a method - keep a public method off the wire
///
/// The type must also implement `Default`; the server creates a fresh
/// instance for every call.
///
/// # Example
///
/// ```rust,ignore
/// use turul_jsonrpc2::rpc_class;
///
/// #[derive(Default)]
/// pub struct Calculator;
///
/// #[rpc_class]
/// impl Calculator {
///     pub fn add(&self, a: f64, b: f64) -> f64 {
///         a + b
///     }
///
///     pub fn divide(&self, a: f64, b: f64) -> Result<f64, String> {
///         if b == 0.0 {
///             return Err("division by zero".to_string());
///         }
///         Ok(a / b)
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn rpc_class(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args with Punctuated::<Meta, Token![,]>::parse_terminated);
    let input = parse_macro_input!(input as ItemImpl);

    rpc_class::rpc_class_impl(args, input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
