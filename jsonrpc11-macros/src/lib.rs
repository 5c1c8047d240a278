//! Procedural macros for the jsonrpc11 dispatcher
//!
//! # `#[method]`
//!
//! Turns an async function into a factory for a
//! `jsonrpc11_server::NamedHandler`: a handler that knows the name it is
//! served under. The function's parameter is deserialized from the request's
//! params and its `Ok` value serialized into the result.
//!
//! Without the macro:
//!
//! ```ignore
//! pub fn add() -> NamedHandler {
//!     NamedHandler::new("add", from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }))
//! }
//! ```
//!
//! With it:
//!
//! ```ignore
//! #[jsonrpc11::method]
//! async fn add((a, b): (i64, i64)) -> Result<i64> {
//!     Ok(a + b)
//! }
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use jsonrpc11_core::{ApiError, Result};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct GetParams {
//!     id: u64,
//! }
//!
//! // Served as "entry.get" rather than "get_entry"
//! #[method(name = "entry.get")]
//! async fn get_entry(params: GetParams) -> Result<String> {
//!     Err(ApiError::new(100, format!("Entry not found with id {}", params.id)).into())
//! }
//!
//! let dispatcher = Dispatcher::builder().named(get_entry()).build()?;
//! ```

mod method;

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn};

/// Attribute macro for defining JSON-RPC methods
///
/// # Arguments
///
/// - `name = "..."`: the externally visible method name; defaults to the
///   function name
///
/// # Parameters
///
/// The function takes zero or one parameter, of any type implementing
/// `serde::Deserialize`:
///
/// - a struct or map for named params
/// - a tuple or `Vec` for positional params
/// - nothing at all (or `()`) for methods without params
///
/// Parameters that fail to deserialize are reported as `Invalid params`.
///
/// # Return Type
///
/// `jsonrpc11_core::Result<T>` with `T: serde::Serialize`. Return
/// `Err(ApiError::new(code, message).into())` for an application error.
///
/// # Limitations
///
/// - Only async free functions
/// - No generics, no `self`
#[proc_macro_attribute]
pub fn method(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = method::MethodArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);

    let input_fn = parse_macro_input!(item as ItemFn);

    method::method_impl(args, input_fn)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
