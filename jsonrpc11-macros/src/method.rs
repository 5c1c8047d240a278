//! Implementation of the `#[method]` attribute
//!
//! Input:
//! ```ignore
//! #[method(name = "entry.get")]
//! async fn get_entry(id: u64) -> Result<Entry> {
//!     lookup(id).await
//! }
//! ```
//!
//! Generated output:
//! ```ignore
//! fn get_entry() -> jsonrpc11_server::NamedHandler {
//!     async fn __jsonrpc11_method(id: u64) -> Result<Entry> {
//!         lookup(id).await
//!     }
//!
//!     jsonrpc11_server::NamedHandler::new(
//!         "entry.get",
//!         jsonrpc11_server::from_typed_fn(__jsonrpc11_method),
//!     )
//! }
//! ```

use proc_macro2::TokenStream;
use quote::quote;
use syn::{FnArg, ItemFn, LitStr, ReturnType};

/// Arguments accepted inside `#[method(...)]`
#[derive(Default)]
pub struct MethodArgs {
    name: Option<LitStr>,
}

impl MethodArgs {
    pub fn parse(&mut self, meta: syn::meta::ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            let name: LitStr = meta.value()?.parse()?;
            if name.value().is_empty() {
                return Err(syn::Error::new(name.span(), "method name must not be empty"));
            }
            self.name = Some(name);
            Ok(())
        } else {
            Err(meta.error("unsupported #[method] argument, expected `name = \"...\"`"))
        }
    }
}

pub fn method_impl(args: MethodArgs, input_fn: ItemFn) -> syn::Result<TokenStream> {
    let sig = &input_fn.sig;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[method] requires an async fn",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[method] functions cannot be generic",
        ));
    }
    if sig.inputs.len() > 1 {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "#[method] functions take at most one parameter; use a tuple for positional params",
        ));
    }

    let param = match sig.inputs.first() {
        Some(FnArg::Typed(pat_type)) => {
            let pat = &pat_type.pat;
            let ty = &pat_type.ty;
            quote! { #pat: #ty }
        }
        Some(FnArg::Receiver(receiver)) => {
            return Err(syn::Error::new_spanned(
                receiver,
                "#[method] cannot be applied to methods taking self",
            ));
        }
        // No parameters: accept a call without params
        None => quote! { _: () },
    };

    let return_type = match &sig.output {
        ReturnType::Type(_, ty) => quote! { #ty },
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                sig,
                "#[method] functions must return jsonrpc11_core::Result<T>",
            ));
        }
    };

    let fn_name = &sig.ident;
    let fn_vis = &input_fn.vis;
    let fn_attrs = &input_fn.attrs;
    let fn_block = &input_fn.block;
    let method_name = args
        .name
        .unwrap_or_else(|| LitStr::new(&fn_name.to_string(), fn_name.span()));

    Ok(quote! {
        #(#fn_attrs)*
        #fn_vis fn #fn_name() -> ::jsonrpc11_server::NamedHandler {
            async fn __jsonrpc11_method(#param) -> #return_type #fn_block

            ::jsonrpc11_server::NamedHandler::new(
                #method_name,
                ::jsonrpc11_server::from_typed_fn(__jsonrpc11_method),
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(args: MethodArgs, item: ItemFn) -> String {
        method_impl(args, item).unwrap().to_string()
    }

    #[test]
    fn test_default_name_is_fn_name() {
        let item: ItemFn = parse_quote! {
            async fn ping() -> Result<String> { Ok("pong".into()) }
        };

        let output = expand(MethodArgs::default(), item);
        assert!(output.contains("\"ping\""));
        assert!(output.contains("_ : ()"));
        assert!(output.contains("NamedHandler"));
    }

    #[test]
    fn test_explicit_name() {
        let item: ItemFn = parse_quote! {
            pub async fn get_entry(id: u64) -> Result<u64> { Ok(id) }
        };
        let args = MethodArgs {
            name: Some(LitStr::new("entry.get", proc_macro2::Span::call_site())),
        };

        let output = expand(args, item);
        assert!(output.contains("\"entry.get\""));
        assert!(output.contains("id : u64"));
        assert!(output.starts_with("pub fn get_entry"));
    }

    #[test]
    fn test_rejects_sync_fn() {
        let item: ItemFn = parse_quote! {
            fn not_async() -> Result<()> { Ok(()) }
        };
        assert!(method_impl(MethodArgs::default(), item).is_err());
    }

    #[test]
    fn test_rejects_multiple_params() {
        let item: ItemFn = parse_quote! {
            async fn add(a: i64, b: i64) -> Result<i64> { Ok(a + b) }
        };
        let err = method_impl(MethodArgs::default(), item).unwrap_err();
        assert!(err.to_string().contains("at most one parameter"));
    }

    #[test]
    fn test_rejects_missing_return_type() {
        let item: ItemFn = parse_quote! {
            async fn fire() {}
        };
        assert!(method_impl(MethodArgs::default(), item).is_err());
    }
}
