use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    /// A test function split around its name and its body.
    struct TestFn {
        head: Any<Cons<Except<KFn>, TokenTree>>,
        _fn: KFn,
        name: Ident,
        signature: Any<Cons<Except<BraceGroup>, TokenTree>>,
        body: BraceGroup,
    }
}

/// `#[test]` for the graphyaml crates.
///
/// The body runs after `graphyaml_testhelpers::setup()` and inside a span
/// named after the test, so log lines from concurrent tests stay apart.
///
/// ```ignore
/// #[graphyaml_testhelpers::test]
/// fn reads_aliases() -> Result<(), IPanic> {
///     let value = Serializer::new().deserialize("a: &x 1\nb: *x\n")?;
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    if !attr.is_empty() {
        return quote::quote! {
            ::core::compile_error!("#[graphyaml_testhelpers::test] takes no arguments");
        }
        .into();
    }

    let mut tokens = TokenStream::from(item).into_token_iter();
    let Ok(TestFn {
        head,
        name,
        signature,
        body,
        ..
    }) = tokens.parse::<TestFn>()
    else {
        return quote::quote! {
            ::core::compile_error!("#[graphyaml_testhelpers::test] expects a function");
        }
        .into();
    };

    let head = head.to_token_stream();
    let signature = signature.to_token_stream();
    let body = body.to_token_stream();
    quote::quote! {
        #[::core::prelude::rust_2024::test]
        #head fn #name #signature {
            ::graphyaml_testhelpers::setup();
            let _span = ::graphyaml_testhelpers::test_span(::core::stringify!(#name));
            #body
        }
    }
    .into()
}
