use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_samples;

#[proc_macro_derive(FromSamples, attributes(sample))]
pub fn derive_from_samples(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match from_samples::expand_from_samples(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}
