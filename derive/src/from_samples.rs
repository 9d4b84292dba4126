use std::collections::BTreeMap;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Error, ExprClosure, Field, Fields, Ident, Pat, Result, Token, Type,
    parse::{Parse, ParseStream},
    parse_quote,
    spanned::Spanned,
};

pub(crate) fn expand_from_samples(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`FromSamples` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new_spanned(
            input,
            "`FromSamples` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    // Ordered by kind so expansion is deterministic.
    let mut kinds: BTreeMap<Kind, Vec<FieldMetadata>> = BTreeMap::new();
    for field in fields {
        kinds.entry(field.kind).or_default().push(field);
    }

    let methods = kinds.into_iter().map(|(kind, fields)| {
        let value_type = kind.value_type();

        let assignments = fields.into_iter().map(|field| {
            let FieldMetadata {
                name, ty, store, ..
            } = field;

            match store {
                Store::Vec => quote! { self.#name.push(value); },
                Store::Option => quote! { self.#name = Some(value); },
                Store::Handler(handler) => {
                    let body = handler.body;
                    let mut inputs = handler.inputs.into_iter();
                    let acc = match inputs.next() {
                        Some(Pat::Type(acc)) => quote! { #acc },
                        acc => quote! { #acc: &mut #ty },
                    };
                    let val = match inputs.next() {
                        Some(Pat::Type(val)) => quote! { #val },
                        val => quote! { #val: #value_type },
                    };

                    quote! {
                        (|#acc, #val| { #body })(&mut self.#name, value);
                    }
                }
            }
        });

        let method = format_ident!("add_{}", kind.name());

        quote! {
            fn #method(&mut self, value: #value_type) {
                #(#assignments)*
            }
        }
    });

    let name = &input.ident;
    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::regulator::avec::FromSamples for #name #type_generics #where_clause {
            #(#methods)*
        }
    };

    Ok(expanded.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Kind {
    Time,
    Depth,
    Temperature,
    GasMix,
    Deco,
    Event,
    Pressure,
    Warning,
}

impl Kind {
    fn from_ident(ident: &Ident) -> Result<Self> {
        Ok(match ident.to_string().as_str() {
            "time" => Self::Time,
            "depth" => Self::Depth,
            "temperature" => Self::Temperature,
            "gas_mix" => Self::GasMix,
            "deco" => Self::Deco,
            "event" => Self::Event,
            "pressure" => Self::Pressure,
            "warning" => Self::Warning,
            _ => Err(Error::new_spanned(
                ident,
                "Sample kind must be one of `time`, `depth`, `temperature`, `gas_mix`, `deco`, `event`, `pressure` or `warning`.",
            ))?,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Depth => "depth",
            Self::Temperature => "temperature",
            Self::GasMix => "gas_mix",
            Self::Deco => "deco",
            Self::Event => "event",
            Self::Pressure => "pressure",
            Self::Warning => "warning",
        }
    }

    fn value_type(self) -> Type {
        match self {
            Self::Time => parse_quote!(u32),
            Self::Depth | Self::Temperature => parse_quote!(f64),
            Self::GasMix => parse_quote!(usize),
            Self::Deco => parse_quote!(::regulator::sans::sample::Deco),
            Self::Event => parse_quote!(::regulator::sans::sample::Event),
            Self::Pressure => parse_quote!(::regulator::sans::sample::Pressure),
            Self::Warning => parse_quote!(::regulator::sans::Warning),
        }
    }
}

#[derive(Debug)]
enum Store {
    Vec,
    Option,
    Handler(ExprClosure),
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    ty: Type,
    kind: Kind,
    store: Store,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(name) = field.ident.clone() else {
            Err(Error::new(field.span(), "Field must be named."))?
        };

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("sample")) else {
            return Ok(None);
        };

        let SampleAttribute { kind, handler } = attr.meta.require_list()?.parse_args()?;

        let store = if let Some(handler) = handler {
            if handler.inputs.len() != 2 {
                Err(Error::new_spanned(
                    &handler,
                    "Handler closure must have two parameters.",
                ))?
            }

            Store::Handler(handler)
        } else {
            let Type::Path(path) = &field.ty else {
                Err(Error::new_spanned(
                    &field.ty,
                    "Field without a handler must have type `Vec<T>` or `Option<T>`.",
                ))?
            };

            match path.path.segments.last() {
                Some(segment) if segment.ident == "Vec" => Store::Vec,
                Some(segment) if segment.ident == "Option" => Store::Option,
                _ => Err(Error::new_spanned(
                    &path.path,
                    "Field without a handler must have type `Vec<T>` or `Option<T>`.",
                ))?,
            }
        };

        Ok(Some(Self {
            name,
            ty: field.ty.clone(),
            kind,
            store,
        }))
    }
}

#[derive(Debug)]
struct SampleAttribute {
    kind: Kind,
    handler: Option<ExprClosure>,
}

impl Parse for SampleAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let kind = Kind::from_ident(&input.parse::<Ident>()?)?;

        let handler = if !input.is_empty() {
            input.parse::<Token![,]>()?;
            Some(input.parse::<ExprClosure>()?)
        } else {
            None
        };

        Ok(Self { kind, handler })
    }
}
