use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Expr, ExprLit, Lit, Meta, MetaNameValue, Variant, parse_macro_input};

/// Derive macro that generates `name()` and `from_str()` methods for enums
/// based on `#[name = "..."]` attributes on the variants.
///
/// ### Example
/// ```
/// use caps_derive::NamedEnum;
///
/// #[derive(Debug, NamedEnum)]
/// enum MyEnum {
///  #[name = "first_variant"]
///  First,
///  #[name = "second_variant"]
///  Second,
///  Third, // Implicit name: "third"
/// }
/// ```
#[proc_macro_derive(NamedEnum, attributes(name))]
pub fn derive_named_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let enum_name = &input.ident;

    let variants = if let Data::Enum(data_enum) = &input.data {
        &data_enum.variants
    } else {
        panic!("NamedEnum can only be derived for enums");
    };
    let variant_mappings = variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            let string_name = extract_name_attribute(variant)
                .unwrap_or_else(|| variant_name.to_string().to_lowercase());
            (variant_name, string_name)
        })
        .collect::<Vec<_>>();

    let type_name_arms = variant_mappings.iter().map(|(variant_name, string_name)| {
        quote! {
            #enum_name::#variant_name => #string_name
        }
    });

    let from_str_arms = variant_mappings.iter().map(|(variant_name, string_name)| {
        quote! {
            #string_name => Some(#enum_name::#variant_name)
        }
    });

    let expanded = quote! {
        impl #enum_name {
            /// Get the string name of this variant
            pub const fn name(&self) -> &'static str {
                match self {
                    #(#type_name_arms),*
                }
            }

            /// Try to recover a variant from its string name
            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    #(#from_str_arms),*,
                    _ => None,
                }
            }
        }
    };

    proc_macro::TokenStream::from(expanded)
}

/// Extract the string value from a `#[name = "..."]` attribute if present
fn extract_name_attribute(variant: &Variant) -> Option<String> {
    variant
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("name"))
        .map(|attr| match &attr.meta {
            Meta::NameValue(MetaNameValue { value, .. }) => {
                if let Expr::Lit(ExprLit {
                    lit: Lit::Str(lit_str),
                    ..
                }) = value
                {
                    lit_str.value()
                } else {
                    panic!("name attribute must have a string literal value");
                }
            }
            _ => panic!("name attribute must be in the form #[name = \"value\"]"),
        })
}

/// Derive macro that generates an `iter()` associated function returning
/// every variant of a unit-only enum, in declaration order.
///
/// ### Example
/// ```
/// use caps_derive::IterableEnum;
///
/// #[derive(Debug, Clone, Copy, PartialEq, IterableEnum)]
/// enum Direction {
///     North,
///     South,
/// }
///
/// let all: Vec<Direction> = Direction::iter().collect();
/// assert_eq!(all, vec![Direction::North, Direction::South]);
/// ```
#[proc_macro_derive(IterableEnum)]
pub fn derive_iterable_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let enum_name = &input.ident;

    let variants = if let Data::Enum(data_enum) = &input.data {
        &data_enum.variants
    } else {
        panic!("IterableEnum can only be derived for enums");
    };

    for variant in variants.iter() {
        if !matches!(variant.fields, syn::Fields::Unit) {
            panic!("IterableEnum only supports enums with unit variants");
        }
    }

    let variant_idents = variants.iter().map(|variant| &variant.ident);

    let expanded = quote! {
        impl #enum_name {
            /// Iterate over every variant of this enum in declaration order.
            pub fn iter() -> impl Iterator<Item = Self> + Clone {
                [#(#enum_name::#variant_idents),*].into_iter()
            }
        }
    };

    proc_macro::TokenStream::from(expanded)
}
