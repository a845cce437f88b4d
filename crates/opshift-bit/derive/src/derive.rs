use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

const MAX_VARIANTS: usize = 64;

pub(crate) fn handle_derive_key(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "Key can be derived only for enums",
        ));
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Key supports only fieldless enum variants",
            ));
        }
        variants.push(&variant.ident);
    }
    if variants.is_empty() {
        return Err(syn::Error::new_spanned(name, "Key requires at least one variant"));
    }
    if variants.len() > MAX_VARIANTS {
        return Err(syn::Error::new_spanned(
            name,
            format!("Key supports at most {MAX_VARIANTS} variants"),
        ));
    }

    let names: Vec<String> =
        variants.iter().map(|v| to_snake_case(&v.to_string())).collect();

    // Bits are assigned by declaration order, explicit discriminants are ignored.
    let bit_arms = variants.iter().enumerate().map(|(i, v)| {
        let idx = i as u64;
        quote! { #name::#v => 1u64 << #idx }
    });
    let name_arms = variants.iter().zip(&names).map(|(v, n)| {
        quote! { #name::#v => #n }
    });
    let all_values = variants.iter().map(|v| quote! { #name::#v });
    let parse_arms = variants.iter().zip(&names).map(|(v, n)| {
        quote! { #n => ::core::option::Option::Some(#name::#v) }
    });

    Ok(quote! {
        impl ::opshift_bit_mask::Bitable for #name {
            #[inline]
            fn bit(&self) -> u64 {
                match self { #( #bit_arms, )* }
            }

            #[inline]
            fn index(&self) -> u32 {
                self.bit().trailing_zeros()
            }
        }

        impl ::opshift_bit_mask::Named for #name {
            const ALL: &'static [Self] = &[ #( #all_values ),* ];

            fn name(&self) -> &'static str {
                match self { #( #name_arms, )* }
            }

            fn from_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    #( #parse_arms, )*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

/// Converts a `CamelCase` identifier into `snake_case`.
/// Runs of capitals are kept together: `PovUp` and `POVUp` both become `pov_up`.
fn to_snake_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(ch.to_lowercase());
    }
    out
}
