extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashSet;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DeriveInput, Expr, Fields, GenericArgument,
    GenericParam, PathArguments, Type,
};

/// Type-level attributes parsed from `#[describe(...)]`
#[derive(Default)]
struct ContainerAttributes {
    rename: Option<String>,
    annotations: Vec<Expr>,
}

/// Field attributes parsed from `#[describe(...)]` annotations
///
/// * `rename` - Element name to use instead of the field name
/// * `default` - The element may be absent
/// * `id` - Explicit protobuf field number, attached as a `ProtoNumber` annotation
/// * `integer_type` - `signed` or `fixed`, attached as a `ProtoType` annotation
/// * `packed` - Attached as a `ProtoPacked` annotation
/// * `skip` - The field is not part of the schema
/// * `annotations` - Arbitrary `annotate = expr` values
#[derive(Default)]
struct FieldAttributes {
    rename: Option<String>,
    default: bool,
    id: Option<u32>,
    integer_type: Option<IntegerType>,
    packed: bool,
    skip: bool,
    annotations: Vec<Expr>,
}

#[derive(Clone, Copy)]
enum IntegerType {
    Signed,
    Fixed,
}

/// Field numbers protobuf keeps for itself.
const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<u32> = 19_000..=19_999;
const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Parse `#[describe(rename = "name", annotate = expr)]` on a struct or enum
fn get_container_attributes(attrs: &[Attribute]) -> syn::Result<ContainerAttributes> {
    let mut parsed = ContainerAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("describe") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<syn::Ident>()?;
                if ident == "rename" {
                    input.parse::<syn::Token![=]>()?;
                    parsed.rename = Some(input.parse::<syn::LitStr>()?.value());
                } else if ident == "annotate" {
                    input.parse::<syn::Token![=]>()?;
                    parsed.annotations.push(input.parse::<Expr>()?);
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown attribute: {}", ident),
                    ));
                }
                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// Parse `#[describe(...)]` on a field
///
/// Multiple attributes can be combined: `#[describe(id = 3, signed, default)]`
fn get_field_attributes(attrs: &[Attribute]) -> syn::Result<FieldAttributes> {
    let mut parsed = FieldAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("describe") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<syn::Ident>()?;

                if ident == "id" {
                    input.parse::<syn::Token![=]>()?;
                    let lit = input.parse::<syn::LitInt>()?;
                    let id = lit.base10_parse::<u32>()?;
                    if id == 0 || id > MAX_FIELD_NUMBER {
                        return Err(syn::Error::new(
                            lit.span(),
                            "Field number must be between 1 and 2^29 - 1",
                        ));
                    }
                    if RESERVED_FIELD_NUMBERS.contains(&id) {
                        return Err(syn::Error::new(
                            lit.span(),
                            "Field numbers 19000 to 19999 are reserved",
                        ));
                    }
                    parsed.id = Some(id);
                } else if ident == "rename" {
                    input.parse::<syn::Token![=]>()?;
                    parsed.rename = Some(input.parse::<syn::LitStr>()?.value());
                } else if ident == "default" {
                    parsed.default = true;
                } else if ident == "signed" {
                    parsed.integer_type = Some(IntegerType::Signed);
                } else if ident == "fixed" {
                    parsed.integer_type = Some(IntegerType::Fixed);
                } else if ident == "packed" {
                    parsed.packed = true;
                } else if ident == "skip" {
                    parsed.skip = true;
                } else if ident == "annotate" {
                    input.parse::<syn::Token![=]>()?;
                    parsed.annotations.push(input.parse::<Expr>()?);
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown attribute: {}", ident),
                    ));
                }

                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// Parse `#[describe(rename = "name")]` on an enum variant. Nothing else applies to variants.
fn get_variant_rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in attrs {
        if !attr.path().is_ident("describe") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<syn::Ident>()?;
                if ident != "rename" {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Attribute '{}' is not supported on enum variants", ident),
                    ));
                }
                input.parse::<syn::Token![=]>()?;
                rename = Some(input.parse::<syn::LitStr>()?.value());
                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(rename)
}

/// Check if a type is `Option<T>`
fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(seg) = type_path.path.segments.last() {
            return seg.ident == "Option"
                && matches!(
                    &seg.arguments,
                    PathArguments::AngleBracketed(args)
                        if matches!(args.args.first(), Some(GenericArgument::Type(_)))
                );
        }
    }
    false
}

/// One element as handed to the builder.
struct Element<'a> {
    name: String,
    ty: &'a Type,
    optional: bool,
    attrs: FieldAttributes,
}

/// Annotation pushes for one element, in the order they are declared.
fn element_annotations(attrs: &FieldAttributes) -> Vec<TokenStream2> {
    let mut pushes = Vec::new();
    if let Some(id) = attrs.id {
        pushes.push(quote! { senax_schema::proto::ProtoNumber(#id) });
    }
    match attrs.integer_type {
        Some(IntegerType::Signed) => pushes.push(quote! {
            senax_schema::proto::ProtoType(senax_schema::proto::ProtoIntegerType::Signed)
        }),
        Some(IntegerType::Fixed) => pushes.push(quote! {
            senax_schema::proto::ProtoType(senax_schema::proto::ProtoIntegerType::Fixed)
        }),
        None => {}
    }
    if attrs.packed {
        pushes.push(quote! { senax_schema::proto::ProtoPacked });
    }
    for expr in &attrs.annotations {
        pushes.push(quote! { #expr });
    }
    pushes
}

fn collect_elements<'a>(fields: &'a Fields, type_name: &str) -> syn::Result<Vec<Element<'a>>> {
    let mut elements = Vec::new();
    let mut used_ids = HashSet::new();
    let mut used_names = HashSet::new();
    for (index, f) in fields.iter().enumerate() {
        let attrs = get_field_attributes(&f.attrs)?;
        if attrs.skip {
            continue;
        }
        let field_name = match &f.ident {
            Some(ident) => ident.to_string(),
            None => index.to_string(),
        };
        let name = attrs.rename.clone().unwrap_or(field_name);
        if let Some(id) = attrs.id {
            if !used_ids.insert(id) {
                panic!("Field number {} is duplicated for '{}'. Please specify a different number for field '{}' using #[describe(id=...)].", id, type_name, name);
            }
        }
        if !used_names.insert(name.clone()) {
            return Err(syn::Error::new_spanned(
                f,
                format!("Element name '{}' is used twice in '{}'", name, type_name),
            ));
        }
        elements.push(Element {
            name,
            ty: &f.ty,
            optional: attrs.default || is_option_type(&f.ty),
            attrs,
        });
    }
    Ok(elements)
}

/// Derive macro for implementing the `Describe` trait
///
/// Structs become record descriptors whose children are resolved lazily, so a struct may
/// contain itself. Generic type parameters become the descriptor's type parameters.
/// Unit-only enums become enum descriptors.
///
/// # Supported Attributes
///
/// * `#[describe(rename = "name")]` - Serial name (on the type) or element name (on a field)
/// * `#[describe(default)]` - The element may be absent
/// * `#[describe(id = N)]` - Protobuf field number
/// * `#[describe(signed)]` / `#[describe(fixed)]` - Protobuf integer encoding
/// * `#[describe(packed)]` - Packed repeated field
/// * `#[describe(skip)]` - Leave the field out of the schema
/// * `#[describe(annotate = expr)]` - Attach any annotation value
///
/// # Examples
///
/// ```ignore
/// #[derive(Describe)]
/// struct Node<T> {
///     #[describe(id = 1)]
///     value: T,
///     #[describe(id = 2)]
///     next: Option<Box<Node<T>>>,
/// }
/// ```
#[proc_macro_derive(Describe, attributes(describe))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_describe(input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand_describe(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = input.ident.clone();
    let container = get_container_attributes(&input.attrs)?;

    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Describe cannot be derived for types with lifetime parameters",
        ));
    }

    let type_params: Vec<_> = input
        .generics
        .type_params()
        .map(|param| param.ident.clone())
        .collect();
    for param in input.generics.params.iter_mut() {
        if let GenericParam::Type(type_param) = param {
            type_param
                .bounds
                .push(parse_quote!(senax_schema::Describe));
            type_param.bounds.push(parse_quote!('static));
        }
    }
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let name_str = name.to_string();
    let serial_name = match &container.rename {
        Some(rename) => quote! { #rename },
        None => quote! { ::std::concat!(::std::module_path!(), "::", #name_str) },
    };
    let class_annotations = &container.annotations;

    let body = match &input.data {
        Data::Struct(s) => {
            let elements = collect_elements(&s.fields, &name_str)?;
            let count = elements.len();
            let child_types = elements.iter().map(|e| e.ty);
            let add_elements = elements.iter().map(|e| {
                let element_name = &e.name;
                let optional = e.optional;
                let annotations = element_annotations(&e.attrs);
                quote! {
                    builder
                        .add_element(#element_name, #optional)
                        .expect("derived element count matches its fields");
                    #(
                        builder
                            .push_annotation(#annotations)
                            .expect("annotation follows its element");
                    )*
                }
            });
            quote! {
                let generator = senax_schema::FnDescriptorGenerator::new(
                    || ::std::vec![ #(<#child_types as senax_schema::Describe>::descriptor()),* ],
                    || ::std::vec![ #(<#type_params as senax_schema::Describe>::descriptor()),* ],
                );
                #[allow(unused_mut)]
                let mut builder =
                    senax_schema::DescriptorBuilder::generated(#serial_name, #count, generator);
                #(#add_elements)*
                #(builder.push_class_annotation(#class_annotations);)*
                builder
                    .build()
                    .expect("derived descriptor adds every element")
            }
        }
        Data::Enum(e) => {
            let mut variant_names = Vec::new();
            for v in &e.variants {
                if !matches!(v.fields, Fields::Unit) {
                    return Err(syn::Error::new_spanned(
                        v,
                        "Describe can only be derived for enums whose variants carry no data",
                    ));
                }
                let rename = get_variant_rename(&v.attrs)?;
                variant_names.push(rename.unwrap_or_else(|| v.ident.to_string()));
            }
            if !class_annotations.is_empty() {
                return Err(syn::Error::new_spanned(
                    &name,
                    "Enum descriptors do not carry annotations",
                ));
            }
            quote! {
                let variants: &[&str] = &[ #(#variant_names),* ];
                senax_schema::SerialDescriptor::enumeration(#serial_name, variants)
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &name,
                "Describe cannot be derived for unions",
            ))
        }
    };

    Ok(quote! {
        impl #impl_generics senax_schema::Describe for #name #ty_generics #where_clause {
            fn descriptor() -> senax_schema::SerialDescriptor {
                #body
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_error(input: DeriveInput) -> String {
        match expand_describe(input) {
            Ok(_) => panic!("expansion should fail"),
            Err(error) => error.to_string(),
        }
    }

    #[test]
    fn test_variant_rename_is_accepted() {
        let input: DeriveInput = parse_quote! {
            enum Status {
                Active,
                #[describe(rename = "off")]
                Inactive,
            }
        };
        let tokens = expand_describe(input).unwrap().to_string();
        assert!(tokens.contains("\"off\""));
        assert!(tokens.contains("\"Active\""));
        assert!(!tokens.contains("\"Inactive\""));
    }

    #[test]
    fn test_variant_skip_is_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Status {
                Active,
                #[describe(skip)]
                Hidden,
            }
        };
        assert_eq!(
            expand_error(input),
            "Attribute 'skip' is not supported on enum variants"
        );
    }

    #[test]
    fn test_variant_field_attributes_are_rejected() {
        let inputs: [DeriveInput; 3] = [
            parse_quote! { enum A { #[describe(id = 3)] X } },
            parse_quote! { enum A { #[describe(rename = "x", default)] X } },
            parse_quote! { enum A { #[describe(packed)] X } },
        ];
        for input in inputs {
            assert!(expand_error(input).contains("not supported on enum variants"));
        }
    }

    #[test]
    fn test_data_carrying_enum_is_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Shape {
                Circle(f64),
            }
        };
        assert!(expand_error(input).contains("carry no data"));
    }
}
