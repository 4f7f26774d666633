//! Derive macros for `notify_url_format::ConfigRecord` and
//! `notify_url_format::PropEnum`.

use proc_macro::TokenStream;
use proc_macro2::{Literal, Span};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, LitStr, Meta, Path, Type};

/// Derive `notify_url_format::ConfigRecord` for a struct with named fields.
///
/// Container attributes: `#[config(scheme = "...", user = "...", host = "...",
/// validate = "path::to::fn")]`.
///
/// Field attributes: `key`, `alias` (repeatable), `url = "host|path|user|password"`,
/// `default`, `optional`, `always_emit`, `desc`, `bool_tokens = "yes/no"`,
/// `separator`, `skip`. Doc comments become the description when `desc` is
/// not given.
#[proc_macro_derive(ConfigRecord, attributes(config))]
pub fn derive_config_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_config_record(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `notify_url_format::PropEnum` (and `PropValue`) for a fieldless enum.
///
/// Tokens default to the lower-cased variant name; override with
/// `#[prop(rename = "...")]`. Add `#[prop(case_sensitive)]` on the enum to
/// require exact-case tokens.
#[proc_macro_derive(PropEnum, attributes(prop))]
pub fn derive_prop_enum(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_prop_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct ContainerAttrs {
    scheme: Option<LitStr>,
    user: Option<LitStr>,
    host: Option<LitStr>,
    validate: Option<Path>,
}

#[derive(Default)]
struct FieldAttrs {
    key: Option<LitStr>,
    aliases: Vec<LitStr>,
    url: Option<Ident>,
    default: Option<LitStr>,
    optional: bool,
    always_emit: bool,
    desc: Option<LitStr>,
    bool_tokens: Option<(LitStr, LitStr)>,
    separator: Option<LitStr>,
    skip: bool,
}

fn expand_config_record(input: &DeriveInput) -> Result<proc_macro2::TokenStream, syn::Error> {
    let container = parse_container_attrs(&input.attrs)?;
    let Data::Struct(struct_data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "ConfigRecord can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &struct_data.fields else {
        return Err(syn::Error::new_spanned(
            &struct_data.fields,
            "ConfigRecord requires named fields",
        ));
    };
    let Some(scheme) = container.scheme else {
        return Err(syn::Error::new(
            Span::call_site(),
            "missing #[config(scheme = \"...\")] on struct",
        ));
    };

    let mut specs = Vec::new();
    let mut reads = Vec::new();
    let mut writes = Vec::new();
    for field in &fields.named {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let ty = &field.ty;
        let name = LitStr::new(&field_name(ident), ident.span());
        specs.push(expand_field_spec(&name, ty, &attrs, &field.attrs));
        reads.push(quote! {
            #name => ::core::option::Option::Some(
                <#ty as ::notify_url_format::PropValue>::to_prop(&self.#ident, field)
            ),
        });
        writes.push(quote! {
            #name => ::core::option::Option::Some(
                <#ty as ::notify_url_format::PropValue>::from_prop(raw, field)
                    .map(|value| {
                        self.#ident = value;
                    })
            ),
        });
    }

    let validate = container.validate.map(|path| {
        quote! {
            fn validate(
                &self,
                context: &::notify_url_format::UrlContext<'_>,
            ) -> ::core::result::Result<(), ::notify_url_format::ConfigError> {
                #path(self, context)
            }
        }
    });

    let name = &input.ident;
    let record_name = LitStr::new(&name.to_string(), name.span());
    let credential_user = option_lit(container.user.as_ref());
    let fixed_host = option_lit(container.host.as_ref());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::notify_url_format::ConfigRecord for #name #ty_generics #where_clause {
            const META: ::notify_url_format::RecordMeta = ::notify_url_format::RecordMeta {
                name: #record_name,
                scheme: #scheme,
                credential_user: #credential_user,
                fixed_host: #fixed_host,
                fields: &[#(#specs),*],
            };

            fn read_prop(
                &self,
                field: &::notify_url_format::FieldDescriptor,
            ) -> ::core::option::Option<::std::string::String> {
                match field.name() {
                    #(#reads)*
                    _ => ::core::option::Option::None,
                }
            }

            fn write_prop(
                &mut self,
                field: &::notify_url_format::FieldDescriptor,
                raw: &str,
            ) -> ::core::option::Option<
                ::core::result::Result<(), ::notify_url_format::CoercionError>,
            > {
                match field.name() {
                    #(#writes)*
                    _ => ::core::option::Option::None,
                }
            }

            #validate
        }
    })
}

fn expand_field_spec(
    name: &LitStr,
    ty: &Type,
    attrs: &FieldAttrs,
    raw_attrs: &[Attribute],
) -> proc_macro2::TokenStream {
    let mut builder = quote! {
        ::notify_url_format::FieldSpec::new(#name, <#ty as ::notify_url_format::PropValue>::KIND)
            .formatter(<#ty as ::notify_url_format::PropValue>::FORMATTER)
    };
    if let Some(key) = &attrs.key {
        builder.extend(quote! { .key(#key) });
    }
    if !attrs.aliases.is_empty() {
        let aliases = &attrs.aliases;
        builder.extend(quote! { .aliases(&[#(#aliases),*]) });
    }
    if let Some(part) = &attrs.url {
        let variant = match part.to_string().as_str() {
            "host" => quote! { Host },
            "path" => quote! { Path },
            "user" => quote! { User },
            _ => quote! { Password },
        };
        builder.extend(quote! { .url_part(::notify_url_format::UrlPart::#variant) });
    }
    if let Some(default) = &attrs.default {
        builder.extend(quote! { .default(#default) });
    }
    if attrs.optional {
        builder.extend(quote! { .optional() });
    }
    if attrs.always_emit {
        builder.extend(quote! { .always_emit() });
    }
    if let Some((truthy, falsy)) = &attrs.bool_tokens {
        builder.extend(quote! { .bool_tokens(#truthy, #falsy) });
    }
    if let Some(separator) = &attrs.separator {
        builder.extend(quote! { .separator(#separator) });
    }
    let description = attrs
        .desc
        .clone()
        .or_else(|| doc_comment(raw_attrs).map(|doc| LitStr::new(&doc, Span::call_site())));
    if let Some(description) = description {
        builder.extend(quote! { .description(#description) });
    }
    builder
}

fn option_lit(value: Option<&LitStr>) -> proc_macro2::TokenStream {
    value.map_or_else(
        || quote! { ::core::option::Option::None },
        |value| quote! { ::core::option::Option::Some(#value) },
    )
}

fn field_name(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map_or(name.clone(), str::to_string)
}

fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| {
            let Meta::NameValue(meta) = &attr.meta else {
                return None;
            };
            let Expr::Lit(expr) = &meta.value else {
                return None;
            };
            let Lit::Str(text) = &expr.lit else {
                return None;
            };
            Some(text.value().trim().to_string())
        })
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

fn parse_container_attrs(attrs: &[Attribute]) -> Result<ContainerAttrs, syn::Error> {
    let mut parsed = ContainerAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("config") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("scheme") {
                parsed.scheme = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("user") {
                parsed.user = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("host") {
                parsed.host = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("validate") {
                let value: LitStr = meta.value()?.parse()?;
                if parsed.validate.is_some() {
                    return Err(meta.error("duplicate config(validate = ...)"));
                }
                parsed.validate = Some(value.parse()?);
                return Ok(());
            }
            Err(meta.error("unsupported config attribute on struct"))
        })?;
    }
    Ok(parsed)
}

fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs, syn::Error> {
    let mut parsed = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("config") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                parsed.key = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("alias") {
                parsed.aliases.push(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("url") {
                let value: LitStr = meta.value()?.parse()?;
                if !matches!(value.value().as_str(), "host" | "path" | "user" | "password") {
                    return Err(syn::Error::new_spanned(
                        value,
                        "url must be one of host, path, user, password",
                    ));
                }
                parsed.url = Some(Ident::new(&value.value(), value.span()));
                return Ok(());
            }
            if meta.path.is_ident("default") {
                parsed.default = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("optional") {
                parsed.optional = true;
                return Ok(());
            }
            if meta.path.is_ident("always_emit") {
                parsed.always_emit = true;
                return Ok(());
            }
            if meta.path.is_ident("desc") {
                parsed.desc = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("bool_tokens") {
                let value: LitStr = meta.value()?.parse()?;
                let text = value.value();
                let Some((truthy, falsy)) = text.split_once('/') else {
                    return Err(syn::Error::new_spanned(
                        value,
                        "bool_tokens must look like \"yes/no\"",
                    ));
                };
                parsed.bool_tokens = Some((
                    LitStr::new(truthy, value.span()),
                    LitStr::new(falsy, value.span()),
                ));
                return Ok(());
            }
            if meta.path.is_ident("separator") {
                parsed.separator = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("skip") {
                parsed.skip = true;
                return Ok(());
            }
            Err(meta.error("unsupported config attribute on field"))
        })?;
    }
    Ok(parsed)
}

fn expand_prop_enum(input: &DeriveInput) -> Result<proc_macro2::TokenStream, syn::Error> {
    let Data::Enum(enum_data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "PropEnum can only be derived for enums",
        ));
    };
    if enum_data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "PropEnum requires at least one variant",
        ));
    }

    let mut case_sensitive = false;
    for attr in &input.attrs {
        if !attr.path().is_ident("prop") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("case_sensitive") {
                case_sensitive = true;
                return Ok(());
            }
            Err(meta.error("unsupported prop attribute on enum"))
        })?;
    }

    let mut tokens: Vec<LitStr> = Vec::new();
    let mut variants = Vec::new();
    let mut ordinals = Vec::new();
    for (index, variant) in enum_data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "PropEnum variants cannot carry data",
            ));
        }
        let mut rename: Option<LitStr> = None;
        for attr in &variant.attrs {
            if !attr.path().is_ident("prop") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    rename = Some(meta.value()?.parse()?);
                    return Ok(());
                }
                Err(meta.error("unsupported prop attribute on variant"))
            })?;
        }
        let token = rename.unwrap_or_else(|| {
            LitStr::new(&variant.ident.to_string().to_ascii_lowercase(), variant.ident.span())
        });
        let clashes = tokens.iter().any(|existing| {
            if case_sensitive {
                existing.value() == token.value()
            } else {
                existing.value().eq_ignore_ascii_case(&token.value())
            }
        });
        if clashes {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                format!("duplicate PropEnum token {:?}", token.value()),
            ));
        }
        tokens.push(token);
        variants.push(&variant.ident);
        ordinals.push(Literal::usize_unsuffixed(index));
    }

    let name = &input.ident;
    Ok(quote! {
        impl ::notify_url_format::PropEnum for #name {
            const TOKENS: &'static ::notify_url_format::EnumTokens =
                &::notify_url_format::EnumTokens::new(&[#(#tokens),*], #case_sensitive);

            fn ordinal(&self) -> usize {
                match self {
                    #(Self::#variants => #ordinals,)*
                }
            }

            fn from_ordinal(ordinal: usize) -> ::core::option::Option<Self> {
                match ordinal {
                    #(#ordinals => ::core::option::Option::Some(Self::#variants),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::notify_url_format::PropValue for #name {
            const KIND: ::notify_url_format::FieldKind = ::notify_url_format::FieldKind::Enum;
            const FORMATTER: ::core::option::Option<&'static dyn ::notify_url_format::EnumFormatter> =
                ::core::option::Option::Some(<Self as ::notify_url_format::PropEnum>::TOKENS);

            fn to_prop(&self, _field: &::notify_url_format::FieldDescriptor) -> ::std::string::String {
                ::notify_url_format::enum_to_prop(self)
            }

            fn from_prop(
                raw: &str,
                _field: &::notify_url_format::FieldDescriptor,
            ) -> ::core::result::Result<Self, ::notify_url_format::CoercionError> {
                ::notify_url_format::enum_from_prop(raw)
            }
        }
    })
}
