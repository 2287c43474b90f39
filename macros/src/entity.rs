//! Attribute parsing and codegen for `#[derive(Entity)]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Ident, Meta, Result, Token};

struct FieldPlan {
    ident: Ident,
    rust_name: String,
    column_override: Option<String>,
    is_primary_key: bool,
    is_identity: bool,
    is_not_mapped: bool,
    nullable: bool,
    remote: Option<RemoteSpec>,
}

enum RemoteKindSpec {
    Link,
    Key,
    Property,
}

struct RemoteSpec {
    kind: RemoteKindSpec,
    target: syn::Path,
    key_path: Vec<String>,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = input.ident.clone();
    let table_override = parse_table_override(&input.attrs)?;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "Entity can only be derived for a struct",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(
            input.span(),
            "Entity requires named fields",
        ));
    };

    let mut plans = Vec::with_capacity(fields.named.len());
    for field in &fields.named {
        plans.push(parse_field(field)?);
    }

    let descriptor_ident = format_ident!("__RELMAP_{}_DESCRIPTOR", struct_name);
    let fields_ident = format_ident!("__RELMAP_{}_FIELDS", struct_name);

    let mut accessor_items = Vec::with_capacity(plans.len());
    let mut field_descriptor_literals = Vec::with_capacity(plans.len());

    for plan in &plans {
        let get_ident = format_ident!("__relmap_get_{}_{}", struct_name, plan.ident);
        let set_ident = format_ident!("__relmap_set_{}_{}", struct_name, plan.ident);
        let field_ident = &plan.ident;

        accessor_items.push(quote! {
            fn #get_ident(obj: &dyn ::core::any::Any) -> ::relmap_core::value::SqlValue {
                ::relmap_core::codec::FieldCodec::to_sql_value(
                    &obj.downcast_ref::<#struct_name>()
                        .expect("accessor called against the wrong entity type")
                        .#field_ident,
                )
            }

            fn #set_ident(
                obj: &mut dyn ::core::any::Any,
                value: ::relmap_core::value::SqlValue,
            ) -> ::relmap_core::error::Result<()> {
                obj.downcast_mut::<#struct_name>()
                    .expect("accessor called against the wrong entity type")
                    .#field_ident = ::relmap_core::codec::FieldCodec::from_sql_value(value)?;
                Ok(())
            }
        });

        let rust_name = &plan.rust_name;
        let column_override = match &plan.column_override {
            Some(s) => quote! { ::core::option::Option::Some(#s) },
            None => quote! { ::core::option::Option::None },
        };
        let is_primary_key = plan.is_primary_key;
        let is_identity = plan.is_identity;
        let is_not_mapped = plan.is_not_mapped;
        let nullable = plan.nullable;

        let remote = match &plan.remote {
            None => quote! { ::core::option::Option::None },
            Some(spec) => {
                let target = &spec.target;
                let kind = match spec.kind {
                    RemoteKindSpec::Link => quote! { ::relmap_core::entity::RemoteKind::Link },
                    RemoteKindSpec::Key => quote! { ::relmap_core::entity::RemoteKind::Key },
                    RemoteKindSpec::Property => {
                        quote! { ::relmap_core::entity::RemoteKind::Property }
                    }
                };
                let key_path = &spec.key_path;
                quote! {
                    ::core::option::Option::Some(::relmap_core::entity::RemoteMarker {
                        kind: #kind,
                        target: <#target as ::relmap_core::entity::Entity>::descriptor,
                        key_path: &[#(#key_path),*],
                    })
                }
            }
        };

        field_descriptor_literals.push(quote! {
            ::relmap_core::entity::FieldDescriptor {
                rust_name: #rust_name,
                column_override: #column_override,
                is_primary_key: #is_primary_key,
                is_identity: #is_identity,
                is_not_mapped: #is_not_mapped,
                nullable: #nullable,
                remote: #remote,
                get: #get_ident,
                set: #set_ident,
            }
        });
    }

    let table_override_tokens = match table_override {
        Some(s) => quote! { ::core::option::Option::Some(#s) },
        None => quote! { ::core::option::Option::None },
    };
    let type_name = struct_name.to_string();

    Ok(quote! {
        #(#accessor_items)*

        static #fields_ident: &[::relmap_core::entity::FieldDescriptor] = &[
            #(#field_descriptor_literals),*
        ];

        static #descriptor_ident: ::relmap_core::entity::EntityDescriptor =
            ::relmap_core::entity::EntityDescriptor {
                type_name: #type_name,
                table_override: #table_override_tokens,
                fields: #fields_ident,
            };

        impl ::relmap_core::entity::Entity for #struct_name {
            fn descriptor() -> &'static ::relmap_core::entity::EntityDescriptor {
                &#descriptor_ident
            }

            fn blank() -> Self {
                ::core::default::Default::default()
            }
        }
    })
}

fn parse_table_override(attrs: &[syn::Attribute]) -> Result<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident("relmap") {
            continue;
        }
        let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        for meta in metas {
            if let Meta::NameValue(nv) = &meta {
                if nv.path.is_ident("table") {
                    return Ok(Some(expect_str_lit(&nv.value)?));
                }
            }
        }
    }
    Ok(None)
}

fn parse_field(field: &syn::Field) -> Result<FieldPlan> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new(field.span(), "Entity requires named fields"))?;
    let rust_name = ident.to_string();
    let nullable = is_option_type(&field.ty);

    let mut plan = FieldPlan {
        ident,
        rust_name,
        column_override: None,
        is_primary_key: false,
        is_identity: false,
        is_not_mapped: false,
        nullable,
        remote: None,
    };

    for attr in &field.attrs {
        if !attr.path().is_ident("relmap") {
            continue;
        }
        let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        for meta in metas {
            match &meta {
                Meta::Path(path) if path.is_ident("key") => plan.is_primary_key = true,
                Meta::Path(path) if path.is_ident("identity") => plan.is_identity = true,
                Meta::Path(path) if path.is_ident("not_mapped") => plan.is_not_mapped = true,
                Meta::NameValue(nv) if nv.path.is_ident("column") => {
                    plan.column_override = Some(expect_str_lit(&nv.value)?);
                }
                Meta::List(list) if list.path.is_ident("link") => {
                    let target: syn::Path = syn::parse2(list.tokens.clone())?;
                    plan.remote = Some(RemoteSpec {
                        kind: RemoteKindSpec::Link,
                        target,
                        key_path: Vec::new(),
                    });
                }
                Meta::List(list) if list.path.is_ident("remote_key") => {
                    let args: RemoteArgs = syn::parse2(list.tokens.clone())?;
                    plan.remote = Some(RemoteSpec {
                        kind: RemoteKindSpec::Key,
                        target: args.target,
                        key_path: args.path,
                    });
                }
                Meta::List(list) if list.path.is_ident("remote_property") => {
                    let args: RemoteArgs = syn::parse2(list.tokens.clone())?;
                    plan.remote = Some(RemoteSpec {
                        kind: RemoteKindSpec::Property,
                        target: args.target,
                        key_path: args.path,
                    });
                }
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "unrecognized #[relmap(...)] argument",
                    ));
                }
            }
        }
    }

    Ok(plan)
}

fn expect_str_lit(expr: &syn::Expr) -> Result<String> {
    if let syn::Expr::Lit(lit) = expr {
        if let syn::Lit::Str(s) = &lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new(expr.span(), "expected a string literal"))
}

fn is_option_type(ty: &syn::Type) -> bool {
    if let syn::Type::Path(p) = ty {
        if let Some(segment) = p.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

struct RemoteArgs {
    target: syn::Path,
    path: Vec<String>,
}

impl syn::parse::Parse for RemoteArgs {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let target: syn::Path = input.parse()?;
        let mut path = vec!["Id".to_string()];
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            let key_ident: Ident = input.parse()?;
            if key_ident != "path" {
                return Err(syn::Error::new(
                    key_ident.span(),
                    "expected `path = [...]`",
                ));
            }
            input.parse::<Token![=]>()?;
            let content;
            syn::bracketed!(content in input);
            let idents: Punctuated<Ident, Token![,]> = Punctuated::parse_terminated(&content)?;
            path = idents.into_iter().map(|i| i.to_string()).collect();
            if path.is_empty() {
                return Err(syn::Error::new(
                    content.span(),
                    "path(...) must name at least the target column",
                ));
            }
        }
        Ok(Self { target, path })
    }
}
