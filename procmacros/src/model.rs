mod attributes;

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

use crate::paths::{core as core_paths, std as std_paths};
use attributes::{FieldKind, ModelAttributes, ModelField};

pub(crate) fn derive_model(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic structs",
        ));
    }

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Model can only be derived for structs",
            ));
        }
    };

    let attrs = ModelAttributes::parse(name, &input.attrs)?;
    let fields = named
        .iter()
        .map(ModelField::parse)
        .collect::<Result<Vec<_>>>()?;

    validate(&attrs, &fields)?;

    let model = core_paths::model();
    let descriptor = core_paths::model_descriptor();
    let field_spec = core_paths::field_spec();
    let decode_joined = core_paths::decode_joined();
    let value = core_paths::value();
    let to_value = core_paths::to_value();
    let from_value = core_paths::from_value();
    let decode_error = core_paths::decode_error();
    let option = std_paths::option();
    let result = std_paths::result();
    let vec = std_paths::vec();

    let table = &attrs.table;
    let primary_key = &attrs.primary_key;

    let mut specs = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();
    let mut extras = Vec::new();

    for field in &fields {
        let ident = field.ident;
        let property = &field.property;
        match &field.kind {
            FieldKind::Column {
                column,
                references,
                join,
            } => {
                let mut spec = quote!(#field_spec::new(#property));
                if column != property {
                    spec = quote!(#spec.column(#column));
                }
                if let Some(target) = references {
                    spec = quote!(#spec.references(<#target as #model>::descriptor));
                }
                if let Some(join) = join {
                    spec = quote!(#spec.join_as(#join));
                }
                specs.push(spec);
                getters.push(quote! {
                    #property => #option::Some(#to_value::to_value(&self.#ident)),
                });
                setters.push(quote! {
                    #property => self.#ident = #from_value::from_value(value)?,
                });
            }
            FieldKind::Join => {
                setters.push(quote! {
                    #property => self.#ident = #decode_joined(value)?,
                });
                extras.push(quote! {
                    if let #option::Some(joined) = &self.#ident {
                        extras.push((#property, #value::Json(#model::to_json(joined))));
                    }
                });
            }
            FieldKind::Serialize => {
                setters.push(quote! {
                    #property => self.#ident = #from_value::from_value(value)?,
                });
                extras.push(quote! {
                    extras.push((#property, #to_value::to_value(&self.#ident)));
                });
            }
            FieldKind::Skip => {}
        }
    }

    let extras_fn = if extras.is_empty() {
        quote!()
    } else {
        quote! {
            fn extras(&self) -> #vec<(&'static str, #value)> {
                let mut extras = #vec::new();
                #(#extras)*
                extras
            }
        }
    };

    Ok(quote! {
        #[automatically_derived]
        impl #model for #name {
            fn descriptor() -> &'static #descriptor {
                static DESCRIPTOR: #descriptor = #descriptor {
                    table_name: #table,
                    primary_key: #primary_key,
                    fields: &[#(#specs),*],
                };
                &DESCRIPTOR
            }

            fn get(&self, property: &str) -> #option<#value> {
                match property {
                    #(#getters)*
                    _ => #option::None,
                }
            }

            #[allow(unused_variables)]
            fn set(&mut self, property: &str, value: #value) -> #result<bool, #decode_error> {
                match property {
                    #(#setters)*
                    _ => return #result::Ok(false),
                }
                #result::Ok(true)
            }

            #extras_fn
        }
    })
}

fn validate(attrs: &ModelAttributes, fields: &[ModelField<'_>]) -> Result<()> {
    let mut columns = HashSet::new();
    for field in fields {
        if let FieldKind::Column { column, .. } = &field.kind
            && !columns.insert(column.as_str())
        {
            return Err(syn::Error::new(
                field.ident.span(),
                format!("column `{column}` is mapped twice"),
            ));
        }
    }

    let primary_key = attrs.primary_key.value();
    let has_pk = fields.iter().any(|f| {
        f.property == primary_key && matches!(f.kind, FieldKind::Column { .. })
    });
    if !has_pk {
        return Err(syn::Error::new(
            attrs.primary_key.span(),
            format!("primary key `{primary_key}` is not a stored field"),
        ));
    }

    for field in fields {
        if let FieldKind::Column {
            join: Some(join), ..
        } = &field.kind
        {
            let name = join.value();
            let target = fields
                .iter()
                .any(|f| f.property == name && matches!(f.kind, FieldKind::Join));
            if !target {
                return Err(syn::Error::new(
                    join.span(),
                    format!("no `#[model(join)]` field named `{name}`"),
                ));
            }
        }
    }
    Ok(())
}
