use syn::spanned::Spanned;
use syn::{Attribute, Field, Ident, LitStr, Path, Result, Token};

/// `#[model(table = "...", primary_key = "...")]` on the struct.
pub(crate) struct ModelAttributes {
    pub(crate) table: LitStr,
    pub(crate) primary_key: LitStr,
}

impl ModelAttributes {
    pub(crate) fn parse(ident: &Ident, attrs: &[Attribute]) -> Result<Self> {
        let mut table = None;
        let mut primary_key = None;

        for attr in attrs.iter().filter(|a| a.path().is_ident("model")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    table = Some(meta.value()?.parse::<LitStr>()?);
                    Ok(())
                } else if meta.path.is_ident("primary_key") {
                    primary_key = Some(meta.value()?.parse::<LitStr>()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `table` or `primary_key`"))
                }
            })?;
        }

        let table = table.ok_or_else(|| {
            syn::Error::new(ident.span(), "missing #[model(table = \"...\")]")
        })?;
        let primary_key = primary_key.ok_or_else(|| {
            syn::Error::new(ident.span(), "missing #[model(primary_key = \"...\")]")
        })?;
        Ok(Self { table, primary_key })
    }
}

/// What a struct field is to the model.
pub(crate) enum FieldKind {
    /// Persisted in `column`
    Column {
        column: String,
        references: Option<Path>,
        join: Option<LitStr>,
    },
    /// Receives the object loaded through a join
    Join,
    /// Not persisted, but part of serialized output
    Serialize,
    Skip,
}

pub(crate) struct ModelField<'a> {
    pub(crate) ident: &'a Ident,
    /// Property name, `r#` stripped
    pub(crate) property: String,
    pub(crate) kind: FieldKind,
}

impl<'a> ModelField<'a> {
    pub(crate) fn parse(field: &'a Field) -> Result<Self> {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new(field.span(), "Model fields must be named"))?;
        let property = ident.to_string().trim_start_matches("r#").to_owned();

        let mut column: Option<LitStr> = None;
        let mut references: Option<Path> = None;
        let mut join: Option<Option<LitStr>> = None;
        let mut serialize = false;
        let mut skip = false;

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("model")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("column") {
                    if meta.input.peek(Token![=]) {
                        column = Some(meta.value()?.parse()?);
                    }
                    Ok(())
                } else if meta.path.is_ident("references") {
                    references = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("join") {
                    join = Some(if meta.input.peek(Token![=]) {
                        Some(meta.value()?.parse()?)
                    } else {
                        None
                    });
                    Ok(())
                } else if meta.path.is_ident("serialize") {
                    serialize = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else {
                    Err(meta.error(
                        "expected `column`, `references`, `join`, `serialize` or `skip`",
                    ))
                }
            })?;
        }

        let persisted_attrs = column.is_some() || references.is_some();
        let kind = if skip {
            if persisted_attrs || serialize || join.is_some() {
                return Err(syn::Error::new(
                    ident.span(),
                    "`skip` cannot be combined with other model attributes",
                ));
            }
            FieldKind::Skip
        } else if serialize {
            if persisted_attrs || join.is_some() {
                return Err(syn::Error::new(
                    ident.span(),
                    "`serialize` marks a field that is not stored; remove `column`/`references`/`join`",
                ));
            }
            FieldKind::Serialize
        } else if let Some(None) = join
            && references.is_none()
        {
            if column.is_some() {
                return Err(syn::Error::new(
                    ident.span(),
                    "a `join` field holds a loaded object and has no column",
                ));
            }
            FieldKind::Join
        } else {
            let join = match join {
                Some(Some(name)) if references.is_none() => {
                    return Err(syn::Error::new(
                        name.span(),
                        "`join = \"...\"` requires `references = Type`",
                    ));
                }
                Some(name) => name,
                None => None,
            };
            FieldKind::Column {
                column: column.map_or_else(|| property.clone(), |c| c.value()),
                references,
                join,
            }
        };

        Ok(Self {
            ident,
            property,
            kind,
        })
    }
}
