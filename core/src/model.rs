//! Model descriptors and the [`Model`] mapping trait.
//!
//! A descriptor is static metadata built once per domain type, normally by
//! `#[derive(Model)]`: the table name, the primary key and the ordered list of
//! persisted fields with their storage columns and foreign keys. Every column
//! allow-list used by the query compilers comes from here.

use hashbrown::HashMap;

use crate::error::DecodeError;
use crate::value::Value;

/// A database row keyed by column name (or select alias).
pub type Row = HashMap<String, Value>;

/// A persisted property of a model.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Rust-side property name
    pub property: &'static str,
    /// Storage column, usually equal to `property`
    pub column: &'static str,
    /// Model this field is a foreign key to
    pub references: Option<fn() -> &'static ModelDescriptor>,
    /// Property receiving the joined object when the foreign key is joined
    pub join_as: Option<&'static str>,
}

impl FieldSpec {
    pub const fn new(property: &'static str) -> Self {
        Self {
            property,
            column: property,
            references: None,
            join_as: None,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = column;
        self
    }

    pub const fn references(mut self, target: fn() -> &'static ModelDescriptor) -> Self {
        self.references = Some(target);
        self
    }

    pub const fn join_as(mut self, property: &'static str) -> Self {
        self.join_as = Some(property);
        self
    }

    /// Name under which a join through this field is selected and stored.
    #[inline]
    pub fn join_result_name(&self) -> &'static str {
        self.join_as.unwrap_or(self.property)
    }

    #[inline]
    pub fn target(&self) -> Option<&'static ModelDescriptor> {
        self.references.map(|target| target())
    }
}

/// Static metadata describing how a model maps onto a table.
#[derive(Debug)]
pub struct ModelDescriptor {
    pub table_name: &'static str,
    /// Property name of the primary key
    pub primary_key: &'static str,
    pub fields: &'static [FieldSpec],
}

impl ModelDescriptor {
    /// Storage columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.column)
    }

    pub fn fields_of(&self) -> Vec<&'static str> {
        self.columns().collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.fields.iter().any(|f| f.column == column)
    }

    /// Metadata for a property; `None` means the property is not persisted.
    pub fn column_info(&self, property: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.property == property)
    }

    pub fn field_by_column(&self, column: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// The field of this model that is a foreign key to `target`.
    pub fn foreign_key_for(&self, target: &ModelDescriptor) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| {
            f.target()
                .is_some_and(|t| t.table_name == target.table_name)
        })
    }

    /// Storage column of the primary key.
    pub fn primary_key_column(&self) -> &'static str {
        self.column_info(self.primary_key)
            .map_or(self.primary_key, |f| f.column)
    }
}

/// Key style for [`Model::to_map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKeys {
    /// Property names, including serialize-only and joined properties
    Property,
    /// Storage column names, persisted fields only
    Column,
}

/// A domain type mapped onto a table.
///
/// Implemented by `#[derive(Model)]`. `get` and `set` form the typed field
/// table: each property name maps to a conversion into or out of [`Value`].
pub trait Model: Default + Sized {
    fn descriptor() -> &'static ModelDescriptor;

    /// Reads a persisted property; `None` for unknown properties.
    fn get(&self, property: &str) -> Option<Value>;

    /// Assigns a property from a storage value.
    ///
    /// Returns `Ok(false)` when the model has no such property.
    fn set(&mut self, property: &str, value: Value) -> Result<bool, DecodeError>;

    /// Non-persisted properties included in serialized output.
    fn extras(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    fn id(&self) -> Value {
        self.get(Self::descriptor().primary_key).unwrap_or_default()
    }

    fn set_id(&mut self, id: Value) -> Result<(), DecodeError> {
        self.set(Self::descriptor().primary_key, id).map(|_| ())
    }

    /// Set fields as a key/value list; unset fields are left out.
    fn to_map(&self, keys: MapKeys) -> Vec<(&'static str, Value)> {
        let descriptor = Self::descriptor();
        let mut out: Vec<(&'static str, Value)> = descriptor
            .fields
            .iter()
            .filter_map(|field| {
                let value = self.get(field.property)?;
                if value.is_null() {
                    return None;
                }
                let key = match keys {
                    MapKeys::Property => field.property,
                    MapKeys::Column => field.column,
                };
                Some((key, value))
            })
            .collect();
        if keys == MapKeys::Property {
            out.extend(self.extras().into_iter().filter(|(_, v)| !v.is_null()));
        }
        out
    }

    /// Decodes a database row. Columns are matched by storage name, then by
    /// property name; NULLs leave the field at its default.
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        let descriptor = Self::descriptor();
        let mut model = Self::default();
        for field in descriptor.fields {
            let value = row.get(field.column).or_else(|| row.get(field.property));
            if let Some(value) = value
                && !value.is_null()
            {
                model
                    .set(field.property, value.clone())
                    .map_err(|e| e.in_field(field.property))?;
            }
            if field.references.is_some() {
                let name = field.join_result_name();
                if name != field.property
                    && let Some(joined) = row.get(name)
                    && !joined.is_null()
                {
                    model
                        .set(name, joined.clone())
                        .map_err(|e| e.in_field(name))?;
                }
            }
        }
        Ok(model)
    }

    /// Builds an instance from property-keyed input such as an API payload.
    /// Unknown keys are ignored.
    fn from_map<K: AsRef<str>>(
        map: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Self, DecodeError> {
        let mut model = Self::default();
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            let key = key.as_ref();
            model.set(key, value).map_err(|e| e.in_field(key))?;
        }
        Ok(model)
    }

    fn from_json(json: &serde_json::Value) -> Result<Self, DecodeError> {
        let object = json.as_object().ok_or(DecodeError::TypeMismatch {
            expected: "json object",
            found: "json",
        })?;
        Self::from_map(
            object
                .iter()
                .map(|(k, v)| (k.as_str(), Value::from_json(v.clone()))),
        )
    }

    fn to_json(&self) -> serde_json::Value {
        let object = self
            .to_map(MapKeys::Property)
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_json()))
            .collect();
        serde_json::Value::Object(object)
    }
}

/// Decodes a joined sub-object, as produced by a `JSON_OBJECT` selection.
///
/// Accepts either JSON text or an already parsed object, keyed by the
/// target's storage columns.
pub fn decode_joined<T: Model>(value: Value) -> Result<Option<T>, DecodeError> {
    let json = match value {
        Value::Null => return Ok(None),
        Value::Text(text) => {
            serde_json::from_str(&text).map_err(|e| DecodeError::Json(e.to_string()))?
        }
        Value::Json(json) => json,
        other => {
            return Err(DecodeError::TypeMismatch {
                expected: "json object",
                found: other.type_name(),
            });
        }
    };
    match json {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(object) => {
            let row: Row = object
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect();
            T::from_row(&row).map(Some)
        }
        _ => Err(DecodeError::TypeMismatch {
            expected: "json object",
            found: "json",
        }),
    }
}

/// Joined sub-object of `model`, keyed by storage column, as stored by a lazy
/// join.
pub fn joined_value<T: Model>(model: &T) -> Value {
    let object = model
        .to_map(MapKeys::Column)
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_json()))
        .collect();
    Value::Json(serde_json::Value::Object(object))
}
