#![recursion_limit = "128"]

extern crate proc_macro;

mod model;
mod paths;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `Model`: a static table descriptor plus the typed field table
/// (`get` / `set`) used to encode and decode rows.
///
/// # Attributes
///
/// On the struct (both required):
/// - `#[model(table = "bookings", primary_key = "booking_id")]`
///
/// On fields. Fields without a `model` attribute are stored in a column of
/// the same name.
/// - `#[model(column = "db_name")]` stores the field under another column
/// - `#[model(references = User, join = "user")]` marks a foreign key to
///   another model; `join` names the field receiving the joined object
/// - `#[model(join)]` holds an `Option<T>` filled by joins; not stored
/// - `#[model(serialize)]` is not stored but appears in serialized output
/// - `#[model(skip)]` is ignored entirely
///
/// # Example
///
/// ```ignore
/// #[derive(Model, Default)]
/// #[model(table = "profiles", primary_key = "profile_id")]
/// struct Profile {
///     profile_id: Option<i64>,
///     #[model(references = User, join = "user")]
///     user_id: Option<i64>,
///     bio: Option<String>,
///     #[model(join)]
///     user: Option<User>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match model::derive_model(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
