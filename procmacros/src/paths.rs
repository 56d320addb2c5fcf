//! Centralized path definitions for generated code.
//!
//! Paths use the `datarepo::` prefix (without leading `::`) so that code inside
//! the facade crate can resolve them through `extern crate self as datarepo`.

use proc_macro2::TokenStream;
use quote::quote;

pub mod std {
    use super::*;

    pub fn option() -> TokenStream {
        quote!(::std::option::Option)
    }

    pub fn result() -> TokenStream {
        quote!(::std::result::Result)
    }

    pub fn vec() -> TokenStream {
        quote!(::std::vec::Vec)
    }
}

/// Items from `datarepo::core`
pub mod core {
    use super::*;

    pub fn model() -> TokenStream {
        quote!(datarepo::core::model::Model)
    }

    pub fn model_descriptor() -> TokenStream {
        quote!(datarepo::core::model::ModelDescriptor)
    }

    pub fn field_spec() -> TokenStream {
        quote!(datarepo::core::model::FieldSpec)
    }

    pub fn decode_joined() -> TokenStream {
        quote!(datarepo::core::model::decode_joined)
    }

    pub fn value() -> TokenStream {
        quote!(datarepo::core::value::Value)
    }

    pub fn to_value() -> TokenStream {
        quote!(datarepo::core::value::ToValue)
    }

    pub fn from_value() -> TokenStream {
        quote!(datarepo::core::value::FromValue)
    }

    pub fn decode_error() -> TokenStream {
        quote!(datarepo::core::error::DecodeError)
    }
}
