//! A generic list-and-form controller over remote collections.
//!
//! Page controllers describe columns, a field schema and async callbacks; the
//! manager renders the table, drives the modal form and reconciles nothing on its
//! own. Callbacks own the API calls and the session-local collection updates.

mod collection;
mod fields;
mod form;
mod manager;

pub use collection::{LoadTicket, ResourceCollection, SaveGuard};
pub use fields::{
    Field, FieldError, FieldErrorKind, FieldKind, FieldOption, FieldRules, FieldValue,
    FormValues, Validator, preprocess_item, validate_form,
};
pub use form::{FormModal, FormMode, field_views};
pub use manager::{
    CellRenderer, Column, ColumnKey, Confirmation, DeleteOutcome, MODAL_CLOSE_PATH, ResourceError,
    ResourceManager, ResourceRoutes, SubmitOutcome,
};

use quire_api_types::{Permission, Post, Role, User};
use serde::Serialize;

/// An item with a stable identifier that can be listed in a resource table.
pub trait Resource: Serialize + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

impl Resource for Role {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Resource for Permission {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Resource for User {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Resource for Post {
    fn id(&self) -> &str {
        &self.id
    }
}
