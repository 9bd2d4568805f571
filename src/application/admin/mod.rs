//! Page controllers for the console sections.

pub mod access;
pub mod auth;
pub mod chrome;
pub mod dashboard;
pub mod posts;
pub mod profile;
pub mod users;

use crate::application::{repos::RepoError, resource::ResourceError, toasts::Notices};

pub(crate) const PERMISSION_KEY_PATTERN: &str = r"^[A-Z0-9_:]+$";
pub(crate) const EMAIL_PATTERN: &str = r"^\S+@\S+\.\S+$";

/// Raise a notice for a failed mutation and hand the error back to the form.
pub(crate) fn reject(notices: &Notices, err: RepoError) -> ResourceError {
    notices.repo_error(&err);
    ResourceError::from(err)
}
