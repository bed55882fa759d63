//! Client core for the classroom blog: REST access to posts, professors and
//! students, the paged list controller views are built on, and the
//! authentication seam that gates mutations.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod list_controller;

pub use api::{BlogClient, ListSource, Page, PageRequest, Resource};
pub use auth::{AuthContext, AuthError, CredentialVerifier, DemoCredentialVerifier, Session};
pub use config::{load_settings, load_settings_from, ClientSettings};
pub use error::ClientError;
pub use list_controller::{FetchOutcome, ListFetchController, ListMode, ListState};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
