//! Client for the Redmine REST API
//!
//! [`resource`] holds the shared machinery (paginated, cached listings and
//! XML payload building); [`redmine`] holds the transport and the project and
//! custom field operations built on it.

pub mod error;
pub mod redmine;
pub mod resource;

pub use error::{Error, Result, ValidationError};
pub use redmine::client::RedmineClient;
pub use redmine::custom_fields::CustomFields;
pub use redmine::projects::Projects;
pub use redmine::transport::{Method, RawResponse, Transport, TransportError};
