//! Redmine API interaction module
//!
//! # Module Structure
//!
//! - [`transport`] - The request capability everything else is written against
//! - [`http`] - reqwest-backed transport
//! - [`client`] - Main client handing out per-resource APIs
//! - [`api`] - Listing, lookup and write plumbing shared by resources
//! - [`projects`] - Project operations
//! - [`custom_fields`] - Custom field operations
//!
//! # Example
//!
//! ```ignore
//! use redmine_client::redmine::client::RedmineClient;
//!
//! async fn example() -> redmine_client::Result<()> {
//!     let client = RedmineClient::new("https://redmine.example.org", Some("api-key"))?;
//!     let mut projects = client.projects();
//!     let id = projects.get_id_by_name("Website", &Default::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod custom_fields;
pub mod http;
pub mod projects;
pub mod transport;
