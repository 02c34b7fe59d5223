//! member-portal/crates/mp-service/src/lib.rs
//!
//! The content lifecycle layer: orchestration of repository and file
//! storage, the authorization policy, and download preparation.

pub mod authz;
pub mod download;
pub mod service;
pub mod view;

pub use authz::Principal;
pub use download::{DownloadFile, DownloadOutcome};
pub use service::ContentService;
pub use view::ContentView;
