//! Atelier Core — client-side workshop domain for the Atelier community platform.
//!
//! The backend REST API is the system of record for workshops, enrollments,
//! and certificates. This crate provides:
//!
//! - `models`: the typed wire shapes shared by every layer
//! - `api`: a stateless access layer over the backend endpoints
//! - `orchestrator`: the per-session working copy of workshop state, with
//!   reconciliation after each mutating call and pure derived queries
//!
//! Identity and notification delivery are injected capabilities (`session`,
//! `notify`), so every layer can run against fakes in tests.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod session;

// Convenience re-exports
pub use api::{HttpWorkshopApi, WorkshopApi};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use orchestrator::{WorkshopOrchestrator, WorkshopState};
pub use session::{IdentityProvider, SessionUser, SharedSession};
