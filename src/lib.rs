pub mod db;
pub mod env;
pub mod error;
pub mod import;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod telemetry;

#[cfg(test)]
mod test;

pub use error::StoreError;
pub use import::ImportOutcome;
pub use models::{Certificate, CertificateVerification, Event, Progress, User, UserProfile};
