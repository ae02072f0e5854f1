//! Background jobs for the pharmacy core.
//!
//! - [`config`]: Environment configuration
//! - [`jobs`]: Daily leave sweep and periodic reservation expiry
//! - [`mailer`]: Notification sink that hands messages to a delivery task

pub mod config;
pub mod jobs;
pub mod mailer;
