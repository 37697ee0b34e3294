//! Business logic services for the gateway.
//!
//! # Services
//!
//! - `email` - Review request email rendering and simulated delivery
//! - `scheduler` - Review request scheduling behind a trait

pub mod email;
pub mod scheduler;

pub use email::{EmailError, EmailTemplate, ReviewEmailContext, ReviewEmailService, render};
pub use scheduler::{LoggingScheduler, ReviewRequest, ReviewScheduler, SchedulerError};
