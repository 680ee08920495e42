//! Outbound collaborators: email delivery and the card payment gateway.
//!
//! Both sit behind traits so the services can be driven against fakes in tests
//! and so the process can run without SMTP or gateway credentials in development.

pub mod mailer;
pub mod payments;
