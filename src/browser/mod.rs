//! Chrome sessions
//!
//! [`BrowserSession`] launches or attaches to Chrome through the DevTools
//! protocol and implements [`Page`](crate::dom::Page) on top of it.

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::BrowserSession;
