// Application layer: fetch orchestration and screen state on top of the
// domain rules, the API client and the response cache.

pub mod error;
pub mod screen;
pub mod service;

pub use error::*;
pub use screen::*;
pub use service::*;
