mod client;
mod envelope;
mod error;
mod transport;

pub use client::*;
pub use envelope::*;
pub use error::ApiError;
pub use transport::*;
