pub mod credentials;
pub mod error;

pub use credentials::*;
pub use error::*;
