mod credentials;
mod models;

pub use credentials::*;
pub use models::*;
