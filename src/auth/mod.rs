pub mod claims;
mod credential;

pub use claims::JwtKeys;
pub use credential::Credential;
