mod owner;
mod token;

pub use owner::Owner;
pub use token::{AuthToken, Identity, AUTH_TOKEN_COOKIE, FORBIDDEN, UNAUTHORIZED};
