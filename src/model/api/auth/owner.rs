use log::warn;
use rocket::{
    http::Status,
    outcome::try_outcome,
    request::{FromRequest, Outcome},
    Request,
};

use crate::error::Error;

use super::token::{AuthToken, FORBIDDEN};

/// Name of the query parameter that identifies whose records are being read.
pub const OWNER_QUERY_PARAM: &str = "email";

/// Proof that the caller owns the email address named by the `email` query
/// parameter. Any route that filters records by that parameter takes this
/// guard, so callers can only ever read their own records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    email: String,
}

impl Owner {
    /// The verified email address.
    pub fn email(&self) -> &str {
        &self.email
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Owner {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // A valid credential is required before anything else.
        let token = try_outcome!(req.guard::<AuthToken>().await);

        let email = match req.query_value::<String>(OWNER_QUERY_PARAM) {
            Some(Ok(email)) => email,
            _ => {
                return Outcome::Failure((
                    Status::BadRequest,
                    Error::bad_request(format!("Missing `{OWNER_QUERY_PARAM}` query parameter")),
                ))
            }
        };

        if token.email != email {
            warn!(
                "Credential for {} used to read records of {}",
                token.email, email
            );
            return Outcome::Failure((
                Status::Forbidden,
                Error::Status(Status::Forbidden, FORBIDDEN.to_string()),
            ));
        }

        Outcome::Success(Owner { email })
    }
}
