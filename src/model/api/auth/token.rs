use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    outcome::{try_outcome, IntoOutcome},
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

pub const AUTH_TOKEN_COOKIE: &str = "token";

/// Rejection message for a missing or invalid credential.
pub const UNAUTHORIZED: &str = "unauthorized access";

/// Rejection message for a credential that names somebody else.
pub const FORBIDDEN: &str = "forbidden access";

/// The identity a client asks to be issued a credential for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
}

/// An authentication token asserting that the bearer owns an email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub email: String,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given identity.
    pub fn new(identity: Identity) -> Result<Self> {
        if identity.email.trim().is_empty() {
            return Err(Error::bad_request("Cannot issue a credential without an email"));
        }
        Ok(Self {
            email: identity.email,
        })
    }

    /// Sign this token and wrap it in a cookie.
    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;

        let mut cookie = Self::cookie_template(token, config);
        cookie.set_max_age(Duration::seconds(config.auth_ttl().num_seconds()));
        Ok(cookie)
    }

    /// A cookie that clears the credential, with the same attributes as the
    /// issued one.
    pub fn removal_cookie(config: &Config) -> Cookie<'static> {
        Self::cookie_template(String::new(), config)
    }

    fn cookie_template(value: String, config: &Config) -> Cookie<'static> {
        // Browsers only accept `SameSite=None` on secure cookies.
        let same_site = if config.secure_cookies() {
            SameSite::None
        } else {
            SameSite::Strict
        };

        Cookie::build(AUTH_TOKEN_COOKIE, value)
            .path("/")
            .http_only(true)
            .secure(config.secure_cookies())
            .same_site(same_site)
            .finish()
    }

    /// Verify and deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie, rejecting the request if it is absent or invalid.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let cookie = try_outcome!(req.cookies().get(AUTH_TOKEN_COOKIE).into_outcome((
            Status::Unauthorized,
            Error::Status(Status::Unauthorized, UNAUTHORIZED.to_string()),
        )));

        Self::from_cookie(cookie, config).into_outcome(Status::Unauthorized)
    }
}
