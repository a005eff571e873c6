use std::fmt::Display;

use jsonwebtoken::errors::Error as JwtError;
use log::{debug, error};
use mongodb::{bson::ser::Error as BsonError, error::Error as DbError};
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Message sent in place of the details of any server-side fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Bson(#[from] BsonError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    /// A 404 error for the given (described) resource.
    pub fn not_found(what: impl Display) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    /// A 400 error with the given message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, message.into())
    }

    /// A 409 error with the given message, used for business-rule rejections.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Status(Status::Conflict, message.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::Status(status, _) => *status,
            Self::Db(_) | Self::Jwt(_) | Self::Bson(_) => Status::InternalServerError,
        }
    }
}

/// The JSON body of an error response.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        let error = match self {
            Self::Status(_, message) => {
                if status.class() == StatusClass::ServerError {
                    error!("{message}");
                } else {
                    debug!("Rejected {} {}: {message}", req.method(), req.uri());
                }
                message
            }
            // Never leak store or token internals to the client.
            other => {
                error!("{other}");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };
        (status, Json(ErrorBody { error })).respond_to(req)
    }
}
