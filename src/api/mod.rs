use rocket::{serde::json::Json, Catcher, Route};
use serde::{Deserialize, Serialize};

use crate::model::api::auth::{FORBIDDEN, UNAUTHORIZED};

pub mod auth;
pub mod posts;
pub mod public;
pub mod requests;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(public::routes());
    routes.extend(auth::routes());
    routes.extend(posts::routes());
    routes.extend(requests::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        forbidden,
        not_found,
        unprocessable_entity,
        internal_error,
    ]
}

/// Body of responses produced by catchers rather than handlers.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[catch(400)]
fn bad_request() -> Json<Message> {
    Message::new("bad request")
}

#[catch(401)]
fn unauthorized() -> Json<Message> {
    Message::new(UNAUTHORIZED)
}

#[catch(403)]
fn forbidden() -> Json<Message> {
    Message::new(FORBIDDEN)
}

#[catch(404)]
fn not_found() -> Json<Message> {
    Message::new("not found")
}

#[catch(422)]
fn unprocessable_entity() -> Json<Message> {
    Message::new("malformed request body")
}

#[catch(500)]
fn internal_error() -> Json<Message> {
    Message::new(crate::error::INTERNAL_ERROR_MESSAGE)
}
