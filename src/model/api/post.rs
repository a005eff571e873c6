use mongodb::bson::{doc, to_document, Document};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::id::ApiId,
    common::person::Person,
    db::post::{Post, PostCore},
};

impl PostCore {
    /// Check that a submitted post is acceptable for storage.
    pub fn validate(&self) -> Result<()> {
        if self.post_title.trim().is_empty() {
            return Err(Error::bad_request("Post title must not be empty"));
        }
        if self.organizer.email.trim().is_empty() {
            return Err(Error::bad_request("Organizer email must not be empty"));
        }
        if self.volunteers_needed < 0 {
            return Err(Error::bad_request(format!(
                "Volunteers needed must not be negative, got {}",
                self.volunteers_needed
            )));
        }
        Ok(())
    }
}

/// A post as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDescription {
    #[serde(rename = "_id")]
    pub id: ApiId,
    #[serde(flatten)]
    pub post: PostCore,
}

impl From<Post> for PostDescription {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.into(),
            post: post.post,
        }
    }
}

/// An organizer's edit to a post. Only the supplied fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<Person>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volunteers_needed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl PostUpdate {
    /// Validate the edit and turn it into a `$set` update document.
    pub fn into_update(self) -> Result<Document> {
        if matches!(&self.post_title, Some(title) if title.trim().is_empty()) {
            return Err(Error::bad_request("Post title must not be empty"));
        }
        if let Some(needed) = self.volunteers_needed.filter(|needed| *needed < 0) {
            return Err(Error::bad_request(format!(
                "Volunteers needed must not be negative, got {needed}"
            )));
        }
        let fields = to_document(&self)?;
        if fields.is_empty() {
            return Err(Error::bad_request("Nothing to update"));
        }
        Ok(doc! { "$set": fields })
    }
}

/// Response of the post count endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCount {
    pub count: u64,
}
