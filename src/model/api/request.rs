use mongodb::bson::{doc, to_document, Document};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::id::ApiId,
    common::person::Person,
    db::{
        post::Post,
        request::{NewVolunteerRequest, VolunteerRequest, DEFAULT_STATUS},
    },
};

/// A volunteer's application for a post, as submitted to the API.
///
/// The organizer and post title are not taken from the client; they are
/// copied from the post itself when the request is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSpec {
    pub post_id: ApiId,
    pub volunteer: Person,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl RequestSpec {
    /// Check the application before any capacity is taken for it.
    pub fn validate(&self) -> Result<()> {
        if self.volunteer.email.trim().is_empty() {
            return Err(Error::bad_request("Volunteer email must not be empty"));
        }
        if matches!(&self.status, Some(status) if status.trim().is_empty()) {
            return Err(Error::bad_request("Status must not be empty"));
        }
        Ok(())
    }

    /// Build the request to store against `post`.
    pub fn into_request(self, post: &Post) -> NewVolunteerRequest {
        NewVolunteerRequest {
            post_id: post.id,
            volunteer: self.volunteer,
            organizer: post.organizer.clone(),
            status: self.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            post_title: Some(post.post_title.clone()),
            suggestion: self.suggestion,
        }
    }
}

/// A volunteer request as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescription {
    #[serde(rename = "_id")]
    pub id: ApiId,
    pub post_id: ApiId,
    pub volunteer: Person,
    pub organizer: Person,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<VolunteerRequest> for RequestDescription {
    fn from(request: VolunteerRequest) -> Self {
        let id = request.id.into();
        let core = request.request;
        Self {
            id,
            post_id: core.post_id.into(),
            volunteer: core.volunteer,
            organizer: core.organizer,
            status: core.status,
            post_title: core.post_title,
            suggestion: core.suggestion,
        }
    }
}

/// An organizer's edit to a request, typically a status change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl RequestUpdate {
    /// Validate the edit and turn it into a `$set` update document.
    pub fn into_update(self) -> Result<Document> {
        if matches!(&self.status, Some(status) if status.trim().is_empty()) {
            return Err(Error::bad_request("Status must not be empty"));
        }
        let fields = to_document(&self)?;
        if fields.is_empty() {
            return Err(Error::bad_request("Nothing to update"));
        }
        Ok(doc! { "$set": fields })
    }
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::{json, serde_json};

    use crate::model::{db::post::PostCore, mongodb::Id};

    use super::*;

    #[test]
    fn request_copies_post_details() {
        let post = Post {
            id: Id::new(),
            post: PostCore::example(),
        };
        let request = RequestSpec::example(post.id).into_request(&post);
        assert_eq!(request.post_id, post.id);
        assert_eq!(request.status, DEFAULT_STATUS);
        assert_eq!(request.organizer, Person::example_organizer());
        assert_eq!(request.post_title.as_deref(), Some("Beach Clean-up Crew"));
    }

    #[test]
    fn client_organizer_is_ignored() {
        let post = Post {
            id: Id::new(),
            post: PostCore::example(),
        };
        let body = json!({
            "postId": post.id.to_string(),
            "volunteer": { "email": "volunteer@carecrew.test" },
            "organizer": { "email": "impostor@carecrew.test" },
            "postTitle": "Something else",
        });
        let spec: RequestSpec = serde_json::from_value(body).unwrap();
        let request = spec.into_request(&post);
        assert_eq!(request.organizer.email, "organizer@carecrew.test");
        assert_eq!(request.post_title.as_deref(), Some("Beach Clean-up Crew"));
    }

    #[test]
    fn spec_requires_volunteer_email() {
        let spec = RequestSpec::example_from(Id::new(), Person::new(""));
        assert!(spec.validate().is_err());
        assert!(RequestSpec::example(Id::new()).validate().is_ok());
    }

    #[test]
    fn update_status() {
        let update = RequestUpdate {
            status: Some("Accepted".to_string()),
            suggestion: None,
        };
        assert_eq!(
            update.into_update().unwrap(),
            doc! { "$set": { "status": "Accepted" } }
        );
        assert!(RequestUpdate::default().into_update().is_err());
    }
}
