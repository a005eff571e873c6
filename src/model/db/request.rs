use std::ops::{Deref, DerefMut};

use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::model::{common::person::Person, mongodb::Id};

/// Status given to a request when the volunteer submits it.
pub const DEFAULT_STATUS: &str = "Requested";

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// Core volunteer request data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerRequestCore {
    /// The post being applied for.
    pub post_id: Id,
    pub volunteer: Person,
    /// Copy of the post's organizer, so organizers can list their requests directly.
    pub organizer: Person,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A volunteer request without an ID.
pub type NewVolunteerRequest = VolunteerRequestCore;

/// A volunteer request from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerRequest {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub request: VolunteerRequestCore,
}

impl VolunteerRequest {
    /// Filter matching the request (if any) made by `volunteer_email` for the given post.
    pub fn application_filter(post_id: Id, volunteer_email: &str) -> Document {
        doc! {
            "postId": post_id,
            "volunteer.email": volunteer_email,
        }
    }

    /// Filter matching every request made against posts run by the given organizer.
    pub fn for_organizer(email: &str) -> Document {
        doc! { "organizer.email": email }
    }

    /// Filter matching every request made by the given volunteer.
    pub fn by_volunteer(email: &str) -> Document {
        doc! { "volunteer.email": email }
    }
}

impl Deref for VolunteerRequest {
    type Target = VolunteerRequestCore;

    fn deref(&self) -> &Self::Target {
        &self.request
    }
}

impl DerefMut for VolunteerRequest {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.request
    }
}


#[cfg(test)]
mod tests {
    use mongodb::{bson, Database};

    use crate::model::mongodb::{is_duplicate_key_error, Coll};

    use super::*;

    #[test]
    fn status_defaults_when_absent() {
        let id = Id::new();
        let stored = doc! {
            "postId": id,
            "volunteer": { "email": "v@carecrew.test" },
            "organizer": { "email": "o@carecrew.test" },
        };
        let request: VolunteerRequestCore = bson::from_document(stored).unwrap();
        assert_eq!(request.status, DEFAULT_STATUS);
        assert_eq!(request.post_id, id);
    }

    #[test]
    fn read_hex_post_reference() {
        let id = Id::new();
        let stored = doc! {
            "_id": Id::new(),
            "postId": id.to_string(),
            "volunteer": { "email": "v@carecrew.test" },
            "organizer": { "email": "o@carecrew.test" },
            "status": "Accepted",
        };
        let request: VolunteerRequest = bson::from_document(stored).unwrap();
        assert_eq!(request.post_id, id);
        assert_eq!(request.status, "Accepted");
    }

    #[backend_test]
    async fn one_request_per_volunteer_per_post(db: Database) {
        let requests = Coll::<NewVolunteerRequest>::from_db(&db);
        let post_id = Id::new();
        requests
            .insert_one(NewVolunteerRequest::example(post_id), None)
            .await
            .unwrap();

        // The unique index rejects a second identical application.
        let err = requests
            .insert_one(NewVolunteerRequest::example(post_id), None)
            .await
            .unwrap_err();
        assert!(is_duplicate_key_error(&err));

        // A different volunteer may still apply.
        let mut other = NewVolunteerRequest::example(post_id);
        other.volunteer = Person::example_volunteer2();
        requests.insert_one(other, None).await.unwrap();
        assert_eq!(requests.count_documents(None, None).await.unwrap(), 2);
    }
}
