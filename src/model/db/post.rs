use std::ops::{Deref, DerefMut};

use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::person::Person,
    mongodb::{Coll, Id},
};

/// Core volunteer post data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCore {
    pub post_title: String,
    pub category: String,
    pub organizer: Person,
    /// Remaining capacity: the original need minus active requests.
    pub volunteers_needed: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

/// A post without an ID.
pub type NewPost = PostCore;

/// A post from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub post: PostCore,
}

impl Post {
    /// Atomically take one volunteer slot from the post with the given ID,
    /// returning the post as it is afterwards.
    ///
    /// The decrement only happens if at least one slot remains, so the count
    /// can never go negative. Returns `None` if nothing was taken, either
    /// because the post is full or because it does not exist.
    pub async fn take_slot(posts: &Coll<Post>, id: Id) -> Result<Option<Post>> {
        let filter = doc! {
            "_id": id,
            "volunteersNeeded": { "$gte": 1 },
        };
        let update = doc! {
            "$inc": { "volunteersNeeded": -1 },
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let post = posts.find_one_and_update(filter, update, options).await?;
        Ok(post)
    }

    /// Atomically give one volunteer slot back to the post with the given ID.
    ///
    /// Returns `false` if the post does not exist.
    pub async fn release_slot(posts: &Coll<Post>, id: Id) -> Result<bool> {
        let update = doc! {
            "$inc": { "volunteersNeeded": 1 },
        };
        let result = posts.update_one(id.as_doc(), update, None).await?;
        Ok(result.modified_count == 1)
    }

    /// Filter matching every post run by the given organizer.
    pub fn organized_by(email: &str) -> Document {
        doc! { "organizer.email": email }
    }

    /// Filter matching posts whose title or category contains `term`,
    /// ignoring case. The term is matched literally, not as a pattern.
    pub fn search_filter(term: &str) -> Document {
        if term.is_empty() {
            return doc! {};
        }
        let pattern = regex::escape(term);
        doc! {
            "$or": [
                { "postTitle": { "$regex": pattern.as_str(), "$options": "i" } },
                { "category": { "$regex": pattern.as_str(), "$options": "i" } },
            ]
        }
    }
}

impl Deref for Post {
    type Target = PostCore;

    fn deref(&self) -> &Self::Target {
        &self.post
    }
}

impl DerefMut for Post {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.post
    }
}
