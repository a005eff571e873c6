use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    post::{NewPost, Post},
    request::{NewVolunteerRequest, VolunteerRequest},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Volunteer post collections
const POSTS: &str = "volunteers";
impl MongoCollection for Post {
    const NAME: &'static str = POSTS;
}
impl MongoCollection for NewPost {
    const NAME: &'static str = POSTS;
}

// Volunteer request collections
const REQUESTS: &str = "requests";
impl MongoCollection for VolunteerRequest {
    const NAME: &'static str = REQUESTS;
}
impl MongoCollection for NewVolunteerRequest {
    const NAME: &'static str = REQUESTS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // One request per volunteer per post.
    let unique = IndexOptions::builder().unique(true).build();
    let request_index = IndexModel::builder()
        .keys(doc! {"postId": 1, "volunteer.email": 1})
        .options(unique)
        .build();
    Coll::<VolunteerRequest>::from_db(db)
        .create_index(request_index, None)
        .await?;

    // Owner lookups for the "my posts" view.
    let organizer_index = IndexModel::builder()
        .keys(doc! {"organizer.email": 1})
        .build();
    Coll::<Post>::from_db(db)
        .create_index(organizer_index, None)
        .await?;

    Ok(())
}
