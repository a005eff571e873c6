use log::{error, info, warn};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::Owner,
        request::{RequestDescription, RequestSpec, RequestUpdate},
    },
    db::{post::Post, request::VolunteerRequest},
    mongodb::{is_duplicate_key_error, Coll, Id},
};

/// Rejection for a volunteer applying to the same post twice.
pub const ALREADY_REQUESTED: &str = "Already Requested!";

/// Rejection for a post with no remaining capacity.
pub const NO_VOLUNTEERS_NEEDED: &str = "No Volunteers Needed!";

pub fn routes() -> Vec<Route> {
    routes![
        create_request,
        list_requests,
        update_request,
        my_requests,
        delete_request,
    ]
}

/// Apply for a post, taking one of its remaining volunteer slots.
///
/// The slot is taken with a single conditional decrement, so concurrent
/// applications can never overfill a post. If storing the request fails
/// afterwards, the slot is handed back.
#[post("/requests", data = "<spec>", format = "json")]
async fn create_request(
    spec: Json<RequestSpec>,
    posts: Coll<Post>,
    requests: Coll<VolunteerRequest>,
) -> Result<Json<RequestDescription>> {
    let spec = spec.0;
    spec.validate()?;
    let post_id: Id = spec.post_id.into();
    let email = spec.volunteer.email.clone();

    // Duplicates racing past this check are caught by the unique index.
    let existing = requests
        .count_documents(VolunteerRequest::application_filter(post_id, &email), None)
        .await?;
    if existing > 0 {
        return Err(Error::conflict(ALREADY_REQUESTED));
    }

    let post = match Post::take_slot(&posts, post_id).await? {
        Some(post) => post,
        None => {
            let exists = posts.count_documents(post_id.as_doc(), None).await? > 0;
            return Err(if exists {
                Error::conflict(NO_VOLUNTEERS_NEEDED)
            } else {
                Error::not_found(format!("Post {post_id}"))
            });
        }
    };

    let request = VolunteerRequest {
        id: Id::new(),
        request: spec.into_request(&post),
    };
    if let Err(err) = requests.insert_one(&request, None).await {
        match Post::release_slot(&posts, post_id).await {
            Ok(true) => {}
            Ok(false) => warn!("Post {post_id} vanished before its slot could be returned"),
            Err(e) => error!("Failed to return slot to post {post_id}: {e}"),
        }
        if is_duplicate_key_error(&err) {
            return Err(Error::conflict(ALREADY_REQUESTED));
        }
        return Err(err.into());
    }
    info!(
        "{email} requested to volunteer for post {post_id}, {} slots left",
        post.volunteers_needed
    );

    Ok(Json(request.into()))
}

/// Every request made against the caller's posts.
#[get("/requests")]
async fn list_requests(
    owner: Owner,
    requests: Coll<VolunteerRequest>,
) -> Result<Json<Vec<RequestDescription>>> {
    let received = requests
        .find(VolunteerRequest::for_organizer(owner.email()), None)
        .await?
        .map_ok(RequestDescription::from)
        .try_collect()
        .await?;
    Ok(Json(received))
}

#[put("/requests/<request_id>", data = "<update>", format = "json")]
async fn update_request(
    request_id: Id,
    update: Json<RequestUpdate>,
    requests: Coll<VolunteerRequest>,
) -> Result<Json<RequestDescription>> {
    let update = update.0.into_update()?;
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let request = requests
        .find_one_and_update(request_id.as_doc(), update, options)
        .await?
        .ok_or_else(|| Error::not_found(format!("Request {request_id}")))?;
    info!("Request {request_id} is now {}", request.status);
    Ok(Json(request.into()))
}

/// Every request the caller has made.
#[get("/my_requests")]
async fn my_requests(
    owner: Owner,
    requests: Coll<VolunteerRequest>,
) -> Result<Json<Vec<RequestDescription>>> {
    let mine = requests
        .find(VolunteerRequest::by_volunteer(owner.email()), None)
        .await?
        .map_ok(RequestDescription::from)
        .try_collect()
        .await?;
    Ok(Json(mine))
}

/// Withdraw a request, giving its slot back to the post it was made for.
///
/// The `id` query parameter is accepted for older clients but the post
/// recorded on the request is the one credited.
#[delete("/requests/<request_id>?<id>")]
async fn delete_request(
    request_id: Id,
    id: Option<&str>,
    posts: Coll<Post>,
    requests: Coll<VolunteerRequest>,
) -> Result<()> {
    let request = requests
        .find_one_and_delete(request_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Request {request_id}")))?;
    let post_id = request.post_id;

    if let Some(claimed) = id.filter(|claimed| *claimed != post_id.to_string()) {
        warn!("Request {request_id} belongs to post {post_id}, not {claimed}");
    }

    match Post::release_slot(&posts, post_id).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("Post {post_id} no longer exists, slot from request {request_id} dropped")
        }
        Err(err) => {
            reinstate(&requests, &request).await;
            return Err(err);
        }
    }
    info!("Withdrew request {request_id} from post {post_id}");

    Ok(())
}

/// Put back a request whose withdrawal could not be completed, so the
/// withdrawal can be retried.
async fn reinstate(requests: &Coll<VolunteerRequest>, request: &VolunteerRequest) {
    match requests.insert_one(request, None).await {
        Ok(_) => warn!("Reinstated request {} after a failed withdrawal", request.id),
        Err(e) => error!(
            "Failed to reinstate request {} for post {}: {e}",
            request.id, request.post_id
        ),
    }
}
