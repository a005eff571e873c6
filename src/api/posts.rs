use log::info;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::Owner,
        pagination::PaginationRequest,
        post::{PostCount, PostDescription, PostUpdate},
    },
    db::post::{NewPost, Post},
    mongodb::{Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![
        create_post,
        update_post,
        delete_post,
        list_posts,
        count_posts,
        my_posts,
        get_post,
        search_posts,
    ]
}

#[post("/volunteers", data = "<post>", format = "json")]
async fn create_post(post: Json<NewPost>, posts: Coll<Post>) -> Result<Json<PostDescription>> {
    post.validate()?;

    let post = Post {
        id: Id::new(),
        post: post.0,
    };
    posts.insert_one(&post, None).await?;
    info!(
        "Created post {} for {} needing {} volunteers",
        post.id, post.organizer.email, post.volunteers_needed
    );

    Ok(Json(post.into()))
}

#[put("/volunteers/<post_id>", data = "<update>", format = "json")]
async fn update_post(
    post_id: Id,
    update: Json<PostUpdate>,
    posts: Coll<Post>,
) -> Result<Json<PostDescription>> {
    let update = update.0.into_update()?;
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let post = posts
        .find_one_and_update(post_id.as_doc(), update, options)
        .await?
        .ok_or_else(|| Error::not_found(format!("Post {post_id}")))?;
    Ok(Json(post.into()))
}

#[delete("/volunteers/<post_id>")]
async fn delete_post(post_id: Id, posts: Coll<Post>) -> Result<()> {
    let result = posts.delete_one(post_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Post {post_id}")));
    }
    info!("Deleted post {post_id}");
    Ok(())
}

#[get("/volunteers?<pagination..>")]
async fn list_posts(
    pagination: PaginationRequest,
    posts: Coll<Post>,
) -> Result<Json<Vec<PostDescription>>> {
    let page = posts
        .find(None, pagination.find_options())
        .await?
        .map_ok(PostDescription::from)
        .try_collect()
        .await?;
    Ok(Json(page))
}

#[get("/volunteers_count")]
async fn count_posts(posts: Coll<Post>) -> Result<Json<PostCount>> {
    let count = posts.count_documents(None, None).await?;
    Ok(Json(PostCount { count }))
}

#[get("/my_post")]
async fn my_posts(owner: Owner, posts: Coll<Post>) -> Result<Json<Vec<PostDescription>>> {
    let mine = posts
        .find(Post::organized_by(owner.email()), None)
        .await?
        .map_ok(PostDescription::from)
        .try_collect()
        .await?;
    Ok(Json(mine))
}

#[get("/volunteers/<post_id>")]
async fn get_post(post_id: Id, posts: Coll<Post>) -> Result<Json<PostDescription>> {
    let post = posts
        .find_one(post_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Post {post_id}")))?;
    Ok(Json(post.into()))
}

#[get("/AllVolunteer?<search>")]
async fn search_posts(
    search: Option<&str>,
    posts: Coll<Post>,
) -> Result<Json<Vec<PostDescription>>> {
    let filter = Post::search_filter(search.unwrap_or_default());
    let found = posts
        .find(filter, None)
        .await?
        .map_ok(PostDescription::from)
        .try_collect()
        .await?;
    Ok(Json(found))
}

#[cfg(test)]
mod tests {
    use mongodb::{bson::doc, Database};
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::{json, serde_json},
    };

    use crate::model::{api::auth::AUTH_TOKEN_COOKIE, common::person::Person, db::post::PostCore};

    use super::*;

    #[backend_test]
    async fn create_and_count(client: Client, posts: Coll<Post>) {
        let created = create(&client, &PostCore::example()).await;
        assert_eq!(created.post, PostCore::example());

        // The stored record matches what was submitted.
        let stored = posts
            .find_one(created.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.post, PostCore::example());
        assert_eq!(stored.volunteers_needed, 3);

        create(&client, &PostCore::example2()).await;
        let response = client.get(uri!(count_posts)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let count: PostCount = read_json(response).await;
        assert_eq!(count.count, 2);
    }

    #[backend_test]
    async fn reject_invalid_posts(client: Client, posts: Coll<Post>) {
        let mut negative = PostCore::example();
        negative.volunteers_needed = -1;
        create_expect_status(&client, &negative, Status::BadRequest).await;

        let mut untitled = PostCore::example();
        untitled.post_title = "".to_string();
        create_expect_status(&client, &untitled, Status::BadRequest).await;

        // Missing required fields never reach the handler.
        let response = client
            .post(uri!(create_post))
            .header(ContentType::JSON)
            .body(json!({ "postTitle": "Half a post" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::UnprocessableEntity, response.status());

        assert_eq!(posts.count_documents(None, None).await.unwrap(), 0);
    }

    #[backend_test]
    async fn get_one(client: Client) {
        let created = create(&client, &PostCore::example()).await;

        let response = client.get(uri!(get_post(*created.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let fetched: PostDescription = read_json(response).await;
        assert_eq!(fetched, created);

        let response = client.get(uri!(get_post(Id::new()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn list_with_pagination(client: Client) {
        for i in 0..5 {
            let mut post = PostCore::example();
            post.post_title = format!("Shift {i}");
            create(&client, &post).await;
        }

        // Everything without pagination.
        let all = list(&client, "/volunteers").await;
        assert_eq!(all.len(), 5);

        // Zero-based pages.
        let first = list(&client, "/volunteers?page=0&size=2").await;
        let titles: Vec<_> = first.iter().map(|p| p.post.post_title.as_str()).collect();
        assert_eq!(titles, vec!["Shift 0", "Shift 1"]);
        let last = list(&client, "/volunteers?page=2&size=2").await;
        let titles: Vec<_> = last.iter().map(|p| p.post.post_title.as_str()).collect();
        assert_eq!(titles, vec!["Shift 4"]);
        let beyond = list(&client, "/volunteers?page=3&size=2").await;
        assert!(beyond.is_empty());
    }

    #[backend_test]
    async fn search(client: Client) {
        create(&client, &PostCore::example()).await; // "Beach Clean-up Crew", "Environment"
        create(&client, &PostCore::example2()).await; // "Food Bank Sorting", "Social Service"

        let titles = search_titles(&client, "beach").await;
        assert_eq!(titles, vec!["Beach Clean-up Crew"]);

        let titles = search_titles(&client, "SERVICE").await;
        assert_eq!(titles, vec!["Food Bank Sorting"]);

        let titles = search_titles(&client, "an").await; // "clean" and "bank"
        assert_eq!(titles.len(), 2);

        assert!(search_titles(&client, "gardening").await.is_empty());
        // Pattern characters are literal.
        assert!(search_titles(&client, ".*").await.is_empty());

        // No search term lists everything.
        let response = client.get("/AllVolunteer").dispatch().await;
        let all: Vec<PostDescription> = read_json(response).await;
        assert_eq!(all.len(), 2);
    }

    #[backend_test]
    async fn update(client: Client, posts: Coll<Post>) {
        let created = create(&client, &PostCore::example()).await;

        let response = client
            .put(uri!(update_post(*created.id)))
            .header(ContentType::JSON)
            .body(json!({ "location": "South Beach", "volunteersNeeded": 10 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let updated: PostDescription = read_json(response).await;
        assert_eq!(updated.post.location.as_deref(), Some("South Beach"));
        assert_eq!(updated.post.volunteers_needed, 10);
        assert_eq!(updated.post.post_title, PostCore::example().post_title);

        // Updating a missing post does not create one.
        let response = client
            .put(uri!(update_post(Id::new())))
            .header(ContentType::JSON)
            .body(json!({ "location": "Nowhere" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
        assert_eq!(posts.count_documents(None, None).await.unwrap(), 1);

        // Negative capacity is refused.
        let response = client
            .put(uri!(update_post(*created.id)))
            .header(ContentType::JSON)
            .body(json!({ "volunteersNeeded": -2 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test]
    async fn delete(client: Client, posts: Coll<Post>) {
        let created = create(&client, &PostCore::example()).await;

        let response = client.delete(uri!(delete_post(*created.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(posts.count_documents(None, None).await.unwrap(), 0);

        let response = client.delete(uri!(delete_post(*created.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(organizer)]
    async fn my_posts_only_returns_own(client: Client, db: Database) {
        create(&client, &PostCore::example()).await;
        create(&client, &PostCore::example2()).await;
        create(&client, &PostCore::example_other_organizer()).await;

        let email = Person::example_organizer().email;
        let response = client.get(uri!(my_posts)).dispatch().await;
        // No `email` parameter.
        assert_eq!(Status::BadRequest, response.status());

        let response = client
            .get(format!("/my_post?email={email}"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let mine: Vec<PostDescription> = read_json(response).await;
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p.post.organizer.email == email));

        // Sanity check against the database.
        let stored = Coll::<Post>::from_db(&db)
            .count_documents(doc! { "organizer.email": &email }, None)
            .await
            .unwrap();
        assert_eq!(stored, 2);
    }

    #[backend_test(organizer)]
    async fn my_posts_forbids_other_emails(client: Client) {
        create(&client, &PostCore::example_other_organizer()).await;

        let response = client
            .get("/my_post?email=someone.else@carecrew.test")
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
        assert!(response.into_string().await.unwrap().contains("forbidden access"));
    }

    #[backend_test]
    async fn my_posts_requires_credential(client: Client) {
        let email = Person::example_organizer().email;
        let response = client
            .get(format!("/my_post?email={email}"))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        assert!(response.into_string().await.unwrap().contains("unauthorized access"));

        // A forged credential is no better than none.
        let response = client
            .get(format!("/my_post?email={email}"))
            .cookie(rocket::http::Cookie::new(AUTH_TOKEN_COOKIE, "not.a.jwt"))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: LocalResponse<'_>) -> T {
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    async fn create(client: &Client, post: &PostCore) -> PostDescription {
        let response = create_expect_status(client, post, Status::Ok).await;
        read_json(response).await
    }

    async fn create_expect_status<'c>(
        client: &'c Client,
        post: &PostCore,
        status: Status,
    ) -> LocalResponse<'c> {
        let response = client
            .post(uri!(create_post))
            .header(ContentType::JSON)
            .body(serde_json::to_string(post).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), status);
        response
    }

    async fn list(client: &Client, uri: &str) -> Vec<PostDescription> {
        let response = client.get(uri.to_string()).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        read_json(response).await
    }

    async fn search_titles(client: &Client, term: &str) -> Vec<String> {
        let response = client
            .get(format!("/AllVolunteer?search={term}"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let found: Vec<PostDescription> = read_json(response).await;
        found.into_iter().map(|p| p.post.post_title).collect()
    }
}
