use log::info;
use rocket::{
    http::CookieJar,
    serde::json::Json,
    Route, State,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::api::auth::{AuthToken, Identity},
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![issue_token, logout]
}

/// Acknowledgement sent by the credential endpoints.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub success: bool,
}

#[post("/jwt", data = "<identity>", format = "json")]
pub async fn issue_token(
    identity: Json<Identity>,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
) -> Result<Json<Acknowledgement>> {
    let token = AuthToken::new(identity.0)?;
    info!("Issuing credential for {}", token.email);
    cookies.add(token.into_cookie(config)?);
    Ok(Json(Acknowledgement { success: true }))
}

#[get("/logOut")]
pub fn logout(cookies: &CookieJar<'_>, config: &State<Config>) -> Json<Acknowledgement> {
    cookies.remove(AuthToken::removal_cookie(config));
    Json(Acknowledgement { success: true })
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::{json, serde_json},
    };

    use crate::model::{api::auth::AUTH_TOKEN_COOKIE, common::person::Person};

    use super::*;

    #[backend_test]
    async fn issue_sets_cookie(client: Client) {
        let response = client
            .post(uri!(issue_token))
            .header(ContentType::JSON)
            .body(json!({ "email": Person::example_volunteer().email }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let ack: Acknowledgement =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(ack.success);

        let cookies = client.cookies();
        let cookie = cookies.get(AUTH_TOKEN_COOKIE).unwrap();
        let config = client.rocket().state::<Config>().unwrap();
        let token = AuthToken::from_cookie(&cookie, config).unwrap();
        assert_eq!(token.email, Person::example_volunteer().email);
    }

    #[backend_test]
    async fn issue_rejects_empty_email(client: Client) {
        let response = client
            .post(uri!(issue_token))
            .header(ContentType::JSON)
            .body(json!({ "email": "" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
    }

    #[backend_test(volunteer)]
    async fn logout_clears_cookie(client: Client) {
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());

        let response = client.get(uri!(logout)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let set_cookie = response.headers().get_one("Set-Cookie").unwrap().to_string();
        assert!(set_cookie.starts_with(&format!("{AUTH_TOKEN_COOKIE}=;")));
        assert!(set_cookie.contains("SameSite=Strict"));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Path=/"));
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));
    }

    #[backend_test]
    async fn logout_not_logged_in(client: Client) {
        let response = client.get(uri!(logout)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
    }
}
