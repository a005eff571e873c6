use rocket::Route;

/// Body of the liveness check.
pub const LIVENESS: &str = "careCrew server is available...";

pub fn routes() -> Vec<Route> {
    routes![index]
}

#[get("/")]
fn index() -> &'static str {
    LIVENESS
}
