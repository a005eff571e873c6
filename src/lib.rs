#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

/// Assemble the server: logging, configuration, the database connection,
/// every route and the JSON catchers.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// A server bound to the named database on the given client, for tests.
#[cfg(test)]
async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    crate::model::mongodb::ensure_indexes_exist(&db)
        .await
        .unwrap();
    rocket::build()
        .attach(ConfigFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
        .manage(client)
        .manage(db)
}

/// A client connected to the configured database server, for tests.
#[cfg(test)]
async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .unwrap();
    mongodb::Client::with_uri_str(db_uri).await.unwrap()
}

/// A fresh database name, so tests never share state.
#[cfg(test)]
fn database() -> String {
    format!("test{}", rand::random::<u32>())
}
