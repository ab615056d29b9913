#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;

#[cfg(test)]
mod test_utils;

pub use config::Config;

use config::{ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;

/// Assemble the server. Configuration and the database connection are
/// loaded when the returned instance is ignited.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
}

/// Connect to the database configured by `db_uri`.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .unwrap_or_else(|e| panic!("Could not connect to database with `db_uri` {db_uri:?}: {e}"))
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    log::info!("Using database {db}");
    db
}

/// Build a server instance backed by the given database, with config
/// already in managed state.
#[cfg(test)]
pub(crate) async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let rocket = rocket::build();
    let config = rocket
        .figment()
        .extract::<Config>()
        .expect("Invalid test config");
    let db = client.database(db_name);
    let service_config = config.service_config();

    config::manage_database(rocket.manage(config), client, db, service_config)
        .await
        .unwrap_or_else(|(_, e)| panic!("Failed to prepare test database: {e}"))
        .attach(LoggerFairing)
        .mount("/", api::routes())
}
