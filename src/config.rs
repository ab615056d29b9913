use std::time::Duration as StdDuration;

use chrono::Duration;
use log::{error, info};
use mongodb::{Client as MongoClient, Database};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::mongodb::ensure_indexes_exist;
use crate::service::{PollService, ServiceConfig};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    #[serde(default)]
    storage_timeout: Option<u64>,
    #[serde(default = "default_resolve_attempts")]
    resolve_attempts: u32,
    // secrets
    jwt_secret: String,
}

fn default_resolve_attempts() -> u32 {
    ServiceConfig::default().resolve_attempts
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to verify JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Deadline for each individual storage call, if any.
    pub fn storage_timeout(&self) -> Option<StdDuration> {
        self.storage_timeout.map(StdDuration::from_millis)
    }

    /// Settings for the poll service.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            storage_timeout: self.storage_timeout(),
            resolve_attempts: self.resolve_attempts,
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// ensures the indexes exist, and places a `Client`, a `Database` and the
/// `PollService` built on them into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let service_config = match rocket.state::<Config>() {
            Some(config) => config.service_config(),
            None => {
                error!("Application config must be loaded before the database");
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(DATABASE);

        match manage_database(rocket, client, db, service_config).await {
            Ok(rocket) => {
                info!("...database connection online!");
                Ok(rocket)
            }
            Err((rocket, e)) => {
                error!("Failed to prepare database: {e}");
                Err(rocket)
            }
        }
    }
}

/// Name of the production database.
const DATABASE: &str = "polls";

/// Prepare the database and put it, its client, and the poll service into managed state.
pub(crate) async fn manage_database(
    rocket: Rocket<Build>,
    client: MongoClient,
    db: Database,
    service_config: ServiceConfig,
) -> Result<Rocket<Build>, (Rocket<Build>, mongodb::error::Error)> {
    if let Err(e) = ensure_indexes_exist(&db).await {
        return Err((rocket, e));
    }
    let service = PollService::from_db(&db, service_config);
    Ok(rocket.manage(client).manage(db).manage(service))
}
