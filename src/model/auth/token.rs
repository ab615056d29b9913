use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{
    errors::Error as JwtError, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use rocket::{
    http::{Cookie, SameSite, Status},
    outcome::{try_outcome, IntoOutcome},
    request::{self, FromRequest},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;
use crate::Config;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token identifying a signed-in user.
///
/// Tokens are issued by the accounts service; this server only verifies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    id: Id,
}

impl AuthToken {
    pub fn new(id: Id) -> Self {
        Self { id }
    }

    /// Get the user ID.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Sign this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>, JwtError> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;

        Ok(Cookie::build((AUTH_TOKEN_COOKIE, token))
            .max_age(rocket::time::Duration::seconds(
                config.auth_ttl().num_seconds(),
            ))
            .same_site(SameSite::Strict)
            .build())
    }

    /// Verify and decode a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, JwtError> {
        jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = JwtError;

    /// Get an AuthToken from the cookie, rejecting forged or expired tokens.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config = req.guard::<&State<Config>>().await.unwrap(); // Valid as `Config` is always managed

        let cookie = try_outcome!(req
            .cookies()
            .get(AUTH_TOKEN_COOKIE)
            .or_forward(Status::Unauthorized));
        Self::from_cookie(cookie, config).or_error(Status::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_through_cookie() {
        let config = Config::example();
        let token = AuthToken::new(Id::new());

        let cookie = token.into_cookie(&config).unwrap();
        assert_eq!(cookie.name(), AUTH_TOKEN_COOKIE);
        assert_eq!(AuthToken::from_cookie(&cookie, &config).unwrap(), token);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let cookie = AuthToken::new(Id::new())
            .into_cookie(&Config::example())
            .unwrap();
        assert!(AuthToken::from_cookie(&cookie, &Config::example_with_secret("other")).is_err());
    }
}
