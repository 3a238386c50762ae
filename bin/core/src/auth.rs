use anyhow::anyhow;
use axum::{
  extract::Request, http::HeaderMap, middleware::Next,
  response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use reqwest::StatusCode;
use serde::Deserialize;
use serror::AddStatusCodeError;
use warden_client::entities::config::{
  AuthConfig, SubjectExtractorMode,
};

use crate::{check, config::core_config, state};

/// The caller subject as extracted at the authentication boundary.
/// How the token was validated upstream is not the core's business.
#[derive(Clone)]
pub struct AuthedSubject(pub String);

pub enum SubjectExtractor {
  /// Trust a fronting proxy to pass the subject in a header.
  Header { header: String },
  /// Decode an HMAC signed bearer token and take its `sub` claim.
  Jwt {
    decoding_key: DecodingKey,
    validation: Validation,
  },
}

#[derive(Deserialize)]
struct JwtClaims {
  sub: String,
  #[allow(dead_code)]
  exp: usize,
}

impl SubjectExtractor {
  pub fn from_config(
    config: &AuthConfig,
  ) -> anyhow::Result<SubjectExtractor> {
    match config.mode {
      SubjectExtractorMode::Header => {
        if config.subject_header.is_empty() {
          return Err(anyhow!(
            "'config.auth.subject_header' must not be empty in header mode"
          ));
        }
        Ok(SubjectExtractor::Header {
          header: config.subject_header.clone(),
        })
      }
      SubjectExtractorMode::Jwt => {
        if config.jwt_secret.is_empty() {
          return Err(anyhow!(
            "'config.auth.jwt_secret' must be set in jwt mode"
          ));
        }
        Ok(SubjectExtractor::Jwt {
          decoding_key: DecodingKey::from_secret(
            config.jwt_secret.as_bytes(),
          ),
          validation: Validation::new(Algorithm::HS256),
        })
      }
    }
  }

  pub fn extract(
    &self,
    headers: &HeaderMap,
  ) -> serror::Result<String> {
    match self {
      SubjectExtractor::Header { header } => headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .filter(|subject| !subject.is_empty())
        .map(String::from)
        .ok_or_else(|| {
          anyhow!("request carries no subject header '{header}'")
            .status_code(StatusCode::UNAUTHORIZED)
        }),
      SubjectExtractor::Jwt {
        decoding_key,
        validation,
      } => {
        let token = headers
          .get("authorization")
          .and_then(|value| value.to_str().ok())
          .and_then(|value| value.strip_prefix("Bearer "))
          .ok_or_else(|| {
            anyhow!("request carries no bearer token")
              .status_code(StatusCode::UNAUTHORIZED)
          })?;
        let claims =
          decode::<JwtClaims>(token, decoding_key, validation)
            .map_err(|e| {
              anyhow::Error::from(e)
                .context("failed to decode token claims")
                .status_code(StatusCode::UNAUTHORIZED)
            })?
            .claims;
        Ok(claims.sub)
      }
    }
  }
}

pub async fn auth_request(
  mut req: Request,
  next: Next,
) -> Result<Response, serror::Error> {
  let subject =
    state::subject_extractor().extract(req.headers())?;
  req.extensions_mut().insert(AuthedSubject(subject));
  Ok(next.run(req).await)
}

/// Authorization interceptor on the API surface: when enforcement is
/// on, the caller must hold `permission` on `resource` per the check
/// engine. Super admin subjects bypass.
pub async fn authorize(
  subject: &str,
  permission: &str,
  resource: &str,
) -> serror::Result<()> {
  let config = core_config();
  if !config.enforce_authorization {
    return Ok(());
  }
  if config.super_admins.iter().any(|admin| admin == subject) {
    return Ok(());
  }
  let outcome = check::engine()
    .check_access(subject, permission, resource, &[], "authorize")
    .await?;
  if outcome.allowed {
    Ok(())
  } else {
    Err(
      anyhow!(
        "caller does not hold '{permission}' on '{resource}'"
      )
      .status_code(StatusCode::FORBIDDEN),
    )
  }
}
