use axum::response::IntoResponse;
use serde::Serialize;

/// Type erased JSON response the request resolver enums convert
/// their typed responses into.
pub struct Response(pub axum::response::Response);

impl<T: Serialize> From<T> for Response {
  fn from(value: T) -> Response {
    match serde_json::to_string(&value) {
      Ok(body) => Response(
        (
          [(
            axum::http::header::CONTENT_TYPE,
            "application/json",
          )],
          body,
        )
          .into_response(),
      ),
      Err(e) => {
        let error: serror::Error = anyhow::Error::from(e)
          .context("failed to serialize response body")
          .into();
        Response(error.into_response())
      }
    }
  }
}
