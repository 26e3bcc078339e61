//! A JSON extractor and response wrapper that reports errors in the API's error format.

use axum::{
    extract::FromRequest,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// Same as [axum::Json], but a body that cannot be parsed is rejected with
/// an [Error::InvalidRequestBody] so the client gets a JSON error body.
#[derive(FromRequest, Debug)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

impl<T> IntoResponse for ApiJson<T>
where
    axum::Json<T>: IntoResponse,
    T: Serialize,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
