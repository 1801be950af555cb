use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;

/// An error that knows how it is presented to the client.
pub trait ResponseError: std::error::Error + Send + Sync {
    fn status_code(&self) -> StatusCode;

    /// Message shown to the client. Never includes the error's source chain.
    fn public_message(&self) -> String;

    /// Itemized problems the client can correct.
    fn errors(&self) -> Option<Vec<String>> {
        None
    }
}

#[derive(Debug)]
pub struct Error {
    reason: Box<dyn ResponseError>,
}

impl<T: ResponseError + 'static> From<T> for Error {
    fn from(e: T) -> Self {
        Error {
            reason: Box::new(e),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.reason.status_code();
        let causes = {
            let mut causes = vec![self.reason.to_string()];

            let mut current = self.reason.source();
            while let Some(reason) = current {
                causes.push(format!("{}", reason));
                current = reason.source();
            }

            causes
        };

        if status_code.is_server_error() {
            tracing::error!(causes = ?causes, status_code = %status_code, "response failed");
        } else {
            tracing::info!(causes = ?causes, status_code = %status_code, "request rejected");
        }

        #[derive(Serialize)]
        struct Response {
            success: bool,
            message: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            errors: Option<Vec<String>>,
        }

        (
            status_code,
            Json(Response {
                success: false,
                message: self.reason.public_message(),
                errors: self.reason.errors(),
            }),
        )
            .into_response()
    }
}
