use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::io::Cursor;

#[derive(Debug, Clone)]
pub enum Error {
    /// Credentials rejected by the API. Not retryable within a fetch call.
    AuthError(String),
    /// Transport failure, timeout or non-2xx status at an endpoint.
    ConnectionError(String),
    /// Body unparseable or structurally unexpected.
    InvalidResponse(String),
    /// Server-reported failure whose message did not match the auth heuristic.
    ApiError(String),
    FormatError,
    InternalError,
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Error::AuthError(s) => {
                let error = format!("<html><body><h3>403 Forbidden</h3>Error while authenticating to SolaX Cloud API: <code>{}</code></body></html>", s);
                Response::build()
                    .status(Status::Forbidden)
                    .sized_body(error.len(), Cursor::new(error))
                    .header(ContentType::new("text", "html"))
                    .ok()
            }
            Error::ConnectionError(s) | Error::InvalidResponse(s) => {
                let error = format!("<html><body><h3>502 Bad Gateway</h3>SolaX Cloud API unavailable: <code>{}</code></body></html>", s);
                Response::build()
                    .status(Status::BadGateway)
                    .sized_body(error.len(), Cursor::new(error))
                    .header(ContentType::new("text", "html"))
                    .ok()
            }
            _ => {
                let error = format!(
                    "<html><body><h3>Unknown exception</h3><code>{:?}</code></body></html>",
                    self
                );
                Response::build()
                    .status(Status::InternalServerError)
                    .sized_body(error.len(), Cursor::new(error))
                    .header(ContentType::new("text", "html"))
                    .ok()
            }
        }
    }
}
