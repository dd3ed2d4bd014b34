pub mod api;
pub mod mapper;
pub mod model;

pub use api::Error;

/// Build a credential set for one inverter.
pub fn credentials(
    token_id: String,
    serial_number: String,
    api_base_url: Option<String>,
) -> model::Credentials {
    model::Credentials {
        token_id,
        serial_number,
        api_base_url,
    }
}
