pub mod date;
pub mod parameter;
pub mod request;
pub mod response;

pub use parameter::check_parameter;
pub use request::{validate_query, validate_request, validate_request_body};
pub use response::{relax_required, validate_response};
