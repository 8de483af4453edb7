//! Response mapper.
//!
//! Pure function from `(status, body, shape)` to either the decoded value or
//! an `Error`. It never performs I/O and keeps no state, so mapping the same
//! input twice yields the same result.

use serde_json::Value;

use crate::error::Error;
use crate::http::HttpResponse;
use crate::shape::TargetShape;

pub fn map_response<S: TargetShape>(status: u16, body: &str, shape: &S) -> Result<S::Output, Error> {
    if !(200..300).contains(&status) {
        return Err(api_error(status, body));
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::malformed(status, body, format_args!("body is not JSON ({e})")))?;
    shape.decode(value).map_err(|e| Error::decode(status, e))
}

/// [`map_response`] over a transport response.
pub fn map<S: TargetShape>(response: &HttpResponse, shape: &S) -> Result<S::Output, Error> {
    map_response(response.status, &response.body, shape)
}

/// Read the error envelope `{"object":"error","code":"...","message":"..."}`.
///
/// Fields are read individually: a `message` or `location` of the wrong type
/// is dropped rather than failing the whole envelope.
fn api_error(status: u16, body: &str) -> Error {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return Error::malformed(status, body, format_args!("error body is not JSON ({e})")),
    };
    let text = |field: &str| value.get(field).and_then(Value::as_str);

    match text("code") {
        Some("") => Error::malformed(status, body, "error body has an empty code"),
        Some(code) => Error::api(status, code, text("message").map(str::to_string))
            .with_location(text("location").map(str::to_string)),
        None if value.get("code").is_some_and(|code| !code.is_null()) => {
            Error::malformed(status, body, "error body code is not a string")
        }
        None => Error::malformed(status, body, "error body has no code"),
    }
}
