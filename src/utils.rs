use url::form_urlencoded::byte_serialize;

/// Form-encodes a path segment or query value (space becomes `+`).
pub fn url_encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

pub fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
