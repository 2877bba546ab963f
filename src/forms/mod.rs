//! Form decoding: request body (or query string) into string values, and
//! string values into typed fields.
//!
//! Field conversion never fails the request. A malformed value is logged and
//! replaced by the type's zero value so partially filled forms still decode;
//! semantic checks belong to each input's validation hook.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    body::to_bytes,
    extract::Request,
    http::header::CONTENT_TYPE,
};
use thiserror::Error;

/// Upper bound on a form body we are willing to buffer.
const MAX_FORM_BYTES: usize = 1024 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Error)]
pub enum FormError {
    #[error("reading request body: {0}")]
    Body(String),
    #[error("form body is not valid UTF-8")]
    Encoding,
}

/// Decoded form values. Like a browser form, a key may repeat; lookups return
/// the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    values: HashMap<String, Vec<String>>,
}

impl FormValues {
    pub fn parse(raw: &[u8]) -> Self {
        let mut form = FormValues::default();
        form.append_encoded(raw);
        form
    }

    fn append_encoded(&mut self, raw: &[u8]) {
        for (key, value) in url::form_urlencoded::parse(raw) {
            self.values
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|vs| vs.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed value for `key`; absent keys yield the zero value.
    pub fn value<T: FormField>(&self, key: &str) -> T {
        match self.get(key) {
            Some(raw) => convert_field(key, raw),
            None => T::default(),
        }
    }

    /// Typed optional value: `None` when the key is absent, otherwise the
    /// converted value (zero when malformed).
    pub fn optional<T: FormField>(&self, key: &str) -> Option<T> {
        self.get(key).map(|raw| convert_field(key, raw))
    }
}

/// A value that can be decoded from a single form field.
pub trait FormField: Default + Sized {
    const KIND: &'static str;

    fn parse_field(raw: &str) -> Result<Self, String>;
}

macro_rules! impl_form_field_from_str {
    ($($t:ty => $kind:literal),* $(,)?) => {
        $(
            impl FormField for $t {
                const KIND: &'static str = $kind;

                fn parse_field(raw: &str) -> Result<Self, String> {
                    <$t as FromStr>::from_str(raw.trim()).map_err(|e| e.to_string())
                }
            }
        )*
    };
}

impl_form_field_from_str! {
    i8 => "int8", i16 => "int16", i32 => "int32", i64 => "int64",
    u8 => "uint8", u16 => "uint16", u32 => "uint32", u64 => "uint64",
    f32 => "float32", f64 => "float64",
}

impl FormField for bool {
    const KIND: &'static str = "bool";

    fn parse_field(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" | "on" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" | "off" => Ok(false),
            other => Err(format!("invalid boolean {:?}", other)),
        }
    }
}

impl FormField for String {
    const KIND: &'static str = "string";

    fn parse_field(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

fn convert_field<T: FormField>(key: &str, raw: &str) -> T {
    match T::parse_field(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(field = key, kind = T::KIND, error = %err, "form field conversion failed, using zero value");
            T::default()
        }
    }
}

/// `string -> T`; malformed input yields the zero value.
pub fn parse_value<T: FormField>(raw: &str) -> T {
    convert_field("value", raw)
}

/// `string -> optional T`; malformed input yields `Some(zero)`.
pub fn parse_optional<T: FormField>(raw: &str) -> Option<T> {
    Some(convert_field("value", raw))
}

/// Reads the form out of a request. Body values take precedence over query
/// string values with the same key.
pub async fn extract_form_from_request(req: Request) -> Result<FormValues, FormError> {
    let (parts, body) = req.into_parts();

    let is_form_body = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with(FORM_CONTENT_TYPE))
        .unwrap_or(true);

    let mut form = FormValues::default();

    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| FormError::Body(e.to_string()))?;
    if is_form_body && !bytes.is_empty() {
        std::str::from_utf8(&bytes).map_err(|_| FormError::Encoding)?;
        form.append_encoded(&bytes);
    }

    if let Some(query) = parts.uri.query() {
        form.append_encoded(query.as_bytes());
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn assert_total<T: FormField + PartialEq + std::fmt::Debug>(good: &str, expected: T) {
        assert_eq!(parse_value::<T>(good), expected, "well-formed {}", T::KIND);
        assert_eq!(parse_value::<T>("not a number"), T::default(), "malformed {}", T::KIND);
        assert_eq!(parse_optional::<T>(good), Some(expected), "well-formed optional {}", T::KIND);
        assert_eq!(parse_optional::<T>("%%%"), Some(T::default()), "malformed optional {}", T::KIND);
    }

    #[test]
    fn conversion_is_total_for_every_supported_type() {
        assert_total::<bool>("true", true);
        assert_total::<i8>("-8", -8);
        assert_total::<i16>("-16", -16);
        assert_total::<i32>("-32", -32);
        assert_total::<i64>("-64", -64);
        assert_total::<u8>("8", 8);
        assert_total::<u16>("16", 16);
        assert_total::<u32>("32", 32);
        assert_total::<u64>("64", 64);
        assert_total::<f32>("3.5", 3.5);
        assert_total::<f64>("6.25", 6.25);
    }

    #[test]
    fn overflow_is_malformed() {
        assert_eq!(parse_value::<u8>("256"), 0);
        assert_eq!(parse_value::<i8>("-129"), 0);
        assert_eq!(parse_value::<u32>("-1"), 0);
    }

    #[test]
    fn checkbox_values_are_booleans() {
        assert!(parse_value::<bool>("on"));
        assert!(!parse_value::<bool>("off"));
        assert!(!parse_value::<bool>(""));
    }

    #[test]
    fn strings_pass_through() {
        assert_eq!(parse_value::<String>("  spaced  "), "  spaced  ");
    }

    #[test]
    fn form_values_lookup() {
        let form = FormValues::parse(b"name=salt&amount=12&amount=13&flag=on&empty=");
        assert_eq!(form.value::<String>("name"), "salt");
        assert_eq!(form.value::<u32>("amount"), 12);
        assert_eq!(form.get_all("amount"), ["12".to_string(), "13".to_string()]);
        assert!(form.value::<bool>("flag"));
        assert_eq!(form.value::<u64>("missing"), 0);
        assert_eq!(form.optional::<u64>("missing"), None);
        assert_eq!(form.optional::<u64>("empty"), Some(0));
        assert_eq!(form.optional::<u64>("amount"), Some(12));
    }

    #[tokio::test]
    async fn extracts_body_then_query() {
        let req = Request::builder()
            .method("POST")
            .uri("/things?name=fromquery&page=2")
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(Body::from("name=frombody&code=ABC"))
            .unwrap();

        let form = extract_form_from_request(req).await.unwrap();
        assert_eq!(form.get("name"), Some("frombody"));
        assert_eq!(form.get("code"), Some("ABC"));
        assert_eq!(form.get("page"), Some("2"));
    }

    #[tokio::test]
    async fn ignores_non_form_bodies() {
        let req = Request::builder()
            .method("POST")
            .uri("/things")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"x"}"#))
            .unwrap();

        let form = extract_form_from_request(req).await.unwrap();
        assert!(form.is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_utf8() {
        let req = Request::builder()
            .method("POST")
            .uri("/things")
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(Body::from(vec![0xff, 0xfe, b'=', b'x']))
            .unwrap();

        assert!(matches!(extract_form_from_request(req).await, Err(FormError::Encoding)));
    }
}
