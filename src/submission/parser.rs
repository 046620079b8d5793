use axum::http::HeaderMap;

use super::record::{Answer, RawSubmission};

/// Parse a request body into a [`RawSubmission`] based on its Content-Type.
///
/// Multipart bodies are handled by [`parse_multipart`]; this returns
/// `Err("multipart")` for them so callers can dispatch.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<RawSubmission, String> {
    let ct = content_type.unwrap_or("application/json");

    if ct.contains("application/json") {
        parse_json(body)
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else if ct.contains("multipart/form-data") {
        Err("multipart".to_string())
    } else {
        parse_json(body)
            .or_else(|_| parse_form_urlencoded(body))
            .map_err(|e| format!("Unable to parse body: {e}"))
    }
}

fn parse_json(body: &[u8]) -> Result<RawSubmission, String> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;
    RawSubmission::from_json(&value)
}

/// Repeated keys become a multi-select answer, in the order they appear.
fn parse_form_urlencoded(body: &[u8]) -> Result<RawSubmission, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    let mut pairs: Vec<(String, Vec<String>)> = Vec::new();
    for (k, v) in form_urlencoded::parse(body_str.as_bytes()) {
        push_pair(&mut pairs, k.into_owned(), v.into_owned());
    }
    Ok(collect(pairs))
}

pub async fn parse_multipart(headers: &HeaderMap, body: bytes::Bytes) -> Result<RawSubmission, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut pairs: Vec<(String, Vec<String>)> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        push_pair(&mut pairs, name, value);
    }

    Ok(collect(pairs))
}

fn push_pair(pairs: &mut Vec<(String, Vec<String>)>, key: String, value: String) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some((_, values)) => values.push(value),
        None => pairs.push((key, vec![value])),
    }
}

fn collect(pairs: Vec<(String, Vec<String>)>) -> RawSubmission {
    let mut raw = RawSubmission::new();
    for (label, mut values) in pairs {
        let answer = if values.len() == 1 {
            Answer::Text(values.remove(0))
        } else {
            Answer::Choices(values)
        };
        raw.push(label, answer);
    }
    raw
}
