//! CDN URL cleanup
//!
//! Media and profile picture URLs carry signature and tracking parameters
//! that change on every request while the asset stays the same. Removing
//! them keeps the column stable across runs.

use crate::error::Result;
use crate::types::JsonObject;
use tracing::debug;
use url::Url;

/// Record fields that hold CDN URLs
pub const URL_FIELDS: [&str; 3] = ["media_url", "thumbnail_url", "profile_picture_url"];

/// Remove the named query keys from `url`.
///
/// Other parameters keep their order and exact encoding; scheme, host and
/// path are untouched. A URL without any of the keys is returned as is.
/// Removing every parameter leaves an empty query (`...?`), not a missing one.
pub fn strip_params<S: AsRef<str>>(url: &str, blocked_keys: &[S]) -> Result<String> {
    let mut parsed = Url::parse(url)?;
    let Some(query) = parsed.query() else {
        return Ok(url.to_string());
    };

    let pairs: Vec<&str> = query.split('&').collect();
    let kept: Vec<&str> = pairs
        .iter()
        .copied()
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            !blocked_keys.iter().any(|b| b.as_ref() == key)
        })
        .collect();

    if kept.len() == pairs.len() {
        return Ok(url.to_string());
    }

    let kept = kept.join("&");
    parsed.set_query(Some(&kept));
    Ok(parsed.into())
}

/// Strip params from every URL field present in `record`.
///
/// Values that are not absolute URLs are left as they are.
pub fn clean_record_urls<S: AsRef<str>>(record: &mut JsonObject, blocked_keys: &[S]) {
    for field in URL_FIELDS {
        let Some(url) = record.get(field).and_then(|v| v.as_str()) else {
            continue;
        };
        match strip_params(url, blocked_keys) {
            Ok(cleaned) => {
                record.insert(field.to_string(), cleaned.into());
            }
            Err(e) => debug!(field, url, "Leaving unparseable URL untouched: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_single_param() {
        assert_eq!(
            strip_params("https://x/y?a=1&_nc_sid=2&b=3", &["_nc_sid"]).unwrap(),
            "https://x/y?a=1&b=3"
        );
    }

    #[test]
    fn test_missing_key_leaves_url_unchanged() {
        let url = "https://x/y?a=1&b=3";
        assert_eq!(strip_params(url, &["oh"]).unwrap(), url);

        let url = "https://scontent.cdninstagram.com/v/t51.jpg";
        assert_eq!(strip_params(url, &["oh"]).unwrap(), url);
    }

    #[test]
    fn test_strip_all_keeps_empty_query() {
        assert_eq!(
            strip_params("https://x/y?oh=1&oe=2", &["oh", "oe"]).unwrap(),
            "https://x/y?"
        );
    }

    #[test]
    fn test_keeps_encoding_and_order_of_other_params() {
        assert_eq!(
            strip_params(
                "https://cdn.example.com/a/b.jpg?z=%2F1&_nc_ohc=abc&stp=dst-jpg_e35&oe=65A1",
                &["_nc_ohc", "oe"]
            )
            .unwrap(),
            "https://cdn.example.com/a/b.jpg?z=%2F1&stp=dst-jpg_e35"
        );
    }

    #[test]
    fn test_param_without_value() {
        assert_eq!(
            strip_params("https://x/y?flag&a=1", &["flag"]).unwrap(),
            "https://x/y?a=1"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(strip_params("not a url", &["oh"]).is_err());
    }

    #[test]
    fn test_clean_record_urls() {
        let mut record = json!({
            "id": "1",
            "media_url": "https://x/m.jpg?a=1&oh=2",
            "profile_picture_url": "https://x/p.jpg?oe=3",
            "permalink": "https://www.instagram.com/p/abc/?oh=keep"
        })
        .as_object()
        .cloned()
        .unwrap();

        clean_record_urls(&mut record, &["oh", "oe"]);

        assert_eq!(record["media_url"], "https://x/m.jpg?a=1");
        assert_eq!(record["profile_picture_url"], "https://x/p.jpg?");
        assert_eq!(record["permalink"], "https://www.instagram.com/p/abc/?oh=keep");
    }

    #[test]
    fn test_clean_record_urls_keeps_unparseable_values() {
        let mut record = json!({
            "profile_picture_url": "",
            "thumbnail_url": "/relative/t.jpg?oh=1",
            "media_url": "https://x/m.jpg?oh=2"
        })
        .as_object()
        .cloned()
        .unwrap();

        clean_record_urls(&mut record, &["oh"]);

        assert_eq!(record["profile_picture_url"], "");
        assert_eq!(record["thumbnail_url"], "/relative/t.jpg?oh=1");
        assert_eq!(record["media_url"], "https://x/m.jpg?");
    }
}
