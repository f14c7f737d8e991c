//! File names for downloaded objects

use chrono::{DateTime, Utc};
use mime::Mime;
use rand::Rng;

/// Milliseconds between the Unix epoch and 2015-01-01T00:00:00Z
const EPOCH_OFFSET_MILLIS: i64 = 1_420_070_400_000;

/// Range the time component is multiplied by
const MULTIPLIER_MIN: u32 = 1_000_000;
const MULTIPLIER_MAX: u32 = 4_194_304;

/// Extension used when the content type maps to none
pub const UNKNOWN_EXTENSION: &str = "undefined";

/// First extension the mime database lists, for types where the subtype and
/// `mime_guess`'s alphabetical order both pick another one
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("text/plain", "txt"),
    ("application/octet-stream", "bin"),
    ("application/javascript", "js"),
    ("text/javascript", "js"),
    ("image/svg+xml", "svg"),
    ("audio/mpeg", "mpga"),
    ("video/quicktime", "qt"),
    ("application/msword", "doc"),
];

/// Generates a time-seeded, statistically unique numeric id
///
/// Not cryptographically secure and not guaranteed unique.
#[must_use]
pub fn unique_id() -> String {
    let multiplier = rand::thread_rng().gen_range(MULTIPLIER_MIN..=MULTIPLIER_MAX);
    unique_id_at(Utc::now(), multiplier)
}

fn unique_id_at(now: DateTime<Utc>, multiplier: u32) -> String {
    let elapsed = i128::from(now.timestamp_millis() - EPOCH_OFFSET_MILLIS);
    (elapsed * i128::from(multiplier)).to_string()
}

/// Derives a file extension from a `content-type` header value
///
/// Parameters such as `charset` are ignored. Missing, malformed or unknown
/// types yield [`UNKNOWN_EXTENSION`].
#[must_use]
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    content_type
        .and_then(|value| value.trim().parse::<Mime>().ok())
        .and_then(|mime| extension_for_mime(&mime))
        .unwrap_or(UNKNOWN_EXTENSION)
}

fn extension_for_mime(mime: &Mime) -> Option<&'static str> {
    let essence = mime.essence_str().to_ascii_lowercase();

    if let Some((_, ext)) = PREFERRED_EXTENSIONS.iter().find(|(ty, _)| *ty == essence) {
        return Some(*ext);
    }

    let extensions = mime_guess::get_mime_extensions_str(&essence)?;
    let subtype = mime.subtype().as_str();

    extensions
        .iter()
        .find(|ext| ext.eq_ignore_ascii_case(subtype))
        .or_else(|| extensions.first())
        .copied()
}

/// File name for a downloaded object: `<unique id>.<extension>`
#[must_use]
pub fn file_name_for(content_type: Option<&str>) -> String {
    format!("{}.{}", unique_id(), extension_for(content_type))
}
