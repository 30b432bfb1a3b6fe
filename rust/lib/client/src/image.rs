//! Image/binary field normalizer.
//!
//! Image fields arrive as an absolute URL, a `data:` URI, a bare base64
//! payload, or nothing at all. The output is always something an `<img>`
//! can render, and normalizing twice changes nothing.

/// Rendered when a record has no image (1x1 transparent PNG).
pub const PLACEHOLDER_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

const BASE64_PNG_PREFIX: &str = "data:image/png;base64,";

/// Normalize an image field value.
///
/// - empty or whitespace → [`PLACEHOLDER_IMAGE`]
/// - starts with `http` or `data:` (any case) → unchanged
/// - anything else is taken as raw base64 and prefixed as a PNG data URI
pub fn normalize_image(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return PLACEHOLDER_IMAGE.to_string();
    }
    if is_renderable(value) {
        return value.to_string();
    }
    format!("{BASE64_PNG_PREFIX}{value}")
}

/// True for an empty value or the placeholder: nothing worth sending back.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == PLACEHOLDER_IMAGE
}

fn is_renderable(value: &str) -> bool {
    starts_with_ignore_case(value, "http") || starts_with_ignore_case(value, "data:")
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_becomes_placeholder() {
        assert_eq!(normalize_image(""), PLACEHOLDER_IMAGE);
        assert_eq!(normalize_image("   \n"), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn urls_and_data_uris_pass_through() {
        assert_eq!(
            normalize_image("https://cdn.test/a.png"),
            "https://cdn.test/a.png"
        );
        assert_eq!(normalize_image("http://cdn.test/a.png"), "http://cdn.test/a.png");
        assert_eq!(normalize_image("HTTPS://CDN.TEST/A.PNG"), "HTTPS://CDN.TEST/A.PNG");
        assert_eq!(
            normalize_image("data:image/jpeg;base64,/9j/4AAQ"),
            "data:image/jpeg;base64,/9j/4AAQ"
        );
    }

    #[test]
    fn raw_base64_gets_png_prefix() {
        assert_eq!(
            normalize_image("iVBORw0KGgo="),
            "data:image/png;base64,iVBORw0KGgo="
        );
        // JPEG payloads start with a slash; still base64, not a path.
        assert_eq!(normalize_image("/9j/4AAQ"), "data:image/png;base64,/9j/4AAQ");
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder(""));
        assert!(is_placeholder(PLACEHOLDER_IMAGE));
        assert!(is_placeholder(&normalize_image("  ")));
        assert!(!is_placeholder("https://x"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "",
            " ",
            "http://x",
            "  https://x  ",
            "data:image/gif;base64,R0lGOD",
            "iVBORw0KGgo=",
            "/9j/4AAQ",
            " abc ",
            "é",
            "h",
            "dat",
            PLACEHOLDER_IMAGE,
        ];
        for input in inputs {
            let once = normalize_image(input);
            assert_eq!(normalize_image(&once), once, "input {input:?}");
        }
    }
}
