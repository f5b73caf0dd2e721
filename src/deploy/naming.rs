use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("sanitizer regex is valid"));

/// Identifier for one image and channel pair, safe to use as a directory name
/// and as a container name.
pub fn deployment_name(image: &str, channel: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(&format!("{image}-{channel}"), "-")
        .into_owned()
}

/// `[registry/]image@digest`. The registry separator is only present when a
/// registry is set.
pub fn image_specifier(registry: Option<&str>, image: &str, digest: &str) -> String {
    match registry.filter(|r| !r.is_empty()) {
        Some(registry) => format!("{registry}/{image}@{digest}"),
        None => format!("{image}@{digest}"),
    }
}
