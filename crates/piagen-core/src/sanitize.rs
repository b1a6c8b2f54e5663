/// Convert a region label into a filename and URL safe slug
///
/// Lower-cases, turns spaces into hyphens, drops anything that is neither
/// alphanumeric nor a hyphen, then collapses hyphen runs and trims hyphens
/// from both ends. May return an empty string.
///
/// # Example
/// ```
/// use piagen_core::sanitize;
///
/// assert_eq!(sanitize("US East"), "us-east");
/// assert_eq!(sanitize("IT Streaming Optimized"), "it-streaming-optimized");
/// assert_eq!(sanitize("!!!"), "");
/// ```
pub fn sanitize(label: &str) -> String {
    let cleaned: String = label
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' { '-' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();

    cleaned
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
