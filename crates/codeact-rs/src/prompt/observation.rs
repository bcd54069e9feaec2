//! Observation formatting: bound the size of tool output before it enters the prompt.
//!
//! Long output is cut in the middle, keeping the head (usually the command
//! echo and the first errors) and the tail (usually the final status). Both
//! halves are measured in characters, never bytes, so multi-byte output is
//! never split inside a code point.

/// Default ceiling, in characters, for a single observation.
pub const DEFAULT_MAX_OBSERVATION_CHARS: usize = 10_000;

/// Line inserted between the kept head and tail.
pub const TRUNCATION_MARKER: &str = "\n[... Observation truncated due to length ...]\n";

/// Marker that identifies an inline base64 PNG in notebook output.
const INLINE_IMAGE_MARKER: &str = "![image](data:image/png;base64,";

/// Replacement for a line carrying an inline image.
pub const IMAGE_PLACEHOLDER: &str = "![image](data:image/png;base64, ...) already displayed to user";

/// Truncate the middle of `content` if it is longer than `max_chars`.
///
/// Output within the ceiling is returned unchanged. Otherwise the result is
/// the first `max_chars / 2` characters, [`TRUNCATION_MARKER`], and the last
/// `max_chars / 2` characters.
pub fn truncate_observation(content: &str, max_chars: usize) -> String {
    let total = content.chars().count();
    if total <= max_chars {
        return content.to_string();
    }
    let half = max_chars / 2;
    let head: String = content.chars().take(half).collect();
    let tail: String = content.chars().skip(total - half).collect();
    format!("{head}{TRUNCATION_MARKER}{tail}")
}

/// Replace every line that embeds a base64 image with [`IMAGE_PLACEHOLDER`].
pub fn redact_inline_images(content: &str) -> String {
    if !content.contains(INLINE_IMAGE_MARKER) {
        return content.to_string();
    }
    content
        .split('\n')
        .map(|line| {
            if line.contains(INLINE_IMAGE_MARKER) {
                IMAGE_PLACEHOLDER
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
