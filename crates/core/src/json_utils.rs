//! JSON utility functions shared across crates.

/// Strip markdown code block wrappers from JSON content.
///
/// Handles `` ```json ... ``` ``, `` ``` ... ``` ``, and other language identifiers.
#[must_use]
pub fn strip_markdown_json(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.len() >= 6 && trimmed.starts_with("```") && trimmed.ends_with("```") {
        let without_prefix = trimmed.strip_prefix("```").unwrap_or(trimmed);
        let without_suffix = without_prefix.strip_suffix("```").unwrap_or(without_prefix);
        return without_suffix.split_once('\n').map_or_else(|| without_suffix.trim(), |(_, rest)| rest.trim());
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_block() {
        let input = "```json\n{\"message\": \"hi\"}\n```";
        assert_eq!(strip_markdown_json(input), "{\"message\": \"hi\"}");
    }

    #[test]
    fn test_strip_plain_block() {
        let input = "```\n{\"message\": \"hi\"}\n```";
        assert_eq!(strip_markdown_json(input), "{\"message\": \"hi\"}");
    }

    #[test]
    fn test_no_block() {
        let input = "  {\"message\": \"hi\"}  ";
        assert_eq!(strip_markdown_json(input), "{\"message\": \"hi\"}");
    }
}
