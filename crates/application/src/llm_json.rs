//! Pull JSON out of LLM replies that wrap it in prose or code fences

/// Extract JSON from potentially markdown-wrapped response
pub(crate) fn extract_json(response: &str) -> &str {
    let response = response.trim();

    if let Some(start) = response.find("```json") {
        if let Some(end) = response[start + 7..].find("```") {
            return response[start + 7..start + 7 + end].trim();
        }
    }

    if let Some(start) = response.find("```") {
        if let Some(end) = response[start + 3..].find("```") {
            return response[start + 3..start + 3 + end].trim();
        }
    }

    // Outermost object or array, whichever opens first
    let open = response.find(['{', '[']);
    if let Some(start) = open {
        let close = if response[start..].starts_with('{') { '}' } else { ']' };
        if let Some(end) = response.rfind(close) {
            if start <= end {
                return &response[start..=end];
            }
        }
    }

    response
}
