pub mod http;

/// Truncate a string to max length, adding suffix if truncated.
pub fn truncate_string(s: &str, max_len: usize, suffix: &str) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(suffix.len());
    // Ensure we don't split a multi-byte UTF-8 character
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &s[..end], suffix)
}

/// Abbreviated `key=value` rendering of tool arguments for log lines.
pub fn format_tool_args(args: &std::collections::HashMap<String, serde_json::Value>) -> String {
    if args.is_empty() {
        return String::new();
    }

    let mut keys: Vec<_> = args.keys().collect();
    keys.sort();

    let mut parts = Vec::new();
    for key in keys.iter().take(3) {
        let value_str = match &args[*key] {
            serde_json::Value::String(s) => format!("\"{}\"", truncate_string(s, 50, "...")),
            serde_json::Value::Array(a) => format!("[{} items]", a.len()),
            serde_json::Value::Object(o) => format!("{{{} fields}}", o.len()),
            other => other.to_string(),
        };
        parts.push(format!("{key}={value_str}"));
    }

    if args.len() > 3 {
        parts.push(format!("...+{} more", args.len() - 3));
    }

    parts.join(", ")
}
