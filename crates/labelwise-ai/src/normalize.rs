/// Clean raw issue text before vectorization: missing text becomes empty,
/// otherwise lower-case and trim surrounding whitespace.
pub fn normalize(text: Option<&str>) -> String {
    match text {
        None => String::new(),
        Some(t) => t.to_lowercase().trim().to_string(),
    }
}
