use ammonia;

/// Clean grader feedback with the ammonia whitelist sanitizer.
///
/// Safe formatting tags (like <b>, <p>) survive; <script>, <iframe> and
/// event-handler attributes are stripped. Feedback is rendered to students,
/// so it is cleaned before it is stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Cleans optional feedback and drops it entirely when nothing is left.
pub fn clean_feedback(input: Option<&str>) -> Option<String> {
    input
        .map(clean_html)
        .map(|cleaned| cleaned.trim().to_string())
        .filter(|cleaned| !cleaned.is_empty())
}
