// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it and pulls cross-cutting pieces from here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to prompts that quote resume text, so the model does not embellish it.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Use ONLY facts present in the resume text. \
    Do NOT invent employers, titles, degrees, certifications, or years of experience.";

/// Keeps very long inputs inside the smaller providers' context windows.
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Fills `{name}` placeholders in one pass over `template`.
/// Substituted values are never rescanned, so user text containing `{company}` stays literal.
/// Braces that do not name a known placeholder are kept as-is.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let hit = vars.iter().find_map(|(key, value)| {
            after
                .strip_prefix(key)
                .and_then(|r| r.strip_prefix('}'))
                .map(|r| (*value, r))
        });
        match hit {
            Some((value, remainder)) => {
                out.push_str(value);
                rest = remainder;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_does_not_expand_inside_values() {
        let filled = fill_template(
            "RESUME: {resume_text}\nJOB: {job_title} at {company}",
            &[
                ("resume_text", "I admire {company} and {job_title}"),
                ("job_title", "SRE"),
                ("company", "Acme"),
            ],
        );
        assert_eq!(filled, "RESUME: I admire {company} and {job_title}\nJOB: SRE at Acme");
    }

    #[test]
    fn test_fill_template_keeps_unknown_braces() {
        let filled = fill_template("{\n  \"score\": 1 } {missing} {x}", &[("x", "y")]);
        assert_eq!(filled, "{\n  \"score\": 1 } {missing} y");
    }

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate_for_prompt("short", 100), "short");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(truncate_for_prompt(text, 4), "héll");
    }
}
