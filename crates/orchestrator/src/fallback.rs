//! Deterministic canned replies used when no provider answers.

use crate::template::AgentTemplate;

/// Used when a template carries no default of its own.
pub const GENERIC_FALLBACK: &str =
    "Thanks for your message. We are unable to give a full answer right now, but a member of \
     the team will follow up soon.";

/// Pick the canned reply for `text`.
///
/// The rule with the most keyword hits wins and the earlier rule wins a tie.
/// With no hits the template default is used. Never empty.
pub fn fallback_response<'a>(template: &'a AgentTemplate, text: &str) -> &'a str {
    let lowered = text.to_lowercase();
    let mut best: Option<(&str, usize)> = None;

    for rule in &template.fallback_responses {
        let hits = rule
            .keywords
            .iter()
            .filter(|k| !k.is_empty() && lowered.contains(&k.to_lowercase()))
            .count();
        if hits == 0 || rule.response.trim().is_empty() {
            continue;
        }
        if best.map_or(true, |(_, top)| hits > top) {
            best = Some((rule.response.as_str(), hits));
        }
    }

    match best {
        Some((response, _)) => response,
        None if !template.default_fallback.trim().is_empty() => &template.default_fallback,
        None => GENERIC_FALLBACK,
    }
}
