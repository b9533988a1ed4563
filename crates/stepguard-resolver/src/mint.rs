//! Domain qualification of new step text
//!
//! Minting embeds the domain into the description at a place that depends on
//! the step type:
//! - navigation: before "page"
//! - verification / assert: before "is displayed"
//! - interaction: after the first "the"
//! - anything else, or no anchor found: "for {domain}" appended

use stepguard_core::StepType;

/// Description with the domain embedded
///
/// Text that already names the domain is returned unchanged (whitespace
/// collapsed). An empty description yields a synthetic sentence for the type.
pub fn qualify(description: &str, domain: &str, step_type: &StepType) -> String {
    let mut words: Vec<String> = description.split_whitespace().map(str::to_string).collect();
    if words.is_empty() {
        return synthetic(domain, step_type);
    }

    let domain_words: Vec<&str> = domain.split_whitespace().collect();
    if find_phrase(&words, &domain_words).is_some() {
        return words.join(" ");
    }

    let anchor = match step_type {
        StepType::Navigation => find_phrase(&words, &["page"]),
        StepType::Verification | StepType::Assert => find_phrase(&words, &["is", "displayed"]),
        StepType::Interaction => find_phrase(&words, &["the"]).map(|i| i + 1),
        _ => None,
    };

    match anchor {
        Some(position) => {
            words.insert(position, domain.to_string());
            words.join(" ")
        }
        None => format!("{} for {}", words.join(" "), domain),
    }
}

/// Second-round text when the qualified form still collides
pub fn disambiguate(qualified: &str, domain: &str) -> String {
    format!("{} in {} context", qualified, domain)
}

fn synthetic(domain: &str, step_type: &StepType) -> String {
    match step_type {
        StepType::Given | StepType::Background => {
            format!("the user is on the {} page", domain)
        }
        StepType::Navigation => format!("the user navigates to the {} page", domain),
        StepType::Verification | StepType::Assert => format!("the {} page is displayed", domain),
        StepType::Interaction => format!("the user interacts with the {} page", domain),
        StepType::Other(kind) => format!("the user completes the {} {} step", domain, kind),
    }
}

/// Index of the first run of words equal to `phrase`, ignoring case and
/// surrounding punctuation
fn find_phrase(words: &[String], phrase: &[&str]) -> Option<usize> {
    if phrase.is_empty() || phrase.len() > words.len() {
        return None;
    }

    words.windows(phrase.len()).position(|window| {
        window
            .iter()
            .zip(phrase)
            .all(|(word, expected)| bare(word) == expected.to_lowercase())
    })
}

fn bare(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}
