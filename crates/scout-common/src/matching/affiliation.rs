use crate::{keywords::Keywords, keywords::KeywordSet, CandidateRecord};

/// Prefix GitHub users put in the company field to reference an organization.
const AFFILIATION_MARKER: char = '@';

/// Case-insensitive substring match; absent or empty text never matches.
pub fn matches_region(text: Option<&str>, keywords: &KeywordSet) -> bool {
    match text {
        Some(text) => keywords.matches(text),
        None => false,
    }
}

pub fn is_corporate_affiliated(company: &str, bio: &str, corporate: &KeywordSet) -> bool {
    corporate.matches(&format!("{company} {bio}"))
}

/// The single independent-builder decision; filters and tests all go through here.
///
/// Branch order matters: a corporate hit always wins, and a non-empty company
/// that does not start with `@` is accepted even without an indie signal.
pub fn is_independent_builder(record: &CandidateRecord, keywords: &Keywords) -> bool {
    let company = record.company.trim();

    if is_corporate_affiliated(company, &record.bio, &keywords.corporate) {
        return false;
    }

    if company.is_empty() {
        return true;
    }

    if keywords.indie.matches(&format!("{} {}", record.bio, company)) {
        return true;
    }

    if !company.starts_with(AFFILIATION_MARKER) {
        return true;
    }

    false
}
