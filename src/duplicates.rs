//! Duplicate-recipient detection within one batch.

use serde::Serialize;
use sms_core::is_phone_separator;
use std::collections::HashSet;

/// Canonical form used to compare recipients: separators and `+` removed.
pub fn canonicalize(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !is_phone_separator(*c) && *c != '+')
        .collect()
}

/// Canonical forms that occur more than once, each reported once.
pub fn find_duplicates<S: AsRef<str>>(phones: &[S]) -> HashSet<String> {
    let mut seen = HashSet::with_capacity(phones.len());
    let mut duplicates = HashSet::new();
    for phone in phones {
        let canonical = canonicalize(phone.as_ref());
        if !seen.insert(canonical.clone()) {
            duplicates.insert(canonical);
        }
    }
    duplicates
}

/// Raw inputs split by whether their canonical form was already seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhonePartition {
    pub first_seen: Vec<String>,
    pub duplicates: Vec<String>,
}

pub fn partition<S: AsRef<str>>(phones: &[S]) -> PhonePartition {
    let mut seen = HashSet::with_capacity(phones.len());
    let mut out = PhonePartition::default();
    for phone in phones {
        let raw = phone.as_ref();
        if seen.insert(canonicalize(raw)) {
            out.first_seen.push(raw.to_string());
        } else {
            out.duplicates.push(raw.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_differences_are_duplicates() {
        let dups = find_duplicates(&["+1 555-1234", "15551234", "+1-555-5678"]);
        assert_eq!(dups.len(), 1);
        assert!(dups.contains(&canonicalize("+15551234")));
        assert!(dups.contains("15551234"));
    }

    #[test]
    fn each_duplicate_is_reported_once() {
        let dups = find_duplicates(&["(555) 000.1111", "5550001111", "555 000 1111", "555-000-1111"]);
        assert_eq!(dups, HashSet::from(["5550001111".to_string()]));
    }

    #[test]
    fn unique_batch_has_no_duplicates() {
        let phones: Vec<String> = (0..50).map(|i| format!("+1555000{:04}", i)).collect();
        assert!(find_duplicates(&phones).is_empty());
        assert!(find_duplicates::<&str>(&[]).is_empty());
    }

    #[test]
    fn partition_keeps_input_order() {
        let split = partition(&["555-1234", "555 9999", "5551234", "(555)9999", "5550000"]);
        assert_eq!(split.first_seen, vec!["555-1234", "555 9999", "5550000"]);
        assert_eq!(split.duplicates, vec!["5551234", "(555)9999"]);
    }
}
