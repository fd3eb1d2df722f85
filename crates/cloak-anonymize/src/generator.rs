//! Replacement generator — type-appropriate synthetic values.
//!
//! Values are format-preserving where the original had structure (digit
//! counts, separators, URL scheme) and are guaranteed never to validate
//! as real instruments: synthetic cards fail Luhn, synthetic SSNs use the
//! never-issued 900 area, synthetic IBANs fail mod-97.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use cloak_core::Error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use cloak_detect::pii_engine::{iban_valid, luhn_valid};
use cloak_detect::EntityKind;
use cloak_resolve::EntityGroup;

const FIRST_NAMES: &[&str] = &[
    "Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Jamie", "Avery", "Peyton", "Quinn",
    "Rowan", "Skyler",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Lee", "Brown", "Garcia", "Martinez", "Davis", "Clark", "Lewis", "Walker",
    "Hayes", "Brooks",
];
const ORG_PREFIXES: &[&str] = &[
    "Apex", "Vertex", "Nimbus", "Quantum", "Pioneer", "Summit", "Cobalt", "Harbor", "Beacon",
    "Atlas",
];
const ORG_SUFFIXES: &[&str] = &[
    "Solutions", "Systems", "Industries", "Enterprises", "Group", "Technologies", "Holdings",
    "Partners", "Labs", "Networks",
];
const STREET_NAMES: &[&str] = &["Maple", "Cedar", "Oakwood", "Willow", "Juniper", "Birchwood"];
const STREET_SUFFIXES: &[&str] = &["Street", "Avenue", "Road", "Lane", "Way"];
const CITY_NAMES: &[&str] = &[
    "Springfield", "Riverton", "Fairview", "Lakewood", "Georgetown", "Ashford", "Brookside",
    "Milltown",
];

/// Generates one replacement value per entity group with a bounded
/// collision-retry budget. Seedable for deterministic output.
pub struct ReplacementGenerator {
    rng: StdRng,
    max_retries: usize,
    fallback_counters: HashMap<&'static str, usize>,
}

impl ReplacementGenerator {
    pub fn new(seed: Option<u64>, max_retries: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            max_retries,
            fallback_counters: HashMap::new(),
        }
    }

    /// Assign a replacement to every group.
    ///
    /// A candidate is rejected when it equals the group's canonical text,
    /// already appears verbatim in the document, or is assigned to another
    /// group. After the retry budget, a counter-suffixed label is used.
    pub fn assign(
        &mut self,
        document: &str,
        groups: &[EntityGroup],
    ) -> HashMap<String, String> {
        let mut mapping: HashMap<String, String> = HashMap::new();
        let mut used: HashSet<String> = HashSet::new();

        for group in groups {
            if mapping.contains_key(&group.canonical_text) {
                continue;
            }
            let replacement = self.generate_for(document, group, &used);
            used.insert(replacement.clone());
            mapping.insert(group.canonical_text.clone(), replacement);
        }

        mapping
    }

    fn generate_for(
        &mut self,
        document: &str,
        group: &EntityGroup,
        used: &HashSet<String>,
    ) -> String {
        for _ in 0..=self.max_retries {
            let candidate = self.synthesize(group.kind, &group.canonical_text);
            let collides = candidate == group.canonical_text
                || document.contains(&candidate)
                || used.contains(&candidate);
            if !collides {
                return candidate;
            }
        }
        warn!(
            "{}; using counter fallback",
            Error::ReplacementCollisionExceeded(group.kind.label().to_string())
        );
        self.fallback(document, group.kind, used)
    }

    /// Deterministic counter-suffixed fallback, advanced until free.
    fn fallback(
        &mut self,
        document: &str,
        kind: EntityKind,
        used: &HashSet<String>,
    ) -> String {
        let counter = self.fallback_counters.entry(kind.label()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}_{}", kind.label(), counter);
            if !document.contains(&candidate) && !used.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn synthesize(&mut self, kind: EntityKind, original: &str) -> String {
        match kind {
            EntityKind::PersonName => format!(
                "{} {}",
                self.pick(FIRST_NAMES),
                self.pick(LAST_NAMES)
            ),
            EntityKind::Org => format!(
                "{} {}",
                self.pick(ORG_PREFIXES),
                self.pick(ORG_SUFFIXES)
            ),
            EntityKind::Email => format!(
                "{}.{}{}@example.com",
                self.pick(FIRST_NAMES).to_lowercase(),
                self.pick(LAST_NAMES).to_lowercase(),
                self.rng.gen_range(10..100)
            ),
            EntityKind::Phone | EntityKind::IdNumber | EntityKind::Financial => {
                let mut value = self.reshuffle_digits(original);
                if kind == EntityKind::Financial && iban_valid(&value) {
                    value = flip_last_digit(&value);
                }
                value
            }
            EntityKind::Address => {
                let digits = original
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .count()
                    .max(1);
                let number: String = (0..digits)
                    .map(|i| {
                        let low = usize::from(i == 0);
                        char::from(b'0' + self.rng.gen_range(low..10) as u8)
                    })
                    .collect();
                format!(
                    "{} {} {}",
                    number,
                    self.pick(STREET_NAMES),
                    self.pick(STREET_SUFFIXES)
                )
            }
            EntityKind::Location => self.pick(CITY_NAMES).to_string(),
            EntityKind::Ip => format!("203.0.113.{}", self.rng.gen_range(1..255)),
            EntityKind::Url => {
                let scheme = if original.starts_with("http://") { "http" } else { "https" };
                format!("{}://site-{}.example", scheme, self.rng.gen_range(100..1000))
            }
            EntityKind::Date => self.synthesize_date(original),
            EntityKind::Time => self.synthesize_time(original),
            EntityKind::CreditCard => {
                let mut value = self.reshuffle_digits(original);
                let digits: Vec<u8> = value
                    .bytes()
                    .filter(u8::is_ascii_digit)
                    .map(|b| b - b'0')
                    .collect();
                if luhn_valid(&digits) {
                    value = flip_last_digit(&value);
                }
                value
            }
            EntityKind::Ssn => {
                // Force the never-issued 900+ area.
                let mut first = true;
                original
                    .chars()
                    .map(|c| {
                        if c.is_ascii_digit() {
                            if first {
                                first = false;
                                '9'
                            } else {
                                char::from(b'0' + self.rng.gen_range(0..10) as u8)
                            }
                        } else {
                            c
                        }
                    })
                    .collect()
            }
        }
    }

    /// Replace every digit with a random digit, keeping separators and
    /// length intact.
    fn reshuffle_digits(&mut self, original: &str) -> String {
        original
            .chars()
            .map(|c| {
                if c.is_ascii_digit() {
                    char::from(b'0' + self.rng.gen_range(0..10) as u8)
                } else {
                    c
                }
            })
            .collect()
    }

    fn synthesize_date(&mut self, original: &str) -> String {
        let year = self.rng.gen_range(1990..2035);
        let month = self.rng.gen_range(1..13);
        let day = self.rng.gen_range(1..29);
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default();

        if original.contains('/') {
            date.format("%-m/%-d/%Y").to_string()
        } else if original.chars().any(|c| c.is_ascii_alphabetic()) {
            date.format("%B %-d, %Y").to_string()
        } else {
            date.format("%Y-%m-%d").to_string()
        }
    }

    fn synthesize_time(&mut self, original: &str) -> String {
        let hour = self.rng.gen_range(1..13);
        let minute = self.rng.gen_range(0..60);
        let lower = original.to_lowercase();
        let meridiem = if lower.contains("pm") {
            Some(if original.contains("PM") { "PM" } else { "pm" })
        } else if lower.contains("am") {
            Some(if original.contains("AM") { "AM" } else { "am" })
        } else {
            None
        };

        match meridiem {
            Some(suffix) if original.contains(':') => {
                format!("{}:{:02} {}", hour, minute, suffix)
            }
            Some(suffix) => format!("{} {}", hour, suffix),
            None => format!("{}:{:02}", hour, minute),
        }
    }

    fn pick(&mut self, choices: &[&'static str]) -> &'static str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Nudge the last digit so a checksum that accidentally validated fails.
fn flip_last_digit(value: &str) -> String {
    let mut chars: Vec<char> = value.chars().collect();
    if let Some(pos) = chars.iter().rposition(char::is_ascii_digit) {
        let digit = chars[pos].to_digit(10).unwrap_or(0);
        chars[pos] = char::from_digit((digit + 1) % 10, 10).unwrap_or('0');
    }
    chars.into_iter().collect()
}
