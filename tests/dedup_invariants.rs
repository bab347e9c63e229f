use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};

use contact_pipeline::config::DedupConfig;
use contact_pipeline::domain::{EnrichedContact, FailureKind, RawContact};
use contact_pipeline::pipeline::processing::Deduplicator;

/// Small deterministic generator so the fixtures are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next() as usize) % items.len()]
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next() % 100 < percent
    }
}

fn generate(seed: u64, count: usize) -> Vec<EnrichedContact> {
    let emails = [
        Some("ana@example.com"),
        Some("ANA@example.com"),
        Some("ben@example.com"),
        Some("cleo@example.com"),
        Some("dev@example.com"),
        None,
    ];
    let names = [Some("Ana"), Some("Ben"), Some("Cleo"), Some("Sam"), None];
    let countries = ["France", "Spain", "Germany"];
    let dates: Vec<Option<DateTime<Utc>>> = vec![
        None,
        Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).single(),
        Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).single(),
        Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).single(),
        Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).single(),
    ];
    let industries = ["Retail", "Tech", "Retail;Tech", "Health"];

    let mut rng = Lcg(seed);
    (0..count)
        .map(|i| {
            let mut raw = RawContact::new(format!("c{}", i));
            raw.create_date = *rng.pick(&dates);
            if rng.chance(50) {
                raw.industry = Some(rng.pick(&industries).to_string());
            }
            if rng.chance(30) {
                raw.extra.insert("owner".into(), format!("owner{}", i));
            }
            let mut contact = EnrichedContact::unenriched(raw);
            contact.email = rng.pick(&emails).map(str::to_string);
            contact.display_name = rng.pick(&names).map(str::to_string);
            if rng.chance(50) {
                contact.country = Some(rng.pick(&countries).to_string());
                contact.city = Some(String::new());
            }
            if rng.chance(40) {
                contact.phone_international = Some(format!("(+33) 6 00 00 00 {:02}", i % 100));
            }
            contact
        })
        .collect()
}

fn populated_fields(contact: &EnrichedContact) -> Vec<(&'static str, Option<String>)> {
    vec![
        ("email", contact.email.clone()),
        ("display_name", contact.display_name.clone()),
        ("country", contact.country.clone()),
        ("city", contact.city.clone()),
        ("phone", contact.phone_international.clone()),
        ("industry", contact.raw.industry.clone()),
        ("create_date", contact.raw.create_date.map(|d| d.to_rfc3339())),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_some())
    .collect()
}

#[test]
fn dedup_invariants_hold_across_generated_batches() {
    for seed in 1..=25 {
        for backfill_across_names in [true, false] {
            let input = generate(seed, 40);
            let by_id: HashMap<String, EnrichedContact> =
                input.iter().map(|c| (c.id().to_string(), c.clone())).collect();
            let outcome = Deduplicator::new(DedupConfig { backfill_across_names }).deduplicate(input.clone());

            // At most one output record per email key
            let mut seen = HashSet::new();
            for canonical in &outcome.canonical {
                let key = canonical.contact.email_key().expect("canonical records carry an email");
                assert!(seen.insert(key.clone()), "seed {}: duplicate key {}", seed, key);
            }

            // Canonical create date is the group maximum
            for canonical in &outcome.canonical {
                let key = canonical.contact.email_key();
                let max = input
                    .iter()
                    .filter(|c| c.email_key() == key)
                    .map(|c| c.create_date())
                    .max()
                    .flatten();
                assert_eq!(canonical.contact.create_date(), max, "seed {}", seed);
            }

            // Backfill never overwrites what the canonical record already had
            for canonical in &outcome.canonical {
                let original = &by_id[canonical.contact.id()];
                let after: HashMap<_, _> = populated_fields(&canonical.contact).into_iter().collect();
                for (field, value) in populated_fields(original) {
                    assert_eq!(after.get(field), Some(&value), "seed {}: {} overwritten", seed, field);
                }
                for (name, value) in &original.raw.extra {
                    assert_eq!(canonical.contact.raw.extra.get(name), Some(value));
                }
            }

            // Every record is either folded into an output record or reported
            let mut accounted: HashSet<String> = outcome
                .canonical
                .iter()
                .flat_map(|c| c.member_ids.iter().cloned())
                .collect();
            for skipped in &outcome.skipped {
                assert_eq!(skipped.kind, FailureKind::MissingIdentity);
                accounted.insert(skipped.contact_id.clone());
            }
            assert_eq!(accounted.len(), by_id.len(), "seed {}", seed);

            // Industries are a duplicate-free set
            for canonical in &outcome.canonical {
                let unique: HashSet<_> = canonical.industries.iter().collect();
                assert_eq!(unique.len(), canonical.industries.len());
            }
        }
    }
}

#[test]
fn deduplicating_the_output_again_is_stable() {
    for seed in 1..=10 {
        let dedup = Deduplicator::new(DedupConfig::default());
        let first = dedup.deduplicate(generate(seed, 30));
        let again_input: Vec<EnrichedContact> = first
            .canonical
            .iter()
            .map(|c| {
                let mut contact = c.contact.clone();
                contact.raw.industry = c.industry();
                contact
            })
            .collect();
        let second = dedup.deduplicate(again_input.clone());

        assert!(second.merges.is_empty());
        assert_eq!(second.canonical.len(), first.canonical.len());
        for (before, after) in again_input.iter().zip(&second.canonical) {
            assert_eq!(&after.contact, before, "seed {}", seed);
        }
    }
}
