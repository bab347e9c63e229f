//! Deduplication of enriched contacts.
//!
//! Records are grouped by lower-cased email. The newest record of a group
//! (by create date) is canonical and absent fields are backfilled from the
//! records it superseded. Display names only feed backfill:
//!
//! * a record with a name but no email donates to the group carrying that
//!   name, or seeds a name-only group that waits for one;
//! * a name-only group is absorbed once an email group with its name shows up;
//! * email groups whose canonicals share a name stay separate, but once
//!   grouping is done the newest canonical is backfilled from the others when
//!   `backfill_across_names` is set.
//!
//! Name-only groups never reach the output.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::config::DedupConfig;
use crate::constants::INDUSTRY_SEPARATOR;
use crate::domain::{EnrichedContact, FailureKind, RecordFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeKey {
    Email(String),
    Name(String),
}

impl fmt::Display for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeKey::Email(key) => write!(f, "email:{}", key),
            MergeKey::Name(key) => write!(f, "name:{}", key),
        }
    }
}

/// One record folded into another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRecord {
    pub kept_id: String,
    pub merged_id: String,
    pub key: MergeKey,
    pub fields_backfilled: usize,
}

#[derive(Debug, Clone)]
pub struct CanonicalContact {
    pub contact: EnrichedContact,
    /// First-seen order, no duplicates
    pub industries: Vec<String>,
    /// Every record folded into this one, canonical included
    pub member_ids: Vec<String>,
}

impl CanonicalContact {
    pub fn industry(&self) -> Option<String> {
        if self.industries.is_empty() {
            None
        } else {
            Some(self.industries.join(&INDUSTRY_SEPARATOR.to_string()))
        }
    }
}

#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub canonical: Vec<CanonicalContact>,
    pub merges: Vec<MergeRecord>,
    pub skipped: Vec<RecordFailure>,
}

#[derive(Debug)]
struct Group {
    canonical: EnrichedContact,
    email_keyed: bool,
    industries: Vec<String>,
    member_ids: Vec<String>,
}

impl Group {
    fn seed(record: EnrichedContact, email_keyed: bool) -> Self {
        let mut group = Self {
            member_ids: vec![record.id().to_string()],
            industries: Vec::new(),
            canonical: record,
            email_keyed,
        };
        let industry = group.canonical.raw.industry.clone();
        group.add_industries(industry.as_deref());
        group
    }

    fn add_industries(&mut self, industry: Option<&str>) {
        for item in split_industries(industry) {
            if !self.industries.contains(&item) {
                self.industries.push(item);
            }
        }
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        self.canonical.create_date()
    }
}

fn split_industries(industry: Option<&str>) -> Vec<String> {
    industry
        .map(|value| {
            value
                .split(INDUSTRY_SEPARATOR)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub struct Deduplicator {
    config: DedupConfig,
}

impl Deduplicator {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    pub fn deduplicate(&self, records: Vec<EnrichedContact>) -> DedupOutcome {
        let mut table = GroupTable::new(self.config.backfill_across_names);
        for record in records {
            table.insert(record);
        }
        table.finish()
    }
}

#[derive(Default)]
struct GroupTable {
    groups: Vec<Option<Group>>,
    by_email: HashMap<String, usize>,
    /// Receives name-only donors: the first group to claim a name
    by_name: HashMap<String, usize>,
    backfill_across_names: bool,
    merges: Vec<MergeRecord>,
    skipped: Vec<RecordFailure>,
}

impl GroupTable {
    fn new(backfill_across_names: bool) -> Self {
        Self {
            backfill_across_names,
            ..Self::default()
        }
    }

    fn insert(&mut self, record: EnrichedContact) {
        let email_key = record.email_key();
        let name_key = record.name_key();

        match (email_key, name_key) {
            (None, None) => {
                warn!(contact_id = %record.id(), "No email or display name, dropping record");
                self.skipped.push(RecordFailure::new(
                    record.id(),
                    FailureKind::MissingIdentity,
                    "neither an email nor a display name could be extracted",
                ));
            }
            (Some(email), name) => {
                if name.is_none() {
                    warn!(contact_id = %record.id(), "No display name, grouping by email only");
                }
                let index = self.insert_by_email(email, record);
                if let Some(name) = name {
                    self.link_name(name, index);
                }
            }
            (None, Some(name)) => self.insert_name_only(name, record),
        }
    }

    fn live(&mut self, index: usize) -> Option<&mut Group> {
        self.groups.get_mut(index).and_then(Option::as_mut)
    }

    fn push(&mut self, group: Group) -> usize {
        self.groups.push(Some(group));
        self.groups.len() - 1
    }

    fn insert_by_email(&mut self, email: String, record: EnrichedContact) -> usize {
        let existing = self.by_email.get(&email).copied();
        let group = match existing {
            Some(index) => self.live(index).map(|group| (index, group)),
            None => None,
        };

        let (index, group) = match group {
            Some(found) => found,
            None => {
                let index = self.push(Group::seed(record, true));
                self.by_email.insert(email, index);
                return index;
            }
        };

        let merged_id = record.id().to_string();
        group.member_ids.push(merged_id.clone());
        group.add_industries(record.raw.industry.as_deref());

        let merge = if record.create_date() > group.created() {
            let previous = std::mem::replace(&mut group.canonical, record);
            let fields_backfilled = group.canonical.backfill_from(&previous);
            MergeRecord {
                kept_id: group.canonical.id().to_string(),
                merged_id: previous.id().to_string(),
                key: MergeKey::Email(email),
                fields_backfilled,
            }
        } else {
            let fields_backfilled = group.canonical.backfill_from(&record);
            MergeRecord {
                kept_id: group.canonical.id().to_string(),
                merged_id,
                key: MergeKey::Email(email),
                fields_backfilled,
            }
        };
        debug!(
            "Merged {} into {} by {} ({} fields backfilled)",
            merge.merged_id, merge.kept_id, merge.key, merge.fields_backfilled
        );
        self.merges.push(merge);
        index
    }

    fn insert_name_only(&mut self, name: String, record: EnrichedContact) {
        let existing = self.by_name.get(&name).copied();
        let group = match existing {
            Some(index) => self.live(index),
            None => None,
        };

        match group {
            Some(group) => {
                let fields_backfilled = group.canonical.backfill_from(&record);
                group.member_ids.push(record.id().to_string());
                group.add_industries(record.raw.industry.as_deref());
                let merge = MergeRecord {
                    kept_id: group.canonical.id().to_string(),
                    merged_id: record.id().to_string(),
                    key: MergeKey::Name(name),
                    fields_backfilled,
                };
                self.merges.push(merge);
            }
            None => {
                let index = self.push(Group::seed(record, false));
                self.by_name.insert(name, index);
            }
        }
    }

    /// Register the email group at `index` under `name`. A name-only group
    /// already waiting on that name is absorbed.
    fn link_name(&mut self, name: String, index: usize) {
        let other = match self.by_name.get(&name).copied() {
            Some(other) if other != index => other,
            Some(_) => return,
            None => {
                self.by_name.insert(name, index);
                return;
            }
        };

        let other_is_email_keyed = self
            .groups
            .get(other)
            .and_then(Option::as_ref)
            .map(|group| group.email_keyed);
        match other_is_email_keyed {
            Some(true) => {}
            Some(false) => {
                self.absorb(other, index, &name);
                self.by_name.insert(name, index);
            }
            None => {
                self.by_name.insert(name, index);
            }
        }
    }

    /// Email groups whose canonicals share a display name: the newest
    /// canonical is backfilled from the others, newest donor first. Each group
    /// sits under exactly one name, so no receiver is also a donor.
    fn backfill_shared_names(&mut self) {
        let mut by_canonical_name: HashMap<String, Vec<(usize, Option<DateTime<Utc>>)>> = HashMap::new();
        for (index, group) in self.groups.iter().enumerate() {
            let group = match group {
                Some(group) if group.email_keyed => group,
                _ => continue,
            };
            if let Some(name) = group.canonical.name_key() {
                by_canonical_name
                    .entry(name)
                    .or_default()
                    .push((index, group.created()));
            }
        }

        let mut names: Vec<String> = by_canonical_name
            .iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();

        let mut plans = Vec::new();
        for name in names {
            let mut members = by_canonical_name.remove(&name).unwrap_or_default();
            // Stable sort keeps first-seen order among equal dates
            members.sort_by(|a, b| b.1.cmp(&a.1));
            if let Some((&(newest, _), older)) = members.split_first() {
                let donors: Vec<usize> = older.iter().map(|&(index, _)| index).collect();
                plans.push((name, newest, donors));
            }
        }

        for (name, newest, donors) in plans {
            for donor_index in donors {
                let donor = match self.groups.get(donor_index).and_then(Option::as_ref) {
                    Some(group) => group.canonical.clone(),
                    None => continue,
                };
                if let Some(group) = self.live(newest) {
                    let filled = group.canonical.backfill_from(&donor);
                    if filled > 0 {
                        debug!(
                            "Backfilled {} fields on {} from {} sharing name '{}'",
                            filled,
                            group.canonical.id(),
                            donor.id(),
                            name
                        );
                    }
                }
            }
        }
    }

    /// Fold the name-only group at `from` into the email group at `into`.
    fn absorb(&mut self, from: usize, into: usize, name: &str) {
        let donor = match self.groups.get_mut(from).and_then(Option::take) {
            Some(group) => group,
            None => return,
        };
        let target = match self.live(into) {
            Some(group) => group,
            None => {
                self.groups[from] = Some(donor);
                return;
            }
        };

        let mut fields_backfilled = target.canonical.backfill_from(&donor.canonical);
        for industry in &donor.industries {
            if !target.industries.contains(industry) {
                target.industries.push(industry.clone());
            }
        }
        let kept_id = target.canonical.id().to_string();
        let mut merges = Vec::with_capacity(donor.member_ids.len());
        for member in donor.member_ids {
            target.member_ids.push(member.clone());
            merges.push(MergeRecord {
                kept_id: kept_id.clone(),
                merged_id: member,
                key: MergeKey::Name(name.to_string()),
                fields_backfilled: std::mem::take(&mut fields_backfilled),
            });
        }
        self.merges.extend(merges);
    }

    fn finish(mut self) -> DedupOutcome {
        if self.backfill_across_names {
            self.backfill_shared_names();
        }

        let mut canonical = Vec::new();
        for group in self.groups.into_iter().flatten() {
            if !group.email_keyed {
                for member in &group.member_ids {
                    self.skipped.push(RecordFailure::new(
                        member.as_str(),
                        FailureKind::MissingIdentity,
                        "no email, and no record with an email shares its display name",
                    ));
                }
                continue;
            }

            let mut industries = group.industries;
            for item in split_industries(group.canonical.raw.industry.as_deref()) {
                if !industries.contains(&item) {
                    industries.push(item);
                }
            }
            canonical.push(CanonicalContact {
                contact: group.canonical,
                industries,
                member_ids: group.member_ids,
            });
        }

        DedupOutcome {
            canonical,
            merges: self.merges,
            skipped: self.skipped,
        }
    }
}
