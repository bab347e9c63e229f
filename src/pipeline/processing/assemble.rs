use crate::domain::NormalizedContact;
use crate::pipeline::processing::dedup::CanonicalContact;

/// Build the output record for one deduplicated group.
pub fn assemble(canonical: CanonicalContact) -> NormalizedContact {
    let industry = canonical.industry();
    let contact = canonical.contact;
    let raw = contact.raw;

    NormalizedContact {
        id: raw.id,
        email: contact.email,
        display_name: contact.display_name,
        country: contact.country,
        city: contact.city,
        phone_international: contact.phone_international,
        create_date: raw.create_date,
        industry,
        address: raw.address,
        extra: raw.extra,
    }
}
