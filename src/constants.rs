/// CRM property names shared by the fetch and upload adapters.
///
/// Source properties are the ones requested from the contact search endpoint;
/// target properties are the ones written back on upload.

// Source properties
pub const PROP_RAW_EMAIL: &str = "raw_email";
pub const PROP_COUNTRY: &str = "country";
pub const PROP_CITY: &str = "city";
pub const PROP_PHONE: &str = "phone";
pub const PROP_CREATE_DATE: &str = "technical_test___create_date";
pub const PROP_BUILTIN_CREATE_DATE: &str = "createdate";
pub const PROP_INDUSTRY: &str = "industry";
pub const PROP_ADDRESS: &str = "address";
pub const PROP_OBJECT_ID: &str = "hs_object_id";

// Target properties
pub const OUT_EMAIL: &str = "email";
pub const OUT_PHONE: &str = "phone";
pub const OUT_COUNTRY: &str = "country";
pub const OUT_CITY: &str = "city";
pub const OUT_ORIGINAL_CREATE_DATE: &str = "original_create_date";
pub const OUT_ORIGINAL_INDUSTRY: &str = "original_industry";
pub const OUT_TEMPORARY_ID: &str = "temporary_id";

/// Separator used when joining deduplicated industries.
pub const INDUSTRY_SEPARATOR: char = ';';

/// Properties requested on every contact search
pub fn search_properties() -> Vec<&'static str> {
    vec![
        PROP_RAW_EMAIL,
        PROP_COUNTRY,
        PROP_CITY,
        PROP_PHONE,
        PROP_CREATE_DATE,
        PROP_BUILTIN_CREATE_DATE,
        PROP_INDUSTRY,
        PROP_ADDRESS,
        PROP_OBJECT_ID,
    ]
}

/// Properties mapped onto typed `RawContact` fields; everything else is passthrough.
pub fn is_typed_property(name: &str) -> bool {
    matches!(
        name,
        PROP_RAW_EMAIL
            | PROP_COUNTRY
            | PROP_CITY
            | PROP_PHONE
            | PROP_CREATE_DATE
            | PROP_BUILTIN_CREATE_DATE
            | PROP_INDUSTRY
            | PROP_ADDRESS
            | PROP_OBJECT_ID
    )
}
