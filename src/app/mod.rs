pub mod ports;
pub mod fetch_use_case;
pub mod enrich_use_case;
pub mod upload_use_case;
pub mod run_use_case;
pub mod report;
