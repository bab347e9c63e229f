// Contact cleaning pipeline stages

pub mod processing;
