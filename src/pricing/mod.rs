mod cache;
mod provider;
mod resolver;
mod source;
mod types;

pub(crate) use resolver::ModelResolver;
pub(crate) use source::PricingSource;
pub(crate) use types::PricingRecord;
