pub mod config;
pub mod logging;

pub mod backoff;
pub mod clock;
pub mod decode;
pub mod fetch;
pub mod interest_group;
pub mod merge;
pub mod policy;
pub mod scheduler;
pub mod store;
