pub mod analysis;
pub mod errors;
pub mod events;
pub mod identity;
pub mod jobs;
pub mod store;
