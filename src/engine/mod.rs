pub mod access;
pub mod analytics;
pub mod delivery;
pub mod lifecycle;
pub mod placement;
pub mod queries;
