pub mod identity;
pub mod orders;
pub mod restaurants;
