pub mod analysis;
pub mod registration;
pub mod system;
