pub mod directory;
pub mod revocation;
