// Run list commands
pub mod converge;

// Catalog
pub mod resources;
