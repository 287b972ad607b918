pub mod duplicates;
pub mod ping;
pub mod swap;
