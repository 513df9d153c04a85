pub mod errors;
pub mod fee;
pub mod identifiers;
pub mod pair;
