pub mod comment;
pub mod representation;
