pub mod post;
pub mod user_representation;
