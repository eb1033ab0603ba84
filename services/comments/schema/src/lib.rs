pub mod comments;
pub mod post_representations;
pub mod user_representations;
