pub mod follow;
pub mod like;
pub mod post;
pub mod session;
pub mod user;
