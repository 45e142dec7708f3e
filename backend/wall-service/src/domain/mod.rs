pub mod models;

pub use models::{Comment, CommentView, Post, PostView, User, UserSummary};
