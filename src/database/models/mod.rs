pub mod comment;
pub mod post;

pub use comment::{Comment, CommentChanges, NewComment};
pub use post::{NewPost, Post, PostChanges, PostFilter};
