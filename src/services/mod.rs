pub mod comments;
pub mod tree;

pub use comments::CommentService;
