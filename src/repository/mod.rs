pub mod comments;
pub mod parents;
pub mod votes;

pub use parents::{ParentEntityStore, PostStore, ReviewStore};
