//! Repositories wrapping entity queries.

mod comment;
mod contact;
mod follow;
mod group;
mod post;
mod user;

pub use comment::CommentRepository;
pub use contact::ContactRepository;
pub use follow::FollowRepository;
pub use group::GroupRepository;
pub use post::{PostFilter, PostRepository};
pub use user::UserRepository;
