pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use models::{Comment, CommentChanges, NewComment, NewPost, Post, PostChanges, PostFilter};
use query::{PageRequest, PostSort};

pub use manager::{DatabaseManager, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store handle shared by all request tasks
pub type SharedStore = Arc<dyn Store>;

/// Persistence for posts and comments.
///
/// Lookups by id return `Ok(None)` when nothing matches; updates and deletes
/// report the affected entity the same way. Deleting a post removes its
/// comments, and a comment can only be created for a post that exists.
/// Sorted listings compare text byte-wise and put posts without an author
/// last when ascending, first when descending.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_posts(
        &self,
        filter: &PostFilter,
        sort: Option<PostSort>,
        page: PageRequest,
    ) -> Result<Vec<Post>, StoreError>;

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, StoreError>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError>;

    async fn delete_post(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

    /// Comments of one post in creation order
    async fn find_comments(&self, post: Uuid, page: PageRequest) -> Result<Vec<Comment>, StoreError>;

    async fn count_comments(&self, post: Uuid) -> Result<u64, StoreError>;

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    async fn update_comment(
        &self,
        id: Uuid,
        changes: CommentChanges,
    ) -> Result<Option<Comment>, StoreError>;

    async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;
}
