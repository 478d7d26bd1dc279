use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::StoreError;
use crate::database::models::{Comment, CommentChanges, NewComment, NewPost, Post, PostChanges, PostFilter};
use crate::database::query::{PageRequest, PostSort, PostSortField, SortDirection};
use crate::database::Store;

#[derive(Default)]
struct Collections {
    // insertion order is the default listing order
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

/// Process-local store for development and tests
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn window<T: Clone>(items: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    items.skip(skip).take(limit).collect()
}

// Postgres places NULL after every value in ascending order
fn nulls_last<T: Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

// String ordering is byte-wise, matching COLLATE "C" in PgStore
fn compare_posts(a: &Post, b: &Post, field: PostSortField) -> Ordering {
    match field {
        PostSortField::Title => a.title.cmp(&b.title),
        PostSortField::Content => a.content.cmp(&b.content),
        PostSortField::Author => nulls_last(a.author.as_ref(), b.author.as_ref()),
        PostSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        PostSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_posts(
        &self,
        filter: &PostFilter,
        sort: Option<PostSort>,
        page: PageRequest,
    ) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Post> = inner.posts.iter().filter(|p| filter.matches(p)).collect();

        if let Some(sort) = sort {
            // stable, so ties keep insertion order
            matching.sort_by(|a, b| {
                let ordering = compare_posts(a, b, sort.field);
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        Ok(window(matching.into_iter().cloned(), page))
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.posts.iter().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            author: post.author,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        inner.posts.push(created.clone());
        Ok(created)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(post) = inner.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = changes.title;
        post.content = changes.content;
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(index) = inner.posts.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let removed = inner.posts.remove(index);
        inner.comments.retain(|c| c.post != id);
        Ok(Some(removed))
    }

    async fn find_comments(&self, post: Uuid, page: PageRequest) -> Result<Vec<Comment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(window(inner.comments.iter().filter(|c| c.post == post).cloned(), page))
    }

    async fn count_comments(&self, post: Uuid) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.comments.iter().filter(|c| c.post == post).count() as u64)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.posts.iter().any(|p| p.id == comment.post) {
            return Err(StoreError::Rejected(format!("post {} does not exist", comment.post)));
        }

        let now = Utc::now();
        let created = Comment {
            id: Uuid::new_v4(),
            content: comment.content,
            author: comment.author,
            post: comment.post,
            created_at: now,
            updated_at: now,
        };
        inner.comments.push(created.clone());
        Ok(created)
    }

    async fn update_comment(
        &self,
        id: Uuid,
        changes: CommentChanges,
    ) -> Result<Option<Comment>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(comment) = inner.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        comment.content = changes.content;
        comment.updated_at = Utc::now();
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(index) = inner.comments.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        Ok(Some(inner.comments.remove(index)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "content".to_string(),
            author: None,
        }
    }

    fn new_comment(post: Uuid) -> NewComment {
        NewComment {
            content: "nice".to_string(),
            author: Uuid::new_v4(),
            post,
        }
    }

    #[tokio::test]
    async fn create_then_find_post() {
        let store = MemoryStore::new();
        let created = store.create_post(new_post("hello")).await.unwrap();
        let found = store.find_post(created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(store.find_post(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn listing_sorts_and_pages() {
        let store = MemoryStore::new();
        for title in ["b", "c", "a", "d"] {
            store.create_post(new_post(title)).await.unwrap();
        }

        let filter = PostFilter::default();
        let unsorted = store
            .find_posts(&filter, None, PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        let titles: Vec<_> = unsorted.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["b", "c", "a", "d"]);

        let sort = PostSort {
            field: PostSortField::Title,
            direction: SortDirection::Desc,
        };
        let second_page = store
            .find_posts(&filter, Some(sort), PageRequest::new(2, 3).unwrap())
            .await
            .unwrap();
        let titles: Vec<_> = second_page.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["a"]);
        assert_eq!(store.count_posts(&filter).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn posts_without_author_sort_last_ascending() {
        let store = MemoryStore::new();
        let author = Uuid::new_v4();
        store.create_post(new_post("anonymous")).await.unwrap();
        store
            .create_post(NewPost {
                author: Some(author),
                ..new_post("signed")
            })
            .await
            .unwrap();

        let filter = PostFilter::default();
        let page = PageRequest::new(1, 10).unwrap();
        for (direction, expected) in [
            (SortDirection::Asc, ["signed", "anonymous"]),
            (SortDirection::Desc, ["anonymous", "signed"]),
        ] {
            let sort = PostSort {
                field: PostSortField::Author,
                direction,
            };
            let posts = store.find_posts(&filter, Some(sort), page).await.unwrap();
            let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
            assert_eq!(titles, expected, "{direction:?}");
        }
    }

    #[tokio::test]
    async fn text_sorts_byte_wise() {
        let store = MemoryStore::new();
        for title in ["b", "B", "a"] {
            store.create_post(new_post(title)).await.unwrap();
        }
        let sort = PostSort {
            field: PostSortField::Title,
            direction: SortDirection::Asc,
        };
        let posts = store
            .find_posts(&PostFilter::default(), Some(sort), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["B", "a", "b"]);
    }

    #[tokio::test]
    async fn update_missing_post_reports_none() {
        let store = MemoryStore::new();
        let changes = PostChanges {
            title: "t".to_string(),
            content: "c".to_string(),
        };
        assert_eq!(store.update_post(Uuid::new_v4(), changes).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_post_removes_its_comments() {
        let store = MemoryStore::new();
        let post = store.create_post(new_post("p")).await.unwrap();
        let other = store.create_post(new_post("q")).await.unwrap();
        store.create_comment(new_comment(post.id)).await.unwrap();
        store.create_comment(new_comment(other.id)).await.unwrap();

        assert!(store.delete_post(post.id).await.unwrap().is_some());
        assert_eq!(store.count_comments(post.id).await.unwrap(), 0);
        assert_eq!(store.count_comments(other.id).await.unwrap(), 1);
        assert!(store.delete_post(post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn comment_on_unknown_post_is_rejected() {
        let store = MemoryStore::new();
        let err = store.create_comment(new_comment(Uuid::new_v4())).await.unwrap_err();
        assert!(err.is_rejection());
    }
}
