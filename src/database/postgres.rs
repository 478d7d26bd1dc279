use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::manager::StoreError;
use crate::database::models::{Comment, CommentChanges, NewComment, NewPost, Post, PostChanges, PostFilter};
use crate::database::query::{PageRequest, PostSort, PostSortField};
use crate::database::Store;

const POST_COLUMNS: &str = "id, title, content, author, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, content, author, post_id, created_at, updated_at";

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so the needle matches literally
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_post_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    builder.push(" WHERE TRUE");
    if let Some(needle) = &filter.title_contains {
        builder.push(" AND title ILIKE ").push_bind(like_pattern(needle));
    }
    if let Some(author) = filter.author {
        builder.push(" AND author = ").push_bind(author);
    }
}

fn push_window(builder: &mut QueryBuilder<'_, Postgres>, page: PageRequest) -> Result<(), StoreError> {
    let limit = i64::try_from(page.limit())
        .map_err(|_| StoreError::Rejected("limit is out of range".to_string()))?;
    let offset = i64::try_from(page.skip())
        .map_err(|_| StoreError::Rejected("page is out of range".to_string()))?;
    builder.push(" LIMIT ").push_bind(limit);
    builder.push(" OFFSET ").push_bind(offset);
    Ok(())
}

/// Text compares byte-wise so listings order the same as `MemoryStore`.
/// NULL authors already sort last ascending and first descending.
fn sort_expression(field: PostSortField) -> String {
    match field {
        PostSortField::Title | PostSortField::Content => format!("{} COLLATE \"C\"", field.column()),
        _ => field.column().to_string(),
    }
}

fn find_posts_query(
    filter: &PostFilter,
    sort: Option<PostSort>,
    page: PageRequest,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM posts", POST_COLUMNS));
    push_post_filter(&mut builder, filter);

    builder.push(" ORDER BY ");
    if let Some(sort) = sort {
        // Column names come from a closed enum, never from the request
        builder.push(format!("{} {}, ", sort_expression(sort.field), sort.direction.to_sql()));
    }
    builder.push("created_at ASC, id ASC");

    push_window(&mut builder, page)?;
    Ok(builder)
}

fn count_posts_query(filter: &PostFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM posts");
    push_post_filter(&mut builder, filter);
    builder
}

fn to_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[async_trait]
impl Store for PgStore {
    async fn find_posts(
        &self,
        filter: &PostFilter,
        sort: Option<PostSort>,
        page: PageRequest,
    ) -> Result<Vec<Post>, StoreError> {
        let mut builder = find_posts_query(filter, sort, page)?;
        let posts = builder.build_query_as::<Post>().fetch_all(&self.pool).await?;
        Ok(posts)
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, StoreError> {
        let mut builder = count_posts_query(filter);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(to_count(count))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let sql = format!(
            "INSERT INTO posts ({}) VALUES ($1, $2, $3, $4, $5, $5) RETURNING {}",
            POST_COLUMNS, POST_COLUMNS
        );
        let created = sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(post.title)
            .bind(post.content)
            .bind(post.author)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        let sql = format!(
            "UPDATE posts SET title = $2, content = $3, updated_at = now() WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.content)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        // comments go with it through ON DELETE CASCADE
        let sql = format!("DELETE FROM posts WHERE id = $1 RETURNING {}", POST_COLUMNS);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn find_comments(&self, post: Uuid, page: PageRequest) -> Result<Vec<Comment>, StoreError> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM comments WHERE post_id = ", COMMENT_COLUMNS));
        builder.push_bind(post);
        builder.push(" ORDER BY created_at ASC, id ASC");
        push_window(&mut builder, page)?;

        let comments = builder.build_query_as::<Comment>().fetch_all(&self.pool).await?;
        Ok(comments)
    }

    async fn count_comments(&self, post: Uuid) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post)
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(count))
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let sql = format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS);
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let sql = format!(
            "INSERT INTO comments ({}) VALUES ($1, $2, $3, $4, $5, $5) RETURNING {}",
            COMMENT_COLUMNS, COMMENT_COLUMNS
        );
        // an unknown post surfaces as a foreign key violation (class 23)
        let created = sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(comment.content)
            .bind(comment.author)
            .bind(comment.post)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_comment(
        &self,
        id: Uuid,
        changes: CommentChanges,
    ) -> Result<Option<Comment>, StoreError> {
        let sql = format!(
            "UPDATE comments SET content = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            COMMENT_COLUMNS
        );
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .bind(changes.content)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let sql = format!("DELETE FROM comments WHERE id = $1 RETURNING {}", COMMENT_COLUMNS);
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
