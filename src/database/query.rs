/// Paging and ordering inputs shared by every store backend

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `"desc"` sorts descending; any other value sorts ascending
    pub fn from_param(value: &str) -> Self {
        if value == "desc" {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Post fields a listing may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSortField {
    Title,
    Content,
    Author,
    CreatedAt,
    UpdatedAt,
}

impl PostSortField {
    /// Accepts the wire (camelCase) names and their column spellings
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "title" => Some(PostSortField::Title),
            "content" => Some(PostSortField::Content),
            "author" => Some(PostSortField::Author),
            "createdAt" | "created_at" => Some(PostSortField::CreatedAt),
            "updatedAt" | "updated_at" => Some(PostSortField::UpdatedAt),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            PostSortField::Title => "title",
            PostSortField::Content => "content",
            PostSortField::Author => "author",
            PostSortField::CreatedAt => "created_at",
            PostSortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostSort {
    pub field: PostSortField,
    pub direction: SortDirection,
}

/// A validated page request. `page` is 1-based and `limit` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    /// Returns `None` for a zero page or limit, or when the offset overflows
    pub fn new(page: u64, limit: u64) -> Option<Self> {
        if page == 0 || limit == 0 {
            return None;
        }
        (page - 1).checked_mul(limit)?;
        Some(Self { page, limit })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Entities to skip before this page starts
    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    /// Pages needed to hold `count` entities at this page size
    pub fn total_pages(&self, count: u64) -> u64 {
        count.div_ceil(self.limit)
    }
}
