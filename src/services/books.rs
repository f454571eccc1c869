//! Book collection operations

use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookFields, BookForm, BookWithOwner, LibraryQuery},
    repository::Repository,
};

/// Owner's dashboard data: books newest-first plus collection stats
#[derive(Debug)]
pub struct Dashboard {
    pub books: Vec<Book>,
    pub total_books: usize,
    pub genre_count: usize,
}

/// Public library page data: matching books plus the filter option sets
#[derive(Debug)]
pub struct Library {
    pub books: Vec<BookWithOwner>,
    pub genres: Vec<String>,
    pub authors: Vec<String>,
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All books owned by `user_id`, newest-created first, with the genre
    /// diversity stat shown on the dashboard.
    pub async fn dashboard(&self, user_id: i32) -> AppResult<Dashboard> {
        let books = self.repository.books.list_by_owner(user_id).await?;
        let total_books = books.len();
        let genre_count = books
            .iter()
            .map(|b| b.genre)
            .collect::<HashSet<_>>()
            .len();

        Ok(Dashboard {
            books,
            total_books,
            genre_count,
        })
    }

    /// Create a book owned by `user_id`. Validation failures never reach
    /// the store.
    pub async fn create(&self, user_id: i32, form: BookForm) -> AppResult<Book> {
        let fields = form.into_fields().map_err(AppError::Validation)?;
        self.repository.books.create(user_id, &fields).await
    }

    /// Fetch a book for the edit form, enforcing ownership
    pub async fn fetch_for_edit(&self, id: i32, user_id: i32) -> AppResult<Book> {
        let book = self
            .repository
            .books
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        if book.user_id != user_id {
            return Err(AppError::Authorization("Not authorized".to_string()));
        }

        Ok(book)
    }

    /// Replace a book's fields. The ownership predicate rides on the write
    /// itself; a missed write is probed to tell absent from not-owned.
    pub async fn update(&self, id: i32, user_id: i32, form: BookForm) -> AppResult<Book> {
        let fields: BookFields = form.into_fields().map_err(AppError::Validation)?;

        match self.repository.books.update_owned(id, user_id, &fields).await? {
            Some(book) => Ok(book),
            None => Err(self.missing_or_foreign(id).await?),
        }
    }

    /// Permanently remove a book, same ownership gate as update
    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        if self.repository.books.delete_owned(id, user_id).await? {
            return Ok(());
        }
        Err(self.missing_or_foreign(id).await?)
    }

    /// Public search across all users' books with filter option sets.
    /// Read-only: identical parameters yield identical ordered results
    /// absent intervening writes.
    pub async fn search_public(&self, query: &LibraryQuery) -> AppResult<Library> {
        let books = self.repository.books.search_public(query).await?;
        let genres = self.repository.books.distinct_genres().await?;
        let authors = self.repository.books.distinct_authors().await?;

        Ok(Library {
            books,
            genres,
            authors,
        })
    }

    /// Classify a write that matched no row: the book is either gone or
    /// owned by someone else. Never discloses the actual owner.
    async fn missing_or_foreign(&self, id: i32) -> AppResult<AppError> {
        Ok(match self.repository.books.get_by_id(id).await? {
            None => AppError::NotFound("Book not found".to_string()),
            Some(_) => AppError::Authorization("Not authorized".to_string()),
        })
    }
}
