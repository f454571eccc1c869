//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::book::{Book, BookFields, BookWithOwner, LibraryQuery},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// All books owned by a user, newest-created first
    pub async fn list_by_owner(&self, user_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Create a new book owned by `user_id`
    pub async fn create(&self, user_id: i32, fields: &BookFields) -> AppResult<Book> {
        let now = Utc::now();

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                title, author, genre, isbn, publication_year, notes, cover_image,
                user_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.author)
        .bind(fields.genre)
        .bind(&fields.isbn)
        .bind(fields.publication_year)
        .bind(&fields.notes)
        .bind(&fields.cover_image)
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Apply new field values to a book, guarded by ownership on the write
    /// itself. Returns the updated row, or None when no row matched (absent
    /// or not owned by `user_id`; callers probe to tell the two apart).
    /// The owner reference is never reassigned.
    pub async fn update_owned(
        &self,
        id: i32,
        user_id: i32,
        fields: &BookFields,
    ) -> AppResult<Option<Book>> {
        let now = Utc::now();

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, genre = $3, isbn = $4,
                publication_year = $5, notes = $6, cover_image = $7,
                updated_at = $8
            WHERE id = $9 AND user_id = $10
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.author)
        .bind(fields.genre)
        .bind(&fields.isbn)
        .bind(fields.publication_year)
        .bind(&fields.notes)
        .bind(&fields.cover_image)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Permanently remove a book, guarded by ownership on the delete itself.
    /// Returns true when a row was removed.
    pub async fn delete_owned(&self, id: i32, user_id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Public library search across all users' books, owner username
    /// attached, newest-created first. All provided filters AND-combine.
    pub async fn search_public(&self, query: &LibraryQuery) -> AppResult<Vec<BookWithOwner>> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(text) = query.text_filter() {
            params.push(format!("%{}%", text.to_lowercase()));
            conditions.push(format!(
                "(LOWER(b.title) LIKE ${n} OR LOWER(b.author) LIKE ${n})",
                n = params.len()
            ));
        }

        if let Some(genre) = query.genre_filter() {
            params.push(genre.to_string());
            conditions.push(format!("b.genre = ${}", params.len()));
        }

        if let Some(author) = query.author_filter() {
            params.push(author.to_string());
            conditions.push(format!("b.author = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_query = format!(
            r#"
            SELECT b.id, b.title, b.author, b.genre, b.isbn, b.publication_year,
                   b.notes, b.cover_image, u.username, b.created_at
            FROM books b
            JOIN users u ON b.user_id = u.id
            {}
            ORDER BY b.created_at DESC, b.id DESC
            "#,
            where_clause
        );

        let mut builder = sqlx::query_as::<_, BookWithOwner>(&select_query);
        for param in &params {
            builder = builder.bind(param);
        }
        let books = builder.fetch_all(&self.pool).await?;

        Ok(books)
    }

    /// Distinct genres present across the full collection, for filter options
    pub async fn distinct_genres(&self) -> AppResult<Vec<String>> {
        let genres = sqlx::query_scalar("SELECT DISTINCT genre FROM books ORDER BY genre")
            .fetch_all(&self.pool)
            .await?;

        Ok(genres)
    }

    /// Distinct authors present across the full collection, for filter options
    pub async fn distinct_authors(&self) -> AppResult<Vec<String>> {
        let authors = sqlx::query_scalar("SELECT DISTINCT author FROM books ORDER BY author")
            .fetch_all(&self.pool)
            .await?;

        Ok(authors)
    }
}
