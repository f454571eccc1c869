//! Server-side HTML rendering.
//!
//! Deliberately thin: pages carry the data, forms, redirect targets, and
//! flash notices the application semantics require, with no styling layer.

use crate::models::{
    book::{Book, BookWithOwner, Genre, LibraryQuery},
    session::{Flash, FlashKind},
};
use crate::services::books::{Dashboard, Library};

/// Minimal HTML escaping for interpolated user data
fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_flashes(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|f| {
            let class = match f.kind {
                FlashKind::Success => "flash-success",
                FlashKind::Error => "flash-error",
            };
            format!(r#"<p class="{}">{}</p>"#, class, esc(&f.message))
        })
        .collect()
}

fn nav(username: Option<&str>) -> String {
    match username {
        Some(name) => format!(
            r#"<nav><a href="/">Home</a> <a href="/library">Library</a> <a href="/books/dashboard">My Collection</a> <a href="/books/add">Add Book</a> <span>{}</span> <a href="/auth/logout">Logout</a></nav>"#,
            esc(name)
        ),
        None => r#"<nav><a href="/">Home</a> <a href="/library">Library</a> <a href="/auth/login">Login</a> <a href="/auth/register">Register</a></nav>"#.to_string(),
    }
}

fn layout(title: &str, username: Option<&str>, flashes: &[Flash], body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{} - BookTrack</title></head>
<body>
{}
{}
{}
</body>
</html>"#,
        esc(title),
        nav(username),
        render_flashes(flashes),
        body
    )
}

fn genre_options(selected: Option<Genre>) -> String {
    Genre::ALL
        .iter()
        .map(|g| {
            let marker = if Some(*g) == selected { " selected" } else { "" };
            format!(r#"<option value="{0}"{1}>{0}</option>"#, g.as_str(), marker)
        })
        .collect()
}

fn string_options(values: &[String], selected: Option<&str>) -> String {
    let all_marker = if selected.is_none() { " selected" } else { "" };
    let mut out = format!(r#"<option value="all"{}>All</option>"#, all_marker);
    for value in values {
        let marker = if Some(value.as_str()) == selected {
            " selected"
        } else {
            ""
        };
        out.push_str(&format!(
            r#"<option value="{0}"{1}>{0}</option>"#,
            esc(value),
            marker
        ));
    }
    out
}

pub fn home_page(username: Option<&str>, flashes: &[Flash]) -> String {
    let body = r#"<h1>BookTrack - Your Personal Digital Library</h1>
<p>Track the books you own and read, and browse everyone's shelves in the <a href="/library">public library</a>.</p>"#;
    layout("Home", username, flashes, body)
}

pub fn library_page(library: &Library, query: &LibraryQuery, username: Option<&str>) -> String {
    let mut body = String::from("<h1>Public Library</h1>\n");
    body.push_str(&format!(
        r#"<form method="get" action="/library">
<input type="text" name="q" placeholder="Search title or author" value="{}">
<select name="genre">{}</select>
<select name="author">{}</select>
<button type="submit">Search</button>
</form>
"#,
        esc(query.text_filter().unwrap_or("")),
        string_options(&library.genres, query.genre_filter()),
        string_options(&library.authors, query.author_filter()),
    ));

    if library.books.is_empty() {
        body.push_str("<p>No books found.</p>");
    } else {
        body.push_str("<ul>\n");
        for book in &library.books {
            body.push_str(&library_entry(book));
        }
        body.push_str("</ul>");
    }

    layout("Public Library", username, &[], &body)
}

fn library_entry(book: &BookWithOwner) -> String {
    let year = book
        .publication_year
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    format!(
        "<li><strong>{}</strong> by {}{} [{}], shared by {}</li>\n",
        esc(&book.title),
        esc(&book.author),
        year,
        book.genre.as_str(),
        esc(&book.username),
    )
}

pub fn login_page(flashes: &[Flash]) -> String {
    let body = r#"<h1>Login</h1>
<form method="post" action="/auth/login">
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Login</button>
</form>
<p><a href="/auth/github">Login with GitHub</a></p>
<p>No account? <a href="/auth/register">Register</a></p>"#;
    layout("Login", None, flashes, body)
}

pub fn register_page(
    flashes: &[Flash],
    errors: &[String],
    username: &str,
    email: &str,
) -> String {
    let error_list = if errors.is_empty() {
        String::new()
    } else {
        format!(
            "<ul class=\"errors\">{}</ul>\n",
            errors
                .iter()
                .map(|e| format!("<li>{}</li>", esc(e)))
                .collect::<String>()
        )
    };

    let body = format!(
        r#"<h1>Register</h1>
{}<form method="post" action="/auth/register">
<label>Username <input type="text" name="username" value="{}" required></label>
<label>Email <input type="email" name="email" value="{}" required></label>
<label>Password <input type="password" name="password" required></label>
<label>Confirm Password <input type="password" name="password2" required></label>
<button type="submit">Register</button>
</form>"#,
        error_list,
        esc(username),
        esc(email)
    );
    layout("Register", None, flashes, &body)
}

pub fn dashboard_page(username: &str, dashboard: &Dashboard, flashes: &[Flash]) -> String {
    let mut body = format!(
        "<h1>My Collection</h1>\n<p>{} books, {} genres</p>\n",
        dashboard.total_books, dashboard.genre_count
    );

    if dashboard.books.is_empty() {
        body.push_str(r#"<p>No books yet. <a href="/books/add">Add your first book</a>.</p>"#);
    } else {
        body.push_str("<ul>\n");
        for book in &dashboard.books {
            body.push_str(&format!(
                r#"<li><strong>{}</strong> by {} [{}] <a href="/books/{}/edit">Edit</a></li>
"#,
                esc(&book.title),
                esc(&book.author),
                book.genre.as_str(),
                book.id,
            ));
        }
        body.push_str("</ul>");
    }

    layout("My Collection", Some(username), flashes, &body)
}

fn book_form_fields(book: Option<&Book>) -> String {
    let field = |opt: Option<&str>| esc(opt.unwrap_or(""));
    let (title, author, genre, isbn, year, notes, cover) = match book {
        Some(b) => (
            esc(&b.title),
            esc(&b.author),
            Some(b.genre),
            field(b.isbn.as_deref()),
            b.publication_year.map(|y| y.to_string()).unwrap_or_default(),
            field(b.notes.as_deref()),
            field(b.cover_image.as_deref()),
        ),
        None => (
            String::new(),
            String::new(),
            None,
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ),
    };

    format!(
        r#"<label>Title <input type="text" name="title" value="{}" required></label>
<label>Author <input type="text" name="author" value="{}" required></label>
<label>Genre <select name="genre" required>{}</select></label>
<label>ISBN <input type="text" name="isbn" value="{}"></label>
<label>Publication Year <input type="number" name="publication_year" value="{}"></label>
<label>Notes <textarea name="notes">{}</textarea></label>
<label>Cover Image URL <input type="text" name="cover_image" value="{}"></label>"#,
        title,
        author,
        genre_options(genre),
        isbn,
        year,
        notes,
        cover
    )
}

pub fn add_book_page(username: &str, flashes: &[Flash]) -> String {
    let body = format!(
        r#"<h1>Add New Book</h1>
<form method="post" action="/books">
{}
<button type="submit">Add Book</button>
</form>"#,
        book_form_fields(None)
    );
    layout("Add New Book", Some(username), flashes, &body)
}

pub fn edit_book_page(username: &str, book: &Book) -> String {
    let body = format!(
        r#"<h1>Edit Book</h1>
<form method="post" action="/books/{id}?_method=PUT">
{fields}
<button type="submit">Save Changes</button>
</form>
<form method="post" action="/books/{id}?_method=DELETE">
<button type="submit">Delete</button>
</form>"#,
        id = book.id,
        fields = book_form_fields(Some(book)),
    );
    layout("Edit Book", Some(username), &[], &body)
}

pub fn error_page(message: &str) -> String {
    let body = format!("<h1>Error</h1>\n<p>{}</p>", esc(message));
    layout("Error", None, &[], &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_interpolated_user_data() {
        let page = register_page(&[], &[], "<script>alert(1)</script>", "a@b.com");
        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn register_page_echoes_submitted_fields() {
        let page = register_page(
            &[],
            &["Passwords do not match".to_string()],
            "alice",
            "alice@x.com",
        );
        assert!(page.contains(r#"value="alice""#));
        assert!(page.contains(r#"value="alice@x.com""#));
        assert!(page.contains("Passwords do not match"));
    }

    #[test]
    fn add_book_page_offers_the_full_genre_enumeration() {
        let page = add_book_page("alice", &[]);
        for genre in Genre::ALL {
            assert!(page.contains(&format!(r#"<option value="{}""#, genre.as_str())));
        }
    }

    #[test]
    fn flashes_render_with_their_kind() {
        let page = login_page(&[Flash::error("Password incorrect")]);
        assert!(page.contains("flash-error"));
        assert!(page.contains("Password incorrect"));
    }

    #[test]
    fn library_page_marks_the_selected_genre() {
        let library = Library {
            books: Vec::new(),
            genres: vec!["Fantasy".to_string(), "Sci-Fi".to_string()],
            authors: Vec::new(),
        };
        let query = LibraryQuery {
            q: None,
            genre: Some("Sci-Fi".to_string()),
            author: None,
        };
        let page = library_page(&library, &query, None);
        assert!(page.contains(r#"<option value="Sci-Fi" selected>"#));
    }
}
