//! Book model and related types

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};

/// The fixed genre enumeration for catalogued books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Fiction,
    NonFiction,
    Mystery,
    Thriller,
    Romance,
    SciFi,
    Fantasy,
    Biography,
    SelfHelp,
    History,
    Other,
}

impl Genre {
    /// All genres, in the order offered on the book forms.
    pub const ALL: [Genre; 11] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Mystery,
        Genre::Thriller,
        Genre::Romance,
        Genre::SciFi,
        Genre::Fantasy,
        Genre::Biography,
        Genre::SelfHelp,
        Genre::History,
        Genre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::NonFiction => "Non-Fiction",
            Genre::Mystery => "Mystery",
            Genre::Thriller => "Thriller",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Fantasy => "Fantasy",
            Genre::Biography => "Biography",
            Genre::SelfHelp => "Self-Help",
            Genre::History => "History",
            Genre::Other => "Other",
        }
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fiction" => Ok(Genre::Fiction),
            "non-fiction" => Ok(Genre::NonFiction),
            "mystery" => Ok(Genre::Mystery),
            "thriller" => Ok(Genre::Thriller),
            "romance" => Ok(Genre::Romance),
            "sci-fi" => Ok(Genre::SciFi),
            "fantasy" => Ok(Genre::Fantasy),
            "biography" => Ok(Genre::Biography),
            "self-help" => Ok(Genre::SelfHelp),
            "history" => Ok(Genre::History),
            "other" => Ok(Genre::Other),
            _ => Err(format!("Invalid genre: {}", s)),
        }
    }
}

// SQLx conversion: genres are stored as their display strings.
impl sqlx::Type<Postgres> for Genre {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Genre {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Genre {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Full book model from database
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub notes: Option<String>,
    pub cover_image: Option<String>,
    /// Owning user; immutable after creation
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book joined with its owner's username, for the public library
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookWithOwner {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub notes: Option<String>,
    pub cover_image: Option<String>,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Validated field set applied on create and update
#[derive(Debug, Clone)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub notes: Option<String>,
    pub cover_image: Option<String>,
}

/// Raw book form payload; browsers submit empty strings for blank inputs.
#[derive(Debug, Default, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    pub isbn: Option<String>,
    pub publication_year: Option<String>,
    pub notes: Option<String>,
    pub cover_image: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl BookForm {
    /// Normalize and validate the submitted fields. Fails without touching
    /// the store; messages are surfaced to the user as-is.
    pub fn into_fields(self) -> Result<BookFields, Vec<String>> {
        let mut errors = Vec::new();

        let title = self.title.trim().to_string();
        let author = self.author.trim().to_string();
        if title.is_empty() || author.is_empty() || self.genre.trim().is_empty() {
            errors.push("Please fill in required fields".to_string());
        }

        let genre = match self.genre.trim().parse::<Genre>() {
            Ok(genre) => Some(genre),
            Err(_) => {
                if !self.genre.trim().is_empty() {
                    errors.push(format!("Unknown genre: {}", self.genre.trim()));
                }
                None
            }
        };

        let max_year = Utc::now().year() + 1;
        let publication_year = match non_empty(self.publication_year) {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(year) if (1000..=max_year).contains(&year) => Some(year),
                _ => {
                    errors.push(format!(
                        "Publication year must be between 1000 and {}",
                        max_year
                    ));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        // A missing or unknown genre always lands in `errors` above
        let genre = genre.ok_or_else(|| vec!["Please fill in required fields".to_string()])?;

        Ok(BookFields {
            title,
            author,
            genre,
            isbn: non_empty(self.isbn),
            publication_year,
            notes: non_empty(self.notes),
            cover_image: non_empty(self.cover_image),
        })
    }
}

/// Query parameters of the public library search
#[derive(Debug, Default, Deserialize)]
pub struct LibraryQuery {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub author: Option<String>,
}

impl LibraryQuery {
    /// Exact-match genre filter, skipping the "all" sentinel.
    pub fn genre_filter(&self) -> Option<&str> {
        self.genre
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty() && *g != "all")
    }

    /// Exact-match author filter, skipping the "all" sentinel.
    pub fn author_filter(&self) -> Option<&str> {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty() && *a != "all")
    }

    /// Substring search text against title OR author.
    pub fn text_filter(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> BookForm {
        BookForm {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            genre: "Sci-Fi".to_string(),
            ..BookForm::default()
        }
    }

    #[test]
    fn genre_round_trips_through_display_and_parse() {
        for genre in Genre::ALL {
            assert_eq!(genre.as_str().parse::<Genre>(), Ok(genre));
        }
    }

    #[test]
    fn genre_parse_is_case_insensitive() {
        assert_eq!("sci-fi".parse::<Genre>(), Ok(Genre::SciFi));
        assert_eq!("NON-FICTION".parse::<Genre>(), Ok(Genre::NonFiction));
    }

    #[test]
    fn genre_parse_rejects_unknown_values() {
        assert!("Cookbook".parse::<Genre>().is_err());
    }

    #[test]
    fn form_requires_title_author_genre() {
        let form = BookForm {
            title: "  ".to_string(),
            ..valid_form()
        };
        let errors = form.into_fields().unwrap_err();
        assert!(errors.contains(&"Please fill in required fields".to_string()));
    }

    #[test]
    fn form_trims_fields_and_drops_empty_optionals() {
        let form = BookForm {
            title: " Dune ".to_string(),
            isbn: Some("   ".to_string()),
            notes: Some(" classic ".to_string()),
            ..valid_form()
        };
        let fields = form.into_fields().unwrap();
        assert_eq!(fields.title, "Dune");
        assert_eq!(fields.isbn, None);
        assert_eq!(fields.notes.as_deref(), Some("classic"));
    }

    #[test]
    fn form_accepts_publication_year_in_range() {
        let form = BookForm {
            publication_year: Some("1965".to_string()),
            ..valid_form()
        };
        assert_eq!(form.into_fields().unwrap().publication_year, Some(1965));
    }

    #[test]
    fn form_rejects_publication_year_out_of_range() {
        for raw in ["999", "3000", "not-a-year"] {
            let form = BookForm {
                publication_year: Some(raw.to_string()),
                ..valid_form()
            };
            let errors = form.into_fields().unwrap_err();
            assert!(errors.iter().any(|m| m.contains("Publication year")));
        }
    }

    #[test]
    fn library_query_skips_all_sentinel() {
        let query = LibraryQuery {
            q: Some("dune".to_string()),
            genre: Some("all".to_string()),
            author: Some("Herbert".to_string()),
        };
        assert_eq!(query.text_filter(), Some("dune"));
        assert_eq!(query.genre_filter(), None);
        assert_eq!(query.author_filter(), Some("Herbert"));
    }
}
