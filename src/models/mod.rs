//! Data models for BookTrack

pub mod book;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookFields, BookWithOwner, Genre};
pub use session::{Flash, FlashKind, Session};
pub use user::User;

/// Flatten `validator` output into the per-field messages rendered on forms.
pub fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid value".to_string())
        })
        .collect();
    messages.sort();
    messages.dedup();
    messages
}
