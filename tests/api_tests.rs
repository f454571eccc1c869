//! API integration tests
//!
//! These exercise a running server (with its database) end to end:
//! `cargo run` in one terminal, then `cargo test -- --ignored`.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{redirect::Policy, Client, StatusCode};

const BASE_URL: &str = "http://localhost:3000";

/// Client with a cookie store, since authentication is session-based
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

/// Client that surfaces redirects instead of following them
fn manual_redirect_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Unique suffix so repeated runs don't collide on unique columns
fn unique() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_millis()
}

async fn register(client: &Client, username: &str, email: &str, password: &str) {
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .form(&[
            ("username", username),
            ("email", email),
            ("password", password),
            ("password2", password),
        ])
        .send()
        .await
        .expect("Failed to send register request");
    assert!(response.status().is_success());
}

async fn login(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());
    response.text().await.expect("Failed to read body")
}

async fn create_book(client: &Client, title: &str, author: &str, genre: &str) -> String {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .form(&[("title", title), ("author", author), ("genre", genre)])
        .send()
        .await
        .expect("Failed to send create request");
    assert!(response.status().is_success());
    response.text().await.expect("Failed to read body")
}

/// Pull the first book id out of a dashboard page (edit links carry it)
fn first_book_id(dashboard_html: &str) -> i32 {
    dashboard_html
        .match_indices("/books/")
        .find_map(|(idx, _)| {
            let rest = &dashboard_html[idx + "/books/".len()..];
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() || !rest[digits.len()..].starts_with("/edit") {
                return None;
            }
            digits.parse().ok()
        })
        .expect("No edit link on dashboard")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_dashboard_requires_login() {
    let response = manual_redirect_client()
        .get(format!("{}/books/dashboard", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "/auth/login"
    );
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_short_password() {
    let client = client();
    let id = unique();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .form(&[
            ("username", format!("shorty{}", id).as_str()),
            ("email", format!("shorty{}@example.com", id).as_str()),
            ("password", "short"),
            ("password2", "short"),
        ])
        .send()
        .await
        .expect("Failed to send request");

    // Form re-renders with the error; no account is created
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Password should be at least 8 characters"));

    let login_body = login(
        &client,
        &format!("shorty{}@example.com", id),
        "short",
    )
    .await;
    assert!(login_body.contains("Email not registered"));
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_duplicate_email_case_insensitively() {
    let client = client();
    let id = unique();
    let email = format!("dup{}@example.com", id);

    register(&client, &format!("dup{}", id), &email, "password1").await;

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .form(&[
            ("username", format!("dup{}b", id).as_str()),
            ("email", email.to_uppercase().as_str()),
            ("password", "password1"),
            ("password2", "password1"),
        ])
        .send()
        .await
        .expect("Failed to send request");

    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Email or username already registered"));
}

#[tokio::test]
#[ignore]
async fn test_register_login_create_and_search() {
    let client = client();
    let id = unique();
    let email = format!("alice{}@example.com", id);
    let author = format!("Herbert{}", id);

    register(&client, &format!("alice{}", id), &email, "password1").await;

    let login_body = login(&client, &email, "password1").await;
    assert!(login_body.contains("My Collection"));

    let dashboard = create_book(&client, "Dune", &author, "Sci-Fi").await;
    assert!(dashboard.contains("Book added successfully"));
    assert!(dashboard.contains("Dune"));
    assert!(dashboard.contains("1 books, 1 genres"));

    // The book is visible in the public library, owner attached
    let library = client
        .get(format!("{}/library", BASE_URL))
        .query(&[("author", author.as_str())])
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read body");
    assert!(library.contains("Dune"));
    assert!(library.contains(&format!("alice{}", id)));
}

#[tokio::test]
#[ignore]
async fn test_library_search_is_case_insensitive_substring() {
    let client = client();
    let id = unique();
    let email = format!("searcher{}@example.com", id);

    register(&client, &format!("searcher{}", id), &email, "password1").await;
    login(&client, &email, "password1").await;
    create_book(&client, &format!("Dune Messiah {}", id), "Frank Herbert", "Sci-Fi").await;

    let library = client
        .get(format!("{}/library", BASE_URL))
        .query(&[("q", format!("dune messiah {}", id).as_str())])
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read body");

    assert!(library.contains(&format!("Dune Messiah {}", id)));

    let miss = client
        .get(format!("{}/library", BASE_URL))
        .query(&[("q", format!("no such title {}", id).as_str())])
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read body");

    assert!(miss.contains("No books found"));
}

#[tokio::test]
#[ignore]
async fn test_mutation_by_non_owner_is_denied() {
    let id = unique();

    // Alice owns a book
    let alice = client();
    let alice_email = format!("alicemut{}@example.com", id);
    register(&alice, &format!("alicemut{}", id), &alice_email, "password1").await;
    login(&alice, &alice_email, "password1").await;
    let dashboard = create_book(&alice, "Hyperion", "Simmons", "Sci-Fi").await;
    let book_id = first_book_id(&dashboard);

    // Bob tries to rewrite and delete it
    let bob = client();
    let bob_email = format!("bob{}@example.com", id);
    register(&bob, &format!("bobmut{}", id), &bob_email, "password1").await;
    login(&bob, &bob_email, "password1").await;

    let response = bob
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .form(&[
            ("title", "Stolen"),
            ("author", "Bob"),
            ("genre", "Other"),
        ])
        .send()
        .await
        .expect("Failed to send request");
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Not authorized"));

    let response = bob
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Not authorized"));

    // Alice's book is unchanged
    let edit_page = alice
        .get(format!("{}/books/{}/edit", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read body");
    assert!(edit_page.contains("Hyperion"));
    assert!(!edit_page.contains("Stolen"));
}

#[tokio::test]
#[ignore]
async fn test_owner_can_update_and_delete() {
    let client = client();
    let id = unique();
    let email = format!("editor{}@example.com", id);

    register(&client, &format!("editor{}", id), &email, "password1").await;
    login(&client, &email, "password1").await;
    let dashboard = create_book(&client, "Draft Title", "Someone", "Other").await;
    let book_id = first_book_id(&dashboard);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .form(&[
            ("title", "Final Title"),
            ("author", "Someone"),
            ("genre", "History"),
            ("publication_year", "1999"),
        ])
        .send()
        .await
        .expect("Failed to send request");
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Book updated successfully"));
    assert!(body.contains("Final Title"));

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Book deleted successfully"));
    assert!(!body.contains("Final Title"));
}

#[tokio::test]
#[ignore]
async fn test_logout_flashes_on_landing_page() {
    let client = client();
    let id = unique();
    let email = format!("bye{}@example.com", id);

    register(&client, &format!("bye{}", id), &email, "password1").await;
    login(&client, &email, "password1").await;

    let body = client
        .get(format!("{}/auth/logout", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read body");
    assert!(body.contains("You are logged out"));

    // The session is really gone
    let response = manual_redirect_client()
        .get(format!("{}/books/dashboard", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
