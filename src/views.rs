//! HTML pages.
//!
//! [`Views`] is built once at startup and shared through the application
//! state. Pages are compiled maud templates, so all dynamic content is
//! HTML-escaped.

use maud::{html, Markup, DOCTYPE};

use crate::store::Status;

/// Data rendered by the home page.
#[derive(Debug, Default)]
pub struct HomePage<'a> {
    pub statuses: &'a [Status],
    pub my_status: Option<&'a Status>,
    /// Present when the visitor is signed in.
    pub display_name: Option<&'a str>,
    pub notice: Option<&'a str>,
}

/// Page renderers.
#[derive(Debug, Clone)]
pub struct Views {
    title: String,
}

impl Views {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn home(&self, page: &HomePage<'_>) -> Markup {
        let body = html! {
            @if let Some(notice) = page.notice {
                p.notice { (notice) }
            }
            div.card {
                @if let Some(name) = page.display_name {
                    form.session-form action="/logout" method="post" {
                        div { "Hi, " strong { (name) } ". What's your status today?" }
                        button type="submit" { "Log out" }
                    }
                } @else {
                    div.session-form {
                        div { a href="/login" { "Log in" } " to set your status!" }
                        a.button href="/login" { "Log in" }
                    }
                }
            }
            @if page.display_name.is_some() {
                form.status-form action="/status" method="post" {
                    input type="text" name="status" maxlength="300"
                        placeholder=(page.my_status.map(|s| s.text.as_str()).unwrap_or("Your status"))
                        required;
                    button type="submit" { "Update" }
                }
            }
            ul.status-list {
                @for status in page.statuses {
                    li.status-line {
                        span.author { (status.author_id) }
                        " is feeling "
                        span.text { (status.text) }
                        " "
                        time datetime=(status.created_at) { (status.created_at) }
                    }
                }
                @if page.statuses.is_empty() {
                    li.empty { "No statuses yet." }
                }
            }
        };
        self.layout(body)
    }

    pub fn login(&self, error: Option<&str>) -> Markup {
        let body = html! {
            form.login-form action="/login" method="post" {
                label {
                    "Handle"
                    input type="text" name="handle" placeholder="alice.bsky.social" required;
                }
                label {
                    "App password"
                    input type="password" name="password" required;
                }
                button type="submit" { "Log in" }
                @if let Some(error) = error {
                    p.error { "Error: " (error) }
                }
            }
        };
        self.layout(body)
    }

    fn layout(&self, body: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (self.title) }
                    link rel="stylesheet" href="/public/styles.css";
                }
                body {
                    div #header {
                        h1 { (self.title) }
                        p { "Set your status on the Atmosphere." }
                    }
                    div.container { (body) }
                }
            }
        }
    }
}

impl Default for Views {
    fn default() -> Self {
        Self::new("Statusphere")
    }
}
