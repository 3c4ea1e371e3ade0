use std::sync::OnceLock;

use actix_web::{HttpRequest, HttpResponse};
use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::{Captures, Regex};
use rust_embed::RustEmbed;

use crate::core::errors::AppError;
use crate::core::flash::{removal_cookie, take_flash};
use crate::core::pagination::Page;
use crate::models::user;
use crate::posts::FeedEntry;

#[derive(RustEmbed)]
#[folder = "templates"]
struct Templates;

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\{\{\s*([A-Z_]+)\s*\}\}").expect("Regex should compile"))
}

fn url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"https?://[^\s<>]+").expect("Regex should compile"))
}

/// Replace `{{ NAME }}` placeholders in one pass; inserted values are not
/// scanned again. Unknown placeholders render as nothing.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

pub fn render(name: &str, values: &[(&str, &str)]) -> anyhow::Result<String> {
    let file = Templates::get(name).ok_or_else(|| anyhow::anyhow!("Template {name} not found"))?;
    let template = String::from_utf8(file.data.into_owned())?;
    Ok(fill(&template, values))
}

/// Escape post text and turn bare http(s) URLs into links.
pub fn render_content(content: &str) -> String {
    let mut html = String::with_capacity(content.len());
    let mut last = 0;

    for found in url_regex().find_iter(content) {
        html.push_str(&encode_text(&content[last..found.start()]));
        let url = found.as_str();
        html.push_str(&format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            encode_double_quoted_attribute(url),
            encode_text(url)
        ));
        last = found.end();
    }
    html.push_str(&encode_text(&content[last..]));

    html
}

pub fn profile_href(username: &str) -> String {
    format!("/{}", urlencoding::encode(username))
}

fn render_nav(viewer: Option<&user::Model>) -> String {
    match viewer {
        Some(user) => format!(
            r#"<a class="nav-link" href="{}"><strong>{}</strong></a>
            <a class="nav-link" href="/">All Posts</a>
            <a class="nav-link" href="/following">Following</a>
            <a class="nav-link" href="/logout">Log Out</a>"#,
            profile_href(&user.username),
            encode_text(&user.username)
        ),
        None => r#"<a class="nav-link" href="/">All Posts</a>
            <a class="nav-link" href="/login">Log In</a>
            <a class="nav-link" href="/register">Register</a>"#
            .to_string(),
    }
}

fn render_post(entry: &FeedEntry, viewer: Option<&user::Model>) -> String {
    let post = &entry.post;
    let edited = if post.updated_at.is_some() { " (edited)" } else { "" };

    let like_control = match viewer {
        Some(_) => format!(
            r#"<button class="like-button{}" data-post-id="{}">&#9829; <span class="like-count">{}</span></button>"#,
            if entry.liked { " liked" } else { "" },
            post.id,
            entry.likes
        ),
        None => format!(r#"<span class="like-static">&#9829; {}</span>"#, entry.likes),
    };

    let edit_control = match viewer {
        Some(user) if user.id == post.user_id => format!(
            r#"<details class="edit-post">
                <summary>Edit</summary>
                <form method="post" action="/posts/edit/{}">
                    <textarea name="content" required>{}</textarea>
                    <button type="submit">Save</button>
                </form>
            </details>"#,
            post.id,
            encode_text(&post.content)
        ),
        _ => String::new(),
    };

    format!(
        r#"<div class="post" id="post-{id}">
            <div class="post-author"><a href="{href}">{author}</a></div>
            <div class="post-content">{content}</div>
            <div class="post-meta">{created}{edited}</div>
            <div class="post-actions">{like}{edit}</div>
        </div>"#,
        id = post.id,
        href = profile_href(&entry.author.username),
        author = encode_text(&entry.author.username),
        content = render_content(&post.content),
        created = post.created_at.format("%b %-d %Y, %-I:%M %p"),
        edited = edited,
        like = like_control,
        edit = edit_control,
    )
}

pub fn render_post_list(page: &Page<FeedEntry>, viewer: Option<&user::Model>) -> String {
    if page.items.is_empty() {
        return r#"<p class="empty">No posts yet.</p>"#.to_string();
    }

    page.items
        .iter()
        .map(|entry| render_post(entry, viewer))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_pagination<T>(page: &Page<T>, base_path: &str) -> String {
    if page.num_pages <= 1 {
        return String::new();
    }

    let mut links = Vec::new();
    if page.has_previous() {
        links.push(format!(r#"<a href="{base_path}?page=1">&laquo; first</a>"#));
        links.push(format!(
            r#"<a href="{base_path}?page={}">previous</a>"#,
            page.number - 1
        ));
    }
    links.push(format!(
        r#"<span class="current">Page {} of {}</span>"#,
        page.number, page.num_pages
    ));
    if page.has_next() {
        links.push(format!(
            r#"<a href="{base_path}?page={}">next</a>"#,
            page.number + 1
        ));
        links.push(format!(
            r#"<a href="{base_path}?page={}">last &raquo;</a>"#,
            page.num_pages
        ));
    }

    format!(r#"<nav class="pagination">{}</nav>"#, links.join("\n"))
}

/// Wrap `body` in the site layout. Shows and clears any pending flash
/// message.
pub fn page_response(
    req: &HttpRequest,
    title: &str,
    viewer: Option<&user::Model>,
    body: &str,
) -> Result<HttpResponse, AppError> {
    let flash = take_flash(req);
    let flash_html = flash
        .as_deref()
        .map(|message| format!(r#"<div class="flash">{}</div>"#, encode_text(message)))
        .unwrap_or_default();

    let title = encode_text(title);
    let nav = render_nav(viewer);
    let html = render(
        "layout.html",
        &[
            ("PAGE_TITLE", &*title),
            ("NAV_LINKS", nav.as_str()),
            ("FLASH_MESSAGES", flash_html.as_str()),
            ("PAGE_BODY", body),
        ],
    )?;

    let mut builder = HttpResponse::Ok();
    builder.content_type("text/html; charset=utf-8");
    if flash.is_some() {
        builder.cookie(removal_cookie());
    }
    Ok(builder.body(html))
}

/// Message paragraph for a form re-rendered after a failed submit.
pub fn form_message(message: Option<&str>) -> String {
    message
        .map(|m| format!(r#"<div class="alert">{}</div>"#, encode_text(m)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_single_pass() {
        let out = fill(
            "<h1>{{ TITLE }}</h1>{{BODY}}{{ MISSING }}",
            &[("TITLE", "{{ BODY }}"), ("BODY", "<p>hi</p>")],
        );
        assert_eq!(out, "<h1>{{ BODY }}</h1><p>hi</p>");
    }

    #[test]
    fn content_is_escaped_and_linked() {
        let html = render_content("<script>x</script> see https://example.com/a?b=1&c=2 ok");
        assert!(html.starts_with("&lt;script&gt;x&lt;/script&gt; see "));
        assert!(html.contains(r#"href="https://example.com/a?b=1&amp;c=2""#));
        assert!(html.ends_with(" ok"));
    }

    #[test]
    fn pagination_links_only_when_needed() {
        let single: Page<()> = Page { items: vec![], number: 1, num_pages: 1, total: 0 };
        assert_eq!(render_pagination(&single, "/"), "");

        let middle: Page<()> = Page { items: vec![], number: 2, num_pages: 3, total: 25 };
        let nav = render_pagination(&middle, "/following");
        assert!(nav.contains(r#"href="/following?page=1""#));
        assert!(nav.contains(r#"href="/following?page=3""#));
        assert!(nav.contains("Page 2 of 3"));
    }

    #[test]
    fn layout_template_is_embedded() {
        let html = render("layout.html", &[("PAGE_TITLE", "Hello")]).unwrap();
        assert!(html.contains("Hello"));
        assert!(!html.contains("{{"));
    }
}
