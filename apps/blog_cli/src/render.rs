//! Plain-text views of session and list snapshots.

use client_core::{FetchState, SessionState};
use shared::{
    domain::{Comment, Identity, Post},
    protocol::ListPage,
};

pub const NO_POSTS: &str = "No posts yet";
pub const NO_MATCHING_POSTS: &str = "No posts found";
pub const NO_COMMENTS: &str = "No comments yet";
pub const NO_USERS: &str = "No users found";

const PREVIEW_CHARS: usize = 200;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn session(state: &SessionState) -> String {
    match state {
        SessionState::Uninitialized | SessionState::Loading => "Checking session...".into(),
        SessionState::Anonymous => "Not logged in".into(),
        SessionState::Authenticated(identity) => match &identity.email {
            Some(email) => format!("Logged in as {} <{email}>", identity.nickname),
            None => format!("Logged in as {}", identity.nickname),
        },
    }
}

pub fn list<T>(state: &FetchState<T>, empty: &str, line: impl Fn(&T) -> String) -> String {
    match state {
        FetchState::Idle => String::new(),
        FetchState::Loading => "Loading...".into(),
        FetchState::Failed(err) => format!("Error: {}", err.reason()),
        FetchState::Loaded(page) if page.is_empty() => {
            let mut out = empty.to_string();
            if let Some(footer) = pagination(page) {
                out.push('\n');
                out.push_str(&footer);
            }
            out
        }
        FetchState::Loaded(page) => {
            let mut out = page.items.iter().map(line).collect::<Vec<_>>().join("\n");
            if let Some(footer) = pagination(page) {
                out.push_str("\n\n");
                out.push_str(&footer);
            }
            out
        }
    }
}

/// Page indicator, shown only when there is more than one page.
pub fn pagination<T>(page: &ListPage<T>) -> Option<String> {
    if page.pages <= 1 {
        return None;
    }
    let prev = if page.has_prev { "[Previous]" } else { " Previous " };
    let next = if page.has_next { "[Next]" } else { " Next " };
    Some(format!(
        "{prev}  Page {} of {}  {next}",
        page.current_page, page.pages
    ))
}

pub fn post_line(post: &Post) -> String {
    let mut line = format!(
        "#{} {}\n    by {} on {} | {} comments",
        post.id.0,
        post.title,
        post.author.nickname,
        post.created_at.format(TIMESTAMP_FORMAT),
        post.comments_count
    );
    if let Some(content) = &post.content {
        line.push_str("\n    ");
        line.push_str(&preview(content));
    }
    line
}

pub fn comment_line(comment: &Comment) -> String {
    format!(
        "{} ({}): {}",
        comment.author.nickname,
        comment.created_at.format(TIMESTAMP_FORMAT),
        comment.content
    )
}

pub fn user_line(user: &Identity) -> String {
    format!(
        "{} (joined {})",
        user.nickname,
        user.created_at.format("%Y-%m-%d")
    )
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
