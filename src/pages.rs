//! Server-rendered HTML pages.
//!
//! Local assets only: the shell pulls `/static/app.js` and
//! `/static/app.css`, nothing from a CDN. All live behavior is in the
//! page script; the server only hands out the skeleton.

use axum::response::{Html, IntoResponse};

/// Generate the HTML shell for the application.
fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Live quiz answer viewer">
    <title>{title} - Quiz Viewer</title>

    <script defer src="/static/app.js"></script>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
    <div id="app-shell">
        <header class="topbar">
            <h1>Quiz Viewer</h1>
            <button id="theme-toggle" type="button" title="Toggle dark mode">Dark mode</button>
        </header>

        <main id="app">
            {content}
        </main>
    </div>
</body>
</html>"#
    )
}

/// Join form plus the live question panel (hidden until connected).
fn index_content() -> &'static str {
    r#"
    <section id="setup-panel" class="panel">
        <label for="name">Your Name</label>
        <input id="name" type="text" placeholder="Enter your name" autocomplete="off">

        <label for="pin">Game PIN</label>
        <input id="pin" type="text" placeholder="Enter game PIN" inputmode="numeric" autocomplete="off">

        <button id="connect" type="button">Connect to Game</button>

        <div id="status" class="status" hidden></div>
    </section>

    <section id="live-panel" class="panel" hidden>
        <div class="statusbar">
            <p id="live-status"></p>
            <p class="hint">Press Ctrl+Q to copy question and answers</p>
        </div>

        <div id="question-panel" hidden>
            <h2 id="question-text"></h2>
            <button id="copy-all" type="button">Copy All (Ctrl+Q)</button>

            <h3>Answers:</h3>
            <ol id="answer-list"></ol>

            <div id="copy-status" class="status" hidden></div>
        </div>
    </section>
    "#
}

/// Index page handler.
pub async fn index_handler() -> impl IntoResponse {
    Html(html_shell("Join", index_content()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_references_local_assets_only() {
        let page = html_shell("Join", index_content());
        assert!(page.contains("/static/app.js"));
        assert!(page.contains("/static/app.css"));
        assert!(!page.contains("https://cdn"));
    }

    #[test]
    fn test_index_contains_join_controls() {
        let content = index_content();
        assert!(content.contains(r#"id="pin""#));
        assert!(content.contains(r#"id="name""#));
        assert!(content.contains(r#"id="connect""#));
        assert!(content.contains(r#"id="answer-list""#));
    }
}
