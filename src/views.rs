//! Server-rendered HTML pages

use crate::models::{book::BookList, BookQuery};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; }
.center { min-height: 100vh; display: flex; align-items: center; justify-content: center; }
.spinner { width: 8rem; height: 8rem; border-radius: 50%; border-bottom: 2px solid #111827; animation: spin 1s linear infinite; }
@keyframes spin { to { transform: rotate(360deg); } }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 14rem; background: #f3f4f6; padding: 1rem; }
.sidebar a { display: block; padding: .4rem 0; color: inherit; }
.main { flex: 1; display: flex; flex-direction: column; }
header { display: flex; align-items: center; height: 4rem; border-bottom: 1px solid #e5e7eb; padding: 0 1rem; }
header .user { margin-left: auto; display: flex; gap: .5rem; align-items: center; }
.content { padding: 1rem; }
form.card { width: 22rem; display: flex; flex-direction: column; gap: .6rem; }
.error { color: #b91c1c; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #e5e7eb; padding: .4rem; text-align: left; }
"#;

/// Escape text for HTML element and attribute content
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn document(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Bookshelf</title>
<style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>"#,
        title = escape(title),
    )
}

/// Neutral loading indicator; carries no user data
pub fn placeholder() -> String {
    r#"<div class="center"><div class="spinner"></div></div>"#.to_string()
}

pub fn landing() -> String {
    document(
        "Welcome",
        r#"<div class="center"><div>
<h1>Library Book Management</h1>
<p><a href="/user/login">Sign in</a> or <a href="/user/register">create an account</a>.</p>
</div></div>"#,
    )
}

fn error_block(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error" role="alert">{}</p>"#, escape(e)))
        .unwrap_or_default()
}

pub fn login_form(error: Option<&str>, email: &str) -> String {
    document(
        "Sign in",
        &format!(
            r#"<div class="center">
<form class="card" method="post" action="/user/login">
<h1>Sign in</h1>
{error}
<label>Email <input type="email" name="email" value="{email}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Sign in</button>
<p>No account yet? <a href="/user/register">Register</a></p>
</form>
</div>"#,
            error = error_block(error),
            email = escape(email),
        ),
    )
}

pub fn register_form(error: Option<&str>, email: &str) -> String {
    document(
        "Register",
        &format!(
            r#"<div class="center">
<form class="card" method="post" action="/user/register">
<h1>Create an account</h1>
{error}
<label>Email <input type="email" name="email" value="{email}" required></label>
<label>Password <input type="password" name="password" required></label>
<label>Confirm password <input type="password" name="confirmPassword" required></label>
<button type="submit">Register</button>
<p>Already registered? <a href="/user/login">Sign in</a></p>
</form>
</div>"#,
            error = error_block(error),
            email = escape(email),
        ),
    )
}

/// Signed-in layout: sidebar navigation, header with the user's email and a
/// sign-out action around `content`
pub fn protected_shell(title: &str, email: &str, content: &str) -> String {
    document(
        title,
        &format!(
            r#"<div class="layout">
<nav class="sidebar">
<strong>Bookshelf</strong>
<a href="/dashboard">Dashboard</a>
<a href="/dashboard/booksManagement/list">Books</a>
</nav>
<div class="main">
<header>
<span>Library Book Management</span>
<div class="user">
<span>Welcome, {email}</span>
<form method="post" action="/user/logout"><button type="submit">Sign out</button></form>
</div>
</header>
<div class="content">
{content}
</div>
</div>
</div>"#,
            email = escape(email),
        ),
    )
}

pub fn dashboard_home() -> String {
    r#"<div class="center" style="min-height: 60vh"><h1>Welcome to the library book management system</h1></div>"#
        .to_string()
}

fn page_link(query: &BookQuery, page: i64) -> String {
    let mut link = format!("?page={}&pageSize={}", page, query.page_size);
    for (column, value) in query.filters() {
        link.push_str(&format!("&{}={}", column, escape(&urlencoding::encode(value))));
    }
    link
}

/// Searchable, paginated book table
pub fn book_table(list: &BookList, query: &BookQuery) -> String {
    let filter = |v: &Option<String>| escape(v.as_deref().unwrap_or_default());

    let rows: String = if list.data.is_empty() {
        r#"<tr><td colspan="7">No books found</td></tr>"#.to_string()
    } else {
        list.data
            .iter()
            .map(|book| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&book.title),
                    escape(&book.author),
                    escape(&book.isbn),
                    escape(&book.category),
                    book.quantity,
                    book.status.label(),
                    book.create_time.format("%Y-%m-%d"),
                )
            })
            .collect()
    };

    let p = &list.pagination;
    let prev = if p.page > 1 {
        format!(r#"<a href="{}">Previous</a>"#, page_link(query, p.page - 1))
    } else {
        String::new()
    };
    let next = if p.page < p.total_pages {
        format!(r#"<a href="{}">Next</a>"#, page_link(query, p.page + 1))
    } else {
        String::new()
    };

    format!(
        r#"<h1>Books</h1>
<form method="get">
<input name="title" placeholder="Title" value="{title}">
<input name="author" placeholder="Author" value="{author}">
<input name="category" placeholder="Category" value="{category}">
<input type="hidden" name="pageSize" value="{page_size}">
<button type="submit">Search</button>
</form>
<table>
<thead><tr><th>Title</th><th>Author</th><th>ISBN</th><th>Category</th><th>Quantity</th><th>Status</th><th>Added</th></tr></thead>
<tbody>{rows}</tbody>
</table>
<p>Page {page} of {total_pages} ({total} books) {prev} {next}</p>"#,
        title = filter(&query.title),
        author = filter(&query.author),
        category = filter(&query.category),
        page_size = query.page_size,
        page = p.page,
        total_pages = p.total_pages.max(1),
        total = p.total,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book::Pagination;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_shell_escapes_email_and_offers_sign_out() {
        let html = protected_shell("Dashboard", "<b>@x.test", "<p>content</p>");
        assert!(html.contains("Welcome, &lt;b&gt;@x.test"));
        assert!(html.contains(r#"action="/user/logout""#));
        assert!(html.contains("<p>content</p>"));
    }

    #[test]
    fn test_placeholder_has_no_shell() {
        let html = placeholder();
        assert!(!html.contains("Sign out"));
        assert!(!html.contains("sidebar"));
    }

    #[test]
    fn test_book_table_pagination_links_keep_filters() {
        let list = BookList {
            data: Vec::new(),
            pagination: Pagination::new(2, 10, 35),
        };
        let query = BookQuery {
            page: 2,
            title: Some("war & peace".to_string()),
            ..BookQuery::default()
        };
        let html = book_table(&list, &query);
        assert!(html.contains("No books found"));
        assert!(html.contains(r#"href="?page=1&pageSize=10&title=war%20%26%20peace""#));
        assert!(html.contains(r#"href="?page=3&pageSize=10&title=war%20%26%20peace""#));
        assert!(html.contains("Page 2 of 4 (35 books)"));
    }
}
