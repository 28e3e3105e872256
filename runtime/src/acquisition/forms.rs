//! Discovery of forms that gate a download behind a submit.
//!
//! Some sites only reveal the file after a POST carrying hidden tokens. Forms
//! are replayed with their pre-filled values; nothing is typed in.

use crate::acquisition::candidates::resolve_url;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Words in a form's markup that suggest it leads to a file.
const FORM_HINTS: &[&str] = &["download", "get", "submit", "file"];

/// HTTP method a form submits with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormMethod {
    Get,
    Post,
}

/// A form worth submitting, with its pre-filled field values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadForm {
    /// Resolved action URL; the page URL when `action` is missing.
    pub action_url: String,
    pub method: FormMethod,
    /// `(name, value)` for every named `<input>`.
    pub fields: Vec<(String, String)>,
}

/// Find forms whose markup hints at a download.
pub fn discover_forms(html: &str, base_url: &str) -> Vec<DownloadForm> {
    let document = Html::parse_document(html);
    let mut forms = Vec::new();

    let form_sel = match Selector::parse("form") {
        Ok(s) => s,
        Err(_) => return forms,
    };
    let input_sel = Selector::parse("input").expect("input selector is valid");

    for form in document.select(&form_sel) {
        let markup = form.html().to_lowercase();
        if !FORM_HINTS.iter().any(|hint| markup.contains(hint)) {
            continue;
        }

        let action_raw = form.value().attr("action").unwrap_or("").trim();
        let action_url = if action_raw.is_empty() {
            base_url.to_string()
        } else {
            resolve_url(base_url, action_raw)
        };

        let method = match form.value().attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
            _ => FormMethod::Get,
        };

        let fields = form
            .select(&input_sel)
            .filter_map(|input| {
                let name = input.value().attr("name")?;
                if name.is_empty() {
                    return None;
                }
                let value = input.value().attr("value").unwrap_or("");
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        forms.push(DownloadForm {
            action_url,
            method,
            fields,
        });
    }

    forms
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://books.example/book/3";

    #[test]
    fn test_post_form_with_hidden_token() {
        let html = r#"
            <form action="/download.php" method="POST">
                <input type="hidden" name="token" value="abc">
                <input type="hidden" name="id" value="3">
                <input type="submit" value="تحميل">
            </form>
        "#;
        let forms = discover_forms(html, BASE);
        assert_eq!(forms.len(), 1);
        let f = &forms[0];
        assert_eq!(f.action_url, "https://books.example/download.php");
        assert_eq!(f.method, FormMethod::Post);
        assert_eq!(
            f.fields,
            vec![
                ("token".to_string(), "abc".to_string()),
                ("id".to_string(), "3".to_string())
            ]
        );
    }

    #[test]
    fn test_missing_action_targets_page() {
        let html = r#"<form><input name="file_id" value="9"></form>"#;
        let forms = discover_forms(html, BASE);
        assert_eq!(forms[0].action_url, BASE);
        assert_eq!(forms[0].method, FormMethod::Get);
    }

    #[test]
    fn test_unrelated_form_skipped() {
        let html = r#"<form action="/login" method="post"><input name="user"></form>"#;
        assert!(discover_forms(html, BASE).is_empty());
    }
}
