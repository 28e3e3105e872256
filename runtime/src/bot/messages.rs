//! User-facing chat text.

use crate::search::SearchHit;

pub const WELCOME: &str =
    "📚 بوت التحميل الجاهز! استخدم /search <اسم الكتاب> أو أرسل رابط مباشر.";

pub const HELP: &str = "أرسل: /search <اسم الكتاب أو المؤلف>\n\
مثال: /search ابن تيمية\n\n\
أو أرسل رابط صفحة الكتاب مباشرة وسأحاول استخراج ملف PDF منها.";

pub const SEARCH_USAGE: &str = "استخدم: /search اسم الكتاب أو المؤلف";
pub const RATE_LIMITED: &str = "⏳ انتظر قليلاً قبل طلب بحث آخر.";
pub const NO_RESULTS: &str = "❌ لم أجد نتائج موثوقة.";
pub const INVALID_LINK: &str = "⚠️ خطأ: الرابط غير صالح.";
pub const EXTRACTING: &str = "⏳ أحاول استخراج رابط التحميل... يرجى الانتظار.";
pub const SENT: &str = "✅ تم إرسال الكتاب.";
pub const UNKNOWN: &str = "أمر غير معروف. استخدم /search <اسم الكتاب أو المؤلف>";

/// Longest title shown in a result list.
pub const TITLE_DISPLAY_CHARS: usize = 100;

pub fn searching(query: &str) -> String {
    format!("🔍 أبحث عن {query} ...")
}

pub fn search_failed(error: &anyhow::Error) -> String {
    format!("⚠️ خطأ أثناء البحث: {error}")
}

pub fn send_failed(error: &dyn std::fmt::Display) -> String {
    format!("⚠️ خطأ أثناء إرسال الملف: {error}")
}

pub fn not_found(source: &str) -> String {
    format!(
        "📄 لم أتمكن من استخلاص رابط PDF من المصدر: {source}\n\n\
ملاحظة: إن كان الموقع يعتمد على تنفيذ جافاسكربت معقد أو CAPTCHA فذلك يتطلب متصفحًا حقيقياً."
    )
}

/// Label of the download button for 1-based result `n`.
pub fn download_button(n: usize) -> String {
    format!("📥 تحميل {n}")
}

/// Numbered result list, titles cut to [`TITLE_DISPLAY_CHARS`].
pub fn result_list(hits: &[SearchHit]) -> String {
    let mut lines = vec!["📚 النتائج:".to_string()];
    for (i, hit) in hits.iter().enumerate() {
        let title: String = hit.title.chars().take(TITLE_DISPLAY_CHARS).collect();
        lines.push(format!("{}. {title}", i + 1));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_list_truncates_titles() {
        let hits = vec![
            SearchHit {
                title: "x".repeat(150),
                link: "https://a.example".into(),
                snippet: String::new(),
            },
            SearchHit {
                title: "كتاب".into(),
                link: "https://b.example".into(),
                snippet: String::new(),
            },
        ];
        let text = result_list(&hits);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], format!("1. {}", "x".repeat(100)));
        assert_eq!(lines[2], "2. كتاب");
    }

    #[test]
    fn test_not_found_names_source() {
        assert!(not_found("https://a.example/b").contains("https://a.example/b"));
        assert_eq!(download_button(3), "📥 تحميل 3");
    }
}
