//! Markdown → Telegram HTML conversion for streamed reply text.

use regex::Regex;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Convert the inline markdown subset to Telegram-compatible HTML.
///
/// Telegram HTML accepts only a small tag set; this produces `<b>`, `<i>`,
/// `<code>`, `<pre>` and `<a href="...">`. Code contents are escaped verbatim
/// and never receive emphasis markup.
pub fn markdown_to_html(input: &str) -> String {
    let (text, code_blocks) = extract_code_blocks(input);
    let (mut text, inline_codes) = extract_inline_codes(&text);

    // Escape the remaining text first.
    text = escape_html(&text);

    // Line-oriented emphasis (avoids cross-line pairing bugs).
    let mut lines = Vec::new();
    for line in text.split('\n') {
        let mut l = replace_delimited(line, "**", "<b>", "</b>");
        l = replace_delimited(&l, "__", "<b>", "</b>");
        l = replace_single_delim(&l, '_', "<i>", "</i>");
        l = replace_single_delim(&l, '*', "<i>", "</i>");
        lines.push(l);
    }
    text = lines.join("\n");

    // Links: [text](url) -> <a href="url">text</a>
    // Intentionally conservative (no nested brackets).
    let link_re = Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex");
    text = link_re
        .replace_all(&text, r#"<a href="$2">$1</a>"#)
        .to_string();

    // Restore code blocks
    for (i, code) in code_blocks.iter().enumerate() {
        let escaped = escape_html(code);
        text = text.replace(
            &format!("\0CODEBLOCK{i}\0"),
            &format!("<pre>{escaped}</pre>"),
        );
    }

    // Restore inline code
    for (i, code) in inline_codes.iter().enumerate() {
        let escaped = escape_html(code);
        text = text.replace(
            &format!("\0INLINECODE{i}\0"),
            &format!("<code>{escaped}</code>"),
        );
    }

    text
}

fn extract_code_blocks(input: &str) -> (String, Vec<String>) {
    let mut blocks = Vec::new();
    let mut out = String::new();

    let mut i = 0usize;
    while let Some(rel) = input[i..].find("```") {
        let start = i + rel;
        out.push_str(&input[i..start]);

        let mut p = start + 3;
        // Optional language identifier: [A-Za-z0-9_]+
        while p < input.len() {
            let b = input.as_bytes()[p];
            if b.is_ascii_alphanumeric() || b == b'_' {
                p += 1;
            } else {
                break;
            }
        }
        // Optional single newline
        if p < input.len() && input.as_bytes()[p] == b'\n' {
            p += 1;
        }

        // Find closing fence
        if let Some(end_rel) = input[p..].find("```") {
            let end = p + end_rel;
            let code = input[p..end].to_string();
            let idx = blocks.len();
            blocks.push(code);
            out.push_str(&format!("\0CODEBLOCK{idx}\0"));
            i = end + 3;
            continue;
        }

        // Unclosed fence: append the rest and stop.
        out.push_str(&input[start..]);
        return (out, blocks);
    }

    out.push_str(&input[i..]);
    (out, blocks)
}

fn extract_inline_codes(input: &str) -> (String, Vec<String>) {
    let mut codes = Vec::new();
    let mut out = String::new();

    let mut i = 0usize;
    while let Some(rel) = input[i..].find('`') {
        let start = i + rel;
        out.push_str(&input[i..start]);

        let content_start = start + 1;
        if let Some(end_rel) = input[content_start..].find('`') {
            let end = content_start + end_rel;
            let code = input[content_start..end].to_string();
            let idx = codes.len();
            codes.push(code);
            out.push_str(&format!("\0INLINECODE{idx}\0"));
            i = end + 1;
            continue;
        }

        // Unclosed: append the rest and stop.
        out.push_str(&input[start..]);
        return (out, codes);
    }

    out.push_str(&input[i..]);
    (out, codes)
}

fn replace_delimited(text: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::new();
    let mut i = 0usize;
    while let Some(rel) = text[i..].find(delim) {
        let start = i + rel;
        out.push_str(&text[i..start]);
        let content_start = start + delim.len();
        if let Some(end_rel) = text[content_start..].find(delim) {
            let end = content_start + end_rel;
            out.push_str(open);
            out.push_str(&text[content_start..end]);
            out.push_str(close);
            i = end + delim.len();
            continue;
        }
        out.push_str(&text[start..]);
        return out;
    }
    out.push_str(&text[i..]);
    out
}

fn replace_single_delim(text: &str, delim: char, open: &str, close: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    // A "lone" delimiter is not part of a doubled pair.
    let lone = |i: usize| {
        chars[i] == delim
            && !(i > 0 && chars[i - 1] == delim)
            && !(i + 1 < chars.len() && chars[i + 1] == delim)
    };

    let mut out = String::new();
    let mut i = 0usize;
    while i < chars.len() {
        if !lone(i) {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        // Look for a lone closing delimiter on the same line.
        let mut close_at = None;
        let mut j = i + 1;
        while j < chars.len() && chars[j] != '\n' {
            if lone(j) {
                close_at = Some(j);
                break;
            }
            j += 1;
        }

        match close_at {
            Some(end) => {
                out.push_str(open);
                out.extend(&chars[i + 1..end]);
                out.push_str(close);
                i = end + 1;
            }
            None => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn doubles_become_bold_singles_become_italic() {
        assert_eq!(
            markdown_to_html("**b** and *i* and _j_ and __c__"),
            "<b>b</b> and <i>i</i> and <i>j</i> and <b>c</b>"
        );
    }

    #[test]
    fn code_spans_keep_contents_verbatim() {
        let html = markdown_to_html("use `let x = \"<b>\";` here");
        assert_eq!(html, "use <code>let x = &quot;&lt;b&gt;&quot;;</code> here");
    }

    #[test]
    fn fenced_blocks_become_pre_without_emphasis() {
        let md = "hi\n```js\nconst x = '<i>';\n```\nbye";
        let html = markdown_to_html(md);
        assert!(html.contains("<pre>"));
        assert!(html.contains("const x = '&lt;i&gt;';"));
        assert!(!html.contains("<i>"));
    }

    #[test]
    fn converts_links() {
        let md = "[x](https://example.com)";
        let html = markdown_to_html(md);
        assert_eq!(html, r#"<a href="https://example.com">x</a>"#);
    }

    #[test]
    fn unpaired_markers_stay_literal() {
        assert_eq!(markdown_to_html("2 * 3 equals 6"), "2 * 3 equals 6");
        assert_eq!(markdown_to_html("a ** b"), "a ** b");
    }
}
