//! String filters.

/// Concatenates two strings.
pub fn append(s: String, other: String) -> String {
    s + &other
}

/// Prepends another string.
pub fn prepend(s: String, other: String) -> String {
    other + &s
}

/// Upper cases the first character and lower cases the rest.
pub fn capitalize(s: String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => s,
    }
}

pub fn downcase(s: String) -> String {
    s.to_lowercase()
}

pub fn upcase(s: String) -> String {
    s.to_uppercase()
}

pub fn strip(s: String) -> String {
    s.trim().to_owned()
}

pub fn lstrip(s: String) -> String {
    s.trim_start().to_owned()
}

pub fn rstrip(s: String) -> String {
    s.trim_end().to_owned()
}

/// Replaces every occurrence of `from`.
pub fn replace(s: String, from: String, to: String) -> String {
    s.replace(&from, &to)
}

pub fn replace_first(s: String, from: String, to: String) -> String {
    s.replacen(&from, &to, 1)
}

pub fn remove(s: String, x: String) -> String {
    s.replace(&x, "")
}

pub fn remove_first(s: String, x: String) -> String {
    s.replacen(&x, "", 1)
}

/// Splits a string into an array. Trailing empty strings are dropped and an
/// empty separator splits into characters.
pub fn split(s: String, sep: String) -> Vec<String> {
    let mut parts: Vec<String> = if sep.is_empty() {
        s.chars().map(String::from).collect()
    } else {
        s.split(sep.as_str()).map(String::from).collect()
    };
    while parts.last().map_or(false, String::is_empty) {
        parts.pop();
    }
    parts
}

/// Shortens a string to `n` characters including the ellipsis.
pub fn truncate(s: String, n: Option<i64>, ellipsis: Option<String>) -> String {
    let n = n.unwrap_or(50).max(0) as usize;
    let ellipsis = ellipsis.unwrap_or_else(|| String::from("..."));
    if s.chars().count() <= n {
        return s;
    }
    let keep = n.saturating_sub(ellipsis.chars().count());
    s.chars().take(keep).chain(ellipsis.chars()).collect()
}

/// Shortens a string to `n` words.
pub fn truncatewords(s: String, n: Option<i64>, ellipsis: Option<String>) -> String {
    let n = n.unwrap_or(15).max(1) as usize;
    let words: Vec<&str> = s.split_whitespace().collect();
    if words.len() <= n {
        return s;
    }
    let ellipsis = ellipsis.unwrap_or_else(|| String::from("..."));
    words[..n].join(" ") + &ellipsis
}

pub fn newline_to_br(s: String) -> String {
    s.replace("\r\n", "\n").replace('\n', "<br />\n")
}

pub fn strip_newlines(s: String) -> String {
    s.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

/// Removes HTML tags, comments and the bodies of `script` and `style`
/// elements.
pub fn strip_html(s: String) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s.as_str();
    while let Some(i) = rest.find('<') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        let lower = rest.get(..7).unwrap_or(rest).to_ascii_lowercase();
        let end = if lower.starts_with("<script") {
            "</script>"
        } else if lower.starts_with("<style") {
            "</style>"
        } else if rest.starts_with("<!--") {
            "-->"
        } else {
            ">"
        };
        match find_ignore_case(rest, end) {
            Some(j) => rest = &rest[j + end.len()..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| {
            haystack
                .get(i..i + needle.len())
                .map_or(false, |s| s.eq_ignore_ascii_case(needle))
        })
}

/// Escapes the HTML special characters `&<>"'`.
pub fn escape(s: String) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes a string without escaping existing entities again.
pub fn escape_once(s: String) -> String {
    escape(unescape(&s))
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Percent encodes a string for use in a URL query. Spaces become `+`.
pub fn url_encode(s: String) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b' ' => out.push('+'),
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            b => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Reverses [`url_encode`]. Malformed escapes are kept as is.
pub fn url_decode(s: String) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = s.get(i + 1..i + 3).and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(b) = hex {
                    out.push(b);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_lowers_rest() {
        assert_eq!(capitalize("hELLO world".into()), "Hello world");
        assert_eq!(capitalize(String::new()), "");
    }

    #[test]
    fn split_drops_trailing_empty() {
        assert_eq!(split("a,b,,".into(), ",".into()), ["a", "b"]);
        assert_eq!(split("abc".into(), "".into()), ["a", "b", "c"]);
        assert_eq!(split(",a".into(), ",".into()), ["", "a"]);
    }

    #[test]
    fn truncate_counts_ellipsis() {
        assert_eq!(truncate("Ground control to Major Tom.".into(), Some(20), None), "Ground control to...");
        assert_eq!(truncate("short".into(), Some(20), None), "short");
        assert_eq!(truncate("abcdef".into(), Some(3), Some(String::new())), "abc");
    }

    #[test]
    fn truncatewords_appends_ellipsis() {
        assert_eq!(truncatewords("one two three".into(), Some(2), None), "one two...");
        assert_eq!(truncatewords("one two".into(), Some(2), None), "one two");
    }

    #[test]
    fn strip_html_removes_tags() {
        let html = "<p>Hi <b>there</b></p><script>alert(1)</script><!-- x -->!".to_owned();
        assert_eq!(strip_html(html), "Hi there!");
        assert_eq!(strip_html("a < b".into()), "a ");
    }

    #[test]
    fn escape_and_once() {
        assert_eq!(escape("<a href=\"x\">Tom & Jerry's</a>".into()), "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;");
        assert_eq!(escape_once("1 &lt; 2 & 3".into()), "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn url_round_trip() {
        assert_eq!(url_encode("john@liquid.com x".into()), "john%40liquid.com+x");
        assert_eq!(url_decode("%27Stop%21%27+said+Fred".into()), "'Stop!' said Fred");
        assert_eq!(url_decode("100%".into()), "100%");
    }

    #[test]
    fn newlines() {
        assert_eq!(newline_to_br("a\nb\r\nc".into()), "a<br />\nb<br />\nc");
        assert_eq!(strip_newlines("a\nb\r\nc".into()), "abc");
    }
}
