//! 文本处理 - 去除标记、短代码，统计词数，截断摘要，解码 HTML 实体

use regex::{Captures, Regex};
use std::sync::LazyLock;

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("Invalid script regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid tag regex"));

// [gallery ids="1,2"]、[/caption]、[embed]...[/embed] 等短代码标记
static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[/?[A-Za-z][\w-]*(?:\s[^\]]*)?/?\]").expect("Invalid shortcode regex")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("Invalid entity regex")
});

/// 移除 HTML 标记（script/style 连同内容一起移除）
pub fn strip_markup(text: &str) -> String {
    let without_blocks = SCRIPT_STYLE_RE.replace_all(text, "");
    TAG_RE.replace_all(&without_blocks, "").into_owned()
}

/// 移除短代码标记，保留被包裹的文本
pub fn strip_shortcodes(text: &str) -> String {
    SHORTCODE_RE.replace_all(text, "").into_owned()
}

/// 以空白分隔统计词数
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 截断到 `num_words` 个词，仅在发生截断时追加 `more`
pub fn trim_words(text: &str, num_words: usize, more: &str) -> String {
    let stripped = strip_markup(text);
    let words: Vec<&str> = stripped.split_whitespace().collect();
    if words.len() > num_words {
        format!("{}{}", words[..num_words].join(" "), more)
    } else {
        words.join(" ")
    }
}

/// 解码 HTML 实体为纯文本，未知实体原样保留
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            decode_entity(entity).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(|c| c.to_string());
    }

    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "hellip" => "…",
        "mdash" => "—",
        "ndash" => "–",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        "laquo" => "«",
        "raquo" => "»",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        _ => return None,
    };
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(
            strip_markup("a<script type=\"x\">var x = 1;</script>b<style>p{}</style>c"),
            "abc"
        );
    }

    #[test]
    fn test_strip_shortcodes_keeps_enclosed_text() {
        assert_eq!(
            strip_shortcodes("Intro [caption id=\"1\"]A photo[/caption] end [gallery]"),
            "Intro A photo end "
        );
        // 普通方括号内容（非短代码）不受影响
        assert_eq!(strip_shortcodes("see [1] and [ note ]"), "see [1] and [ note ]");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  one two\nthree\tfour  "), 4);
    }

    #[test]
    fn test_trim_words_truncates_with_marker() {
        assert_eq!(trim_words("a b c d e", 3, "..."), "a b c...");
    }

    #[test]
    fn test_trim_words_no_marker_when_short() {
        assert_eq!(trim_words("a  b\n c", 3, "..."), "a b c");
        assert_eq!(trim_words("<p>a b</p>", 5, "..."), "a b");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("It&#039;s &quot;fine&quot;"), "It's \"fine\"");
        assert_eq!(decode_entities("&#x263A; &hellip;"), "☺ …");
        assert_eq!(decode_entities("&unknown; & plain"), "&unknown; & plain");
    }
}
