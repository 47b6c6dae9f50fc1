//! SSML document construction.

use crate::VoiceProfile;

/// Wrap one text fragment in an SSML document selecting the configured
/// voice and speaking rate. The text is trimmed and XML-escaped.
pub fn wrap_fragment(voice: &VoiceProfile, text: &str) -> String {
    format!(
        concat!(
            r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="{lang}">"#,
            r#"<voice name="{name}"><prosody rate="{rate}%">{text}</prosody></voice>"#,
            "</speak>",
        ),
        lang = voice.language,
        name = voice.name,
        rate = voice.rate_percent,
        text = escape(text.trim()),
    )
}

/// Escape the five XML special characters.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
