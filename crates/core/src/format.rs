//! Chatbox message templates

/// Maximum chatbox payload length, in characters
pub const CHATBOX_MAX_CHARS: usize = 144;

/// Substitute `{song_artist}`, `{song_title}` and `{song_position}` in `template`.
///
/// `{{` and `}}` produce literal braces. Unknown placeholders are kept as written.
pub fn render(template: &str, artist: &str, title: &str, position: &str) -> String {
    let mut out = String::with_capacity(template.len() + artist.len() + title.len() + position.len());
    let mut rest = template;

    while let Some(idx) = rest.find(['{', '}']) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{') {
            if let Some(end) = tail.find('}') {
                let value = match &tail[1..end] {
                    "song_artist" => Some(artist),
                    "song_title" => Some(title),
                    "song_position" => Some(position),
                    _ => None,
                };
                if let Some(value) = value {
                    out.push_str(value);
                    rest = &tail[end + 1..];
                    continue;
                }
            }
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

/// Cut `text` down to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
