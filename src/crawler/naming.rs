//! Local filenames for downloaded assets

use url::Url;

/// Filename the origin uses for its "no picture available" placeholder
pub const PLACEHOLDER_IMAGE: &str = "nopic.gif";

/// Extension given to every saved book text
pub const TEXT_EXTENSION: &str = "txt";

const MAX_FILENAME_BYTES: usize = 200;

/// Makes a string safe to use as a single filename
///
/// Strips characters that are illegal on common filesystems (`/ \ : * ? " < > |`
/// and control characters), trims surrounding dots and spaces, and caps the
/// length at a char boundary. Non-ASCII text is kept as-is.
pub fn sanitize_filename(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| {
            !c.is_control()
                && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        })
        .collect();

    let mut name = stripped
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string();

    if name.len() > MAX_FILENAME_BYTES {
        let mut cut = MAX_FILENAME_BYTES;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
        name = name.trim_end().to_string();
    }

    name
}

/// Numeric book id from an item URL
///
/// `https://tululu.org/b550/` yields `550`. Returns None if the first path
/// segment is not a single letter followed by digits.
pub fn item_id_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.find(|s| !s.is_empty())?;
    let mut chars = segment.chars();
    let prefix = chars.next()?;
    let digits = chars.as_str();

    if !prefix.is_ascii_alphabetic()
        || digits.is_empty()
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    Some(digits.to_string())
}

/// Filename for a book text: `"{id}.{title}.txt"` after sanitization
pub fn text_filename(item_id: &str, title: &str) -> String {
    let stem = sanitize_filename(&format!("{}.{}", item_id, title));
    let stem = if stem.is_empty() { item_id.to_string() } else { stem };
    format!("{}.{}", stem, TEXT_EXTENSION)
}

/// Filename for a cover image
///
/// The placeholder keeps its reserved name so every book without a cover
/// shares one file; otherwise the name is the item id plus the extension of
/// the source path (none if the path has none).
pub fn image_filename(source: &Url, item_id: &str) -> String {
    let path = urlencoding::decode(source.path())
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| source.path().to_string());

    let file_part = path.rsplit('/').next().unwrap_or_default();

    if file_part == PLACEHOLDER_IMAGE {
        return PLACEHOLDER_IMAGE.to_string();
    }

    match file_part.rsplit_once('.') {
        Some((_, extension)) if !extension.is_empty() => {
            format!("{}.{}", item_id, sanitize_filename(extension))
        }
        _ => item_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_illegal_characters() {
        assert_eq!(sanitize_filename("Who: are/you?"), "Who areyou");
        assert_eq!(sanitize_filename("a<b>c|d\"e*f\\g"), "abcdefg");
        assert_eq!(sanitize_filename("line\nbreak\t"), "linebreak");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_filename("Алиби"), "Алиби");
    }

    #[test]
    fn test_sanitize_trims_dots_and_spaces() {
        assert_eq!(sanitize_filename("  ..title..  "), "title");
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "я".repeat(300);
        let sanitized = sanitize_filename(&long);
        assert!(sanitized.len() <= MAX_FILENAME_BYTES);
        assert!(sanitized.chars().all(|c| c == 'я'));
    }

    #[test]
    fn test_item_id_from_url() {
        let url = Url::parse("https://tululu.org/b550/").unwrap();
        assert_eq!(item_id_from_url(&url), Some("550".to_string()));

        let url = Url::parse("https://tululu.org/b9").unwrap();
        assert_eq!(item_id_from_url(&url), Some("9".to_string()));
    }

    #[test]
    fn test_item_id_rejects_other_paths() {
        for raw in [
            "https://tululu.org/",
            "https://tululu.org/550/",
            "https://tululu.org/book12/",
            "https://tululu.org/b55x/",
        ] {
            let url = Url::parse(raw).unwrap();
            assert_eq!(item_id_from_url(&url), None, "{}", raw);
        }
    }

    #[test]
    fn test_text_filename() {
        assert_eq!(text_filename("239", "Алиби"), "239.Алиби.txt");
        assert_eq!(text_filename("1", "What? No: way"), "1.What No way.txt");
    }

    #[test]
    fn test_image_filename_from_extension() {
        let url = Url::parse("https://tululu.org/shots/239.jpg").unwrap();
        assert_eq!(image_filename(&url, "239"), "239.jpg");

        let url = Url::parse("https://tululu.org/shots/%D0%BE%D0%B1.png").unwrap();
        assert_eq!(image_filename(&url, "7"), "7.png");
    }

    #[test]
    fn test_image_filename_placeholder() {
        let url = Url::parse("https://tululu.org/images/nopic.gif").unwrap();
        assert_eq!(image_filename(&url, "239"), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_image_filename_without_extension() {
        let url = Url::parse("https://tululu.org/shots/cover").unwrap();
        assert_eq!(image_filename(&url, "5"), "5");
    }
}
