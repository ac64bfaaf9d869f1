//! JSON result file
//!
//! The result set is written as a pretty-printed UTF-8 array, one object per
//! book in discovery order:
//!
//! ```json
//! [
//!     {
//!         "title": "Алиби",
//!         "author": "Иванов Сергей",
//!         "img_src": "images/239.jpg",
//!         "book_path": "books/239.Алиби.txt",
//!         "comments": ["..."],
//!         "genres": ["Научная фантастика"]
//!     }
//! ]
//! ```

use crate::crawler::HarvestedBook;
use crate::output::traits::{OutputError, OutputResult};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const INDENT: &[u8] = b"    ";

/// One book as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookEntry<'a> {
    pub title: &'a str,
    pub author: &'a str,
    /// Local cover image path, null when not downloaded
    pub img_src: Option<String>,
    /// Local text path, null when not downloaded
    pub book_path: Option<String>,
    pub comments: &'a [String],
    pub genres: &'a [String],
}

/// Maps harvested books to their persisted form, keeping order
pub fn to_entries(books: &[HarvestedBook]) -> Vec<BookEntry<'_>> {
    books
        .iter()
        .map(|book| BookEntry {
            title: &book.record.title,
            author: &book.record.author,
            img_src: book
                .image
                .as_ref()
                .map(|asset| asset.local_path.to_string_lossy().into_owned()),
            book_path: book
                .text
                .as_ref()
                .map(|asset| asset.local_path.to_string_lossy().into_owned()),
            comments: &book.record.comments,
            genres: &book.record.genres,
        })
        .collect()
}

/// Writes the result set to `path`, replacing any previous file atomically
///
/// # Arguments
///
/// * `books` - The harvested books, in discovery order
/// * `path` - Destination file; its folder is created if missing
pub fn write_results(books: &[HarvestedBook], path: &Path) -> OutputResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let entries = to_entries(books);

    let tmp = NamedTempFile::new_in(dir)?;
    let mut writer = BufWriter::new(tmp);
    let mut serializer =
        Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(INDENT));
    entries.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;

    let tmp = writer
        .into_inner()
        .map_err(|e| OutputError::Io(e.into_error()))?;
    tmp.persist(path).map_err(|e| OutputError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;

    Ok(())
}
