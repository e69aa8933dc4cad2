//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
//! Document discovery and decoding.
//!
//! Files are found by a recursive walk whose entries are sorted by name in
//! every directory, so the order of documents (and hence of matrix rows) is
//! stable across runs on an unchanged tree.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, TopicError};

/// Text decoding applied to every file of a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl Encoding {
    /// Strictly decode `bytes`; nothing is replaced or dropped.
    pub fn decode(&self, path: &Path, bytes: &[u8]) -> Result<String> {
        match self {
            Encoding::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(bytes)
                    .map(str::to_owned)
                    .map_err(|e| self.error(path, e.to_string()))
            }
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(self.error(
                    path,
                    format!("byte 0x{:02x} at offset {} is not ascii", bytes[offset], offset),
                )),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            // every byte maps onto the code point of the same value
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    fn error(&self, path: &Path, detail: String) -> TopicError {
        TopicError::Encoding {
            path: path.to_path_buf(),
            encoding: self.to_string(),
            detail,
        }
    }
}

impl FromStr for Encoding {
    type Err = TopicError;

    fn from_str(label: &str) -> Result<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            other => Err(TopicError::invalid(
                "encoding",
                format!("unsupported encoding \"{}\"", other),
            )),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Encoding::Utf8 => "utf8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin1",
        };
        f.write_str(label)
    }
}

/// One input file and its decoded contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
}

impl AsRef<str> for Document {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Recursively collect up to `max_files` regular files below `root`.
///
/// Symlinks to files are listed; symlinked directories are not descended
/// into. A cap of zero means no cap.
pub fn get_documents(root: &Path, max_files: Option<usize>) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(TopicError::EmptyCorpus {
            detail: format!("{} is not a directory", root.display()),
        });
    }

    let max_files = max_files.filter(|&max| max > 0);
    let mut files_vector: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            TopicError::io(path, e.into())
        })?;

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file {
            files_vector.push(entry.into_path());
            if max_files.map_or(false, |max| files_vector.len() >= max) {
                break;
            }
        }
    }

    Ok(files_vector)
}

pub fn read_document(path: &Path, encoding: Encoding) -> Result<Document> {
    let bytes = fs::read(path).map_err(|e| TopicError::io(path, e))?;
    let text = encoding.decode(path, &bytes)?;
    Ok(Document {
        path: path.to_path_buf(),
        text,
    })
}

/// Discover and decode every document below `root`.
///
/// Fails with [`TopicError::EmptyCorpus`] when no file is found and on the
/// first file that cannot be decoded.
pub fn load_corpus(
    root: &Path,
    encoding: Encoding,
    max_files: Option<usize>,
) -> Result<Vec<Document>> {
    let paths = get_documents(root, max_files)?;
    if paths.is_empty() {
        return Err(TopicError::EmptyCorpus {
            detail: format!("no files found below {}", root.display()),
        });
    }

    info!(files = paths.len(), root = %root.display(), %encoding, "loading corpus");

    paths
        .iter()
        .map(|path| {
            debug!(path = %path.display(), "reading document");
            read_document(path, encoding)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn walks_recursively_in_name_order() {
        let dir = tempdir().unwrap();
        write(dir.path(), "b.txt", b"b");
        write(dir.path(), "a.txt", b"a");
        write(dir.path(), "sub/c.txt", b"c");
        write(dir.path(), "sub/deeper/d.txt", b"d");

        let files = get_documents(dir.path(), None).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("sub/c.txt"),
                PathBuf::from("sub/deeper/d.txt"),
            ]
        );
    }

    #[test]
    fn max_files_caps_discovery() {
        let dir = tempdir().unwrap();
        for name in ["1.txt", "2.txt", "3.txt"] {
            write(dir.path(), name, b"x");
        }
        assert_eq!(get_documents(dir.path(), Some(2)).unwrap().len(), 2);
        assert_eq!(get_documents(dir.path(), Some(10)).unwrap().len(), 3);
    }

    #[test]
    fn zero_max_files_means_no_cap() {
        let dir = tempdir().unwrap();
        for name in ["1.txt", "2.txt", "3.txt"] {
            write(dir.path(), name, b"x");
        }
        assert_eq!(get_documents(dir.path(), Some(0)).unwrap().len(), 3);
        assert_eq!(load_corpus(dir.path(), Encoding::Utf8, Some(0)).unwrap().len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_listed() {
        use std::os::unix::fs::symlink;

        let source = tempdir().unwrap();
        write(source.path(), "real/a.txt", b"cat dog");
        write(source.path(), "real/b.txt", b"dog bird");

        let dir = tempdir().unwrap();
        symlink(source.path().join("real/a.txt"), dir.path().join("a.txt")).unwrap();
        symlink(source.path().join("real/b.txt"), dir.path().join("b.txt")).unwrap();
        // directory links are not followed
        symlink(source.path().join("real"), dir.path().join("linked")).unwrap();
        symlink(source.path().join("missing.txt"), dir.path().join("dangling.txt")).unwrap();

        let files = get_documents(dir.path(), None).unwrap();
        assert_eq!(files, vec![dir.path().join("a.txt"), dir.path().join("b.txt")]);

        let documents = load_corpus(dir.path(), Encoding::Utf8, None).unwrap();
        assert_eq!(documents[0].text, "cat dog");
        assert_eq!(documents[1].text, "dog bird");
    }

    #[test]
    fn missing_root_is_empty_corpus() {
        let dir = tempdir().unwrap();
        let err = get_documents(&dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, TopicError::EmptyCorpus { .. }));
    }

    #[test]
    fn empty_directory_is_empty_corpus() {
        let dir = tempdir().unwrap();
        let err = load_corpus(dir.path(), Encoding::Utf8, None).unwrap_err();
        assert!(matches!(err, TopicError::EmptyCorpus { .. }));
    }

    #[test]
    fn invalid_utf8_is_reported_not_skipped() {
        let dir = tempdir().unwrap();
        write(dir.path(), "good.txt", b"fine text");
        write(dir.path(), "zbad.txt", &[0x66, 0xff, 0xfe]);

        let err = load_corpus(dir.path(), Encoding::Utf8, None).unwrap_err();
        match err {
            TopicError::Encoding { path, encoding, .. } => {
                assert!(path.ends_with("zbad.txt"));
                assert_eq!(encoding, "utf8");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn latin1_decodes_high_bytes() {
        let text = Encoding::Latin1
            .decode(Path::new("x"), &[0x63, 0x61, 0x66, 0xe9])
            .unwrap();
        assert_eq!(text, "café");
        assert!(Encoding::Ascii.decode(Path::new("x"), &[0xe9]).is_err());
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let text = Encoding::Utf8
            .decode(Path::new("x"), b"\xEF\xBB\xBFhello")
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn parses_encoding_labels() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("iso-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!("ascii".parse::<Encoding>().unwrap(), Encoding::Ascii);
        assert!("utf16".parse::<Encoding>().is_err());
    }
}
