use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::settings::ConvertSettings;

const MANIFEST_FILE: &str = "manifest.txt";
const CHUNK_EXT: &str = ".txt";

/// Book ID from a tStudio folder name: `lang_book_suffix` or a bare
/// three-character name. Anything else gives an empty ID.
pub fn book_id(folder: &str) -> String {
    let parts: Vec<&str> = folder.split('_').collect();
    let id = match parts.as_slice() {
        [_, book, _] => *book,
        [only] if only.chars().count() == 3 => *only,
        _ => "",
    };
    id.to_uppercase()
}

fn is_two_digits(s: &str) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit()) && s != "00"
}

/// `01` through `99`.
pub fn is_chapter(dirname: &str) -> bool {
    is_two_digits(dirname)
}

/// `01.txt` through `99.txt`.
pub fn is_chunk(filename: &str) -> bool {
    filename
        .strip_suffix(CHUNK_EXT)
        .is_some_and(is_two_digits)
}

// ── Reference table ──

#[derive(Debug, Clone, Deserialize)]
pub struct BookInfo {
    pub en_name: String,
}

/// Book ID to English name, loaded once per run from `verses.json`.
#[derive(Debug, Clone, Default)]
pub struct BookTable {
    books: HashMap<String, BookInfo>,
}

impl BookTable {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read book table {:?}", path))?;
        Self::from_json(&raw).with_context(|| format!("Bad book table {:?}", path))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let books = serde_json::from_str(raw)?;
        Ok(BookTable { books })
    }

    pub fn title(&self, id: &str) -> Option<&str> {
        self.books.get(id).map(|b| b.en_name.as_str())
    }
}

// ── Notes to Markdown ──

/// One tStudio note record.
#[derive(Debug, Clone, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Each note as `# title`, then its body, separated by blank lines.
pub fn render_notes(notes: &[Note]) -> String {
    let mut out = String::new();
    for note in notes {
        out.push_str("# ");
        out.push_str(note.title.trim());
        out.push_str("\n\n");
        out.push_str(&note.body.trim().replace("\r\n", "\n"));
        out.push_str("\n\n");
    }
    out
}

/// `<target>/<ID>/<chapter>/<NN>.md`
pub fn md_path(target: &Path, id: &str, chapter: &str, chunk: &str) -> PathBuf {
    let stem: String = chunk.chars().take(2).collect();
    target.join(id).join(chapter).join(format!("{}.md", stem))
}

// ── Manifest ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub title: String,
    pub identifier: String,
    pub path: String,
}

impl ManifestEntry {
    /// Notes or questions is decided by the folder suffix (`..._tq`).
    pub fn new(folder: &str, id: &str, book_title: &str) -> Self {
        let kind = if folder.ends_with(['q', 'Q']) {
            "translationQuestions"
        } else {
            "translationNotes"
        };
        ManifestEntry {
            title: format!("{} {}", book_title, kind),
            identifier: id.to_lowercase(),
            path: format!("./{}", id),
        }
    }

    /// Project entry ready to be pasted under `projects:` in a manifest.yaml.
    pub fn to_yaml_fragment(&self) -> String {
        format!(
            "  -\n    title: '{}'\n    versification: ''\n    identifier: '{}'\n    sort: 0\n    path: '{}'\n    categories: []\n",
            quote(&self.title),
            quote(&self.identifier),
            quote(&self.path),
        )
    }
}

fn quote(s: &str) -> String {
    s.replace('\'', "''")
}

/// The manifest fragment, truncated at the start of a run and appended to
/// once per converted book.
#[derive(Debug)]
pub struct ManifestWriter {
    path: PathBuf,
    file: File,
    entries: usize,
}

impl ManifestWriter {
    pub fn create(path: PathBuf) -> Result<Self> {
        if path.is_file() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {:?}", path))?;
        Ok(ManifestWriter {
            path,
            file,
            entries: 0,
        })
    }

    pub fn append(&mut self, entry: &ManifestEntry) -> Result<()> {
        self.file
            .write_all(entry.to_yaml_fragment().as_bytes())
            .with_context(|| format!("Failed to append to {:?}", self.path))?;
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ── Conversion ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookOutcome {
    /// Folder name does not follow either naming convention.
    NotABook,
    /// Folder looks like a book but the ID is not in the reference table.
    UnknownBook(String),
    Converted { id: String, chunks: usize },
}

impl BookOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, BookOutcome::Converted { .. })
    }
}

pub struct Converter {
    target_dir: PathBuf,
    books: BookTable,
    manifest: ManifestWriter,
}

impl Converter {
    /// Prepare the target directory and start a fresh manifest fragment.
    pub fn new(target_dir: PathBuf, books: BookTable) -> Result<Self> {
        fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create {:?}", target_dir))?;
        let manifest = ManifestWriter::create(target_dir.join(MANIFEST_FILE))?;
        Ok(Converter {
            target_dir,
            books,
            manifest,
        })
    }

    pub fn from_settings(settings: &ConvertSettings) -> Result<Self> {
        let books = BookTable::load(&settings.verses_path)?;
        Self::new(settings.target_dir.clone(), books)
    }

    pub fn manifest(&self) -> &ManifestWriter {
        &self.manifest
    }

    /// Convert `dir` as one book, or failing that every book folder directly inside it.
    pub fn convert(&mut self, dir: &Path) -> Result<Vec<BookOutcome>> {
        let outcome = self.convert_book(dir)?;
        if outcome.is_converted() {
            return Ok(vec![outcome]);
        }
        let mut outcomes = Vec::new();
        for folder in child_dirs(dir)? {
            outcomes.push(self.convert_book(&folder)?);
        }
        Ok(outcomes)
    }

    pub fn convert_book(&mut self, path: &Path) -> Result<BookOutcome> {
        let folder = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = book_id(&folder);
        if id.is_empty() {
            debug!("not a book folder: {:?}", path);
            return Ok(BookOutcome::NotABook);
        }
        let Some(title) = self.books.title(&id).map(str::to_string) else {
            warn!(book = %id, "book not in reference table, skipping {:?}", path);
            return Ok(BookOutcome::UnknownBook(id));
        };

        println!("Converting: {}", folder);
        let mut chunks = 0;
        for chapter_dir in child_dirs(path)? {
            let chapter = dir_name(&chapter_dir);
            if is_chapter(&chapter) {
                chunks += self.convert_chapter(&id, &chapter, &chapter_dir)?;
            }
        }
        self.manifest
            .append(&ManifestEntry::new(&folder, &id, &title))?;
        info!(book = %id, chunks, "book converted");
        Ok(BookOutcome::Converted { id, chunks })
    }

    fn convert_chapter(&self, id: &str, chapter: &str, dir: &Path) -> Result<usize> {
        let mut written = 0;
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.context("Failed to read directory entry")?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().is_file() && is_chunk(&name) {
                self.convert_chunk(id, chapter, &name, entry.path())?;
                written += 1;
            }
        }
        Ok(written)
    }

    fn convert_chunk(&self, id: &str, chapter: &str, chunk: &str, source: &Path) -> Result<()> {
        let raw = fs::read_to_string(source)
            .with_context(|| format!("Failed to read {:?}", source))?;
        let notes: Vec<Note> = serde_json::from_str(&raw)
            .with_context(|| format!("Bad note list in {:?}", source))?;
        let out = md_path(&self.target_dir, id, chapter, chunk);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        fs::write(&out, render_notes(&notes))
            .with_context(|| format!("Failed to write {:?}", out))
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Immediate subdirectories of `dir`, sorted by name.
fn child_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to list {:?}", dir))?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

// ── Tests ──
