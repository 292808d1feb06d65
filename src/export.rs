use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::{
    self, AliasCollector, AliasTable, Catalog, ContentType, TermCatalog, TermUsageCollector,
};
use crate::parser::frame::{extract_frame, Frame};
use crate::parser::keyterm::{extract_key_term, KeyTerm};
use crate::parser::page_id;
use crate::parser::questions::{extract_story, Story};
use crate::settings::ExportSettings;

const KEY_TERM_DIRS: [&str; 2] = ["obe/kt", "obe/other"];
const FRAMES_DIR: &str = "obs/notes/frames";
const QUESTIONS_DIR: &str = "obs/notes/questions";
const HOME_PAGE: &str = "home.txt";

/// `*.txt` pages directly under `dir`, sorted by name, without `home.txt`.
/// A missing directory simply has no pages.
pub fn list_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        warn!("Page directory not found: {:?}", dir);
        return Ok(Vec::new());
    }
    let mut pages = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.context("Failed to read directory entry")?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_file() && name.ends_with(".txt") && name != HOME_PAGE {
            pages.push(entry.into_path());
        }
    }
    Ok(pages)
}

fn read_page(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

/// Everything the frame pass produces. The alias and usage tables are already
/// closed when this is returned.
#[derive(Debug)]
pub struct FramePass {
    pub frames: Vec<Frame>,
    pub aliases: AliasTable,
    pub usage: TermCatalog,
}

pub fn read_frames(dir: &Path, date_modified: &str) -> Result<FramePass> {
    let mut frames = Vec::new();
    let mut aliases = AliasCollector::new();
    let mut usage = TermUsageCollector::new();

    for path in list_pages(dir)? {
        debug!("frame page {:?}", path);
        let page = read_page(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed =
            extract_frame(&name, &page).with_context(|| format!("Bad frame page {:?}", path))?;
        aliases.record(&parsed.terms);
        usage.record(&parsed.frame, &parsed.terms);
        frames.push(parsed.frame);
    }

    catalog::sort_frames(&mut frames);
    Ok(FramePass {
        frames,
        aliases: aliases.finish(),
        usage: usage.finish(date_modified),
    })
}

/// Key terms from all `dirs`, with observed aliases merged, longest term first.
/// Ids are unique: a page whose id was already read from an earlier directory
/// is skipped with a warning.
pub fn read_key_terms(dirs: &[PathBuf], aliases: &AliasTable) -> Result<Vec<KeyTerm>> {
    let mut terms = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for dir in dirs {
        for path in list_pages(dir)? {
            debug!("key term page {:?}", path);
            let page = read_page(&path)?;
            let id = page_id(&path);
            if let Some(first) = seen.get(&id) {
                warn!("Duplicate key term id {:?}: keeping {:?}, skipping {:?}", id, first, path);
                continue;
            }
            if let Some(kt) = extract_key_term(&id, &page)
                .with_context(|| format!("Bad key term page {:?}", path))?
            {
                seen.insert(id, path);
                terms.push(kt);
            }
        }
    }
    aliases.apply(&mut terms);
    catalog::sort_key_terms(&mut terms);
    Ok(terms)
}

/// Stories sorted by id, plus how many lines need a human look.
pub fn read_stories(dir: &Path) -> Result<(Vec<Story>, usize)> {
    let mut stories = Vec::new();
    let mut unrecognized = 0;
    for path in list_pages(dir)? {
        debug!("question page {:?}", path);
        let page = read_page(&path)?;
        let parsed = extract_story(&page_id(&path), &page);
        unrecognized += parsed.unrecognized.len();
        stories.push(parsed.story);
    }
    catalog::sort_stories(&mut stories);
    Ok((stories, unrecognized))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub frames: usize,
    pub key_terms: usize,
    pub stories: usize,
    pub unrecognized_lines: usize,
}

impl ExportSummary {
    pub fn print(&self) {
        println!(
            "Wrote {} frames, {} key terms, {} stories ({} unrecognized question lines).",
            self.frames, self.key_terms, self.stories, self.unrecognized_lines,
        );
    }
}

/// Export all four catalogs for one language. Frames are read first because
/// key terms need the aliases found on frame pages.
pub fn run(settings: &ExportSettings, date_modified: &str) -> Result<ExportSummary> {
    let pages = settings.lang_pages();
    let api = settings.lang_api();
    let lang = settings.lang.as_str();
    let mut summary = ExportSummary::default();

    println!("Pass 1: translation notes");
    let pass = read_frames(&pages.join(FRAMES_DIR), date_modified)?;
    summary.frames = pass.frames.len();
    info!(frames = summary.frames, aliased_terms = pass.aliases.len(), "frames read");
    let json = Catalog::new(pass.frames, date_modified).to_json()?;
    catalog::write_json(&ContentType::Notes.path_in(&api, lang), &json)?;

    println!("Pass 2: key terms");
    let dirs: Vec<PathBuf> = KEY_TERM_DIRS.iter().map(|d| pages.join(d)).collect();
    let terms = read_key_terms(&dirs, &pass.aliases)?;
    summary.key_terms = terms.len();
    let json = Catalog::new(terms, date_modified).to_json()?;
    catalog::write_json(&ContentType::KeyTerms.path_in(&api, lang), &json)?;

    println!("Pass 3: comprehension questions");
    let (stories, unrecognized) = read_stories(&pages.join(QUESTIONS_DIR))?;
    summary.stories = stories.len();
    summary.unrecognized_lines = unrecognized;
    if unrecognized > 0 {
        warn!(unrecognized, "question lines need manual review");
    }
    let json = Catalog::new(stories, date_modified).to_json()?;
    catalog::write_json(&ContentType::Questions.path_in(&api, lang), &json)?;

    println!("Pass 4: term usage");
    let json = pass.usage.to_json()?;
    catalog::write_json(&ContentType::TermUsage.path_in(&api, lang), &json)?;

    Ok(summary)
}

// ── Tests ──
