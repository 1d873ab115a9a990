//! Geometry sources, tried in order by the builder.
//!
//! A source either yields marks to pair (the per-run position stream, tagged compiler
//! log lines) or ready-made pages (a structural extractor reading the compiled output).
//! `Ok(None)` means the source has no data at all; the builder moves on.

use std::fs;
use std::path::{Path, PathBuf};

use super::marks::{log_payloads, Mark};
use super::options::{BuildOptions, GroupingMode};
use super::report::BuildWarning;
use crate::error::Result;
use crate::model::{GeometryDocument, Page};
use crate::registry::IdQueues;

/// Files belonging to one compile job.
#[derive(Debug, Clone)]
pub struct Job {
    /// Job name (the source file stem)
    pub name: String,
    /// Directory the compiler wrote its outputs to
    pub output_dir: PathBuf,
    /// Directory the compiler ran in
    pub working_dir: PathBuf,
    /// Compiled PDF
    pub pdf_path: PathBuf,
    /// Element ids collected from the markup, passed to structural extraction
    pub id_queues: Option<IdQueues>,
}

impl Job {
    /// Job with outputs (and the PDF) under `output_dir`, compiled in that directory.
    pub fn new(name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let output_dir = output_dir.into();
        Self {
            pdf_path: output_dir.join(format!("{}.pdf", name)),
            working_dir: output_dir.clone(),
            name,
            output_dir,
            id_queues: None,
        }
    }

    /// Job for a compiled PDF, named after its stem.
    pub fn for_pdf(pdf_path: impl AsRef<Path>) -> Self {
        let pdf_path = pdf_path.as_ref();
        let name = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = pdf_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(name, dir).with_pdf_path(pdf_path)
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_pdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdf_path = path.into();
        self
    }

    pub fn with_id_queues(mut self, queues: Option<IdQueues>) -> Self {
        self.id_queues = queues;
        self
    }

    /// Position stream locations, output directory first.
    pub fn texpos_candidates(&self) -> [PathBuf; 2] {
        let file = format!("{}-texpos.ndjson", self.name);
        [self.output_dir.join(&file), self.working_dir.join(&file)]
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.log", self.name))
    }

    /// Default location of the geometry file.
    pub fn geometry_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}-geometry.json", self.name))
    }
}

/// Marks read from a source, plus the records that failed to parse.
#[derive(Debug, Clone, Default)]
pub struct MarkBatch {
    pub marks: Vec<Mark>,
    pub malformed: Vec<BuildWarning>,
}

impl MarkBatch {
    /// Parse numbered JSON records, collecting failures.
    pub fn parse<'a>(
        source_name: &str,
        records: impl IntoIterator<Item = (usize, &'a str)>,
    ) -> Self {
        let mut batch = Self::default();
        for (line, json) in records {
            match Mark::parse(json) {
                Ok(mark) => batch.marks.push(mark),
                Err(reason) => {
                    let warning = BuildWarning::MalformedMark {
                        source_name: source_name.to_string(),
                        line,
                        reason,
                    };
                    log::warn!("{}", warning);
                    batch.malformed.push(warning);
                }
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty() && self.malformed.is_empty()
    }
}

/// What a source produced.
#[derive(Debug, Clone)]
pub enum SourceData {
    /// Raw marks, still to be paired
    Marks(MarkBatch),
    /// Finished pages
    Pages(Vec<Page>),
}

/// A provider in the source resolution chain.
pub trait GeometrySource: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Load whatever this source has for the job, or `None` if it has nothing.
    fn attempt_load(&self, job: &Job, options: &BuildOptions) -> Result<Option<SourceData>>;
}

/// The `<job>-texpos.ndjson` stream written during typesetting.
#[derive(Debug, Clone, Default)]
pub struct TexposStreamSource;

impl GeometrySource for TexposStreamSource {
    fn name(&self) -> &str {
        "texpos"
    }

    fn attempt_load(&self, job: &Job, _options: &BuildOptions) -> Result<Option<SourceData>> {
        let Some(path) = job.texpos_candidates().into_iter().find(|p| p.is_file()) else {
            return Ok(None);
        };
        let text = fs::read_to_string(&path)?;
        let records = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let batch = MarkBatch::parse(&display_name(&path), records);
        if batch.is_empty() {
            log::debug!("{} is empty", path.display());
            return Ok(None);
        }
        Ok(Some(SourceData::Marks(batch)))
    }
}

/// `GEOM: ` lines embedded in the compiler log.
#[derive(Debug, Clone, Default)]
pub struct CompilerLogSource;

impl GeometrySource for CompilerLogSource {
    fn name(&self) -> &str {
        "log"
    }

    fn attempt_load(&self, job: &Job, _options: &BuildOptions) -> Result<Option<SourceData>> {
        let path = job.log_path();
        if !path.is_file() {
            return Ok(None);
        }
        // Compiler logs are not guaranteed to be valid UTF-8.
        let bytes = fs::read(&path)?;
        let text = String::from_utf8_lossy(&bytes);

        let batch = MarkBatch::parse(&display_name(&path), log_payloads(&text));
        if batch.is_empty() {
            return Ok(None);
        }
        Ok(Some(SourceData::Marks(batch)))
    }
}

/// Hints handed to a structural extractor.
#[derive(Debug, Clone, Copy)]
pub struct StructuralHints<'a> {
    pub language: &'a str,
    pub id_queues: Option<&'a IdQueues>,
    pub grouping: GroupingMode,
}

/// Derives approximate geometry directly from a compiled document.
pub trait StructuralExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, pdf_path: &Path, hints: StructuralHints<'_>) -> Result<Vec<Page>>;
}

/// Last-resort source backed by a [`StructuralExtractor`].
pub struct StructuralSource {
    extractor: Box<dyn StructuralExtractor>,
}

impl StructuralSource {
    pub fn new(extractor: Box<dyn StructuralExtractor>) -> Self {
        Self { extractor }
    }
}

impl GeometrySource for StructuralSource {
    fn name(&self) -> &str {
        self.extractor.name()
    }

    fn attempt_load(&self, job: &Job, options: &BuildOptions) -> Result<Option<SourceData>> {
        if !job.pdf_path.is_file() {
            return Ok(None);
        }
        let hints = StructuralHints {
            language: &options.language,
            id_queues: job.id_queues.as_ref(),
            grouping: options.grouping,
        };
        let pages = self.extractor.extract(&job.pdf_path, hints)?;
        Ok(Some(SourceData::Pages(pages)))
    }
}

/// Structural extractor that reads geometry an external tool already produced.
///
/// The file must follow the geometry schema; its `docId` is ignored and replaced by
/// the fingerprint of the job's PDF.
#[derive(Debug, Clone)]
pub struct PrecomputedExtractor {
    path: PathBuf,
}

impl PrecomputedExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StructuralExtractor for PrecomputedExtractor {
    fn name(&self) -> &str {
        "precomputed"
    }

    fn extract(&self, _pdf_path: &Path, _hints: StructuralHints<'_>) -> Result<Vec<Page>> {
        let document = GeometryDocument::load(&self.path)?;
        Ok(document.pages().to_vec())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
