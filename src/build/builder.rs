//! Geometry builder: resolve a source, pair its marks, emit the document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::marks::Mark;
use super::options::BuildOptions;
use super::pairing::pair_marks;
use super::report::{BuildReport, BuildWarning};
use super::source::{
    CompilerLogSource, GeometrySource, Job, MarkBatch, SourceData, StructuralExtractor,
    StructuralSource, TexposStreamSource,
};
use crate::error::{Error, Result};
use crate::fingerprint::doc_id;
use crate::model::{Element, GeometryDocument, Page};

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct GeometryBuild {
    pub document: GeometryDocument,
    /// Name of the source that produced the elements; `None` for an empty document
    pub source: Option<String>,
    pub report: BuildReport,
}

/// Builds a [`GeometryDocument`] from the first source that yields elements.
///
/// The default chain reads the per-run position stream, then the compiler log. A
/// structural extractor can be appended as the last resort. A build either returns a
/// complete document or an error; nothing is emitted midway.
pub struct GeometryBuilder {
    options: BuildOptions,
    sources: Vec<Arc<dyn GeometrySource>>,
}

impl GeometryBuilder {
    /// Builder with the default source chain.
    pub fn new(options: BuildOptions) -> Self {
        Self::without_sources(options)
            .with_source(Arc::new(TexposStreamSource))
            .with_source(Arc::new(CompilerLogSource))
    }

    /// Builder with an empty source chain.
    pub fn without_sources(options: BuildOptions) -> Self {
        Self {
            options,
            sources: Vec::new(),
        }
    }

    /// Append a source to the chain.
    pub fn with_source(mut self, source: Arc<dyn GeometrySource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Append a structural fallback.
    pub fn with_structural(self, extractor: Box<dyn StructuralExtractor>) -> Self {
        self.with_source(Arc::new(StructuralSource::new(extractor)))
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Source names in resolution order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Build geometry for a job, fingerprinting its compiled PDF.
    ///
    /// Sources are resolved before the PDF is read, so a job with no position data
    /// fails with [`Error::SourceUnavailable`] whether or not the PDF exists.
    pub fn build(&self, job: &Job) -> Result<GeometryBuild> {
        let resolution = self.resolve(job)?;
        let compiled = fs::read(&job.pdf_path)?;
        Ok(resolution.finish(&compiled))
    }

    /// Build geometry for a job with the compiled bytes already in memory.
    pub fn build_with_bytes(&self, job: &Job, compiled: &[u8]) -> Result<GeometryBuild> {
        Ok(self.resolve(job)?.finish(compiled))
    }

    fn resolve(&self, job: &Job) -> Result<Resolution> {
        let mut report = BuildReport::default();
        let mut had_data = false;

        for source in &self.sources {
            let name = source.name().to_string();
            report.tried.push(name.clone());

            let data = match source.attempt_load(job, &self.options) {
                Ok(Some(data)) => data,
                Ok(None) => {
                    log::debug!("Source '{}' has no data for job '{}'", name, job.name);
                    continue;
                }
                Err(e) if self.options.is_strict() => return Err(e),
                Err(e) => {
                    log::warn!("Source '{}' failed: {}", name, e);
                    continue;
                }
            };
            had_data = true;

            let pages = match data {
                SourceData::Marks(batch) => self.pages_from_batch(batch, &mut report)?,
                SourceData::Pages(pages) => pages,
            };
            let element_count: usize = pages.iter().map(Page::element_count).sum();
            if element_count == 0 {
                log::info!("Source '{}' produced no elements; trying the next one", name);
                continue;
            }

            return Ok(Resolution {
                document: GeometryDocument::new(String::new(), pages)?,
                source: Some(name),
                report,
            });
        }

        if !had_data {
            return Err(Error::SourceUnavailable(report.tried.join(", ")));
        }

        let warning = BuildWarning::EmptyGeometry {
            tried: report.tried.clone(),
        };
        log::warn!("{}", warning);
        report.warnings.push(warning);
        Ok(Resolution {
            document: GeometryDocument::empty(String::new()),
            source: None,
            report,
        })
    }

    /// Pair marks and assemble the document directly, without consulting sources.
    pub fn build_from_marks(&self, marks: &[Mark], compiled: &[u8]) -> Result<GeometryDocument> {
        let mut report = BuildReport::default();
        let pages = self.pages_from_marks(marks, &mut report)?;
        GeometryDocument::new(doc_id(compiled), pages)
    }

    fn pages_from_batch(&self, batch: MarkBatch, report: &mut BuildReport) -> Result<Vec<Page>> {
        if self.options.is_strict() {
            if let Some(first) = batch.malformed.first() {
                return Err(Error::Strict(first.clone()));
            }
        }
        report.warnings.extend(batch.malformed);
        self.pages_from_marks(&batch.marks, report)
    }

    fn pages_from_marks(&self, marks: &[Mark], report: &mut BuildReport) -> Result<Vec<Page>> {
        let pairing = pair_marks(marks);
        if self.options.is_strict() {
            if let Some(first) = pairing.warnings.first() {
                return Err(Error::Strict(first.clone()));
            }
        }
        report.marks_read += marks.len();
        report.anchors += pairing.anchors;
        report.warnings.extend(pairing.warnings);

        let margins = self.options.margin_left + self.options.margin_right;
        let mut by_page: BTreeMap<u32, Vec<Element>> = BTreeMap::new();
        for region in pairing.regions {
            if region.page_width <= margins {
                let warning = BuildWarning::NarrowPage {
                    id: region.id,
                    page: region.page_index + 1,
                    page_width: region.page_width,
                };
                if self.options.is_strict() {
                    return Err(Error::Strict(warning));
                }
                log::warn!("{}", warning);
                report.warnings.push(warning);
                continue;
            }
            let quad = region.to_quad(self.options.margin_left, self.options.margin_right);
            by_page
                .entry(region.page_index)
                .or_default()
                .push(Element::region(
                    region.id,
                    region.role,
                    self.options.language.clone(),
                    quad,
                ));
        }

        Ok(by_page
            .into_iter()
            .map(|(index, elements)| Page::with_elements(index, elements))
            .collect())
    }
}

/// A validated document from the source chain, not yet fingerprinted.
struct Resolution {
    document: GeometryDocument,
    source: Option<String>,
    report: BuildReport,
}

impl Resolution {
    fn finish(self, compiled: &[u8]) -> GeometryBuild {
        let document = self.document.with_doc_id(doc_id(compiled));
        if let Some(name) = &self.source {
            log::info!(
                "Built geometry from '{}': {} elements on {} pages",
                name,
                document.element_count(),
                document.page_count()
            );
        }
        GeometryBuild {
            document,
            source: self.source,
            report: self.report,
        }
    }
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}

/// Write a geometry file atomically: a temporary sibling is written, then renamed.
pub fn write_geometry<P: AsRef<Path>>(path: P, document: &GeometryDocument) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(document)?;

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, json)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
