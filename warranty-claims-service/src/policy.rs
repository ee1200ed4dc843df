use anyhow::anyhow;
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Text used when neither the PDF nor an override is available
pub const PLACEHOLDER_POLICY_TEXT: &str = "Your policy text here.";

/// Where the policy text of a run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySource {
    Pdf,
    Override,
    Placeholder,
}

/// The warranty policy manual, resolved once per run and shared read-only
/// by every stage.
#[derive(Debug, Clone)]
pub struct PolicyDocument {
    text: Arc<str>,
    source: PolicySource,
}

impl PolicyDocument {
    pub fn new(text: impl Into<Arc<str>>, source: PolicySource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> PolicySource {
        self.source
    }

    /// Resolve the policy text: the PDF if it exists and yields text, then a
    /// non-blank override, then the placeholder.
    pub fn resolve(
        pdf_path: &Path,
        override_text: Option<&str>,
        extractor: &dyn PolicyTextExtractor,
    ) -> Self {
        if pdf_path.exists() {
            match extractor.extract(pdf_path) {
                Ok(text) if !text.trim().is_empty() => {
                    info!(path = %pdf_path.display(), characters = text.len(), "Loaded policy from PDF");
                    return Self::new(text, PolicySource::Pdf);
                }
                Ok(_) => warn!(path = %pdf_path.display(), "Policy PDF contains no text"),
                Err(e) => warn!(path = %pdf_path.display(), error = %e, "Failed to read policy PDF"),
            }
        } else {
            info!(path = %pdf_path.display(), "No policy PDF found");
        }

        match override_text.filter(|text| !text.trim().is_empty()) {
            Some(text) => {
                info!("Using policy text override");
                Self::new(text, PolicySource::Override)
            }
            None => {
                warn!("No policy text available, using placeholder");
                Self::new(PLACEHOLDER_POLICY_TEXT, PolicySource::Placeholder)
            }
        }
    }
}

/// Pulls plain text out of a policy file
pub trait PolicyTextExtractor {
    fn extract(&self, path: &Path) -> anyhow::Result<String>;
}

/// Extracts PDF text with pdfium; pages are joined with a single space.
pub struct PdfiumTextExtractor;

impl PolicyTextExtractor for PdfiumTextExtractor {
    fn extract(&self, path: &Path) -> anyhow::Result<String> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| anyhow!("Failed to bind pdfium: {:?}", e))?;
        let pdfium = Pdfium::new(bindings);

        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| anyhow!("Failed to load PDF: {:?}", e))?;

        let mut pages = Vec::new();
        for page in document.pages().iter() {
            let text = page
                .text()
                .map_err(|e| anyhow!("Failed to read page text: {:?}", e))?;
            pages.push(text.all());
        }

        Ok(pages.join(" "))
    }
}
