use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("image reference '{reference}' does not resolve against {base}: {source}")]
    MalformedReference {
        base: Url,
        reference: String,
        source: url::ParseError,
    },
    #[error("image reference '{reference}' resolves to unsupported scheme '{scheme}'")]
    UnsupportedScheme { reference: String, scheme: String },
}

pub trait Extractor: Send + Sync {
    fn extract(&self, base: &Url, html: &str) -> Result<Vec<Url>, ExtractError>;
}

/// Collects the `src` of every `<img>` element, in document order:
/// - tag and attribute names match case-insensitively (parser-normalized)
/// - quote style and attribute order in the source text do not matter
/// - duplicates are kept; each occurrence becomes its own target
/// - one unresolvable reference fails the whole extraction.
#[derive(Debug, Default)]
pub struct ImgTagExtractor;

impl Extractor for ImgTagExtractor {
    fn extract(&self, base: &Url, html: &str) -> Result<Vec<Url>, ExtractError> {
        let doc = Html::parse_document(html);
        let img_sel = Selector::parse("img").ok();

        let mut targets = Vec::new();
        if let Some(sel) = img_sel.as_ref() {
            for element in doc.select(sel) {
                if let Some(src) = element.value().attr("src") {
                    targets.push(resolve_reference(base, src.trim())?);
                }
            }
        }
        Ok(targets)
    }
}

/// Resolve one captured reference against the page base. Relative
/// references join the base, absolute ones pass through; only http(s)
/// results are fetchable downstream.
pub fn resolve_reference(base: &Url, reference: &str) -> Result<Url, ExtractError> {
    let resolved = base
        .join(reference)
        .map_err(|source| ExtractError::MalformedReference {
            base: base.clone(),
            reference: reference.to_string(),
            source,
        })?;
    match resolved.scheme() {
        "http" | "https" => Ok(resolved),
        other => Err(ExtractError::UnsupportedScheme {
            reference: reference.to_string(),
            scheme: other.to_string(),
        }),
    }
}
