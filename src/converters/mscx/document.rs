//! Parsed MuseScore document
//!
//! Thin layer over `roxmltree` that knows the handful of MuseScore elements the
//! extractors care about: `Division`, `Measure`, `TimeSig`, `Chord`, `Note`.
//! Element lookups are namespace-exact: `Chord` only matches elements without
//! a namespace, so namespaced documents fall through to the namespaced scans.

use crate::converters::mscx::{MscxError, Result};
use roxmltree::{Document, Node, ParsingOptions};
use std::str::FromStr;

/// Namespace used by some MuseScore exports
pub const MSCX_NAMESPACE: &str = "http://www.musescore.org/mscx";

/// Ticks per quarter note when the document has no `Division`
pub const DEFAULT_DIVISION: u32 = 480;

/// Time signature assumed for measures without a `TimeSig`
pub const DEFAULT_TIME_SIG: (u32, u32) = (4, 4);

/// A measure together with its effective 1-based number
#[derive(Debug, Clone, Copy)]
pub struct Measure<'a, 'input> {
    pub number: u32,
    pub node: Node<'a, 'input>,
}

/// Read-only score tree plus the document-wide division
pub struct ScoreDocument<'input> {
    doc: Document<'input>,
    division: u32,
}

impl<'input> ScoreDocument<'input> {
    /// Parse score XML and resolve its division
    pub fn parse(xml: &'input str) -> Result<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(xml, options)
            .map_err(|e| MscxError::Xml(e.to_string()))?;
        let division = read_division(&doc)?;

        log::debug!("Division (ticks per quarter note): {}", division);
        Ok(Self { doc, division })
    }

    /// Ticks per quarter note
    pub fn division(&self) -> u32 {
        self.division
    }

    pub fn root(&self) -> Node<'_, 'input> {
        self.doc.root_element()
    }

    /// All `Measure` elements in document order with their effective numbers
    ///
    /// An explicit `no` attribute wins when it parses as a positive integer;
    /// otherwise the measure is numbered by its position among all measures.
    pub fn measures(&self) -> Vec<Measure<'_, 'input>> {
        self.doc
            .descendants()
            .filter(|n| is_element(*n, "Measure"))
            .enumerate()
            .map(|(idx, node)| {
                let positional = idx as u32 + 1;
                let number = node
                    .attribute("no")
                    .and_then(|no| no.trim().parse::<u32>().ok())
                    .filter(|no| *no > 0)
                    .unwrap_or(positional);
                Measure { number, node }
            })
            .collect()
    }

    /// Length of a measure in ticks, from its time signature
    ///
    /// `sigN * division * 4 / sigD`, truncated. Measures without a usable
    /// signature (absent, or a zero numerator/denominator) are 4/4.
    pub fn measure_length(&self, measure: Node) -> Result<u64> {
        let (numerator, denominator) = time_signature(measure)?.unwrap_or(DEFAULT_TIME_SIG);
        (numerator as u64)
            .checked_mul(self.division as u64 * 4)
            .map(|ticks| ticks / denominator as u64)
            .ok_or_else(|| MscxError::InvalidValue {
                element: "sigN".to_string(),
                value: numerator.to_string(),
            })
    }
}

/// First `Division` carrying text, or the default
fn read_division(doc: &Document) -> Result<u32> {
    let text = doc
        .descendants()
        .filter(|n| is_element(*n, "Division"))
        .find_map(|n| non_empty_text(n));

    match text {
        Some(text) => {
            let division: u32 = parse_number("Division", text)?;
            if division == 0 {
                return Err(MscxError::InvalidValue {
                    element: "Division".to_string(),
                    value: text.to_string(),
                });
            }
            Ok(division)
        }
        None => Ok(DEFAULT_DIVISION),
    }
}

/// First complete `TimeSig` inside a measure, as `(sigN, sigD)`
///
/// Returns `None` when the measure has no complete signature or when either
/// component is zero.
pub fn time_signature(measure: Node) -> Result<Option<(u32, u32)>> {
    let sig = measure
        .descendants()
        .filter(|n| is_element(*n, "TimeSig"))
        .find_map(|ts| Some((get_child(ts, "sigN")?, get_child(ts, "sigD")?)));

    let Some((sig_n, sig_d)) = sig else {
        return Ok(None);
    };

    let numerator: u32 = parse_number("sigN", non_empty_text(sig_n).unwrap_or_default())?;
    let denominator: u32 = parse_number("sigD", non_empty_text(sig_d).unwrap_or_default())?;

    if numerator == 0 || denominator == 0 {
        return Ok(None);
    }
    Ok(Some((numerator, denominator)))
}

/// True for an element with this local name and no namespace
pub fn is_element(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().namespace().is_none() && node.tag_name().name() == name
}

/// True for an element with this local name in the MuseScore namespace
pub fn is_namespaced_element(node: Node, name: &str) -> bool {
    node.is_element() && node.has_tag_name((MSCX_NAMESPACE, name))
}

/// First un-namespaced child element with the given name
pub fn get_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_element(*n, tag))
}

/// Trimmed text of a node, `None` when absent or blank
pub fn non_empty_text<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.text().map(str::trim).filter(|t| !t.is_empty())
}

/// Trimmed text of the first un-namespaced child with the given name
pub fn get_child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    get_child(node, tag).and_then(non_empty_text)
}

/// Parse numeric element content, reporting the element on failure
pub fn parse_number<T: FromStr>(element: &str, text: &str) -> Result<T> {
    text.trim().parse().map_err(|_| MscxError::InvalidValue {
        element: element.to_string(),
        value: text.to_string(),
    })
}
