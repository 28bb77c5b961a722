use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use flate2::read::MultiGzDecoder;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_derive::Serialize;

use crate::constants::{ANNOTATION_FILE_EXTENSIONS, CATEGORICAL_VALUE_CAPACITY};
use crate::data_types::{AttributeInfo, AttributeKind, ValueCount};
use crate::types::*;

// GTF attributes look like: gene_id "ENSG00000012048"; gene_name "BRCA1";
static GTF_ATTRIBUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w[\w.\-]*)\s+"([^"]*)""#).unwrap());

// GFF3 attributes look like: ID=transcript:ENST00000357654;biotype=protein_coding
static GFF_ATTRIBUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^;=\s][^;=]*)=([^;]*)").unwrap());

const MAX_REPORTED_ERRORS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationFormat {
    Gtf,
    Gff,
}

// Accepts .gtf, .gff and .gff3, optionally gzip-compressed, matching the
// extension check of the upload form.
pub fn annotation_format_from_name(name: &str) -> Option<AnnotationFormat> {
    let lower = name.to_lowercase();
    let stem = lower.strip_suffix(".gz").unwrap_or(&lower);

    for extension in ANNOTATION_FILE_EXTENSIONS {
        if stem.ends_with(&format!(".{}", extension)) {
            if *extension == "gtf" {
                return Some(AnnotationFormat::Gtf);
            } else {
                return Some(AnnotationFormat::Gff);
            }
        }
    }

    None
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct ScanStats {
    pub total_lines: u64,
    pub valid_lines: u64,
    pub invalid_lines: u64,
    pub feature_types: Vec<FeatureTypeName>,
    pub seqids: Vec<SequenceName>,
}

#[derive(Serialize, Clone, Debug)]
pub struct FileValidationResult {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ScanStats,
}

// Distinct values of one attribute, collected up to the server's
// categorical capacity.  Past the capacity the value set is dropped, as
// the server does for "variable" attributes.
#[derive(Clone, Debug, Default)]
pub struct SurveyedAttribute {
    values: IndexSet<AttributeValue>,
    over_capacity: bool,
}

impl SurveyedAttribute {
    fn note_value(&mut self, value: &str) {
        if self.over_capacity {
            return;
        }

        self.values.insert(value.into());
        if self.values.len() > CATEGORICAL_VALUE_CAPACITY {
            self.over_capacity = true;
            self.values.clear();
        }
    }

    pub fn kind(&self) -> AttributeKind {
        if self.over_capacity {
            AttributeKind::Variable
        } else {
            AttributeKind::Categorical
        }
    }

    pub fn values(&self) -> Vec<AttributeValue> {
        self.values.iter().cloned().collect()
    }

    pub fn to_attribute_info(&self) -> AttributeInfo {
        let value_count =
            if self.over_capacity {
                ValueCount::Unbounded("variable".into())
            } else {
                ValueCount::Count(self.values.len() as u64)
            };

        AttributeInfo {
            kind: self.kind(),
            values: self.values(),
            value_count,
        }
    }
}

// Attribute names in file order with their surveyed values; this is the
// local preview of what the server's detection step will report.
#[derive(Clone, Debug, Default)]
pub struct AttributeSurvey {
    pub attributes: IndexMap<AttributeName, SurveyedAttribute>,
}

impl AttributeSurvey {
    fn note(&mut self, name: &str, value: &str) {
        self.attributes.entry(name.into())
            .or_default()
            .note_value(value);
    }

    pub fn to_attribute_infos(&self) -> IndexMap<AttributeName, AttributeInfo> {
        self.attributes.iter()
            .map(|(name, surveyed)| (name.clone(), surveyed.to_attribute_info()))
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct AnnotationScan {
    pub validation: FileValidationResult,
    pub survey: AttributeSurvey,
}

pub fn scan_annotation_file(path: &Path) -> anyhow::Result<AnnotationScan> {
    let file_name = path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    let format = annotation_format_from_name(file_name)
        .ok_or_else(|| anyhow::anyhow!(
            "unsupported annotation file name: {:?} (expected .gtf, .gff or .gff3)",
            path))?;

    let file = File::open(path)
        .with_context(|| format!("failed to open {:?}", path))?;

    if file_name.to_lowercase().ends_with(".gz") {
        scan_annotation_reader(BufReader::new(MultiGzDecoder::new(file)), format)
    } else {
        scan_annotation_reader(BufReader::new(file), format)
    }
}

pub fn scan_annotation_reader(reader: impl BufRead, format: AnnotationFormat)
    -> anyhow::Result<AnnotationScan>
{
    let mut stats = ScanStats::default();
    let mut errors = vec![];
    let mut warnings = vec![];
    let mut suppressed_errors = 0u64;
    let mut survey = AttributeSurvey::default();
    let mut feature_types = IndexSet::new();
    let mut seqids = IndexSet::new();

    let mut record_error = |errors: &mut Vec<String>, message: String| {
        if errors.len() < MAX_REPORTED_ERRORS {
            errors.push(message);
        } else {
            suppressed_errors += 1;
        }
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read annotation file")?;
        let line_number = index + 1;
        let trimmed = line.trim_end();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        stats.total_lines += 1;

        let columns: Vec<&str> = trimmed.split('\t').collect();
        if columns.len() != 9 {
            stats.invalid_lines += 1;
            record_error(&mut errors,
                         format!("line {}: expected 9 tab-separated columns, found {}",
                                 line_number, columns.len()));
            continue;
        }

        let start = columns[3].parse::<u64>();
        let end = columns[4].parse::<u64>();

        let (start, end) = match (start, end) {
            (Ok(start), Ok(end)) => (start, end),
            _ => {
                stats.invalid_lines += 1;
                record_error(&mut errors,
                             format!("line {}: non-numeric coordinates \"{}\"..\"{}\"",
                                     line_number, columns[3], columns[4]));
                continue;
            },
        };

        if start > end {
            stats.invalid_lines += 1;
            record_error(&mut errors,
                         format!("line {}: start {} is after end {}",
                                 line_number, start, end));
            continue;
        }

        if !matches!(columns[6], "+" | "-" | ".") {
            stats.invalid_lines += 1;
            record_error(&mut errors,
                         format!("line {}: invalid strand \"{}\"",
                                 line_number, columns[6]));
            continue;
        }

        if start == 0 {
            warnings.push(format!("line {}: start coordinate 0 in a 1-based format",
                                  line_number));
        }

        stats.valid_lines += 1;
        seqids.insert(SequenceName::from(columns[0]));
        feature_types.insert(FeatureTypeName::from(columns[2]));

        let attribute_re = match format {
            AnnotationFormat::Gtf => &*GTF_ATTRIBUTE_RE,
            AnnotationFormat::Gff => &*GFF_ATTRIBUTE_RE,
        };

        let mut seen_any = false;
        for captures in attribute_re.captures_iter(columns[8]) {
            seen_any = true;
            let name = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let value = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            if !name.is_empty() {
                survey.note(name, value);
            }
        }

        if !seen_any {
            warnings.push(format!("line {}: no parseable attributes", line_number));
        }
    }

    if suppressed_errors > 0 {
        warnings.push(format!("{} further invalid lines not listed", suppressed_errors));
    }

    if stats.total_lines == 0 {
        errors.push("no feature lines found".to_owned());
    }

    stats.feature_types = feature_types.into_iter().collect();
    stats.seqids = seqids.into_iter().collect();

    let success = errors.is_empty() && stats.invalid_lines == 0;

    Ok(AnnotationScan {
        validation: FileValidationResult {
            success,
            errors,
            warnings,
            stats,
        },
        survey,
    })
}
