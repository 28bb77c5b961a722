use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, bail};
use indexmap::IndexMap;

use crate::data_types::Assembly;
use crate::types::*;

// A two-column TSV mapping sequence names of an existing nomenclature to
// the names of a new one, checked locally before the multipart upload so
// an obviously broken file never reaches the server.
#[derive(Clone, Debug, Default)]
pub struct NomenclatureMapping {
    pub entries: IndexMap<SequenceName, SequenceName>,
}

impl NomenclatureMapping {
    pub fn read_from_path(path: &Path) -> anyhow::Result<NomenclatureMapping> {
        let file = File::open(path)
            .with_context(|| format!("failed to open {:?}", path))?;
        NomenclatureMapping::read(file)
            .with_context(|| format!("failed to parse {:?}", path))
    }

    pub fn read<R: Read>(reader: R) -> anyhow::Result<NomenclatureMapping> {
        let mut tsv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(reader);

        let mut entries = IndexMap::new();

        for (index, record) in tsv_reader.records().enumerate() {
            let record = record?;
            let line_number = index + 1;

            if record.len() < 2 {
                bail!("line {}: expected two tab-separated columns, found {}",
                      line_number, record.len());
            }

            let source = record[0].trim();
            let target = record[1].trim();

            if source.is_empty() || target.is_empty() {
                bail!("line {}: empty sequence name", line_number);
            }

            if entries.insert(SequenceName::from(source),
                              SequenceName::from(target)).is_some() {
                bail!("line {}: duplicate source sequence name \"{}\"",
                      line_number, source);
            }
        }

        if entries.is_empty() {
            bail!("no valid mappings found in TSV file");
        }

        Ok(NomenclatureMapping { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // source names that the assembly doesn't know under the source
    // nomenclature; the server rejects the upload if any exist
    pub fn missing_from_assembly(&self, assembly: &Assembly,
                                 source_nomenclature: &str) -> Vec<SequenceName> {
        let known = assembly.sequence_name_mappings.get(source_nomenclature);

        self.entries.keys()
            .filter(|source| {
                match known {
                    Some(mapping) =>
                        !mapping.sequence_names_to_ids.contains_key(source.as_str()),
                    None => true,
                }
            })
            .cloned()
            .collect()
    }
}
