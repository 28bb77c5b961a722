use std::collections::HashMap;

use flexstr::SharedStr as FlexStr;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::*;

pub type TaxonomyOrganismMap = HashMap<TaxonomyId, Organism>;
pub type IdAssemblyMap = HashMap<AssemblyId, Assembly>;
pub type IdSourceMap = HashMap<SourceId, Source>;
pub type IdDatasetMap = HashMap<DatasetId, Dataset>;
pub type NameDataTypeMap = HashMap<DataTypeName, DataTypeDetails>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Organism {
    pub taxonomy_id: TaxonomyId,
    pub scientific_name: OrganismName,
    pub common_name: OrganismName,
    #[serde(default)]
    pub information: FlexStr,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenomeFile {
    pub genome_file_id: GenomeFileId,
    #[serde(default)]
    pub assembly_id: AssemblyId,
    pub nomenclature: NomenclatureName,
    pub file_path: FlexStr,
}

// entry in sequence_name_mappings: file-facing name resolved to the
// assembly-wide numeric id and the (nomenclature-independent) length
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SequenceNameDetails {
    pub sequence_id: SequenceId,
    pub length: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SequenceNameMapping {
    pub sequence_names_to_ids: HashMap<SequenceName, SequenceNameDetails>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SequenceIdMapping {
    pub length: u64,
    pub nomenclatures: HashMap<NomenclatureName, SequenceName>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Assembly {
    pub assembly_id: AssemblyId,
    pub assembly_name: AssemblyName,
    #[serde(default)]
    pub information: FlexStr,
    pub taxonomy_id: TaxonomyId,
    #[serde(skip_serializing_if="Vec::is_empty", default)]
    pub nomenclatures: Vec<NomenclatureName>,
    #[serde(skip_serializing_if="Vec::is_empty", default)]
    pub genome_files: Vec<GenomeFile>,
    #[serde(skip_serializing_if="HashMap::is_empty", default)]
    pub sequence_name_mappings: HashMap<NomenclatureName, SequenceNameMapping>,
    // keyed by the string form of the internal sequence_id
    #[serde(skip_serializing_if="HashMap::is_empty", default)]
    pub sequence_id_mappings: HashMap<FlexStr, SequenceIdMapping>,
}

impl Assembly {
    pub fn has_nomenclature(&self, nomenclature: &str) -> bool {
        self.nomenclatures.iter().any(|n| n.as_str() == nomenclature)
    }

    // sequences of this assembly under the given nomenclature, as
    // (internal id string, displayed name) pairs sorted by name
    pub fn sequences_for_nomenclature(&self, nomenclature: &str)
        -> Vec<(FlexStr, SequenceName)>
    {
        let mut seqs: Vec<_> = self.sequence_id_mappings.iter()
            .filter_map(|(seq_id, mapping)| {
                mapping.nomenclatures.get(nomenclature)
                    .map(|name| (seq_id.clone(), name.clone()))
            })
            .collect();
        seqs.sort_by(|a, b| a.1.cmp(&b.1));
        seqs
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SourceFile {
    pub file_id: SourceFileId,
    pub file_path: FlexStr,
    pub filetype: FlexStr,
    #[serde(default)]
    pub description: FlexStr,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SourceVersionAssembly {
    pub sva_id: SourceVersionAssemblyId,
    pub assembly_id: AssemblyId,
    #[serde(skip_serializing_if="HashMap::is_empty", default)]
    pub files: HashMap<FlexStr, SourceFile>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SourceVersion {
    pub sv_id: SourceVersionId,
    pub version_name: VersionName,
    pub version_rank: u32,
    #[serde(skip_serializing_if="Option::is_none", default)]
    pub last_updated: Option<FlexStr>,
    #[serde(skip_serializing_if="HashMap::is_empty", default)]
    pub assemblies: HashMap<SourceVersionAssemblyId, SourceVersionAssembly>,
}

impl SourceVersion {
    pub fn sva_for_assembly(&self, assembly_id: AssemblyId) -> Option<&SourceVersionAssembly> {
        self.assemblies.values().find(|sva| sva.assembly_id == assembly_id)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Source {
    pub source_id: SourceId,
    pub name: SourceName,
    #[serde(default)]
    pub information: FlexStr,
    #[serde(default)]
    pub link: FlexStr,
    #[serde(default)]
    pub citation: FlexStr,
    #[serde(skip_serializing_if="Option::is_none", default)]
    pub last_updated: Option<FlexStr>,
    #[serde(skip_serializing_if="HashMap::is_empty", default)]
    pub versions: HashMap<SourceVersionId, SourceVersion>,
}

impl Source {
    // versions ordered by rank, which is the display and priority order
    pub fn versions_by_rank(&self) -> Vec<&SourceVersion> {
        let mut versions: Vec<_> = self.versions.values().collect();
        versions.sort_by_key(|v| v.version_rank);
        versions
    }

    pub fn covers_assembly(&self, assembly_id: AssemblyId) -> bool {
        self.versions.values()
            .any(|v| v.sva_for_assembly(assembly_id).is_some())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Configuration {
    pub configuration_id: ConfigurationId,
    pub active: bool,
    #[serde(default)]
    pub description: FlexStr,
    pub organism_id: TaxonomyId,
    pub assembly_id: AssemblyId,
    pub nomenclature: NomenclatureName,
    pub source_id: SourceId,
    pub sv_id: SourceVersionId,
    // absent from older snapshots
    #[serde(default)]
    pub sequence_id: FlexStr,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub end: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DataTypeDetails {
    pub data_type: DataTypeName,
    #[serde(default)]
    pub description: FlexStr,
}

#[derive(Serialize, Deserialize, Clone, Debug, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataTarget {
    Transcripts,
    Genes,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Dataset {
    pub dataset_id: DatasetId,
    pub name: FlexStr,
    #[serde(default)]
    pub description: FlexStr,
    pub data_type: DataTypeName,
    pub data_target: DataTarget,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DatasetCollection {
    #[serde(default)]
    pub data_types: NameDataTypeMap,
    #[serde(default)]
    pub datasets: IdDatasetMap,
}

// The wholesale snapshot served by /public/globalData.  The client never
// patches this incrementally: after any mutating call it is refetched.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GlobalData {
    #[serde(default)]
    pub organisms: TaxonomyOrganismMap,
    #[serde(default)]
    pub assemblies: IdAssemblyMap,
    #[serde(default)]
    pub sources: IdSourceMap,
    // served as a list ordered active-first
    #[serde(default)]
    pub configurations: Vec<Configuration>,
    #[serde(default)]
    pub datasets: DatasetCollection,
}

impl GlobalData {
    pub fn organisms_by_name(&self) -> Vec<&Organism> {
        let mut organisms: Vec<_> = self.organisms.values().collect();
        organisms.sort_by(|a, b| a.scientific_name.cmp(&b.scientific_name));
        organisms
    }

    pub fn assemblies_of_organism(&self, taxonomy_id: TaxonomyId) -> Vec<&Assembly> {
        let mut assemblies: Vec<_> = self.assemblies.values()
            .filter(|a| a.taxonomy_id == taxonomy_id)
            .collect();
        assemblies.sort_by(|a, b| a.assembly_name.cmp(&b.assembly_name));
        assemblies
    }

    pub fn sources_for_assembly(&self, assembly_id: AssemblyId) -> Vec<&Source> {
        let mut sources: Vec<_> = self.sources.values()
            .filter(|s| s.covers_assembly(assembly_id))
            .collect();
        sources.sort_by(|a, b| a.name.cmp(&b.name));
        sources
    }

    pub fn source_version(&self, source_id: SourceId, sv_id: SourceVersionId)
        -> Option<&SourceVersion>
    {
        self.sources.get(&source_id)
            .and_then(|source| source.versions.get(&sv_id))
    }

    pub fn active_configuration(&self) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.active)
    }
}

// public portal: one row of a paginated gene search
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeneCoordinates {
    #[serde(default)]
    pub sequence_id: Option<SequenceId>,
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub end: Option<u64>,
    #[serde(default)]
    pub strand: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeneSummary {
    pub gid: GeneDbId,
    pub sva_id: SourceVersionAssemblyId,
    #[serde(default)]
    pub name: Option<FlexStr>,
    #[serde(default)]
    pub type_key: Option<AttributeName>,
    #[serde(default)]
    pub type_value: Option<FlexStr>,
    pub gene_id: GeneUniquename,
    #[serde(default)]
    pub transcript_count: u32,
    pub coordinates: GeneCoordinates,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Pagination {
    pub current_page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeneSearchResults {
    pub genes: Vec<GeneSummary>,
    pub pagination: Pagination,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TranscriptSpan {
    pub start: u64,
    pub end: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DataEntry {
    pub td_id: TranscriptDataId,
    pub data: FlexStr,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TranscriptDataset {
    pub dataset_id: DatasetId,
    pub dataset_name: FlexStr,
    #[serde(default)]
    pub dataset_description: FlexStr,
    pub data_type: DataTypeName,
    #[serde(default)]
    pub data_entries: Vec<DataEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TranscriptDetails {
    pub tid: TranscriptDbId,
    pub transcript_id: TranscriptUniquename,
    #[serde(default)]
    pub transcript_type: Option<FlexStr>,
    pub sequence_id: SequenceId,
    pub strand: bool,
    pub coordinates: TranscriptSpan,
    #[serde(default)]
    pub exons: Vec<(u64, u64)>,
    #[serde(default)]
    pub cds: Vec<(u64, u64)>,
    #[serde(skip_serializing_if="Option::is_none", default)]
    pub nt_sequence: Option<FlexStr>,
    #[serde(skip_serializing_if="Vec::is_empty", default)]
    pub datasets: Vec<TranscriptDataset>,
    // free-form attribute map; values are not uniformly typed on the wire
    #[serde(skip_serializing_if="HashMap::is_empty", default)]
    pub attributes: HashMap<AttributeName, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeneDetails {
    pub gid: GeneDbId,
    pub sva_id: SourceVersionAssemblyId,
    pub gene_id: GeneUniquename,
    #[serde(default)]
    pub name: Option<FlexStr>,
    #[serde(default)]
    pub gene_type: Option<FlexStr>,
    #[serde(default)]
    pub transcripts: Vec<TranscriptDetails>,
}

// attribute classification as the server reports it during upload detection
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Categorical,
    Variable,
}

// "value_count" is a number for categorical attributes and the literal
// string "variable" otherwise
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ValueCount {
    Count(u64),
    Unbounded(FlexStr),
}

impl ValueCount {
    pub fn as_count(&self) -> Option<u64> {
        match self {
            ValueCount::Count(n) => Some(*n),
            ValueCount::Unbounded(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AttributeInfo {
    #[serde(rename = "type")]
    pub kind: AttributeKind,
    #[serde(default)]
    pub values: Vec<AttributeValue>,
    pub value_count: ValueCount,
}

// database administration records
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Table,
    View,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DatabaseTableInfo {
    pub name: TableName,
    #[serde(rename = "type")]
    pub kind: TableKind,
    #[serde(default)]
    pub description: FlexStr,
    #[serde(skip_serializing_if="Option::is_none", default)]
    pub message: Option<FlexStr>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DatabaseList {
    pub tables: Vec<DatabaseTableInfo>,
    pub views: Vec<DatabaseTableInfo>,
    pub total_tables: u32,
    pub total_views: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TableData {
    pub columns: Vec<FlexStr>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TablePreview {
    pub table_name: TableName,
    pub data: TableData,
    #[serde(skip_serializing_if="Option::is_none", default)]
    pub search_term: Option<FlexStr>,
    pub limit: u32,
}
