use flexstr::SharedStr as FlexStr;

pub type OrganismName = FlexStr;
pub type AssemblyName = FlexStr;
pub type NomenclatureName = FlexStr;
pub type SequenceName = FlexStr;
pub type SourceName = FlexStr;
pub type VersionName = FlexStr;
pub type AttributeName = FlexStr;
pub type AttributeValue = FlexStr;
pub type DataTypeName = FlexStr;
pub type TableName = FlexStr;
pub type GeneUniquename = FlexStr;
pub type TranscriptUniquename = FlexStr;
pub type FeatureTypeName = FlexStr;

pub type TaxonomyId = u32;
pub type AssemblyId = i32;
pub type SequenceId = i32;
pub type GenomeFileId = i32;
pub type SourceId = i32;
pub type SourceVersionId = i32;
pub type SourceVersionAssemblyId = i32;
pub type SourceFileId = i32;
pub type ConfigurationId = i32;
pub type DatasetId = i32;
pub type GeneDbId = i64;
pub type TranscriptDbId = i64;
pub type TranscriptDataId = i64;
