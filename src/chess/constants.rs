// Candidate attribute names for the required mappings, searched in order.
// The first list entry is the conventional GTF name, the rest are the
// variants seen in files from the common annotation providers.
pub const TRANSCRIPT_TYPE_CANDIDATES: &[&str; 3] =
    &["transcript_type", "transcript_biotype", "transcript_type_key"];
pub const GENE_TYPE_CANDIDATES: &[&str; 3] =
    &["gene_type", "gene_biotype", "gene_type_key"];
pub const GENE_NAME_CANDIDATES: &[&str; 3] =
    &["gene_name", "gene_name_key", "gene_id"];

// The server stops collecting distinct values for an attribute after this
// many and reclassifies it as "variable".
pub const CATEGORICAL_VALUE_CAPACITY: usize = 100;

pub const ANNOTATION_FILE_EXTENSIONS: &[&str; 3] = &["gtf", "gff", "gff3"];

// Row limits accepted by the table preview endpoint.
pub const TABLE_PREVIEW_DEFAULT_LIMIT: u32 = 10;
pub const TABLE_PREVIEW_MAX_LIMIT: u32 = 100;

pub const GENE_SEARCH_MAX_PER_PAGE: u32 = 100;
