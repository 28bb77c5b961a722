use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use flexstr::ToSharedStr;
use indexmap::IndexMap;

use chess::api::client::ApiError;
use chess::api::upload::{AnnotationUpload, ConfirmAnnotationRequest, ImportSummary,
                         NomenclatureDetection, UploadOutcome, UploadRequest};
use chess::data_types::{Assembly, AttributeInfo, AttributeKind, Configuration,
                        GlobalData, Organism, SequenceIdMapping, SequenceNameDetails,
                        SequenceNameMapping, Source, SourceVersion,
                        SourceVersionAssembly, ValueCount};
use chess::types::*;

// queue-driven stand-in for the two wire operations of the upload protocol
pub struct MockAnnotationUpload {
    pub upload_responses: RefCell<VecDeque<Result<UploadOutcome, ApiError>>>,
    pub confirm_responses: RefCell<VecDeque<Result<ImportSummary, ApiError>>>,
    pub confirm_requests: RefCell<Vec<(SourceId, SourceVersionId, ConfirmAnnotationRequest)>>,
    pub upload_count: RefCell<usize>,
}

#[allow(dead_code)]
impl MockAnnotationUpload {
    pub fn new() -> MockAnnotationUpload {
        MockAnnotationUpload {
            upload_responses: RefCell::new(VecDeque::new()),
            confirm_responses: RefCell::new(VecDeque::new()),
            confirm_requests: RefCell::new(vec![]),
            upload_count: RefCell::new(0),
        }
    }

    pub fn queue_upload(&self, response: Result<UploadOutcome, ApiError>) {
        self.upload_responses.borrow_mut().push_back(response);
    }

    pub fn queue_confirm(&self, response: Result<ImportSummary, ApiError>) {
        self.confirm_responses.borrow_mut().push_back(response);
    }
}

impl AnnotationUpload for &MockAnnotationUpload {
    async fn upload(&self, _request: &UploadRequest) -> Result<UploadOutcome, ApiError> {
        *self.upload_count.borrow_mut() += 1;
        self.upload_responses.borrow_mut().pop_front()
            .unwrap_or_else(|| panic!("unexpected upload call"))
    }

    async fn confirm(&self, source_id: SourceId, sv_id: SourceVersionId,
                     request: &ConfirmAnnotationRequest)
        -> Result<ImportSummary, ApiError>
    {
        self.confirm_requests.borrow_mut()
            .push((source_id, sv_id, request.clone()));
        self.confirm_responses.borrow_mut().pop_front()
            .unwrap_or_else(|| panic!("unexpected confirm call"))
    }
}

#[allow(dead_code)]
pub fn server_error(message: &str) -> ApiError {
    ApiError::Server {
        status: 500,
        message: message.to_owned(),
    }
}

#[allow(dead_code)]
pub fn committed_summary(message: &str) -> ImportSummary {
    ImportSummary {
        success: true,
        message: Some(message.to_shared_str()),
        ..ImportSummary::default()
    }
}

#[allow(dead_code)]
pub fn categorical(values: &[&str]) -> AttributeInfo {
    AttributeInfo {
        kind: AttributeKind::Categorical,
        values: values.iter().map(|value| value.to_shared_str()).collect(),
        value_count: ValueCount::Count(values.len() as u64),
    }
}

#[allow(dead_code)]
pub fn variable() -> AttributeInfo {
    AttributeInfo {
        kind: AttributeKind::Variable,
        values: vec![],
        value_count: ValueCount::Unbounded("variable".to_shared_str()),
    }
}

#[allow(dead_code)]
pub fn detection(nomenclatures: &[(&str, &[&str])],
                 attributes: Vec<(&str, AttributeInfo)>) -> NomenclatureDetection {
    let detected_nomenclatures = nomenclatures.iter()
        .map(|(name, missing)| {
            (name.to_shared_str(),
             missing.iter().map(|seq| seq.to_shared_str()).collect())
        })
        .collect();

    let attributes: IndexMap<_, _> = attributes.into_iter()
        .map(|(name, info)| (name.to_shared_str(), info))
        .collect();

    let file_sequences = vec!["chr1".to_shared_str(), "chr17".to_shared_str()];

    NomenclatureDetection {
        detected_nomenclatures,
        attributes,
        file_sequences,
        temp_file_path: "/tmp/upload-aaaa/gtf_file".to_shared_str(),
        norm_gtf_path: "/tmp/upload-aaaa/normalized_gtf".to_shared_str(),
        assembly_id: 1,
        source_version_id: 2,
        description: "test upload".to_shared_str(),
    }
}

#[allow(dead_code)]
pub fn upload_request() -> UploadRequest {
    UploadRequest {
        source_id: 7,
        source_version_id: 2,
        assembly_id: 1,
        file_name: "chess.gtf".to_shared_str(),
        payload: bytes::Bytes::from_static(b"chr1\ttest\tgene\t1\t100\t.\t+\t.\tgene_id \"G1\";\n"),
        description: "test upload".to_shared_str(),
    }
}

// a small but fully-linked snapshot: one organism, one assembly with two
// nomenclatures, one source with one version attached to the assembly
#[allow(dead_code)]
pub fn sample_global_data() -> GlobalData {
    let mut data = GlobalData::default();

    data.organisms.insert(9606, Organism {
        taxonomy_id: 9606,
        scientific_name: "Homo sapiens".to_shared_str(),
        common_name: "human".to_shared_str(),
        information: "".to_shared_str(),
    });

    let mut sequence_name_mappings = HashMap::new();
    for (nomenclature, seq_name) in [("RefSeq", "NC_000017.11"), ("UCSC", "chr17")] {
        let mut names = HashMap::new();
        names.insert(seq_name.to_shared_str(),
                     SequenceNameDetails { sequence_id: 17, length: 83_257_441 });
        sequence_name_mappings.insert(
            nomenclature.to_shared_str(),
            SequenceNameMapping { sequence_names_to_ids: names });
    }

    let mut sequence_id_mappings = HashMap::new();
    let mut seq_nomenclatures = HashMap::new();
    seq_nomenclatures.insert("RefSeq".to_shared_str(), "NC_000017.11".to_shared_str());
    seq_nomenclatures.insert("UCSC".to_shared_str(), "chr17".to_shared_str());
    sequence_id_mappings.insert("17".to_shared_str(), SequenceIdMapping {
        length: 83_257_441,
        nomenclatures: seq_nomenclatures,
    });

    data.assemblies.insert(1, Assembly {
        assembly_id: 1,
        assembly_name: "GRCh38".to_shared_str(),
        information: "".to_shared_str(),
        taxonomy_id: 9606,
        nomenclatures: vec!["RefSeq".to_shared_str(), "UCSC".to_shared_str()],
        genome_files: vec![],
        sequence_name_mappings,
        sequence_id_mappings,
    });

    let mut sva_map = HashMap::new();
    sva_map.insert(5, SourceVersionAssembly {
        sva_id: 5,
        assembly_id: 1,
        files: HashMap::new(),
    });

    let mut versions = HashMap::new();
    versions.insert(2, SourceVersion {
        sv_id: 2,
        version_name: "3.1.3".to_shared_str(),
        version_rank: 1,
        last_updated: None,
        assemblies: sva_map,
    });

    data.sources.insert(7, Source {
        source_id: 7,
        name: "CHESS".to_shared_str(),
        information: "".to_shared_str(),
        link: "".to_shared_str(),
        citation: "".to_shared_str(),
        last_updated: None,
        versions,
    });

    data.configurations.push(Configuration {
        configuration_id: 11,
        active: true,
        description: "default view".to_shared_str(),
        organism_id: 9606,
        assembly_id: 1,
        nomenclature: "UCSC".to_shared_str(),
        source_id: 7,
        sv_id: 2,
        sequence_id: "17".to_shared_str(),
        start: 43_044_295,
        end: 43_170_245,
    });

    data
}
