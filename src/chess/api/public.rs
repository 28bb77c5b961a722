use flexstr::SharedStr as FlexStr;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;

use crate::api::client::{ApiClient, ApiError, encode_path_segment};
use crate::constants::GENE_SEARCH_MAX_PER_PAGE;
use crate::data_types::{Configuration, GeneDetails, GeneSearchResults, GeneSummary,
                        GlobalData, IdAssemblyMap, NameDataTypeMap, Pagination,
                        TaxonomyOrganismMap, TranscriptDetails};
use crate::types::*;

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    #[allow(dead_code)]
    success: bool,
    data: T,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneSortField {
    Name,
    GeneId,
    TranscriptCount,
    Type,
    Start,
    End,
    SequenceId,
}

impl GeneSortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneSortField::Name => "name",
            GeneSortField::GeneId => "gene_id",
            GeneSortField::TranscriptCount => "transcript_count",
            GeneSortField::Type => "type",
            GeneSortField::Start => "start",
            GeneSortField::End => "end",
            GeneSortField::SequenceId => "sequence_id",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeneSearchQuery {
    pub sva_id: SourceVersionAssemblyId,
    pub search_term: Option<FlexStr>,
    pub gene_type: Option<FlexStr>,
    pub page: u32,
    pub per_page: u32,
    pub sort_by: GeneSortField,
    pub order: SortOrder,
}

impl GeneSearchQuery {
    pub fn new(sva_id: SourceVersionAssemblyId) -> GeneSearchQuery {
        GeneSearchQuery {
            sva_id,
            search_term: None,
            gene_type: None,
            page: 1,
            per_page: 25,
            sort_by: GeneSortField::Name,
            order: SortOrder::Asc,
        }
    }

    fn to_query_string(&self) -> String {
        let mut params = vec![
            format!("sva_id={}", self.sva_id),
            format!("page={}", self.page),
            format!("per_page={}", self.per_page.min(GENE_SEARCH_MAX_PER_PAGE)),
            format!("sort={}", self.sort_by.as_str()),
            format!("order={}", self.order.as_str()),
        ];

        if let Some(search_term) = &self.search_term {
            params.push(format!("q={}", encode_path_segment(search_term)));
        }
        if let Some(gene_type) = &self.gene_type {
            params.push(format!("gene_type={}", encode_path_segment(gene_type)));
        }

        params.join("&")
    }
}

#[derive(Deserialize, Debug)]
struct GeneSearchResponse {
    #[allow(dead_code)]
    success: bool,
    data: Vec<GeneSummary>,
    pagination: Pagination,
}

// The read-only surface backing the browsing portal, plus the download
// and track URLs handed to the embedded genome browser.
#[derive(Clone)]
pub struct PublicApi {
    client: ApiClient,
}

impl PublicApi {
    pub fn new(client: ApiClient) -> PublicApi {
        PublicApi { client }
    }

    async fn get_enveloped<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.client.public_url(path);
        let envelope: Envelope<T> = self.client.get_json(&url).await?;
        Ok(envelope.data)
    }

    pub async fn global_data(&self) -> Result<GlobalData, ApiError> {
        let url = self.client.public_url("/globalData");
        self.client.get_json(&url).await
    }

    pub async fn organisms(&self) -> Result<TaxonomyOrganismMap, ApiError> {
        self.get_enveloped("/organisms").await
    }

    pub async fn assemblies(&self) -> Result<IdAssemblyMap, ApiError> {
        self.get_enveloped("/assemblies").await
    }

    pub async fn assembly_nomenclatures(&self, assembly_id: AssemblyId)
        -> Result<Vec<NomenclatureName>, ApiError>
    {
        self.get_enveloped(&format!("/assemblies/{}/nomenclatures", assembly_id)).await
    }

    pub async fn configurations(&self) -> Result<Vec<Configuration>, ApiError> {
        self.get_enveloped("/configurations").await
    }

    pub async fn data_types(&self) -> Result<NameDataTypeMap, ApiError> {
        self.get_enveloped("/data_types").await
    }

    pub async fn search_genes(&self, query: &GeneSearchQuery)
        -> Result<GeneSearchResults, ApiError>
    {
        let url = self.client.public_url(
            &format!("/genes/search?{}", query.to_query_string()));
        let response: GeneSearchResponse = self.client.get_json(&url).await?;

        Ok(GeneSearchResults {
            genes: response.data,
            pagination: response.pagination,
        })
    }

    pub async fn gene(&self, gid: GeneDbId) -> Result<GeneDetails, ApiError> {
        self.get_enveloped(&format!("/gene/{}", gid)).await
    }

    pub async fn transcript_data(&self, tid: TranscriptDbId, transcript_id: &str,
                                 assembly_id: AssemblyId, nomenclature: &str)
        -> Result<TranscriptDetails, ApiError>
    {
        let path = format!(
            "/transcript_data?tid={}&transcript_id={}&assembly_id={}&nomenclature={}",
            tid, encode_path_segment(transcript_id), assembly_id,
            encode_path_segment(nomenclature));
        self.get_enveloped(&path).await
    }

    // download / track URLs; no request is issued here, the browser or a
    // download client follows them

    pub fn fasta_url(&self, assembly_id: AssemblyId, nomenclature: &str) -> String {
        self.client.public_url(
            &format!("/fasta/{}/{}", assembly_id, encode_path_segment(nomenclature)))
    }

    pub fn fai_url(&self, assembly_id: AssemblyId, nomenclature: &str) -> String {
        self.client.public_url(
            &format!("/fai/{}/{}", assembly_id, encode_path_segment(nomenclature)))
    }

    pub fn gff3_bgz_url(&self, sva_id: SourceVersionAssemblyId, nomenclature: &str) -> String {
        self.client.public_url(
            &format!("/gff3bgz_jbrowse2/{}/{}", sva_id, encode_path_segment(nomenclature)))
    }

    pub fn gff3_tbi_url(&self, sva_id: SourceVersionAssemblyId, nomenclature: &str) -> String {
        self.client.public_url(
            &format!("/gff3bgztbi/{}/{}", sva_id, encode_path_segment(nomenclature)))
    }

    pub fn source_file_url(&self, sva_id: SourceVersionAssemblyId, nomenclature: &str,
                           file_type: &str) -> String {
        self.client.public_url(
            &format!("/source_file/{}/{}/{}", sva_id,
                     encode_path_segment(nomenclature),
                     encode_path_segment(file_type)))
    }

    pub fn pdb_url(&self, td_id: TranscriptDataId) -> String {
        self.client.public_url(&format!("/pdb/{}", td_id))
    }

    pub fn pdb_download_url(&self, td_id: TranscriptDataId) -> String {
        self.client.public_url(&format!("/pdb_download/{}", td_id))
    }
}
