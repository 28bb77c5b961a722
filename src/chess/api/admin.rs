use bytes::Bytes;
use flexstr::SharedStr as FlexStr;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::api::client::{ApiClient, ApiError, ApiStatus, encode_path_segment, file_part};
use crate::api::upload::{AnnotationUpload, ConfirmAnnotationRequest, ImportSummary,
                         UploadOutcome, UploadRequest};
use crate::constants::{TABLE_PREVIEW_DEFAULT_LIMIT, TABLE_PREVIEW_MAX_LIMIT};
use crate::data_types::{DatabaseList, TablePreview};
use crate::types::*;

#[derive(Serialize, Clone, Debug)]
pub struct NewOrganism {
    pub taxonomy_id: TaxonomyId,
    pub scientific_name: FlexStr,
    pub common_name: FlexStr,
    pub information: FlexStr,
}

#[derive(Serialize, Clone, Debug)]
pub struct OrganismUpdate {
    pub scientific_name: FlexStr,
    pub common_name: FlexStr,
    pub information: FlexStr,
}

#[derive(Serialize, Clone, Debug)]
pub struct NewAssembly {
    pub assembly_name: AssemblyName,
    pub taxonomy_id: TaxonomyId,
    pub information: FlexStr,
}

#[derive(Serialize, Clone, Debug)]
pub struct NewSource {
    pub name: SourceName,
    pub information: FlexStr,
    pub link: FlexStr,
    pub citation: FlexStr,
}

#[derive(Serialize, Clone, Debug)]
pub struct NewSourceVersion {
    pub version_name: VersionName,
    pub information: FlexStr,
}

#[derive(Serialize, Clone, Debug)]
pub struct NewConfiguration {
    pub description: FlexStr,
    pub organism_id: TaxonomyId,
    pub assembly_id: AssemblyId,
    pub nomenclature: NomenclatureName,
    pub source_id: SourceId,
    pub sv_id: SourceVersionId,
    pub sequence_id: FlexStr,
    pub start: u64,
    pub end: u64,
}

#[derive(Serialize, Clone, Debug)]
pub struct DataTypeUpsert {
    pub data_type: DataTypeName,
    pub description: FlexStr,
}

#[derive(Serialize, Clone, Debug)]
pub struct DatasetUpdate {
    pub name: FlexStr,
    pub description: FlexStr,
    pub data_type: DataTypeName,
}

// metadata accompanying the TSV payload of a new dataset
#[derive(Clone, Debug)]
pub struct NewDataset {
    pub name: FlexStr,
    pub description: FlexStr,
    pub data_type: DataTypeName,
    pub sva_id: SourceVersionAssemblyId,
}

#[derive(Deserialize, Debug)]
pub struct AddSourceResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<FlexStr>,
    pub source_id: SourceId,
}

#[derive(Deserialize, Debug)]
pub struct DataDirResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<FlexStr>,
}

// The administrative surface of the CHESS API.  Every mutating call is a
// single server round-trip; callers refetch the global snapshot afterwards
// rather than patching local state.
#[derive(Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> AdminApi {
        AdminApi { client }
    }

    // database administration

    pub async fn db_config(&self) -> Result<Option<FlexStr>, ApiError> {
        let url = self.client.admin_url("/db_config");
        let response: DataDirResponse = self.client.get_json(&url).await?;
        Ok(response.data)
    }

    pub async fn set_db_config(&self, data_dir: &str) -> Result<Option<FlexStr>, ApiError> {
        let url = self.client.admin_url("/set_db_config");
        let body = serde_json::json!({ "data_dir": data_dir });
        let response: DataDirResponse = self.client.post_json(&url, &body).await?;
        Ok(response.data)
    }

    pub async fn create_backup(&self, backup_path: &str) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url("/create_backup");
        let body = serde_json::json!({ "backup_path": backup_path });
        self.client.post_json(&url, &body).await
    }

    pub async fn restore_backup(&self, backup_path: &str, storage_dir_path: &str)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url("/restore_backup");
        let body = serde_json::json!({
            "backup_path": backup_path,
            "storage_dir_path": storage_dir_path,
        });
        self.client.post_json(&url, &body).await
    }

    pub async fn db_list(&self) -> Result<DatabaseList, ApiError> {
        let url = self.client.admin_url("/db_list");
        self.client.get_json(&url).await
    }

    pub async fn table_data(&self, table_name: &str, search: Option<&str>,
                            limit: Option<u32>)
        -> Result<TablePreview, ApiError>
    {
        let mut url = self.client.admin_url(
            &format!("/db_table_data/{}", encode_path_segment(table_name)));

        // the endpoint accepts 1..=100 and falls back to 10 otherwise
        let limit = limit.unwrap_or(TABLE_PREVIEW_DEFAULT_LIMIT)
            .clamp(1, TABLE_PREVIEW_MAX_LIMIT);

        let mut params = vec![format!("limit={}", limit)];
        if let Some(search) = search {
            params.push(format!("search={}", encode_path_segment(search)));
        }
        url = format!("{}?{}", url, params.join("&"));

        self.client.get_json(&url).await
    }

    pub async fn reset_db(&self) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url("/reset_db");
        self.client.post_empty(&url).await
    }

    pub async fn clear_table(&self, table_name: &str) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url("/clear_table");
        let body = serde_json::json!({ "table_name": table_name });
        self.client.post_json(&url, &body).await
    }

    // organisms

    pub async fn add_organism(&self, organism: &NewOrganism) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url("/organisms");
        self.client.post_json(&url, organism).await
    }

    pub async fn update_organism(&self, taxonomy_id: TaxonomyId, update: &OrganismUpdate)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(&format!("/organisms/{}", taxonomy_id));
        self.client.put_json(&url, update).await
    }

    pub async fn delete_organism(&self, taxonomy_id: TaxonomyId) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url(&format!("/organisms/{}", taxonomy_id));
        self.client.delete_json(&url).await
    }

    // assemblies

    pub async fn add_assembly(&self, assembly: &NewAssembly) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url("/assemblies");
        self.client.post_json(&url, assembly).await
    }

    pub async fn update_assembly(&self, assembly_id: AssemblyId, update: &NewAssembly)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(&format!("/assemblies/{}", assembly_id));
        self.client.put_json(&url, update).await
    }

    pub async fn delete_assembly(&self, assembly_id: AssemblyId) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url(&format!("/assemblies/{}", assembly_id));
        self.client.delete_json(&url).await
    }

    pub async fn upload_fasta(&self, assembly_id: AssemblyId, nomenclature: &str,
                              file_name: &str, payload: Bytes)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url("/assemblies/upload-fasta");
        let form = reqwest::multipart::Form::new()
            .part("fasta_file", file_part(file_name, payload))
            .text("assembly_id", assembly_id.to_string())
            .text("nomenclature", nomenclature.to_owned());

        info!("uploading FASTA {} for assembly {}", file_name, assembly_id);
        self.client.post_multipart(&url, form).await
    }

    // nomenclatures

    pub async fn upload_nomenclature_tsv(&self, assembly_id: AssemblyId,
                                         source_nomenclature: &str,
                                         new_nomenclature: &str,
                                         file_name: &str, payload: Bytes)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(
            &format!("/assemblies/{}/nomenclatures/upload-tsv", assembly_id));
        let form = reqwest::multipart::Form::new()
            .part("tsv_file", file_part(file_name, payload))
            .text("source_nomenclature", source_nomenclature.to_owned())
            .text("new_nomenclature", new_nomenclature.to_owned());

        self.client.post_multipart(&url, form).await
    }

    pub async fn delete_nomenclature(&self, assembly_id: AssemblyId, nomenclature: &str)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(
            &format!("/assemblies/{}/nomenclatures/{}", assembly_id,
                     encode_path_segment(nomenclature)));
        self.client.delete_json(&url).await
    }

    // configurations

    pub async fn create_configuration(&self, configuration: &NewConfiguration)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url("/configurations");
        self.client.post_json(&url, configuration).await
    }

    pub async fn update_configuration(&self, configuration_id: ConfigurationId,
                                      configuration: &NewConfiguration)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(&format!("/configurations/{}", configuration_id));
        self.client.put_json(&url, configuration).await
    }

    pub async fn delete_configuration(&self, configuration_id: ConfigurationId)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(&format!("/configurations/{}", configuration_id));
        self.client.delete_json(&url).await
    }

    pub async fn activate_configuration(&self, configuration_id: ConfigurationId)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(
            &format!("/configurations/{}/activate", configuration_id));
        self.client.post_empty(&url).await
    }

    // sources and source versions

    pub async fn add_source(&self, source: &NewSource) -> Result<AddSourceResponse, ApiError> {
        let url = self.client.admin_url("/add_to_source");
        self.client.post_json(&url, source).await
    }

    pub async fn update_source(&self, source_id: SourceId, update: &NewSource)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(&format!("/sources/{}", source_id));
        self.client.put_json(&url, update).await
    }

    pub async fn delete_source(&self, source_id: SourceId) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url(&format!("/sources/{}", source_id));
        self.client.delete_json(&url).await
    }

    pub async fn add_source_version(&self, source_id: SourceId, version: &NewSourceVersion)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(&format!("/sources/{}/source-versions", source_id));
        self.client.post_json(&url, version).await
    }

    pub async fn delete_source_version(&self, source_id: SourceId, sv_id: SourceVersionId)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(
            &format!("/sources/{}/source-versions/{}", source_id, sv_id));
        self.client.delete_json(&url).await
    }

    pub async fn delete_source_version_assembly(&self, source_id: SourceId,
                                                sv_id: SourceVersionId,
                                                sva_id: SourceVersionAssemblyId)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(
            &format!("/sources/{}/source-versions/{}/assemblies/{}",
                     source_id, sv_id, sva_id));
        self.client.delete_json(&url).await
    }

    // the full reordered id list, as produced by the drag-and-drop UI
    pub async fn reorder_source_versions(&self, source_id: SourceId,
                                         new_order: &[SourceVersionId])
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(
            &format!("/sources/{}/source-versions/reorder", source_id));
        let body = serde_json::json!({ "new_order": new_order });
        self.client.post_json(&url, &body).await
    }

    // data types and datasets

    pub async fn add_data_type(&self, data_type: &DataTypeUpsert) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url("/datasets/add_data_type");
        self.client.post_json(&url, data_type).await
    }

    pub async fn edit_data_type(&self, data_type: &DataTypeUpsert) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url("/datasets/edit_data_type");
        self.client.post_json(&url, data_type).await
    }

    pub async fn delete_data_type(&self, data_type: &str) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url("/datasets/delete_data_type");
        let body = serde_json::json!({ "data_type": data_type });
        self.client.post_json(&url, &body).await
    }

    pub async fn create_dataset(&self, dataset: &NewDataset, file_name: &str,
                                payload: Bytes)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url("/datasets");
        let form = reqwest::multipart::Form::new()
            .part("file", file_part(file_name, payload))
            .text("name", dataset.name.to_string())
            .text("description", dataset.description.to_string())
            .text("data_type", dataset.data_type.to_string())
            .text("sva_id", dataset.sva_id.to_string());

        self.client.post_multipart(&url, form).await
    }

    pub async fn update_dataset(&self, dataset_id: DatasetId, update: &DatasetUpdate)
        -> Result<ApiStatus, ApiError>
    {
        let url = self.client.admin_url(&format!("/datasets/{}", dataset_id));
        self.client.put_json(&url, update).await
    }

    pub async fn delete_dataset(&self, dataset_id: DatasetId) -> Result<ApiStatus, ApiError> {
        let url = self.client.admin_url(&format!("/datasets/{}", dataset_id));
        self.client.delete_json(&url).await
    }
}

impl AnnotationUpload for AdminApi {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, ApiError> {
        let url = self.client.admin_url(
            &format!("/sources/{}/source-versions/{}/upload-gtf",
                     request.source_id, request.source_version_id));

        let form = reqwest::multipart::Form::new()
            .part("gtf_file", file_part(&request.file_name, request.payload.clone()))
            .text("assembly_id", request.assembly_id.to_string())
            .text("description", request.description.to_string());

        info!("uploading {} ({} bytes) to source version {}",
              request.file_name, request.payload.len(), request.source_version_id);

        let response: Value = self.client.post_multipart(&url, form).await?;

        if response.get("status").and_then(Value::as_str) == Some("nomenclature_detection") {
            let detection = serde_json::from_value(response)?;
            Ok(UploadOutcome::NeedsConfirmation(detection))
        } else {
            let summary = serde_json::from_value(response)?;
            Ok(UploadOutcome::Committed(summary))
        }
    }

    async fn confirm(&self, source_id: SourceId, sv_id: SourceVersionId,
                     request: &ConfirmAnnotationRequest)
        -> Result<ImportSummary, ApiError>
    {
        let url = self.client.admin_url(
            &format!("/sources/{}/source-versions/{}/confirm-annotation",
                     source_id, sv_id));
        self.client.post_json(&url, request).await
    }
}
