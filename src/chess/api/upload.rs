use std::fmt;
use std::mem;

use bytes::Bytes;
use flexstr::SharedStr as FlexStr;
use indexmap::{IndexMap, IndexSet};
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::api::client::ApiError;
use crate::constants::{GENE_NAME_CANDIDATES, GENE_TYPE_CANDIDATES,
                       TRANSCRIPT_TYPE_CANDIDATES};
use crate::data_types::{AttributeInfo, AttributeKind};
use crate::types::*;

// Everything the client sends in the submission phase.  The payload is
// kept as Bytes so restarting a failed upload doesn't re-read the file.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub source_id: SourceId,
    pub source_version_id: SourceVersionId,
    pub assembly_id: AssemblyId,
    pub file_name: FlexStr,
    pub payload: Bytes,
    pub description: FlexStr,
}

// The nomenclature_detection payload from the submission phase.  The two
// temp file paths are opaque server-side handles and must be echoed back
// unchanged in the confirmation request.  Attribute order is the file
// order and is semantic: the default-mapping fallback tiers scan it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NomenclatureDetection {
    pub detected_nomenclatures: Vec<(NomenclatureName, Vec<SequenceName>)>,
    pub attributes: IndexMap<AttributeName, AttributeInfo>,
    pub file_sequences: Vec<SequenceName>,
    pub temp_file_path: FlexStr,
    pub norm_gtf_path: FlexStr,
    pub assembly_id: AssemblyId,
    pub source_version_id: SourceVersionId,
    #[serde(default)]
    pub description: FlexStr,
}

impl NomenclatureDetection {
    pub fn attribute_names(&self) -> Vec<AttributeName> {
        self.attributes.keys().cloned().collect()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn has_nomenclature(&self, name: &str) -> bool {
        self.detected_nomenclatures.iter().any(|(n, _)| n.as_str() == name)
    }

    // sequence identifiers from the file that don't resolve under the
    // given nomenclature; None if the nomenclature wasn't detected at all
    pub fn missing_sequences(&self, nomenclature: &str) -> Option<&[SequenceName]> {
        self.detected_nomenclatures.iter()
            .find(|(n, _)| n.as_str() == nomenclature)
            .map(|(_, missing)| missing.as_slice())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConfirmAnnotationRequest {
    pub selected_nomenclature: NomenclatureName,
    pub transcript_type_key: AttributeName,
    pub gene_type_key: AttributeName,
    pub gene_name_key: AttributeName,
    pub attribute_types: IndexMap<AttributeName, AttributeKind>,
    pub categorical_attribute_values: IndexMap<AttributeName, Vec<AttributeValue>>,
    pub excluded_attributes: Vec<AttributeName>,
    pub temp_file_path: FlexStr,
    pub norm_gtf_path: FlexStr,
    pub assembly_id: AssemblyId,
    pub source_version_id: SourceVersionId,
    pub description: FlexStr,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ImportSummary {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<FlexStr>,
    #[serde(default)]
    pub genes_added: Option<u64>,
    #[serde(default)]
    pub transcripts_added: Option<u64>,
}

// Outcome of the submission phase: the server either applies the import
// immediately or answers with the detection payload for phase two.
#[derive(Clone, Debug)]
pub enum UploadOutcome {
    Committed(ImportSummary),
    NeedsConfirmation(NomenclatureDetection),
}

// The two wire operations of the upload protocol, abstracted so the
// workflow can be driven by a mock in tests.
#[allow(async_fn_in_trait)]
pub trait AnnotationUpload {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, ApiError>;

    async fn confirm(&self, source_id: SourceId, sv_id: SourceVersionId,
                     request: &ConfirmAnnotationRequest)
        -> Result<ImportSummary, ApiError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequiredKey {
    TranscriptType,
    GeneType,
    GeneName,
}

impl RequiredKey {
    pub fn field_name(&self) -> &'static str {
        match self {
            RequiredKey::TranscriptType => "transcript_type_key",
            RequiredKey::GeneType => "gene_type_key",
            RequiredKey::GeneName => "gene_name_key",
        }
    }

    fn candidates(&self) -> &'static [&'static str] {
        match self {
            RequiredKey::TranscriptType => TRANSCRIPT_TYPE_CANDIDATES,
            RequiredKey::GeneType => GENE_TYPE_CANDIDATES,
            RequiredKey::GeneName => GENE_NAME_CANDIDATES,
        }
    }
}

impl fmt::Display for RequiredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("no nomenclature selected")]
    MissingNomenclature,
    #[error("nomenclature \"{0}\" was not detected for this file")]
    UnknownNomenclature(NomenclatureName),
    #[error("no attribute selected for {0}")]
    MissingKey(RequiredKey),
    #[error("attribute \"{1}\" selected for {0} is not in the file")]
    UnknownKey(RequiredKey, AttributeName),
}

// Default-mapping search, reproduced from the original behavior: (a)
// case-sensitive match in candidate order, (b) case-insensitive match in
// attribute (file) order, (c) substring match in either direction, also
// in attribute order.  A field that is already set is left alone.
fn best_default_match(attribute_names: &[AttributeName],
                      candidates: &[&str],
                      current: &str) -> Option<AttributeName> {
    if !current.is_empty() {
        return None;
    }

    for candidate in candidates {
        if attribute_names.iter().any(|name| name.as_str() == *candidate) {
            return Some((*candidate).into());
        }
    }

    for name in attribute_names {
        for candidate in candidates {
            if name.to_lowercase() == candidate.to_lowercase() {
                return Some(name.clone());
            }
        }
    }

    for name in attribute_names {
        let name_lower = name.to_lowercase();
        for candidate in candidates {
            let candidate_lower = candidate.to_lowercase();
            if name_lower.contains(&candidate_lower) ||
                candidate_lower.contains(&name_lower) {
                return Some(name.clone());
            }
        }
    }

    None
}

// Client-side state of the confirmation phase: the chosen nomenclature,
// the three required key mappings, per-attribute type overrides and the
// excluded set.  Mirrors what the curator can change before committing.
#[derive(Clone, Debug, Default)]
pub struct ConfirmationForm {
    selected_nomenclature: NomenclatureName,
    transcript_type_key: AttributeName,
    gene_type_key: AttributeName,
    gene_name_key: AttributeName,
    attribute_types: IndexMap<AttributeName, AttributeKind>,
    excluded_attributes: IndexSet<AttributeName>,
}

impl ConfirmationForm {
    pub fn new(detection: &NomenclatureDetection) -> ConfirmationForm {
        let attribute_types = detection.attributes.iter()
            .map(|(name, info)| (name.clone(), info.kind))
            .collect();

        ConfirmationForm {
            attribute_types,
            ..ConfirmationForm::default()
        }
    }

    pub fn apply_default_mappings(&mut self, detection: &NomenclatureDetection) {
        let names = detection.attribute_names();

        if let Some(name) = best_default_match(&names, RequiredKey::TranscriptType.candidates(),
                                               &self.transcript_type_key) {
            self.transcript_type_key = name;
        }
        if let Some(name) = best_default_match(&names, RequiredKey::GeneType.candidates(),
                                               &self.gene_type_key) {
            self.gene_type_key = name;
        }
        if let Some(name) = best_default_match(&names, RequiredKey::GeneName.candidates(),
                                               &self.gene_name_key) {
            self.gene_name_key = name;
        }
    }

    pub fn select_nomenclature(&mut self, name: NomenclatureName) {
        self.selected_nomenclature = name;
    }

    pub fn selected_nomenclature(&self) -> &NomenclatureName {
        &self.selected_nomenclature
    }

    pub fn set_key(&mut self, key: RequiredKey, name: AttributeName) {
        match key {
            RequiredKey::TranscriptType => self.transcript_type_key = name,
            RequiredKey::GeneType => self.gene_type_key = name,
            RequiredKey::GeneName => self.gene_name_key = name,
        }
    }

    pub fn key(&self, key: RequiredKey) -> &AttributeName {
        match key {
            RequiredKey::TranscriptType => &self.transcript_type_key,
            RequiredKey::GeneType => &self.gene_type_key,
            RequiredKey::GeneName => &self.gene_name_key,
        }
    }

    // type overrides only apply to attributes that exist in the file
    pub fn set_attribute_kind(&mut self, name: &str, kind: AttributeKind) -> bool {
        match self.attribute_types.get_mut(name) {
            Some(entry) => {
                *entry = kind;
                true
            },
            None => false,
        }
    }

    pub fn attribute_kind(&self, name: &str) -> Option<AttributeKind> {
        self.attribute_types.get(name).copied()
    }

    pub fn exclude(&mut self, name: AttributeName) {
        self.excluded_attributes.insert(name);
    }

    pub fn include(&mut self, name: &str) {
        self.excluded_attributes.shift_remove(name);
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_attributes.contains(name)
    }

    // "Uncheck All"
    pub fn exclude_all(&mut self, detection: &NomenclatureDetection) {
        self.excluded_attributes = detection.attributes.keys().cloned().collect();
    }

    // "Check All"
    pub fn include_all(&mut self) {
        self.excluded_attributes.clear();
    }

    pub fn excluded_attributes(&self) -> Vec<AttributeName> {
        self.excluded_attributes.iter().cloned().collect()
    }

    // the confirm control is enabled exactly when all four selections are
    // non-empty; membership checks happen on the actual confirm
    pub fn can_confirm(&self) -> bool {
        !self.selected_nomenclature.is_empty() &&
            !self.transcript_type_key.is_empty() &&
            !self.gene_type_key.is_empty() &&
            !self.gene_name_key.is_empty()
    }

    pub fn validate(&self, detection: &NomenclatureDetection) -> Result<(), FormError> {
        if self.selected_nomenclature.is_empty() {
            return Err(FormError::MissingNomenclature);
        }
        if !detection.has_nomenclature(&self.selected_nomenclature) {
            return Err(FormError::UnknownNomenclature(self.selected_nomenclature.clone()));
        }

        for key in [RequiredKey::TranscriptType, RequiredKey::GeneType,
                    RequiredKey::GeneName] {
            let name = self.key(key);
            if name.is_empty() {
                return Err(FormError::MissingKey(key));
            }
            // NOTE: a key mapped to an excluded attribute is accepted, as
            // in the original behavior
            if !detection.has_attribute(name) {
                return Err(FormError::UnknownKey(key, name.clone()));
            }
        }

        Ok(())
    }

    pub fn to_confirm_request(&self, detection: &NomenclatureDetection)
        -> ConfirmAnnotationRequest
    {
        // value sets are only sent for attributes that are still
        // categorical after overrides and aren't excluded from storage
        let mut categorical_attribute_values = IndexMap::new();
        for (name, info) in &detection.attributes {
            let kind = self.attribute_kind(name).unwrap_or(info.kind);
            if kind == AttributeKind::Categorical &&
                !info.values.is_empty() &&
                !self.is_excluded(name) {
                categorical_attribute_values.insert(name.clone(), info.values.clone());
            }
        }

        ConfirmAnnotationRequest {
            selected_nomenclature: self.selected_nomenclature.clone(),
            transcript_type_key: self.transcript_type_key.clone(),
            gene_type_key: self.gene_type_key.clone(),
            gene_name_key: self.gene_name_key.clone(),
            attribute_types: self.attribute_types.clone(),
            categorical_attribute_values,
            excluded_attributes: self.excluded_attributes(),
            temp_file_path: detection.temp_file_path.clone(),
            norm_gtf_path: detection.norm_gtf_path.clone(),
            assembly_id: detection.assembly_id,
            source_version_id: detection.source_version_id,
            description: detection.description.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum UploadState {
    Idle,
    Uploading,
    AwaitingConfirmation {
        source_id: SourceId,
        detection: NomenclatureDetection,
    },
    Configuring {
        source_id: SourceId,
        detection: NomenclatureDetection,
        form: ConfirmationForm,
    },
    Confirming {
        source_id: SourceId,
        detection: NomenclatureDetection,
        form: ConfirmationForm,
    },
    Committed {
        summary: ImportSummary,
    },
    Failed {
        message: FlexStr,
    },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Uploading => "uploading",
            UploadState::AwaitingConfirmation { .. } => "awaiting-confirmation",
            UploadState::Configuring { .. } => "configuring",
            UploadState::Confirming { .. } => "confirming",
            UploadState::Committed { .. } => "committed",
            UploadState::Failed { .. } => "failed",
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("cannot {action} in the {state} state")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Form(#[from] FormError),
}

// One upload attempt against one (source version, assembly) target.  The
// server only ever sees complete requests; every error path lands back on
// a state the curator can act from.  Cancelling drops the detection
// payload and the server reclaims its temp files on its own schedule.
pub struct UploadWorkflow<C: AnnotationUpload> {
    id: Uuid,
    client: C,
    state: UploadState,
}

impl<C: AnnotationUpload> UploadWorkflow<C> {
    pub fn new(client: C) -> UploadWorkflow<C> {
        UploadWorkflow {
            id: Uuid::new_v4(),
            client,
            state: UploadState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn detection(&self) -> Option<&NomenclatureDetection> {
        match &self.state {
            UploadState::AwaitingConfirmation { detection, .. } |
            UploadState::Configuring { detection, .. } |
            UploadState::Confirming { detection, .. } => Some(detection),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&ConfirmationForm> {
        match &self.state {
            UploadState::Configuring { form, .. } |
            UploadState::Confirming { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut ConfirmationForm> {
        match &mut self.state {
            UploadState::Configuring { form, .. } => Some(form),
            _ => None,
        }
    }

    // Submission phase.  A failed submission returns to idle: nothing was
    // committed and nothing is retained.
    pub async fn submit(&mut self, request: &UploadRequest)
        -> Result<&UploadState, WorkflowError>
    {
        if !matches!(self.state, UploadState::Idle) {
            return Err(WorkflowError::InvalidState {
                action: "submit",
                state: self.state.name(),
            });
        }

        self.state = UploadState::Uploading;

        match self.client.upload(request).await {
            Ok(UploadOutcome::Committed(summary)) => {
                self.state = UploadState::Committed { summary };
                Ok(&self.state)
            },
            Ok(UploadOutcome::NeedsConfirmation(detection)) => {
                self.state = UploadState::AwaitingConfirmation {
                    source_id: request.source_id,
                    detection,
                };
                Ok(&self.state)
            },
            Err(err) => {
                self.state = UploadState::Idle;
                Err(WorkflowError::Api(err))
            },
        }
    }

    // Build the confirmation form and fill the required keys from the
    // default-mapping search.
    pub fn begin_configuration(&mut self) -> Result<(), WorkflowError> {
        let state = mem::replace(&mut self.state, UploadState::Idle);

        match state {
            UploadState::AwaitingConfirmation { source_id, detection } => {
                let mut form = ConfirmationForm::new(&detection);
                form.apply_default_mappings(&detection);
                self.state = UploadState::Configuring { source_id, detection, form };
                Ok(())
            },
            other => {
                let state_name = other.name();
                self.state = other;
                Err(WorkflowError::InvalidState {
                    action: "begin configuration",
                    state: state_name,
                })
            },
        }
    }

    // Confirmation phase.  A server rejection returns to configuring with
    // the detection payload and form intact so the curator can retry
    // without re-uploading the file.
    pub async fn confirm(&mut self) -> Result<&UploadState, WorkflowError> {
        let state = mem::replace(&mut self.state, UploadState::Idle);

        let (source_id, detection, form) = match state {
            UploadState::Configuring { source_id, detection, form } => {
                (source_id, detection, form)
            },
            other => {
                let state_name = other.name();
                self.state = other;
                return Err(WorkflowError::InvalidState {
                    action: "confirm",
                    state: state_name,
                });
            },
        };

        if let Err(err) = form.validate(&detection) {
            self.state = UploadState::Configuring { source_id, detection, form };
            return Err(WorkflowError::Form(err));
        }

        let request = form.to_confirm_request(&detection);
        let sv_id = detection.source_version_id;
        self.state = UploadState::Confirming { source_id, detection, form };

        match self.client.confirm(source_id, sv_id, &request).await {
            Ok(summary) => {
                self.state = UploadState::Committed { summary };
                Ok(&self.state)
            },
            Err(err) => {
                let state = mem::replace(&mut self.state, UploadState::Idle);
                if let UploadState::Confirming { source_id, detection, form } = state {
                    self.state = UploadState::Configuring { source_id, detection, form };
                } else {
                    self.state = state;
                }
                Err(WorkflowError::Api(err))
            },
        }
    }

    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        match self.state {
            UploadState::Idle |
            UploadState::AwaitingConfirmation { .. } |
            UploadState::Configuring { .. } => {
                self.state = UploadState::Idle;
                Ok(())
            },
            _ => Err(WorkflowError::InvalidState {
                action: "cancel",
                state: self.state.name(),
            }),
        }
    }

    // terminal give-up after a rejected confirmation
    pub fn fail(&mut self, message: FlexStr) {
        self.state = UploadState::Failed { message };
    }
}
