use std::collections::HashMap;

use flexstr::SharedStr as FlexStr;
use thiserror::Error;

use crate::api::admin::NewConfiguration;
use crate::bio::gtf_scan::annotation_format_from_name;
use crate::data_types::GlobalData;
use crate::types::*;

pub type FieldName = &'static str;

pub const ORGANISM_FIELD: FieldName = "organism_id";
pub const ASSEMBLY_FIELD: FieldName = "assembly_id";
pub const NOMENCLATURE_FIELD: FieldName = "nomenclature";
pub const SEQUENCE_FIELD: FieldName = "sequence_id";
pub const START_FIELD: FieldName = "start";
pub const END_FIELD: FieldName = "end";
pub const SOURCE_FIELD: FieldName = "source_id";
pub const VERSION_FIELD: FieldName = "sv_id";

// Directed acyclic dependency graph over form fields.  An edge parent →
// child means the child's choices are narrowed by the parent, so changing
// the parent invalidates the child and everything below it.
#[derive(Clone, Debug, Default)]
pub struct FieldDependencyGraph {
    edges: HashMap<FieldName, Vec<FieldName>>,
}

impl FieldDependencyGraph {
    pub fn new() -> FieldDependencyGraph {
        FieldDependencyGraph::default()
    }

    pub fn add_dependency(&mut self, parent: FieldName, child: FieldName) {
        let children = self.edges.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
    }

    // every field reachable from the given one, in breadth-first order
    pub fn descendants(&self, field: FieldName) -> Vec<FieldName> {
        let mut result = vec![];
        let mut queue: Vec<FieldName> =
            self.edges.get(field).cloned().unwrap_or_default();

        while !queue.is_empty() {
            let current = queue.remove(0);
            if result.contains(&current) {
                continue;
            }
            result.push(current);
            if let Some(children) = self.edges.get(current) {
                queue.extend(children.iter().copied());
            }
        }

        result
    }
}

// Form state with cascading resets: setting a field clears all fields
// reachable from it in the dependency graph.  Values are kept as strings,
// exactly as the form controls hold them.
#[derive(Clone, Debug)]
pub struct CascadingForm {
    graph: FieldDependencyGraph,
    values: HashMap<FieldName, FlexStr>,
}

impl CascadingForm {
    pub fn new(graph: FieldDependencyGraph) -> CascadingForm {
        CascadingForm {
            graph,
            values: HashMap::new(),
        }
    }

    // returns the fields that actually lost a value
    pub fn set(&mut self, field: FieldName, value: FlexStr) -> Vec<FieldName> {
        self.values.insert(field, value);

        let mut cleared = vec![];
        for descendant in self.graph.descendants(field) {
            if let Some(old) = self.values.remove(descendant) {
                if !old.is_empty() {
                    cleared.push(descendant);
                }
            }
        }
        cleared
    }

    pub fn get(&self, field: FieldName) -> &str {
        self.values.get(field).map(FlexStr::as_str).unwrap_or("")
    }

    pub fn is_set(&self, field: FieldName) -> bool {
        !self.get(field).is_empty()
    }
}

pub fn configuration_graph() -> FieldDependencyGraph {
    let mut graph = FieldDependencyGraph::new();
    graph.add_dependency(ORGANISM_FIELD, ASSEMBLY_FIELD);
    graph.add_dependency(ASSEMBLY_FIELD, NOMENCLATURE_FIELD);
    graph.add_dependency(ASSEMBLY_FIELD, SOURCE_FIELD);
    graph.add_dependency(NOMENCLATURE_FIELD, SEQUENCE_FIELD);
    graph.add_dependency(SEQUENCE_FIELD, START_FIELD);
    graph.add_dependency(SEQUENCE_FIELD, END_FIELD);
    graph.add_dependency(SOURCE_FIELD, VERSION_FIELD);
    graph
}

pub fn upload_graph() -> FieldDependencyGraph {
    let mut graph = FieldDependencyGraph::new();
    graph.add_dependency(ORGANISM_FIELD, ASSEMBLY_FIELD);
    graph
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("{0} is required")]
    MissingField(FieldName),
    #[error("{0} has an invalid value: {1}")]
    InvalidField(FieldName, FlexStr),
    #[error("organism {0} does not exist")]
    UnknownOrganism(TaxonomyId),
    #[error("assembly {0} does not exist")]
    UnknownAssembly(AssemblyId),
    #[error("assembly {0} does not belong to organism {1}")]
    AssemblyOrganismMismatch(AssemblyId, TaxonomyId),
    #[error("nomenclature \"{0}\" is not registered on assembly {1}")]
    UnknownNomenclature(NomenclatureName, AssemblyId),
    #[error("source {0} does not exist")]
    UnknownSource(SourceId),
    #[error("source {0} has no version on assembly {1}")]
    SourceNotOnAssembly(SourceId, AssemblyId),
    #[error("source version {0} does not exist or is not on the selected assembly")]
    UnknownVersion(SourceVersionId),
    #[error("sequence {0} is not known under nomenclature \"{1}\"")]
    UnknownSequence(FlexStr, NomenclatureName),
    #[error("invalid range {0}..{1}")]
    InvalidRange(u64, u64),
}

// Draft of a browser Configuration, filled field by field in dependency
// order and checked against the global snapshot before submission.
#[derive(Clone, Debug)]
pub struct ConfigurationDraft {
    form: CascadingForm,
    pub description: FlexStr,
}

impl Default for ConfigurationDraft {
    fn default() -> ConfigurationDraft {
        ConfigurationDraft::new()
    }
}

impl ConfigurationDraft {
    pub fn new() -> ConfigurationDraft {
        ConfigurationDraft {
            form: CascadingForm::new(configuration_graph()),
            description: FlexStr::default(),
        }
    }

    pub fn set_organism(&mut self, taxonomy_id: TaxonomyId) -> Vec<FieldName> {
        self.form.set(ORGANISM_FIELD, taxonomy_id.to_string().into())
    }

    pub fn set_assembly(&mut self, assembly_id: AssemblyId) -> Vec<FieldName> {
        self.form.set(ASSEMBLY_FIELD, assembly_id.to_string().into())
    }

    pub fn set_nomenclature(&mut self, nomenclature: &str) -> Vec<FieldName> {
        self.form.set(NOMENCLATURE_FIELD, nomenclature.into())
    }

    pub fn set_sequence(&mut self, sequence_id: &str) -> Vec<FieldName> {
        self.form.set(SEQUENCE_FIELD, sequence_id.into())
    }

    pub fn set_range(&mut self, start: u64, end: u64) {
        self.form.set(START_FIELD, start.to_string().into());
        self.form.set(END_FIELD, end.to_string().into());
    }

    pub fn set_source(&mut self, source_id: SourceId) -> Vec<FieldName> {
        self.form.set(SOURCE_FIELD, source_id.to_string().into())
    }

    pub fn set_version(&mut self, sv_id: SourceVersionId) -> Vec<FieldName> {
        self.form.set(VERSION_FIELD, sv_id.to_string().into())
    }

    pub fn get(&self, field: FieldName) -> &str {
        self.form.get(field)
    }

    fn required_number<T: std::str::FromStr>(&self, field: FieldName) -> Result<T, DraftError> {
        let value = self.form.get(field);
        if value.is_empty() {
            return Err(DraftError::MissingField(field));
        }
        value.parse()
            .map_err(|_| DraftError::InvalidField(field, value.into()))
    }

    pub fn validate(&self, data: &GlobalData) -> Result<NewConfiguration, DraftError> {
        let taxonomy_id: TaxonomyId = self.required_number(ORGANISM_FIELD)?;
        if !data.organisms.contains_key(&taxonomy_id) {
            return Err(DraftError::UnknownOrganism(taxonomy_id));
        }

        let assembly_id: AssemblyId = self.required_number(ASSEMBLY_FIELD)?;
        let assembly = data.assemblies.get(&assembly_id)
            .ok_or(DraftError::UnknownAssembly(assembly_id))?;
        if assembly.taxonomy_id != taxonomy_id {
            return Err(DraftError::AssemblyOrganismMismatch(assembly_id, taxonomy_id));
        }

        let nomenclature = self.form.get(NOMENCLATURE_FIELD);
        if nomenclature.is_empty() {
            return Err(DraftError::MissingField(NOMENCLATURE_FIELD));
        }
        if !assembly.has_nomenclature(nomenclature) {
            return Err(DraftError::UnknownNomenclature(nomenclature.into(), assembly_id));
        }

        let source_id: SourceId = self.required_number(SOURCE_FIELD)?;
        let source = data.sources.get(&source_id)
            .ok_or(DraftError::UnknownSource(source_id))?;
        if !source.covers_assembly(assembly_id) {
            return Err(DraftError::SourceNotOnAssembly(source_id, assembly_id));
        }

        let sv_id: SourceVersionId = self.required_number(VERSION_FIELD)?;
        let version = source.versions.get(&sv_id)
            .ok_or(DraftError::UnknownVersion(sv_id))?;
        if version.sva_for_assembly(assembly_id).is_none() {
            return Err(DraftError::UnknownVersion(sv_id));
        }

        let sequence_id = self.form.get(SEQUENCE_FIELD);
        if sequence_id.is_empty() {
            return Err(DraftError::MissingField(SEQUENCE_FIELD));
        }
        let sequence_known = assembly.sequence_id_mappings.get(sequence_id)
            .map(|mapping| mapping.nomenclatures.contains_key(nomenclature))
            .unwrap_or(false);
        if !sequence_known {
            return Err(DraftError::UnknownSequence(sequence_id.into(), nomenclature.into()));
        }

        let start: u64 = self.required_number(START_FIELD)?;
        let end: u64 = self.required_number(END_FIELD)?;
        if start > end {
            return Err(DraftError::InvalidRange(start, end));
        }

        Ok(NewConfiguration {
            description: self.description.clone(),
            organism_id: taxonomy_id,
            assembly_id,
            nomenclature: nomenclature.into(),
            source_id,
            sv_id,
            sequence_id: sequence_id.into(),
            start,
            end,
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadFormError {
    #[error("please select a GTF or GFF file (.gtf, .gff or .gff3)")]
    UnsupportedFileType,
    #[error("no annotation file selected")]
    MissingFile,
    #[error("{0} is required")]
    MissingField(FieldName),
    #[error("assembly {0} does not belong to organism {1}")]
    AssemblyOrganismMismatch(AssemblyId, TaxonomyId),
    #[error("{0} has an invalid value")]
    InvalidField(FieldName),
}

// The upload form's target selection: picking a different organism resets
// the assembly choice.
#[derive(Clone, Debug)]
pub struct UploadTargetForm {
    form: CascadingForm,
    file_name: Option<FlexStr>,
    pub description: FlexStr,
}

impl Default for UploadTargetForm {
    fn default() -> UploadTargetForm {
        UploadTargetForm::new()
    }
}

impl UploadTargetForm {
    pub fn new() -> UploadTargetForm {
        UploadTargetForm {
            form: CascadingForm::new(upload_graph()),
            file_name: None,
            description: FlexStr::default(),
        }
    }

    pub fn set_organism(&mut self, taxonomy_id: TaxonomyId) -> Vec<FieldName> {
        self.form.set(ORGANISM_FIELD, taxonomy_id.to_string().into())
    }

    pub fn set_assembly(&mut self, assembly_id: AssemblyId) -> Vec<FieldName> {
        self.form.set(ASSEMBLY_FIELD, assembly_id.to_string().into())
    }

    pub fn set_file(&mut self, file_name: &str) -> Result<(), UploadFormError> {
        if annotation_format_from_name(file_name).is_none() {
            return Err(UploadFormError::UnsupportedFileType);
        }
        self.file_name = Some(file_name.into());
        Ok(())
    }

    pub fn file_name(&self) -> Option<&FlexStr> {
        self.file_name.as_ref()
    }

    pub fn can_submit(&self) -> bool {
        self.file_name.is_some() &&
            self.form.is_set(ORGANISM_FIELD) &&
            self.form.is_set(ASSEMBLY_FIELD)
    }

    // resolve the selection against the snapshot; returns the target
    // assembly id
    pub fn validate(&self, data: &GlobalData) -> Result<AssemblyId, UploadFormError> {
        if self.file_name.is_none() {
            return Err(UploadFormError::MissingFile);
        }

        let organism_value = self.form.get(ORGANISM_FIELD);
        if organism_value.is_empty() {
            return Err(UploadFormError::MissingField(ORGANISM_FIELD));
        }
        let taxonomy_id: TaxonomyId = organism_value.parse()
            .map_err(|_| UploadFormError::InvalidField(ORGANISM_FIELD))?;

        let assembly_value = self.form.get(ASSEMBLY_FIELD);
        if assembly_value.is_empty() {
            return Err(UploadFormError::MissingField(ASSEMBLY_FIELD));
        }
        let assembly_id: AssemblyId = assembly_value.parse()
            .map_err(|_| UploadFormError::InvalidField(ASSEMBLY_FIELD))?;

        let belongs = data.assemblies.get(&assembly_id)
            .map(|assembly| assembly.taxonomy_id == taxonomy_id)
            .unwrap_or(false);
        if !belongs {
            return Err(UploadFormError::AssemblyOrganismMismatch(assembly_id, taxonomy_id));
        }

        Ok(assembly_id)
    }
}
