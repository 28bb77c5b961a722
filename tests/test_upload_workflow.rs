mod util;

use flexstr::ToSharedStr;

use chess::api::upload::{ConfirmationForm, FormError, RequiredKey, UploadOutcome,
                         UploadState, UploadWorkflow};
use chess::data_types::AttributeKind;

use util::{MockAnnotationUpload, categorical, committed_summary, detection,
           server_error, upload_request, variable};

fn gencode_like_detection() -> chess::api::upload::NomenclatureDetection {
    detection(
        &[("RefSeq", &[]), ("UCSC", &["chr1_random"])],
        vec![
            ("gene_id", variable()),
            ("transcript_id", variable()),
            ("gene_type", categorical(&["protein_coding", "lncRNA"])),
            ("gene_name", variable()),
            ("transcript_type", categorical(&["protein_coding", "lncRNA"])),
            ("tag", categorical(&["basic", "MANE_Select"])),
        ])
}

#[test]
fn default_mapping_prefers_exact_matches() {
    let detection = gencode_like_detection();
    let mut form = ConfirmationForm::new(&detection);
    form.apply_default_mappings(&detection);

    // all three requirements have case-sensitive exact matches, so no
    // fallback tier may fire
    assert_eq!(form.key(RequiredKey::TranscriptType).as_str(), "transcript_type");
    assert_eq!(form.key(RequiredKey::GeneType).as_str(), "gene_type");
    assert_eq!(form.key(RequiredKey::GeneName).as_str(), "gene_name");
}

#[test]
fn default_mapping_falls_back_to_biotype() {
    // no attribute is named transcript_type, so the second candidate
    // matches via the exact tier
    let detection = detection(
        &[("RefSeq", &[])],
        vec![
            ("transcript_biotype", categorical(&["protein_coding", "lncRNA"])),
            ("gene_biotype", categorical(&["protein_coding"])),
            ("gene_name", variable()),
        ]);

    let mut form = ConfirmationForm::new(&detection);
    form.apply_default_mappings(&detection);

    assert_eq!(form.key(RequiredKey::TranscriptType).as_str(), "transcript_biotype");
    assert_eq!(form.key(RequiredKey::GeneType).as_str(), "gene_biotype");
}

#[test]
fn default_mapping_is_case_insensitive_then_substring() {
    let detection = detection(
        &[("RefSeq", &[])],
        vec![
            ("Transcript_Type", categorical(&["mRNA"])),
            ("my_gene_type_field", categorical(&["protein_coding"])),
            ("symbol_gene_name", variable()),
        ]);

    let mut form = ConfirmationForm::new(&detection);
    form.apply_default_mappings(&detection);

    // case-insensitive exact match keeps the file's spelling
    assert_eq!(form.key(RequiredKey::TranscriptType).as_str(), "Transcript_Type");
    // substring tier: candidate name contained in the attribute name
    assert_eq!(form.key(RequiredKey::GeneType).as_str(), "my_gene_type_field");
    assert_eq!(form.key(RequiredKey::GeneName).as_str(), "symbol_gene_name");
}

#[test]
fn default_mapping_never_overwrites_a_manual_choice() {
    let detection = gencode_like_detection();
    let mut form = ConfirmationForm::new(&detection);

    form.set_key(RequiredKey::TranscriptType, "tag".to_shared_str());
    form.apply_default_mappings(&detection);

    assert_eq!(form.key(RequiredKey::TranscriptType).as_str(), "tag");
    // untouched fields are still filled
    assert_eq!(form.key(RequiredKey::GeneType).as_str(), "gene_type");

    // re-running the defaults is idempotent
    form.apply_default_mappings(&detection);
    assert_eq!(form.key(RequiredKey::TranscriptType).as_str(), "tag");
    assert_eq!(form.key(RequiredKey::GeneType).as_str(), "gene_type");
}

#[test]
fn exclude_all_and_include_all_are_idempotent() {
    let detection = gencode_like_detection();
    let mut form = ConfirmationForm::new(&detection);

    form.exclude_all(&detection);
    let all_names = detection.attribute_names();
    assert_eq!(form.excluded_attributes(), all_names);

    form.exclude_all(&detection);
    assert_eq!(form.excluded_attributes(), all_names);

    form.include_all();
    assert!(form.excluded_attributes().is_empty());

    form.include_all();
    assert!(form.excluded_attributes().is_empty());
}

#[test]
fn confirm_is_gated_on_all_four_selections() {
    let detection = gencode_like_detection();
    let mut form = ConfirmationForm::new(&detection);

    assert!(!form.can_confirm());

    form.apply_default_mappings(&detection);
    // three keys filled, nomenclature still missing
    assert!(!form.can_confirm());

    form.select_nomenclature("RefSeq".to_shared_str());
    assert!(form.can_confirm());

    form.set_key(RequiredKey::GeneName, "".to_shared_str());
    assert!(!form.can_confirm());
}

#[test]
fn missing_sequence_display_follows_the_selected_nomenclature() {
    let detection = gencode_like_detection();

    let missing = detection.missing_sequences("UCSC").unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].as_str(), "chr1_random");

    // all matched for RefSeq
    assert_eq!(detection.missing_sequences("RefSeq").unwrap().len(), 0);

    assert!(detection.missing_sequences("Ensembl").is_none());
}

#[test]
fn excluded_attribute_is_accepted_as_a_required_key() {
    // current behavior: no cross-check between the excluded set and the
    // required key mappings
    let detection = gencode_like_detection();
    let mut form = ConfirmationForm::new(&detection);
    form.apply_default_mappings(&detection);
    form.select_nomenclature("RefSeq".to_shared_str());

    form.exclude("gene_id".to_shared_str());
    form.set_key(RequiredKey::GeneName, "gene_id".to_shared_str());

    assert!(form.validate(&detection).is_ok());

    let request = form.to_confirm_request(&detection);
    assert_eq!(request.gene_name_key.as_str(), "gene_id");
    assert_eq!(request.excluded_attributes,
               vec!["gene_id".to_shared_str()]);
}

#[test]
fn categorical_values_respect_overrides_and_exclusions() {
    let detection = gencode_like_detection();
    let mut form = ConfirmationForm::new(&detection);
    form.apply_default_mappings(&detection);
    form.select_nomenclature("RefSeq".to_shared_str());

    // reclassify one categorical attribute and exclude another
    assert!(form.set_attribute_kind("gene_type", AttributeKind::Variable));
    form.exclude("tag".to_shared_str());

    let request = form.to_confirm_request(&detection);

    // still-categorical, still-included attribute keeps its value set
    assert!(request.categorical_attribute_values.contains_key("transcript_type"));
    // reclassified attribute loses it
    assert!(!request.categorical_attribute_values.contains_key("gene_type"));
    // excluded attribute loses it
    assert!(!request.categorical_attribute_values.contains_key("tag"));
    // variable attributes never had one
    assert!(!request.categorical_attribute_values.contains_key("gene_id"));

    // the type map is sent for every attribute, including excluded ones
    assert_eq!(request.attribute_types.len(), detection.attributes.len());
    assert_eq!(request.attribute_types.get("gene_type"),
               Some(&AttributeKind::Variable));
}

#[test]
fn kind_override_of_unknown_attribute_is_rejected() {
    let detection = gencode_like_detection();
    let mut form = ConfirmationForm::new(&detection);

    assert!(!form.set_attribute_kind("no_such_attribute", AttributeKind::Variable));
}

#[tokio::test]
async fn workflow_runs_both_phases() {
    let mock = MockAnnotationUpload::new();
    mock.queue_upload(Ok(UploadOutcome::NeedsConfirmation(gencode_like_detection())));
    mock.queue_confirm(Ok(committed_summary("annotation imported")));

    let mut workflow = UploadWorkflow::new(&mock);
    assert_eq!(workflow.state().name(), "idle");

    let request = upload_request();
    workflow.submit(&request).await.unwrap();
    assert_eq!(workflow.state().name(), "awaiting-confirmation");

    workflow.begin_configuration().unwrap();
    assert_eq!(workflow.state().name(), "configuring");

    // the defaults were applied while building the form
    assert_eq!(workflow.form().unwrap()
               .key(RequiredKey::TranscriptType).as_str(), "transcript_type");

    workflow.form_mut().unwrap()
        .select_nomenclature("UCSC".to_shared_str());

    workflow.confirm().await.unwrap();

    match workflow.state() {
        UploadState::Committed { summary } => {
            assert_eq!(summary.message.as_ref().unwrap().as_str(),
                       "annotation imported");
        },
        other => panic!("expected committed state, got {}", other.name()),
    }

    // the opaque temp file handles went back unchanged
    let confirm_requests = mock.confirm_requests.borrow();
    let (source_id, sv_id, sent) = &confirm_requests[0];
    assert_eq!(*source_id, 7);
    assert_eq!(*sv_id, 2);
    assert_eq!(sent.temp_file_path.as_str(), "/tmp/upload-aaaa/gtf_file");
    assert_eq!(sent.norm_gtf_path.as_str(), "/tmp/upload-aaaa/normalized_gtf");
    assert_eq!(sent.selected_nomenclature.as_str(), "UCSC");
    assert_eq!(sent.assembly_id, 1);
    assert_eq!(sent.source_version_id, 2);
}

#[tokio::test]
async fn immediate_commit_skips_the_confirmation_phase() {
    let mock = MockAnnotationUpload::new();
    mock.queue_upload(Ok(UploadOutcome::Committed(committed_summary("done"))));

    let mut workflow = UploadWorkflow::new(&mock);
    workflow.submit(&upload_request()).await.unwrap();

    assert_eq!(workflow.state().name(), "committed");
    assert!(workflow.begin_configuration().is_err());
    assert!(mock.confirm_requests.borrow().is_empty());
}

#[tokio::test]
async fn failed_submission_returns_to_idle() {
    let mock = MockAnnotationUpload::new();
    mock.queue_upload(Err(server_error("Assembly with ID 99 does not exist")));

    let mut workflow = UploadWorkflow::new(&mock);
    let err = workflow.submit(&upload_request()).await.unwrap_err();

    assert_eq!(err.to_string(), "Assembly with ID 99 does not exist");
    assert_eq!(workflow.state().name(), "idle");

    // the request is reusable as-is
    mock.queue_upload(Ok(UploadOutcome::NeedsConfirmation(gencode_like_detection())));
    workflow.submit(&upload_request()).await.unwrap();
    assert_eq!(workflow.state().name(), "awaiting-confirmation");
    assert_eq!(*mock.upload_count.borrow(), 2);
}

#[tokio::test]
async fn rejected_confirmation_keeps_the_detection_payload_for_a_retry() {
    let mock = MockAnnotationUpload::new();
    mock.queue_upload(Ok(UploadOutcome::NeedsConfirmation(gencode_like_detection())));
    mock.queue_confirm(Err(server_error("temporary failure")));
    mock.queue_confirm(Ok(committed_summary("annotation imported")));

    let mut workflow = UploadWorkflow::new(&mock);
    workflow.submit(&upload_request()).await.unwrap();
    workflow.begin_configuration().unwrap();
    workflow.form_mut().unwrap().select_nomenclature("RefSeq".to_shared_str());

    let err = workflow.confirm().await.unwrap_err();
    assert_eq!(err.to_string(), "temporary failure");

    // back in configuring, form and detection intact, no re-upload needed
    assert_eq!(workflow.state().name(), "configuring");
    assert!(workflow.detection().is_some());
    assert_eq!(workflow.form().unwrap().selected_nomenclature().as_str(), "RefSeq");

    workflow.confirm().await.unwrap();
    assert_eq!(workflow.state().name(), "committed");
    assert_eq!(*mock.upload_count.borrow(), 1);
    assert_eq!(mock.confirm_requests.borrow().len(), 2);
}

#[tokio::test]
async fn validation_failures_block_the_confirm_request() {
    let mock = MockAnnotationUpload::new();
    mock.queue_upload(Ok(UploadOutcome::NeedsConfirmation(
        detection(&[("RefSeq", &[])],
                  vec![("ref_gene_id", variable())]))));

    let mut workflow = UploadWorkflow::new(&mock);
    workflow.submit(&upload_request()).await.unwrap();
    workflow.begin_configuration().unwrap();

    // nothing auto-mapped for transcript_type in this file
    let err = workflow.confirm().await.unwrap_err();
    assert_eq!(err.to_string(), "no nomenclature selected");

    workflow.form_mut().unwrap().select_nomenclature("Ensembl".to_shared_str());
    let err = workflow.confirm().await.unwrap_err();
    assert_eq!(err.to_string(),
               "nomenclature \"Ensembl\" was not detected for this file");

    workflow.form_mut().unwrap().select_nomenclature("RefSeq".to_shared_str());
    let err = workflow.confirm().await.unwrap_err();
    assert_eq!(err.to_string(), "no attribute selected for transcript_type_key");

    // nothing ever reached the server
    assert!(mock.confirm_requests.borrow().is_empty());
    assert_eq!(workflow.state().name(), "configuring");
}

#[tokio::test]
async fn unknown_key_is_rejected_before_the_request() {
    let detection_payload = gencode_like_detection();
    let mut form = ConfirmationForm::new(&detection_payload);
    form.apply_default_mappings(&detection_payload);
    form.select_nomenclature("RefSeq".to_shared_str());
    form.set_key(RequiredKey::GeneName, "not_in_file".to_shared_str());

    match form.validate(&detection_payload) {
        Err(FormError::UnknownKey(RequiredKey::GeneName, name)) => {
            assert_eq!(name.as_str(), "not_in_file");
        },
        other => panic!("expected UnknownKey, got {:?}", other),
    }
}

#[tokio::test]
async fn cancelling_discards_the_detection_payload() {
    let mock = MockAnnotationUpload::new();
    mock.queue_upload(Ok(UploadOutcome::NeedsConfirmation(gencode_like_detection())));

    let mut workflow = UploadWorkflow::new(&mock);
    workflow.submit(&upload_request()).await.unwrap();
    workflow.begin_configuration().unwrap();

    workflow.cancel().unwrap();
    assert_eq!(workflow.state().name(), "idle");
    assert!(workflow.detection().is_none());
    assert!(workflow.form().is_none());
}

#[tokio::test]
async fn cancel_is_rejected_after_commit() {
    let mock = MockAnnotationUpload::new();
    mock.queue_upload(Ok(UploadOutcome::Committed(committed_summary("done"))));

    let mut workflow = UploadWorkflow::new(&mock);
    workflow.submit(&upload_request()).await.unwrap();

    assert!(workflow.cancel().is_err());
    assert_eq!(workflow.state().name(), "committed");
}

#[tokio::test]
async fn resubmission_is_rejected_while_a_detection_is_pending() {
    let mock = MockAnnotationUpload::new();
    mock.queue_upload(Ok(UploadOutcome::NeedsConfirmation(gencode_like_detection())));

    let mut workflow = UploadWorkflow::new(&mock);
    workflow.submit(&upload_request()).await.unwrap();

    let err = workflow.submit(&upload_request()).await.unwrap_err();
    assert_eq!(err.to_string(),
               "cannot submit in the awaiting-confirmation state");
    assert_eq!(*mock.upload_count.borrow(), 1);
}
