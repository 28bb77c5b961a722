mod util;

use chess::web::forms::{ASSEMBLY_FIELD, ConfigurationDraft, DraftError, END_FIELD,
                        NOMENCLATURE_FIELD, ORGANISM_FIELD, SEQUENCE_FIELD,
                        SOURCE_FIELD, START_FIELD, UploadFormError, UploadTargetForm,
                        VERSION_FIELD, CascadingForm, configuration_graph};

use util::sample_global_data;

fn filled_draft() -> ConfigurationDraft {
    let mut draft = ConfigurationDraft::new();
    draft.description = "BRCA1 default view".into();
    draft.set_organism(9606);
    draft.set_assembly(1);
    draft.set_nomenclature("UCSC");
    draft.set_source(7);
    draft.set_version(2);
    draft.set_sequence("17");
    draft.set_range(43_044_295, 43_170_245);
    draft
}

#[test]
fn descendants_are_cleared_transitively() {
    let mut form = CascadingForm::new(configuration_graph());

    form.set(ORGANISM_FIELD, "9606".into());
    form.set(ASSEMBLY_FIELD, "1".into());
    form.set(NOMENCLATURE_FIELD, "UCSC".into());
    form.set(SEQUENCE_FIELD, "17".into());
    form.set(START_FIELD, "100".into());
    form.set(END_FIELD, "200".into());
    form.set(SOURCE_FIELD, "7".into());
    form.set(VERSION_FIELD, "2".into());

    // changing the nomenclature only resets the sequence chain
    let cleared = form.set(NOMENCLATURE_FIELD, "RefSeq".into());
    assert_eq!(cleared, vec![SEQUENCE_FIELD, START_FIELD, END_FIELD]);
    assert!(form.is_set(SOURCE_FIELD));
    assert!(form.is_set(VERSION_FIELD));

    // changing the organism resets everything below it
    form.set(SEQUENCE_FIELD, "17".into());
    let mut cleared = form.set(ORGANISM_FIELD, "10090".into());
    cleared.sort();
    let mut expected = vec![ASSEMBLY_FIELD, NOMENCLATURE_FIELD, SEQUENCE_FIELD,
                            SOURCE_FIELD, VERSION_FIELD];
    expected.sort();
    assert_eq!(cleared, expected);
    assert_eq!(form.get(ASSEMBLY_FIELD), "");
}

#[test]
fn cleared_list_only_reports_fields_that_had_values() {
    let mut form = CascadingForm::new(configuration_graph());

    form.set(ORGANISM_FIELD, "9606".into());
    form.set(ASSEMBLY_FIELD, "1".into());

    // only the assembly was set, so only the assembly is reported
    let cleared = form.set(ORGANISM_FIELD, "10090".into());
    assert_eq!(cleared, vec![ASSEMBLY_FIELD]);

    let cleared = form.set(ORGANISM_FIELD, "9606".into());
    assert!(cleared.is_empty());
}

#[test]
fn configuration_draft_round_trips_to_a_request() {
    let data = sample_global_data();
    let configuration = filled_draft().validate(&data).unwrap();

    assert_eq!(configuration.organism_id, 9606);
    assert_eq!(configuration.assembly_id, 1);
    assert_eq!(configuration.nomenclature.as_str(), "UCSC");
    assert_eq!(configuration.source_id, 7);
    assert_eq!(configuration.sv_id, 2);
    assert_eq!(configuration.sequence_id.as_str(), "17");
    assert_eq!(configuration.start, 43_044_295);
    assert_eq!(configuration.end, 43_170_245);
}

#[test]
fn configuration_draft_rejects_incoherent_selections() {
    let data = sample_global_data();

    let mut draft = filled_draft();
    draft.set_organism(10090);
    draft.set_assembly(1);
    // the cascade cleared nomenclature and below
    assert_eq!(draft.validate(&data).unwrap_err(),
               DraftError::UnknownOrganism(10090));

    let mut draft = filled_draft();
    draft.set_nomenclature("Ensembl");
    draft.set_sequence("17");
    draft.set_range(1, 2);
    assert_eq!(draft.validate(&data).unwrap_err(),
               DraftError::UnknownNomenclature("Ensembl".into(), 1));

    let mut draft = filled_draft();
    draft.set_source(99);
    draft.set_version(2);
    draft.set_sequence("17");
    draft.set_range(1, 2);
    assert_eq!(draft.validate(&data).unwrap_err(), DraftError::UnknownSource(99));

    let mut draft = filled_draft();
    draft.set_sequence("99");
    draft.set_range(1, 2);
    assert_eq!(draft.validate(&data).unwrap_err(),
               DraftError::UnknownSequence("99".into(), "UCSC".into()));

    let mut draft = filled_draft();
    draft.set_range(200, 100);
    assert_eq!(draft.validate(&data).unwrap_err(), DraftError::InvalidRange(200, 100));
}

#[test]
fn configuration_draft_requires_the_full_chain() {
    let data = sample_global_data();

    let mut draft = ConfigurationDraft::new();
    draft.set_organism(9606);
    assert_eq!(draft.validate(&data).unwrap_err(),
               DraftError::MissingField(ASSEMBLY_FIELD));
}

#[test]
fn upload_form_checks_the_file_extension() {
    let mut form = UploadTargetForm::new();

    assert_eq!(form.set_file("annotation.txt").unwrap_err(),
               UploadFormError::UnsupportedFileType);
    assert!(form.set_file("annotation.gtf").is_ok());
    assert!(form.set_file("annotation.gff3.gz").is_ok());
}

#[test]
fn upload_form_gates_submission_on_the_cascade() {
    let data = sample_global_data();
    let mut form = UploadTargetForm::new();

    assert!(!form.can_submit());

    form.set_file("chess.gtf").unwrap();
    form.set_organism(9606);
    form.set_assembly(1);
    assert!(form.can_submit());
    assert_eq!(form.validate(&data).unwrap(), 1);

    // switching the organism resets the assembly choice
    form.set_organism(10090);
    assert!(!form.can_submit());
    assert_eq!(form.validate(&data).unwrap_err(),
               UploadFormError::MissingField(ASSEMBLY_FIELD));

    // an assembly belonging to another organism is rejected
    form.set_assembly(1);
    assert_eq!(form.validate(&data).unwrap_err(),
               UploadFormError::AssemblyOrganismMismatch(1, 10090));
}
