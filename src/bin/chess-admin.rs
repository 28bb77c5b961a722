use std::process;

use anyhow::{Context, bail};
use bytes::Bytes;
use getopts::{Matches, Options};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chess::api::admin::{AdminApi, DataTypeUpsert, DatasetUpdate, NewAssembly,
                        NewDataset, NewOrganism, NewSource, NewSourceVersion,
                        OrganismUpdate};
use chess::api::client::{ApiClient, ApiStatus};
use chess::api::public::{GeneSearchQuery, GeneSortField, PublicApi, SortOrder};
use chess::api::upload::{RequiredKey, UploadRequest, UploadState, UploadWorkflow};
use chess::bio::gtf_scan::scan_annotation_file;
use chess::bio::nomenclature_tsv::NomenclatureMapping;
use chess::data_types::AttributeKind;
use chess::utils::{abbreviated_list, join};
use chess::web::config::Config;
use chess::web::forms::{ConfigurationDraft, UploadTargetForm};

const PKG_NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] <action>

Actions:
  global-data            summary of the database snapshot
  list-organisms | add-organism | update-organism | delete-organism
  list-assemblies | add-assembly | update-assembly | delete-assembly
  upload-fasta | upload-nomenclature | delete-nomenclature
  list-sources | add-source | update-source | delete-source
  add-source-version | delete-source-version | delete-sva | reorder-versions
  upload-annotation      two-phase GTF/GFF import
  create-configuration | activate-configuration | delete-configuration
  add-data-type | edit-data-type | delete-data-type
  create-dataset | update-dataset | delete-dataset
  db-config | set-db-config | list-tables | table-data | clear-table
  reset-db | create-backup | restore-backup
  search-genes | gene", program);
    print!("{}", opts.usage(&brief));
}

fn require_str(matches: &Matches, name: &str) -> String {
    match matches.opt_str(name) {
        Some(value) => value,
        None => {
            eprintln!("no --{} option", name);
            process::exit(1);
        }
    }
}

fn require_parse<T: std::str::FromStr>(matches: &Matches, name: &str) -> T {
    let value = require_str(matches, name);
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            eprintln!("invalid value for --{}: {}", name, value);
            process::exit(1);
        }
    }
}

fn opt_parse<T: std::str::FromStr>(matches: &Matches, name: &str) -> Option<T> {
    matches.opt_str(name).map(|value| {
        match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                eprintln!("invalid value for --{}: {}", name, value);
                process::exit(1);
            }
        }
    })
}

fn require_yes(matches: &Matches, action: &str) {
    if !matches.opt_present("yes") {
        eprintln!("{} is destructive; re-run with --yes to proceed", action);
        process::exit(1);
    }
}

fn report_status(status: &ApiStatus) {
    match &status.message {
        Some(message) => println!("{}", message),
        None => println!("OK"),
    }
}

fn read_payload(file_name: &str) -> anyhow::Result<Bytes> {
    let bytes = std::fs::read(file_name)
        .with_context(|| format!("failed to read {}", file_name))?;
    Ok(Bytes::from(bytes))
}

fn comma_list(matches: &Matches, name: &str) -> Vec<String> {
    matches.opt_str(name)
        .map(|value| value.split(',')
             .map(|item| item.trim().to_owned())
             .filter(|item| !item.is_empty())
             .collect())
        .unwrap_or_default()
}

async fn run_upload_annotation(admin: &AdminApi, public: &PublicApi, matches: &Matches)
    -> anyhow::Result<()>
{
    let file_name = require_str(matches, "file");
    let source_id = require_parse(matches, "source-id");
    let sv_id = require_parse(matches, "sv-id");
    let assembly_id = require_parse(matches, "assembly-id");
    let description = matches.opt_str("description").unwrap_or_default();

    let data = public.global_data().await?;

    let mut target = UploadTargetForm::new();
    target.set_file(&file_name)?;

    let taxonomy_id = match opt_parse(matches, "taxonomy-id") {
        Some(taxonomy_id) => taxonomy_id,
        None => {
            data.assemblies.get(&assembly_id)
                .map(|assembly| assembly.taxonomy_id)
                .ok_or_else(|| anyhow::anyhow!("assembly {} does not exist", assembly_id))?
        }
    };
    target.set_organism(taxonomy_id);
    target.set_assembly(assembly_id);
    let assembly_id = target.validate(&data)?;

    // preflight the file locally so an obviously broken upload never
    // leaves this machine
    let scan = scan_annotation_file(std::path::Path::new(&file_name))?;
    let stats = &scan.validation.stats;
    println!("{}: {} feature lines, {} sequences, {} feature types, {} attributes",
             file_name, stats.total_lines, stats.seqids.len(),
             stats.feature_types.len(), scan.survey.attributes.len());

    for warning in &scan.validation.warnings {
        warn!("{}", warning);
    }

    if !scan.validation.success {
        for error in &scan.validation.errors {
            eprintln!("{}", error);
        }
        if matches.opt_present("force") {
            warn!("{} invalid lines; continuing because of --force",
                  stats.invalid_lines);
        } else {
            bail!("{} failed validation ({} invalid lines); use --force to upload anyway",
                  file_name, stats.invalid_lines);
        }
    }

    let request = UploadRequest {
        source_id,
        source_version_id: sv_id,
        assembly_id,
        file_name: file_name.as_str().into(),
        payload: read_payload(&file_name)?,
        description: description.as_str().into(),
    };

    let mut workflow = UploadWorkflow::new(admin.clone());
    info!("upload {} starting", workflow.id());
    workflow.submit(&request).await?;

    if let UploadState::Committed { summary } = workflow.state() {
        match &summary.message {
            Some(message) => println!("{}", message),
            None => println!("import committed"),
        }
        return Ok(());
    }

    workflow.begin_configuration()?;

    // show what the server detected before touching the form
    {
        let detection = workflow.detection()
            .ok_or_else(|| anyhow::anyhow!("no detection payload"))?;

        println!("detected nomenclatures:");
        for (name, missing) in &detection.detected_nomenclatures {
            if missing.is_empty() {
                println!("  {} (all sequences matched)", name);
            } else {
                println!("  {} ({} missing sequences: {})", name, missing.len(),
                         abbreviated_list(missing, 5));
            }
        }

        println!("attributes:");
        for (name, attribute) in &detection.attributes {
            match attribute.value_count.as_count() {
                Some(count) =>
                    println!("  {} (categorical, {} values)", name, count),
                None =>
                    println!("  {} (variable)", name),
            }
        }
    }

    let single_nomenclature =
        workflow.detection()
            .filter(|detection| detection.detected_nomenclatures.len() == 1)
            .map(|detection| detection.detected_nomenclatures[0].0.clone());

    let excluded = comma_list(matches, "exclude");
    let set_variable = comma_list(matches, "set-variable");
    let set_categorical = comma_list(matches, "set-categorical");
    let known: Vec<String> = workflow.detection()
        .map(|detection| detection.attribute_names().iter()
             .map(|name| name.to_string()).collect())
        .unwrap_or_default();

    let form = workflow.form_mut()
        .ok_or_else(|| anyhow::anyhow!("no confirmation form"))?;

    if let Some(nomenclature) = matches.opt_str("nomenclature") {
        form.select_nomenclature(nomenclature.as_str().into());
    } else if let Some(nomenclature) = single_nomenclature {
        info!("selecting the only detected nomenclature: {}", nomenclature);
        form.select_nomenclature(nomenclature);
    }

    if let Some(key) = matches.opt_str("transcript-type-key") {
        form.set_key(RequiredKey::TranscriptType, key.as_str().into());
    }
    if let Some(key) = matches.opt_str("gene-type-key") {
        form.set_key(RequiredKey::GeneType, key.as_str().into());
    }
    if let Some(key) = matches.opt_str("gene-name-key") {
        form.set_key(RequiredKey::GeneName, key.as_str().into());
    }

    for name in &excluded {
        if known.iter().any(|known_name| known_name == name) {
            form.exclude(name.as_str().into());
        } else {
            warn!("--exclude: unknown attribute {}", name);
        }
    }
    for name in &set_variable {
        if !form.set_attribute_kind(name, AttributeKind::Variable) {
            warn!("--set-variable: unknown attribute {}", name);
        }
    }
    for name in &set_categorical {
        if !form.set_attribute_kind(name, AttributeKind::Categorical) {
            warn!("--set-categorical: unknown attribute {}", name);
        }
    }

    println!("selected nomenclature: {}",
             if form.selected_nomenclature().is_empty() { "(none)" }
             else { form.selected_nomenclature().as_str() });
    for key in [RequiredKey::TranscriptType, RequiredKey::GeneType,
                RequiredKey::GeneName] {
        let value = form.key(key);
        println!("{}: {}", key,
                 if value.is_empty() { "(none)" } else { value.as_str() });
    }

    if let (Some(detection), Some(form)) = (workflow.detection(), workflow.form()) {
        if !form.selected_nomenclature().is_empty() {
            if let Some(missing) = detection.missing_sequences(form.selected_nomenclature()) {
                if missing.is_empty() {
                    println!("all {} file sequences matched",
                             detection.file_sequences.len());
                } else {
                    warn!("{} sequences are not in the database for {}: {}",
                          missing.len(), form.selected_nomenclature(),
                          abbreviated_list(missing, 10));
                }
            }
        }
    }

    if !matches.opt_present("confirm") {
        println!("detection complete; nothing committed (re-run with --confirm \
                  and the mapping options to finish the import)");
        workflow.cancel()?;
        return Ok(());
    }

    if !workflow.form().map(|form| form.can_confirm()).unwrap_or(false) {
        workflow.cancel()?;
        bail!("cannot confirm: nomenclature and the three key mappings must all be set");
    }

    workflow.confirm().await?;

    if let UploadState::Committed { summary } = workflow.state() {
        match &summary.message {
            Some(message) => println!("{}", message),
            None => println!("import committed"),
        }
    }

    Ok(())
}

async fn run_action(action: &str, matches: &Matches, config: &Config)
    -> anyhow::Result<()>
{
    let client = ApiClient::new(config);
    let admin = AdminApi::new(client.clone());
    let public = PublicApi::new(client);

    match action {
        "global-data" => {
            let data = public.global_data().await?;
            if matches.opt_present("json") {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} organisms, {} assemblies, {} sources, \
                          {} configurations, {} datasets",
                         data.organisms.len(), data.assemblies.len(),
                         data.sources.len(), data.configurations.len(),
                         data.datasets.datasets.len());
            }
        },

        "list-organisms" => {
            let data = public.global_data().await?;
            for organism in data.organisms_by_name() {
                println!("{}\t{} ({})", organism.taxonomy_id,
                         organism.scientific_name, organism.common_name);
            }
        },
        "add-organism" => {
            let status = admin.add_organism(&NewOrganism {
                taxonomy_id: require_parse(matches, "taxonomy-id"),
                scientific_name: require_str(matches, "scientific-name").into(),
                common_name: require_str(matches, "common-name").into(),
                information: matches.opt_str("information").unwrap_or_default().into(),
            }).await?;
            report_status(&status);
        },
        "update-organism" => {
            let status = admin.update_organism(
                require_parse(matches, "taxonomy-id"),
                &OrganismUpdate {
                    scientific_name: require_str(matches, "scientific-name").into(),
                    common_name: require_str(matches, "common-name").into(),
                    information: matches.opt_str("information").unwrap_or_default().into(),
                }).await?;
            report_status(&status);
        },
        "delete-organism" => {
            require_yes(matches, "delete-organism");
            let status =
                admin.delete_organism(require_parse(matches, "taxonomy-id")).await?;
            report_status(&status);
        },

        "list-assemblies" => {
            let data = public.global_data().await?;
            for organism in data.organisms_by_name() {
                for assembly in data.assemblies_of_organism(organism.taxonomy_id) {
                    println!("{}\t{}\t{}\t[{}]", assembly.assembly_id,
                             assembly.assembly_name, organism.scientific_name,
                             join(&assembly.nomenclatures, ", "));
                }
            }
        },
        "add-assembly" => {
            let status = admin.add_assembly(&NewAssembly {
                assembly_name: require_str(matches, "assembly-name").into(),
                taxonomy_id: require_parse(matches, "taxonomy-id"),
                information: matches.opt_str("information").unwrap_or_default().into(),
            }).await?;
            report_status(&status);
        },
        "update-assembly" => {
            let status = admin.update_assembly(
                require_parse(matches, "assembly-id"),
                &NewAssembly {
                    assembly_name: require_str(matches, "assembly-name").into(),
                    taxonomy_id: require_parse(matches, "taxonomy-id"),
                    information: matches.opt_str("information").unwrap_or_default().into(),
                }).await?;
            report_status(&status);
        },
        "delete-assembly" => {
            require_yes(matches, "delete-assembly");
            let status =
                admin.delete_assembly(require_parse(matches, "assembly-id")).await?;
            report_status(&status);
        },

        "upload-fasta" => {
            let file_name = require_str(matches, "file");
            let status = admin.upload_fasta(
                require_parse(matches, "assembly-id"),
                &require_str(matches, "nomenclature"),
                &file_name,
                read_payload(&file_name)?).await?;
            report_status(&status);
        },
        "upload-nomenclature" => {
            let file_name = require_str(matches, "file");
            let assembly_id = require_parse(matches, "assembly-id");
            let source_nomenclature = require_str(matches, "source-nomenclature");

            let mapping = NomenclatureMapping::read_from_path(
                std::path::Path::new(&file_name))?;
            println!("{}: {} mappings", file_name, mapping.len());

            let data = public.global_data().await?;
            if let Some(assembly) = data.assemblies.get(&assembly_id) {
                let missing = mapping.missing_from_assembly(assembly, &source_nomenclature);
                if !missing.is_empty() {
                    bail!("{} source names are not in \"{}\" on assembly {}: {}",
                          missing.len(), source_nomenclature, assembly_id,
                          abbreviated_list(&missing, 10));
                }
            }

            let status = admin.upload_nomenclature_tsv(
                assembly_id,
                &source_nomenclature,
                &require_str(matches, "new-nomenclature"),
                &file_name,
                read_payload(&file_name)?).await?;
            report_status(&status);
        },
        "delete-nomenclature" => {
            require_yes(matches, "delete-nomenclature");
            let status = admin.delete_nomenclature(
                require_parse(matches, "assembly-id"),
                &require_str(matches, "nomenclature")).await?;
            report_status(&status);
        },

        "list-sources" => {
            let data = public.global_data().await?;
            let mut sources: Vec<_> = data.sources.values().collect();
            sources.sort_by(|a, b| a.name.cmp(&b.name));
            for source in sources {
                println!("{}\t{}", source.source_id, source.name);
                for version in source.versions_by_rank() {
                    println!("  {}\t{} (rank {}, {} assemblies)",
                             version.sv_id, version.version_name,
                             version.version_rank, version.assemblies.len());
                }
            }
        },
        "add-source" => {
            let response = admin.add_source(&NewSource {
                name: require_str(matches, "source-name").into(),
                information: matches.opt_str("information").unwrap_or_default().into(),
                link: matches.opt_str("link").unwrap_or_default().into(),
                citation: matches.opt_str("citation").unwrap_or_default().into(),
            }).await?;
            println!("created source {}", response.source_id);
        },
        "update-source" => {
            let status = admin.update_source(
                require_parse(matches, "source-id"),
                &NewSource {
                    name: require_str(matches, "source-name").into(),
                    information: matches.opt_str("information").unwrap_or_default().into(),
                    link: matches.opt_str("link").unwrap_or_default().into(),
                    citation: matches.opt_str("citation").unwrap_or_default().into(),
                }).await?;
            report_status(&status);
        },
        "delete-source" => {
            require_yes(matches, "delete-source");
            let status = admin.delete_source(require_parse(matches, "source-id")).await?;
            report_status(&status);
        },

        "add-source-version" => {
            let status = admin.add_source_version(
                require_parse(matches, "source-id"),
                &NewSourceVersion {
                    version_name: require_str(matches, "version-name").into(),
                    information: matches.opt_str("information").unwrap_or_default().into(),
                }).await?;
            report_status(&status);
        },
        "delete-source-version" => {
            require_yes(matches, "delete-source-version");
            let status = admin.delete_source_version(
                require_parse(matches, "source-id"),
                require_parse(matches, "sv-id")).await?;
            report_status(&status);
        },
        "delete-sva" => {
            require_yes(matches, "delete-sva");
            let status = admin.delete_source_version_assembly(
                require_parse(matches, "source-id"),
                require_parse(matches, "sv-id"),
                require_parse(matches, "sva-id")).await?;
            report_status(&status);
        },
        "reorder-versions" => {
            let order_value = require_str(matches, "new-order");
            let mut new_order = vec![];
            for item in order_value.split(',') {
                let sv_id = item.trim().parse()
                    .map_err(|_| anyhow::anyhow!("invalid --new-order entry: {}", item))?;
                new_order.push(sv_id);
            }
            let status = admin.reorder_source_versions(
                require_parse(matches, "source-id"), &new_order).await?;
            report_status(&status);
        },

        "upload-annotation" => {
            run_upload_annotation(&admin, &public, matches).await?;
        },

        "create-configuration" => {
            let data = public.global_data().await?;

            let mut draft = ConfigurationDraft::new();
            draft.description = matches.opt_str("description").unwrap_or_default().into();
            draft.set_organism(require_parse(matches, "taxonomy-id"));
            draft.set_assembly(require_parse(matches, "assembly-id"));
            draft.set_nomenclature(&require_str(matches, "nomenclature"));
            draft.set_source(require_parse(matches, "source-id"));
            draft.set_version(require_parse(matches, "sv-id"));
            draft.set_sequence(&require_str(matches, "sequence-id"));
            draft.set_range(require_parse(matches, "start"),
                            require_parse(matches, "end"));

            let configuration = draft.validate(&data)?;
            let status = admin.create_configuration(&configuration).await?;
            report_status(&status);
        },
        "activate-configuration" => {
            let status = admin.activate_configuration(
                require_parse(matches, "configuration-id")).await?;
            report_status(&status);
        },
        "delete-configuration" => {
            require_yes(matches, "delete-configuration");
            let status = admin.delete_configuration(
                require_parse(matches, "configuration-id")).await?;
            report_status(&status);
        },

        "add-data-type" => {
            let status = admin.add_data_type(&DataTypeUpsert {
                data_type: require_str(matches, "data-type").into(),
                description: matches.opt_str("description").unwrap_or_default().into(),
            }).await?;
            report_status(&status);
        },
        "edit-data-type" => {
            let status = admin.edit_data_type(&DataTypeUpsert {
                data_type: require_str(matches, "data-type").into(),
                description: matches.opt_str("description").unwrap_or_default().into(),
            }).await?;
            report_status(&status);
        },
        "delete-data-type" => {
            require_yes(matches, "delete-data-type");
            let status =
                admin.delete_data_type(&require_str(matches, "data-type")).await?;
            report_status(&status);
        },

        "create-dataset" => {
            let file_name = require_str(matches, "file");
            let status = admin.create_dataset(
                &NewDataset {
                    name: require_str(matches, "dataset-name").into(),
                    description: matches.opt_str("description").unwrap_or_default().into(),
                    data_type: require_str(matches, "data-type").into(),
                    sva_id: require_parse(matches, "sva-id"),
                },
                &file_name,
                read_payload(&file_name)?).await?;
            report_status(&status);
        },
        "update-dataset" => {
            let status = admin.update_dataset(
                require_parse(matches, "dataset-id"),
                &DatasetUpdate {
                    name: require_str(matches, "dataset-name").into(),
                    description: matches.opt_str("description").unwrap_or_default().into(),
                    data_type: matches.opt_str("data-type").unwrap_or_default().into(),
                }).await?;
            report_status(&status);
        },
        "delete-dataset" => {
            require_yes(matches, "delete-dataset");
            let status =
                admin.delete_dataset(require_parse(matches, "dataset-id")).await?;
            report_status(&status);
        },

        "db-config" => {
            match admin.db_config().await? {
                Some(data_dir) => println!("{}", data_dir),
                None => println!("(not configured)"),
            }
        },
        "set-db-config" => {
            admin.set_db_config(&require_str(matches, "data-dir")).await?;
            println!("OK");
        },
        "list-tables" => {
            let list = admin.db_list().await?;
            println!("{} tables, {} views", list.total_tables, list.total_views);
            for table in list.tables.iter().chain(list.views.iter()) {
                println!("{:?}\t{}\t{}", table.kind, table.name, table.description);
            }
        },
        "table-data" => {
            let preview = admin.table_data(
                &require_str(matches, "table"),
                matches.opt_str("search").as_deref(),
                opt_parse(matches, "limit")).await?;
            println!("{}", join(&preview.data.columns, "\t"));
            for row in &preview.data.rows {
                let cells: Vec<String> = row.iter()
                    .map(|value| value.to_string())
                    .collect();
                println!("{}", cells.join("\t"));
            }
        },
        "clear-table" => {
            require_yes(matches, "clear-table");
            let status = admin.clear_table(&require_str(matches, "table")).await?;
            report_status(&status);
        },
        "reset-db" => {
            require_yes(matches, "reset-db");
            let status = admin.reset_db().await?;
            report_status(&status);
        },
        "create-backup" => {
            let backup_path = matches.opt_str("backup-path")
                .unwrap_or_else(|| format!("chess-backup-{}.sql",
                                           chrono::Local::now().format("%Y%m%d-%H%M%S")));
            let status = admin.create_backup(&backup_path).await?;
            println!("backup: {}", backup_path);
            report_status(&status);
        },
        "restore-backup" => {
            require_yes(matches, "restore-backup");
            let status = admin.restore_backup(
                &require_str(matches, "backup-path"),
                &require_str(matches, "storage-dir")).await?;
            report_status(&status);
        },

        "search-genes" => {
            let mut query = GeneSearchQuery::new(require_parse(matches, "sva-id"));
            query.search_term = matches.opt_str("query").map(|q| q.as_str().into());
            query.gene_type = matches.opt_str("gene-type").map(|t| t.as_str().into());
            if let Some(page) = opt_parse(matches, "page") {
                query.page = page;
            }
            if let Some(per_page) = opt_parse(matches, "per-page") {
                query.per_page = per_page;
            }
            if let Some(sort) = matches.opt_str("sort") {
                query.sort_by = match sort.as_str() {
                    "name" => GeneSortField::Name,
                    "gene_id" => GeneSortField::GeneId,
                    "transcript_count" => GeneSortField::TranscriptCount,
                    "type" => GeneSortField::Type,
                    "start" => GeneSortField::Start,
                    "end" => GeneSortField::End,
                    "sequence_id" => GeneSortField::SequenceId,
                    other => bail!("unknown sort field: {}", other),
                };
            }
            if matches.opt_present("descending") {
                query.order = SortOrder::Desc;
            }

            let results = public.search_genes(&query).await?;
            for gene in &results.genes {
                println!("{}\t{}\t{}\t{} transcripts", gene.gid, gene.gene_id,
                         gene.name.as_ref().map(|n| n.as_str()).unwrap_or("-"),
                         gene.transcript_count);
            }
            println!("page {}/{} ({} genes)", results.pagination.current_page,
                     results.pagination.total_pages, results.pagination.total_count);
        },
        "gene" => {
            let gene = public.gene(require_parse(matches, "gid")).await?;
            if matches.opt_present("json") {
                println!("{}", serde_json::to_string_pretty(&gene)?);
            } else {
                println!("{}\t{}\t{} transcripts", gene.gene_id,
                         gene.name.as_ref().map(|n| n.as_str()).unwrap_or("-"),
                         gene.transcripts.len());
                for transcript in &gene.transcripts {
                    println!("  {}\t{}..{}\t{} exons", transcript.transcript_id,
                             transcript.coordinates.start, transcript.coordinates.end,
                             transcript.exons.len());
                }
            }
        },

        _ => {
            bail!("unknown action: {}", action);
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    println!("{} v{}", PKG_NAME, VERSION);

    let args: Vec<String> = std::env::args().collect();
    let mut opts = Options::new();

    opts.optflag("h", "help", "print this help message");
    opts.optopt("c", "config-file", "Configuration file name", "CONFIG");
    opts.optflag("", "json", "print raw JSON instead of a summary");
    opts.optflag("", "yes", "confirm a destructive action");
    opts.optflag("", "force", "upload even if local validation failed");
    opts.optflag("", "confirm", "commit the annotation import after detection");
    opts.optflag("", "descending", "sort gene search results in descending order");

    opts.optopt("", "taxonomy-id", "Organism taxonomy id", "TAXONOMY_ID");
    opts.optopt("", "scientific-name", "Organism scientific name", "NAME");
    opts.optopt("", "common-name", "Organism common name", "NAME");
    opts.optopt("", "information", "Free-text description", "TEXT");
    opts.optopt("", "assembly-id", "Assembly id", "ASSEMBLY_ID");
    opts.optopt("", "assembly-name", "Assembly name", "NAME");
    opts.optopt("", "nomenclature", "Nomenclature name", "NOMENCLATURE");
    opts.optopt("", "source-nomenclature", "Existing nomenclature the TSV maps from",
                "NOMENCLATURE");
    opts.optopt("", "new-nomenclature", "Nomenclature the TSV maps to", "NOMENCLATURE");
    opts.optopt("", "source-id", "Source id", "SOURCE_ID");
    opts.optopt("", "source-name", "Source name", "NAME");
    opts.optopt("", "link", "Source link", "URL");
    opts.optopt("", "citation", "Source citation", "TEXT");
    opts.optopt("", "sv-id", "Source version id", "SV_ID");
    opts.optopt("", "sva-id", "Source version assembly id", "SVA_ID");
    opts.optopt("", "version-name", "Source version name", "NAME");
    opts.optopt("", "new-order", "Comma-separated source version ids", "IDS");
    opts.optopt("", "description", "Description", "TEXT");
    opts.optopt("f", "file", "File to upload", "FILE");
    opts.optopt("", "transcript-type-key", "Attribute mapped to transcript_type", "ATTR");
    opts.optopt("", "gene-type-key", "Attribute mapped to gene_type", "ATTR");
    opts.optopt("", "gene-name-key", "Attribute mapped to gene_name", "ATTR");
    opts.optopt("", "exclude", "Comma-separated attributes to exclude", "ATTRS");
    opts.optopt("", "set-variable", "Comma-separated attributes to store as variable",
                "ATTRS");
    opts.optopt("", "set-categorical",
                "Comma-separated attributes to store as categorical", "ATTRS");
    opts.optopt("", "configuration-id", "Configuration id", "CONFIGURATION_ID");
    opts.optopt("", "sequence-id", "Internal sequence id", "SEQUENCE_ID");
    opts.optopt("", "start", "Window start", "START");
    opts.optopt("", "end", "Window end", "END");
    opts.optopt("", "dataset-id", "Dataset id", "DATASET_ID");
    opts.optopt("", "dataset-name", "Dataset name", "NAME");
    opts.optopt("", "data-type", "Data type name", "DATA_TYPE");
    opts.optopt("", "data-dir", "Server data directory", "DIR");
    opts.optopt("", "table", "Table or view name", "TABLE");
    opts.optopt("", "search", "Table preview search term", "TERM");
    opts.optopt("", "limit", "Table preview row limit", "LIMIT");
    opts.optopt("", "backup-path", "Backup file path on the server", "PATH");
    opts.optopt("", "storage-dir", "Storage directory used when restoring", "DIR");
    opts.optopt("q", "query", "Gene search term", "TERM");
    opts.optopt("", "gene-type", "Gene type filter", "TYPE");
    opts.optopt("", "page", "Result page", "PAGE");
    opts.optopt("", "per-page", "Results per page", "PER_PAGE");
    opts.optopt("", "sort", "Gene search sort field", "FIELD");
    opts.optopt("", "gid", "Gene database id", "GID");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(err) => panic!("Invalid options\n{}", err),
    };

    let program = args[0].clone();

    if matches.opt_present("help") {
        print_usage(&program, &opts);
        process::exit(0);
    }
    if !matches.opt_present("config-file") {
        println!("no -c|--config-file option");
        print_usage(&program, &opts);
        process::exit(1);
    }
    if matches.free.is_empty() {
        println!("no action given");
        print_usage(&program, &opts);
        process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("chess=info,chess_admin=info"))
                .unwrap(),
        )
        .init();

    let config_file_name = require_str(&matches, "config-file");
    let config = Config::read(&config_file_name);

    let action = matches.free[0].clone();

    if let Err(err) = run_action(&action, &matches, &config).await {
        eprintln!("{}: {}", action, err);
        process::exit(1);
    }
}
