use std::process;

use getopts::Options;
use tracing_subscriber::EnvFilter;

use chess::api::client::ApiClient;
use chess::api::public::PublicApi;
use chess::web::browser::{BrowserTrack, FocusWindow, browser_session,
                          focus_for_configuration};
use chess::web::config::Config;

const PKG_NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options]

Emits a JBrowse 2 session configuration for an assembly and one or more
annotation tracks.  With --from-configuration the active configuration in
the database picks the assembly, nomenclature, track and location window.",
                        program);
    print!("{}", opts.usage(&brief));
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = Options::new();

    opts.optflag("h", "help", "print this help message");
    opts.optopt("c", "config-file", "Configuration file name", "CONFIG");
    opts.optflag("", "from-configuration",
                 "derive everything from the active database configuration");
    opts.optopt("", "assembly-id", "Assembly id", "ASSEMBLY_ID");
    opts.optopt("", "nomenclature", "Nomenclature for sequence names", "NOMENCLATURE");
    opts.optopt("", "sva-id", "Source version assembly to show as a track", "SVA_ID");
    opts.optopt("", "track-name", "Display name of the track", "NAME");
    opts.optopt("", "color-scheme", "Track color scheme name", "SCHEME");
    opts.optopt("", "name", "Display name of the browser view", "NAME");
    opts.optopt("", "sequence-name", "Sequence to open the view on", "SEQ");
    opts.optopt("", "start", "Window start", "START");
    opts.optopt("", "end", "Window end", "END");

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

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("chess=warn"))
                .unwrap(),
        )
        .init();

    let config_file_name = matches.opt_str("config-file").unwrap();
    let config = Config::read(&config_file_name);
    let client = ApiClient::new(&config);
    let public = PublicApi::new(client);

    let data = match public.global_data().await {
        Ok(data) => data,
        Err(err) => {
            eprintln!("failed to fetch global data: {}", err);
            process::exit(1);
        }
    };

    let from_configuration = matches.opt_present("from-configuration");

    let (assembly_id, nomenclature, sva_id, focus) =
        if from_configuration {
            let configuration = match data.active_configuration() {
                Some(configuration) => configuration,
                None => {
                    eprintln!("no active configuration in the database");
                    process::exit(1);
                }
            };

            let assembly = match data.assemblies.get(&configuration.assembly_id) {
                Some(assembly) => assembly,
                None => {
                    eprintln!("configuration references unknown assembly {}",
                              configuration.assembly_id);
                    process::exit(1);
                }
            };

            let sva_id = data.source_version(configuration.source_id, configuration.sv_id)
                .and_then(|version| version.sva_for_assembly(configuration.assembly_id))
                .map(|sva| sva.sva_id);
            let sva_id = match sva_id {
                Some(sva_id) => sva_id,
                None => {
                    eprintln!("configuration references a source version with no \
                               assembly {} attachment", configuration.assembly_id);
                    process::exit(1);
                }
            };

            (configuration.assembly_id,
             configuration.nomenclature.to_string(),
             sva_id,
             focus_for_configuration(assembly, configuration))
        } else {
            let assembly_id = match matches.opt_str("assembly-id")
                .and_then(|value| value.parse().ok()) {
                Some(assembly_id) => assembly_id,
                None => {
                    eprintln!("no valid --assembly-id option");
                    process::exit(1);
                }
            };
            let nomenclature = match matches.opt_str("nomenclature") {
                Some(nomenclature) => nomenclature,
                None => {
                    eprintln!("no --nomenclature option");
                    process::exit(1);
                }
            };
            let sva_id = match matches.opt_str("sva-id")
                .and_then(|value| value.parse().ok()) {
                Some(sva_id) => sva_id,
                None => {
                    eprintln!("no valid --sva-id option");
                    process::exit(1);
                }
            };

            let focus = match (matches.opt_str("sequence-name"),
                               matches.opt_str("start").and_then(|v| v.parse().ok()),
                               matches.opt_str("end").and_then(|v| v.parse().ok())) {
                (Some(sequence_name), Some(start), Some(end)) => {
                    Some(FocusWindow {
                        sequence_name: sequence_name.as_str().into(),
                        start,
                        end,
                    })
                },
                _ => None,
            };

            (assembly_id, nomenclature, sva_id, focus)
        };

    let assembly = match data.assemblies.get(&assembly_id) {
        Some(assembly) => assembly,
        None => {
            eprintln!("assembly {} does not exist", assembly_id);
            process::exit(1);
        }
    };

    if !assembly.has_nomenclature(&nomenclature) {
        eprintln!("assembly {} has no nomenclature \"{}\"", assembly_id, nomenclature);
        process::exit(1);
    }

    let display_name = matches.opt_str("name")
        .unwrap_or_else(|| format!("{} v{}", PKG_NAME, VERSION));
    let track_name = matches.opt_str("track-name")
        .unwrap_or_else(|| format!("{} annotation", assembly.assembly_name));
    let color_scheme = matches.opt_str("color-scheme")
        .map(|scheme| scheme.as_str().into())
        .unwrap_or_else(|| config.browser.default_color_scheme.clone());

    let tracks = [
        BrowserTrack {
            track_id: "genes".into(),
            name: track_name.as_str().into(),
            sva_id,
            nomenclature: nomenclature.as_str().into(),
            color_scheme,
        },
    ];

    let session = browser_session(&public, &display_name, assembly, &nomenclature,
                                  &tracks, focus.as_ref());

    match serde_json::to_string_pretty(&session) {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("failed to serialize session: {}", err);
            process::exit(1);
        }
    }
}
