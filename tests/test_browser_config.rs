mod util;

use chess::api::client::ApiClient;
use chess::api::public::PublicApi;
use chess::web::browser::{BrowserTrack, browser_session, color_scheme,
                          feature_track, focus_for_configuration};
use chess::web::config::{ApiConfig, BrowserConfig, Config};

use util::sample_global_data;

fn test_config() -> Config {
    Config {
        api: ApiConfig {
            admin_base_url: "http://127.0.0.1:5001/api/admin".to_owned(),
            public_base_url: "http://127.0.0.1:5001/api/public".to_owned(),
            request_timeout_seconds: 5,
            upload_timeout_seconds: 10,
        },
        browser: BrowserConfig::default(),
    }
}

fn test_public_api() -> PublicApi {
    PublicApi::new(ApiClient::new(&test_config()))
}

fn test_track() -> BrowserTrack {
    BrowserTrack {
        track_id: "genes".into(),
        name: "CHESS 3.1.3".into(),
        sva_id: 5,
        nomenclature: "UCSC".into(),
        color_scheme: "Blue/Light Red/Light Green".into(),
    }
}

#[test]
fn unknown_color_schemes_fall_back_to_the_first() {
    assert_eq!(color_scheme("Purple/Orange/Teal").color1, "#9467bd");

    let fallback = color_scheme("Hot Pink Everywhere");
    assert_eq!(fallback.color1, "#ff7f0e");
    assert_eq!(fallback.color2, "#2ca02c");
    assert_eq!(fallback.color3, "#d62728");
}

#[test]
fn feature_tracks_point_at_the_tabixed_gff_endpoints() {
    let api = test_public_api();
    let track = feature_track(&api, &test_track(), "GRCh38");

    assert_eq!(track["trackId"], "genes");
    assert_eq!(track["assemblyNames"][0], "GRCh38");
    assert_eq!(track["adapter"]["type"], "Gff3TabixAdapter");
    assert_eq!(track["adapter"]["gffGzLocation"]["uri"],
               "http://127.0.0.1:5001/api/public/gff3bgz_jbrowse2/5/UCSC");
    assert_eq!(track["adapter"]["index"]["location"]["uri"],
               "http://127.0.0.1:5001/api/public/gff3bgztbi/5/UCSC");

    let renderer = &track["displays"][0]["renderer"];
    assert_eq!(renderer["color1"], "#1f77b4");
    assert_eq!(renderer["color2"], "#ff9896");
    assert_eq!(renderer["color3"], "#98df8a");
}

#[test]
fn nomenclature_names_are_percent_encoded_in_urls() {
    let api = test_public_api();
    assert_eq!(api.fasta_url(1, "UCSC 2022"),
               "http://127.0.0.1:5001/api/public/fasta/1/UCSC%202022");
}

#[test]
fn sessions_open_on_the_configured_window() {
    let data = sample_global_data();
    let assembly = &data.assemblies[&1];
    let configuration = data.active_configuration().unwrap();

    let focus = focus_for_configuration(assembly, configuration).unwrap();
    assert_eq!(focus.sequence_name.as_str(), "chr17");
    assert_eq!(focus.start, 43_044_295);
    assert_eq!(focus.end, 43_170_245);

    let api = test_public_api();
    let session = browser_session(&api, "CHESS browser", assembly, "UCSC",
                                  &[test_track()], Some(&focus));

    assert_eq!(session["location"], "chr17:43044295-43170245");
    assert_eq!(session["assembly"]["sequence"]["adapter"]["fastaLocation"]["uri"],
               "http://127.0.0.1:5001/api/public/fasta/1/UCSC");
    assert_eq!(session["defaultSession"]["view"]["type"], "LinearGenomeView");
    assert_eq!(session["tracks"][0]["trackId"], "genes");

    // without a window the session has no location at all
    let session = browser_session(&api, "CHESS browser", assembly, "UCSC",
                                  &[test_track()], None);
    assert!(session.get("location").is_none());
}

#[test]
fn focus_resolution_requires_the_nomenclature() {
    let mut data = sample_global_data();
    data.configurations[0].nomenclature = "Ensembl".into();

    let configuration = &data.configurations[0];
    let assembly = &data.assemblies[&1];
    assert!(focus_for_configuration(assembly, configuration).is_none());
}
