use flexstr::SharedStr as FlexStr;
use serde_json::{Value, json};

use crate::api::public::PublicApi;
use crate::data_types::{Assembly, Configuration};
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorScheme {
    pub color1: &'static str,
    pub color2: &'static str,
    pub color3: &'static str,
}

// The named three-color schemes offered for feature tracks.  Lookups fall
// back to the first entry.
pub const COLOR_SCHEMES: &[(&str, ColorScheme)] = &[
    ("Orange/Green/Red",
     ColorScheme { color1: "#ff7f0e", color2: "#2ca02c", color3: "#d62728" }),
    ("Blue/Light Red/Light Green",
     ColorScheme { color1: "#1f77b4", color2: "#ff9896", color3: "#98df8a" }),
    ("Purple/Orange/Teal",
     ColorScheme { color1: "#9467bd", color2: "#ff7f0e", color3: "#17becf" }),
    ("Brown/Pink/Gray",
     ColorScheme { color1: "#8c564b", color2: "#e377c2", color3: "#7f7f7f" }),
    ("Red/Blue/Green",
     ColorScheme { color1: "#d62728", color2: "#1f77b4", color3: "#2ca02c" }),
    ("Orange/Purple/Green",
     ColorScheme { color1: "#ff7f0e", color2: "#9467bd", color3: "#2ca02c" }),
];

pub fn color_scheme(name: &str) -> &'static ColorScheme {
    COLOR_SCHEMES.iter()
        .find(|(scheme_name, _)| *scheme_name == name)
        .map(|(_, scheme)| scheme)
        .unwrap_or(&COLOR_SCHEMES[0].1)
}

#[derive(Clone, Debug)]
pub struct BrowserTrack {
    pub track_id: FlexStr,
    pub name: FlexStr,
    pub sva_id: SourceVersionAssemblyId,
    pub nomenclature: NomenclatureName,
    pub color_scheme: FlexStr,
}

#[derive(Clone, Debug)]
pub struct FocusWindow {
    pub sequence_name: SequenceName,
    pub start: u64,
    pub end: u64,
}

// reference sequence config for the embedded browser, pointing at the
// FASTA/FAI download endpoints
pub fn assembly_config(api: &PublicApi, display_name: &str, assembly: &Assembly,
                       nomenclature: &str) -> Value {
    json!({
        "name": display_name,
        "sequence": {
            "type": "ReferenceSequenceTrack",
            "trackId": "ReferenceSequenceTrack",
            "adapter": {
                "type": "IndexedFastaAdapter",
                "fastaLocation": {
                    "uri": api.fasta_url(assembly.assembly_id, nomenclature),
                    "locationType": "UriLocation",
                },
                "faiLocation": {
                    "uri": api.fai_url(assembly.assembly_id, nomenclature),
                    "locationType": "UriLocation",
                },
            },
        },
    })
}

// one annotation feature track over the bgzipped GFF3 + Tabix endpoints,
// with the compact display settings used by the portal
pub fn feature_track(api: &PublicApi, track: &BrowserTrack, assembly_name: &str) -> Value {
    let colors = color_scheme(&track.color_scheme);
    let display_id = format!("{}-LinearBasicDisplay", track.track_id);

    json!({
        "type": "FeatureTrack",
        "trackId": track.track_id,
        "name": track.name,
        "assemblyNames": [assembly_name],
        "category": ["Genes"],
        "metadata": {
            "colorScheme": track.color_scheme,
        },
        "adapter": {
            "type": "Gff3TabixAdapter",
            "gffGzLocation": {
                "uri": api.gff3_bgz_url(track.sva_id, &track.nomenclature),
            },
            "index": {
                "location": {
                    "uri": api.gff3_tbi_url(track.sva_id, &track.nomenclature),
                },
                "indexType": "TBI",
            },
        },
        "displays": [
            {
                "type": "LinearBasicDisplay",
                "displayId": display_id,
                "height": 80,
                "layout": {
                    "type": "box",
                    "spacing": 2,
                },
                "featureHeight": 8,
                "renderer": {
                    "type": "SvgFeatureRenderer",
                    "color1": colors.color1,
                    "color2": colors.color2,
                    "color3": colors.color3,
                    "featureHeight": 8,
                    "spacing": 1,
                },
            },
        ],
    })
}

// full browser state: assembly, tracks and a default session, optionally
// opened on a location window
pub fn browser_session(api: &PublicApi, display_name: &str, assembly: &Assembly,
                       nomenclature: &str, tracks: &[BrowserTrack],
                       focus: Option<&FocusWindow>) -> Value {
    let track_configs: Vec<Value> = tracks.iter()
        .map(|track| feature_track(api, track, &assembly.assembly_name))
        .collect();

    let displayed_tracks: Vec<Value> = tracks.iter()
        .map(|track| json!({
            "type": "FeatureTrack",
            "configuration": track.track_id,
            "displays": [
                {
                    "type": "LinearBasicDisplay",
                    "configuration": format!("{}-LinearBasicDisplay", track.track_id),
                },
            ],
        }))
        .collect();

    let mut session = json!({
        "assembly": assembly_config(api, display_name, assembly, nomenclature),
        "tracks": track_configs,
        "defaultSession": {
            "name": display_name,
            "view": {
                "id": "linearGenomeView",
                "type": "LinearGenomeView",
                "tracks": displayed_tracks,
            },
        },
    });

    if let Some(focus) = focus {
        session["location"] = json!(format!("{}:{}-{}", focus.sequence_name,
                                            focus.start, focus.end));
    }

    session
}

// resolve a stored Configuration's window into the displayed sequence
// name under its nomenclature
pub fn focus_for_configuration(assembly: &Assembly, configuration: &Configuration)
    -> Option<FocusWindow>
{
    let mapping = assembly.sequence_id_mappings.get(&configuration.sequence_id)?;
    let sequence_name = mapping.nomenclatures.get(&configuration.nomenclature)?;

    Some(FocusWindow {
        sequence_name: sequence_name.clone(),
        start: configuration.start,
        end: configuration.end,
    })
}
