use std::fs::File;
use std::io::BufReader;

use flexstr::{SharedStr as FlexStr, shared_str as flex_str};
use serde_derive::{Deserialize, Serialize};

fn default_request_timeout() -> u64 {
    60
}

// large fixed ceiling for raw annotation/FASTA uploads, which can take
// minutes on slow links
fn default_upload_timeout() -> u64 {
    3600
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiConfig {
    pub admin_base_url: String,
    pub public_base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_seconds: u64,
}

fn default_color_scheme() -> FlexStr {
    flex_str!("Orange/Green/Red")
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BrowserConfig {
    #[serde(default = "default_color_scheme")]
    pub default_color_scheme: FlexStr,
}

impl Default for BrowserConfig {
    fn default() -> BrowserConfig {
        BrowserConfig {
            default_color_scheme: default_color_scheme(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Config {
    pub fn read(config_file_name: &str) -> Config {
        let file = match File::open(config_file_name) {
            Ok(file) => file,
            Err(err) => {
                panic!("Failed to read {}: {}\n", config_file_name, err)
            }
        };
        let reader = BufReader::new(file);

        match serde_json::from_reader(reader) {
            Ok(config) => config,
            Err(err) => {
                panic!("failed to parse {}: {}", config_file_name, err)
            },
        }
    }
}
