use sqm_lib::config::{Config, SensorType};
use std::{collections::HashSet, fs, path::Path};

const CONFIG_FILES: &[&str] = &["example.toml", "tsl2561.toml"];

#[test]
fn example_config_file_list_matches_expected() {
    let cfg_files: HashSet<String> = fs::read_dir("../configs")
        .unwrap()
        .map(|d| d.unwrap().file_name().into_string().unwrap())
        .collect();
    let expected: HashSet<String> = CONFIG_FILES.iter().map(|f| f.to_string()).collect();
    assert_eq!(cfg_files, expected, "Example configs directory is missing an expected config file or contains a new config file that should be tested");
}

#[test]
fn example_config_files_parse() {
    let dir = Path::new("../configs");
    for cfg_file in CONFIG_FILES {
        let p = dir.join(cfg_file);
        let cfg = Config::load(&p).unwrap();
        assert_ne!(
            cfg.sensor_type,
            SensorType::None,
            "{cfg_file} should select a sensor"
        );
    }
}
