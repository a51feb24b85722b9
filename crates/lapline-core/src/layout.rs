//! On-disk layout shared by the fetcher (writer) and the builder (reader)
//!
//! ```text
//! <raw_root>/<endpoint>/<season>/<endpoint>_<timestamp>.json
//! <output_root>/<endpoint>/<endpoint>.csv
//! ```

use std::path::{Path, PathBuf};

/// Extension of persisted pages
pub const ARTIFACT_EXT: &str = "json";

/// Endpoint name as a single path component.
///
/// Endpoints such as `drivers/alonso/results` would otherwise nest
/// directories and put slashes into file names.
pub fn storage_name(endpoint: &str) -> String {
    endpoint
        .trim_matches('/')
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

/// `<raw_root>/<endpoint>`
pub fn endpoint_dir(raw_root: &Path, endpoint: &str) -> PathBuf {
    raw_root.join(storage_name(endpoint))
}

/// `<raw_root>/<endpoint>/<season>`
pub fn season_dir(raw_root: &Path, endpoint: &str, season: i32) -> PathBuf {
    endpoint_dir(raw_root, endpoint).join(season.to_string())
}

/// `<endpoint>_<stamp>[_<n>].json`; `n` disambiguates writes sharing a stamp
pub fn artifact_file_name(endpoint: &str, stamp: &str, collision: u32) -> String {
    let name = storage_name(endpoint);
    if collision == 0 {
        format!("{name}_{stamp}.{ARTIFACT_EXT}")
    } else {
        format!("{name}_{stamp}_{collision}.{ARTIFACT_EXT}")
    }
}

/// `<output_root>/<endpoint>/<endpoint>.csv`
pub fn table_path(output_root: &Path, endpoint: &str) -> PathBuf {
    let name = storage_name(endpoint);
    output_root.join(&name).join(format!("{name}.csv"))
}

/// Sibling path used while a file is being written
pub fn tmp_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_name_flattens_slashes() {
        assert_eq!(storage_name("results"), "results");
        assert_eq!(storage_name("drivers/alonso/results"), "drivers_alonso_results");
        assert_eq!(storage_name("/pitstops/"), "pitstops");
    }

    #[test]
    fn season_dir_layout() {
        let dir = season_dir(Path::new("/data/raw"), "results", 2023);
        assert_eq!(dir, PathBuf::from("/data/raw/results/2023"));
    }

    #[test]
    fn artifact_names() {
        assert_eq!(
            artifact_file_name("results", "20240102030405000001", 0),
            "results_20240102030405000001.json"
        );
        assert_eq!(
            artifact_file_name("results", "20240102030405000001", 2),
            "results_20240102030405000001_2.json"
        );
    }

    #[test]
    fn table_path_layout() {
        assert_eq!(
            table_path(Path::new("out"), "qualifying"),
            PathBuf::from("out/qualifying/qualifying.csv")
        );
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("a/results_1.json")),
            PathBuf::from("a/results_1.json.tmp")
        );
    }
}
