//! Write-once page artifacts with tmp→rename

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lapline_core::layout;

use crate::api::{FetchError, FetchedPage};

/// Microsecond local time, e.g. `20240301143005123456`
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S%6f";

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> FetchError + '_ {
    move |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Persists each fetched page under `<root>/<endpoint>/<season>/`.
#[derive(Debug, Clone)]
pub struct PagePersistor {
    root: PathBuf,
}

impl PagePersistor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `page` to a new file and return its path.
    ///
    /// Never replaces an existing artifact: a name already taken gets a
    /// numeric suffix.
    pub fn persist(&self, page: FetchedPage) -> Result<PathBuf, FetchError> {
        let dir = layout::season_dir(&self.root, &page.endpoint, page.season);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(io_err(&dir))?;
            log::info!("Directory created: {}", dir.display());
        }

        let stamp = chrono::Local::now().format(STAMP_FORMAT).to_string();
        let final_path = free_path(&dir, &page.endpoint, &stamp);
        let tmp_path = layout::tmp_path(&final_path);

        if let Err(e) = write_json(&tmp_path, &page.payload) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, &final_path).map_err(io_err(&final_path))?;

        log::info!("Saved to: {}", final_path.display());
        Ok(final_path)
    }
}

/// First `<endpoint>_<stamp>[_n].json` in `dir` that does not exist yet
fn free_path(dir: &Path, endpoint: &str, stamp: &str) -> PathBuf {
    let mut collision = 0u32;
    loop {
        let path = dir.join(layout::artifact_file_name(endpoint, stamp, collision));
        if !path.exists() && !layout::tmp_path(&path).exists() {
            return path;
        }
        collision += 1;
    }
}

fn write_json(path: &Path, payload: &serde_json::Value) -> Result<(), FetchError> {
    let file = File::options()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_err(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, payload)
        .map_err(|e| io_err(path)(std::io::Error::other(e)))?;
    writer.write_all(b"\n").map_err(io_err(path))?;
    let file = writer
        .into_inner()
        .map_err(|e| io_err(path)(e.into_error()))?;
    file.sync_all().map_err(io_err(path))
}
