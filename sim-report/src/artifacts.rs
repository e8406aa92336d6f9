//! Report files on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::render::render_html;
use crate::report::Report;

/// Paths of the files written by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// JSON report.
    pub json: PathBuf,
    /// HTML report, if requested.
    pub html: Option<PathBuf>,
}

/// Write `<dir>/<stem>.json` and, when `html` is set, `<dir>/<stem>.html`.
///
/// The directory is created if missing. Each file is written to a `.tmp`
/// sibling first and renamed into place.
pub fn write_artifacts(
    report: &Report,
    dir: &Path,
    stem: &str,
    html: bool,
) -> Result<ArtifactPaths, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let json_path = dir.join(format!("{stem}.json"));
    write_atomic(&json_path, report.to_json()?.as_bytes())?;
    tracing::info!(path = %json_path.display(), "Wrote JSON report");

    let html_path = if html {
        let path = dir.join(format!("{stem}.html"));
        write_atomic(&path, render_html(report).as_bytes())?;
        tracing::info!(path = %path.display(), "Wrote HTML report");
        Some(path)
    } else {
        None
    };

    Ok(ArtifactPaths {
        json: json_path,
        html: html_path,
    })
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ReportError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
