use std::path::{Path, PathBuf};

use crate::precinct::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Resolves a path from the configuration file against the directory of that
/// file. Absolute paths are kept.
pub fn resolve_path(root: &Path, file_path: &str) -> String {
    let p: PathBuf = [root, Path::new(file_path)].iter().collect();
    p.as_path().display().to_string()
}

/// Zero-fills purely numeric precinct ids to 4 digits. The results file may
/// drop the leading zeros of the local precinct code.
pub fn pad_precinct_id(raw: &str) -> String {
    if !raw.is_empty() && raw.len() < 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>4}", raw)
    } else {
        raw.to_string()
    }
}

/// Writes the document to the given path, or to the standard output for
/// `stdout`.
pub fn write_output(out: &str, contents: &str) -> BMapResult<()> {
    if out == "stdout" {
        println!("{}", contents);
    } else {
        info!("Writing map to {:?}", out);
        fs::write(out, contents).context(WritingFileSnafu { path: out })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_numeric_ids_only() {
        assert_eq!(pad_precinct_id("7"), "0007");
        assert_eq!(pad_precinct_id("0130"), "0130");
        assert_eq!(pad_precinct_id("12345"), "12345");
        assert_eq!(pad_precinct_id("A1"), "A1");
        assert_eq!(pad_precinct_id(""), "");
    }

    #[test]
    fn resolves_relative_paths() {
        assert_eq!(resolve_path(Path::new("/data/mn"), "USPresPct.txt"), "/data/mn/USPresPct.txt");
        assert_eq!(resolve_path(Path::new("/data/mn"), "/tmp/x.json"), "/tmp/x.json");
        assert_eq!(simplify_file_name("/data/mn/USPresPct.txt"), "USPresPct.txt");
    }

    #[test]
    fn writes_to_a_file_or_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("map.geojson").display().to_string();
        write_output(&out, "{}").unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "{}");
        write_output("stdout", "{}").unwrap();
        assert!(!dir.path().join("stdout").exists());
        let missing = dir.path().join("no/such/dir/map.geojson").display().to_string();
        match write_output(&missing, "{}") {
            Err(e) => assert!(matches!(*e, MapError::WritingFile { .. })),
            Ok(_) => panic!("expected an error"),
        }
    }
}
