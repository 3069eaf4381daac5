use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const LOG_EXTENSION: &str = "txt";

/// First of `base.txt`, `base02.txt`, `base03.txt`, ... that does not exist yet.
///
/// Nothing reserves the returned path, so two writers racing on the same
/// folder can still pick the same name.
pub fn unique_log_path(folder: &Path, base_name: &str) -> PathBuf {
    let mut candidate = folder.join(format!("{base_name}.{LOG_EXTENSION}"));
    let mut counter = 2u32;

    while candidate.exists() {
        candidate = folder.join(format!("{base_name}{counter:02}.{LOG_EXTENSION}"));
        counter += 1;
    }

    candidate
}

/// Monthly folder under the base log directory, e.g. `May 2025`.
pub fn log_folder(base_dir: &Path, date: NaiveDate) -> PathBuf {
    base_dir.join(date.format("%B %Y").to_string())
}

/// `Log_File-<dd-mm-yy>` with an optional `_<description>` suffix.
pub fn base_log_name(date: NaiveDate, description: Option<&str>) -> String {
    let mut name = format!("Log_File-{}", date.format("%d-%m-%y"));
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        name.push('_');
        name.push_str(description);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_first_name_is_bare() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_log_path(dir.path(), "base"), dir.path().join("base.txt"));
    }

    #[test]
    fn test_skips_existing_names() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("base.txt")).unwrap();
        File::create(dir.path().join("base02.txt")).unwrap();

        assert_eq!(unique_log_path(dir.path(), "base"), dir.path().join("base03.txt"));
    }

    #[test]
    fn test_counter_grows_past_two_digits() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("base.txt")).unwrap();
        for n in 2..=99 {
            File::create(dir.path().join(format!("base{n:02}.txt"))).unwrap();
        }

        assert_eq!(unique_log_path(dir.path(), "base"), dir.path().join("base100.txt"));
    }

    #[test]
    fn test_dated_layout() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 19).unwrap();
        let base = Path::new("logs");

        assert_eq!(log_folder(base, date), base.join("February 2025"));
        assert_eq!(base_log_name(date, None), "Log_File-19-02-25");
        assert_eq!(base_log_name(date, Some("")), "Log_File-19-02-25");
        assert_eq!(base_log_name(date, Some("Cooldown")), "Log_File-19-02-25_Cooldown");
    }
}
