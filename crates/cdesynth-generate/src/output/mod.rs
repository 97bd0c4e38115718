pub mod csv;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// First unused `synthetic_cde_<MM-DD-YYYY>_<i>.csv` in `dir`, counting from 0.
pub fn default_output_path(dir: &Path, date: NaiveDate) -> PathBuf {
    let stamp = date.format("%m-%d-%Y");
    let mut index = 0_u32;
    loop {
        let candidate = dir.join(format!("synthetic_cde_{stamp}_{index}.csv"));
        if !candidate.exists() {
            return candidate;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_skips_existing_files() {
        let dir = std::env::temp_dir().join(format!("cdesynth_out_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        let first = default_output_path(&dir, date);
        assert_eq!(first, dir.join("synthetic_cde_03-07-2024_0.csv"));

        std::fs::write(&first, "").unwrap();
        assert_eq!(
            default_output_path(&dir, date),
            dir.join("synthetic_cde_03-07-2024_1.csv")
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
