//! Stem-map file parsing: the external collaborator the registration core
//! consumes only through the [`stem_register::Stem`] / [`stem_register::StemMap`]
//! interface (§6 of the spec this CLI was built against).
//!
//! Format: ASCII, one stem per line, whitespace-separated `x y z diameter`.
//! Records whose fourth column is `<= min_diam` are dropped silently. The
//! fourth column is consumed directly as the stem's radius field, matching the
//! upstream convention the core was built against (the file's "diameter" column
//! is the value `Stem::radius()` returns unmodified).

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use stem_register::{Stem, StemMap};

pub fn load_stem_map(path: &Path, min_diam: f64) -> Result<StemMap> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading stem map file {}", path.display()))?;

    let mut stems = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            bail!(
                "{}:{}: expected `x y z diameter`, got {} field(s)",
                path.display(),
                line_no + 1,
                fields.len()
            );
        }
        let values: Vec<f64> = fields
            .iter()
            .map(|f| {
                f.parse::<f64>()
                    .with_context(|| format!("{}:{}: not a number: {f}", path.display(), line_no + 1))
            })
            .collect::<Result<_>>()?;

        let (x, y, z, diameter) = (values[0], values[1], values[2], values[3]);
        if diameter > min_diam {
            stems.push(Stem::new(x, y, z, diameter));
        }
    }

    Ok(StemMap::from_stems(stems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_and_filters_by_min_diam() {
        let mut file = tempfile_with_contents("0 0 0 0.20\n1 1 1 0.05\n2 2 2 0.30\n");
        let map = load_stem_map(file.path(), 0.1).unwrap();
        assert_eq!(map.len(), 2);
        file.close().unwrap();
    }

    fn tempfile_with_contents(contents: &str) -> NamedFile {
        let path = std::env::temp_dir().join(format!(
            "stem-register-test-{}.txt",
            std::process::id()
        ));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        NamedFile { path }
    }

    struct NamedFile {
        path: std::path::PathBuf,
    }

    impl NamedFile {
        fn path(&self) -> &Path {
            &self.path
        }

        fn close(self) -> std::io::Result<()> {
            fs::remove_file(&self.path)
        }
    }
}
