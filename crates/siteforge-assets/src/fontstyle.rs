//! Generates `@include font(...)` directives for the built web fonts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use siteforge_pipeline::{Task, TaskError, TaskKind, TaskOutput};

use crate::config::SiteConfig;
use crate::output::write_file;

const FONT_EXTENSIONS: &[&str] = &["woff2", "woff", "ttf", "otf"];

/// Style suffixes and their CSS weights. Longer names come first so
/// `ExtraBold` is not read as `Bold`.
const WEIGHTS: &[(&str, u16)] = &[
    ("extralight", 200),
    ("ultralight", 200),
    ("extrabold", 800),
    ("ultrabold", 800),
    ("semibold", 600),
    ("demibold", 600),
    ("hairline", 100),
    ("regular", 400),
    ("medium", 500),
    ("black", 900),
    ("heavy", 900),
    ("light", 300),
    ("thin", 100),
    ("bold", 700),
];

/// Appends one directive per font family to the fonts partial.
///
/// Families already mentioned in the partial are left alone, so hand edits
/// survive and re-running adds nothing.
pub struct FontStyleTask {
    config: SiteConfig,
}

impl FontStyleTask {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn partial(&self) -> PathBuf {
        self.config
            .source_dir()
            .join(&self.config.styles.fonts_partial)
    }
}

impl Task for FontStyleTask {
    fn name(&self) -> &'static str {
        "fontstyle"
    }

    fn description(&self) -> &'static str {
        "Write font includes for generated fonts"
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Source
    }

    fn run(&self) -> Result<TaskOutput, TaskError> {
        let fonts_dir = self.config.dest(&self.config.fonts.dest);
        let faces = list_faces(&fonts_dir)?;
        if faces.is_empty() {
            tracing::debug!("No fonts in {}", fonts_dir.display());
            return Ok(TaskOutput::new());
        }

        let partial = self.partial();
        let existing = if partial.exists() {
            fs::read_to_string(&partial).map_err(|e| TaskError::read(partial.display(), e))?
        } else {
            String::new()
        };

        let additions = directives(&faces, &existing);
        if additions.is_empty() && partial.exists() {
            return Ok(TaskOutput::new());
        }

        for family in additions.iter().filter_map(|d| d.split('"').nth(1)) {
            tracing::info!("Added font family {}", family);
        }

        let mut contents = existing;
        contents.extend(additions);
        let mut output = TaskOutput::new();
        output.push(write_file(&partial, contents)?);
        Ok(output)
    }
}

/// Face names (file names up to the first `.`) of the fonts in `dir`,
/// sorted and deduplicated. A missing directory has no faces.
pub fn list_faces(dir: &Path) -> Result<Vec<String>, TaskError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|e| TaskError::read(dir.display(), e))?;
    let mut faces = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TaskError::read(dir.display(), e))?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let is_font = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if !is_font {
            continue;
        }
        if let Some(face) = file_name.split('.').next().filter(|f| !f.is_empty()) {
            faces.push(face.to_string());
        }
    }

    faces.sort();
    faces.dedup();
    Ok(faces)
}

/// Family of a face: the part before the first `-`.
pub fn family_of(face: &str) -> &str {
    face.split('-').next().unwrap_or(face)
}

/// Directives for every family in `faces` that `existing` does not
/// already include, in family order.
pub fn directives(faces: &[String], existing: &str) -> Vec<String> {
    let mut families: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for face in faces {
        families.entry(family_of(face)).or_default().push(face);
    }

    families
        .into_iter()
        .filter(|(family, _)| !existing.contains(&format!("@include font(\"{}\",", family)))
        .map(|(family, mut members)| {
            members.sort_unstable();
            let face = preferred_face(&members);
            let (weight, style) = weight_and_style(face);
            format!(
                "@include font(\"{}\", \"{}\", \"{}\", \"{}\");\r\n",
                family, face, weight, style
            )
        })
        .collect()
}

/// The `Regular` (or unsuffixed) face, else the first one.
fn preferred_face<'a>(faces: &[&'a str]) -> &'a str {
    faces
        .iter()
        .find(|face| {
            let suffix = suffix_of(face);
            suffix.is_empty() || suffix.eq_ignore_ascii_case("regular")
        })
        .or_else(|| faces.first())
        .copied()
        .unwrap_or_default()
}

fn suffix_of(face: &str) -> &str {
    face.split_once('-').map(|(_, s)| s).unwrap_or("")
}

/// CSS weight and style for a face's suffix (`Foo-SemiBoldItalic` is
/// `600`, `italic`).
pub fn weight_and_style(face: &str) -> (u16, &'static str) {
    let suffix = suffix_of(face).to_ascii_lowercase();
    let style = if suffix.contains("italic") || suffix.contains("oblique") {
        "italic"
    } else {
        "normal"
    };
    let weight = WEIGHTS
        .iter()
        .find(|(name, _)| suffix.contains(name))
        .map(|(_, w)| *w)
        .unwrap_or(400);
    (weight, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn faces(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn derives_weight_and_style() {
        assert_eq!(weight_and_style("Foo-Regular"), (400, "normal"));
        assert_eq!(weight_and_style("Foo"), (400, "normal"));
        assert_eq!(weight_and_style("Foo-Bold"), (700, "normal"));
        assert_eq!(weight_and_style("Foo-ExtraBold"), (800, "normal"));
        assert_eq!(weight_and_style("Foo-SemiBoldItalic"), (600, "italic"));
        assert_eq!(weight_and_style("Foo-ExtraLight"), (200, "normal"));
        assert_eq!(weight_and_style("Foo-Italic"), (400, "italic"));
        assert_eq!(weight_and_style("Foo-Black"), (900, "normal"));
    }

    #[test]
    fn one_directive_per_family_regardless_of_order() {
        let expected = vec![
            "@include font(\"Foo\", \"Foo-Regular\", \"400\", \"normal\");\r\n".to_string(),
        ];
        assert_eq!(directives(&faces(&["Foo-Bold", "Foo-Regular"]), ""), expected);
        assert_eq!(directives(&faces(&["Foo-Regular", "Foo-Bold"]), ""), expected);
        assert_eq!(
            directives(&faces(&["Foo-Bold", "Bar-Light", "Foo-Regular"]), "").len(),
            2
        );
    }

    #[test]
    fn falls_back_to_first_face() {
        assert_eq!(
            directives(&faces(&["Baz-Light", "Baz-Bold"]), ""),
            vec!["@include font(\"Baz\", \"Baz-Bold\", \"700\", \"normal\");\r\n".to_string()]
        );
    }

    #[test]
    fn skips_families_already_included() {
        let existing = "@include font(\"Foo\", \"Foo-Bold\", \"700\", \"normal\");\r\n";
        assert!(directives(&faces(&["Foo-Regular"]), existing).is_empty());
    }

    #[test]
    fn missing_fonts_directory_writes_nothing() {
        let temp = tempdir().unwrap();
        let config = SiteConfig::with_paths(temp.path().join("src"), temp.path().join("dist"));

        let output = FontStyleTask::new(&config).run().unwrap();
        assert!(output.is_empty());
        assert!(!temp.path().join("src/scss/_fonts.scss").exists());
    }

    #[test]
    fn rerunning_is_idempotent() {
        let temp = tempdir().unwrap();
        let config = SiteConfig::with_paths(temp.path().join("src"), temp.path().join("dist"));
        let fonts = config.dest("fonts");
        fs::create_dir_all(&fonts).unwrap();
        for name in ["Foo-Bold.woff", "Foo-Bold.woff2", "Foo-Regular.woff", "Foo-Regular.woff2"] {
            fs::write(fonts.join(name), b"x").unwrap();
        }
        fs::write(fonts.join("notes.txt"), b"x").unwrap();

        let task = FontStyleTask::new(&config);
        let first = task.run().unwrap();
        let partial = temp.path().join("src/scss/_fonts.scss");
        assert_eq!(first.written, vec![partial.clone()]);

        let after_first = fs::read_to_string(&partial).unwrap();
        assert_eq!(
            after_first,
            "@include font(\"Foo\", \"Foo-Regular\", \"400\", \"normal\");\r\n"
        );

        assert!(task.run().unwrap().is_empty());
        assert_eq!(fs::read_to_string(&partial).unwrap(), after_first);
    }

    #[test]
    fn appends_new_families_after_existing_content() {
        let temp = tempdir().unwrap();
        let config = SiteConfig::with_paths(temp.path().join("src"), temp.path().join("dist"));
        fs::create_dir_all(config.dest("fonts")).unwrap();
        fs::write(config.dest("fonts").join("Bar-Medium.woff2"), b"x").unwrap();

        let partial = temp.path().join("src/scss/_fonts.scss");
        fs::create_dir_all(partial.parent().unwrap()).unwrap();
        fs::write(&partial, "// fonts\r\n").unwrap();

        FontStyleTask::new(&config).run().unwrap();
        assert_eq!(
            fs::read_to_string(&partial).unwrap(),
            "// fonts\r\n@include font(\"Bar\", \"Bar-Medium\", \"500\", \"normal\");\r\n"
        );
    }
}
