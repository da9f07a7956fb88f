//! The standard task set, build plan and watch bindings.

use siteforge_pipeline::{FileGroup, Step, TaskError, TaskRegistry};

use crate::config::SiteConfig;
use crate::fonts::{FontsTask, OtfTask};
use crate::fontstyle::FontStyleTask;
use crate::images::ImagesTask;
use crate::markup::MarkupTask;
use crate::purge::PurgeTask;
use crate::scripts::ScriptsTask;
use crate::sprite::SpriteTask;
use crate::styles::StylesTask;

/// Register every task for `config`.
pub fn standard_registry(config: &SiteConfig) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry
        .register(PurgeTask::new(config))
        .register(OtfTask::new(config))
        .register(MarkupTask::new(config))
        .register(StylesTask::new(config))
        .register(ScriptsTask::new(config))
        .register(ImagesTask::new(config))
        .register(FontsTask::new(config))
        .register(FontStyleTask::new(config))
        .register(SpriteTask::new(config));
    registry
}

/// The full build: purge, normalize fonts, then every writer with fonts and
/// their stylesheet ahead of the SCSS that includes it.
pub fn build_plan() -> Step {
    Step::series([
        Step::task("purge"),
        Step::task("fonts-otf"),
        Step::parallel([
            Step::task("markup"),
            Step::task("scripts"),
            Step::task("images"),
            Step::series_of(&["fonts", "fontstyle", "styles"]),
        ]),
    ])
}

/// Source patterns whose changes re-run a task in watch mode.
pub fn watch_bindings(config: &SiteConfig) -> Result<Vec<(FileGroup, &'static str)>, TaskError> {
    Ok(vec![
        (config.source_group(&config.markup.watch)?, "markup"),
        (config.source_group(&config.scripts.watch)?, "scripts"),
        (config.source_group(&config.styles.watch)?, "styles"),
        (config.source_group(&config.images.watch)?, "images"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::sfnt::tests::sample_font;
    use crate::fonts::sfnt::TRUETYPE;
    use pretty_assertions::assert_eq;
    use siteforge_pipeline::Runner;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;
    use walkdir::WalkDir;

    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    fn scaffold(src: &Path) {
        for dir in ["scss", "js", "img", "fonts"] {
            fs::create_dir_all(src.join(dir)).unwrap();
        }
        fs::write(
            src.join("index.html"),
            "<html><body>@@include('_header.html', {\"title\": \"Home\"})</body></html>",
        )
        .unwrap();
        fs::write(src.join("_header.html"), "<h1>@@title</h1>").unwrap();
        fs::write(
            src.join("scss/style.scss"),
            r#"@mixin font($family, $face, $weight, $style) {
  @font-face {
    font-family: $family;
    src: url("../fonts/#{$face}.woff2") format("woff2");
    font-weight: #{$weight};
    font-style: #{$style};
  }
}
@import 'fonts';
body { display: flex; }
"#,
        )
        .unwrap();
        fs::write(src.join("scss/_fonts.scss"), "").unwrap();
        fs::write(src.join("js/main.js"), "const greet = (name) => `hi ${name}`;\nconsole.log(greet('x'));\n").unwrap();
        fs::write(src.join("js/vendors.js"), "export const v = 1;\n").unwrap();
        fs::write(
            src.join("img/dot.svg"),
            "<svg viewBox=\"0 0 2 2\">\n  <circle r=\"1\"/>\n</svg>",
        )
        .unwrap();
        fs::write(src.join("fonts/Foo-Regular.ttf"), sample_font(TRUETYPE).to_bytes()).unwrap();
        fs::write(src.join("fonts/Foo-Bold.ttf"), sample_font(TRUETYPE).to_bytes()).unwrap();
    }

    #[test]
    fn build_plan_is_valid() {
        let registry = standard_registry(&SiteConfig::default());
        build_plan().validate(&registry).unwrap();
        assert_eq!(
            build_plan().to_string(),
            "series(purge, fonts-otf, parallel(markup, scripts, images, series(fonts, fontstyle, styles)))"
        );
        assert!(registry.contains("svg"));
        assert!(!build_plan().task_names().contains(&"svg"));
    }

    #[test]
    fn watch_bindings_route_changes() {
        let config = SiteConfig::with_paths("src", "dist");
        let bindings = watch_bindings(&config).unwrap();
        let route = |path: &str| {
            bindings
                .iter()
                .filter(|(group, _)| group.matches_relative(Path::new(path)))
                .map(|(_, task)| *task)
                .collect::<Vec<_>>()
        };

        assert_eq!(route("index.html"), vec!["markup"]);
        assert_eq!(route("partials/_nav.html"), vec!["markup"]);
        assert_eq!(route("scss/base/_reset.scss"), vec!["styles"]);
        assert_eq!(route("js/main.js"), vec!["scripts"]);
        assert_eq!(route("img/icons/a.png"), vec!["images"]);
        assert!(route("fonts/Foo.ttf").is_empty());
    }

    #[tokio::test]
    async fn build_is_idempotent() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let out = temp.path().join("dist");
        scaffold(&src);

        let config = SiteConfig::with_paths(&src, &out);
        let runner = Runner::new(standard_registry(&config));

        runner.run(&build_plan()).await.unwrap();
        let first = snapshot(&out);
        let partial = fs::read_to_string(src.join("scss/_fonts.scss")).unwrap();

        runner.run(&build_plan()).await.unwrap();
        let second = snapshot(&out);

        assert_eq!(first.keys().collect::<Vec<_>>(), second.keys().collect::<Vec<_>>());
        assert!(first == second, "second build changed the output");
        assert_eq!(
            fs::read_to_string(src.join("scss/_fonts.scss")).unwrap(),
            partial
        );

        assert_eq!(
            partial,
            "@include font(\"Foo\", \"Foo-Regular\", \"400\", \"normal\");\r\n"
        );
        let css = String::from_utf8(first[Path::new("css/style.css")].clone()).unwrap();
        assert!(css.contains("@font-face"));
        assert!(css.contains("Foo-Regular.woff2"));

        for expected in [
            "index.html",
            "css/style.min.css",
            "js/main.js",
            "js/main.min.js",
            "js/vendors.js",
            "images/dot.svg",
            "fonts/Foo-Bold.woff",
            "fonts/Foo-Regular.woff2",
        ] {
            assert!(first.contains_key(Path::new(expected)), "missing {}", expected);
        }
    }
}
