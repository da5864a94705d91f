//! Writing the panes of a category to disk as SVG and PNG.

use crate::viewport::PaneView;
use std::fs;
use std::path::{Path, PathBuf};
use svviz_view::Category;
use svviz_view::render::RenderError;
use thiserror::Error;

/// Errors that can occur when exporting panes.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("nothing to export")]
    Empty,
    #[error("failed to create export directory '{path}': {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Svg,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
        }
    }
}

/// File name for one sample's pane, e.g. `NA12878-alt.svg`.
pub fn file_name(sample: &str, category: Category, format: ExportFormat) -> String {
    let stem: String = sample
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.trim_matches('.').is_empty() {
        "sample".to_string()
    } else {
        stem
    };

    format!("{stem}-{category}.{}", format.extension())
}

/// Writes every pane of `category` into `dir`. Returns the written paths.
pub fn export_panes(
    dir: &Path,
    category: Category,
    panes: &[PaneView],
    format: ExportFormat,
) -> Result<Vec<PathBuf>, ExportError> {
    if panes.is_empty() {
        return Err(ExportError::Empty);
    }

    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let mut written = Vec::with_capacity(panes.len());
    for pane in panes {
        let path = dir.join(file_name(&pane.name, category, format));
        match format {
            ExportFormat::Svg => {
                fs::write(&path, &pane.svg).map_err(|source| ExportError::Write {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            ExportFormat::Png => {
                pane.document.rasterize_full()?.save_png(&path)?;
            }
        }
        log::info!("Exported {}", path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::CategoryView;
    use svviz_view::Fragment;
    use svviz_view::render::SvgRenderer;

    const FRAGMENT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20"><rect x="0" y="0" width="40" height="20" fill="purple" class="read" data-readid="r1"/></svg>"#;

    fn view() -> CategoryView {
        let fragments = vec![Fragment {
            name: "NA 12878/1".into(),
            svg: FRAGMENT.into(),
        }];
        let (view, failures) = CategoryView::from_fragments(&SvgRenderer::new(), fragments);
        assert!(failures.is_empty());
        view
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(
            file_name("NA 12878/1", Category::Alt, ExportFormat::Svg),
            "NA_12878_1-alt.svg"
        );
        assert_eq!(file_name("..", Category::Ref, ExportFormat::Png), "sample-ref.png");
    }

    #[test]
    fn writes_svg_and_png() {
        let view = view();
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path().join("exports");

        let svgs = export_panes(&dir, Category::Amb, view.panes(), ExportFormat::Svg).unwrap();
        assert_eq!(svgs, vec![dir.join("NA_12878_1-amb.svg")]);
        assert_eq!(fs::read_to_string(&svgs[0]).unwrap(), FRAGMENT);

        let pngs = export_panes(&dir, Category::Amb, view.panes(), ExportFormat::Png).unwrap();
        let image = image::open(&pngs[0]).unwrap();
        assert_eq!((image.width(), image.height()), (40, 20));
    }

    #[test]
    fn empty_category_is_an_error() {
        let scratch = tempfile::tempdir().unwrap();
        assert!(matches!(
            export_panes(scratch.path(), Category::Alt, &[], ExportFormat::Svg),
            Err(ExportError::Empty)
        ));
    }
}
