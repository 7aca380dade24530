//! Mermaid diagram to SVG, with a placeholder on failure.
//!
//! Rendering is delegated to a [`DiagramBackend`]; [`render_diagram`] wraps it
//! so callers always get image bytes back.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Placeholder returned when a diagram cannot be rendered.
pub const FALLBACK_SVG: &str = r#"<svg width="200" height="50" xmlns="http://www.w3.org/2000/svg"><text x="10" y="30" fill="red">Mermaid Error</text></svg>"#;

/// Errors from a diagram backend.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Renderer produced no SVG output")]
    EmptyOutput,
}

/// Something that turns diagram source into SVG markup.
pub trait DiagramBackend {
    fn render_svg(&self, id: &str, source: &str) -> Result<String, DiagramError>;
}

/// Render `source` to SVG bytes. Never fails: backend errors are logged and
/// replaced by [`FALLBACK_SVG`].
pub fn render_diagram(backend: &dyn DiagramBackend, source: &str, id: &str) -> Vec<u8> {
    match backend.render_svg(id, source) {
        Ok(svg) => svg.into_bytes(),
        Err(e) => {
            log::error!("Mermaid render error for '{id}': {e}");
            FALLBACK_SVG.as_bytes().to_vec()
        }
    }
}

/// Settings passed to the Mermaid renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MermaidOptions {
    pub theme: String,
    pub font_family: String,
    pub security_level: String,
}

impl Default for MermaidOptions {
    fn default() -> Self {
        Self {
            theme: "neutral".to_string(),
            font_family: "sans-serif".to_string(),
            security_level: "loose".to_string(),
        }
    }
}

/// Backend that shells out to the Mermaid CLI (`mmdc`).
///
/// HTML labels are always disabled so the SVG stays plain text and shapes,
/// which downstream typesetters can embed.
#[derive(Debug, Clone)]
pub struct MermaidCli {
    command: String,
    options: MermaidOptions,
}

impl MermaidCli {
    pub fn new(command: impl Into<String>, options: MermaidOptions) -> Self {
        Self {
            command: command.into(),
            options,
        }
    }

    fn config_json(&self) -> String {
        serde_json::json!({
            "startOnLoad": false,
            "theme": self.options.theme,
            "securityLevel": self.options.security_level,
            "fontFamily": self.options.font_family,
            "htmlLabels": false,
            "flowchart": { "htmlLabels": false },
        })
        .to_string()
    }

    fn run(&self, dir: &Path, source: &str) -> Result<String, DiagramError> {
        let input = dir.join("diagram.mmd");
        let output = dir.join("diagram.svg");
        let config = dir.join("config.json");
        write(&input, source)?;
        write(&config, &self.config_json())?;

        let result = Command::new(&self.command)
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .arg("-c")
            .arg(&config)
            .arg("-q")
            .output()
            .map_err(|source| DiagramError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(DiagramError::Failed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let svg = std::fs::read_to_string(&output).map_err(|source| DiagramError::Io {
            path: output.clone(),
            source,
        })?;
        if svg.trim().is_empty() {
            return Err(DiagramError::EmptyOutput);
        }
        Ok(svg)
    }
}

impl Default for MermaidCli {
    fn default() -> Self {
        Self::new("mmdc", MermaidOptions::default())
    }
}

impl DiagramBackend for MermaidCli {
    fn render_svg(&self, id: &str, source: &str) -> Result<String, DiagramError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("mdseo-diagram-{}-", sanitize_id(id)))
            .tempdir()
            .map_err(|source| DiagramError::Io {
                path: std::env::temp_dir(),
                source,
            })?;

        let result = self.run(dir.path(), source);
        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            log::warn!("Failed to remove {}: {e}", path.display());
        }
        result
    }
}

fn write(path: &Path, contents: &str) -> Result<(), DiagramError> {
    std::fs::write(path, contents).map_err(|source| DiagramError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl DiagramBackend for Fixed {
        fn render_svg(&self, _id: &str, _source: &str) -> Result<String, DiagramError> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    impl DiagramBackend for Broken {
        fn render_svg(&self, _id: &str, _source: &str) -> Result<String, DiagramError> {
            Err(DiagramError::EmptyOutput)
        }
    }

    #[test]
    fn successful_render_returns_svg_bytes() {
        let bytes = render_diagram(&Fixed("<svg>ok</svg>"), "graph TD; A-->B", "d1");
        assert_eq!(bytes, b"<svg>ok</svg>");
    }

    #[test]
    fn failure_returns_fallback() {
        let bytes = render_diagram(&Broken, "graph TD; A-->B", "d1");
        assert_eq!(bytes, FALLBACK_SVG.as_bytes());
        assert!(String::from_utf8(bytes).unwrap().contains("Mermaid Error"));
    }

    #[test]
    fn missing_cli_falls_back() {
        let cli = MermaidCli::new("mdseo-no-such-mermaid-binary", MermaidOptions::default());
        let err = cli.render_svg("x", "graph TD; A-->B").unwrap_err();
        assert!(matches!(err, DiagramError::Spawn { .. }));
        assert_eq!(render_diagram(&cli, "graph TD; A-->B", "x"), FALLBACK_SVG.as_bytes());
    }

    #[test]
    fn failed_render_removes_its_work_dir() {
        let cli = MermaidCli::new("mdseo-no-such-mermaid-binary", MermaidOptions::default());
        assert!(cli.render_svg("cleanup-check", "graph TD; A-->B").is_err());

        let leftovers = std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("mdseo-diagram-cleanup-check-")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn config_disables_html_labels() {
        let json: serde_json::Value =
            serde_json::from_str(&MermaidCli::default().config_json()).unwrap();
        assert_eq!(json["theme"], "neutral");
        assert_eq!(json["htmlLabels"], false);
        assert_eq!(json["flowchart"]["htmlLabels"], false);
    }

    #[test]
    fn ids_are_sanitized_for_paths() {
        assert_eq!(sanitize_id("../evil id"), "___evil_id");
    }
}
