//! Command parsing and execution

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use atelier_scene::{
    AtelierConfig, ConfigError, DocumentError, PreviewReconstructor, PreviewShape, PreviewState, SceneDocument,
};
use thiserror::Error;

pub const USAGE: &str = "\
Usage: atelier [--config <config.toml>] <command>

Commands:
  inspect <doc.json>          Summarize a scene document and report issues
  preview <doc.json>          Print the preview render graph
  check-config <config.toml>  Print the effective configuration
  help                        Show this message";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Inspect(PathBuf),
    Preview(PathBuf),
    CheckConfig(PathBuf),
    Help,
}

/// A parsed command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub config: Option<PathBuf>,
}

pub fn parse_args(args: &[String]) -> Result<Invocation, CliError> {
    let mut config = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter
                    .next()
                    .ok_or_else(|| CliError::Usage("--config needs a path".to_string()))?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => positional.push("help"),
            flag if flag.starts_with('-') => {
                return Err(CliError::Usage(format!("Unknown option: {}", flag)));
            }
            other => positional.push(other),
        }
    }

    let path_arg = |name: &str| -> Result<PathBuf, CliError> {
        match positional.get(1) {
            Some(p) => Ok(PathBuf::from(p)),
            None => Err(CliError::Usage(format!("{} needs a file argument", name))),
        }
    };

    let command = match positional.first().copied() {
        Some("inspect") => Command::Inspect(path_arg("inspect")?),
        Some("preview") => Command::Preview(path_arg("preview")?),
        Some("check-config") => Command::CheckConfig(path_arg("check-config")?),
        Some("help") | None => Command::Help,
        Some(other) => return Err(CliError::Usage(format!("Unknown command: {}", other))),
    };

    Ok(Invocation { command, config })
}

pub fn run(invocation: &Invocation, out: &mut impl Write) -> Result<(), CliError> {
    let config = match &invocation.config {
        Some(path) => AtelierConfig::load(path)?,
        None => AtelierConfig::default(),
    };

    match &invocation.command {
        Command::Inspect(path) => inspect(&SceneDocument::load(path)?, out),
        Command::Preview(path) => preview(&SceneDocument::load(path)?, &config, out),
        Command::CheckConfig(path) => {
            let checked = AtelierConfig::load(path)?;
            write!(out, "{}", checked.to_toml_string()?)?;
            Ok(())
        }
        Command::Help => {
            writeln!(out, "{}", USAGE)?;
            Ok(())
        }
    }
}

fn inspect(doc: &SceneDocument, out: &mut impl Write) -> Result<(), CliError> {
    writeln!(out, "Document version {}", doc.version)?;
    writeln!(
        out,
        "{} objects, {} lights, {} groups",
        doc.objects.len(),
        doc.lights.len(),
        doc.groups.len()
    )?;

    let mut histogram: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &doc.objects {
        *histogram.entry(record.geometry_descriptor.type_name()).or_default() += 1;
    }
    for (kind, count) in &histogram {
        writeln!(out, "  {:<10} {}", kind, count)?;
    }

    let with_payload = doc.objects.iter().filter(|o| o.raw_geometry_data.is_some()).count();
    writeln!(out, "{} objects carry raw vertex data", with_payload)?;
    if doc.slides.is_some() {
        writeln!(out, "Has presentation slides")?;
    }

    let issues = doc.validate();
    if issues.is_empty() {
        writeln!(out, "No issues")?;
    } else {
        writeln!(out, "{} issues:", issues.len())?;
        for issue in issues {
            writeln!(out, "  - {}", issue)?;
        }
    }
    Ok(())
}

fn preview(doc: &SceneDocument, config: &AtelierConfig, out: &mut impl Write) -> Result<(), CliError> {
    let reconstructor = PreviewReconstructor::new(config.preview.clone());
    match reconstructor.reconstruct(doc) {
        PreviewState::Ready(graph) => {
            let skipped = doc.objects.len() - graph.nodes.len();
            writeln!(out, "{} preview nodes ({} skipped)", graph.nodes.len(), skipped)?;
            for node in &graph.nodes {
                let shape = match &node.shape {
                    PreviewShape::Primitive(p) => p.kind().to_string(),
                    PreviewShape::Placeholder => "placeholder".to_string(),
                };
                writeln!(
                    out,
                    "  {} {:?}: {} ({} triangles) at {:?}{}",
                    node.record_id,
                    node.name,
                    shape,
                    node.shape.primitive().triangle_count(),
                    node.transform.position,
                    if node.visible { "" } else { " [hidden]" }
                )?;
            }
            writeln!(out, "Framing {:?} .. {:?}", graph.framing.min, graph.framing.max)?;
        }
        PreviewState::Empty => writeln!(out, "Empty scene: no drawable objects")?,
        PreviewState::Loading => writeln!(out, "Loading")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run_to_string(invocation: &Invocation) -> String {
        let mut out = Vec::new();
        run(invocation, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn write_doc(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("scene.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_parse_args() {
        let inv = parse_args(&args(&["--config", "a.toml", "preview", "doc.json"])).unwrap();
        assert_eq!(inv.command, Command::Preview(PathBuf::from("doc.json")));
        assert_eq!(inv.config, Some(PathBuf::from("a.toml")));

        assert_eq!(parse_args(&[]).unwrap().command, Command::Help);
        assert!(matches!(parse_args(&args(&["inspect"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(&args(&["render", "x"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(&args(&["--verbose"])), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_inspect_reports_issues() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(
            &dir,
            r#"{"objects": [
                {"id": "a", "geometryDescriptor": {"type": "box"}},
                {"id": "b", "groupId": "g9", "geometryDescriptor": {"type": "custom"}},
                {"id": "c", "geometryDescriptor": {"type": "box"}}
            ]}"#,
        );
        let text = run_to_string(&Invocation {
            command: Command::Inspect(path),
            config: None,
        });
        assert!(text.contains("3 objects, 0 lights, 0 groups"));
        assert!(text.contains("box        2"));
        assert!(text.contains("1 issues:"));
        assert!(text.contains("missing group g9"));
    }

    #[test]
    fn test_preview_skips_bad_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(
            &dir,
            r#"{"objects": [
                {"id": "a", "name": "Ball", "geometryDescriptor": {"type": "sphere", "widthSegments": 128}},
                {"id": "b", "geometryDescriptor": {"type": "cube"}}
            ]}"#,
        );
        let text = run_to_string(&Invocation {
            command: Command::Preview(path),
            config: None,
        });
        assert!(text.contains("1 preview nodes (1 skipped)"));
        assert!(text.contains("a \"Ball\": sphere (224 triangles)"));
    }

    #[test]
    fn test_preview_empty_scene() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(&dir, "{}");
        let text = run_to_string(&Invocation {
            command: Command::Preview(path),
            config: None,
        });
        assert_eq!(text.trim(), "Empty scene: no drawable objects");
    }

    #[test]
    fn test_unreadable_document_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(&dir, "not json");
        let mut out = Vec::new();
        let err = run(
            &Invocation {
                command: Command::Inspect(path),
                config: None,
            },
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Document(DocumentError::Json(_))));
    }

    #[test]
    fn test_check_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atelier.toml");
        std::fs::write(&path, "[save]\nlight_fields = \"minimal\"\n").unwrap();
        let text = run_to_string(&Invocation {
            command: Command::CheckConfig(path),
            config: None,
        });
        assert!(text.contains("light_fields = \"minimal\""));
        assert!(text.contains("max_width_segments = 16"));
    }
}
