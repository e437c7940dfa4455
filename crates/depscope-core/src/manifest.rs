//! Manifest parsing: several input shapes, one canonical graph.
//!
//! Every format funnels into [`DepGraph`] through the same permissive rules:
//! a malformed line in the text formats becomes a dependency-free node, while
//! structurally wrong input (bad JSON shape, missing archive member) is a
//! typed [`ManifestError`].

use crate::error::ManifestError;
use crate::graph::{DepGraph, NameCase};
use flate2::read::GzDecoder;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Name of the control-file member inside a binary package index archive.
pub const INDEX_MEMBER: &str = "APKINDEX";

/// The closed set of supported manifest formats.
///
/// Selection is explicit wherever possible; [`ManifestFormat::detect`] is a
/// convenience for callers that only have a file path, and an explicit mode
/// always wins over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// Line-oriented `name: dep1, dep2` with comma-separated dependencies.
    LineCsv,
    /// Line-oriented `name: dep1 dep2` with whitespace-separated dependencies.
    LineWs,
    /// JSON object mapping name → null | array of names | delimited string.
    Structured,
    /// gzip-compressed tar archive holding an `APKINDEX` control file.
    BinaryIndex,
}

impl ManifestFormat {
    /// Best-effort detection from the file extension. Line input defaults to
    /// the comma-separated variant; there is no way to tell the two line
    /// formats apart by name alone.
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".json") {
            Self::Structured
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Self::BinaryIndex
        } else {
            Self::LineCsv
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LineCsv => "line-csv",
            Self::LineWs => "line-ws",
            Self::Structured => "json",
            Self::BinaryIndex => "apkindex",
        }
    }
}

impl std::fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ManifestFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            // "file" is the historical name for the default line format.
            "line-csv" | "csv" | "file" => Ok(Self::LineCsv),
            "line-ws" | "ws" => Ok(Self::LineWs),
            "json" | "structured" => Ok(Self::Structured),
            "apkindex" | "apk" => Ok(Self::BinaryIndex),
            other => Err(format!(
                "unknown manifest format `{other}` (expected line-csv, line-ws, json, or apkindex)"
            )),
        }
    }
}

/// Dependency-token delimiter for the line-oriented formats.
///
/// The two conventions never mix within one parse: a comma-mode line keeps
/// internal whitespace inside a token, and a whitespace-mode line treats
/// commas as ordinary characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Whitespace,
}

/// A parsed manifest: the graph plus side-channel version metadata.
///
/// Versions are populated only by the binary index format; they ride along
/// for display but are not part of the graph.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub graph: DepGraph,
    pub versions: BTreeMap<String, String>,
}

impl From<DepGraph> for Manifest {
    fn from(graph: DepGraph) -> Self {
        Self {
            graph,
            versions: BTreeMap::new(),
        }
    }
}

/// Parse a manifest file into a graph.
///
/// `format` overrides extension-based detection when given. The chosen case
/// policy is applied to every name, uniformly, at this boundary.
pub fn parse_path(
    path: &Path,
    format: Option<ManifestFormat>,
    case: NameCase,
) -> Result<Manifest, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::NotFound(path.to_path_buf()));
    }
    let format = format.unwrap_or_else(|| ManifestFormat::detect(path));
    tracing::debug!(path = %path.display(), %format, "parsing manifest");

    let origin = path.display().to_string();
    let read_text = || {
        std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    match format {
        ManifestFormat::LineCsv => Ok(parse_line_manifest(&read_text()?, Delimiter::Comma, case).into()),
        ManifestFormat::LineWs => {
            Ok(parse_line_manifest(&read_text()?, Delimiter::Whitespace, case).into())
        }
        ManifestFormat::Structured => structured_graph(&read_text()?, case)
            .map(Manifest::from)
            .map_err(|detail| ManifestError::parse(origin, detail)),
        ManifestFormat::BinaryIndex => {
            let bytes = std::fs::read(path).map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            binary_index_manifest(&bytes, case).map_err(|detail| ManifestError::parse(origin, detail))
        }
    }
}

/// Parse line-oriented adjacency text. Permissive by design: blank lines and
/// `#` comments are skipped, and a line with no `:` declares a bare node.
pub fn parse_line_manifest(text: &str, delimiter: Delimiter, case: NameCase) -> DepGraph {
    let mut graph = DepGraph::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, rest)) = line.split_once(':') else {
            graph.add_node(case.apply(line));
            continue;
        };
        let name = case.apply(name.trim());
        if name.is_empty() {
            continue;
        }
        graph.add_node(name.clone());
        match delimiter {
            Delimiter::Comma => {
                for token in rest.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    graph.add_edge(name.clone(), case.apply(token));
                }
            }
            Delimiter::Whitespace => {
                for token in rest.split_whitespace() {
                    graph.add_edge(name.clone(), case.apply(token));
                }
            }
        }
    }
    graph
}

/// Parse the structured (JSON object) manifest form.
pub fn parse_structured(text: &str, case: NameCase) -> Result<DepGraph, ManifestError> {
    structured_graph(text, case).map_err(|detail| ManifestError::parse("structured input", detail))
}

/// Parse a binary package index archive from an in-memory byte buffer
/// (already fetched by whatever retrieval collaborator applies).
pub fn parse_binary_index(bytes: &[u8], case: NameCase) -> Result<Manifest, ManifestError> {
    binary_index_manifest(bytes, case).map_err(|detail| ManifestError::parse("package index", detail))
}

fn structured_graph(text: &str, case: NameCase) -> Result<DepGraph, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let Value::Object(map) = value else {
        return Err("top level must be an object mapping package -> dependencies".to_string());
    };

    let mut graph = DepGraph::new();
    for (name, deps) in map {
        let name = case.apply(name.trim());
        if name.is_empty() {
            continue;
        }
        graph.add_node(name.clone());
        match deps {
            Value::Null => {}
            Value::String(tokens) => {
                for token in tokens.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    graph.add_edge(name.clone(), case.apply(token));
                }
            }
            Value::Array(items) => {
                for item in items {
                    let Value::String(dep) = item else {
                        return Err(format!("dependencies of `{name}` must be strings"));
                    };
                    let dep = dep.trim();
                    if !dep.is_empty() {
                        graph.add_edge(name.clone(), case.apply(dep));
                    }
                }
            }
            other => {
                return Err(format!(
                    "unsupported dependency value for `{name}`: expected null, string, or array, got {}",
                    json_type_name(&other)
                ));
            }
        }
    }
    Ok(graph)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn binary_index_manifest(bytes: &[u8], case: NameCase) -> Result<Manifest, String> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let entries = archive
        .entries()
        .map_err(|e| format!("not a gzip-compressed tar archive: {e}"))?;

    let mut content: Option<String> = None;
    for entry in entries {
        let mut entry = entry.map_err(|e| format!("corrupt archive entry: {e}"))?;
        let is_index = entry
            .path()
            .map(|p| p.as_ref() == Path::new(INDEX_MEMBER))
            .unwrap_or(false);
        if is_index {
            let mut raw = Vec::new();
            entry
                .read_to_end(&mut raw)
                .map_err(|e| format!("failed to read {INDEX_MEMBER}: {e}"))?;
            content = Some(String::from_utf8_lossy(&raw).into_owned());
            break;
        }
    }

    let content = content.ok_or_else(|| format!("archive has no {INDEX_MEMBER} member"))?;
    Ok(index_records(&content, case))
}

/// Parse the flat-text control file: blank-line separated records of
/// `Key:value` lines. `P` names the package, `V` its version, `D` its
/// whitespace-separated dependency tokens.
fn index_records(content: &str, case: NameCase) -> Manifest {
    let mut manifest = Manifest::default();
    for record in content.split("\n\n") {
        let mut fields: BTreeMap<&str, &str> = BTreeMap::new();
        for line in record.lines() {
            if let Some((key, value)) = line.split_once(':') {
                fields.insert(key.trim(), value.trim());
            }
        }
        let Some(&name) = fields.get("P") else {
            continue;
        };
        let name = case.apply(name);
        if name.is_empty() {
            continue;
        }
        manifest.graph.add_node(name.clone());
        if let Some(&version) = fields.get("V") {
            manifest.versions.insert(name.clone(), version.to_string());
        }
        if let Some(deps) = fields.get("D") {
            for token in deps.split_whitespace() {
                manifest.graph.add_edge(name.clone(), case.apply(token));
            }
        }
    }
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_lines_keep_token_internal_whitespace() {
        let graph = parse_line_manifest("a: b c, d", Delimiter::Comma, NameCase::Preserve);
        assert_eq!(graph.dependencies_of("a"), ["b c", "d"]);
    }

    #[test]
    fn ws_lines_split_on_whitespace_only() {
        let graph = parse_line_manifest("a: b c, d", Delimiter::Whitespace, NameCase::Preserve);
        assert_eq!(graph.dependencies_of("a"), ["b", "c,", "d"]);
    }

    #[test]
    fn comments_blanks_and_bare_nodes() {
        let text = "# header\n\nlibA: libB\nlonely\n";
        let graph = parse_line_manifest(text, Delimiter::Comma, NameCase::Preserve);
        let nodes: Vec<&str> = graph.nodes().collect();
        assert_eq!(nodes, ["libA", "lonely"]);
        assert!(graph.dependencies_of("lonely").is_empty());
    }

    #[test]
    fn line_without_colon_is_never_an_error() {
        let graph = parse_line_manifest("just some words", Delimiter::Comma, NameCase::Preserve);
        assert!(graph.contains("just some words"));
    }

    #[test]
    fn uppercase_applied_to_names_and_deps() {
        let graph = parse_line_manifest("bash: readline ncurses", Delimiter::Whitespace, NameCase::Upper);
        assert!(graph.contains("BASH"));
        assert_eq!(graph.dependencies_of("BASH"), ["READLINE", "NCURSES"]);
    }

    #[test]
    fn structured_empty_forms_are_equivalent() {
        for text in [r#"{"X": null}"#, r#"{"X": []}"#, r#"{"X": ""}"#] {
            let graph = parse_structured(text, NameCase::Preserve).unwrap();
            assert!(graph.contains("X"), "input: {text}");
            assert!(graph.dependencies_of("X").is_empty(), "input: {text}");
        }
    }

    #[test]
    fn structured_string_and_array_forms() {
        let graph =
            parse_structured(r#"{"a": "b, c", "d": ["e", "f"]}"#, NameCase::Preserve).unwrap();
        assert_eq!(graph.dependencies_of("a"), ["b", "c"]);
        assert_eq!(graph.dependencies_of("d"), ["e", "f"]);
    }

    #[test]
    fn structured_preserves_key_order() {
        let graph = parse_structured(r#"{"z": [], "a": [], "m": []}"#, NameCase::Preserve).unwrap();
        let nodes: Vec<&str> = graph.nodes().collect();
        assert_eq!(nodes, ["z", "a", "m"]);
    }

    #[test]
    fn structured_rejects_non_object_top_level() {
        let err = parse_structured("[1, 2]", NameCase::Preserve).unwrap_err();
        assert!(err.to_string().contains("top level"));
    }

    #[test]
    fn structured_rejects_wrong_value_type() {
        let err = parse_structured(r#"{"a": 42}"#, NameCase::Preserve).unwrap_err();
        assert!(err.to_string().contains("expected null, string, or array"));
    }

    #[test]
    fn format_detection_by_extension() {
        assert_eq!(
            ManifestFormat::detect(Path::new("deps.json")),
            ManifestFormat::Structured
        );
        assert_eq!(
            ManifestFormat::detect(Path::new("APKINDEX.tar.gz")),
            ManifestFormat::BinaryIndex
        );
        assert_eq!(
            ManifestFormat::detect(Path::new("deps.txt")),
            ManifestFormat::LineCsv
        );
    }

    #[test]
    fn format_from_str_round_trip() {
        for format in [
            ManifestFormat::LineCsv,
            ManifestFormat::LineWs,
            ManifestFormat::Structured,
            ManifestFormat::BinaryIndex,
        ] {
            assert_eq!(format.as_str().parse::<ManifestFormat>(), Ok(format));
        }
        assert!("cabal".parse::<ManifestFormat>().is_err());
    }

    #[test]
    fn parse_path_missing_file_is_not_found() {
        let err = parse_path(
            Path::new("/nonexistent/deps.txt"),
            None,
            NameCase::Preserve,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
    }

    #[test]
    fn index_records_capture_versions_alongside() {
        let content = "P:bash\nV:5.2\nD:readline libc\n\nP:readline\nV:8.2\n";
        let manifest = index_records(content, NameCase::Preserve);
        assert_eq!(manifest.graph.dependencies_of("bash"), ["readline", "libc"]);
        assert_eq!(manifest.versions.get("bash").map(String::as_str), Some("5.2"));
        assert!(manifest.graph.dependencies_of("readline").is_empty());
        // Versions ride alongside; "libc" was never declared so has none.
        assert!(!manifest.versions.contains_key("libc"));
    }
}
