use serde::Serialize;
use std::collections::BTreeSet;

/// A downloaded source file, ready for analysis.
///
/// The class name is derived from the file name: the basename with its
/// last extension removed. It is never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Repository path, forward-slash separated. Unique within a run.
    pub path: String,

    /// Raw file text
    pub content: String,

    /// Basename sans extension
    pub class_name: String,
}

impl SourceFile {
    /// Returns `None` when no class name can be derived from `path`
    /// (for example a bare `.java` file).
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let class_name = class_name_from_path(&path);
        if class_name.trim().is_empty() {
            return None;
        }
        Some(Self {
            path,
            content: content.into(),
            class_name,
        })
    }
}

/// Basename of `path` (either separator) with the last extension removed.
pub fn class_name_from_path(path: &str) -> String {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(dot) => file_name[..dot].to_string(),
        None => file_name.to_string(),
    }
}

/// Size and branching complexity of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridDatum {
    pub path: String,
    pub line_count: usize,
    pub complexity: usize,
}

/// Structural facts extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedClass {
    pub path: String,
    pub class_name: String,
    pub is_interface: bool,
    pub is_abstract: bool,
    pub parent: Option<String>,
    pub implements: BTreeSet<String>,
    pub compositions: BTreeSet<String>,
    pub aggregations: BTreeSet<String>,
    pub associations: BTreeSet<String>,
    pub dependencies: BTreeSet<String>,
    pub incoming_count: usize,
}

impl ParsedClass {
    pub fn new(path: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Union of every outgoing set, the parent included, without self.
    pub fn all_outgoing(&self) -> BTreeSet<&str> {
        let mut all: BTreeSet<&str> = BTreeSet::new();
        all.extend(self.dependencies.iter().map(String::as_str));
        all.extend(self.associations.iter().map(String::as_str));
        all.extend(self.aggregations.iter().map(String::as_str));
        all.extend(self.compositions.iter().map(String::as_str));
        all.extend(self.implements.iter().map(String::as_str));
        if let Some(parent) = &self.parent {
            all.insert(parent.as_str());
        }
        all.remove(self.class_name.as_str());
        all
    }

    pub fn is_abstraction(&self) -> bool {
        self.is_interface || self.is_abstract
    }
}

/// Martin's abstractness / instability / distance for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiaDatum {
    pub path: String,
    pub abstractness: f64,
    pub instability: f64,
    pub distance: f64,
    pub incoming: usize,
    pub outgoing: usize,
}

/// PlantUML class-diagram text, `@startuml` through `@enduml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UmlDocument(String);

impl UmlDocument {
    pub const START: &'static str = "@startuml";
    pub const END: &'static str = "@enduml";

    pub fn new(text: String) -> Self {
        Self(text)
    }

    /// The document of a run that analyzed no files.
    pub fn empty() -> Self {
        Self(format!("{}\n{}", Self::START, Self::END))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lines between the start and end markers.
    pub fn body_lines(&self) -> impl Iterator<Item = &str> {
        self.0
            .lines()
            .filter(|line| *line != Self::START && *line != Self::END)
    }
}

impl std::fmt::Display for UmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three datasets of one successful run, published together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub grid: Vec<GridDatum>,
    pub dia: Vec<DiaDatum>,
    pub uml: UmlDocument,
}

impl AnalysisResult {
    pub fn empty() -> Self {
        Self {
            grid: Vec::new(),
            dia: Vec::new(),
            uml: UmlDocument::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.grid.len()
    }
}
