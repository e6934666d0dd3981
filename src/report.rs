//! Read-only views derived from a published [`AnalysisResult`].

use std::collections::BTreeMap;
use std::fmt::Write as _;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::analyzer::RelationKind;
use crate::analyzer::uml::parse_edge_line;
use crate::config::AnalysisConfig;
use crate::types::{AnalysisResult, DiaDatum, GridDatum, UmlDocument, class_name_from_path};

/// Status line for a finished run.
pub fn summary_line(result: &AnalysisResult, extension: &str) -> String {
    if result.is_empty() {
        return format!("No {} files found.", extension);
    }
    format!(
        "{} files analyzed | Avg Instability: {:.2} | Avg Distance: {:.2}",
        result.file_count(),
        mean(result.dia.iter().map(|d| d.instability)),
        mean(result.dia.iter().map(|d| d.distance)),
    )
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Grid,
    Dia,
    Uml,
}

/// One-line caption for the given view.
pub fn view_summary(result: &AnalysisResult, mode: ViewMode) -> String {
    match mode {
        ViewMode::Grid => format!(
            "Avg lines: {:.1} | Avg complexity: {:.1}",
            mean(result.grid.iter().map(|g| g.line_count as f64)),
            mean(result.grid.iter().map(|g| g.complexity as f64)),
        ),
        ViewMode::Dia => format!(
            "Avg instability: {:.2} | Avg distance: {:.2}",
            mean(result.dia.iter().map(|d| d.instability)),
            mean(result.dia.iter().map(|d| d.distance)),
        ),
        ViewMode::Uml => {
            let classes = result
                .uml
                .body_lines()
                .filter(|line| parse_edge_line(line).is_none())
                .count();
            let relations = result
                .uml
                .body_lines()
                .filter(|line| parse_edge_line(line).is_some())
                .count();
            format!("Classes: {} | Relations: {}", classes, relations)
        }
    }
}

/// Per source class, how many edges of each kind the document holds.
pub fn relation_histogram(uml: &UmlDocument) -> BTreeMap<String, BTreeMap<RelationKind, usize>> {
    let mut histogram: BTreeMap<String, BTreeMap<RelationKind, usize>> = BTreeMap::new();
    for (source, kind, _) in uml.body_lines().filter_map(parse_edge_line) {
        *histogram
            .entry(source.to_string())
            .or_default()
            .entry(kind)
            .or_insert(0) += 1;
    }
    histogram
}

/// Trims a folder filter and converts `\` to `/`. Blank means no filter.
pub fn normalize_folder(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.replace('\\', "/"))
    }
}

/// Grid entries whose path lies under `folder`. `None` keeps everything.
pub fn filter_by_folder<'a>(grid: &'a [GridDatum], folder: Option<&str>) -> Vec<&'a GridDatum> {
    let prefix = folder.map(|f| format!("{}/", f.trim_end_matches('/')));
    grid.iter()
        .filter(|datum| match &prefix {
            Some(prefix) => datum.path.starts_with(prefix.as_str()),
            None => true,
        })
        .collect()
}

pub fn max_line_count<'a>(grid: impl IntoIterator<Item = &'a GridDatum>) -> usize {
    grid.into_iter().map(|g| g.line_count).max().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComplexityBand {
    Low,
    Medium,
    High,
}

impl ComplexityBand {
    pub fn of(complexity: usize, analysis: &AnalysisConfig) -> Self {
        if complexity > analysis.complexity_high {
            ComplexityBand::High
        } else if complexity > analysis.complexity_warn {
            ComplexityBand::Medium
        } else {
            ComplexityBand::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ComplexityBand::Low => "low",
            ComplexityBand::Medium => "medium",
            ComplexityBand::High => "high",
        }
    }

    pub fn paint(self, text: &str) -> ColoredString {
        match self {
            ComplexityBand::Low => text.green(),
            ComplexityBand::Medium => text.yellow(),
            ComplexityBand::High => text.red(),
        }
    }
}

/// Relative size of a file, in `[0, 1]`.
pub fn intensity(datum: &GridDatum, max_line_count: usize) -> f64 {
    if max_line_count == 0 {
        return 0.0;
    }
    (datum.line_count as f64 / max_line_count as f64).min(1.0)
}

/// Where a class sits relative to the main sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Concrete and stable, with dependents
    ZoneOfPain,
    /// Abstract and unstable
    ZoneOfUselessness,
    MainSequence,
    OffSequence,
}

impl Zone {
    pub fn of(datum: &DiaDatum) -> Self {
        if datum.abstractness < 0.2 && datum.instability < 0.2 && datum.incoming > 0 {
            Zone::ZoneOfPain
        } else if datum.abstractness > 0.8 && datum.instability > 0.8 {
            Zone::ZoneOfUselessness
        } else if datum.distance < 0.3 {
            Zone::MainSequence
        } else {
            Zone::OffSequence
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Zone::ZoneOfPain => "zone of pain",
            Zone::ZoneOfUselessness => "zone of uselessness",
            Zone::MainSequence => "main sequence",
            Zone::OffSequence => "off sequence",
        }
    }
}

/// Folder tree of analyzed paths. Folders come before files; both keep
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    pub folders: Vec<(String, FileTree)>,
    pub files: Vec<String>,
}

impl FileTree {
    pub fn insert(&mut self, path: &str) {
        let mut node = self;
        let mut parts = path.split('/').filter(|p| !p.is_empty()).peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                if !node.files.iter().any(|f| f == part) {
                    node.files.push(part.to_string());
                }
                return;
            }
            let index = match node.folders.iter().position(|(name, _)| name == part) {
                Some(index) => index,
                None => {
                    node.folders.push((part.to_string(), FileTree::default()));
                    node.folders.len() - 1
                }
            };
            node = &mut node.folders[index].1;
        }
    }

    /// Two spaces per level, folders suffixed with `/`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(0, &mut out);
        out
    }

    fn render_into(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        for (name, child) in &self.folders {
            let _ = writeln!(out, "{}{}/", indent, name);
            child.render_into(depth + 1, out);
        }
        for file in &self.files {
            let _ = writeln!(out, "{}{}", indent, file);
        }
    }
}

pub fn file_tree<'a>(grid: impl IntoIterator<Item = &'a GridDatum>) -> FileTree {
    let mut tree = FileTree::default();
    for datum in grid {
        tree.insert(&datum.path);
    }
    tree
}

/// Display name of a path: basename without extension.
pub fn simple_name(path: &str) -> String {
    class_name_from_path(path)
}

/// Grid and DIA rows of one analyzed file.
///
/// `query` is a repository path or a trailing part of one
/// (`Order.java`, `shop/Order.java`); the first match in discovery order
/// wins.
pub fn find_file<'a>(
    result: &'a AnalysisResult,
    query: &str,
) -> Option<(&'a GridDatum, Option<&'a DiaDatum>)> {
    let query = query.trim().replace('\\', "/");
    let query = query.trim_start_matches('/');
    if query.is_empty() {
        return None;
    }
    let suffix = format!("/{}", query);
    let grid = result
        .grid
        .iter()
        .find(|g| g.path == query)
        .or_else(|| result.grid.iter().find(|g| g.path.ends_with(&suffix)))?;
    let dia = result.dia.iter().find(|d| d.path == grid.path);
    Some((grid, dia))
}

/// Plain-text detail block for one file.
pub fn render_file(grid: &GridDatum, dia: Option<&DiaDatum>, analysis: &AnalysisConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File: {}", grid.path);
    let _ = writeln!(out, "Class: {}", simple_name(&grid.path));
    let _ = writeln!(out, "Lines: {}", grid.line_count);
    let _ = writeln!(
        out,
        "Complexity: {} ({})",
        grid.complexity,
        ComplexityBand::of(grid.complexity, analysis).label()
    );
    if let Some(dia) = dia {
        let _ = writeln!(
            out,
            "Abstractness: {:.0} | Instability: {:.2} | Distance: {:.2}",
            dia.abstractness, dia.instability, dia.distance
        );
        let _ = writeln!(out, "Incoming: {} | Outgoing: {}", dia.incoming, dia.outgoing);
        let _ = writeln!(out, "Zone: {}", Zone::of(dia).label());
    }
    out
}

/// Grid table, one row per file, complexity coloured by band.
pub fn render_grid(grid: &[&GridDatum], analysis: &AnalysisConfig) -> String {
    let max = max_line_count(grid.iter().copied());
    let mut out = String::new();
    let _ = writeln!(out, "{:<48} {:>7} {:>10} {:>6}", "File", "Lines", "Complexity", "Size");
    for datum in grid {
        let band = ComplexityBand::of(datum.complexity, analysis);
        let _ = writeln!(
            out,
            "{:<48} {:>7} {:>10} {:>5.0}%",
            datum.path,
            datum.line_count,
            band.paint(&datum.complexity.to_string()),
            intensity(datum, max) * 100.0
        );
    }
    out
}

/// DIA table with the zone of every class.
pub fn render_dia(dia: &[DiaDatum]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<32} {:>4} {:>5} {:>5} {:>4} {:>4}  {}",
        "Class", "A", "I", "D", "In", "Out", "Zone"
    );
    for datum in dia {
        let zone = Zone::of(datum);
        let label = match zone {
            Zone::ZoneOfPain | Zone::ZoneOfUselessness => zone.label().red(),
            Zone::OffSequence => zone.label().yellow(),
            Zone::MainSequence => zone.label().green(),
        };
        let _ = writeln!(
            out,
            "{:<32} {:>4.0} {:>5.2} {:>5.2} {:>4} {:>4}  {}",
            simple_name(&datum.path),
            datum.abstractness,
            datum.instability,
            datum.distance,
            datum.incoming,
            datum.outgoing,
            label
        );
    }
    out
}
