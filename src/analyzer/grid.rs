use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{GridDatum, SourceFile};

lazy_static! {
    static ref RE_BRANCH_KEYWORDS: Regex = Regex::new(r"\b(if|switch|for|while)\b").unwrap();
}

/// Non-blank line count and branch keyword count of one file.
///
/// Keywords are counted wherever they appear, comments and string
/// literals included.
pub fn analyze_grid_file(file: &SourceFile) -> GridDatum {
    let mut line_count = 0;
    let mut complexity = 0;

    // A "\r\n" pair yields an extra empty piece, which is never counted.
    for line in file.content.split(['\r', '\n']) {
        if !line.trim().is_empty() {
            line_count += 1;
        }
        complexity += RE_BRANCH_KEYWORDS.find_iter(line).count();
    }

    GridDatum {
        path: file.path.clone(),
        line_count,
        complexity,
    }
}

pub fn analyze_grid(files: &[SourceFile]) -> Vec<GridDatum> {
    files.iter().map(analyze_grid_file).collect()
}
