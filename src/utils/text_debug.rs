// src/utils/text_debug.rs
use std::fs::File;
use std::io::Write;
use std::path::Path;
use regex::Regex;
use crate::utils::error::AppError;

/// Renders the text with every highlight wrapped in `[[label>>` ... `<<label]]` markers.
/// Highlights that overlap an earlier one are dropped so the markers stay balanced.
pub fn annotate_text(text: &str, highlights: &[(usize, usize, &str)]) -> String {
    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| (h.0, std::cmp::Reverse(h.1)));

    let mut annotated = String::with_capacity(text.len() + highlights.len() * 16);
    let mut last_pos = 0;

    for (start, end, label) in sorted_highlights {
        if start < last_pos {
            tracing::trace!("Skipping overlapping highlight '{}' at {}-{}", label, start, end);
            continue;
        }
        annotated.push_str(&text[last_pos..start]);
        annotated.push_str(&format!("[[{}>>", label));
        annotated.push_str(&text[start..end]);
        annotated.push_str(&format!("<<{}]]", label));
        last_pos = end;
    }

    annotated.push_str(&text[last_pos..]);
    annotated
}

/// Saves the annotated text to a file with a short header
pub fn save_debug_text(text: &str, path: &Path, highlights: &[(usize, usize, &str)]) -> Result<(), AppError> {
    let mut file = File::create(path)?;

    writeln!(file, "# Annotated extraction dump")?;
    writeln!(file, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;
    writeln!(file, "# Highlights: {}", highlights.len())?;
    writeln!(file)?;
    file.write_all(annotate_text(text, highlights).as_bytes())?;

    tracing::info!("Saved annotated text to {}", path.display());
    Ok(())
}

/// Creates an annotated copy of the extracted text with every match of the given
/// patterns highlighted. Patterns are `(regex, label)` pairs.
pub fn create_debug_text(text: &str, path: &Path, patterns: &[(String, String)]) -> Result<(), AppError> {
    let mut highlights = Vec::new();

    for (pattern, label) in patterns {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!("Skipping invalid debug pattern '{}': {}", pattern, e);
                continue;
            }
        };

        for mat in re.find_iter(text) {
            if mat.start() < mat.end() {
                highlights.push((mat.start(), mat.end(), label.as_str()));
            }
        }
    }

    save_debug_text(text, path, &highlights)
}
