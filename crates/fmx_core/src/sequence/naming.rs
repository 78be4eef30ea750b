//! Output file naming for AVI files and image sequences.

use regex::Regex;

use crate::config::OutputSettings;
use crate::models::{FileNamingPolicy, ImageSequence, SequenceNaming};

/// Derive the output file name for a single source file.
///
/// An invalid match expression falls back to the source name.
pub fn apply_naming_policy(source_name: &str, output: &OutputSettings) -> String {
    match output.naming_policy {
        FileNamingPolicy::NoChange => source_name.to_string(),
        FileNamingPolicy::AddPrefix => format!("{}{}", output.prefix, source_name),
        FileNamingPolicy::AddSuffix => {
            let (stem, ext) = split_extension(source_name);
            format!("{}{}{}", stem, output.suffix, ext)
        }
        FileNamingPolicy::ApplyRegex => match Regex::new(&output.regex_match) {
            Ok(re) => re
                .replace_all(source_name, output.regex_replacement.as_str())
                .to_string(),
            Err(e) => {
                tracing::error!("{}", e);
                tracing::warn!("Invalid regex, using source file name instead");
                source_name.to_string()
            }
        },
    }
}

/// Strip digit runs from a file name and collapse the doubled dot they leave.
fn strip_digits(file_name: &str) -> String {
    let stripped: String = file_name.chars().filter(|c| !c.is_ascii_digit()).collect();
    stripped.replace("..", ".")
}

/// Split a file name at its last dot; the extension keeps the dot.
pub(crate) fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(pos) => file_name.split_at(pos),
        None => (file_name, ""),
    }
}

fn stem_of(file_name: &str) -> String {
    split_extension(file_name).0.to_string()
}

/// Output name for a sequence whose first file is `first_file_name`.
///
/// Returns the name and whether the sequence fell back to the generic
/// `<folder>_<stripped stem>.avi` rule (and so could take the bare folder
/// name, see [`resolve_simple_names`]).
pub fn sequence_output_name(
    folder_name: &str,
    first_file_name: &str,
    naming: SequenceNaming,
) -> (String, bool) {
    if naming == SequenceNaming::ImageName {
        let stem = stem_of(&strip_digits(first_file_name));
        return (format!("{}.avi", stem), false);
    }

    let stem: Vec<char> = stem_of(first_file_name).chars().collect();
    let first_digit = stem.iter().position(|c| c.is_ascii_digit());

    // "<name><sep><tag><sep><digits>" keeps the tag between the separators.
    if let Some(idx) = first_digit {
        if idx > 1 && idx + 1 < stem.len() {
            let last_sep = idx - 1;
            let separator = stem[last_sep];
            if let Some(first_sep) = stem.iter().position(|&c| c == separator) {
                if first_sep < last_sep {
                    let tag: String = stem[first_sep + 1..last_sep].iter().collect();
                    return (format!("{}_{}.avi", folder_name, tag), false);
                }
            }
        }
    }

    let fixed_stem = stem_of(&strip_digits(first_file_name));
    (format!("{}_{}.avi", folder_name, fixed_stem), true)
}

/// Final naming pass over all sequences of one folder.
///
/// With folder naming, a single sequence that wanted the simple name gets
/// `<folder>.avi`, and single-channel sequences named that way get their
/// channel suffix so they never collide with the colour output.
pub fn resolve_simple_names(
    sequences: &mut [ImageSequence],
    folder_name: &str,
    naming: SequenceNaming,
) {
    if naming != SequenceNaming::FolderName {
        return;
    }

    let simple_count = sequences.iter().filter(|s| s.wants_simple_name).count();
    if simple_count == 1 {
        if let Some(seq) = sequences.iter_mut().find(|s| s.wants_simple_name) {
            seq.output_name = format!("{}.avi", folder_name);
        }
    }

    let bare = format!("{}.avi", folder_name);
    for seq in sequences.iter_mut() {
        if seq.output_name != bare {
            continue;
        }
        if let Some(suffix) = seq.channel.name_suffix() {
            seq.output_name = format!("{}{}.avi", folder_name, suffix);
        }
    }
}
