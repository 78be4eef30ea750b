//! Partitioning of sorted file lists into numbered runs.

use std::path::{Path, PathBuf};

use regex::Regex;

use super::naming::sequence_output_name;
use crate::models::{ChannelKind, ImageSequence, SequenceNaming};

/// Build the matcher source for a file name: every digit becomes `\d` and
/// every other character is matched literally.
pub fn sequence_skeleton(file_name: &str) -> String {
    let mut skeleton = String::with_capacity(file_name.len() * 2);
    let mut buf = [0u8; 4];
    for c in file_name.chars() {
        if c.is_ascii_digit() {
            skeleton.push_str(r"\d");
        } else {
            skeleton.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        }
    }
    skeleton
}

/// Replace each maximal digit run with a single `*`.
pub fn sequence_pattern(file_name: &str) -> String {
    let mut pattern = String::with_capacity(file_name.len());
    let mut in_digits = false;
    for c in file_name.chars() {
        if c.is_ascii_digit() {
            if !in_digits {
                pattern.push('*');
                in_digits = true;
            }
        } else {
            pattern.push(c);
            in_digits = false;
        }
    }
    pattern
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Split `file_paths` (already in directory order) into image sequences.
///
/// Names are compared lower-cased. The scan starts a run at the first
/// remaining file, extends it while following names match its skeleton, and
/// starts the next run at the first name that does not. Runs of a single file
/// are dropped.
pub fn group_sequences(
    file_paths: &[PathBuf],
    folder_name: &str,
    naming: SequenceNaming,
) -> Vec<ImageSequence> {
    let mut sequences = Vec::new();
    let count = file_paths.len();
    let lower_names: Vec<String> = file_paths
        .iter()
        .map(|p| file_name_of(p).to_lowercase())
        .collect();

    let mut i = 0;
    while i < count {
        let start = i;
        let skeleton = sequence_skeleton(&lower_names[start]);
        let matcher = match Regex::new(&skeleton) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!("Skipping '{}': {}", lower_names[start], e);
                i += 1;
                continue;
            }
        };

        let mut run = vec![file_paths[start].clone()];
        for j in (start + 1)..count {
            i = j;
            if matcher.is_match(&lower_names[j]) {
                run.push(file_paths[j].clone());
            } else {
                break;
            }
        }

        if run.len() == 1 {
            if start + 1 >= count {
                break;
            }
            continue;
        }

        let first_name = file_name_of(&file_paths[start]);
        let (output_name, wants_simple_name) =
            sequence_output_name(folder_name, &lower_names[start], naming);
        let channel = ChannelKind::from_file_name(&first_name);

        tracing::debug!(
            "Sequence '{}': {} files ({})",
            first_name,
            run.len(),
            channel
        );

        sequences.push(ImageSequence {
            file_paths: run,
            pattern: sequence_pattern(&first_name),
            skeleton,
            channel,
            output_name,
            wants_simple_name,
        });

        if i == count - 1 {
            break;
        }
    }

    sequences
}
