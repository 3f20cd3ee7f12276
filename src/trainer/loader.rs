//! Loads matrix entries from edge list files.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use futures::future::try_join_all;

use crate::graph::{GraphBuilder, VertexId};
use crate::prelude::*;
use crate::trainer::model::{EdgeData, Role};

/// Moves a target ID into a separate number space, so that row and column IDs never collide.
///
/// It is an involution: applying it twice restores the original ID.
#[must_use]
pub const fn remap_target_id(id: VertexId) -> VertexId {
    (!id).wrapping_sub(1)
}

/// Parses a `source [,] target [[,] value]` line.
///
/// Each field is the longest numeric prefix at its position. The value defaults to zero
/// when it is missing or is not a number. Anything after the value is ignored.
pub fn parse_line(line: &str) -> Result<(VertexId, VertexId, f64)> {
    let mut cursor = Cursor(line);
    let source = VertexId::from_str(cursor.take(scan_digits)).context("invalid source ID")?;
    cursor.skip_comma();
    let target = VertexId::from_str(cursor.take(scan_digits)).context("invalid target ID")?;
    cursor.skip_comma();
    let value = match cursor.take(scan_float) {
        "" => 0.0,
        token => f64::from_str(token).context("invalid value")?,
    };
    Ok((source, target, value))
}

struct Cursor<'a>(&'a str);

impl<'a> Cursor<'a> {
    fn skip_comma(&mut self) {
        let rest = self.0.trim_start();
        self.0 = rest.strip_prefix(',').unwrap_or(rest);
    }

    /// Skips the whitespace and takes the prefix of the length returned by `scan`.
    fn take(&mut self, scan: impl FnOnce(&[u8]) -> usize) -> &'a str {
        let rest = self.0.trim_start();
        let (token, rest) = rest.split_at(scan(rest.as_bytes()));
        self.0 = rest;
        token
    }
}

fn scan_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|byte| byte.is_ascii_digit()).count()
}

/// Length of the longest `[+-] digits [. digits] [(e|E) [+-] digits]` prefix,
/// with at least one mantissa digit, or zero.
fn scan_float(bytes: &[u8]) -> usize {
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let n_integer = scan_digits(&bytes[end..]);
    end += n_integer;
    let mut n_fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        n_fraction = scan_digits(&bytes[end + 1..]);
        if n_integer + n_fraction != 0 {
            end += 1 + n_fraction;
        }
    }
    if n_integer + n_fraction == 0 {
        return 0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let n_exponent = scan_digits(&bytes[exponent_end..]);
        if n_exponent != 0 {
            end = exponent_end + n_exponent;
        }
    }
    end
}

/// Loads the edges from `prefix`.
///
/// If `prefix` is a directory, all the files inside it are loaded. Otherwise, all the
/// files in its parent directory whose names start with the prefix's file name.
/// The edge role is derived from each file name.
#[instrument(skip_all, fields(prefix = %prefix.display()))]
pub async fn load(prefix: &Path, remap_target: bool) -> Result<GraphBuilder<EdgeData>> {
    let start_instant = Instant::now();
    let paths = list_files(prefix).await?;
    if paths.is_empty() {
        bail!("no files match `{}`", prefix.display());
    }

    let contents = try_join_all(paths.iter().map(|path| async move {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read `{}`", path.display()))
    }))
    .await?;

    let mut builder = GraphBuilder::default();
    for (path, content) in paths.iter().zip(contents) {
        let role = Role::from_file_name(&path.to_string_lossy());
        let n_edges = builder.num_edges();
        for (line_number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (source, target, value) = parse_line(line)
                .with_context(|| format!("malformed line {}:{}", path.display(), line_number + 1))?;
            let target = if remap_target {
                remap_target_id(target)
            } else {
                target
            };
            builder.add_edge(source, target, EdgeData::new(value, role));
        }
        info!(
            path = %path.display(),
            ?role,
            n_edges = builder.num_edges() - n_edges,
            "loaded",
        );
    }

    info!(
        n_files = paths.len(),
        n_edges = builder.num_edges(),
        elapsed = crate::tracing::format_elapsed(start_instant).as_str(),
        "finished",
    );
    Ok(builder)
}

/// Lists the files matching the prefix, sorted by path.
async fn list_files(prefix: &Path) -> Result<Vec<PathBuf>> {
    let is_directory = tokio::fs::metadata(prefix)
        .await
        .map_or(false, |metadata| metadata.is_dir());
    let (directory, name_prefix) = if is_directory {
        (prefix, String::new())
    } else {
        let directory = match prefix.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let name_prefix = prefix
            .file_name()
            .ok_or_else(|| anyhow!("`{}` is not a valid prefix", prefix.display()))?
            .to_string_lossy()
            .into_owned();
        (directory, name_prefix)
    };

    let mut entries = tokio::fs::read_dir(directory)
        .await
        .with_context(|| format!("failed to list `{}`", directory.display()))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file()
            && entry.file_name().to_string_lossy().starts_with(&name_prefix)
        {
            paths.push(entry.path());
        }
    }
    paths.sort_unstable();
    debug!(
        n_files = paths.len(),
        directory = %directory.display(),
        name_prefix = name_prefix.as_str(),
    );
    Ok(paths)
}
