//! Reads task batches from comma-separated text.
//!
//! Each record is `arrival_time, priority, duration`. Blank lines and lines
//! starting with `#` are skipped, and so is any line that does not hold
//! exactly three unsigned integers or is not valid UTF-8.

use crate::scheduler::TaskSpec;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};
use tracing::debug;

pub const COMMENT_MARKER: char = '#';

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read task file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("task file {path} contains no tasks")]
    Empty { path: PathBuf },
}

/// Parses one record. Returns `None` for comments, blank lines and anything
/// malformed.
pub fn parse_line(line: &str) -> Option<TaskSpec> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(COMMENT_MARKER) {
        return None;
    }

    let mut fields = line.split(',').map(str::trim);
    let arrival_time = fields.next()?.parse().ok()?;
    let priority = fields.next()?.parse().ok()?;
    let duration = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(TaskSpec::new(arrival_time, priority, duration))
}

/// Parses every record in `reader`. Lines that are not valid UTF-8 are
/// skipped like any other malformed line; only read failures are errors.
pub fn parse_tasks<R: BufRead>(reader: R) -> io::Result<Vec<TaskSpec>> {
    let mut tasks = Vec::new();
    for (number, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        match std::str::from_utf8(&line).ok().and_then(parse_line) {
            Some(spec) => tasks.push(spec),
            None => debug!(line = number + 1, "skipped task line"),
        }
    }
    Ok(tasks)
}

pub fn load_tasks(path: &Path) -> Result<Vec<TaskSpec>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_owned(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let tasks = parse_tasks(BufReader::new(file)).map_err(io_error)?;
    if tasks.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_owned(),
        });
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spaced_and_tight_records() {
        assert_eq!(parse_line("0, 1, 2"), Some(TaskSpec::new(0, 1, 2)));
        assert_eq!(parse_line("12,0,7\r"), Some(TaskSpec::new(12, 0, 7)));
        assert_eq!(parse_line("  3 ,  2 , 1  "), Some(TaskSpec::new(3, 2, 1)));
    }

    #[test]
    fn skips_comments_blanks_and_malformed_lines() {
        for line in [
            "",
            "   ",
            "# arrival, priority, duration",
            "  # indented comment",
            "1, 2",
            "1, 2, 3, 4",
            "a, 2, 3",
            "-1, 2, 3",
            "1, 2, ",
        ] {
            assert_eq!(parse_line(line), None, "{line:?} should be skipped");
        }
    }

    #[test]
    fn malformed_lines_are_not_counted() {
        let input = "# batch\n0, 0, 3\n\nbroken\n2, 1, 4\n";
        let tasks = parse_tasks(input.as_bytes()).unwrap();
        assert_eq!(tasks, vec![TaskSpec::new(0, 0, 3), TaskSpec::new(2, 1, 4)]);
    }

    #[test]
    fn non_utf8_lines_are_skipped_not_fatal() {
        // `# öncelik` saved as ISO-8859-9
        let input: &[u8] = b"0, 0, 3\n# \xf6ncelik\n1, 1, 2\n";
        let tasks = parse_tasks(input).unwrap();
        assert_eq!(tasks, vec![TaskSpec::new(0, 0, 3), TaskSpec::new(1, 1, 2)]);
    }

    #[test]
    fn read_failures_stay_fatal() {
        struct Failing;

        impl io::Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
            }
        }

        let err = parse_tasks(BufReader::new(Failing)).unwrap_err();
        assert_eq!(err.to_string(), "disk gone");
    }
}
