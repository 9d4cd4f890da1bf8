//! JSON Lines trace input.
//!
//! One trace per line, either
//!
//! ```text
//! {"case_id": "c1", "events": [{"concept:name": "A", "lifecycle:transition": "complete"}, ...]}
//! ```
//!
//! or a bare array of event objects. Blank lines are skipped; line numbers in
//! errors are 1-based.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{Event, EventClassifier};
use crate::distribution::{ApplyMode, Distribution};
use crate::logging::event_names;
use dfdrift_common::{DistributionKind, Error, Result};

/// One case: an ordered sequence of events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub events: Vec<Event>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TraceLine {
    Case(Trace),
    Bare(Vec<Event>),
}

impl From<TraceLine> for Trace {
    fn from(line: TraceLine) -> Self {
        match line {
            TraceLine::Case(trace) => trace,
            TraceLine::Bare(events) => Trace {
                case_id: None,
                events,
            },
        }
    }
}

/// Parse one non-blank line.
pub fn parse_trace_line(line: &str, line_number: usize) -> Result<Trace> {
    serde_json::from_str::<TraceLine>(line)
        .map(Trace::from)
        .map_err(|e| Error::TraceParse {
            line: line_number,
            message: e.to_string(),
        })
}

/// Iterator over the traces of a JSON Lines stream.
pub struct TraceReader<R> {
    reader: R,
    line_number: usize,
    buf: String,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buf: String::new(),
        }
    }

    /// 1-based number of the last line read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl TraceReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<Trace>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.buf.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(parse_trace_line(line, self.line_number));
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
    }
}

/// Read every trace of a file.
pub fn read_traces(path: &Path) -> Result<Vec<Trace>> {
    TraceReader::open(path)?.collect()
}

/// Build a distribution of `kind` from every trace in `path`.
pub fn load_distribution(
    path: &Path,
    kind: DistributionKind,
    classifier: &EventClassifier,
    mode: ApplyMode,
) -> Result<Distribution> {
    let mut distribution = Distribution::new(kind);
    let mut traces = 0usize;
    for trace in TraceReader::open(path)? {
        distribution.add_trace(&trace?.events, classifier, mode)?;
        traces += 1;
    }
    debug!(
        event = event_names::REFERENCE_LOADED,
        path = %path.display(),
        traces,
        keys = distribution.len(),
        total = distribution.total(),
        "distribution loaded"
    );
    Ok(distribution)
}
