//! JUnit XML report parsing.
//!
//! Accepts a `<testsuites>` root or a bare `<testsuite>` root. Nested suites
//! are flattened into document order, each keeping only its direct cases.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::error::{io_error, TrawlError, TrawlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Skipped,
    Failed,
    Errored,
}

impl TestStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Skipped => 1,
            Self::Failed => 2,
            Self::Errored => 3,
        }
    }

    /// The more severe of two outcomes: error > failure > skipped > passed.
    fn escalate(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Errored)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCaseResult {
    pub name: String,
    /// Package (Go) or class (JVM) the test belongs to.
    pub classname: String,
    pub status: TestStatus,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub duration_secs: f64,
}

impl Totals {
    fn count(&mut self, case: &TestCaseResult) {
        self.tests += 1;
        match case.status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Errored => self.errored += 1,
            TestStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: &Totals) {
        self.tests += other.tests;
        self.passed += other.passed;
        self.failed += other.failed;
        self.errored += other.errored;
        self.skipped += other.skipped;
        self.duration_secs += other.duration_secs;
    }

    pub fn is_failed(&self) -> bool {
        self.failed + self.errored > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestSuiteResult {
    pub name: String,
    pub totals: Totals,
    pub cases: Vec<TestCaseResult>,
}

/// Suite under construction; `time` is the declared suite duration, if any.
struct OpenSuite {
    slot: usize,
    time: Option<f64>,
}

/// Parse one JUnit document. `origin` only labels errors.
pub fn parse_report(origin: &Path, xml: &str) -> TrawlResult<Vec<TestSuiteResult>> {
    parse_document(xml).map_err(|message| TrawlError::ReportParse {
        path: origin.to_path_buf(),
        message,
    })
}

pub fn parse_report_file(path: &Path) -> TrawlResult<Vec<TestSuiteResult>> {
    let xml = fs::read_to_string(path).map_err(io_error(path))?;
    parse_report(path, &xml)
}

/// Parse every `*.xml` file under `dir`, recursively, in sorted path order.
pub fn parse_report_dir(dir: &Path) -> TrawlResult<Vec<TestSuiteResult>> {
    let mut files = Vec::new();
    collect_xml_files(dir, &mut files)?;
    files.sort();

    let mut suites = Vec::new();
    for file in &files {
        suites.extend(parse_report_file(file)?);
    }
    tracing::debug!(dir = %dir.display(), files = files.len(), suites = suites.len(), "parsed reports");
    Ok(suites)
}

fn collect_xml_files(dir: &Path, out: &mut Vec<PathBuf>) -> TrawlResult<()> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error(&path))?;

        if file_type.is_dir() {
            collect_xml_files(&path, out)?;
        } else if file_type.is_file() && is_xml(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

fn parse_document(xml: &str) -> Result<Vec<TestSuiteResult>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut suites: Vec<TestSuiteResult> = Vec::new();
    let mut open: Vec<OpenSuite> = Vec::new();
    let mut case: Option<TestCaseResult> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {e}", reader.buffer_position()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"testsuite" => {
                        open.push(OpenSuite {
                            slot: suites.len(),
                            time: attr_f64(e, "time")?,
                        });
                        suites.push(TestSuiteResult {
                            name: attr(e, "name")?.unwrap_or_default(),
                            ..Default::default()
                        });
                        if empty {
                            close_suite(&mut suites, &mut open);
                        }
                    }
                    b"testcase" => {
                        if case.is_some() {
                            return Err("nested <testcase> element".into());
                        }
                        let new_case = TestCaseResult {
                            name: attr(e, "name")?.unwrap_or_default(),
                            classname: attr(e, "classname")?.unwrap_or_default(),
                            status: TestStatus::Passed,
                            duration_secs: attr_f64(e, "time")?.unwrap_or(0.0),
                        };
                        if empty {
                            push_case(&mut suites, &open, new_case)?;
                        } else {
                            case = Some(new_case);
                        }
                    }
                    other => {
                        if let Some(case) = case.as_mut() {
                            let status = match other {
                                b"failure" => Some(TestStatus::Failed),
                                b"error" => Some(TestStatus::Errored),
                                b"skipped" => Some(TestStatus::Skipped),
                                _ => None,
                            };
                            if let Some(status) = status {
                                case.status = case.status.escalate(status);
                            }
                        }
                    }
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"testcase" => {
                    if let Some(done) = case.take() {
                        push_case(&mut suites, &open, done)?;
                    }
                }
                b"testsuite" => close_suite(&mut suites, &mut open),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err("unterminated <testsuite> element".into());
    }
    Ok(suites)
}

fn push_case(
    suites: &mut [TestSuiteResult],
    open: &[OpenSuite],
    case: TestCaseResult,
) -> Result<(), String> {
    let suite = open
        .last()
        .and_then(|o| suites.get_mut(o.slot))
        .ok_or_else(|| format!("<testcase> {:?} outside of a <testsuite>", case.name))?;
    suite.cases.push(case);
    Ok(())
}

fn close_suite(suites: &mut [TestSuiteResult], open: &mut Vec<OpenSuite>) {
    let Some(closed) = open.pop() else {
        return;
    };
    let Some(suite) = suites.get_mut(closed.slot) else {
        return;
    };

    let mut totals = Totals::default();
    for case in &suite.cases {
        totals.count(case);
    }
    let case_time: f64 = suite.cases.iter().map(|c| c.duration_secs).sum();
    totals.duration_secs = closed.time.unwrap_or(case_time);
    suite.totals = totals;
}

fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, String> {
    for attribute in e.attributes() {
        let attribute = attribute.map_err(|err| err.to_string())?;
        if attribute.key.local_name().as_ref() == name.as_bytes() {
            let value = attribute.unescape_value().map_err(|err| err.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Numeric attribute; unparseable values are treated as absent.
fn attr_f64(e: &BytesStart<'_>, name: &str) -> Result<Option<f64>, String> {
    Ok(attr(e, name)?.and_then(|v| v.trim().parse::<f64>().ok()))
}
