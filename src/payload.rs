//! Payload source and sink seams, plus the demo student record.
//!
//! The buffer never looks inside a payload. Whatever produces the bytes and
//! whatever renders them afterwards plugs in through [`PayloadSource`] and
//! [`PayloadSink`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

use crate::SPSC::Structs::SlotToken;

/// Produces the payload for a given sequence number.
pub trait PayloadSource {
    fn generate(&mut self, token: SlotToken) -> Vec<u8>;
}

/// Receives each consumed payload, in retrieval order.
pub trait PayloadSink {
    fn deliver(&mut self, token: SlotToken, payload: &[u8]);
}

impl<F> PayloadSource for F
where
    F: FnMut(SlotToken) -> Vec<u8>,
{
    fn generate(&mut self, token: SlotToken) -> Vec<u8> {
        self(token)
    }
}

/// Collects every delivery; handy in tests.
impl PayloadSink for Vec<(SlotToken, Vec<u8>)> {
    fn deliver(&mut self, token: SlotToken, payload: &[u8]) {
        self.push((token, payload.to_vec()));
    }
}

const FIRST_NAMES: &[&str] = &[
    "Sipho", "Thandi", "Bongani", "Nomsa", "Mandla", "Zanele", "Sifiso", "Precious", "Lungelo",
    "Nokuthula",
];
const LAST_NAMES: &[&str] = &[
    "Dlamini", "Nkosi", "Mamba", "Simelane", "Mnisi", "Zwane", "Shongwe", "Magagula", "Fakudze",
    "Ndlovu",
];
const PROGRAMMES: &[&str] = &[
    "BSc Computer Science",
    "BSc Information Technology",
    "BSc Software Engineering",
    "BSc Data Science",
];
const COURSES: &[&str] = &[
    "Programming I",
    "Data Structures",
    "Database Systems",
    "Web Development",
    "Computer Networks",
    "Software Engineering",
    "Operating Systems",
    "Artificial Intelligence",
];

/// Average mark needed to pass.
pub const PASS_MARK: f64 = 50.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    #[error("malformed student XML: {0}")]
    Xml(String),
    #[error("checksum mismatch")]
    ChecksumMismatch,
}

/// One course entry: `<course><course_name>..</course_name><mark>..</mark></course>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_name: String,
    pub mark: u8,
}

impl Course {
    pub fn new(course_name: impl Into<String>, mark: u8) -> Self {
        Self {
            course_name: course_name.into(),
            mark,
        }
    }
}

/// A synthetic student record used as demo payload, carried as XML:
///
/// ```text
/// <student checksum="..">
///   <name>..</name><student_id>..</student_id><programme>..</programme>
///   <courses><course><course_name>..</course_name><mark>..</mark></course>..</courses>
/// </student>
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "student")]
pub struct StudentRecord {
    /// SHA-256 of the record's XML without this attribute. Written by
    /// [`encode`](Self::encode); verified and cleared by [`decode`](Self::decode).
    /// Records without it are accepted unverified.
    #[serde(rename = "@checksum", default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub name: String,
    /// 8-digit identifier.
    pub student_id: String,
    pub programme: String,
    /// Marks are 30..=100 for generated records, in generation order.
    #[serde(with = "course_list")]
    pub courses: Vec<Course>,
}

/// `Vec<Course>` as a `<courses>` element wrapping repeated `<course>` children.
mod course_list {
    use super::Course;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct CoursesRef<'a> {
        course: &'a [Course],
    }

    #[derive(Deserialize)]
    struct Courses {
        #[serde(default)]
        course: Vec<Course>,
    }

    pub fn serialize<S: Serializer>(courses: &[Course], serializer: S) -> Result<S::Ok, S::Error> {
        CoursesRef { course: courses }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Course>, D::Error> {
        Ok(Courses::deserialize(deserializer)?.course)
    }
}

impl StudentRecord {
    pub fn new(
        name: impl Into<String>,
        student_id: impl Into<String>,
        programme: impl Into<String>,
        courses: Vec<Course>,
    ) -> Self {
        Self {
            checksum: None,
            name: name.into(),
            student_id: student_id.into(),
            programme: programme.into(),
            courses,
        }
    }

    /// Random record: 4-6 distinct courses with marks between 30 and 100.
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        let name = format!(
            "{} {}",
            FIRST_NAMES[rng.usize(..FIRST_NAMES.len())],
            LAST_NAMES[rng.usize(..LAST_NAMES.len())]
        );
        let student_id = rng.u32(10_000_000..=99_999_999).to_string();
        let programme = PROGRAMMES[rng.usize(..PROGRAMMES.len())];

        let mut pool: Vec<&str> = COURSES.to_vec();
        rng.shuffle(&mut pool);
        let count = rng.usize(4..=6);
        let courses = pool
            .into_iter()
            .take(count)
            .map(|course| Course::new(course, rng.u8(30..=100)))
            .collect();

        Self::new(name, student_id, programme, courses)
    }

    pub fn average(&self) -> f64 {
        if self.courses.is_empty() {
            return 0.0;
        }
        let total: u32 = self.courses.iter().map(|c| u32::from(c.mark)).sum();
        f64::from(total) / self.courses.len() as f64
    }

    pub fn passed(&self) -> bool {
        self.average() >= PASS_MARK
    }

    /// XML of this record with no checksum attribute.
    fn unsigned_xml(&self) -> Result<String, RecordError> {
        let unsigned = Self {
            checksum: None,
            ..self.clone()
        };
        quick_xml::se::to_string(&unsigned).map_err(|e| RecordError::Xml(e.to_string()))
    }

    /// Serialize to XML with a SHA-256 `checksum` attribute over the unsigned form.
    pub fn encode(&self) -> Result<String, RecordError> {
        let checksum = format!("{:x}", Sha256::digest(self.unsigned_xml()?.as_bytes()));
        let signed = Self {
            checksum: Some(checksum),
            ..self.clone()
        };
        quick_xml::se::to_string(&signed).map_err(|e| RecordError::Xml(e.to_string()))
    }

    /// Parse a `<student>` document, verifying its checksum when one is present.
    pub fn decode(payload: &[u8]) -> Result<Self, RecordError> {
        let text = std::str::from_utf8(payload).map_err(|_| RecordError::NotUtf8)?;
        let mut record: Self =
            quick_xml::de::from_str(text).map_err(|e| RecordError::Xml(e.to_string()))?;

        if let Some(expected) = record.checksum.take() {
            let actual = format!("{:x}", Sha256::digest(record.unsigned_xml()?.as_bytes()));
            if actual != expected {
                return Err(RecordError::ChecksumMismatch);
            }
        }
        Ok(record)
    }

    /// Human-readable report block.
    pub fn render_report(&self) -> String {
        let rule = "=".repeat(60);
        let thin = "-".repeat(60);
        let mut out = format!(
            "{rule}\nStudent Name: {}\nStudent ID: {}\nProgramme: {}\n\nCourses and Marks:\n{thin}\n",
            self.name, self.student_id, self.programme
        );
        for course in &self.courses {
            out.push_str(&format!("  {:<30} {:>3}\n", course.course_name, course.mark));
        }
        out.push_str(&format!(
            "{thin}\nAverage Mark: {:.2}\nStatus: {}\n{rule}\n",
            self.average(),
            if self.passed() { "PASS" } else { "FAIL" }
        ));
        out
    }
}

/// Generates a fresh random [`StudentRecord`] per token.
pub struct StudentSource {
    rng: fastrand::Rng,
}

impl StudentSource {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Deterministic output for a given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for StudentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadSource for StudentSource {
    fn generate(&mut self, token: SlotToken) -> Vec<u8> {
        match StudentRecord::random(&mut self.rng).encode() {
            Ok(xml) => xml.into_bytes(),
            Err(e) => {
                warn!(token, error = %e, "failed to encode student record");
                Vec::new()
            }
        }
    }
}

/// Decodes each payload as a [`StudentRecord`] and prints its report.
#[derive(Debug, Default)]
pub struct ReportSink {
    quiet: bool,
    /// Records decoded and verified.
    pub accepted: Vec<SlotToken>,
    /// Payloads that failed to decode or verify.
    pub rejected: Vec<SlotToken>,
}

impl ReportSink {
    /// Prints every report to stdout.
    pub fn stdout() -> Self {
        Self::default()
    }

    /// Verifies without printing.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }
}

impl PayloadSink for ReportSink {
    fn deliver(&mut self, token: SlotToken, payload: &[u8]) {
        match StudentRecord::decode(payload) {
            Ok(record) => {
                if !self.quiet {
                    println!("\nstudent{token}\n{}", record.render_report());
                }
                self.accepted.push(token);
            }
            Err(e) => {
                warn!(token, error = %e, "rejected payload");
                self.rejected.push(token);
            }
        }
    }
}
