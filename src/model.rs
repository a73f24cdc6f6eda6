use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";
pub const DATE_FORMAT: &str = "%d.%m.%Y";

pub const MIN_GRADE: f64 = 2.0;
pub const MAX_GRADE: f64 = 5.0;

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

pub fn is_valid_grade(grade: f64) -> bool {
    (MIN_GRADE..=MAX_GRADE).contains(&grade)
}

/// Positive integer student key. Stored as a decimal string so it can be a
/// JSON object key; ordering is numeric, which matches assignment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StudentId(u64);

impl StudentId {
    pub const FIRST: StudentId = StudentId(1);

    pub fn new(raw: u64) -> Option<Self> {
        (raw > 0).then_some(StudentId(raw))
    }

    #[cfg(test)]
    pub fn get(self) -> u64 {
        self.0
    }

    /// `None` once the id space is exhausted.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(StudentId)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StudentId {
    type Err = String;

    /// Only the canonical decimal form is an id: `"01"` and `"+2"` are not
    /// the same key as `"1"` and `"2"` in the backing file.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s
            .parse()
            .map_err(|_| format!("student id must be a positive integer, got {s:?}"))?;
        let id =
            StudentId::new(raw).ok_or_else(|| format!("student id must be positive, got {s:?}"))?;
        if id.to_string() != s {
            return Err(format!(
                "student id must be written without sign or leading zeros, got {s:?}"
            ));
        }
        Ok(id)
    }
}

impl Serialize for StudentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StudentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub date_added: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub date: String,
    /// `null` when the lesson form had no subject to pick.
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub homework: Option<String>,
    /// Keyed by raw student id string; keys may dangle after a student is removed.
    #[serde(default)]
    pub grades: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub students: BTreeMap<StudentId, Student>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    pub created: String,
}

impl Group {
    pub fn new() -> Self {
        Group {
            subjects: Vec::new(),
            students: BTreeMap::new(),
            lessons: Vec::new(),
            created: now_timestamp(),
        }
    }

    /// Looks a student up by the raw id string used in requests and grade maps.
    pub fn student(&self, raw_id: &str) -> Option<(StudentId, &Student)> {
        let id: StudentId = raw_id.parse().ok()?;
        self.students.get(&id).map(|s| (id, s))
    }

    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for subject in &self.subjects {
            if !seen.insert(subject.as_str()) {
                return Err(format!("duplicate subject {subject:?}"));
            }
        }
        for (idx, lesson) in self.lessons.iter().enumerate() {
            for (student_id, grades) in &lesson.grades {
                if let Some(bad) = grades.iter().find(|g| !is_valid_grade(**g)) {
                    return Err(format!(
                        "lesson #{idx} has out-of-range grade {bad} for student {student_id}"
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

/// The whole backing file: group name -> group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    pub groups: BTreeMap<String, Group>,
}

impl Dataset {
    pub fn validate(&self) -> Result<(), String> {
        for (name, group) in &self.groups {
            group
                .validate()
                .map_err(|msg| format!("group {name:?}: {msg}"))?;
        }
        Ok(())
    }
}
