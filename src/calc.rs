use crate::model::{Group, StudentId};
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;

/// Rounds to 2 decimals with exact halves going to the even neighbour, so a
/// mean of 4.625 displays as 4.62 and 2.875 as 2.88.
pub fn round_off_2_decimals(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

pub fn mean<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut count: usize = 0;
    let mut sum: f64 = 0.0;
    for v in values {
        count += 1;
        sum += *v;
    }
    (count > 0).then(|| sum / (count as f64))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeEntry {
    pub date: String,
    pub grade: f64,
}

/// Subjects appear in the order of the first lesson that graded the student.
pub type SubjectGrades = IndexMap<String, Vec<GradeEntry>>;

/// Every grade the student received, grouped by lesson subject, in lesson
/// order then in-lesson order. Lessons saved without a subject group under "".
pub fn student_history(group: &Group, student_id: &str) -> SubjectGrades {
    let mut out = SubjectGrades::new();
    for lesson in &group.lessons {
        let Some(grades) = lesson.grades.get(student_id) else {
            continue;
        };
        let subject = lesson.subject.clone().unwrap_or_default();
        let entries = out.entry(subject).or_default();
        entries.extend(grades.iter().map(|g| GradeEntry {
            date: lesson.date.clone(),
            grade: *g,
        }));
    }
    out
}

pub fn subject_averages(history: &SubjectGrades) -> IndexMap<String, f64> {
    history
        .iter()
        .filter_map(|(subject, entries)| {
            mean(entries.iter().map(|e| &e.grade))
                .map(|avg| (subject.clone(), round_off_2_decimals(avg)))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Excellent,
    Good,
    Satisfactory,
    Poor,
}

impl Tier {
    pub fn from_average(avg: f64) -> Tier {
        if avg >= 4.5 {
            Tier::Excellent
        } else if avg >= 3.5 {
            Tier::Good
        } else if avg >= 2.5 {
            Tier::Satisfactory
        } else {
            Tier::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub excellent: usize,
    pub good: usize,
    pub satisfactory: usize,
    pub poor: usize,
}

impl TierCounts {
    fn add(&mut self, tier: Tier) {
        match tier {
            Tier::Excellent => self.excellent += 1,
            Tier::Good => self.good += 1,
            Tier::Satisfactory => self.satisfactory += 1,
            Tier::Poor => self.poor += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.excellent + self.good + self.satisfactory + self.poor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAverage {
    pub student_id: StudentId,
    pub name: String,
    pub average: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStatistics {
    /// Enrolled students, graded or not.
    pub students_count: usize,
    /// Students with at least one grade; equals `tiers.total()`.
    pub graded_count: usize,
    pub lessons_count: usize,
    pub ranked_averages: Vec<StudentAverage>,
    pub tiers: TierCounts,
}

pub fn group_statistics(group: &Group) -> GroupStatistics {
    let mut ranked: Vec<StudentAverage> = Vec::new();
    for (id, student) in &group.students {
        let key = id.to_string();
        let all = group
            .lessons
            .iter()
            .filter_map(|l| l.grades.get(&key))
            .flatten();
        let Some(avg) = mean(all) else {
            continue;
        };
        let average = round_off_2_decimals(avg);
        ranked.push(StudentAverage {
            student_id: *id,
            name: student.name.clone(),
            average,
            tier: Tier::from_average(average),
        });
    }

    // Stable: equal averages keep ascending id order.
    ranked.sort_by(|a, b| {
        b.average
            .partial_cmp(&a.average)
            .unwrap_or(Ordering::Equal)
    });

    let mut tiers = TierCounts::default();
    for s in &ranked {
        tiers.add(s.tier);
    }

    GroupStatistics {
        students_count: group.students.len(),
        graded_count: ranked.len(),
        lessons_count: group.lessons.len(),
        ranked_averages: ranked,
        tiers,
    }
}
