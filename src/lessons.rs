use crate::model::{is_valid_grade, today, Group, Lesson, DATE_FORMAT};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Raw lesson form. `grades` maps a student id to the free-form text typed
/// into that student's grade box, e.g. `"5 4,5 3"`.
#[derive(Debug, Clone, Default)]
pub struct LessonInput {
    pub subject: Option<String>,
    pub date: Option<String>,
    pub topic: Option<String>,
    pub homework: Option<String>,
    pub grades: BTreeMap<String, String>,
}

/// Splits on whitespace, accepts `,` as the decimal separator and keeps only
/// numbers in [2, 5]. Anything else is dropped without an error.
pub fn parse_grades(raw: &str) -> Vec<f64> {
    raw.split_whitespace()
        .filter_map(|token| token.replace(',', ".").parse::<f64>().ok())
        .filter(|grade| is_valid_grade(*grade))
        .collect()
}

/// Appends a lesson to the group. Neither the subject nor the grade keys are
/// checked against the group's registered subjects and students.
pub fn record_lesson(group: &mut Group, input: LessonInput) -> &Lesson {
    let date = input
        .date
        .filter(|d| !d.is_empty())
        .unwrap_or_else(today);

    let grades: BTreeMap<String, Vec<f64>> = input
        .grades
        .into_iter()
        .filter_map(|(student_id, raw)| {
            let parsed = parse_grades(&raw);
            (!parsed.is_empty()).then_some((student_id, parsed))
        })
        .collect();

    group.lessons.push(Lesson {
        date,
        subject: input.subject,
        topic: input.topic,
        homework: input.homework,
        grades,
    });
    &group.lessons[group.lessons.len() - 1]
}

/// Lesson dates are free text; `dd.mm.yyyy` is what the form produces, and
/// browsers' date inputs send `yyyy-mm-dd`.
pub fn parse_lesson_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn newest_first(a: &Lesson, b: &Lesson) -> Ordering {
    match (parse_lesson_date(&a.date), parse_lesson_date(&b.date)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Lessons newest first; unparseable dates go last, ties keep append order.
pub fn journal(group: &Group) -> Vec<&Lesson> {
    let mut lessons: Vec<&Lesson> = group.lessons.iter().collect();
    lessons.sort_by(|a, b| newest_first(a, b));
    lessons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(subject: &str, date: &str, grades: &[(&str, &str)]) -> LessonInput {
        LessonInput {
            subject: Some(subject.into()),
            date: Some(date.into()),
            topic: Some("Topic".into()),
            homework: None,
            grades: grades
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn grade_tokens_are_filtered_permissively() {
        assert_eq!(parse_grades("5 2,5 6 abc 3"), vec![5.0, 2.5, 3.0]);
        assert_eq!(parse_grades("  4\t4.5\n"), vec![4.0, 4.5]);
        assert_eq!(parse_grades("1.9 5.01 nan inf 2,5,5"), Vec::<f64>::new());
        assert_eq!(parse_grades("2 5"), vec![2.0, 5.0]);
    }

    #[test]
    fn students_without_valid_grades_are_omitted() {
        let mut g = Group::new();
        let lesson = record_lesson(
            &mut g,
            input("Math", "01.09.2024", &[("1", "5 2,5 6 abc 3"), ("2", "7 x"), ("3", "   ")]),
        );
        assert_eq!(lesson.grades.get("1"), Some(&vec![5.0, 2.5, 3.0]));
        assert!(!lesson.grades.contains_key("2"));
        assert!(!lesson.grades.contains_key("3"));
        assert_eq!(g.lessons.len(), 1);
    }

    #[test]
    fn missing_or_empty_date_defaults_to_today() {
        let mut g = Group::new();
        let mut raw = input("Math", "", &[]);
        assert_eq!(record_lesson(&mut g, raw.clone()).date, today());
        raw.date = None;
        assert_eq!(record_lesson(&mut g, raw).date, today());
    }

    #[test]
    fn unregistered_subject_and_unknown_students_are_accepted() {
        let mut g = Group::new();
        let lesson = record_lesson(&mut g, input("Astronomy", "01.09.2024", &[("42", "4")]));
        assert_eq!(lesson.subject.as_deref(), Some("Astronomy"));
        assert_eq!(lesson.grades.get("42"), Some(&vec![4.0]));
        assert!(g.subjects.is_empty());
    }

    #[test]
    fn lesson_without_subject_is_kept() {
        let mut g = Group::new();
        let mut raw = input("", "01.09.2024", &[("1", "5")]);
        raw.subject = None;
        let lesson = record_lesson(&mut g, raw);
        assert_eq!(lesson.subject, None);
        assert_eq!(lesson.grades.get("1"), Some(&vec![5.0]));
    }

    #[test]
    fn lessons_append_without_dedup() {
        let mut g = Group::new();
        record_lesson(&mut g, input("Math", "01.09.2024", &[]));
        record_lesson(&mut g, input("Math", "01.09.2024", &[]));
        assert_eq!(g.lessons.len(), 2);
    }

    #[test]
    fn journal_is_chronological_newest_first() {
        let mut g = Group::new();
        record_lesson(&mut g, input("A", "05.09.2024", &[]));
        record_lesson(&mut g, input("B", "someday", &[]));
        record_lesson(&mut g, input("C", "30.08.2024", &[]));
        record_lesson(&mut g, input("D", "2024-09-10", &[]));
        record_lesson(&mut g, input("E", "05.09.2024", &[]));

        let order: Vec<&str> = journal(&g)
            .iter()
            .map(|l| l.subject.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(order, vec!["D", "A", "E", "C", "B"]);
    }
}
