use crate::error::{GradebookError, Result};
use crate::model::{now_timestamp, Dataset, Group, Student, StudentId};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub name: String,
    pub created: String,
    pub subject_count: usize,
    pub student_count: usize,
    pub lesson_count: usize,
}

pub fn summaries(dataset: &Dataset) -> Vec<GroupSummary> {
    dataset
        .groups
        .iter()
        .map(|(name, g)| GroupSummary {
            name: name.clone(),
            created: g.created.clone(),
            subject_count: g.subjects.len(),
            student_count: g.students.len(),
            lesson_count: g.lessons.len(),
        })
        .collect()
}

pub fn group<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Group> {
    dataset
        .groups
        .get(name)
        .ok_or_else(|| GradebookError::group_not_found(name))
}

pub fn group_mut<'a>(dataset: &'a mut Dataset, name: &str) -> Result<&'a mut Group> {
    dataset
        .groups
        .get_mut(name)
        .ok_or_else(|| GradebookError::group_not_found(name))
}

pub fn create_group<'a>(dataset: &'a mut Dataset, name: &str) -> Result<&'a Group> {
    if name.is_empty() {
        return Err(GradebookError::DuplicateName(
            "group name must not be empty".into(),
        ));
    }
    if dataset.groups.contains_key(name) {
        return Err(GradebookError::DuplicateName(format!(
            "group already exists: {name}"
        )));
    }
    let created: &Group = dataset
        .groups
        .entry(name.to_string())
        .or_insert_with(Group::new);
    Ok(created)
}

/// Removes the group with all of its students and lessons.
pub fn delete_group(dataset: &mut Dataset, name: &str) -> Result<Group> {
    dataset
        .groups
        .remove(name)
        .ok_or_else(|| GradebookError::group_not_found(name))
}

/// Returns false when the subject is empty or already registered.
pub fn add_subject(group: &mut Group, subject: &str) -> bool {
    if subject.is_empty() || group.subjects.iter().any(|s| s == subject) {
        return false;
    }
    group.subjects.push(subject.to_string());
    true
}

/// Lessons that reference the subject are kept as they are.
pub fn remove_subject(group: &mut Group, subject: &str) -> bool {
    let before = group.subjects.len();
    group.subjects.retain(|s| s != subject);
    group.subjects.len() != before
}

/// `max + 1`, or `None` when the largest id is already `u64::MAX`.
pub fn next_student_id(group: &Group) -> Option<StudentId> {
    match group.students.keys().next_back() {
        Some(last) => last.next(),
        None => Some(StudentId::FIRST),
    }
}

/// `None` when the name is empty or no id is left; the group is unchanged.
pub fn add_student(group: &mut Group, name: &str) -> Option<StudentId> {
    if name.is_empty() {
        return None;
    }
    let id = next_student_id(group)?;
    group.students.insert(
        id,
        Student {
            name: name.to_string(),
            date_added: now_timestamp(),
        },
    );
    Some(id)
}

/// Grade records for the removed id stay in the lesson history. Ids match
/// exactly, so `"01"` never removes student `1`.
pub fn remove_student(group: &mut Group, raw_id: &str) -> Option<Student> {
    let id: StudentId = raw_id.parse().ok()?;
    group.students.remove(&id)
}
