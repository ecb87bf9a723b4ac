use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::tree::{TaskError, TaskId, TaskTree};

pub const ROOT_TASK_NAME: &str = "SOP";
const ROOT_TASK_DESCRIPTION: &str = "Standard operating procedure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Pour,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskLogic {
    pub task_type: TaskType,
    /// Names of tasks that must be completed, in order, before this one.
    #[serde(default)]
    pub subtasks: Vec<String>,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskListEntry {
    pub task_name: String,
    pub text: String,
    pub logic: TaskLogic,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Error)]
pub enum TaskConfigError {
    #[error("read task list '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse task list at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("task list is empty")]
    EmptyList,
    #[error("tasks[{index}].{field} must not be empty")]
    EmptyField { index: usize, field: &'static str },
    #[error("task name '{0}' is declared more than once or is reserved")]
    DuplicateTask(String),
    #[error("task '{task}' requires unknown task '{prerequisite}'")]
    UnknownPrerequisite { task: String, prerequisite: String },
    #[error("task '{0}' depends on itself through its prerequisites")]
    PrerequisiteCycle(String),
    #[error("task '{prerequisite}' is required by both '{first}' and '{second}'")]
    SharedPrerequisite {
        prerequisite: String,
        first: String,
        second: String,
    },
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// A pour leaf and the labelled cylinders it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PourTask {
    pub task: TaskId,
    pub name: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedurePlan {
    pub root: TaskId,
    pub pours: Vec<PourTask>,
}

pub fn load_task_list(path: &Path) -> Result<Vec<TaskListEntry>, TaskConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| TaskConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_task_list(&raw)
}

pub fn parse_task_list(raw: &str) -> Result<Vec<TaskListEntry>, TaskConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, Vec<TaskListEntry>>(&mut deserializer).map_err(
        |error| {
            let path = error.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            TaskConfigError::Parse {
                path,
                source: error.into_inner(),
            }
        },
    )
}

/// Builds the procedure tree under a root named [`ROOT_TASK_NAME`].
///
/// Every task that no other task lists as a prerequisite becomes the tail
/// of its own ordered partition, preceded by its transitive prerequisites
/// (depth first, in declaration order). A prerequisite may belong to only
/// one partition.
pub fn build_procedure(
    entries: &[TaskListEntry],
    tree: &mut TaskTree,
) -> Result<ProcedurePlan, TaskConfigError> {
    if entries.is_empty() {
        return Err(TaskConfigError::EmptyList);
    }

    let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        for (field, value) in [
            ("taskName", &entry.task_name),
            ("logic.from", &entry.logic.from),
            ("logic.to", &entry.logic.to),
        ] {
            if value.trim().is_empty() {
                return Err(TaskConfigError::EmptyField { index, field });
            }
        }
        if entry.task_name == ROOT_TASK_NAME
            || by_name.insert(entry.task_name.as_str(), index).is_some()
        {
            return Err(TaskConfigError::DuplicateTask(entry.task_name.clone()));
        }
    }
    for entry in entries {
        for prerequisite in &entry.logic.subtasks {
            if !by_name.contains_key(prerequisite.as_str()) {
                return Err(TaskConfigError::UnknownPrerequisite {
                    task: entry.task_name.clone(),
                    prerequisite: prerequisite.clone(),
                });
            }
        }
    }

    let mut partitions_by_name: Vec<Vec<usize>> = Vec::new();
    let mut owner: HashMap<usize, usize> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        let is_sink = !entries
            .iter()
            .any(|other| other.logic.subtasks.contains(&entry.task_name));
        if !is_sink {
            continue;
        }
        let mut partition = Vec::new();
        let mut visiting = Vec::new();
        expand_prerequisites(index, entries, &by_name, &mut visiting, &mut partition)?;
        partition.push(index);
        for &member in &partition {
            if let Some(&first_sink) = owner.get(&member) {
                return Err(TaskConfigError::SharedPrerequisite {
                    prerequisite: entries[member].task_name.clone(),
                    first: entries[first_sink].task_name.clone(),
                    second: entry.task_name.clone(),
                });
            }
            owner.insert(member, index);
        }
        partitions_by_name.push(partition);
    }
    // Sinks reach every task not feeding a cycle, so leftovers mean a cycle.
    if let Some(orphan) = (0..entries.len()).find(|index| !owner.contains_key(index)) {
        return Err(TaskConfigError::PrerequisiteCycle(
            entries[orphan].task_name.clone(),
        ));
    }

    let leaves: Vec<TaskId> = entries
        .iter()
        .map(|entry| tree.add_leaf(&entry.task_name, &entry.text, entry.optional))
        .collect();
    let partitions = partitions_by_name
        .iter()
        .map(|partition| partition.iter().map(|&index| leaves[index]).collect())
        .collect();
    let root = tree.add_composite(ROOT_TASK_NAME, ROOT_TASK_DESCRIPTION, partitions)?;

    let pours = entries
        .iter()
        .zip(&leaves)
        .map(|(entry, &task)| match entry.logic.task_type {
            TaskType::Pour => PourTask {
                task,
                name: entry.task_name.clone(),
                from: entry.logic.from.clone(),
                to: entry.logic.to.clone(),
            },
        })
        .collect();

    info!(
        tasks = entries.len(),
        partitions = partitions_by_name.len(),
        "procedure_built"
    );
    Ok(ProcedurePlan { root, pours })
}

fn expand_prerequisites(
    index: usize,
    entries: &[TaskListEntry],
    by_name: &HashMap<&str, usize>,
    visiting: &mut Vec<usize>,
    out: &mut Vec<usize>,
) -> Result<(), TaskConfigError> {
    if visiting.contains(&index) {
        return Err(TaskConfigError::PrerequisiteCycle(
            entries[index].task_name.clone(),
        ));
    }
    visiting.push(index);
    for prerequisite in &entries[index].logic.subtasks {
        let Some(&dependency) = by_name.get(prerequisite.as_str()) else {
            continue;
        };
        expand_prerequisites(dependency, entries, by_name, visiting, out)?;
        if !out.contains(&dependency) {
            out.push(dependency);
        }
    }
    visiting.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::tasks::tree::TaskStatus;

    fn pour(name: &str, from: &str, to: &str, subtasks: &[&str]) -> serde_json::Value {
        json!({
            "taskName": name,
            "text": format!("Pour {from} into {to}"),
            "logic": {
                "taskType": "pour",
                "subtasks": subtasks,
                "from": from,
                "to": to,
            }
        })
    }

    fn entries(value: serde_json::Value) -> Vec<TaskListEntry> {
        parse_task_list(&value.to_string()).expect("parse")
    }

    fn partition_names(tree: &TaskTree, root: TaskId) -> Vec<Vec<String>> {
        tree.task(root)
            .expect("root")
            .partitions()
            .iter()
            .map(|partition| {
                partition
                    .iter()
                    .map(|&id| tree.task(id).expect("task").name().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn prerequisite_chain_becomes_one_ordered_partition() {
        let list = entries(json!([
            pour("pour_b_into_c", "B", "C", &[]),
            pour("pour_c_into_a", "C", "A", &["pour_b_into_c"]),
        ]));
        let mut tree = TaskTree::default();
        let plan = build_procedure(&list, &mut tree).expect("build");

        assert_eq!(
            partition_names(&tree, plan.root),
            vec![vec!["pour_b_into_c".to_string(), "pour_c_into_a".to_string()]]
        );
        assert_eq!(tree.task(plan.root).expect("root").name(), ROOT_TASK_NAME);
        assert_eq!(plan.pours.len(), 2);
        assert_eq!(plan.pours[1].from, "C");
        assert_eq!(tree.status(plan.root), Ok(TaskStatus::Reset));
    }

    #[test]
    fn independent_tasks_get_their_own_partitions() {
        let list = entries(json!([
            pour("first", "A", "B", &[]),
            pour("second", "B", "C", &["first"]),
            pour("side", "C", "A", &[]),
        ]));
        let mut tree = TaskTree::default();
        let plan = build_procedure(&list, &mut tree).expect("build");
        assert_eq!(
            partition_names(&tree, plan.root),
            vec![
                vec!["first".to_string(), "second".to_string()],
                vec!["side".to_string()],
            ]
        );
    }

    #[test]
    fn unknown_prerequisite_is_rejected() {
        let list = entries(json!([pour("only", "A", "B", &["missing"])]));
        let error = build_procedure(&list, &mut TaskTree::default()).expect_err("unknown");
        assert!(matches!(
            error,
            TaskConfigError::UnknownPrerequisite { ref prerequisite, .. } if prerequisite == "missing"
        ));
    }

    #[test]
    fn cycles_and_duplicates_are_rejected() {
        let cycle = entries(json!([
            pour("a", "A", "B", &["b"]),
            pour("b", "B", "C", &["a"]),
            pour("tail", "C", "A", &["a"]),
        ]));
        assert!(matches!(
            build_procedure(&cycle, &mut TaskTree::default()),
            Err(TaskConfigError::PrerequisiteCycle(_))
        ));

        let duplicate = entries(json!([
            pour("same", "A", "B", &[]),
            pour("same", "B", "C", &[]),
        ]));
        assert!(matches!(
            build_procedure(&duplicate, &mut TaskTree::default()),
            Err(TaskConfigError::DuplicateTask(name)) if name == "same"
        ));

        assert!(matches!(
            build_procedure(&[], &mut TaskTree::default()),
            Err(TaskConfigError::EmptyList)
        ));
    }

    #[test]
    fn cycle_beside_a_valid_chain_is_rejected() {
        let list = entries(json!([
            pour("x", "A", "B", &["y"]),
            pour("y", "B", "A", &["x"]),
            pour("z", "C", "A", &[]),
        ]));
        let mut tree = TaskTree::default();
        assert!(matches!(
            build_procedure(&list, &mut tree),
            Err(TaskConfigError::PrerequisiteCycle(name)) if name == "x"
        ));
        assert!(tree.is_empty());
    }

    #[test]
    fn shared_prerequisite_is_rejected() {
        let list = entries(json!([
            pour("base", "A", "B", &[]),
            pour("left", "B", "C", &["base"]),
            pour("right", "C", "A", &["base"]),
        ]));
        assert!(matches!(
            build_procedure(&list, &mut TaskTree::default()),
            Err(TaskConfigError::SharedPrerequisite { .. })
        ));
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = json!([{
            "taskName": "bad",
            "text": "",
            "logic": { "taskType": "stir", "from": "A", "to": "B" }
        }])
        .to_string();
        let error = parse_task_list(&raw).expect_err("bad task type");
        let message = error.to_string();
        assert!(message.contains("[0].logic.taskType"), "{message}");
    }

    #[test]
    fn load_reads_task_list_from_disk() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("tasks.json");
        let list = json!([pour("only", "B", "C", &[])]);
        fs::write(&path, list.to_string()).expect("write");

        let loaded = load_task_list(&path).expect("load");
        assert_eq!(loaded[0].task_name, "only");
        assert!(!loaded[0].optional);

        let missing = load_task_list(&temp.path().join("nope.json")).expect_err("missing");
        assert!(matches!(missing, TaskConfigError::Io { .. }));
    }
}
