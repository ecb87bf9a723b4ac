use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Reset,
    Successful,
    Failure,
}

impl TaskStatus {
    pub fn is_resolved(self) -> bool {
        !matches!(self, TaskStatus::Reset)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("task {0:?} does not exist")]
    UnknownTask(TaskId),
    #[error("task '{0}' has subtasks and can only succeed through them")]
    InternalTaskSucceeded(String),
    #[error("task '{name}' is already resolved as {status:?}")]
    AlreadyResolved { name: String, status: TaskStatus },
    #[error("task '{0}' was given an empty subtask partition")]
    EmptyPartition(String),
    #[error("task '{0}' was given no subtask partitions")]
    NoPartitions(String),
    #[error("task '{child}' already belongs to '{parent}'")]
    AlreadyParented { child: String, parent: String },
}

/// Status broadcast, emitted only after the parent has validated the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskEvent {
    pub task: TaskId,
    pub status: TaskStatus,
}

#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    description: String,
    status: TaskStatus,
    optional: bool,
    partitions: Vec<Vec<TaskId>>,
    parent: Option<TaskId>,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_leaf(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn partitions(&self) -> &[Vec<TaskId>] {
        &self.partitions
    }

    pub fn parent(&self) -> Option<TaskId> {
        self.parent
    }
}

/// Arena of procedure tasks.
///
/// Leaves are resolved by the caller; composite tasks resolve only through
/// their subtasks. Within a partition subtasks must succeed in order, the
/// partitions themselves may complete in any order. Status changes are
/// queued as [`TaskEvent`]s: a subtask's event always precedes the event
/// of the parent it caused to resolve.
#[derive(Debug, Default)]
pub struct TaskTree {
    tasks: Vec<Task>,
    events: Vec<TaskEvent>,
}

impl TaskTree {
    pub fn add_leaf(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        optional: bool,
    ) -> TaskId {
        self.push(Task {
            name: name.into(),
            description: description.into(),
            status: TaskStatus::Reset,
            optional,
            partitions: Vec::new(),
            parent: None,
        })
    }

    pub fn add_composite(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        partitions: Vec<Vec<TaskId>>,
    ) -> Result<TaskId, TaskError> {
        let name = name.into();
        if partitions.is_empty() {
            return Err(TaskError::NoPartitions(name));
        }
        for partition in &partitions {
            if partition.is_empty() {
                return Err(TaskError::EmptyPartition(name));
            }
            for &child in partition {
                if let Some(parent) = self.task(child)?.parent {
                    return Err(TaskError::AlreadyParented {
                        child: self.task(child)?.name.clone(),
                        parent: self.task(parent)?.name.clone(),
                    });
                }
            }
        }
        let mut seen = Vec::new();
        for &child in partitions.iter().flatten() {
            if seen.contains(&child) {
                return Err(TaskError::AlreadyParented {
                    child: self.task(child)?.name.clone(),
                    parent: name,
                });
            }
            seen.push(child);
        }

        let id = self.push(Task {
            name,
            description: description.into(),
            status: TaskStatus::Reset,
            optional: false,
            partitions,
            parent: None,
        });
        for child in seen {
            self.tasks[child.0].parent = Some(id);
        }
        Ok(id)
    }

    fn push(&mut self, task: Task) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.tasks.push(task);
        id
    }

    pub fn task(&self, id: TaskId) -> Result<&Task, TaskError> {
        self.tasks.get(id.0).ok_or(TaskError::UnknownTask(id))
    }

    pub fn status(&self, id: TaskId) -> Result<TaskStatus, TaskError> {
        self.task(id).map(Task::status)
    }

    pub fn find(&self, name: &str) -> Option<TaskId> {
        self.tasks
            .iter()
            .position(|task| task.name == name)
            .map(TaskId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(index, task)| (TaskId(index), task))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn pending_events(&self) -> &[TaskEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<TaskEvent> {
        std::mem::take(&mut self.events)
    }

    /// Marks a leaf as done. Returns the status actually recorded, which is
    /// `Failure` when the leaf completed ahead of its predecessor.
    pub fn succeed(&mut self, id: TaskId) -> Result<TaskStatus, TaskError> {
        let task = self.task(id)?;
        if !task.is_leaf() {
            return Err(TaskError::InternalTaskSucceeded(task.name.clone()));
        }
        self.ensure_unresolved(id)?;
        self.resolve(id, TaskStatus::Successful)
    }

    pub fn fail(&mut self, id: TaskId) -> Result<TaskStatus, TaskError> {
        self.ensure_unresolved(id)?;
        self.resolve(id, TaskStatus::Failure)
    }

    /// Resets `id` and everything below it, children first.
    pub fn reset(&mut self, id: TaskId) -> Result<(), TaskError> {
        let children: Vec<TaskId> = self.task(id)?.partitions.iter().flatten().copied().collect();
        for child in children {
            self.reset(child)?;
        }
        self.tasks[id.0].status = TaskStatus::Reset;
        self.events.push(TaskEvent {
            task: id,
            status: TaskStatus::Reset,
        });
        Ok(())
    }

    fn ensure_unresolved(&self, id: TaskId) -> Result<(), TaskError> {
        let task = self.task(id)?;
        if task.status.is_resolved() {
            return Err(TaskError::AlreadyResolved {
                name: task.name.clone(),
                status: task.status,
            });
        }
        Ok(())
    }

    fn resolve(&mut self, id: TaskId, candidate: TaskStatus) -> Result<TaskStatus, TaskError> {
        let status = match self.task(id)?.parent {
            Some(parent) => self.validate(parent, id, candidate)?,
            None => candidate,
        };
        self.tasks[id.0].status = status;
        self.events.push(TaskEvent { task: id, status });
        debug!(task = %self.tasks[id.0].name, ?status, "task_resolved");

        let (parent, optional) = (self.tasks[id.0].parent, self.tasks[id.0].optional);
        let Some(parent) = parent else {
            return Ok(status);
        };
        if self.tasks[parent.0].status.is_resolved() {
            return Ok(status);
        }
        match status {
            TaskStatus::Failure if !optional => {
                self.resolve(parent, TaskStatus::Failure)?;
            }
            TaskStatus::Successful if self.all_partitions_complete(parent) => {
                self.resolve(parent, TaskStatus::Successful)?;
            }
            _ => {}
        }
        Ok(status)
    }

    /// Parent-side check run before a subtask's status becomes visible.
    fn validate(
        &self,
        parent: TaskId,
        child: TaskId,
        candidate: TaskStatus,
    ) -> Result<TaskStatus, TaskError> {
        if candidate != TaskStatus::Successful {
            return Ok(candidate);
        }
        let parent_task = self.task(parent)?;
        for partition in &parent_task.partitions {
            let Some(index) = partition.iter().position(|&member| member == child) else {
                continue;
            };
            if index > 0 && self.status(partition[index - 1])? != TaskStatus::Successful {
                debug!(
                    task = %self.tasks[child.0].name,
                    parent = %parent_task.name,
                    "task_out_of_order"
                );
                return Ok(TaskStatus::Failure);
            }
        }
        Ok(TaskStatus::Successful)
    }

    fn all_partitions_complete(&self, id: TaskId) -> bool {
        self.tasks[id.0].partitions.iter().all(|partition| {
            partition
                .last()
                .is_some_and(|last| self.tasks[last.0].status == TaskStatus::Successful)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered_pair() -> (TaskTree, TaskId, TaskId, TaskId) {
        let mut tree = TaskTree::default();
        let first = tree.add_leaf("t1", "first step", false);
        let second = tree.add_leaf("t2", "second step", false);
        let parent = tree
            .add_composite("SOP", "procedure", vec![vec![first, second]])
            .expect("composite");
        (tree, first, second, parent)
    }

    #[test]
    fn resolved_task_cannot_be_resolved_again() {
        let (mut tree, first, _, _) = ordered_pair();
        assert_eq!(tree.succeed(first), Ok(TaskStatus::Successful));
        assert!(matches!(
            tree.succeed(first),
            Err(TaskError::AlreadyResolved {
                status: TaskStatus::Successful,
                ..
            })
        ));
        assert!(matches!(
            tree.fail(first),
            Err(TaskError::AlreadyResolved { .. })
        ));
    }

    #[test]
    fn composite_task_cannot_be_succeeded_directly() {
        let (mut tree, _, _, parent) = ordered_pair();
        assert_eq!(
            tree.succeed(parent),
            Err(TaskError::InternalTaskSucceeded("SOP".to_string()))
        );
        assert_eq!(tree.status(parent), Ok(TaskStatus::Reset));
    }

    #[test]
    fn out_of_order_success_is_recorded_as_failure() {
        let (mut tree, first, second, parent) = ordered_pair();
        assert_eq!(tree.succeed(second), Ok(TaskStatus::Failure));
        assert_eq!(tree.status(second), Ok(TaskStatus::Failure));
        assert_eq!(tree.status(parent), Ok(TaskStatus::Failure));
        assert_eq!(tree.status(first), Ok(TaskStatus::Reset));

        // Observers never see the rejected success.
        let events = tree.drain_events();
        assert_eq!(
            events,
            vec![
                TaskEvent {
                    task: second,
                    status: TaskStatus::Failure
                },
                TaskEvent {
                    task: parent,
                    status: TaskStatus::Failure
                },
            ]
        );
    }

    #[test]
    fn in_order_success_resolves_parent_once_after_last_subtask() {
        let (mut tree, first, second, parent) = ordered_pair();
        tree.succeed(first).expect("first");
        assert_eq!(tree.status(parent), Ok(TaskStatus::Reset));
        tree.succeed(second).expect("second");

        let events = tree.drain_events();
        assert_eq!(
            events,
            vec![
                TaskEvent {
                    task: first,
                    status: TaskStatus::Successful
                },
                TaskEvent {
                    task: second,
                    status: TaskStatus::Successful
                },
                TaskEvent {
                    task: parent,
                    status: TaskStatus::Successful
                },
            ]
        );
    }

    #[test]
    fn partitions_complete_in_any_order() {
        let mut tree = TaskTree::default();
        let a1 = tree.add_leaf("a1", "", false);
        let a2 = tree.add_leaf("a2", "", false);
        let b1 = tree.add_leaf("b1", "", false);
        let root = tree
            .add_composite("SOP", "", vec![vec![a1, a2], vec![b1]])
            .expect("composite");

        tree.succeed(a1).expect("a1");
        tree.succeed(b1).expect("b1");
        assert_eq!(tree.status(root), Ok(TaskStatus::Reset));
        tree.succeed(a2).expect("a2");
        assert_eq!(tree.status(root), Ok(TaskStatus::Successful));
    }

    #[test]
    fn optional_failure_does_not_cascade() {
        let mut tree = TaskTree::default();
        let extra = tree.add_leaf("extra", "", true);
        let required = tree.add_leaf("required", "", false);
        let root = tree
            .add_composite("SOP", "", vec![vec![extra], vec![required]])
            .expect("composite");

        tree.fail(extra).expect("fail");
        assert_eq!(tree.status(root), Ok(TaskStatus::Reset));
        tree.fail(required).expect("fail");
        assert_eq!(tree.status(root), Ok(TaskStatus::Failure));
    }

    #[test]
    fn nested_success_is_validated_by_grandparent() {
        let mut tree = TaskTree::default();
        let first = tree.add_leaf("first", "", false);
        let inner_leaf = tree.add_leaf("inner_leaf", "", false);
        let inner = tree
            .add_composite("inner", "", vec![vec![inner_leaf]])
            .expect("inner");
        let root = tree
            .add_composite("SOP", "", vec![vec![first, inner]])
            .expect("root");

        tree.succeed(inner_leaf).expect("leaf");
        assert_eq!(tree.status(inner), Ok(TaskStatus::Failure));
        assert_eq!(tree.status(root), Ok(TaskStatus::Failure));
    }

    #[test]
    fn reset_restores_every_descendant() {
        let (mut tree, first, second, parent) = ordered_pair();
        tree.succeed(second).expect("second");
        tree.drain_events();

        tree.reset(parent).expect("reset");
        for id in [first, second, parent] {
            assert_eq!(tree.status(id), Ok(TaskStatus::Reset));
        }
        let events = tree.drain_events();
        assert_eq!(events.len(), 3);
        assert_eq!(events.last().map(|event| event.task), Some(parent));

        tree.succeed(first).expect("first");
        tree.succeed(second).expect("second");
        assert_eq!(tree.status(parent), Ok(TaskStatus::Successful));
    }

    #[test]
    fn malformed_composites_are_rejected() {
        let mut tree = TaskTree::default();
        let leaf = tree.add_leaf("leaf", "", false);
        assert_eq!(
            tree.add_composite("empty", "", vec![vec![]]),
            Err(TaskError::EmptyPartition("empty".to_string()))
        );
        assert_eq!(
            tree.add_composite("none", "", Vec::new()),
            Err(TaskError::NoPartitions("none".to_string()))
        );
        tree.add_composite("owner", "", vec![vec![leaf]]).expect("owner");
        assert!(matches!(
            tree.add_composite("thief", "", vec![vec![leaf]]),
            Err(TaskError::AlreadyParented { .. })
        ));
        assert_eq!(
            tree.succeed(TaskId(42)),
            Err(TaskError::UnknownTask(TaskId(42)))
        );
    }
}
