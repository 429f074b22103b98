//! The task tree the drag engine reorders.
//!
//! A workspace is the root task plus the set of status names its leaves may
//! carry. Non-leaf tasks have no status of their own; their status is the
//! aggregate of their leaves.

use slotmap::SlotMap;
use thiserror::Error;

use crate::common::collections::HashMap;

slotmap::new_key_type! {
    pub struct TaskId;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task has no parent")]
    NoParent,
    #[error("task would become its own ancestor")]
    WouldCycle,
    #[error("index {0} out of bounds")]
    IndexOutOfBounds(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Changed(TaskId),
}

#[derive(Debug, Clone)]
pub struct Task {
    pub summary: String,
    pub exposition: String,
    /// Index into the workspace status list; `None` for unset. Only
    /// meaningful on leaves.
    pub status: Option<usize>,
    pub collapsed: bool,
    parent: Option<TaskId>,
    children: Vec<TaskId>,
}

impl Task {
    fn new(summary: &str) -> Task {
        Task {
            summary: summary.to_string(),
            exposition: String::new(),
            status: None,
            collapsed: false,
            parent: None,
            children: Vec::new(),
        }
    }
}

type Subscriber = Box<dyn FnMut(&TaskEvent)>;

pub struct TaskTree {
    tasks: SlotMap<TaskId, Task>,
    root: TaskId,
    pub statuses: Vec<String>,
    subscribers: Vec<(u64, Subscriber)>,
    next_subscriber: u64,
}

impl TaskTree {
    pub fn new(workspace_summary: &str) -> TaskTree {
        let mut tasks = SlotMap::default();
        let root = tasks.insert(Task::new(workspace_summary));
        TaskTree {
            tasks,
            root,
            statuses: Vec::new(),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    pub fn root(&self) -> TaskId { self.root }

    pub fn task(&self, id: TaskId) -> &Task { &self.tasks[id] }

    pub fn task_mut(&mut self, id: TaskId) -> &mut Task { &mut self.tasks[id] }

    pub fn parent(&self, id: TaskId) -> Option<TaskId> { self.tasks[id].parent }

    pub fn children(&self, id: TaskId) -> &[TaskId] { &self.tasks[id].children }

    pub fn has_children(&self, id: TaskId) -> bool { !self.tasks[id].children.is_empty() }

    /// Create a task under `parent`. `idx = None` appends.
    pub fn add_task(
        &mut self,
        parent: TaskId,
        idx: Option<usize>,
        summary: &str,
    ) -> Result<TaskId, TaskError> {
        let child = self.tasks.insert(Task::new(summary));
        self.tasks[child].parent = Some(parent);
        let children = &mut self.tasks[parent].children;
        match idx {
            None => children.push(child),
            Some(idx) if idx <= children.len() => children.insert(idx, child),
            Some(idx) => {
                self.tasks.remove(child);
                return Err(TaskError::IndexOutOfBounds(idx));
            }
        }
        Ok(child)
    }

    /// Remove a task. With `replace_with_children` its children take its
    /// place at the same position; otherwise the whole subtree is dropped.
    pub fn remove(&mut self, id: TaskId, replace_with_children: bool) -> Result<(), TaskError> {
        let parent = self.tasks[id].parent.ok_or(TaskError::NoParent)?;
        let idx = self.idx_in_parent(id).ok_or(TaskError::NoParent)?;

        let grandchildren = std::mem::take(&mut self.tasks[id].children);
        self.tasks[parent].children.remove(idx);
        if replace_with_children {
            for (offset, child) in grandchildren.iter().enumerate() {
                self.tasks[*child].parent = Some(parent);
                self.tasks[parent].children.insert(idx + offset, *child);
            }
            self.tasks.remove(id);
        } else {
            let mut stack = grandchildren;
            stack.push(id);
            while let Some(next) = stack.pop() {
                if let Some(task) = self.tasks.remove(next) {
                    stack.extend(task.children);
                }
            }
        }
        Ok(())
    }

    pub fn idx_in_parent(&self, id: TaskId) -> Option<usize> {
        let parent = self.tasks[id].parent?;
        self.tasks[parent].children.iter().position(|c| *c == id)
    }

    pub fn next_sibling(&self, id: TaskId) -> Option<TaskId> {
        let parent = self.tasks[id].parent?;
        let idx = self.idx_in_parent(id)?;
        self.tasks[parent].children.get(idx + 1).copied()
    }

    pub fn prev_sibling(&self, id: TaskId) -> Option<TaskId> {
        let idx = self.idx_in_parent(id)?;
        if idx == 0 {
            return None;
        }
        let parent = self.tasks[id].parent?;
        self.tasks[parent].children.get(idx - 1).copied()
    }

    /// Relocate `id` under `new_parent` at `idx`, counted with `id` already
    /// detached. This is the consumer of the drag engine's drop report.
    pub fn move_task(
        &mut self,
        id: TaskId,
        new_parent: TaskId,
        idx: usize,
    ) -> Result<(), TaskError> {
        if id == new_parent || self.is_ancestor_of(id, new_parent) {
            return Err(TaskError::WouldCycle);
        }
        let old_parent = self.tasks[id].parent.ok_or(TaskError::NoParent)?;
        let old_idx = self.idx_in_parent(id).ok_or(TaskError::NoParent)?;
        self.tasks[old_parent].children.remove(old_idx);

        let children = &mut self.tasks[new_parent].children;
        if idx > children.len() {
            // Restore before failing so the tree is left untouched.
            self.tasks[old_parent].children.insert(old_idx, id);
            return Err(TaskError::IndexOutOfBounds(idx));
        }
        children.insert(idx, id);
        self.tasks[id].parent = Some(new_parent);
        Ok(())
    }

    fn is_ancestor_of(&self, id: TaskId, descendant: TaskId) -> bool {
        let mut cursor = self.tasks[descendant].parent;
        while let Some(next) = cursor {
            if next == id {
                return true;
            }
            cursor = self.tasks[next].parent;
        }
        false
    }

    /// Set the status of every leaf under `id`.
    pub fn set_status(&mut self, id: TaskId, status: Option<usize>) {
        if self.tasks[id].children.is_empty() {
            self.tasks[id].status = status;
            return;
        }
        for child in self.tasks[id].children.clone() {
            self.set_status(child, status);
        }
    }

    /// Per-status `(fraction, count)` over the leaves under `id`. A leaf
    /// counts itself.
    pub fn status_histogram(&self, id: TaskId) -> HashMap<Option<usize>, (f64, usize)> {
        let mut counts: HashMap<Option<usize>, usize> = HashMap::default();
        let mut total = 0usize;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let task = &self.tasks[next];
            if task.children.is_empty() {
                *counts.entry(task.status).or_default() += 1;
                total += 1;
            } else {
                stack.extend(task.children.iter().copied());
            }
        }
        counts
            .into_iter()
            .map(|(status, count)| (status, (count as f64 / total as f64, count)))
            .collect()
    }

    pub fn has_only_status(&self, id: TaskId, status: Option<usize>) -> bool {
        let histogram = self.status_histogram(id);
        matches!(histogram.get(&status), Some((fraction, _)) if *fraction == 1.0)
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&TaskEvent) + 'static) -> u64 {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: u64) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    /// Notify subscribers for `id` and each of its ancestors, innermost
    /// first.
    pub fn notify_hierarchy(&mut self, id: TaskId) {
        let mut chain = vec![id];
        let mut cursor = self.tasks[id].parent;
        while let Some(next) = cursor {
            chain.push(next);
            cursor = self.tasks[next].parent;
        }
        let mut subscribers = std::mem::take(&mut self.subscribers);
        for task in chain {
            let event = TaskEvent::Changed(task);
            for (_, subscriber) in subscribers.iter_mut() {
                subscriber(&event);
            }
        }
        self.subscribers = subscribers;
    }
}
