use crate::models::{Task, TaskStatus};

#[derive(Debug, Clone)]
pub struct TaskNode {
    pub task: Task,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Flat task tree. Nodes live in index-stable slots; removal tombstones the
/// slot instead of shifting, so parent and child indices stay valid. The
/// `task` inside a node always has an empty `subtasks` vector; nesting is
/// expressed only through the indices and restored by `to_nested`.
#[derive(Debug, Clone, Default)]
pub struct TaskArena {
    slots: Vec<Option<TaskNode>>,
}

impl TaskArena {
    pub fn from_nested(tasks: &[Task]) -> Self {
        let mut arena = Self::default();
        for task in tasks {
            arena.insert(task, None);
        }
        arena
    }

    fn insert(&mut self, task: &Task, parent: Option<usize>) -> usize {
        let index = self.slots.len();
        let mut flat = task.clone();
        flat.subtasks = Vec::new();
        self.slots.push(Some(TaskNode {
            task: flat,
            parent,
            children: Vec::new(),
        }));
        let children: Vec<usize> = task
            .subtasks
            .iter()
            .map(|subtask| self.insert(subtask, Some(index)))
            .collect();
        if let Some(node) = self.slots[index].as_mut() {
            node.children = children;
        }
        index
    }

    pub fn to_nested(&self) -> Vec<Task> {
        (0..self.slots.len())
            .filter(|&index| {
                self.slots[index]
                    .as_ref()
                    .is_some_and(|node| node.parent.is_none())
            })
            .filter_map(|index| self.build(index))
            .collect()
    }

    fn build(&self, index: usize) -> Option<Task> {
        let node = self.slots.get(index)?.as_ref()?;
        let mut task = node.task.clone();
        task.subtasks = node
            .children
            .iter()
            .filter_map(|&child| self.build(child))
            .collect();
        Some(task)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|node| node.task.id == id))
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        let index = self.position(id)?;
        self.slots.get(index)?.as_ref().map(|node| &node.task)
    }

    /// Live node count, nested tasks included.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flips the identified task between Completed and Not Started; a task
    /// in progress toggles straight to Completed. Only that node changes.
    /// Returns the new status, or None when the id is unknown.
    pub fn toggle_completion(&mut self, id: &str) -> Option<TaskStatus> {
        let index = self.position(id)?;
        let node = self.slots[index].as_mut()?;
        let next = if node.task.status == TaskStatus::Completed {
            TaskStatus::NotStarted
        } else {
            TaskStatus::Completed
        };
        node.task.status = next;
        Some(next)
    }

    /// Removes the identified task together with its whole subtree.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(root) = self.position(id) else {
            return false;
        };
        let parent = self.slots[root].as_ref().and_then(|node| node.parent);
        if let Some(parent_index) = parent {
            if let Some(parent_node) = self.slots[parent_index].as_mut() {
                parent_node.children.retain(|&child| child != root);
            }
        }
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            if let Some(node) = self.slots[index].take() {
                stack.extend(node.children);
            }
        }
        true
    }

    /// Completed count over the direct subtasks of the identified task.
    pub fn subtask_progress(&self, id: &str) -> Option<(usize, usize)> {
        let index = self.position(id)?;
        let node = self.slots.get(index)?.as_ref()?;
        let completed = node
            .children
            .iter()
            .filter(|&&child| {
                self.slots
                    .get(child)
                    .and_then(|slot| slot.as_ref())
                    .is_some_and(|node| node.task.status == TaskStatus::Completed)
            })
            .count();
        Some((completed, node.children.len()))
    }
}
