mod task;

pub use task::{Priority, Task, TaskInput, TaskStatus, generate_task_id, normalize_note};
