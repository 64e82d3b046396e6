//! Read-only metrics derived from the task list.
//!
//! Everything here is a pure function of the tasks and a reference date;
//! records whose dates cannot be parsed are skipped.

use crate::model::{Task, TaskStatus};
use serde::Serialize;
use std::collections::BTreeSet;
use time::{Date, Duration};

/// Length of the look-back window used by [`summary`], in days.
pub const SUMMARY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Completed tasks whose completion falls inside the window.
    pub done: usize,
    /// Pending tasks whose due date falls inside the window.
    pub missed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
    pub streak: usize,
    pub summary: Summary,
}

/// Distinct days on which at least one task was completed.
pub fn completion_dates(tasks: &[Task]) -> BTreeSet<Date> {
    tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Completed)
        .filter_map(Task::completed_on)
        .collect()
}

/// Consecutive days with a completion, counting back from `today`.
///
/// A day without completions ends the count, including `today` itself.
pub fn streak(tasks: &[Task], today: Date) -> usize {
    let dates = completion_dates(tasks);

    let mut count = 0;
    let mut day = today;
    while dates.contains(&day) {
        count += 1;
        match day.previous_day() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    count
}

/// Done/missed tallies over `[today - 30 days, today]`.
///
/// The two counts cover disjoint statuses and are not halves of one total.
pub fn summary(tasks: &[Task], today: Date) -> Summary {
    let start = today - Duration::days(SUMMARY_WINDOW_DAYS);
    let in_window = |date: Date| start <= date && date <= today;

    let mut result = Summary::default();
    for task in tasks {
        match task.status {
            TaskStatus::Completed => {
                if task.completed_on().is_some_and(|date| in_window(date)) {
                    result.done += 1;
                }
            }
            TaskStatus::Pending => {
                if task.due_on().is_some_and(|date| in_window(date)) {
                    result.missed += 1;
                }
            }
        }
    }
    result
}

pub fn compute(tasks: &[Task], today: Date) -> Stats {
    let completed = tasks.iter().filter(|task| task.is_completed()).count();
    Stats {
        total: tasks.len(),
        pending: tasks.len() - completed,
        completed,
        overdue: tasks.iter().filter(|task| task.is_overdue(today)).count(),
        streak: streak(tasks, today),
        summary: summary(tasks, today),
    }
}

#[cfg(test)]
mod tests {
    use super::{Summary, completion_dates, compute, streak, summary};
    use crate::clock;
    use crate::model::{Priority, Task, TaskStatus};
    use time::macros::{date, time};
    use time::{Date, Duration, PrimitiveDateTime};

    const TODAY: Date = date!(2025 - 12 - 20);

    fn days_ago(days: i64) -> Date {
        TODAY - Duration::days(days)
    }

    fn completed(id: &str, on: Date) -> Task {
        let stamp = clock::format_timestamp(PrimitiveDateTime::new(on, time!(14:30:00))).unwrap();
        Task {
            id: id.to_string(),
            title: id.to_string(),
            priority: Priority::Medium,
            due_date: clock::format_date(on).unwrap(),
            note: String::new(),
            status: TaskStatus::Completed,
            created: clock::format_date(on).unwrap(),
            completed_at: Some(stamp),
        }
    }

    fn pending(id: &str, due: Date) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            priority: Priority::Low,
            due_date: clock::format_date(due).unwrap(),
            note: String::new(),
            status: TaskStatus::Pending,
            created: clock::format_date(days_ago(60)).unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn streak_counts_today_and_yesterday() {
        let tasks = vec![
            completed("a", TODAY),
            completed("b", days_ago(1)),
            completed("c", days_ago(1)),
        ];

        assert_eq!(streak(&tasks, TODAY), 2);
    }

    #[test]
    fn streak_is_zero_without_completion_today() {
        let tasks = vec![completed("a", days_ago(1)), completed("b", days_ago(2))];

        assert_eq!(streak(&tasks, TODAY), 0);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let tasks = vec![
            completed("a", TODAY),
            completed("b", days_ago(1)),
            completed("c", days_ago(3)),
            completed("d", days_ago(4)),
        ];

        assert_eq!(streak(&tasks, TODAY), 2);
    }

    #[test]
    fn streak_ignores_legacy_and_malformed_completions() {
        let mut legacy = completed("legacy", TODAY);
        legacy.completed_at = None;
        let mut broken = completed("broken", TODAY);
        broken.completed_at = Some("today-ish".to_string());

        assert_eq!(streak(&[legacy, broken], TODAY), 0);
        assert_eq!(streak(&[], TODAY), 0);
    }

    #[test]
    fn completion_dates_skips_pending_tasks() {
        let mut pending_with_stamp = pending("p", TODAY);
        pending_with_stamp.completed_at = Some("2025-12-20 09:00:00".to_string());
        let tasks = vec![pending_with_stamp, completed("a", days_ago(2))];

        let dates: Vec<Date> = completion_dates(&tasks).into_iter().collect();
        assert_eq!(dates, vec![days_ago(2)]);
    }

    #[test]
    fn summary_counts_within_thirty_day_window() {
        let tasks = vec![
            completed("done-recent", days_ago(10)),
            pending("missed-old", days_ago(40)),
            pending("missed-recent", days_ago(5)),
        ];

        assert_eq!(summary(&tasks, TODAY), Summary { done: 1, missed: 1 });
    }

    #[test]
    fn summary_window_is_closed_on_both_ends() {
        let tasks = vec![
            completed("edge-done", days_ago(30)),
            completed("outside-done", days_ago(31)),
            pending("edge-missed", days_ago(30)),
            pending("due-today", TODAY),
            pending("future", TODAY + Duration::days(1)),
            pending("long-overdue", days_ago(45)),
        ];

        assert_eq!(summary(&tasks, TODAY), Summary { done: 1, missed: 2 });
    }

    #[test]
    fn compute_collects_counts() {
        let tasks = vec![
            completed("a", TODAY),
            pending("late", days_ago(3)),
            pending("upcoming", TODAY + Duration::days(2)),
        ];

        let stats = compute(&tasks, TODAY);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.summary, Summary { done: 1, missed: 1 });
    }
}
