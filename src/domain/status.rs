//! Order/task status reconciliation.
//!
//! Once an order has tasks, its status follows them:
//! - a task reaching `completed` completes the order only when every task of
//!   the order is completed, otherwise it moves a `pending` order to
//!   `in-progress`;
//! - any other task status maps to `in-progress`/`pending` on the order;
//! - settled orders (completed, delivered, cancelled) are never moved back.

use crate::entities::{OrderStatus, TaskStatus};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskProgress {
    pub total: u64,
    pub completed: u64,
}

impl TaskProgress {
    pub fn new(total: u64, completed: u64) -> Self {
        Self { total, completed }
    }

    /// Zero-task orders are never considered complete
    pub fn all_completed(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl OrderStatus {
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Delivered | OrderStatus::Cancelled
        )
    }
}

impl From<TaskStatus> for OrderStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::InProgress => OrderStatus::InProgress,
            TaskStatus::Completed => OrderStatus::Completed,
            TaskStatus::Pending => OrderStatus::Pending,
        }
    }
}

/// Returns the order's next status after one of its tasks moved to
/// `task_status`, or `None` when the order stays as it is.
///
/// `progress` is only consulted when the task was completed; it must count
/// the task being updated with its new status.
pub fn reconcile_order_status(
    current: OrderStatus,
    task_status: TaskStatus,
    progress: Option<TaskProgress>,
) -> Option<OrderStatus> {
    if current.is_settled() {
        return None;
    }

    let next = match task_status {
        TaskStatus::Completed => {
            if progress.is_some_and(|p| p.all_completed()) {
                OrderStatus::Completed
            } else if current == OrderStatus::Pending {
                OrderStatus::InProgress
            } else {
                return None;
            }
        }
        other => OrderStatus::from(other),
    };

    (next != current).then_some(next)
}

/// Timestamp changes for a task moving from `previous` state to `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTimestamps {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// `started_at` is written once, on the first move into `in-progress`;
/// `completed_at` is refreshed on every move into `completed`.
pub fn next_task_timestamps(
    previous: TaskTimestamps,
    next_status: TaskStatus,
    now: DateTime<Utc>,
) -> TaskTimestamps {
    let started_at = match (previous.started_at, next_status) {
        (None, TaskStatus::InProgress) => Some(now),
        (existing, _) => existing,
    };
    let completed_at = if next_status == TaskStatus::Completed {
        Some(now)
    } else {
        previous.completed_at
    };
    TaskTimestamps {
        started_at,
        completed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_last_task_completes_order() {
        // 3 tasks, 2 done before, the third just completed
        let next = reconcile_order_status(
            OrderStatus::InProgress,
            TaskStatus::Completed,
            Some(TaskProgress::new(3, 3)),
        );
        assert_eq!(next, Some(OrderStatus::Completed));
    }

    #[test]
    fn test_partial_completion_promotes_pending_only() {
        let progress = Some(TaskProgress::new(3, 2));
        assert_eq!(
            reconcile_order_status(OrderStatus::Pending, TaskStatus::Completed, progress),
            Some(OrderStatus::InProgress)
        );
        assert_eq!(
            reconcile_order_status(OrderStatus::InProgress, TaskStatus::Completed, progress),
            None
        );
    }

    #[test]
    fn test_zero_task_order_is_not_completed() {
        assert_eq!(
            reconcile_order_status(
                OrderStatus::Pending,
                TaskStatus::Completed,
                Some(TaskProgress::new(0, 0))
            ),
            Some(OrderStatus::InProgress)
        );
    }

    #[test]
    fn test_completed_order_never_reverts() {
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(
                reconcile_order_status(
                    OrderStatus::Completed,
                    status,
                    Some(TaskProgress::new(2, 1))
                ),
                None
            );
        }
        assert_eq!(
            reconcile_order_status(OrderStatus::Cancelled, TaskStatus::InProgress, None),
            None
        );
    }

    #[test]
    fn test_non_completing_updates_map_status() {
        assert_eq!(
            reconcile_order_status(OrderStatus::Pending, TaskStatus::InProgress, None),
            Some(OrderStatus::InProgress)
        );
        assert_eq!(
            reconcile_order_status(OrderStatus::InProgress, TaskStatus::Pending, None),
            Some(OrderStatus::Pending)
        );
        assert_eq!(
            reconcile_order_status(OrderStatus::Pending, TaskStatus::Pending, None),
            None
        );
    }

    #[test]
    fn test_started_at_is_set_once() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(5);
        let t2 = t0 + Duration::minutes(10);
        let empty = TaskTimestamps {
            started_at: None,
            completed_at: None,
        };

        let first = next_task_timestamps(empty, TaskStatus::InProgress, t0);
        assert_eq!(first.started_at, Some(t0));

        let back_to_pending = next_task_timestamps(first, TaskStatus::Pending, t1);
        let again = next_task_timestamps(back_to_pending, TaskStatus::InProgress, t2);
        assert_eq!(again.started_at, Some(t0));
    }

    #[test]
    fn test_completed_at_is_refreshed() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(5);
        let empty = TaskTimestamps {
            started_at: None,
            completed_at: None,
        };

        let done = next_task_timestamps(empty, TaskStatus::Completed, t0);
        assert_eq!(done.completed_at, Some(t0));
        // completing straight from pending does not invent a start time
        assert_eq!(done.started_at, None);

        let redone = next_task_timestamps(done, TaskStatus::Completed, t1);
        assert_eq!(redone.completed_at, Some(t1));
    }
}
