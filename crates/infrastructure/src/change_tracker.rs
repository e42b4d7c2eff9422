use domain::Entity;
use parking_lot::Mutex;
use tracing::debug;

/// A write staged by a repository, waiting for the unit of work to commit it.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange<T> {
    Added(T),
    Modified(T),
    Deleted(T),
}

impl<T: Entity> PendingChange<T> {
    pub fn entity(&self) -> &T {
        match self {
            PendingChange::Added(entity)
            | PendingChange::Modified(entity)
            | PendingChange::Deleted(entity) => entity,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            PendingChange::Added(_) => "insert",
            PendingChange::Modified(_) => "update",
            PendingChange::Deleted(_) => "delete",
        }
    }
}

/// Ordered log of staged writes for one unit-of-work scope.
#[derive(Debug)]
pub struct ChangeTracker<T> {
    pending: Mutex<Vec<PendingChange<T>>>,
}

impl<T: Entity> ChangeTracker<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn track(&self, change: PendingChange<T>) {
        debug!(id = %change.entity().id(), change = change.verb(), "Staging change");
        self.pending.lock().push(change);
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Takes every staged change, leaving the tracker empty.
    pub fn drain(&self) -> Vec<PendingChange<T>> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl<T: Entity> Default for ChangeTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::User;
    use rstest::rstest;

    fn alice() -> User {
        User::new("Alice".to_string(), "a@x.com".to_string())
    }

    #[rstest]
    fn keeps_changes_in_order_and_drains_once() {
        let tracker = ChangeTracker::new();
        let user = alice();

        tracker.track(PendingChange::Added(user.clone()));
        tracker.track(PendingChange::Modified(user.clone()));
        tracker.track(PendingChange::Deleted(user.clone()));
        assert_eq!(tracker.len(), 3);

        let drained = tracker.drain();
        assert_eq!(
            drained,
            vec![
                PendingChange::Added(user.clone()),
                PendingChange::Modified(user.clone()),
                PendingChange::Deleted(user),
            ]
        );
        assert!(tracker.is_empty());
        assert!(tracker.drain().is_empty());
    }

    #[rstest]
    fn exposes_the_staged_entity() {
        let user = alice();
        let change = PendingChange::Deleted(user.clone());
        assert_eq!(change.entity().user_id, user.user_id);
        assert_eq!(change.verb(), "delete");
    }
}
