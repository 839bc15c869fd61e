//! The run list: a singly-linked, non-circular list of every task that
//! exists.
//!
//! Unlike a priority-bucketed ready list, there is exactly one list here and
//! everything on it is always eligible to run — this scheduler has no
//! notion of "not ready". The head is fixed at the main task for the life
//! of the program; only the tail end ever changes.

use core::ptr::NonNull;

use crate::core::task::Task;

pub(crate) struct RunList {
    head: NonNull<Task>,
}

impl RunList {
    pub(crate) const fn new(head: NonNull<Task>) -> Self {
        RunList { head }
    }

    /// Append `task` to the tail of the list.
    ///
    /// # Safety
    /// `task` must point at a live, distinct `Task` not already linked into
    /// this list.
    pub(crate) unsafe fn insert(&mut self, task: NonNull<Task>) {
        let mut tail = self.head;
        // SAFETY: every node reachable from `head` is a live `Task`; the
        // list is finite because it is never made circular.
        while let Some(next) = unsafe { tail.as_ref() }.next {
            tail = next;
        }
        unsafe { tail.as_mut() }.next = Some(task);
    }

    /// Remove `task` from the list, if present.
    ///
    /// Walks from the head looking for the node whose `next` equals
    /// `task`; the head itself therefore can never be removed through this
    /// function, which is exactly right since the head is the permanent
    /// main task.
    ///
    /// # Safety
    /// Every node reachable from `head` must be a live `Task`.
    pub(crate) unsafe fn remove(&mut self, mut task: NonNull<Task>) {
        let mut prev = self.head;
        loop {
            // SAFETY: see above.
            let prev_next = unsafe { prev.as_ref() }.next;
            match prev_next {
                Some(next) if next == task => {
                    unsafe { prev.as_mut() }.next = unsafe { next.as_ref() }.next;
                    unsafe { task.as_mut() }.next = None;
                    return;
                }
                Some(next) => prev = next,
                None => return,
            }
        }
    }

    /// The task after `task` in the list, wrapping to the head if `task`
    /// is the tail.
    ///
    /// # Safety
    /// `task` must be a live node currently linked into this list.
    pub(crate) unsafe fn next_after(&self, task: NonNull<Task>) -> NonNull<Task> {
        // SAFETY: caller guarantees `task` is live and linked.
        match unsafe { task.as_ref() }.next {
            Some(next) => next,
            None => self.head,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptr(t: &mut Task) -> NonNull<Task> {
        NonNull::from(t)
    }

    #[test]
    fn insert_appends_in_order_and_wraps_to_head() {
        let mut head = Task::new();
        let mut a = Task::new();
        let mut b = Task::new();
        let mut list = RunList::new(ptr(&mut head));

        unsafe {
            list.insert(ptr(&mut a));
            list.insert(ptr(&mut b));

            assert_eq!(list.next_after(ptr(&mut head)), ptr(&mut a));
            assert_eq!(list.next_after(ptr(&mut a)), ptr(&mut b));
            assert_eq!(list.next_after(ptr(&mut b)), ptr(&mut head));
        }
    }

    #[test]
    fn remove_middle_splices_around_it() {
        let mut head = Task::new();
        let mut a = Task::new();
        let mut b = Task::new();
        let mut list = RunList::new(ptr(&mut head));

        unsafe {
            list.insert(ptr(&mut a));
            list.insert(ptr(&mut b));
            list.remove(ptr(&mut a));

            assert_eq!(list.next_after(ptr(&mut head)), ptr(&mut b));
            assert_eq!(a.next, None, "removed node's own next must be cleared");
        }
    }

    #[test]
    fn remove_head_is_a_noop() {
        let mut head = Task::new();
        let mut a = Task::new();
        let mut list = RunList::new(ptr(&mut head));

        unsafe {
            list.insert(ptr(&mut a));
            list.remove(ptr(&mut head));

            assert_eq!(list.next_after(ptr(&mut head)), ptr(&mut a));
        }
    }

    #[test]
    fn remove_absent_task_is_a_noop() {
        let mut head = Task::new();
        let mut a = Task::new();
        let list_head = ptr(&mut head);
        let mut list = RunList::new(list_head);

        unsafe {
            list.remove(ptr(&mut a));
            assert_eq!(list.next_after(list_head), list_head);
        }
    }
}
