use std::collections::HashSet;

/// Mutable per-run crawl state: the set of visited canonical ids and the
/// global visit budget. Owned by the scheduler; independent runs never
/// share a session.
///
/// Invariant: `visited.len() <= budget`, and an id added to the set stays
/// there for the life of the session.
#[derive(Debug)]
pub struct CrawlSession {
    visited: HashSet<String>,
    budget: usize,
}

impl CrawlSession {
    pub fn new(budget: usize) -> Self {
        Self {
            visited: HashSet::new(),
            budget,
        }
    }

    pub fn is_visited(&self, id: &str) -> bool {
        self.visited.contains(id)
    }

    pub fn remaining_budget(&self) -> usize {
        self.budget - self.visited.len()
    }

    /// Mark an id visited. Returns `true` only when the id is newly marked;
    /// re-marking is a no-op and a full budget refuses new ids outright.
    pub fn mark_visited(&mut self, id: &str) -> bool {
        if self.remaining_budget() == 0 || self.visited.contains(id) {
            return false;
        }
        self.visited.insert(id.to_string());
        true
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
