use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Breadth-first frontier for a single crawl.
///
/// Only URLs that textually start with the seed URL are admitted. This is a string
/// prefix test, not a same-host check: a different scheme or a path outside the
/// seed's path is out of scope.
pub struct Scheduler {
    /// Seed URL every admitted link must start with
    prefix: String,

    /// URLs waiting to be fetched, oldest first
    frontier: VecDeque<String>,

    /// URLs currently in the frontier
    queued: HashSet<String>,

    /// URLs already fetched
    visited: HashSet<String>,
}

impl Scheduler {
    /// Create a scheduler whose frontier holds only the seed
    pub fn new(seed: &str) -> Self {
        let mut frontier = VecDeque::new();
        frontier.push_back(seed.to_string());

        Self {
            prefix: seed.to_string(),
            frontier,
            queued: HashSet::from([seed.to_string()]),
            visited: HashSet::new(),
        }
    }

    /// Next URL to fetch, skipping anything already visited
    pub fn next_url(&mut self) -> Option<String> {
        while let Some(url) = self.frontier.pop_front() {
            self.queued.remove(&url);

            if self.visited.contains(&url) {
                debug!("Skipping already visited URL: {}", url);
                continue;
            }

            return Some(url);
        }

        None
    }

    /// Record that `url` has been fetched
    pub fn mark_visited(&mut self, url: &str) {
        self.visited.insert(url.to_string());
    }

    /// Determine if a URL should be crawled
    pub fn should_crawl(&self, url: &str) -> bool {
        url.starts_with(&self.prefix) && !self.visited.contains(url) && !self.queued.contains(url)
    }

    /// Enqueue discovered links in page order, returning how many were admitted
    pub fn enqueue_links<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut admitted = 0;

        for link in links {
            if self.should_crawl(&link) {
                self.queued.insert(link.clone());
                self.frontier.push_back(link);
                admitted += 1;
            }
        }

        admitted
    }

    /// URLs waiting in the frontier, in fetch order
    #[cfg(test)]
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.frontier.iter().map(String::as_str)
    }

    /// Get the current count of visited URLs
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
