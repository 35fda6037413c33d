//! File de lecture d'une session
//!
//! Toutes les mutations et le `dequeue` du scheduler passent par un unique
//! mutex, tenu seulement le temps de l'opération : aucune opération n'attend
//! la progression de la lecture.

use crate::error::{PlayerError, Result};
use crate::model::{QueueEntry, QueueItem, QueueSnapshot};
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct SessionQueue {
    items: Mutex<VecDeque<QueueItem>>,
}

impl SessionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<QueueItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ajoute en fin de file et retourne la position (1-based) de l'élément
    pub fn enqueue(&self, item: QueueItem) -> usize {
        let mut items = self.items();
        items.push_back(item);
        items.len()
    }

    /// Retire la tête de file, sans jamais attendre
    pub fn dequeue(&self) -> Option<QueueItem> {
        self.items().pop_front()
    }

    /// Retire l'élément à la position `index` (1-based)
    pub fn remove_at(&self, index: usize) -> Result<QueueItem> {
        let mut items = self.items();
        if index == 0 || index > items.len() {
            return Err(PlayerError::invalid_index(index.to_string()));
        }
        items
            .remove(index - 1)
            .ok_or_else(|| PlayerError::invalid_index(index.to_string()))
    }

    /// Comme [`SessionQueue::remove_at`], à partir du texte saisi
    pub fn remove_at_token(&self, token: &str) -> Result<QueueItem> {
        self.remove_at(parse_index(token)?)
    }

    /// Vide la file et retourne le nombre d'éléments retirés
    pub fn clear(&self) -> usize {
        let mut items = self.items();
        let removed = items.len();
        items.clear();
        removed
    }

    pub fn shuffle(&self) {
        let mut items = self.items();
        items.make_contiguous().shuffle(&mut rand::rng());
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let items = self.items();
        let entries: Vec<QueueEntry> = items
            .iter()
            .enumerate()
            .map(|(i, item)| QueueEntry {
                position: i + 1,
                item: item.clone(),
            })
            .collect();
        let total_duration_secs = items.iter().map(|item| item.media.duration_secs).sum();
        QueueSnapshot {
            entries,
            total_duration_secs,
        }
    }
}

/// Index saisi par l'utilisateur ; tout ce qui n'est pas un entier positif est invalide
pub fn parse_index(token: &str) -> Result<usize> {
    token
        .trim()
        .parse::<usize>()
        .map_err(|_| PlayerError::invalid_index(token.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use tchcache::MediaItem;

    fn item(title: &str) -> QueueItem {
        QueueItem::new(
            MediaItem {
                identity: title.to_lowercase(),
                source_url: format!("https://youtu.be/{}", title.to_lowercase()),
                title: title.to_string(),
                duration_secs: 60,
                locator: format!("/tmp/{}.webm", title.to_lowercase()),
                thumbnail: None,
            },
            None,
        )
    }

    fn titles(queue: &SessionQueue) -> Vec<String> {
        queue
            .snapshot()
            .titles()
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_fifo_order() {
        let queue = SessionQueue::new();
        assert_eq!(queue.enqueue(item("A")), 1);
        assert_eq!(queue.enqueue(item("B")), 2);
        assert_eq!(queue.enqueue(item("C")), 3);

        assert_eq!(titles(&queue), ["A", "B", "C"]);
        assert_eq!(queue.dequeue().unwrap().title(), "A");
        assert_eq!(queue.dequeue().unwrap().title(), "B");
        assert_eq!(queue.dequeue().unwrap().title(), "C");
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_remove_at() {
        let queue = SessionQueue::new();
        for t in ["A", "B", "C"] {
            queue.enqueue(item(t));
        }

        assert_eq!(queue.remove_at(2).unwrap().title(), "B");
        assert_eq!(titles(&queue), ["A", "C"]);

        assert!(matches!(queue.remove_at(5), Err(PlayerError::InvalidIndex(_))));
        assert!(matches!(queue.remove_at(0), Err(PlayerError::InvalidIndex(_))));
        assert_eq!(titles(&queue), ["A", "C"]);
    }

    #[test]
    fn test_remove_at_token() {
        let queue = SessionQueue::new();
        queue.enqueue(item("A"));
        queue.enqueue(item("B"));

        for bad in ["abc", "-1", "1.5", ""] {
            assert!(matches!(
                queue.remove_at_token(bad),
                Err(PlayerError::InvalidIndex(_))
            ));
        }
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.remove_at_token(" 2 ").unwrap().title(), "B");
    }

    #[test]
    fn test_clear() {
        let queue = SessionQueue::new();
        assert_eq!(queue.clear(), 0);
        for t in ["A", "B", "C"] {
            queue.enqueue(item(t));
        }
        assert_eq!(queue.clear(), 3);
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_shuffle_keeps_items() {
        let queue = SessionQueue::new();
        for i in 0..20 {
            queue.enqueue(item(&format!("T{i}")));
        }
        queue.shuffle();

        let mut after = titles(&queue);
        after.sort();
        let mut expected: Vec<String> = (0..20).map(|i| format!("T{i}")).collect();
        expected.sort();
        assert_eq!(after, expected);
    }

    #[test]
    fn test_snapshot_total_duration() {
        let queue = SessionQueue::new();
        queue.enqueue(item("A"));
        queue.enqueue(item("B"));

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.total_duration_secs, 120);
        assert_eq!(snapshot.entries[1].position, 2);
    }

    #[test]
    fn test_concurrent_enqueue_with_clear_and_shuffle() {
        let queue = Arc::new(SessionQueue::new());
        let writers = 8;
        let per_writer = 50;

        let mut handles = Vec::new();
        for w in 0..writers {
            let queue = queue.clone();
            handles.push(thread::spawn(move || {
                for i in 0..per_writer {
                    queue.enqueue(item(&format!("W{w}-{i}")));
                }
                0
            }));
        }
        {
            let queue = queue.clone();
            handles.push(thread::spawn(move || {
                queue.shuffle();
                0
            }));
        }
        let clearer = {
            let queue = queue.clone();
            thread::spawn(move || queue.clear())
        };

        for handle in handles {
            handle.join().unwrap();
        }
        let cleared = clearer.join().unwrap();

        let remaining = titles(&queue);
        assert_eq!(remaining.len() + cleared, writers * per_writer);

        let unique: HashSet<&String> = remaining.iter().collect();
        assert_eq!(unique.len(), remaining.len());
    }
}
