use crate::replay::ReplayEvent;
use std::collections::VecDeque;

pub struct ReplayHistory {
    /// History of replay events, with the most recent event at the front.
    event_history: VecDeque<ReplayEvent>,
    /// Current index in the history for browsing. Should always be between 0 and event_history.len() - 1
    /// 0 represents the most recent event.
    history_index: usize,
    /// Maximum number of events to keep in history. If 0, no history is kept.
    max_num_events: usize,
}

impl ReplayHistory {
    pub fn new(max_num_events: usize) -> Self {
        ReplayHistory {
            event_history: VecDeque::with_capacity(max_num_events),
            history_index: 0,
            max_num_events,
        }
    }

    pub fn history_forward(&mut self) -> Option<&ReplayEvent> {
        match self.history_index {
            0 => None, // Already at the most recent event
            _ => {
                self.history_index -= 1;
                self.event_history.get(self.history_index)
            }
        }
    }

    pub fn history_backward(&mut self) -> Option<&ReplayEvent> {
        if self.history_index + 1 >= self.event_history.len() {
            None
        } else {
            self.history_index += 1;
            self.event_history.get(self.history_index)
        }
    }

    pub fn add_event(&mut self, current_event: ReplayEvent) {
        match self.max_num_events {
            0 => {} // No history to maintain
            _ => {
                // Remove oldest events if we exceed max history size
                self.event_history.truncate(self.max_num_events - 1);
                // Add new event to the front of the history
                self.event_history.push_front(current_event);
                // Reset history index to the most recent event
                self.history_index = 0;
            }
        }
    }

    pub fn current_event(&self) -> Option<&ReplayEvent> {
        self.event_history.get(self.history_index)
    }

    /// Events currently applied to the screen, oldest first. Used to rebuild
    /// the display after a terminal resize.
    pub fn applied(&self) -> impl Iterator<Item = &ReplayEvent> {
        self.event_history.iter().skip(self.history_index).rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::ReplayEventKind;

    fn explore(generation: u64, row: u16) -> ReplayEvent {
        ReplayEvent {
            generation,
            kind: ReplayEventKind::Explore(vec![(row, 1)]),
        }
    }

    fn traced_row(event: Option<&ReplayEvent>) -> Option<u16> {
        event.map(|event| match &event.kind {
            ReplayEventKind::Explore(cells) => cells[0].0,
            _ => unreachable!(),
        })
    }

    #[test]
    fn test_backward_then_forward() {
        let mut history = ReplayHistory::new(10);
        for row in 0..3 {
            history.add_event(explore(0, row));
        }
        assert_eq!(traced_row(history.current_event()), Some(2));
        assert_eq!(traced_row(history.history_backward()), Some(1));
        assert_eq!(traced_row(history.history_backward()), Some(0));
        assert!(history.history_backward().is_none());
        assert_eq!(traced_row(history.history_forward()), Some(1));
        assert_eq!(traced_row(history.history_forward()), Some(2));
        assert!(history.history_forward().is_none());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = ReplayHistory::new(2);
        for row in 0..5 {
            history.add_event(explore(0, row));
        }
        assert_eq!(traced_row(history.current_event()), Some(4));
        assert_eq!(traced_row(history.history_backward()), Some(3));
        assert!(history.history_backward().is_none());
    }

    #[test]
    fn test_applied_walks_oldest_first() {
        let mut history = ReplayHistory::new(10);
        for row in 0..4 {
            history.add_event(explore(0, row));
        }
        history.history_backward();
        let rows: Vec<u16> = history.applied().map(|e| traced_row(Some(e)).unwrap()).collect();
        assert_eq!(rows, vec![0, 1, 2]);
    }
}
