//! Prioritized sweeping agent
//!
//! Real transitions only update the model and enqueue the visited pair when
//! its one-step error exceeds the priority threshold. Value updates happen in
//! planning: up to `planning_budget` pops of the highest-priority pair per real
//! step, each followed by re-prioritizing the pair's predecessors (Sutton &
//! Barto, section 8.4).

use std::{cmp::Ordering, collections::BTreeSet};

use anyhow::Result;
use rand::{SeedableRng, rngs::StdRng};

use super::{
    Policy, Transition,
    tabular::{QTable, TransitionModel, check_dimensions},
};
use crate::{
    env::{Action, State},
    train::HyperparameterConfig,
};

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    priority: f64,
    // Earlier insertions win ties so pops are deterministic
    sequence: u64,
    state: State,
    action: Action,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Max-priority queue of state-action pairs with an optional capacity
///
/// Entries are kept ordered so both ends are reachable in logarithmic time.
/// When full, pushing a new entry evicts the lowest-priority entry (which may
/// be the new one).
#[derive(Debug, Clone, Default)]
pub struct PriorityQueue {
    entries: BTreeSet<QueueEntry>,
    capacity: Option<usize>,
    next_sequence: u64,
}

impl PriorityQueue {
    /// Create a queue; `None` means unbounded
    pub fn new(capacity: Option<usize>) -> Self {
        Self { entries: BTreeSet::new(), capacity, next_sequence: 0 }
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queue a pair with the given priority
    pub fn push(&mut self, priority: f64, state: State, action: Action) {
        if self.capacity == Some(0) {
            return;
        }
        let entry = QueueEntry { priority, sequence: self.next_sequence, state, action };
        self.next_sequence += 1;
        self.entries.insert(entry);

        if let Some(capacity) = self.capacity
            && self.entries.len() > capacity
        {
            // Ascending order: the first entry is the weakest
            self.entries.pop_first();
        }
    }

    /// Remove and return the highest-priority pair
    pub fn pop(&mut self) -> Option<(f64, State, Action)> {
        self.entries.pop_last().map(|entry| (entry.priority, entry.state, entry.action))
    }
}

/// Prioritized sweeping with an epsilon-greedy behavior policy
#[derive(Debug, Clone)]
pub struct PrioritizedSweepingAgent {
    q: QTable,
    model: TransitionModel,
    queue: PriorityQueue,
    learning_rate: f64,
    discount: f64,
    epsilon: f64,
    planning_budget: usize,
    priority_threshold: f64,
    rng: StdRng,
}

impl PrioritizedSweepingAgent {
    /// Create an agent
    ///
    /// # Arguments
    ///
    /// * `priority_threshold` - Minimum absolute TD error for a pair to be queued
    /// * `queue_capacity` - Maximum queue length (`None` = unbounded)
    pub fn new(
        state_count: usize,
        action_count: usize,
        hyperparameters: &HyperparameterConfig,
        priority_threshold: f64,
        queue_capacity: Option<usize>,
        seed: u64,
    ) -> Result<Self> {
        check_dimensions(state_count, action_count)?;
        hyperparameters.validate()?;
        Ok(Self {
            q: QTable::new(state_count, action_count),
            model: TransitionModel::new(state_count, action_count),
            queue: PriorityQueue::new(queue_capacity),
            learning_rate: hyperparameters.learning_rate,
            discount: hyperparameters.discount,
            epsilon: hyperparameters.exploration_rate,
            planning_budget: hyperparameters.planning_budget,
            priority_threshold,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Learned state-action values
    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    /// Pending planning work
    pub fn queue(&self) -> &PriorityQueue {
        &self.queue
    }

    fn enqueue_if_significant(&mut self, state: State, action: Action, reward: f64, done: bool, next_state: State) {
        let target = self.q.td_target(reward, done, next_state, self.discount);
        let priority = (target - self.q.get(state, action)).abs();
        if priority > self.priority_threshold {
            self.queue.push(priority, state, action);
        }
    }

    fn sweep(&mut self) {
        for _ in 0..self.planning_budget {
            let Some((_, state, action)) = self.queue.pop() else {
                return;
            };
            let Some(outcome) = self.model.sample_outcome(state, action, &mut self.rng) else {
                continue;
            };
            let target =
                self.q.td_target(outcome.mean_reward(), outcome.done, outcome.next_state, self.discount);
            self.q.move_towards(state, action, target, self.learning_rate);

            let predecessors = self.model.predecessors(state).to_vec();
            for (pred_state, pred_action) in predecessors {
                let Some(outcome) = self
                    .model
                    .outcomes(pred_state, pred_action)
                    .iter()
                    .find(|outcome| outcome.next_state == state)
                    .cloned()
                else {
                    continue;
                };
                self.enqueue_if_significant(
                    pred_state,
                    pred_action,
                    outcome.mean_reward(),
                    outcome.done,
                    state,
                );
            }
        }
    }
}

impl Policy for PrioritizedSweepingAgent {
    fn select_action(&mut self, state: State) -> Result<Action> {
        self.q.check_state(state)?;
        Ok(self.q.epsilon_greedy(state, self.epsilon, &mut self.rng))
    }

    fn update(&mut self, transition: &Transition) -> Result<()> {
        let Transition { state, action, reward, done, next_state } = *transition;
        self.q.check_pair(state, action)?;
        self.q.check_state(next_state)?;

        self.model.observe(state, action, reward, done, next_state);
        self.enqueue_if_significant(state, action, reward, done, next_state);
        self.sweep();
        Ok(())
    }
}
