//! Episode and batch storage for policy-gradient training

use pgrad_core::{GradientSet, Reward};

/// A single step record (observation, action, reward, gradients)
#[derive(Debug, Clone)]
pub struct Step<O, A> {
    pub observation: O,
    pub action: A,
    pub reward: Reward,
    pub gradients: GradientSet,
}

impl<O, A> Step<O, A> {
    /// Create a new step
    pub fn new(observation: O, action: A, reward: Reward, gradients: GradientSet) -> Self {
        Self {
            observation,
            action,
            reward,
            gradients,
        }
    }
}

/// One run from reset to `done` or the step cap
#[derive(Debug, Clone)]
pub struct Episode<O, A> {
    steps: Vec<Step<O, A>>,
    truncated: bool,
}

impl<O, A> Episode<O, A> {
    /// Create an empty episode with room for `max_steps` steps
    pub fn with_capacity(max_steps: usize) -> Self {
        Self {
            steps: Vec::with_capacity(max_steps),
            truncated: false,
        }
    }

    /// Append a step
    pub fn push(&mut self, step: Step<O, A>) {
        self.steps.push(step);
    }

    /// Mark the episode as cut off by the step cap
    pub fn mark_truncated(&mut self) {
        self.truncated = true;
    }

    /// Whether the step cap ended the episode before `done`
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step<O, A>] {
        &self.steps
    }

    /// Raw reward trace
    pub fn rewards(&self) -> Vec<Reward> {
        self.steps.iter().map(|s| s.reward).collect()
    }

    /// Undiscounted sum of rewards
    pub fn total_reward(&self) -> Reward {
        self.steps.iter().map(|s| s.reward).sum()
    }

    /// Per-step gradient sets in step order
    pub fn gradients(&self) -> impl Iterator<Item = &GradientSet> {
        self.steps.iter().map(|s| &s.gradients)
    }
}

/// Episodes collected before one parameter update
#[derive(Debug, Clone)]
pub struct Batch<O, A> {
    episodes: Vec<Episode<O, A>>,
}

impl<O, A> Batch<O, A> {
    /// Create an empty batch with room for `episodes` episodes
    pub fn with_capacity(episodes: usize) -> Self {
        Self {
            episodes: Vec::with_capacity(episodes),
        }
    }

    /// Add a finished episode
    pub fn push(&mut self, episode: Episode<O, A>) {
        self.episodes.push(episode);
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn episodes(&self) -> &[Episode<O, A>] {
        &self.episodes
    }

    /// Total number of steps across all episodes
    pub fn total_steps(&self) -> usize {
        self.episodes.iter().map(Episode::len).sum()
    }

    /// Reward trace of every episode, in episode order
    pub fn reward_traces(&self) -> Vec<Vec<Reward>> {
        self.episodes.iter().map(Episode::rewards).collect()
    }
}

impl<O, A> FromIterator<Episode<O, A>> for Batch<O, A> {
    fn from_iter<I: IntoIterator<Item = Episode<O, A>>>(iter: I) -> Self {
        Self {
            episodes: iter.into_iter().collect(),
        }
    }
}
