//! Episode runner - alternates policy and environment calls

use anyhow::Result;
use tracing::{debug, trace};

use pgrad_core::PgError;

use crate::env::{Environment, Render};
use crate::episode::{Episode, Step};
use crate::policy::Policy;
use crate::session::Session;

/// Run one episode of at most `max_steps` steps, collecting rewards and gradients.
///
/// Stops right after the step that reports `done`. Hitting the cap is a
/// normal truncation, not an error.
pub fn run_episode<E, P>(
    env: &mut E,
    policy: &mut P,
    session: &mut Session,
    max_steps: usize,
) -> Result<Episode<E::Observation, E::Action>>
where
    E: Environment,
    P: Policy<E::Observation, E::Action>,
{
    if max_steps == 0 {
        return Err(PgError::Config("max_steps must be at least 1".to_string()).into());
    }

    let mut episode = Episode::with_capacity(max_steps);
    let mut observation = env.reset()?;

    for step in 0..max_steps {
        let (action, gradients) = policy.act(session, &observation)?;
        session.record_evaluation();

        let transition = env.step(&action)?;
        trace!(step, reward = transition.reward, done = transition.done, "Env step");

        let acted_on = std::mem::replace(&mut observation, transition.observation);
        episode.push(Step::new(acted_on, action, transition.reward, gradients));

        if transition.done {
            debug!(steps = episode.len(), info = %transition.info, "Episode done");
            return Ok(episode);
        }
    }

    debug!(max_steps, "Episode truncated at step cap");
    episode.mark_truncated();
    Ok(episode)
}

/// Play one episode for inspection, rendering before every step.
///
/// Collects nothing and returns the number of steps played. `max_steps`
/// bounds environments that never signal `done`.
pub fn play<E, P>(
    env: &mut E,
    policy: &mut P,
    session: &mut Session,
    max_steps: Option<usize>,
) -> Result<usize>
where
    E: Environment + Render,
    P: Policy<E::Observation, E::Action>,
{
    let mut observation = env.reset()?;
    let mut count = 0;

    loop {
        if max_steps.is_some_and(|cap| count >= cap) {
            break;
        }

        env.render()?;
        let (action, _) = policy.act(session, &observation)?;
        session.record_evaluation();

        let transition = env.step(&action)?;
        observation = transition.observation;
        count += 1;

        if transition.done {
            break;
        }
    }

    Ok(count)
}
