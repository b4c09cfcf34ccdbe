use super::{InputSource, KeyInput};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Step {
    Key(String),
    Wait(Duration),
    WaitUntil(Instant),
}

/// Scripted input source for tests: keys and pauses are replayed in order,
/// then the source closes.
#[derive(Debug, Default)]
pub struct SimulatedSource {
    steps: VecDeque<Step>,
    attached: bool,
    attach_count: usize,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.steps.push_back(Step::Key(key.into()));
        self
    }

    pub fn keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.steps
            .extend(keys.into_iter().map(|key| Step::Key(key.into())));
        self
    }

    pub fn wait(mut self, duration: Duration) -> Self {
        self.steps.push_back(Step::Wait(duration));
        self
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

#[async_trait]
impl InputSource for SimulatedSource {
    type Raw = ();

    fn attach(&mut self) -> Result<()> {
        if self.attached {
            bail!("Simulated source attached twice");
        }
        self.attached = true;
        self.attach_count += 1;
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        self.attached = false;
        Ok(())
    }

    async fn next_key(&mut self) -> Result<Option<KeyInput>> {
        loop {
            let Some(step) = self.steps.pop_front() else {
                return Ok(None);
            };

            match step {
                Step::Key(key) => return Ok(Some(KeyInput::new(key, ()))),
                Step::Wait(duration) => {
                    // Pin the deadline so a cancelled wait resumes where it stopped
                    self.steps
                        .push_front(Step::WaitUntil(Instant::now() + duration));
                }
                Step::WaitUntil(deadline) => {
                    self.steps.push_front(Step::WaitUntil(deadline));
                    tokio::time::sleep_until(deadline).await;
                    self.steps.pop_front();
                }
            }
        }
    }
}
