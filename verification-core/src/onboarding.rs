//! Contractor onboarding progress

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Number of onboarding steps a contractor completes before submitting
pub const ONBOARDING_STEPS: u8 = 4;

/// Per-user onboarding record, upserted as steps complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingStatus {
    pub user_id: Uuid,
    pub step1: bool,
    pub step2: bool,
    pub step3: bool,
    pub step4: bool,
    pub is_submitted: bool,
    pub updated_at: DateTime<Utc>,
}

impl OnboardingStatus {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            step1: false,
            step2: false,
            step3: false,
            step4: false,
            is_submitted: false,
            updated_at: Utc::now(),
        }
    }

    fn step_mut(&mut self, step: u8) -> Result<&mut bool> {
        match step {
            1 => Ok(&mut self.step1),
            2 => Ok(&mut self.step2),
            3 => Ok(&mut self.step3),
            4 => Ok(&mut self.step4),
            other => Err(Error::InvalidStep(other)),
        }
    }

    /// Mark a step (1-based) complete
    pub fn complete_step(&mut self, step: u8) -> Result<()> {
        *self.step_mut(step)? = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn steps(&self) -> [bool; ONBOARDING_STEPS as usize] {
        [self.step1, self.step2, self.step3, self.step4]
    }

    /// Steps still outstanding, 1-based
    pub fn missing_steps(&self) -> Vec<u8> {
        self.steps()
            .iter()
            .zip(1..=ONBOARDING_STEPS)
            .filter(|(done, _)| !**done)
            .map(|(_, step)| step)
            .collect()
    }

    pub fn all_steps_complete(&self) -> bool {
        self.steps().iter().all(|done| *done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_steps() {
        let mut status = OnboardingStatus::new(Uuid::nil());
        assert_eq!(status.missing_steps(), vec![1, 2, 3, 4]);

        status.complete_step(2).unwrap();
        status.complete_step(4).unwrap();
        assert_eq!(status.missing_steps(), vec![1, 3]);
        assert!(!status.all_steps_complete());

        status.complete_step(1).unwrap();
        status.complete_step(3).unwrap();
        assert!(status.all_steps_complete());
        assert!(!status.is_submitted);
    }

    #[test]
    fn test_step_out_of_range() {
        let mut status = OnboardingStatus::new(Uuid::nil());
        assert_eq!(status.complete_step(0), Err(Error::InvalidStep(0)));
        assert_eq!(status.complete_step(5), Err(Error::InvalidStep(5)));
    }
}
