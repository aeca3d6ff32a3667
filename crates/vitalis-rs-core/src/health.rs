//! Randomised health snapshot used to seed a new user's memories.

use rand::Rng;
use serde::{Deserialize, Serialize};
use vitalis_rs_memory::MemoryValue;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStats {
    pub steps: u32,
    pub calories_burned: f64,
    pub active_minutes: u32,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeartRate {
    pub resting: u32,
    pub current: u32,
    pub max_today: u32,
    pub variability: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sleep {
    pub duration_hours: f64,
    pub deep_sleep_hours: f64,
    pub rem_sleep_hours: f64,
    pub light_sleep_hours: f64,
    pub sleep_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthGoals {
    pub daily_steps: u32,
    pub weekly_workouts: u32,
    pub sleep_target: f64,
    pub resting_heart_rate_target: u32,
}

impl Default for HealthGoals {
    fn default() -> Self {
        Self {
            daily_steps: 10_000,
            weekly_workouts: 3,
            sleep_target: 8.0,
            resting_heart_rate_target: 65,
        }
    }
}

/// Snapshot of a user's activity, heart rate, sleep, goals and achievements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthProfile {
    pub daily_stats: DailyStats,
    pub heart_rate: HeartRate,
    pub sleep: Sleep,
    pub goals: HealthGoals,
    pub achievements: Vec<String>,
}

const ACHIEVEMENTS: [&str; 3] = [
    "7-day streak of meeting step goal",
    "Improved sleep score by 15% this month",
    "Consistent heart rate variability",
];

impl HealthProfile {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let steps = rng.random_range(6_000..=12_000);
        let resting = rng.random_range(58..=72);
        let duration_hours = rng.random_range(6.5..=8.5);
        Self {
            daily_stats: DailyStats {
                steps,
                calories_burned: f64::from(steps) * 0.04,
                active_minutes: rng.random_range(20..=60),
                distance_km: f64::from(steps) * 0.0008,
            },
            heart_rate: HeartRate {
                resting,
                current: rng.random_range(resting + 10..=resting + 40),
                max_today: rng.random_range(resting + 50..=resting + 80),
                variability: rng.random_range(20..=50),
            },
            sleep: Sleep {
                duration_hours,
                deep_sleep_hours: duration_hours * 0.25,
                rem_sleep_hours: duration_hours * 0.20,
                light_sleep_hours: duration_hours * 0.55,
                sleep_score: rng.random_range(70..=95),
            },
            goals: HealthGoals::default(),
            achievements: ACHIEVEMENTS.iter().map(|item| item.to_string()).collect(),
        }
    }

    /// The five memories written when a user is initialised.
    pub fn memories(&self) -> Vec<MemoryValue> {
        vec![
            MemoryValue::new(format!(
                "User's daily step count: {} steps",
                self.daily_stats.steps
            ))
            .with_context("Daily activity tracking data"),
            MemoryValue::new(format!(
                "User's resting heart rate: {} bpm",
                self.heart_rate.resting
            ))
            .with_context("Heart rate monitoring data"),
            MemoryValue::new(format!(
                "User's sleep duration: {:.1} hours with sleep score {}",
                self.sleep.duration_hours, self.sleep.sleep_score
            ))
            .with_context("Sleep quality and duration data"),
            MemoryValue::new(format!(
                "User's current goals: {} daily steps, {} weekly workouts",
                self.goals.daily_steps, self.goals.weekly_workouts
            ))
            .with_context("Fitness and health goals"),
            MemoryValue::new(format!(
                "Recent achievements: {}",
                self.achievements.join(", ")
            ))
            .with_context("User's fitness accomplishments"),
        ]
    }
}
