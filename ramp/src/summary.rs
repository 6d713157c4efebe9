use crate::dataset::RateProfile;
use colored::{ColoredString, Colorize};
use human_repr::{HumanCount, HumanDuration};
use std::time::Duration;
use tracing::info;

/// Per-rate result lines printed once the datasets are written.
pub struct SweepSummary<'a> {
    profiles: &'a [RateProfile],
    elapsed: Duration,
    attacks: usize,
}

impl<'a> SweepSummary<'a> {
    pub fn new(profiles: &'a [RateProfile], elapsed: Duration, attacks: usize) -> Self {
        Self {
            profiles,
            elapsed,
            attacks,
        }
    }

    pub fn print(&self) {
        let cached = self.profiles.len().saturating_sub(self.attacks);
        info!(
            "{}",
            format!(
                "Sweep finished in {}: {} rates, {} attacked, {} cached",
                self.elapsed.human_duration(),
                self.profiles.len(),
                self.attacks,
                cached
            )
            .blue()
        );
        for profile in self.profiles {
            info!("{}", formatted_profile(profile));
        }
    }
}

fn formatted_profile(profile: &RateProfile) -> ColoredString {
    let modal = profile
        .modal_row()
        .filter(|row| row.fraction > 0.0)
        .map(|row| {
            Duration::from_nanos(row.boundary_ns)
                .human_duration()
                .to_string()
        })
        .unwrap_or_else(|| "-".to_owned());
    let line = format!(
        "rate {:>10.2}/s: {:>8} requests, success {:>6.2}%, modal latency bucket {}",
        profile.rate,
        profile.requests.human_count_bare().to_string(),
        profile.success_ratio * 100.0,
        modal
    );

    if profile.success_ratio >= 0.99 {
        line.green()
    } else if profile.success_ratio >= 0.9 {
        line.yellow()
    } else {
        line.red()
    }
}
