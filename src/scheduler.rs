//! Wall-clock schedule engine.
//!
//! Holds an immutable list of time-of-day rules.  The scheduler notifies a
//! [`SchedulerDelegate`] when a rule fires; the main loop implements the
//! delegate to push the command into the event queue, so scheduled
//! commands take exactly the same path as remote ones.
//!
//! ```text
//! ┌───────────────┐   tick(utc)   ┌─────────────┐  on_schedule_fired  ┌─────────────┐
//! │ SNTP wall     │──────────────▶│  Scheduler  │────────────────────▶│ Event Queue │
//! │ clock         │               │ (fixed tz)  │                     │ → Router    │
//! └───────────────┘               └─────────────┘                     └─────────────┘
//! ```
//!
//! Rules are evaluated in a configured timezone, never the host default, so
//! behaviour does not depend on where the firmware was built or deployed.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app::commands::{CommandEvent, Payload};
use crate::app::ports::{ConfigError, SchedulerDelegate};
use crate::config::ScheduleConfig;

/// Before SNTP sync the RTC counts from the epoch; anything earlier than
/// this is treated as "no wall clock".
pub const MIN_VALID_YEAR: i32 = 2020;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// Day classes an entry applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekdayFilter {
    /// Monday to Friday.
    WeekdaysOnly,
    /// Saturday and Sunday.
    WeekendOnly,
    #[default]
    Every,
}

impl WeekdayFilter {
    pub fn matches(self, day: Weekday) -> bool {
        let weekend = matches!(day, Weekday::Sat | Weekday::Sun);
        match self {
            Self::WeekdaysOnly => !weekend,
            Self::WeekendOnly => weekend,
            Self::Every => true,
        }
    }
}

/// A single immutable schedule rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    /// Human-readable label (e.g. "morning wake").
    pub label: String,
    pub hour: u8,
    pub minute: u8,
    pub days: WeekdayFilter,
    pub action: CommandEvent,
}

impl ScheduleEntry {
    /// Build an entry from its configuration record.
    pub fn from_config(cfg: &ScheduleConfig) -> Result<Self, ConfigError> {
        if cfg.hour > 23 {
            return Err(ConfigError::ValidationFailed("schedule hour must be 0-23"));
        }
        if cfg.minute > 59 {
            return Err(ConfigError::ValidationFailed("schedule minute must be 0-59"));
        }
        Ok(Self {
            label: cfg.label.clone(),
            hour: cfg.hour,
            minute: cfg.minute,
            days: cfg.days,
            action: CommandEvent {
                name: cfg.command.clone(),
                payload: Payload::Json(cfg.payload.clone()),
            },
        })
    }

    fn is_due(&self, local: &DateTime<Tz>) -> bool {
        local.hour() == u32::from(self.hour)
            && local.minute() == u32::from(self.minute)
            && self.days.matches(local.weekday())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The scheduler engine.
///
/// Decoupled from the event system: when an entry fires it invokes the
/// [`SchedulerDelegate`] callback rather than pushing events itself.
pub struct Scheduler {
    entries: Vec<ScheduleEntry>,
    /// Local date each entry last fired on (parallel to `entries`).
    last_fired: Vec<Option<NaiveDate>>,
    timezone: Tz,
}

impl Scheduler {
    pub fn new(entries: Vec<ScheduleEntry>, timezone: Tz) -> Self {
        for (i, e) in entries.iter().enumerate() {
            info!(
                "Scheduler: slot {} '{}' at {:02}:{:02} ({:?}) -> {} {}",
                i, e.label, e.hour, e.minute, e.days, e.action.name, e.action.payload
            );
        }
        let last_fired = vec![None; entries.len()];
        Self {
            entries,
            last_fired,
            timezone,
        }
    }

    /// Build from the configuration records and IANA timezone name.
    pub fn from_config(configs: &[ScheduleConfig], timezone: &str) -> Result<Self, ConfigError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| ConfigError::ValidationFailed("timezone is not a known IANA name"))?;
        let entries = configs
            .iter()
            .map(ScheduleEntry::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(entries, tz))
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Evaluate every entry against `now`.  Call at least once per minute.
    ///
    /// An entry fires at most once per local calendar day, on the first
    /// tick that falls inside its hour:minute.
    pub fn tick(&mut self, now: DateTime<Utc>, delegate: &mut dyn SchedulerDelegate) {
        if now.year() < MIN_VALID_YEAR {
            debug!("Scheduler: wall clock not synchronised yet");
            return;
        }
        let local = now.with_timezone(&self.timezone);
        let today = local.date_naive();

        for (entry, last) in self.entries.iter().zip(self.last_fired.iter_mut()) {
            if *last == Some(today) || !entry.is_due(&local) {
                continue;
            }
            info!(
                "Scheduler: '{}' fired at {} ({})",
                entry.label,
                local.format("%a %H:%M"),
                self.timezone
            );
            *last = Some(today);
            delegate.on_schedule_fired(&entry.label, &entry.action);
        }
        debug!("Scheduler: evaluated {} entries", self.entries.len());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
