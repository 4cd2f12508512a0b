use crate::terminal::{Input, Screen};
use anyhow::{Context, Result};
use std::time::Duration;
use stroop_core::Locale;
use stroop_experiment::{Experimenter, SessionEvent, SessionState, Stats};
use tracing::{debug, info};

/// Upper bound on how long the loop sleeps waiting for a key.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Drives the loaded experiment from the keyboard until its run stops.
pub struct App<'a, 's> {
    experimenter: &'a mut Experimenter<'s>,
    locale: Locale,
    stats: Option<Stats>,
}

impl<'a, 's> App<'a, 's> {
    pub fn new(experimenter: &'a mut Experimenter<'s>, locale: Locale) -> Self {
        Self {
            experimenter,
            locale,
            stats: None,
        }
    }

    fn instructions(&self) -> Vec<String> {
        let lines: &[&str] = match self.locale {
            Locale::German => &[
                "Stroop-Test",
                "",
                "Benenne die Farbe, nicht das Wort.",
                "rot: R A 7   grün: G S 4   blau: B D 1   gelb: Y F 0",
                "Leertaste: Start/Pause   Esc: Ende",
            ],
            Locale::English => &[
                "Stroop task",
                "",
                "Name the ink color, not the word.",
                "red: R A 7   green: G S 4   blue: B D 1   yellow: Y F 0",
                "Space: start/pause   Esc: quit",
            ],
        };
        lines.iter().map(|l| l.to_string()).collect()
    }

    fn paused_message(&self) -> Vec<String> {
        let line = match self.locale {
            Locale::German => "Pause. Leertaste zum Fortsetzen.",
            Locale::English => "Paused. Press space to continue.",
        };
        vec![line.to_string()]
    }

    /// Runs one session on the terminal. Returns the stats of the finished run,
    /// or `None` when the participant left before starting.
    pub fn run(mut self) -> Result<Option<Stats>> {
        let mut screen = Screen::enter().context("cannot set up the terminal")?;
        screen.message(&self.instructions())?;

        loop {
            match screen.next_input(Duration::from_secs(3600))? {
                Some(Input::TogglePause) => break,
                Some(Input::Stop) => return Ok(None),
                _ => {}
            }
        }

        self.experimenter.active()?.start()?;
        while !self.pump(&mut screen)? {
            let wait = self
                .experimenter
                .active()?
                .next_deadline()
                .map_or(POLL_INTERVAL, |d| d.min(POLL_INTERVAL));

            if let Some(input) = screen.next_input(wait)? {
                self.handle_input(input, &mut screen)?;
            }
            self.experimenter.active()?.update()?;
        }
        Ok(self.stats)
    }

    /// Presents queued events. Returns true once the run has stopped.
    fn pump(&mut self, screen: &mut Screen) -> Result<bool> {
        let mut stopped = false;
        for event in self.experimenter.drain_events()? {
            match event {
                SessionEvent::RunStarted(index) => info!(index, "presenting run"),
                SessionEvent::StatsComputed(stats) => self.stats = Some(stats),
                SessionEvent::RunStopped(_) => stopped = true,
                other => screen.present(&other)?,
            }
        }
        Ok(stopped)
    }

    fn handle_input(&mut self, input: Input, screen: &mut Screen) -> Result<()> {
        let experiment = self.experimenter.active()?;
        match input {
            Input::Answer(color) => {
                if !experiment.respond(color)? {
                    debug!(?color, "key ignored");
                }
            }
            Input::TogglePause => {
                experiment.toggle_pause()?;
                if experiment.state() == SessionState::Paused {
                    screen.message(&self.paused_message())?;
                }
            }
            Input::Stop => {
                experiment.stop()?;
            }
        }
        Ok(())
    }
}
