//! RSVP playback engine.
//!
//! Paces word delivery at a variable rate, ramps the rate on a fixed
//! schedule and reports a [`PlaybackResult`] when playback ends. The engine
//! owns two timers, a one-shot word-advance deadline and a fixed-period ramp
//! deadline. Neither runs on its own thread: the host calls [`RsvpEngine::poll`]
//! from its event loop and every timer that has come due fires in deadline
//! order. Cancelling a timer is clearing its deadline, so nothing can fire
//! after [`RsvpEngine::stop`] or [`RsvpEngine::destroy`] return.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{Clock, SystemClock};

/// Lowest rate the engine will ever display at
pub const MIN_WPM: u32 = 50;

/// Step used by hosts for manual speed up / slow down
pub const DEFAULT_WPM_STEP: u32 = 25;

/// Pacing parameters, fixed for the duration of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub start_wpm: u32,
    /// WPM added on every ramp tick
    pub increment: u32,
    /// Seconds between ramp ticks
    pub interval_secs: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            start_wpm: 200,
            increment: 25,
            interval_secs: 30,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start_wpm < MIN_WPM {
            return Err(EngineError::StartWpmBelowFloor(self.start_wpm));
        }
        if self.interval_secs == 0 {
            return Err(EngineError::ZeroInterval);
        }
        Ok(())
    }

    fn ramp_period(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_secs))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("start wpm {0} is below the minimum of {min}", min = MIN_WPM)]
    StartWpmBelowFloor(u32),
    #[error("ramp interval must be at least one second")]
    ZeroInterval,
}

/// Summary of one run, emitted exactly once when playback stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackResult {
    pub start_wpm: u32,
    pub end_wpm: u32,
    pub wpm_increment: u32,
    pub increment_interval_secs: u32,
    pub total_words_read: usize,
    pub duration_secs: u64,
    /// False only when the word sequence ran out
    pub stopped_by_user: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Stopped,
}

type WordHook = Box<dyn FnMut(&str, usize, usize)>;
type WpmHook = Box<dyn FnMut(u32, Instant)>;
type PauseHook = Box<dyn FnMut(bool)>;
type FinishHook = Box<dyn FnMut(PlaybackResult)>;

#[derive(Default)]
struct Hooks {
    on_word: Option<WordHook>,
    on_wpm_change: Option<WpmHook>,
    on_pause_change: Option<PauseHook>,
    on_finish: Option<FinishHook>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Due {
    Word(Instant),
    Ramp(Instant),
}

pub struct RsvpEngine<C: Clock = SystemClock> {
    words: Vec<String>,
    config: PlaybackConfig,
    clock: C,
    current_index: usize,
    current_wpm: u32,
    running: bool,
    paused: bool,
    stopped: bool,
    started_at: Option<Instant>,
    word_due: Option<Instant>,
    ramp_due: Option<Instant>,
    hooks: Hooks,
}

impl RsvpEngine<SystemClock> {
    pub fn new(words: Vec<String>, config: PlaybackConfig) -> Result<Self, EngineError> {
        Self::with_clock(words, config, SystemClock)
    }
}

impl<C: Clock> RsvpEngine<C> {
    pub fn with_clock(
        words: Vec<String>,
        config: PlaybackConfig,
        clock: C,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        Ok(Self {
            words,
            current_wpm: config.start_wpm,
            config,
            clock,
            current_index: 0,
            running: false,
            paused: false,
            stopped: false,
            started_at: None,
            word_due: None,
            ramp_due: None,
            hooks: Hooks::default(),
        })
    }

    /// Called with `(word, index, total)` for every word shown
    pub fn on_word<F>(&mut self, f: F)
    where
        F: FnMut(&str, usize, usize) + 'static,
    {
        self.hooks.on_word = Some(Box::new(f));
    }

    pub fn on_wpm_change<F>(&mut self, mut f: F)
    where
        F: FnMut(u32) + 'static,
    {
        self.hooks.on_wpm_change = Some(Box::new(move |wpm, _| f(wpm)));
    }

    /// Like [`on_wpm_change`](Self::on_wpm_change), also passing when the
    /// change took effect: the ramp deadline for ramp steps, the clock time
    /// for manual changes. Shares the same slot.
    pub fn on_wpm_change_at<F>(&mut self, f: F)
    where
        F: FnMut(u32, Instant) + 'static,
    {
        self.hooks.on_wpm_change = Some(Box::new(f));
    }

    pub fn on_pause_change<F>(&mut self, f: F)
    where
        F: FnMut(bool) + 'static,
    {
        self.hooks.on_pause_change = Some(Box::new(f));
    }

    pub fn on_finish<F>(&mut self, f: F)
    where
        F: FnMut(PlaybackResult) + 'static,
    {
        self.hooks.on_finish = Some(Box::new(f));
    }

    pub fn wpm(&self) -> u32 {
        self.current_wpm
    }

    /// Fraction of the sequence already shown, 0 for an empty sequence
    pub fn progress(&self) -> f64 {
        if self.words.is_empty() {
            0.0
        } else {
            self.current_index as f64 / self.words.len() as f64
        }
    }

    pub fn word_index(&self) -> usize {
        self.current_index
    }

    pub fn total_words(&self) -> usize {
        self.words.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn state(&self) -> PlaybackState {
        match (self.running, self.paused, self.stopped) {
            (true, true, _) => PlaybackState::Paused,
            (true, false, _) => PlaybackState::Playing,
            (false, _, true) => PlaybackState::Stopped,
            (false, _, false) => PlaybackState::Idle,
        }
    }

    /// Earliest pending timer deadline, if any timer is armed
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.word_due, self.ramp_due) {
            (Some(w), Some(r)) => Some(w.min(r)),
            (w, r) => w.or(r),
        }
    }

    pub fn start(&mut self) {
        if self.running {
            debug!("start ignored, engine already {}", self.state());
            return;
        }

        let now = self.clock.now();
        self.running = true;
        self.paused = false;
        self.stopped = false;
        self.started_at = Some(now);
        self.current_index = 0;
        self.current_wpm = self.config.start_wpm;
        self.ramp_due = Some(now + self.config.ramp_period());

        info!(
            "playback started: {} words at {} wpm (+{} every {}s)",
            self.words.len(),
            self.config.start_wpm,
            self.config.increment,
            self.config.interval_secs
        );

        self.show_next(now, now);
    }

    pub fn pause(&mut self) {
        if !self.running || self.paused {
            debug!("pause ignored in state {}", self.state());
            return;
        }

        self.paused = true;
        self.word_due = None;
        debug!("paused at word {}", self.current_index);
        self.emit_pause_change();
    }

    /// Resume playback, showing the next word right away
    pub fn resume(&mut self) {
        if !self.running || !self.paused {
            debug!("resume ignored in state {}", self.state());
            return;
        }

        self.paused = false;
        debug!("resumed at word {}", self.current_index);
        self.emit_pause_change();

        let now = self.clock.now();
        self.show_next(now, now);
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set the display rate, clamped to [`MIN_WPM`]
    pub fn set_wpm(&mut self, wpm: u32) {
        self.current_wpm = wpm.max(MIN_WPM);
        let now = self.clock.now();
        self.emit_wpm_change(now);
    }

    pub fn increase_wpm(&mut self, amount: u32) {
        self.set_wpm(self.current_wpm.saturating_add(amount));
    }

    pub fn decrease_wpm(&mut self, amount: u32) {
        self.set_wpm(self.current_wpm.saturating_sub(amount));
    }

    pub fn stop(&mut self) {
        if !self.running {
            debug!("stop ignored in state {}", self.state());
            return;
        }

        let now = self.clock.now();
        self.finish(now);
    }

    /// Cancel all timers and drop every callback without reporting a result
    pub fn destroy(&mut self) {
        self.word_due = None;
        self.ramp_due = None;
        if self.running {
            self.stopped = true;
        }
        self.running = false;
        self.paused = false;
        self.hooks = Hooks::default();
    }

    /// Fire every timer that is due at the current clock time.
    ///
    /// At most one word is shown per call: a word timer that fell a whole
    /// interval behind re-arms from `now` instead of replaying the missed
    /// words back to back.
    pub fn poll(&mut self) {
        let now = self.clock.now();

        while let Some(due) = self.next_due(now) {
            match due {
                Due::Ramp(at) => self.ramp_tick(at),
                Due::Word(at) => {
                    self.word_due = None;
                    self.show_next(at, now);
                }
            }
        }
    }

    // Ramp wins ties so an increment landing on a word boundary already
    // paces the following word.
    fn next_due(&self, now: Instant) -> Option<Due> {
        let ramp = self.ramp_due.filter(|at| *at <= now);
        let word = self.word_due.filter(|at| *at <= now);

        match (ramp, word) {
            (Some(r), Some(w)) if w < r => Some(Due::Word(w)),
            (Some(r), _) => Some(Due::Ramp(r)),
            (None, Some(w)) => Some(Due::Word(w)),
            (None, None) => None,
        }
    }

    fn word_delay(&self) -> Duration {
        Duration::from_nanos(60_000_000_000 / u64::from(self.current_wpm))
    }

    fn show_next(&mut self, at: Instant, now: Instant) {
        if !self.running || self.paused {
            return;
        }

        let total = self.words.len();
        if self.current_index >= total {
            self.finish(at);
            return;
        }

        let word = &self.words[self.current_index];
        if let Some(hook) = self.hooks.on_word.as_mut() {
            hook(word, self.current_index, total);
        }
        self.current_index += 1;

        let delay = self.word_delay();
        let due = at + delay;
        self.word_due = Some(if due > now { due } else { now + delay });
    }

    fn ramp_tick(&mut self, at: Instant) {
        self.ramp_due = Some(at + self.config.ramp_period());

        // increments that land during a pause are dropped, not deferred
        if self.paused {
            debug!("ramp tick skipped while paused");
            return;
        }

        self.current_wpm = self.current_wpm.saturating_add(self.config.increment);
        debug!("ramped to {} wpm", self.current_wpm);
        self.emit_wpm_change(at);
    }

    fn finish(&mut self, at: Instant) {
        self.running = false;
        self.paused = false;
        self.stopped = true;
        self.word_due = None;
        self.ramp_due = None;

        let elapsed = self
            .started_at
            .map(|started| at.saturating_duration_since(started))
            .unwrap_or_default();

        let result = PlaybackResult {
            start_wpm: self.config.start_wpm,
            end_wpm: self.current_wpm,
            wpm_increment: self.config.increment,
            increment_interval_secs: self.config.interval_secs,
            total_words_read: self.current_index,
            duration_secs: elapsed.as_secs_f64().round() as u64,
            stopped_by_user: self.current_index < self.words.len(),
        };

        info!(
            "playback finished: {}/{} words, {} -> {} wpm in {}s{}",
            result.total_words_read,
            self.words.len(),
            result.start_wpm,
            result.end_wpm,
            result.duration_secs,
            if result.stopped_by_user {
                " (stopped early)"
            } else {
                ""
            }
        );

        if let Some(hook) = self.hooks.on_finish.as_mut() {
            hook(result);
        }
    }

    fn emit_wpm_change(&mut self, at: Instant) {
        let wpm = self.current_wpm;
        if let Some(hook) = self.hooks.on_wpm_change.as_mut() {
            hook(wpm, at);
        }
    }

    fn emit_pause_change(&mut self) {
        let paused = self.paused;
        if let Some(hook) = self.hooks.on_pause_change.as_mut() {
            hook(paused);
        }
    }
}

impl<C: Clock> fmt::Debug for RsvpEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsvpEngine")
            .field("state", &self.state())
            .field("current_index", &self.current_index)
            .field("total_words", &self.words.len())
            .field("current_wpm", &self.current_wpm)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Word(String, usize, usize),
        Wpm(u32),
        Pause(bool),
        Finish(PlaybackResult),
    }

    type Log = Rc<RefCell<Vec<Seen>>>;

    fn config(start_wpm: u32, increment: u32, interval_secs: u32) -> PlaybackConfig {
        PlaybackConfig {
            start_wpm,
            increment,
            interval_secs,
        }
    }

    fn engine_with(
        words: &[&str],
        cfg: PlaybackConfig,
    ) -> (RsvpEngine<ManualClock>, ManualClock, Log) {
        let clock = ManualClock::new();
        let words = words.iter().map(|w| w.to_string()).collect();
        let mut engine = RsvpEngine::with_clock(words, cfg, clock.clone()).unwrap();
        let log: Log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        engine.on_word(move |w, i, n| l.borrow_mut().push(Seen::Word(w.to_string(), i, n)));
        let l = log.clone();
        engine.on_wpm_change(move |wpm| l.borrow_mut().push(Seen::Wpm(wpm)));
        let l = log.clone();
        engine.on_pause_change(move |p| l.borrow_mut().push(Seen::Pause(p)));
        let l = log.clone();
        engine.on_finish(move |r| l.borrow_mut().push(Seen::Finish(r)));

        (engine, clock, log)
    }

    fn words_seen(log: &Log) -> Vec<usize> {
        log.borrow()
            .iter()
            .filter_map(|s| match s {
                Seen::Word(_, i, _) => Some(*i),
                _ => None,
            })
            .collect()
    }

    fn finishes(log: &Log) -> Vec<PlaybackResult> {
        log.borrow()
            .iter()
            .filter_map(|s| match s {
                Seen::Finish(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    fn numbered_words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("w{i}")).collect()
    }

    #[test]
    fn test_start_shows_first_word_immediately() {
        let (mut engine, _clock, log) = engine_with(&["a", "b", "c"], config(200, 25, 30));

        engine.start();

        assert_eq!(*log.borrow(), vec![Seen::Word("a".into(), 0, 3)]);
        assert_eq!(engine.state(), PlaybackState::Playing);
        assert_eq!(engine.word_index(), 1);
    }

    #[test]
    fn test_stop_after_first_word() {
        let (mut engine, _clock, log) = engine_with(&["a", "b", "c"], config(200, 25, 30));

        engine.start();
        engine.stop();

        let results = finishes(&log);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].total_words_read, 1);
        assert!(results[0].stopped_by_user);
        assert_eq!(results[0].start_wpm, 200);
        assert_eq!(results[0].wpm_increment, 25);
        assert_eq!(results[0].increment_interval_secs, 30);
        assert_eq!(engine.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_runs_to_natural_completion() {
        let (mut engine, clock, log) = engine_with(&["a", "b", "c"], config(200, 25, 30));

        engine.start();
        for _ in 0..4 {
            clock.advance_ms(300);
            engine.poll();
        }

        assert_eq!(words_seen(&log), vec![0, 1, 2]);
        let results = finishes(&log);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].total_words_read, 3);
        assert!(!results[0].stopped_by_user);
        // last word's interval expires at 900ms
        assert_eq!(results[0].duration_secs, 1);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_word_pacing_follows_wpm() {
        let (mut engine, clock, log) = engine_with(&["a", "b", "c"], config(200, 25, 30));

        engine.start();
        clock.advance_ms(299);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0]);

        clock.advance_ms(1);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1]);
    }

    #[test]
    fn test_set_wpm_clamps_to_floor() {
        let (mut engine, _clock, log) = engine_with(&["a"], config(200, 25, 30));

        engine.set_wpm(10);

        assert_eq!(engine.wpm(), MIN_WPM);
        assert_eq!(*log.borrow(), vec![Seen::Wpm(50)]);
    }

    #[test]
    fn test_decrease_wpm_never_goes_below_floor() {
        let (mut engine, _clock, log) = engine_with(&["a", "b"], config(75, 25, 30));

        engine.start();
        engine.decrease_wpm(DEFAULT_WPM_STEP);
        engine.decrease_wpm(DEFAULT_WPM_STEP);
        engine.increase_wpm(DEFAULT_WPM_STEP);

        let wpms: Vec<Seen> = log
            .borrow()
            .iter()
            .filter(|s| matches!(s, Seen::Wpm(_)))
            .cloned()
            .collect();
        assert_eq!(wpms, vec![Seen::Wpm(50), Seen::Wpm(50), Seen::Wpm(75)]);
    }

    #[test]
    fn test_late_poll_shows_one_word() {
        let words = numbered_words(50);
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let (mut engine, clock, log) = engine_with(&refs, config(200, 25, 30));

        engine.start();
        clock.advance_ms(3_000);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1]);

        // next word is a full interval after the late poll, not overdue
        let polled_at = clock.now();
        assert_eq!(
            engine.next_deadline(),
            Some(polled_at + Duration::from_millis(300))
        );
        clock.advance_ms(299);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1]);
        clock.advance_ms(1);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1, 2]);
    }

    #[test]
    fn test_slightly_late_poll_keeps_pacing() {
        let (mut engine, clock, log) = engine_with(&["a", "b", "c", "d"], config(200, 25, 30));

        engine.start();
        clock.advance_ms(350);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1]);

        // still due 300ms after the missed deadline
        clock.advance_ms(250);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1, 2]);
    }

    #[test]
    fn test_wpm_change_at_reports_ramp_deadlines() {
        let words = numbered_words(100);
        let clock = ManualClock::new();
        let t0 = clock.now();
        let mut engine = RsvpEngine::with_clock(words, config(200, 25, 1), clock.clone()).unwrap();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let c = changes.clone();
        engine.on_wpm_change_at(move |wpm, at| c.borrow_mut().push((wpm, at - t0)));

        engine.start();
        clock.advance_ms(2_500);
        engine.poll();
        engine.increase_wpm(DEFAULT_WPM_STEP);

        assert_eq!(
            *changes.borrow(),
            vec![
                (225, Duration::from_secs(1)),
                (250, Duration::from_secs(2)),
                (275, Duration::from_millis(2_500)),
            ]
        );
    }

    #[test]
    fn test_speed_change_applies_to_next_word() {
        let (mut engine, clock, log) = engine_with(&["a", "b", "c", "d"], config(200, 25, 30));

        engine.start();
        // word "b" is already scheduled 300ms out at 200 wpm
        engine.set_wpm(600);
        clock.advance_ms(300);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1]);

        // following delay is 100ms at 600 wpm
        clock.advance_ms(100);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1, 2]);
    }

    #[test]
    fn test_pause_twice_notifies_once() {
        let (mut engine, _clock, log) = engine_with(&["a", "b"], config(200, 25, 30));

        engine.start();
        engine.pause();
        engine.pause();

        let pauses = log
            .borrow()
            .iter()
            .filter(|s| matches!(s, Seen::Pause(_)))
            .count();
        assert_eq!(pauses, 1);
        assert_eq!(engine.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_pause_and_resume_are_noops_when_idle() {
        let (mut engine, _clock, log) = engine_with(&["a", "b"], config(200, 25, 30));

        engine.pause();
        engine.resume();
        engine.stop();

        assert!(log.borrow().is_empty());
        assert_eq!(engine.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_pause_holds_word_advance() {
        let (mut engine, clock, log) = engine_with(&["a", "b", "c"], config(200, 25, 30));

        engine.start();
        engine.pause();
        clock.advance_ms(5_000);
        engine.poll();

        assert_eq!(words_seen(&log), vec![0]);
        assert!(finishes(&log).is_empty());
    }

    #[test]
    fn test_resume_shows_next_word_immediately() {
        let (mut engine, clock, log) = engine_with(&["a", "b", "c", "d"], config(200, 25, 30));

        engine.start();
        clock.advance_ms(100);
        engine.pause();
        clock.advance_ms(5_000);
        engine.resume();

        assert_eq!(words_seen(&log), vec![0, 1]);
        assert_eq!(log.borrow()[1], Seen::Pause(true));
        assert_eq!(log.borrow()[2], Seen::Pause(false));

        // then a full interval before the next one
        clock.advance_ms(299);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1]);
        clock.advance_ms(1);
        engine.poll();
        assert_eq!(words_seen(&log), vec![0, 1, 2]);
    }

    #[test]
    fn test_toggle_pause() {
        let (mut engine, _clock, log) = engine_with(&["a", "b"], config(200, 25, 30));

        engine.start();
        engine.toggle_pause();
        assert!(engine.is_paused());
        engine.toggle_pause();
        assert!(!engine.is_paused());

        assert!(log.borrow().contains(&Seen::Pause(true)));
        assert!(log.borrow().contains(&Seen::Pause(false)));
    }

    #[test]
    fn test_ramp_increments_on_schedule() {
        let words = numbered_words(100);
        let clock = ManualClock::new();
        let mut engine = RsvpEngine::with_clock(words, config(200, 100, 1), clock.clone()).unwrap();
        let shown = Rc::new(RefCell::new(Vec::new()));
        let s = shown.clone();
        engine.on_word(move |_, i, _| s.borrow_mut().push(i));

        engine.start();
        for _ in 0..1199 {
            clock.advance_ms(1);
            engine.poll();
        }
        // words at 0, 300, 600, 900; ramp to 300 wpm at 1000
        assert_eq!(*shown.borrow(), vec![0, 1, 2, 3]);
        assert_eq!(engine.wpm(), 300);

        // word 4 keeps its 1200ms deadline, word 5 follows 200ms later
        clock.advance_ms(1);
        engine.poll();
        assert_eq!(shown.borrow().len(), 5);
        clock.advance_ms(199);
        engine.poll();
        assert_eq!(shown.borrow().len(), 5);
        clock.advance_ms(1);
        engine.poll();
        assert_eq!(shown.borrow().len(), 6);
    }

    #[test]
    fn test_ramp_wins_tie_with_word_advance() {
        let words = numbered_words(10);
        let clock = ManualClock::new();
        let mut engine = RsvpEngine::with_clock(words, config(60, 60, 1), clock.clone()).unwrap();
        let shown = Rc::new(RefCell::new(Vec::new()));
        let s = shown.clone();
        engine.on_word(move |_, i, _| s.borrow_mut().push(i));

        engine.start();
        clock.advance_ms(1000);
        engine.poll();
        assert_eq!(engine.wpm(), 120);
        assert_eq!(*shown.borrow(), vec![0, 1]);

        clock.advance_ms(500);
        engine.poll();
        assert_eq!(*shown.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_ramp_ticks_while_paused_are_dropped() {
        let words = numbered_words(100);
        let (mut engine, clock, log) = {
            let clock = ManualClock::new();
            let mut engine =
                RsvpEngine::with_clock(words, config(200, 25, 1), clock.clone()).unwrap();
            let log: Log = Rc::new(RefCell::new(Vec::new()));
            let l = log.clone();
            engine.on_wpm_change(move |wpm| l.borrow_mut().push(Seen::Wpm(wpm)));
            (engine, clock, log)
        };

        engine.start();
        engine.pause();
        clock.advance_ms(2_500);
        engine.poll();

        assert_eq!(engine.wpm(), 200);
        assert!(log.borrow().is_empty());

        // the ramp clock kept its own schedule: next tick at 3s
        engine.resume();
        clock.advance_ms(500);
        engine.poll();
        assert_eq!(engine.wpm(), 225);
        assert_eq!(*log.borrow(), vec![Seen::Wpm(225)]);
    }

    #[test]
    fn test_destroy_silences_everything() {
        let (mut engine, clock, log) = engine_with(&["a", "b", "c"], config(200, 25, 1));

        engine.start();
        engine.destroy();
        engine.destroy();
        clock.advance_ms(120_000);
        engine.poll();
        engine.stop();
        engine.set_wpm(300);

        assert_eq!(*log.borrow(), vec![Seen::Word("a".into(), 0, 3)]);
        assert!(!engine.is_running());
        assert!(!engine.is_paused());
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn test_empty_sequence_finishes_immediately() {
        let (mut engine, _clock, log) = engine_with(&[], config(200, 25, 30));

        engine.start();

        let seen = log.borrow();
        assert_eq!(seen.len(), 1);
        assert_matches!(
            seen[0],
            Seen::Finish(PlaybackResult {
                total_words_read: 0,
                stopped_by_user: false,
                duration_secs: 0,
                ..
            })
        );
        assert_eq!(engine.state(), PlaybackState::Stopped);
        assert_eq!(engine.progress(), 0.0);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let (mut engine, _clock, log) = engine_with(&["a", "b", "c"], config(200, 25, 30));

        engine.start();
        engine.start();

        assert_eq!(words_seen(&log), vec![0]);
        assert_eq!(engine.word_index(), 1);
    }

    #[test]
    fn test_restart_after_stop_resets_state() {
        let (mut engine, clock, log) = engine_with(&["a", "b", "c"], config(200, 25, 30));

        engine.start();
        clock.advance_ms(300);
        engine.poll();
        engine.stop();
        engine.set_wpm(400);

        engine.start();

        assert_eq!(engine.wpm(), 200);
        assert_eq!(engine.word_index(), 1);
        assert_eq!(words_seen(&log), vec![0, 1, 0]);
        assert_eq!(finishes(&log).len(), 1);
    }

    #[test]
    fn test_stop_reports_once() {
        let (mut engine, _clock, log) = engine_with(&["a", "b"], config(200, 25, 30));

        engine.start();
        engine.stop();
        engine.stop();

        assert_eq!(finishes(&log).len(), 1);
    }

    #[test]
    fn test_duration_is_rounded() {
        let (mut engine, clock, log) = engine_with(&["a", "b"], config(200, 25, 30));

        engine.start();
        engine.pause();
        clock.advance_ms(2_600);
        engine.stop();

        assert_eq!(finishes(&log)[0].duration_secs, 3);
    }

    #[test]
    fn test_end_wpm_reflects_ramp_and_adjustments() {
        let words = numbered_words(1000);
        let clock = ManualClock::new();
        let mut engine = RsvpEngine::with_clock(words, config(200, 25, 30), clock.clone()).unwrap();
        let result = Rc::new(RefCell::new(None));
        let r = result.clone();
        engine.on_finish(move |res| *r.borrow_mut() = Some(res));

        engine.start();
        clock.advance_ms(60_000);
        engine.poll();
        engine.increase_wpm(DEFAULT_WPM_STEP);
        engine.stop();

        let result = result.borrow().unwrap();
        assert_eq!(result.end_wpm, 275);
        assert_eq!(result.start_wpm, 200);
        assert!(result.stopped_by_user);
    }

    #[test]
    fn test_progress_and_accessors() {
        let (mut engine, _clock, _log) = engine_with(&["a", "b", "c", "d"], config(200, 25, 30));

        assert_eq!(engine.progress(), 0.0);
        assert_eq!(engine.total_words(), 4);

        engine.start();
        assert_eq!(engine.progress(), 0.25);
        assert!(engine.is_running());
        assert!(!engine.is_paused());
        assert!(engine.next_deadline().is_some());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PlaybackState::Playing.to_string(), "Playing");
        assert_eq!(PlaybackState::Stopped.to_string(), "Stopped");
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert_matches!(
            RsvpEngine::new(vec![], config(10, 25, 30)),
            Err(EngineError::StartWpmBelowFloor(10))
        );
        assert_matches!(
            RsvpEngine::new(vec![], config(200, 25, 0)),
            Err(EngineError::ZeroInterval)
        );
        assert!(RsvpEngine::new(vec![], PlaybackConfig::default()).is_ok());
    }

    #[test]
    fn test_result_serializes() {
        let result = PlaybackResult {
            start_wpm: 200,
            end_wpm: 250,
            wpm_increment: 25,
            increment_interval_secs: 30,
            total_words_read: 120,
            duration_secs: 61,
            stopped_by_user: true,
        };

        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["end_wpm"], 250);
        assert_eq!(json["stopped_by_user"], true);
    }
}
