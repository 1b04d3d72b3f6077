use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::time::Instant;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::engine::{EngineError, PlaybackResult, PlaybackState, RsvpEngine};
use crate::time_series::TimeSeriesPoint;

/// What the host shows, kept current by the engine callbacks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingView {
    pub word: Option<String>,
    /// 1-based position of `word` in the sequence
    pub position: usize,
    pub total: usize,
    pub wpm: u32,
    pub paused: bool,
    pub wpm_coords: Vec<TimeSeriesPoint>,
    pub result: Option<PlaybackResult>,
    pub finished_at: Option<DateTime<Local>>,
}

impl ReadingView {
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.position as f64 / self.total as f64
        }
    }
}

/// Printed with `--json` once a run ends
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub passage: String,
    pub finished_at: DateTime<Local>,
    pub result: PlaybackResult,
}

/// One passage being read: the engine plus the view its callbacks feed
#[derive(Debug)]
pub struct ReadingSession<C: Clock + Clone + 'static = SystemClock> {
    title: String,
    wpm_step: u32,
    engine: RsvpEngine<C>,
    view: Rc<RefCell<ReadingView>>,
    started_at: Rc<Cell<Option<Instant>>>,
    clock: C,
}

impl ReadingSession<SystemClock> {
    pub fn new(title: String, words: Vec<String>, config: &Config) -> Result<Self, EngineError> {
        Self::with_clock(title, words, config, SystemClock)
    }
}

impl<C: Clock + Clone + 'static> ReadingSession<C> {
    pub fn with_clock(
        title: String,
        words: Vec<String>,
        config: &Config,
        clock: C,
    ) -> Result<Self, EngineError> {
        let engine = RsvpEngine::with_clock(words, config.playback(), clock.clone())?;

        let mut session = Self {
            title,
            wpm_step: config.wpm_step,
            engine,
            view: Rc::new(RefCell::new(ReadingView::default())),
            started_at: Rc::new(Cell::new(None)),
            clock,
        };
        session.wire_hooks();
        Ok(session)
    }

    fn wire_hooks(&mut self) {
        let view = self.view.clone();
        self.engine.on_word(move |word, index, total| {
            let mut view = view.borrow_mut();
            view.word = Some(word.to_string());
            view.position = index + 1;
            view.total = total;
        });

        let view = self.view.clone();
        let started_at = self.started_at.clone();
        self.engine.on_wpm_change_at(move |wpm, at| {
            let mut view = view.borrow_mut();
            view.wpm = wpm;
            if let Some(started) = started_at.get() {
                let t = at.saturating_duration_since(started).as_secs_f64();
                view.wpm_coords.push(TimeSeriesPoint::new(t, f64::from(wpm)));
            }
        });

        let view = self.view.clone();
        self.engine.on_pause_change(move |paused| {
            view.borrow_mut().paused = paused;
        });

        let view = self.view.clone();
        self.engine.on_finish(move |result| {
            let mut view = view.borrow_mut();
            view.word = None;
            view.paused = false;
            view.wpm = result.end_wpm;
            view.result = Some(result);
            view.finished_at = Some(Local::now());
        });
    }

    /// Begin (or begin again) reading from the first word
    pub fn start(&mut self) {
        if self.engine.is_running() {
            return;
        }

        let start_wpm = self.engine.config().start_wpm;
        {
            let mut view = self.view.borrow_mut();
            *view = ReadingView {
                total: self.engine.total_words(),
                wpm: start_wpm,
                wpm_coords: vec![TimeSeriesPoint::new(0.0, f64::from(start_wpm))],
                ..ReadingView::default()
            };
        }
        self.started_at.set(Some(self.clock.now()));
        self.engine.start();
    }

    /// Advance timers; called on every runner tick
    pub fn tick(&mut self) {
        self.engine.poll();
    }

    pub fn toggle_pause(&mut self) {
        self.engine.toggle_pause();
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    pub fn speed_up(&mut self) {
        self.engine.increase_wpm(self.wpm_step);
    }

    pub fn slow_down(&mut self) {
        self.engine.decrease_wpm(self.wpm_step);
    }

    pub fn view(&self) -> Ref<'_, ReadingView> {
        self.view.borrow()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> PlaybackState {
        self.engine.state()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn has_finished(&self) -> bool {
        self.view.borrow().result.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.engine.next_deadline()
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        let view = self.view.borrow();
        Some(SessionSummary {
            passage: self.title.clone(),
            finished_at: view.finished_at?,
            result: view.result?,
        })
    }
}

impl<C: Clock + Clone + 'static> Drop for ReadingSession<C> {
    fn drop(&mut self) {
        self.engine.destroy();
    }
}
