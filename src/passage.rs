use include_dir::{include_dir, Dir};
use log::warn;
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::words::{tokenize, TextError};

static PASSAGE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/passages");

/// A bundled reading passage
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Passage {
    pub id: String,
    pub title: String,
    pub category: String,
    pub content: String,
}

impl Passage {
    /// Every bundled passage, ordered by id
    pub fn all() -> Vec<Passage> {
        let mut passages: Vec<Passage> = PASSAGE_DIR
            .files()
            .filter_map(|file| {
                let parsed = file
                    .contents_utf8()
                    .map(serde_json::from_str::<Passage>);
                match parsed {
                    Some(Ok(passage)) => Some(passage),
                    Some(Err(e)) => {
                        warn!("skipping passage {}: {}", file.path().display(), e);
                        None
                    }
                    None => {
                        warn!("skipping passage {}: not utf-8", file.path().display());
                        None
                    }
                }
            })
            .collect();

        passages.sort_by(|a, b| a.id.cmp(&b.id));
        passages
    }

    pub fn find(id: &str) -> Result<Passage, TextError> {
        Self::all()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| TextError::UnknownPassage(id.to_string()))
    }

    pub fn random() -> Result<Passage, TextError> {
        pick_random(&Self::all())
    }

    pub fn words(&self) -> Vec<String> {
        tokenize(&self.content)
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

fn pick_random(passages: &[Passage]) -> Result<Passage, TextError> {
    let rng = &mut rand::thread_rng();
    passages.choose(rng).cloned().ok_or(TextError::NoPassages)
}
