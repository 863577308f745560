//! Unicode script detection for dataset words.
//!
//! A word is classified only when all of its letters belong to one script;
//! characters shared between scripts (digits, punctuation, combining marks)
//! are ignored. The dataset's script is the one most words are written in.

use std::collections::HashMap;

use unicode_script::{Script, UnicodeScript};

use crate::report::DetectedScript;

/// Script of `word`, or `None` when it mixes scripts or has no letters.
pub fn word_script(word: &str) -> Option<Script> {
    let mut found = None;
    for c in word.chars() {
        let script = c.script();
        if matches!(script, Script::Common | Script::Inherited | Script::Unknown) {
            continue;
        }
        match found {
            None => found = Some(script),
            Some(seen) if seen == script => {}
            Some(_) => return None,
        }
    }
    found
}

/// Display name of a script, with spaces instead of underscores.
pub fn script_name(script: Script) -> String {
    script.full_name().replace('_', " ")
}

/// Whether a manifest script name refers to `detected`.
pub fn same_script(declared: &str, detected: &DetectedScript) -> bool {
    declared.replace('_', " ").eq_ignore_ascii_case(&detected.name)
}

/// Running per-script word counts of one file.
#[derive(Debug, Default)]
pub struct ScriptTally {
    counts: HashMap<Script, u64>,
    classified: u64,
}

impl ScriptTally {
    pub fn add(&mut self, word: &str) {
        if let Some(script) = word_script(word) {
            *self.counts.entry(script).or_default() += 1;
            self.classified += 1;
        }
    }

    /// The most frequent script; ties go to the alphabetically first name.
    pub fn dominant(&self) -> Option<DetectedScript> {
        self.counts
            .iter()
            .max_by(|a, b| {
                a.1.cmp(b.1)
                    .then_with(|| b.0.full_name().cmp(a.0.full_name()))
            })
            .map(|(&script, &words)| DetectedScript {
                name: script_name(script),
                code: script.short_name().to_ascii_lowercase(),
                words,
                classified: self.classified,
            })
    }
}
