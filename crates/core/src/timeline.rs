//! Timing arithmetic shared by the aligner, the footage resolver and the composer.

use crate::types::{ScriptSegment, TimeWindow, WordTiming, WordTimings};

/// Clamp raw aligner output onto `[0, duration]`.
///
/// Blank or non-finite words are dropped, starts are made non-decreasing and
/// every end is kept between its start and `duration`. Nothing is invented for
/// gaps or silence.
pub fn normalize_timings(raw: Vec<WordTiming>, duration: f64) -> WordTimings {
    let duration = duration.max(0.0);
    let mut prev_start = 0.0_f64;
    let mut words = Vec::with_capacity(raw.len());

    for w in raw {
        let word = w.word.trim();
        if word.is_empty() || !w.start.is_finite() || !w.end.is_finite() {
            continue;
        }
        let start = w.start.clamp(0.0, duration).max(prev_start);
        let end = w.end.min(duration).max(start);
        prev_start = start;
        words.push(WordTiming {
            word: word.to_string(),
            start,
            end,
        });
    }

    WordTimings { words, duration }
}

/// One contiguous window per script segment, covering `[0, timings.duration]`.
///
/// The boundary before segment `i + 1` is the start of the aligned word that
/// opens it. When the transcript has a different word count than the script,
/// the word index is scaled proportionally. Without any timings the windows
/// follow each segment's share of script words.
pub fn segment_windows(segments: &[ScriptSegment], timings: &WordTimings) -> Vec<TimeWindow> {
    if segments.is_empty() {
        return Vec::new();
    }

    let duration = timings.duration.max(0.0);
    let counts: Vec<usize> = segments.iter().map(|s| s.word_count().max(1)).collect();
    let total: usize = counts.iter().sum();

    let mut boundaries = Vec::with_capacity(segments.len() + 1);
    boundaries.push(0.0);

    let mut cumulative = 0;
    for count in &counts[..counts.len() - 1] {
        cumulative += count;
        let share = cumulative as f64 / total as f64;

        let t = if timings.is_empty() {
            duration * share
        } else {
            let idx = (share * timings.len() as f64).round() as usize;
            match timings.words.get(idx) {
                Some(word) => word.start,
                None => timings.words[timings.len() - 1].end,
            }
        };

        let prev = *boundaries.last().unwrap_or(&0.0);
        boundaries.push(t.clamp(prev, duration));
    }
    boundaries.push(duration);

    boundaries
        .windows(2)
        .map(|pair| TimeWindow::new(pair[0], pair[1]))
        .collect()
}

/// True when `windows` tile `[0, duration]` with no gaps or overlaps.
pub fn windows_tile(windows: &[TimeWindow], duration: f64, epsilon: f64) -> bool {
    let Some(first) = windows.first() else {
        return false;
    };
    if first.start.abs() > epsilon {
        return false;
    }
    for pair in windows.windows(2) {
        if (pair[0].end - pair[1].start).abs() > epsilon || pair[0].duration() < 0.0 {
            return false;
        }
    }
    let last = windows[windows.len() - 1];
    let sum: f64 = windows.iter().map(TimeWindow::duration).sum();
    last.duration() >= 0.0 && (last.end - duration).abs() <= epsilon && (sum - duration).abs() <= epsilon
}
