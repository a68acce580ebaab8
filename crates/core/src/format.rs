use crate::types::{Caption, FootageClip, RenderedVideo, Script, TimeWindow, WordTimings};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format seconds as an SRT cue timestamp (HH:MM:SS,mmm)
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let mins = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

fn clean_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '\'' | '"'))
        .collect()
}

/// Group aligned words into short on-screen captions.
///
/// Words accumulate while the caption stays within `max_chars`; once a caption
/// reaches half that size it is closed early so captions change at a steady
/// pace. Captions are contiguous: each starts where the previous one ended.
pub fn group_captions(timings: &WordTimings, max_chars: usize) -> Vec<Caption> {
    let words: Vec<(String, f64, f64)> = timings
        .words
        .iter()
        .map(|w| (clean_word(&w.word), w.start, w.end))
        .filter(|(text, _, _)| !text.is_empty())
        .collect();

    let mut captions = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let (first, first_start, mut end) = words[i].clone();
        let mut text = first;
        i += 1;

        while i < words.len() && text.len() + 1 + words[i].0.len() <= max_chars {
            text.push(' ');
            text.push_str(&words[i].0);
            end = words[i].2;
            i += 1;
            if text.len() * 2 >= max_chars && i < words.len() {
                break;
            }
        }

        let start = captions
            .last()
            .map(|c: &Caption| c.window.end)
            .unwrap_or(first_start);
        captions.push(Caption {
            window: TimeWindow::new(start, end.max(start)),
            text,
        });
    }

    captions
}

pub fn captions_to_srt(captions: &[Caption]) -> String {
    let mut output = String::new();
    for (i, caption) in captions.iter().enumerate() {
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(caption.window.start),
            format_srt_timestamp(caption.window.end),
            caption.text
        ));
    }
    output
}

/// Human-readable summary of a finished run
pub fn format_run_summary(script: &Script, clips: &[FootageClip], video: &RenderedVideo) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", script.topic));
    output.push_str(&format!(
        "**Duration:** {:.1}s | **Resolution:** {}x{} @ {} fps | **Segments:** {}\n\n",
        video.duration,
        video.width,
        video.height,
        video.fps,
        script.segments.len()
    ));

    output.push_str("## Footage\n\n");
    for clip in clips {
        let start = format_timestamp(clip.window.start);
        let end = format_timestamp(clip.window.end);
        output.push_str(&format!("• [{}–{}] {}", start, end, clip.keyword));
        if clip.covers_segments.len() > 1 {
            output.push_str(&format!(" (covers {} segments)", clip.covers_segments.len()));
        }
        output.push('\n');
    }
    output.push('\n');

    output.push_str("## Script\n\n");
    output.push_str(&script.text);
    output.push('\n');

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WordTiming;

    fn timings(words: &[(&str, f64, f64)]) -> WordTimings {
        WordTimings {
            words: words
                .iter()
                .map(|(w, s, e)| WordTiming {
                    word: w.to_string(),
                    start: *s,
                    end: *e,
                })
                .collect(),
            duration: words.last().map(|w| w.2).unwrap_or(0.0),
        }
    }

    #[test]
    fn srt_timestamp_rolls_over_units() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_srt_timestamp(3723.0456), "01:02:03,046");
    }

    #[test]
    fn captions_close_at_half_size() {
        let t = timings(&[
            ("The", 0.2, 0.4),
            ("ocean", 0.4, 0.8),
            ("is", 0.8, 0.9),
            ("salty,", 0.9, 1.3),
            ("mostly.", 1.3, 2.0),
        ]);
        let captions = group_captions(&t, 15);
        let texts: Vec<_> = captions.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["The ocean", "is salty", "mostly"]);

        assert_eq!(captions[0].window.start, 0.2);
        assert_eq!(captions[0].window.end, 0.8);
        // contiguous
        assert_eq!(captions[1].window.start, 0.8);
        assert_eq!(captions[2].window.end, 2.0);
    }

    #[test]
    fn half_size_is_not_rounded_down() {
        let t = timings(&[
            ("salty", 0.0, 0.5),
            ("a", 0.5, 0.6),
            ("bit", 0.6, 0.9),
            ("ok", 0.9, 1.2),
        ]);
        let texts: Vec<_> = group_captions(&t, 15)
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["salty a bit", "ok"]);
    }

    #[test]
    fn punctuation_only_words_are_dropped() {
        let t = timings(&[("...", 0.0, 0.1), ("salt", 0.1, 0.5)]);
        let captions = group_captions(&t, 15);
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].text, "salt");
    }

    #[test]
    fn srt_numbers_cues_from_one() {
        let srt = captions_to_srt(&[
            Caption {
                window: TimeWindow::new(0.0, 1.25),
                text: "Hello there".into(),
            },
            Caption {
                window: TimeWindow::new(1.25, 2.0),
                text: "world".into(),
            },
        ]);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,250\nHello there\n\n2\n00:00:01,250 --> 00:00:02,000\nworld\n\n"
        );
    }
}
