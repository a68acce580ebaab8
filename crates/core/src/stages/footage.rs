use std::collections::HashSet;

use futures_util::future::try_join_all;
use tracing::{debug, info, warn};

use crate::{
    clients::{FootageFile, FootageSearch, FootageVideo},
    config::FootageConfig,
    error::{ReelError, Result},
    stages::{Stage, StageContext, stage_ids},
    timeline::segment_windows,
    types::{FootageClip, ScriptSegment, TimeWindow, WordTimings},
};

#[derive(Debug, Clone)]
pub struct FootageRequest {
    pub segments: Vec<ScriptSegment>,
    pub timings: WordTimings,
}

/// The clip chosen for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub keyword: String,
    pub video_id: u64,
    pub page_url: String,
    pub file: FootageFile,
}

/// A selection stretched over one or more consecutive segment windows.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedClip {
    pub segment_index: usize,
    pub selection: Selection,
    pub window: TimeWindow,
    pub covers_segments: Vec<usize>,
}

fn is_acceptable(file: &FootageFile, config: &FootageConfig) -> bool {
    file.width >= config.min_width
        && file.height >= config.min_height
        && file.width > file.height
        && file.file_type.eq_ignore_ascii_case("video/mp4")
}

/// Pick a clip per segment, in segment order.
///
/// `results[i][k]` holds the search results for keyword `k` of segment `i`.
/// A video used by an earlier segment is never picked again.
pub fn select_footage(
    segments: &[ScriptSegment],
    results: &[Vec<Vec<FootageVideo>>],
    config: &FootageConfig,
) -> Vec<Option<Selection>> {
    let mut used: HashSet<u64> = HashSet::new();

    segments
        .iter()
        .zip(results)
        .map(|(segment, per_keyword)| {
            let selection = segment
                .keywords
                .iter()
                .zip(per_keyword)
                .find_map(|(keyword, videos)| {
                    videos
                        .iter()
                        .filter(|v| !used.contains(&v.id))
                        .find_map(|v| {
                            v.files
                                .iter()
                                .find(|f| is_acceptable(f, config))
                                .map(|file| Selection {
                                    keyword: keyword.clone(),
                                    video_id: v.id,
                                    page_url: v.page_url.clone(),
                                    file: file.clone(),
                                })
                        })
                });
            if let Some(s) = &selection {
                used.insert(s.video_id);
            }
            selection
        })
        .collect()
}

/// Merge unmatched segments into a neighbouring clip.
///
/// An unmatched segment extends the previous clip; unmatched segments before
/// the first match extend the first clip backwards. The resulting windows stay
/// contiguous over the whole timeline.
pub fn plan_clips(
    selections: Vec<Option<Selection>>,
    windows: &[TimeWindow],
) -> Result<Vec<PlannedClip>> {
    let mut planned: Vec<PlannedClip> = Vec::new();
    let mut leading: Vec<usize> = Vec::new();

    for (idx, (selection, window)) in selections.into_iter().zip(windows).enumerate() {
        let Some(selection) = selection else {
            match planned.last_mut() {
                Some(previous) => {
                    previous.window.end = window.end;
                    previous.covers_segments.push(idx);
                }
                None => leading.push(idx),
            }
            continue;
        };

        let mut covers_segments = std::mem::take(&mut leading);
        let start = covers_segments
            .first()
            .map_or(window.start, |&first| windows[first].start);
        covers_segments.push(idx);
        planned.push(PlannedClip {
            segment_index: idx,
            selection,
            window: TimeWindow::new(start, window.end),
            covers_segments,
        });
    }

    if planned.is_empty() {
        return Err(ReelError::composition("no footage found for any segment"));
    }
    Ok(planned)
}

pub struct FootageResolver {
    source: Box<dyn FootageSearch>,
    config: FootageConfig,
}

impl FootageResolver {
    pub fn new(source: Box<dyn FootageSearch>, config: FootageConfig) -> Self {
        Self { source, config }
    }

    /// Search every keyword of every segment at once, regrouped per segment.
    async fn search_all(&self, segments: &[ScriptSegment]) -> Result<Vec<Vec<Vec<FootageVideo>>>> {
        let queries: Vec<(usize, &str)> = segments
            .iter()
            .enumerate()
            .flat_map(|(idx, s)| s.keywords.iter().map(move |k| (idx, k.as_str())))
            .collect();

        let found = try_join_all(queries.iter().map(|&(_, keyword)| self.source.search(keyword)))
            .await?;

        let mut grouped: Vec<Vec<Vec<FootageVideo>>> = vec![Vec::new(); segments.len()];
        for ((idx, keyword), videos) in queries.into_iter().zip(found) {
            debug!(segment = idx, keyword, results = videos.len(), "search finished");
            grouped[idx].push(videos);
        }
        Ok(grouped)
    }
}

impl Stage for FootageResolver {
    const STAGE_ID: &'static str = stage_ids::FOOTAGE;
    const LABEL: &'static str = "Finding footage";

    type Input = FootageRequest;
    type Output = Vec<FootageClip>;

    async fn run(&self, request: &FootageRequest, ctx: &StageContext<'_>) -> Result<Vec<FootageClip>> {
        let windows = segment_windows(&request.segments, &request.timings);
        let results = self.search_all(&request.segments).await?;
        let selections = select_footage(&request.segments, &results, &self.config);

        for (idx, selection) in selections.iter().enumerate() {
            if selection.is_none() {
                warn!(
                    segment = idx,
                    keywords = ?request.segments[idx].keywords,
                    "no acceptable footage, reusing a neighbouring clip"
                );
            }
        }

        let planned = plan_clips(selections, &windows)?;

        let clips = try_join_all(planned.into_iter().map(|plan| async move {
            let path = ctx.run_dir.clip_path(plan.segment_index);
            self.source.download(&plan.selection.file.link, &path).await?;
            Ok::<_, ReelError>(FootageClip {
                segment_index: plan.segment_index,
                keyword: plan.selection.keyword,
                source_url: plan.selection.page_url,
                path,
                width: plan.selection.file.width,
                height: plan.selection.file.height,
                window: plan.window,
                covers_segments: plan.covers_segments,
            })
        }))
        .await?;

        info!(
            segments = request.segments.len(),
            clips = clips.len(),
            "footage resolved"
        );
        Ok(clips)
    }
}
