//! Podcast orchestration.
//!
//! Drives the full pipeline: extraction, empty-message filtering, consecutive
//! merging, per-utterance voice resolution and normalization, synthesis, and
//! final stitching. Temporary per-utterance segments live in a scoped
//! directory and are cleaned up on every exit path.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::audio::stitch_audio;
use crate::db::ChatDb;
use crate::error::{PodcastError, Result};
use crate::extract::extract_messages;
use crate::logging::StageTimer;
use crate::merge::merge_consecutive;
use crate::models::{CostEstimate, Utterance, VoiceMap};
use crate::normalize::TextNormalizer;
use crate::tts::SpeechSynthesizer;
use crate::urls::{TitleResolver, UrlRewriter};

/// Length of the utterance preview passed to progress observers.
const PREVIEW_CHARS: usize = 50;

/// Synchronous, in-order progress reporting for the synthesis loop.
pub trait ProgressObserver {
    /// Called after each utterance is dispatched. `current` is 1-based.
    fn on_progress(&mut self, current: usize, total: usize, preview: &str);
}

/// No-op observer for callers that don't care about progress.
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_progress(&mut self, _current: usize, _total: usize, _preview: &str) {}
}

/// Orchestrates podcast generation from extracted chat messages.
pub struct PodcastGenerator<'a, S: SpeechSynthesizer> {
    synthesizer: &'a S,
    voice_map: VoiceMap,
    normalizer: TextNormalizer,
    merge_gap_secs: i64,
    cost_per_char: f64,
}

impl<'a, S: SpeechSynthesizer> PodcastGenerator<'a, S> {
    /// Create a generator over a synthesis backend and voice assignments.
    pub fn new(
        synthesizer: &'a S,
        voice_map: VoiceMap,
        merge_gap_secs: i64,
        cost_per_char: f64,
    ) -> Result<Self> {
        Ok(Self {
            synthesizer,
            voice_map,
            normalizer: TextNormalizer::new()?,
            merge_gap_secs,
            cost_per_char,
        })
    }

    /// Run the dry pipeline (extract, filter, merge, normalize) and return
    /// the speakable utterances in final order.
    fn prepare_transcript<R: TitleResolver>(
        &self,
        db: &ChatDb,
        url_rewriter: &mut UrlRewriter<R>,
        chat_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Utterance>> {
        let utterances = extract_messages(db, url_rewriter, chat_id, start, end)?;
        let speakable: Vec<Utterance> = utterances
            .into_iter()
            .filter(Utterance::has_speakable_text)
            .collect();
        Ok(merge_consecutive(speakable, self.merge_gap_secs))
    }

    /// Generate a podcast and write it to `output_path`.
    ///
    /// Fails with `EmptyTranscript` when the range holds no speakable
    /// messages, and with `NoAudioSegments` when every utterance was skipped
    /// for lack of a resolvable voice. Collaborator failures propagate
    /// unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn generate<R: TitleResolver>(
        &self,
        db: &ChatDb,
        url_rewriter: &mut UrlRewriter<R>,
        chat_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
        output_path: &Path,
        pause_ms: u32,
        observer: &mut dyn ProgressObserver,
    ) -> Result<()> {
        let timer = StageTimer::new("generate_podcast");
        let utterances = self.prepare_transcript(db, url_rewriter, chat_id, start, end)?;

        if utterances.is_empty() {
            return Err(PodcastError::EmptyTranscript(
                "no speakable messages in the selected range".to_string(),
            ));
        }

        let total = utterances.len();
        let segment_dir = tempfile::tempdir()?;
        let mut segment_paths: Vec<PathBuf> = Vec::with_capacity(total);

        for (i, utterance) in utterances.iter().enumerate() {
            let text = self
                .normalizer
                .normalize(utterance.text.as_deref().unwrap_or(""));
            let preview: String = text.chars().take(PREVIEW_CHARS).collect();
            observer.on_progress(i + 1, total, &preview);

            let Some(voice_id) = self.voice_map.resolve(&utterance.sender) else {
                warn!(
                    sender = %utterance.sender,
                    "No voice mapped for sender and no default - skipping"
                );
                continue;
            };

            let audio_bytes = self.synthesizer.synthesize(&text, voice_id)?;

            let segment_path = segment_dir.path().join(format!("segment_{i:05}.mp3"));
            fs::write(&segment_path, &audio_bytes)?;
            segment_paths.push(segment_path);
        }

        if segment_paths.is_empty() {
            return Err(PodcastError::NoAudioSegments(
                "check voice mappings".to_string(),
            ));
        }

        stitch_audio(&segment_paths, output_path, pause_ms)?;
        info!(
            utterances = total,
            segments = segment_paths.len(),
            output = %output_path.display(),
            "Podcast generated"
        );
        timer.finish();
        Ok(())
        // segment_dir drops here, cleaning up temp segments on every path
    }

    /// Estimate the cost of generating a podcast without any synthesis calls.
    ///
    /// Runs the identical extract/filter/merge/normalize pipeline and reports
    /// utterance count, normalized character count, and a linear cost.
    pub fn estimate_cost<R: TitleResolver>(
        &self,
        db: &ChatDb,
        url_rewriter: &mut UrlRewriter<R>,
        chat_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<CostEstimate> {
        let utterances = self.prepare_transcript(db, url_rewriter, chat_id, start, end)?;

        let characters: usize = utterances
            .iter()
            .map(|u| {
                self.normalizer
                    .normalize(u.text.as_deref().unwrap_or(""))
                    .chars()
                    .count()
            })
            .sum();

        #[allow(clippy::cast_precision_loss)]
        let estimated_cost = characters as f64 * self.cost_per_char;

        Ok(CostEstimate {
            message_count: utterances.len(),
            characters,
            estimated_cost: (estimated_cost * 100.0).round() / 100.0,
        })
    }
}
