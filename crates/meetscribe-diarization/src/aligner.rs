//! Align a transcript with speaker diarization

use meetscribe_core::{AttributedBlock, SpeakerLabelMap, TranscriptSegment, UNKNOWN_SPEAKER};

use crate::provider::SpeakerSegment;

/// Merge a transcript and a diarization result into speaker-attributed blocks
///
/// Each transcript segment is attributed to the diarization speaker with the
/// largest temporal overlap, then consecutive segments with the same label
/// are coalesced into one block. Block text joins the constituent segment
/// texts with single spaces; the original segments are never re-split or
/// re-timed.
///
/// Without diarization every segment becomes its own `UNKNOWN` block, so the
/// per-segment timestamps stay visible to the reader. When `label_map` is not
/// supplied one is derived from the diarization result; a supplied map wins,
/// which is how recognized speaker names enter the transcript.
///
/// Transcript segments are expected in non-decreasing start-time order; that
/// ordering is a caller precondition and is not verified here. Inputs with
/// `end < start` produce deterministic but meaningless attribution (the
/// overlap measure clamps at zero), never a panic.
pub fn align(
    transcript: &[TranscriptSegment],
    diarization: Option<&[SpeakerSegment]>,
    label_map: Option<&SpeakerLabelMap>,
) -> Vec<AttributedBlock> {
    if transcript.is_empty() {
        return Vec::new();
    }

    let diarization = match diarization {
        Some(segments) if !segments.is_empty() => segments,
        _ => {
            // Diarization skipped or failed: one block per segment, no coalescing.
            return transcript
                .iter()
                .map(|segment| AttributedBlock {
                    start_time: segment.start,
                    speaker_label: UNKNOWN_SPEAKER.to_string(),
                    text: segment.text.clone(),
                })
                .collect();
        }
    };

    let derived;
    let labels = match label_map {
        Some(map) => map,
        None => {
            derived = SpeakerLabelMap::derive(diarization.iter().map(|s| s.speaker_id.as_str()));
            &derived
        }
    };

    let mut blocks = Vec::new();
    let mut current_label: Option<String> = None;
    let mut current_start = 0.0;
    let mut fragments: Vec<&str> = Vec::new();

    for segment in transcript {
        let label = assign_speaker(segment, diarization)
            .and_then(|id| labels.label_for(id))
            .unwrap_or(UNKNOWN_SPEAKER);

        if current_label.as_deref() == Some(label) {
            fragments.push(&segment.text);
        } else {
            if let Some(previous) = current_label.take() {
                blocks.push(AttributedBlock {
                    start_time: current_start,
                    speaker_label: previous,
                    text: fragments.join(" "),
                });
            }
            current_label = Some(label.to_string());
            current_start = segment.start;
            fragments = vec![&segment.text];
        }
    }

    if let Some(label) = current_label {
        blocks.push(AttributedBlock {
            start_time: current_start,
            speaker_label: label,
            text: fragments.join(" "),
        });
    }

    blocks
}

/// Pick the diarization speaker with the largest overlap for one segment
///
/// The strict comparison makes the first-encountered candidate win ties, in
/// diarization-segment order. Zero overlap yields no speaker.
fn assign_speaker<'a>(
    segment: &TranscriptSegment,
    diarization: &'a [SpeakerSegment],
) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;

    for candidate in diarization {
        let overlap =
            (segment.end.min(candidate.end) - segment.start.max(candidate.start)).max(0.0);
        if overlap > best.map_or(0.0, |(_, o)| o) {
            best = Some((candidate.speaker_id.as_str(), overlap));
        }
    }

    best.map(|(speaker_id, _)| speaker_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start,
            end,
            text: text.to_string(),
        }
    }

    fn turn(start: f64, end: f64, speaker_id: &str) -> SpeakerSegment {
        SpeakerSegment {
            start,
            end,
            speaker_id: speaker_id.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_empty_transcript() {
        let diarization = vec![turn(0.0, 5.0, "A")];
        assert!(align(&[], Some(&diarization), None).is_empty());
        assert!(align(&[], None, None).is_empty());
    }

    #[test]
    fn test_no_diarization_one_block_per_segment() {
        let transcript = vec![
            segment(0.0, 1.0, "hi"),
            segment(1.0, 2.0, "there"),
            segment(2.0, 3.0, "bye"),
        ];

        let blocks = align(&transcript, None, None);

        assert_eq!(blocks.len(), 3);
        for (block, original) in blocks.iter().zip(&transcript) {
            assert_eq!(block.speaker_label, UNKNOWN_SPEAKER);
            assert_eq!(block.text, original.text);
            assert_eq!(block.start_time, original.start);
        }

        // An empty diarization slice behaves identically to an absent one.
        let empty: Vec<SpeakerSegment> = Vec::new();
        assert_eq!(align(&transcript, Some(&empty), None), blocks);
    }

    #[test]
    fn test_coalescing_consecutive_same_speaker() {
        let transcript = vec![
            segment(0.0, 1.0, "hi"),
            segment(1.0, 2.0, "there"),
            segment(2.0, 3.0, "bye"),
        ];
        let diarization = vec![turn(0.0, 2.0, "X"), turn(2.0, 3.0, "Y")];

        let blocks = align(&transcript, Some(&diarization), None);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].speaker_label, "SPEAKER_1");
        assert_eq!(blocks[0].text, "hi there");
        assert_eq!(blocks[0].start_time, 0.0);
        assert_eq!(blocks[1].speaker_label, "SPEAKER_2");
        assert_eq!(blocks[1].text, "bye");
        assert_eq!(blocks[1].start_time, 2.0);
    }

    #[test]
    fn test_tie_break_keeps_first_candidate() {
        // Both turns overlap [10, 20] by exactly 5 seconds.
        let transcript = vec![segment(10.0, 20.0, "who said this")];
        let diarization = vec![turn(10.0, 15.0, "A"), turn(15.0, 20.0, "B")];

        let blocks = align(&transcript, Some(&diarization), None);

        assert_eq!(blocks.len(), 1);
        // "A" sorts first lexicographically, so its label is SPEAKER_1.
        assert_eq!(blocks[0].speaker_label, "SPEAKER_1");

        // Swapping the candidate order flips the winner.
        let reversed = vec![turn(15.0, 20.0, "B"), turn(10.0, 15.0, "A")];
        let blocks = align(&transcript, Some(&reversed), None);
        assert_eq!(blocks[0].speaker_label, "SPEAKER_2");
    }

    #[test]
    fn test_label_derivation_ignores_appearance_order() {
        let transcript = vec![segment(0.0, 1.0, "first"), segment(5.0, 6.0, "second")];
        // SPEAKER_02 appears before SPEAKER_01 in the diarization stream.
        let diarization = vec![turn(0.0, 1.0, "SPEAKER_02"), turn(5.0, 6.0, "SPEAKER_01")];

        let blocks = align(&transcript, Some(&diarization), None);

        assert_eq!(blocks[0].speaker_label, "SPEAKER_2");
        assert_eq!(blocks[1].speaker_label, "SPEAKER_1");
    }

    #[test]
    fn test_zero_overlap_is_unknown_and_unknowns_coalesce() {
        let transcript = vec![
            segment(0.0, 1.0, "covered"),
            segment(10.0, 11.0, "orphaned"),
            segment(11.0, 12.0, "also orphaned"),
        ];
        let diarization = vec![turn(0.0, 1.0, "A")];

        let blocks = align(&transcript, Some(&diarization), None);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].speaker_label, "SPEAKER_1");
        // Label equality drives coalescing, so adjacent UNKNOWN segments merge.
        assert_eq!(blocks[1].speaker_label, UNKNOWN_SPEAKER);
        assert_eq!(blocks[1].text, "orphaned also orphaned");
        assert_eq!(blocks[1].start_time, 10.0);
    }

    #[test]
    fn test_supplied_label_map_wins() {
        let transcript = vec![segment(0.0, 1.0, "hello"), segment(1.0, 2.0, "world")];
        let diarization = vec![turn(0.0, 2.0, "pyannote_0")];

        let mut map = SpeakerLabelMap::new();
        map.insert("pyannote_0", "Alice");

        let blocks = align(&transcript, Some(&diarization), Some(&map));

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].speaker_label, "Alice");
        assert_eq!(blocks[0].text, "hello world");
    }

    #[test]
    fn test_speaker_missing_from_supplied_map_is_unknown() {
        let transcript = vec![segment(0.0, 1.0, "hello")];
        let diarization = vec![turn(0.0, 1.0, "pyannote_7")];

        let map = SpeakerLabelMap::new();
        let blocks = align(&transcript, Some(&diarization), Some(&map));

        assert_eq!(blocks[0].speaker_label, UNKNOWN_SPEAKER);
    }

    #[test]
    fn test_coverage_reconstructs_transcript() {
        let transcript = vec![
            segment(0.0, 2.0, "alpha"),
            segment(2.0, 4.0, "bravo"),
            segment(4.0, 6.0, "charlie"),
            segment(6.0, 8.0, "delta"),
            segment(8.0, 10.0, "echo"),
        ];
        let diarization = vec![
            turn(0.0, 3.0, "S1"),
            turn(3.0, 7.0, "S2"),
            turn(7.0, 10.0, "S1"),
        ];

        let blocks = align(&transcript, Some(&diarization), None);

        let joined: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(joined.join(" "), "alpha bravo charlie delta echo");

        // Blocks come out in transcript-time order.
        for pair in blocks.windows(2) {
            assert!(pair[0].start_time <= pair[1].start_time);
        }
    }

    #[test]
    fn test_partial_overlap_picks_largest() {
        // [1, 4] overlaps A by 1s and B by 2s.
        let transcript = vec![segment(1.0, 4.0, "mostly b")];
        let diarization = vec![turn(0.0, 2.0, "A"), turn(2.0, 10.0, "B")];

        let blocks = align(&transcript, Some(&diarization), None);

        assert_eq!(blocks[0].speaker_label, "SPEAKER_2");
    }

    #[test]
    fn test_alternating_speakers_never_merge() {
        let transcript = vec![
            segment(0.0, 1.0, "a"),
            segment(1.0, 2.0, "b"),
            segment(2.0, 3.0, "c"),
            segment(3.0, 4.0, "d"),
        ];
        let diarization = vec![
            turn(0.0, 1.0, "X"),
            turn(1.0, 2.0, "Y"),
            turn(2.0, 3.0, "X"),
            turn(3.0, 4.0, "Y"),
        ];

        let blocks = align(&transcript, Some(&diarization), None);

        assert_eq!(blocks.len(), 4);
        let labels: Vec<&str> = blocks.iter().map(|b| b.speaker_label.as_str()).collect();
        assert_eq!(labels, ["SPEAKER_1", "SPEAKER_2", "SPEAKER_1", "SPEAKER_2"]);
    }
}
