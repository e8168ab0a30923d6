use crate::converters::mscx::mscx_to_midi::{model::*, MidiError, Result};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

/// Largest ticks-per-quarter value a metrical SMF header can carry
pub const MAX_TPQ: u16 = 0x7FFF;

/// Largest tick a track event can sit on (28-bit variable-length quantity)
pub const MAX_TICK: u64 = 0x0FFF_FFFF;

/// Write a MidiScore as a single-track Standard MIDI File (Format 0)
pub fn write_smf(score: &MidiScore, out: &mut Vec<u8>) -> Result<()> {
    if score.tpq == 0 || score.tpq > MAX_TPQ {
        return Err(MidiError::DivisionOutOfRange(score.tpq as u32));
    }

    let header = Header {
        format: Format::SingleTrack,
        timing: Timing::Metrical(score.tpq.into()),
    };

    let smf = Smf {
        header,
        tracks: vec![build_track(score)?],
    };

    smf.write(out)
        .map_err(|e| MidiError::Write(format!("Failed to write MIDI: {}", e)))?;

    Ok(())
}

fn build_track<'a>(score: &MidiScore) -> Result<Track<'a>> {
    let mut events = vec![TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(
            microseconds_per_quarter(score.bpm).into(),
        )),
    }];

    // (absolute tick, is note-on, event); note-offs sort ahead of note-ons
    // on the same tick so repeated pitches retrigger cleanly
    let mut timed = Vec::with_capacity(score.notes.len() * 2);
    for note in &score.notes {
        timed.push((
            note.start_tick,
            true,
            note_event(MidiMessage::NoteOn {
                key: note.pitch.into(),
                vel: note.vel.into(),
            }),
        ));
        timed.push((
            note.start_tick.saturating_add(note.dur_tick),
            false,
            note_event(MidiMessage::NoteOff {
                key: note.pitch.into(),
                vel: note.vel.into(),
            }),
        ));
    }
    timed.sort_by_key(|(tick, is_on, _)| (*tick, *is_on));

    for (tick, _, mut event) in timed {
        if tick > MAX_TICK {
            return Err(MidiError::Write(format!(
                "tick {} is past the last tick a MIDI file can hold ({})",
                tick, MAX_TICK
            )));
        }
        event.delta = (tick as u32).into();
        events.push(event);
    }

    // Convert absolute times to delta times
    convert_to_delta_times(&mut events);

    // End of track
    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    Ok(events)
}

fn note_event<'a>(message: MidiMessage) -> TrackEvent<'a> {
    TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Midi {
            channel: 0.into(),
            message,
        },
    }
}

/// Convert absolute tick times to delta times (time since previous event)
fn convert_to_delta_times(events: &mut [TrackEvent]) {
    let mut prev_tick = 0u32;
    for event in events.iter_mut() {
        let current_tick = event.delta.as_int();
        let delta = current_tick.saturating_sub(prev_tick);
        event.delta = delta.into();
        prev_tick = current_tick;
    }
}
