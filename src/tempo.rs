use log::debug;

// microseconds per second
const MICROS_PER_SEC: f64 = 1_000_000.0;

/// 120 bpm, assumed until a tempo event says otherwise.
pub const DEFAULT_MICROS_PER_BEAT: u32 = 500_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoBreakpoint {
    pub tick: u64,
    pub micros_per_beat: u32,
    pub elapsed_sec: f64,
}

/// Tempo breakpoints of a whole file, sorted by tick with exactly one entry at
/// tick 0 and at most one entry per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    ticks_per_beat: u16,
    breakpoints: Vec<TempoBreakpoint>,
    // the tick 0 entry is the assumed default, not a tempo event
    seeded: bool,
}

impl TempoMap {
    /// Builds the map from tempo changes gathered across all tracks, given in
    /// scan order. When several changes share a tick the last one wins.
    pub fn build<I>(changes: I, ticks_per_beat: u16, default_micros_per_beat: u32) -> Self
    where
        I: IntoIterator<Item = (u64, u32)>,
    {
        let mut changes: Vec<(u64, u32, bool)> =
            std::iter::once((0, default_micros_per_beat, false))
                .chain(changes.into_iter().map(|(tick, tempo)| (tick, tempo, true)))
                .collect();
        // stable, so equal ticks keep their declaration order
        changes.sort_by_key(|&(tick, _, _)| tick);

        let mut dedup: Vec<(u64, u32, bool)> = Vec::with_capacity(changes.len());
        for change in changes {
            match dedup.last_mut() {
                Some(last) if last.0 == change.0 => *last = change,
                _ => dedup.push(change),
            }
        }
        let seeded = dedup.first().map_or(false, |&(_, _, declared)| !declared);

        let mut breakpoints: Vec<TempoBreakpoint> = Vec::with_capacity(dedup.len());
        for (tick, micros_per_beat, declared) in dedup {
            let elapsed_sec = match breakpoints.last() {
                Some(prev) => {
                    prev.elapsed_sec
                        + ticks_to_seconds(tick - prev.tick, ticks_per_beat, prev.micros_per_beat)
                }
                None => 0.0,
            };
            if declared {
                debug!(
                    "-- Tempo change at tick {}: {:.3} bpm",
                    tick,
                    MICROS_PER_SEC / micros_per_beat as f64 * 60.0
                );
            }
            breakpoints.push(TempoBreakpoint {
                tick,
                micros_per_beat,
                elapsed_sec,
            });
        }

        Self {
            ticks_per_beat,
            breakpoints,
            seeded,
        }
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    pub fn breakpoints(&self) -> &[TempoBreakpoint] {
        &self.breakpoints
    }

    /// Breakpoints that came from tempo events in the file, without the
    /// assumed default at tick 0.
    pub fn declared_changes(&self) -> &[TempoBreakpoint] {
        let skip = usize::from(self.seeded);
        &self.breakpoints[skip..]
    }

    /// Elapsed seconds from the start of the file to `tick`.
    pub fn seconds_at(&self, tick: u64) -> f64 {
        // the tick 0 breakpoint guarantees at least one candidate
        let index = self
            .breakpoints
            .partition_point(|bp| bp.tick <= tick)
            .saturating_sub(1);
        let bp = &self.breakpoints[index];
        bp.elapsed_sec + ticks_to_seconds(tick - bp.tick, self.ticks_per_beat, bp.micros_per_beat)
    }
}

fn ticks_to_seconds(ticks: u64, ticks_per_beat: u16, micros_per_beat: u32) -> f64 {
    // MIDI tempo is in microseconds per quarter note
    ticks as f64 * (micros_per_beat as f64 / MICROS_PER_SEC) / ticks_per_beat as f64
}
