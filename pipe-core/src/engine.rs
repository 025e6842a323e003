//! Tick-driven growth state machine.
//!
//! The host calls [`GrowthEngine::tick`] once per logical tick (for
//! example once per rendered frame). Each call runs to completion and
//! does a bounded amount of work:
//!
//! 1. `Initializing` — lay the opening segment from the origin.
//! 2. `Growing` — ask the [`DirectionSampler`] for a free direction and
//!    extend the tip by one segment.
//! 3. On a stall the engine moves to `Relocating` within the same tick,
//!    searches for a fresh cell, opens a new run there with a new colour,
//!    and returns to `Growing`.
//! 4. If relocation runs out of attempts the engine becomes `Exhausted`
//!    and every further tick reports [`GrowthError::RelocationExhausted`]
//!    until the host calls [`GrowthEngine::reset`].

use glam::Vec3;
use rand::Rng;
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::GrowthConfig,
    error::{ConfigError, GrowthError},
    lattice::{Direction, Lattice},
    occupancy::Occupancy,
    relocation::{self, Relocation},
    sampler::{DirectionSampler, Shuffled},
    types::{Cell, ColorTag},
};

/// One unit piece of pipe, handed to the [`SegmentSink`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Cell,
    pub direction: Direction,
    pub color: ColorTag,
}

impl Segment {
    /// Cell at the far end of the segment.
    pub fn end(&self) -> Cell {
        self.start + self.direction.offset()
    }
}

/// Receives every segment the engine lays. Fire-and-forget: the engine
/// never reads anything back.
pub trait SegmentSink {
    fn emit(&mut self, segment: Segment);
}

impl SegmentSink for Vec<Segment> {
    fn emit(&mut self, segment: Segment) {
        self.push(segment);
    }
}

impl<T: SegmentSink + ?Sized> SegmentSink for &mut T {
    fn emit(&mut self, segment: Segment) {
        (**self).emit(segment);
    }
}

/// Sink that drops everything, for hosts that only need the state.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl SegmentSink for Discard {
    fn emit(&mut self, _segment: Segment) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowthState {
    /// Tip at the origin, opening segment not laid yet.
    Initializing,
    Growing,
    /// Stalled; a relocation search is pending.
    Relocating,
    /// Relocation failed. Terminal until [`GrowthEngine::reset`].
    Exhausted { attempts: u32 },
}

/// What a successful tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The session was opened at the origin. No segment is laid if the
    /// origin has no free neighbour.
    Started,
    /// The tip advanced by one segment.
    Grew,
    /// The tip was stuck at `from`; growth restarted at the free cell `to`.
    Relocated { from: Cell, to: Cell, attempts: u32 },
}

/// Counters for the current session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrowthStats {
    pub ticks: u64,
    pub segments: u64,
    pub stalls: u64,
    pub relocations: u64,
}

/// Owns one growth session: tip, direction, colour, and the occupancy
/// set. Independent sessions need independent engines.
#[derive(Debug)]
pub struct GrowthEngine<R, S = Shuffled> {
    config: GrowthConfig,
    lattice: Lattice,
    occupancy: Occupancy,
    rng: R,
    sampler: S,

    state: GrowthState,
    tip: Cell,
    direction: Direction,
    color: ColorTag,

    stats: GrowthStats,
}

impl<R: Rng> GrowthEngine<R, Shuffled> {
    /// Creates a session using the default shuffled direction sampler.
    ///
    /// ### Errors
    /// Returns the [`ConfigError`] from [`GrowthConfig::validate`]; no
    /// session is created in that case.
    pub fn new(config: GrowthConfig, rng: R) -> Result<Self, ConfigError> {
        Self::with_sampler(config, rng, Shuffled)
    }
}

impl<R: Rng, S: DirectionSampler> GrowthEngine<R, S> {
    /// Creates a session with a custom [`DirectionSampler`].
    pub fn with_sampler(
        config: GrowthConfig,
        mut rng: R,
        sampler: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let lattice = Lattice::from_config(&config);
        let direction = Direction::random(&mut rng);
        let color = ColorTag::random(&mut rng);
        let mut occupancy = Occupancy::new();
        occupancy.insert(Cell::ZERO);

        debug!(
            step = config.step_length,
            extents = ?config.extents(),
            cells = lattice.cell_count(),
            "growth session created"
        );

        Ok(Self {
            config,
            lattice,
            occupancy,
            rng,
            sampler,
            state: GrowthState::Initializing,
            tip: Cell::ZERO,
            direction,
            color,
            stats: GrowthStats::default(),
        })
    }

    /// Advances the state machine by exactly one step.
    ///
    /// Segments laid during the step are pushed to `sink`: at most one
    /// for `Started` and `Grew`, and at most one for `Relocated` (the
    /// opening segment of the new run).
    ///
    /// ### Errors
    /// [`GrowthError::RelocationExhausted`] when the tip is stuck and no
    /// free cell is found within the attempt budget. The engine stays
    /// exhausted and keeps returning the error until [`Self::reset`].
    pub fn tick<K: SegmentSink + ?Sized>(
        &mut self,
        sink: &mut K,
    ) -> Result<StepOutcome, GrowthError> {
        if let GrowthState::Exhausted { attempts } = self.state {
            return Err(GrowthError::RelocationExhausted {
                attempts,
                occupied: self.occupancy.len(),
            });
        }

        self.stats.ticks += 1;

        match self.state {
            GrowthState::Initializing => {
                self.open_run(sink);
                self.state = GrowthState::Growing;
                Ok(StepOutcome::Started)
            }
            GrowthState::Growing => match self.next_direction() {
                Some(direction) => {
                    self.lay(direction, sink);
                    Ok(StepOutcome::Grew)
                }
                None => {
                    self.stats.stalls += 1;
                    warn!(tip = ?self.tip, "no free direction, relocating");
                    self.state = GrowthState::Relocating;
                    self.relocate(sink)
                }
            },
            _ => self.relocate(sink),
        }
    }

    /// Clears the occupancy set and restarts the session at the origin
    /// with a fresh colour. Configuration, sampler and RNG are kept.
    pub fn reset(&mut self) {
        self.occupancy = Occupancy::new();
        self.occupancy.insert(Cell::ZERO);
        self.tip = Cell::ZERO;
        self.direction = Direction::random(&mut self.rng);
        self.color = ColorTag::random(&mut self.rng);
        self.state = GrowthState::Initializing;
        self.stats = GrowthStats::default();
        debug!("growth session reset");
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn state(&self) -> GrowthState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, GrowthState::Exhausted { .. })
    }

    pub fn tip(&self) -> Cell {
        self.tip
    }

    /// World position of the tip.
    pub fn tip_position(&self) -> Vec3 {
        self.lattice.to_world(self.tip)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn color(&self) -> ColorTag {
        self.color
    }

    pub fn stats(&self) -> GrowthStats {
        self.stats
    }

    fn next_direction(&mut self) -> Option<Direction> {
        self.sampler
            .sample(&mut self.rng, self.tip, &self.occupancy, &self.lattice)
    }

    /// Lays the first segment of a run from the current tip. A tip with
    /// no free neighbour only gets a new random heading; the next tick
    /// will stall and relocate.
    fn open_run<K: SegmentSink + ?Sized>(&mut self, sink: &mut K) {
        match self.next_direction() {
            Some(direction) => self.lay(direction, sink),
            None => {
                self.direction = Direction::random(&mut self.rng);
                debug!(tip = ?self.tip, "run opened on an isolated cell");
            }
        }
    }

    fn lay<K: SegmentSink + ?Sized>(&mut self, direction: Direction, sink: &mut K) {
        let segment = Segment {
            start: self.tip,
            direction,
            color: self.color,
        };
        sink.emit(segment);

        self.tip = segment.end();
        self.occupancy.insert(self.tip);
        self.direction = direction;
        self.stats.segments += 1;

        trace!(start = ?segment.start, ?direction, end = ?self.tip, "segment laid");
    }

    fn relocate<K: SegmentSink + ?Sized>(
        &mut self,
        sink: &mut K,
    ) -> Result<StepOutcome, GrowthError> {
        let from = self.tip;
        let found = relocation::find_fresh_cell(
            &mut self.rng,
            &self.occupancy,
            &self.lattice,
            self.config.relocation_attempts,
        );

        match found {
            Ok(Relocation { cell, attempts }) => {
                self.tip = cell;
                self.occupancy.insert(cell);
                self.color = ColorTag::random(&mut self.rng);
                self.stats.relocations += 1;
                info!(?from, to = ?cell, attempts, "relocated tip");

                self.open_run(sink);
                self.state = GrowthState::Growing;
                Ok(StepOutcome::Relocated {
                    from,
                    to: cell,
                    attempts,
                })
            }
            Err(err) => {
                let attempts = self.config.relocation_attempts;
                error!(%err, "growth stopped");
                self.state = GrowthState::Exhausted { attempts };
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::is_open;
    use glam::IVec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Always grows in one fixed direction while it is free.
    struct Fixed(Direction);

    impl DirectionSampler for Fixed {
        fn sample<R: Rng + ?Sized>(
            &mut self,
            _rng: &mut R,
            from: Cell,
            occupancy: &Occupancy,
            lattice: &Lattice,
        ) -> Option<Direction> {
            is_open(from, self.0, occupancy, lattice).then_some(self.0)
        }
    }

    fn config(step: f32, extent: f32) -> GrowthConfig {
        GrowthConfig {
            step_length: step,
            range_length: extent,
            range_width: extent,
            range_height: extent,
            ..GrowthConfig::default()
        }
    }

    fn engine(cfg: GrowthConfig, seed: u64) -> GrowthEngine<ChaCha8Rng> {
        GrowthEngine::new(cfg, ChaCha8Rng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn new_session_starts_at_origin() {
        let e = engine(GrowthConfig::default(), 1);
        assert_eq!(e.state(), GrowthState::Initializing);
        assert_eq!(e.tip(), IVec3::ZERO);
        assert_eq!(e.occupancy().len(), 1);
        assert!(e.occupancy().contains(IVec3::ZERO));
        assert_eq!(e.stats(), GrowthStats::default());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = GrowthEngine::new(config(0.0, 20.0), ChaCha8Rng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveStep(0.0));
    }

    #[test]
    fn first_tick_lays_opening_segment_from_origin() {
        let mut e = engine(GrowthConfig::default(), 2);
        let mut out = Vec::new();

        assert_eq!(e.tick(&mut out), Ok(StepOutcome::Started));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, IVec3::ZERO);
        assert_eq!(out[0].color, e.color());
        assert_eq!(e.tip(), out[0].end());
        assert_eq!(e.direction(), out[0].direction);
        assert_eq!(e.state(), GrowthState::Growing);
        assert_eq!(e.occupancy().len(), 2);
    }

    #[test]
    fn growing_extends_contiguously_with_one_colour() {
        let mut e = engine(GrowthConfig::default(), 3);
        let mut out = Vec::new();
        e.tick(&mut out).unwrap();
        for _ in 0..5 {
            assert_eq!(e.tick(&mut out), Ok(StepOutcome::Grew));
        }

        assert_eq!(out.len(), 6);
        for pair in out.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start);
            assert_eq!(pair[0].color, pair[1].color);
        }
        assert_eq!(e.occupancy().len(), 7);
        assert_eq!(e.stats().segments, 6);
        assert_eq!(e.stats().ticks, 6);
    }

    #[test]
    fn fixed_sampler_walks_straight_to_the_wall() {
        let mut e = GrowthEngine::with_sampler(
            config(2.0, 20.0),
            ChaCha8Rng::seed_from_u64(4),
            Fixed(Direction::Forward),
        )
        .unwrap();

        for _ in 0..5 {
            e.tick(&mut Discard).unwrap();
        }
        assert_eq!(e.tip(), IVec3::new(0, 0, 5));
        assert_eq!(e.tip_position(), Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(e.occupancy().len(), 6);

        // The wall is reached: the next tick stalls and relocates.
        let outcome = e.tick(&mut Discard).unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Relocated { from, .. } if from == IVec3::new(0, 0, 5)
        ));
        assert_eq!(e.stats().stalls, 1);
        assert_eq!(e.stats().relocations, 1);
    }

    #[test]
    fn relocation_changes_colour_and_occupies_new_cell() {
        let mut e = GrowthEngine::with_sampler(
            config(2.0, 20.0),
            ChaCha8Rng::seed_from_u64(5),
            Fixed(Direction::Up),
        )
        .unwrap();
        let mut out = Vec::new();
        loop {
            let before = out.len();
            if let StepOutcome::Relocated { to, .. } = e.tick(&mut out).unwrap() {
                assert!(e.occupancy().contains(to));
                assert_ne!(e.color(), out[0].color);
                for s in &out[before..] {
                    assert_eq!(s.start, to);
                    assert_eq!(s.color, e.color());
                }
                break;
            }
        }
        assert_eq!(e.state(), GrowthState::Growing);
    }

    #[test]
    fn tiny_box_reports_exhaustion_and_stays_exhausted() {
        // Only the origin is in bounds.
        let mut e = engine(config(2.0, 2.0), 6);
        let mut out = Vec::new();

        assert_eq!(e.tick(&mut out), Ok(StepOutcome::Started));
        assert!(out.is_empty());

        let err = e.tick(&mut out).unwrap_err();
        assert_eq!(
            err,
            GrowthError::RelocationExhausted {
                attempts: 100,
                occupied: 1
            }
        );
        assert!(e.is_exhausted());
        assert_eq!(e.stats().stalls, 1);

        // Terminal: no further work, same error.
        let ticks = e.stats().ticks;
        assert_eq!(e.tick(&mut out), Err(err));
        assert_eq!(e.stats().ticks, ticks);
        assert!(out.is_empty());
    }

    #[test]
    fn reset_restarts_session() {
        let mut e = engine(config(2.0, 2.0), 7);
        let _ = e.tick(&mut Discard);
        let _ = e.tick(&mut Discard);
        assert!(e.is_exhausted());

        e.reset();
        assert_eq!(e.state(), GrowthState::Initializing);
        assert_eq!(e.tip(), IVec3::ZERO);
        assert_eq!(e.occupancy().len(), 1);
        assert_eq!(e.stats(), GrowthStats::default());
        assert_eq!(e.tick(&mut Discard), Ok(StepOutcome::Started));
    }

    #[test]
    fn segment_end_follows_direction() {
        let s = Segment {
            start: IVec3::new(1, 1, 1),
            direction: Direction::Left,
            color: ColorTag {
                r: 0.0,
                g: 0.0,
                b: 0.0,
            },
        };
        assert_eq!(s.end(), IVec3::new(0, 1, 1));
    }
}
