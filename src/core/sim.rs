use crate::core::bitmap::OccupancyBitmap;
use crate::core::particle::{Particle, SUBUNITS_PER_CELL};
use crate::error::{Error, Result};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};

/// Color of the particles seeded at construction.
const SEED_COLOR: [u8; 3] = [255, 255, 100];

/// Discrete falling-sand simulation engine.
///
/// Owns the particle sequence, the cell occupancy bitmap, the gravity vector,
/// and a seeded RNG for the per-tick jitter. The host drives it: set gravity
/// between ticks, call [`Simulation::tick`] at a fixed cadence, then read
/// positions and occupancy to render.
///
/// Particle order is simulation state, not an iteration detail. The position
/// pass runs serially over the sequence, so a particle's index fixes its
/// collision-resolution precedence within a tick.
#[derive(Debug)]
pub struct Simulation {
    width: i32,
    height: i32,
    /// Largest legal particle coordinates in sub-cell units (inclusive).
    pwidth: i32,
    pheight: i32,
    gravity: [f64; 3],
    gravity_scale: f64,
    bounce_scale: f64,
    tick_count: u64,
    particles: Vec<Particle>,
    bitmap: OccupancyBitmap,
    rng: StdRng,
}

impl Simulation {
    /// Create a simulation on a `width` x `height` cell grid.
    ///
    /// Both dimensions must be positive multiples of 32 so rows pack into
    /// whole bitmap words. The grid starts with two full rows of resting
    /// particles at cell rows 0 and 1.
    ///
    /// `seed` pins the jitter RNG for reproducible runs; `None` seeds it from
    /// the thread RNG.
    pub fn new(width: u32, height: u32, seed: Option<u64>) -> Result<Self> {
        if width == 0 || width % 32 != 0 {
            return Err(Error::InvalidParam(
                "width must be a positive multiple of 32".into(),
            ));
        }
        if height == 0 || height % 32 != 0 {
            return Err(Error::InvalidParam(
                "height must be a positive multiple of 32".into(),
            ));
        }
        // Sub-cell coordinates and flattened cell indices must fit in i32.
        let (w, h) = (width as i64, height as i64);
        if w * SUBUNITS_PER_CELL as i64 > i32::MAX as i64
            || h * SUBUNITS_PER_CELL as i64 > i32::MAX as i64
            || w * h > i32::MAX as i64
        {
            return Err(Error::InvalidParam(
                "grid dimensions overflow the fixed-point coordinate range".into(),
            ));
        }

        let rng: StdRng = match seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };

        let width = width as i32;
        let height = height as i32;
        let mut sim = Self {
            width,
            height,
            pwidth: width * SUBUNITS_PER_CELL - SUBUNITS_PER_CELL,
            pheight: height * SUBUNITS_PER_CELL - SUBUNITS_PER_CELL,
            gravity: [0.0; 3],
            gravity_scale: 1.0,
            bounce_scale: 0.5,
            tick_count: 0,
            particles: Vec::new(),
            bitmap: OccupancyBitmap::new(width, height),
            rng,
        };

        // Seed rows column by column; the append order is the collision
        // precedence inside every later tick.
        for x in 0..width {
            for y in 0..2 {
                sim.add_particle(Particle::new(
                    x * SUBUNITS_PER_CELL,
                    y * SUBUNITS_PER_CELL,
                    0,
                    0,
                    SEED_COLOR,
                ));
            }
        }

        Ok(sim)
    }

    /// Replace the gravity vector; takes effect on the next tick.
    ///
    /// Values are unconstrained. The x and y components accelerate particles
    /// directly; the z magnitude contributes only the per-particle jitter.
    pub fn set_gravity(&mut self, gx: f64, gy: f64, gz: f64) {
        self.gravity = [gx, gy, gz];
    }

    /// Current gravity vector.
    pub fn gravity(&self) -> [f64; 3] {
        self.gravity
    }

    /// Append a particle and mark its cell occupied.
    ///
    /// The position must lie within the grid and the target cell must be
    /// vacant; violating either is a programming error and panics. The
    /// sequence never shrinks or reorders afterwards.
    pub fn add_particle(&mut self, particle: Particle) {
        assert!(
            particle.x >= 0
                && particle.x <= self.pwidth
                && particle.y >= 0
                && particle.y <= self.pheight,
            "particle position ({}, {}) outside the grid",
            particle.x,
            particle.y
        );
        assert!(
            !self.bitmap.get(particle.cell_x(), particle.cell_y()),
            "cell ({}, {}) is already occupied",
            particle.cell_x(),
            particle.cell_y()
        );
        self.bitmap.set(particle.cell_x(), particle.cell_y());
        self.particles.push(particle);
    }

    /// Advance the simulation by one step.
    ///
    /// Velocities first: every particle picks up the scaled planar gravity
    /// plus a bounded random jitter, then is clamped so it can never cross
    /// more than one cell per tick (anything faster would tunnel past the
    /// occupancy checks). Positions second, serially in sequence order: each
    /// particle moves against the occupancy already committed by the
    /// particles before it this tick. That is a deliberate approximation,
    /// not a snapshot.
    pub fn tick(&mut self) {
        self.tick_count += 1;

        let ax = self.gravity[0] * self.gravity_scale;
        let ay = self.gravity[1] * self.gravity_scale;
        let az = (self.gravity[2] * self.gravity_scale).abs() / 8.0;

        // The z magnitude is folded back in as random jitter: subtract it
        // from the plane, then re-add up to 2.5x of it per axis. Above 2x so
        // the overshoot biases motion and towers cannot freeze in place.
        let ax = (ax - az).round() as i32;
        let ay = (ay - az).round() as i32;
        let raz = (az * 2.5).floor() as i32;

        for p in &mut self.particles {
            // Two draws per particle, every tick, so the RNG stream position
            // depends only on seed, tick count and particle count.
            let jx = self.rng.random_range(0..=raz);
            let jy = self.rng.random_range(0..=raz);
            // Saturating sums: gravity is unconstrained host input and the
            // clamp swallows any excess anyway.
            p.vx = p
                .vx
                .saturating_add(ax)
                .saturating_add(jx)
                .clamp(-SUBUNITS_PER_CELL, SUBUNITS_PER_CELL);
            p.vy = p
                .vy
                .saturating_add(ay)
                .saturating_add(jy)
                .clamp(-SUBUNITS_PER_CELL, SUBUNITS_PER_CELL);
        }

        for i in 0..self.particles.len() {
            let p = self.particles[i];
            let mut vx = p.vx;
            let mut vy = p.vy;
            let mut nx = p.x + vx;
            let mut ny = p.y + vy;

            if nx < 0 {
                nx = 0;
                vx = bounce(vx, self.bounce_scale);
            } else if nx >= self.pwidth {
                nx = self.pwidth;
                vx = bounce(vx, self.bounce_scale);
            }
            if ny < 0 {
                ny = 0;
                vy = bounce(vy, self.bounce_scale);
            } else if ny >= self.pheight {
                ny = self.pheight;
                vy = bounce(vy, self.bounce_scale);
            }

            // Flattened cell indices; equal indices mean the move stays
            // inside the current cell and needs no collision check.
            let oidx = cell(p.y) * self.width + cell(p.x);
            let nidx = cell(ny) * self.width + cell(nx);

            if oidx != nidx && self.bitmap.get(cell(nx), cell(ny)) {
                // Index distance tells the move apart: +-1 is horizontal,
                // +-width vertical, anything else diagonal.
                let d = (nidx - oidx).abs();
                if d == 1 {
                    nx = p.x;
                    vx = bounce(vx, self.bounce_scale);
                } else if d == self.width {
                    ny = p.y;
                    vy = bounce(vy, self.bounce_scale);
                } else if vx.abs() >= vy.abs() {
                    // Diagonal with x the faster axis (ties go to x): skid
                    // along x if that cell is free, else along y, else stay.
                    if !self.bitmap.get(cell(nx), cell(p.y)) {
                        ny = p.y;
                        vy = bounce(vy, self.bounce_scale);
                    } else if !self.bitmap.get(cell(p.x), cell(ny)) {
                        nx = p.x;
                        vx = bounce(vx, self.bounce_scale);
                    } else {
                        nx = p.x;
                        ny = p.y;
                        vx = bounce(vx, self.bounce_scale);
                        vy = bounce(vy, self.bounce_scale);
                    }
                } else {
                    // Diagonal with y the faster axis: same skid, y first.
                    if !self.bitmap.get(cell(p.x), cell(ny)) {
                        nx = p.x;
                        vx = bounce(vx, self.bounce_scale);
                    } else if !self.bitmap.get(cell(nx), cell(p.y)) {
                        ny = p.y;
                        vy = bounce(vy, self.bounce_scale);
                    } else {
                        nx = p.x;
                        ny = p.y;
                        vx = bounce(vx, self.bounce_scale);
                        vy = bounce(vy, self.bounce_scale);
                    }
                }
            }

            // Recommit unconditionally; clear-then-set is idempotent for a
            // particle that never left its cell.
            self.bitmap.clear(cell(p.x), cell(p.y));
            let p = &mut self.particles[i];
            p.x = nx;
            p.y = ny;
            p.vx = vx;
            p.vy = vy;
            self.bitmap.set(cell(nx), cell(ny));
        }
    }

    /// Number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Particles in simulation order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// The cell occupancy grid.
    pub fn bitmap(&self) -> &OccupancyBitmap {
        &self.bitmap
    }

    /// Positions as `[x, y]` pairs in sub-cell units, in simulation order.
    pub fn positions(&self) -> Vec<[i32; 2]> {
        self.particles.iter().map(|p| [p.x, p.y]).collect()
    }

    /// Velocities as `[vx, vy]` pairs in sub-cell units, in simulation order.
    pub fn velocities(&self) -> Vec<[i32; 2]> {
        self.particles.iter().map(|p| [p.vx, p.vy]).collect()
    }

    /// Grid width in cells.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Largest legal x coordinate in sub-cell units.
    pub fn pwidth(&self) -> i32 {
        self.pwidth
    }

    /// Largest legal y coordinate in sub-cell units.
    pub fn pheight(&self) -> i32 {
        self.pheight
    }
}

// ============ Utility helpers ============

/// Reflect a velocity component off an obstacle, scaled down by `scale`.
#[inline]
fn bounce(v: i32, scale: f64) -> i32 {
    (-(v as f64) * scale) as i32
}

/// Cell coordinate of a non-negative sub-cell coordinate.
#[inline]
fn cell(subcell: i32) -> i32 {
    subcell / SUBUNITS_PER_CELL
}
