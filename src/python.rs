//! Python bindings for the simulation core.
//!
//! Built with the `python` cargo feature (`extension-module` on top for
//! wheel builds). The host owns the frame clock, rendering and input; it
//! sets gravity, ticks, and reads positions, colors and occupancy back as
//! NumPy arrays.

use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::{Particle, Simulation, SUBUNITS_PER_CELL};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Python-facing wrapper around the Rust simulation core.
///
/// API:
/// - `__new__(width, height, seed=None)`
/// - `tick()`
/// - `set_gravity(gx, gy, gz)` / `get_gravity()`
/// - `add_particle(x, y, vx=0, vy=0, color=(255, 255, 100))`
/// - `get_positions()` / `get_velocities()` -> np.ndarray, shape (N, 2)
/// - `get_colors()` -> np.ndarray, shape (N, 3)
/// - `get_occupancy()` -> np.ndarray, shape (height, width)
/// - `get_pixel(cell_x, cell_y)` -> bool
#[pyclass]
pub struct SandSim {
    sim: Simulation,
}

#[pymethods]
impl SandSim {
    /// Initialize a simulation on a `width` x `height` cell grid.
    ///
    /// Parameters
    /// - width, height: grid size in cells; positive multiples of 32
    /// - seed: RNG seed (int) for reproducible jitter; None for
    ///   nondeterministic
    ///
    /// Errors: raises ValueError on invalid dimensions.
    #[new]
    #[pyo3(signature = (width, height, seed=None))]
    fn new(width: u32, height: u32, seed: Option<u64>) -> PyResult<Self> {
        let sim = Simulation::new(width, height, seed).map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Advance the simulation by one step (releases the GIL during
    /// computation).
    fn tick(&mut self, py: Python<'_>) {
        py.detach(|| self.sim.tick());
    }

    /// Replace the gravity vector; observable on the next tick.
    fn set_gravity(&mut self, gx: f64, gy: f64, gz: f64) {
        self.sim.set_gravity(gx, gy, gz);
    }

    /// Return the current gravity vector as a (gx, gy, gz) tuple.
    fn get_gravity(&self) -> (f64, f64, f64) {
        let [gx, gy, gz] = self.sim.gravity();
        (gx, gy, gz)
    }

    /// Append a particle at sub-cell position (x, y) with velocity (vx, vy).
    ///
    /// Errors: raises ValueError if the position lies outside the grid or
    /// the target cell is already occupied.
    #[pyo3(signature = (x, y, vx=0, vy=0, color=(255, 255, 100)))]
    fn add_particle(
        &mut self,
        x: i32,
        y: i32,
        vx: i32,
        vy: i32,
        color: (u8, u8, u8),
    ) -> PyResult<()> {
        if x < 0 || x > self.sim.pwidth() || y < 0 || y > self.sim.pheight() {
            return Err(py_err(format!(
                "position ({x}, {y}) outside the grid (max ({}, {}))",
                self.sim.pwidth(),
                self.sim.pheight()
            )));
        }
        let particle = Particle::new(x, y, vx, vy, [color.0, color.1, color.2]);
        if self.sim.bitmap().get(particle.cell_x(), particle.cell_y()) {
            return Err(py_err(format!(
                "cell ({}, {}) is already occupied",
                particle.cell_x(),
                particle.cell_y()
            )));
        }
        self.sim.add_particle(particle);
        Ok(())
    }

    /// Return positions as a NumPy array of shape (N, 2), dtype=int32, in
    /// sub-cell units and simulation order.
    fn get_positions<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<i32>>> {
        let n = self.sim.num_particles();
        let mut arr = Array2::<i32>::zeros((n, 2));
        for (i, p) in self.sim.particles().iter().enumerate() {
            arr[[i, 0]] = p.x;
            arr[[i, 1]] = p.y;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return velocities as a NumPy array of shape (N, 2), dtype=int32.
    fn get_velocities<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<i32>>> {
        let n = self.sim.num_particles();
        let mut arr = Array2::<i32>::zeros((n, 2));
        for (i, p) in self.sim.particles().iter().enumerate() {
            arr[[i, 0]] = p.vx;
            arr[[i, 1]] = p.vy;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return particle colors as a NumPy array of shape (N, 3), dtype=uint8.
    fn get_colors<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<u8>>> {
        let n = self.sim.num_particles();
        let mut arr = Array2::<u8>::zeros((n, 3));
        for (i, p) in self.sim.particles().iter().enumerate() {
            for (k, c) in p.color.iter().enumerate() {
                arr[[i, k]] = *c;
            }
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return cell occupancy as a NumPy array of shape (height, width),
    /// dtype=bool.
    fn get_occupancy<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<bool>>> {
        let (w, h) = (self.sim.width(), self.sim.height());
        let mut arr = Array2::<bool>::from_elem((h as usize, w as usize), false);
        for y in 0..h {
            for x in 0..w {
                arr[[y as usize, x as usize]] = self.sim.bitmap().get(x, y);
            }
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Whether the cell at (cell_x, cell_y) is occupied.
    ///
    /// Errors: raises ValueError on out-of-range coordinates.
    fn get_pixel(&self, cell_x: i32, cell_y: i32) -> PyResult<bool> {
        if cell_x < 0 || cell_x >= self.sim.width() || cell_y < 0 || cell_y >= self.sim.height() {
            return Err(py_err(format!(
                "cell ({cell_x}, {cell_y}) outside {}x{} grid",
                self.sim.width(),
                self.sim.height()
            )));
        }
        Ok(self.sim.bitmap().get(cell_x, cell_y))
    }

    /// Number of completed ticks.
    #[getter]
    fn tick_count(&self) -> u64 {
        self.sim.tick_count()
    }

    /// Grid width in cells.
    #[getter]
    fn width(&self) -> i32 {
        self.sim.width()
    }

    /// Grid height in cells.
    #[getter]
    fn height(&self) -> i32 {
        self.sim.height()
    }

    /// Number of particles.
    #[getter]
    fn num_particles(&self) -> usize {
        self.sim.num_particles()
    }
}

/// The sandsim Python module entry point.
#[pymodule]
fn sandsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<SandSim>()?;
    m.add("SUBUNITS_PER_CELL", SUBUNITS_PER_CELL)?;
    Ok(())
}
