use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::Config;
use crate::core::{initialize, Particle, Simulation, DIM};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_array<'py, F>(py: Python<'py>, particles: &[Particle], f: F) -> Py<PyArray2<f64>>
where
    F: Fn(&Particle) -> [f64; DIM],
{
    let mut arr = Array2::<f64>::zeros((particles.len(), DIM));
    for (i, p) in particles.iter().enumerate() {
        for (k, x) in f(p).into_iter().enumerate() {
            arr[[i, k]] = x;
        }
    }
    arr.into_pyarray(py).unbind()
}

/// Python-facing wrapper around the Rust `Simulation`, for notebook drivers.
///
/// - __new__(n_a=20, n_b=20, width=100.0, height=100.0, radius=1.5, mass_a=1.0,
///   mass_b=1.0, speed_range=(0.5, 1.5), reaction_probability=0.5, seed=0)
/// - from_toml(text)
/// - step(n=1)
/// - get_positions() / get_velocities() -> np.ndarray, shape (N, 2)
/// - get_ids() -> np.ndarray, get_elements() -> list[str]
/// - metrics() -> dict
#[pyclass]
pub struct Collider {
    sim: Simulation,
}

#[pymethods]
impl Collider {
    /// Initialize a simulation with randomly placed A and B particles.
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (
        n_a=20,
        n_b=20,
        width=100.0,
        height=100.0,
        radius=1.5,
        mass_a=1.0,
        mass_b=1.0,
        speed_range=(0.5, 1.5),
        reaction_probability=0.5,
        seed=0
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        n_a: i64,
        n_b: i64,
        width: f64,
        height: f64,
        radius: f64,
        mass_a: f64,
        mass_b: f64,
        speed_range: (f64, f64),
        reaction_probability: f64,
        seed: u64,
    ) -> PyResult<Self> {
        let config = Config {
            n_particles_a: n_a,
            n_particles_b: n_b,
            vessel_width: width,
            vessel_height: height,
            particle_radius: radius,
            particle_mass_a: mass_a,
            particle_mass_b: mass_b,
            initial_speed_range: speed_range,
            reaction_probability,
            random_seed: seed,
            ..Config::default()
        };
        let sim = initialize(&config).map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Initialize from a TOML configuration string (all keys optional).
    #[staticmethod]
    fn from_toml(text: &str) -> PyResult<Self> {
        let config = Config::from_toml_str(text).map_err(py_err)?;
        let sim = initialize(&config).map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Advance `n` steps (releases the GIL during computation).
    #[pyo3(signature = (n=1))]
    fn step(&mut self, py: Python<'_>, n: usize) -> PyResult<()> {
        py.detach(|| self.sim.advance(n)).map_err(py_err)
    }

    /// Return positions as a NumPy array of shape (N, 2), dtype=float64.
    fn get_positions(&self, py: Python<'_>) -> Py<PyArray2<f64>> {
        to_array(py, self.sim.state().particles(), |p| p.r)
    }

    /// Return velocities as a NumPy array of shape (N, 2), dtype=float64.
    fn get_velocities(&self, py: Python<'_>) -> Py<PyArray2<f64>> {
        to_array(py, self.sim.state().particles(), |p| p.v)
    }

    fn get_ids(&self, py: Python<'_>) -> Py<PyArray1<u32>> {
        let ids: Vec<u32> = self.sim.state().particles().iter().map(|p| p.id).collect();
        ids.into_pyarray(py).unbind()
    }

    /// Element names ("A", "B", "Product") in particle order.
    fn get_elements(&self) -> Vec<&'static str> {
        self.sim
            .state()
            .particles()
            .iter()
            .map(|p| p.element.as_str())
            .collect()
    }

    /// Current metrics as a dict.
    fn metrics<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let m = self.sim.state().metrics();
        let out = PyDict::new(py);
        out.set_item("step", m.step)?;
        out.set_item("particle_count", m.particle_count)?;
        out.set_item("temperature", m.temperature)?;
        out.set_item("collision_count", m.collision_count)?;
        out.set_item("reaction_count", m.reaction_count)?;
        out.set_item("product_count", m.product_count)?;
        Ok(out)
    }

    #[getter]
    fn temperature(&self) -> f64 {
        self.sim.state().temperature()
    }

    #[getter]
    fn collision_count(&self) -> u64 {
        self.sim.state().collision_count()
    }

    #[getter]
    fn reaction_count(&self) -> u64 {
        self.sim.state().reaction_count()
    }

    #[getter]
    fn product_count(&self) -> u64 {
        self.sim.state().product_count()
    }
}

/// The collider Python module entry point.
#[pymodule]
fn collider(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Collider>()?;
    Ok(())
}
