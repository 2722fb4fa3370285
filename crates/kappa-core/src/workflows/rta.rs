use crate::core::io::record::KappaRecord;
use crate::core::io::traits::KappaStore;
use crate::engine::config::{GridPointSelection, RtaConfig};
use crate::engine::context::Collaborators;
use crate::engine::error::EngineError;
use crate::engine::iterator::GridIterator;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reducer::{Conductivity, RtaReducer};
use crate::engine::report::KappaTable;
use crate::engine::restart::load_gamma;
use crate::engine::state::GridData;
use ndarray::{Array1, Array2, s};
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct RtaResult {
    pub data: GridData,
    /// `None` when only an explicit subset of grid points was processed.
    pub conductivity: Option<Conductivity>,
}

/// Computes the RTA lattice thermal conductivity.
///
/// With `read_gamma` set, persisted linewidths are loaded from `store` before
/// anything is computed; a single missing grid point aborts the run with
/// [`EngineError::RestartIncomplete`]. With `write_gamma` set, a per-point
/// record is written after each grid point. After a reduction over all grid
/// points, one consolidated record per broadening is written to `store`.
#[instrument(skip_all, name = "rta_workflow")]
pub fn run<'a>(
    config: &'a RtaConfig,
    collaborators: Collaborators<'a>,
    mut store: Option<&mut dyn KappaStore>,
    reporter: &ProgressReporter,
) -> Result<RtaResult, EngineError> {
    let persistence = &config.persistence;
    if persistence.write_gamma && store.is_none() {
        return Err(EngineError::Initialization(
            "writing linewidths requires a store".to_string(),
        ));
    }

    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!("-------------------- Lattice thermal conductivity (RTA) --------------------");
    let symmetry = collaborators.symmetry;
    let mut iterator = GridIterator::new(config, collaborators)?;
    reporter.report(Progress::PhaseFinish);

    if persistence.read_gamma {
        reporter.report(Progress::PhaseStart { name: "Restart" });
        let store = store.as_deref().ok_or_else(|| {
            EngineError::Initialization("reading linewidths requires a store".to_string())
        })?;
        let restored = load_gamma(
            store,
            iterator.data(),
            &config.mesh,
            persistence.input_filename.as_deref(),
        )?;
        iterator.restore(restored)?;
        reporter.report(Progress::Restored {
            grid_points: iterator.data().num_grid_points(),
        });
        reporter.report(Progress::PhaseFinish);
    }

    reporter.report(Progress::PhaseStart {
        name: "Grid Points",
    });
    reporter.report(Progress::GridStart {
        total: iterator.data().num_grid_points() as u64,
    });
    while let Some(step) = iterator.next() {
        let index = step?;
        let grid_point = iterator.data().grid_points()[index];
        if persistence.write_gamma {
            if let Some(store) = store.as_deref_mut() {
                write_grid_point(
                    store,
                    config,
                    iterator.data(),
                    index,
                    persistence.output_filename.as_deref(),
                )?;
            }
        }
        reporter.report(Progress::GridPointFinished { index, grid_point });
    }
    reporter.report(Progress::GridFinish);
    reporter.report(Progress::PhaseFinish);

    let data = iterator.into_data();
    if let GridPointSelection::Explicit(_) = config.grid_points {
        info!(
            grid_points = data.num_grid_points(),
            "Explicit grid points processed; skipping the conductivity reduction."
        );
        return Ok(RtaResult {
            data,
            conductivity: None,
        });
    }

    reporter.report(Progress::PhaseStart { name: "Reduction" });
    let conductivity = RtaReducer::new(config).reduce(&data, symmetry)?;
    if config.log_level > 0 {
        info!("\n{}", KappaTable::new(&conductivity));
    }
    if let Some(store) = store.as_deref_mut() {
        write_kappa(
            store,
            config,
            &data,
            &conductivity,
            persistence.output_filename.as_deref(),
        )?;
    }
    reporter.report(Progress::PhaseFinish);

    info!(
        num_sampling_points = conductivity.num_sampling_points(),
        "Conductivity calculation complete."
    );
    Ok(RtaResult {
        data,
        conductivity: Some(conductivity),
    })
}

fn base_record(config: &RtaConfig) -> KappaRecord {
    KappaRecord {
        temperatures: config.temperatures.clone(),
        mesh: config.mesh.numbers(),
        mesh_divisors: config.mesh.divisors(),
        ..KappaRecord::default()
    }
}

fn qpoints_array(data: &GridData) -> Array2<f64> {
    Array2::from_shape_fn((data.num_grid_points(), 3), |(i, c)| data.qpoints()[i][c])
}

fn write_grid_point(
    store: &mut dyn KappaStore,
    config: &RtaConfig,
    data: &GridData,
    i: usize,
    label: Option<&str>,
) -> Result<(), EngineError> {
    let grid_point = data.grid_points()[i];
    for (j, &sigma) in data.sigmas().iter().enumerate() {
        let record = KappaRecord {
            grid_point: Some(grid_point),
            sigma,
            frequency: Some(data.frequencies_at(i).to_owned().into_dyn()),
            group_velocity: Some(data.group_velocities().slice(s![i, .., ..]).to_owned().into_dyn()),
            heat_capacity: Some(data.heat_capacity_at(i).to_owned().into_dyn()),
            gamma: Some(data.gamma().slice(s![j, .., i, ..]).to_owned().into_dyn()),
            gamma_isotope: data
                .gamma_isotope()
                .map(|iso| iso.slice(s![j, i, ..]).to_owned().into_dyn()),
            mean_square_strength: Some(data.mean_square_strength().row(i).to_owned().into_dyn()),
            qpoints: Some(Array1::from_iter(data.qpoints()[i].iter().copied()).into_dyn()),
            ..base_record(config)
        };
        store.write(&record, label)?;
    }
    Ok(())
}

fn write_kappa(
    store: &mut dyn KappaStore,
    config: &RtaConfig,
    data: &GridData,
    conductivity: &Conductivity,
    label: Option<&str>,
) -> Result<(), EngineError> {
    let qpoints = qpoints_array(data).into_dyn();
    for (j, &sigma) in data.sigmas().iter().enumerate() {
        let record = KappaRecord {
            sigma,
            kappa: Some(conductivity.kappa().slice(s![j, .., ..]).to_owned().into_dyn()),
            frequency: Some(data.frequencies().clone().into_dyn()),
            group_velocity: Some(data.group_velocities().clone().into_dyn()),
            heat_capacity: Some(data.heat_capacity().clone().into_dyn()),
            gamma: Some(data.gamma().slice(s![j, .., .., ..]).to_owned().into_dyn()),
            gamma_isotope: data
                .gamma_isotope()
                .map(|iso| iso.slice(s![j, .., ..]).to_owned().into_dyn()),
            mean_square_strength: Some(data.mean_square_strength().clone().into_dyn()),
            qpoints: Some(qpoints.clone()),
            weights: Some(data.weights().to_vec()),
            ..base_record(config)
        };
        store.write(&record, label)?;
    }
    info!(label = ?label, "Conductivity written.");
    Ok(())
}
