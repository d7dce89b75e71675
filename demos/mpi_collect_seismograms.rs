//! Record and gather seismograms across MPI ranks.
//!
//! Run with
//! `mpirun -n 2 cargo run --example mpi_collect_seismograms --features mpi-support`
//! or pass a parameter file whose `procs` product matches the world size:
//! `mpirun -n 4 ... -- params.json`.

use std::fs::File;

use seismo_grid::prelude::*;

const DEFAULT_PARAMS: &str = r#"{
    "global_extent": [8, 4, 4],
    "procs": [2, 1, 1],
    "spacing": [10.0, 10.0, 10.0],
    "nt": 20,
    "ndt": 5,
    "seismo": "ALL"
}"#;

fn main() {
    let comm = match MpiComm::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let ctx = match std::env::args().nth(1) {
        Some(path) => File::open(&path)
            .map_err(|e| GridError::Config(format!("{path}: {e}")))
            .and_then(SimulationContext::from_reader),
        None => SimulationContext::from_json_str(DEFAULT_PARAMS),
    }
    .or_abort(&comm, "reading parameters");
    if ctx.world_size() != comm.size() {
        Err::<(), _>(GridError::Config(format!(
            "decomposition {:?} needs {} processes, world has {}",
            ctx.procs,
            ctx.world_size(),
            comm.size()
        )))
        .or_abort(&comm, "matching decomposition to world size");
    }

    // a line of receivers crossing every rank boundary along x
    let [nx, ny, nz] = ctx.global_extent.map(|n| n as isize);
    let coords: Vec<GlobalCoord> = (1..=nx)
        .map(|x| GlobalCoord([x, (ny + 1) / 2, (nz + 1) / 2]))
        .collect();

    let mut recorder = SeismogramRecorder::new(&ctx, comm.rank(), &coords)
        .or_abort(&comm, "setting up receivers");
    let partition = *recorder.partition();
    let bounds = partition.field_bounds(ctx.halo);
    let model = ElasticModel::homogeneous(&partition, ctx.halo, 3500.0, 2000.0, 2400.0)
        .or_abort(&comm, "building the model");
    let mut velocity = Velocity::zeros(bounds).or_abort(&comm, "allocating velocity");
    let mut stress = StressDiagonal::zeros(bounds).or_abort(&comm, "allocating stress");

    for step in 1..=ctx.nt {
        // analytic plane wave along x in place of a solver update
        let t = step as f32;
        for idx in bounds.indices() {
            let g = partition.to_global(LocalCoord(idx)).0;
            let phase = (g[0] as f32 - 0.4 * t) * 0.5;
            velocity.x[idx] = phase.sin();
            stress.xx[idx] = -phase.cos();
        }
        let state = LocalState::new(&velocity)
            .with_stress(&stress)
            .with_pi(&model.pi)
            .with_u(&model.u);
        recorder.record(step, &state).or_abort(&comm, "sampling receivers");
    }

    println!(
        "PE {}: {} of {} receivers recorded locally",
        comm.rank(),
        recorder.receivers().ntr_local(),
        recorder.receivers().ntr_glob()
    );
    let global = recorder
        .collect(&comm)
        .or_abort(&comm, "collecting seismograms");

    if comm.is_root() {
        for (q, m) in global.iter() {
            println!("{} (abs max {:.4e}):", q.name(), m.abs_max());
            for trace in 1..=m.nrows() as isize {
                let row: Vec<String> = m.row(trace).iter().map(|v| format!("{v:+.3}")).collect();
                println!("  trace {trace:>3}: {}", row.join(" "));
            }
        }
    }
}
