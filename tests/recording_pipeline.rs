use seismo_grid::prelude::*;

const PARAMS: &str = r#"{
    "global_extent": [4, 6, 4],
    "procs": [2, 3, 1],
    "spacing": [5.0, 2.5, 10.0],
    "nt": 6,
    "ndt": 2,
    "seismo": "ALL"
}"#;

fn receivers() -> Vec<GlobalCoord> {
    [
        [1, 1, 1],
        [4, 6, 4],
        [2, 3, 3],
        [3, 2, 2],
        [4, 1, 2],
        [1, 6, 4],
        [2, 4, 1],
    ]
    .into_iter()
    .map(GlobalCoord)
    .collect()
}

fn vx(g: [f32; 3], t: f32) -> f32 {
    0.01 * g[0] * g[0] + 0.1 * g[1] - 0.05 * g[2] * t
}
fn vy(g: [f32; 3], t: f32) -> f32 {
    0.2 * g[0] * g[1] + 0.03 * t - 0.01 * g[2] * g[2]
}
fn vz(g: [f32; 3], t: f32) -> f32 {
    -0.07 * g[0] + 0.02 * g[1] * g[2] * t
}

struct Fields {
    velocity: Velocity,
    stress: StressDiagonal,
    pi: Array3<f32>,
    u: Array3<f32>,
}

/// Fill every local point, halo included, from global closed forms. This
/// stands in for the halo exchange of the time-stepping loop.
fn fields_at(partition: &GridPartition, step: usize) -> Fields {
    let bounds = partition.field_bounds(1);
    let mut f = Fields {
        velocity: Velocity::zeros(bounds).unwrap(),
        stress: StressDiagonal::zeros(bounds).unwrap(),
        pi: Array3::new(bounds).unwrap(),
        u: Array3::new(bounds).unwrap(),
    };
    let t = step as f32;
    for idx in bounds.indices() {
        let g = partition.to_global(LocalCoord(idx)).0.map(|c| c as f32);
        f.velocity.x[idx] = vx(g, t);
        f.velocity.y[idx] = vy(g, t);
        f.velocity.z[idx] = vz(g, t);
        f.stress.xx[idx] = g[0] - t;
        f.stress.yy[idx] = g[1] * t;
        f.stress.zz[idx] = -g[2];
        f.pi[idx] = 1.0 + g[0] + g[1];
        f.u[idx] = 0.5 + g[2];
    }
    f
}

fn run_rank<C: Communicator>(ctx: &SimulationContext, comm: &C) -> SeismogramSet {
    let mut rec = SeismogramRecorder::new(ctx, comm.rank(), &receivers())
        .or_abort(comm, "setting up receivers");
    for step in 1..=ctx.nt {
        let f = fields_at(rec.partition(), step);
        let state = LocalState::new(&f.velocity)
            .with_stress(&f.stress)
            .with_pi(&f.pi)
            .with_u(&f.u);
        let sampled = rec.record(step, &state).or_abort(comm, "sampling");
        assert_eq!(sampled, step % ctx.ndt == 0);
    }
    rec.collect(comm).or_abort(comm, "collecting seismograms")
}

fn bits(m: &SeismogramMatrix) -> Vec<u32> {
    m.as_slice().iter().map(|v| v.to_bits()).collect()
}

#[test]
fn distributed_recording_matches_serial_run() {
    let ctx = SimulationContext::from_json_str(PARAMS).unwrap();
    let mut serial_ctx = ctx.clone();
    serial_ctx.procs = [1, 1, 1];
    let serial = run_rank(&serial_ctx, &NoComm);
    assert_eq!(serial.ntr(), 7);
    assert_eq!(serial.ns(), 3);

    let comms = ThreadComm::world(ctx.world_size());
    let distributed: Vec<SeismogramSet> = std::thread::scope(|s| {
        let ctx = &ctx;
        let handles: Vec<_> = comms
            .into_iter()
            .map(|c| s.spawn(move || run_rank(ctx, &c)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for set in &distributed {
        assert_eq!(
            set.quantities().collect::<Vec<_>>(),
            serial.quantities().collect::<Vec<_>>()
        );
        for (q, m) in set.iter() {
            let want = serial.get(q).unwrap();
            assert_eq!(bits(m), bits(want), "quantity {}", q.name());
        }
    }
}

#[test]
fn serial_values_follow_closed_forms() {
    let mut ctx = SimulationContext::from_json_str(PARAMS).unwrap();
    ctx.procs = [1, 1, 1];
    let set = run_rank(&ctx, &NoComm);

    // receiver 3 sits at (2, 3, 3); column 2 is time step 4
    let g = [2.0f32, 3.0, 3.0];
    let t = 4.0;
    let vx_rec = set.get(Quantity::Vx).unwrap()[[3, 2]];
    assert_eq!(vx_rec, vx(g, t));
    let p = set.get(Quantity::Pressure).unwrap()[[3, 2]];
    assert_eq!(p, -((g[0] - t) + g[1] * t + -g[2]) / 3.0);

    // stencils evaluated on the closed forms; h = (5, 2.5, 10)
    let at = |dx: f32, dy: f32, dz: f32| [g[0] + dx, g[1] + dy, g[2] + dz];
    let [hx, hy, hz] = [5.0f32, 2.5, 10.0];
    let pi = 1.0 + g[0] + g[1];
    let u = 0.5 + g[2];

    let vxx = (vx(g, t) - vx(at(-1.0, 0.0, 0.0), t)) / hx;
    let vyy = (vy(g, t) - vy(at(0.0, -1.0, 0.0), t)) / hy;
    let vzz = (vz(g, t) - vz(at(0.0, 0.0, -1.0), t)) / hz;
    let div_want = (vxx + vyy + vzz) * pi.sqrt();
    let div = set.get(Quantity::Divergence).unwrap()[[3, 2]];
    assert_close(div, div_want);

    let vxy = (vx(at(0.0, 1.0, 0.0), t) - vx(g, t)) / hy;
    let vxz = (vx(at(0.0, 0.0, 1.0), t) - vx(g, t)) / hz;
    let vyx = (vy(at(1.0, 0.0, 0.0), t) - vy(g, t)) / hx;
    let vyz = (vy(at(0.0, 0.0, 1.0), t) - vy(g, t)) / hz;
    let vzx = (vz(at(1.0, 0.0, 0.0), t) - vz(g, t)) / hx;
    let vzy = (vz(at(0.0, 1.0, 0.0), t) - vz(g, t)) / hy;
    let sq = |d: f32| d * d.abs();
    let amp = u * (sq(vyz - vzy) + sq(vzx - vxz) + sq(vxy - vyx));
    let curl_want = amp.signum() * amp.abs().sqrt();
    let curl = set.get(Quantity::Curl).unwrap()[[3, 2]];
    assert!(curl_want != 0.0);
    assert_close(curl, curl_want);
}

fn assert_close(got: f32, want: f32) {
    let tol = 1e-4 * want.abs().max(1.0);
    assert!((got - want).abs() <= tol, "got {got}, want {want}");
}

#[test]
fn every_receiver_has_exactly_one_owner() {
    let ctx = SimulationContext::from_json_str(PARAMS).unwrap();
    let decomp = ctx.decomposition().unwrap();
    let recs = receivers();
    let mut owners = vec![0; recs.len()];
    for rank in 0..decomp.size() {
        let set = ReceiverSet::new(&decomp.partition(rank).unwrap(), &recs).unwrap();
        for (i, owned) in set.ownership_flags().into_iter().enumerate() {
            owners[i] += owned as usize;
        }
    }
    assert!(owners.iter().all(|&n| n == 1));
}
