//! Per-rank recording pipeline: partition → receivers → sampler → collector.
//!
//! The time-stepping loop calls [`SeismogramRecorder::record`] after every
//! step; the recorder samples on the `ndt` cadence. At the end every rank
//! calls [`SeismogramRecorder::collect`] and receives the same global
//! seismograms.

use crate::algs::collection::SeismogramCollector;
use crate::algs::communicator::Communicator;
use crate::algs::sampling::ReceiverSampler;
use crate::config::SimulationContext;
use crate::data::receivers::ReceiverSet;
use crate::data::seismogram::SeismogramSet;
use crate::data::wavefield::LocalState;
use crate::grid_error::GridError;
use crate::topology::partition::{GlobalCoord, GridPartition};

#[derive(Clone, Debug)]
pub struct SeismogramRecorder {
    ctx: SimulationContext,
    partition: GridPartition,
    receivers: ReceiverSet,
    sampler: ReceiverSampler,
    collector: SeismogramCollector,
}

impl SeismogramRecorder {
    /// Set up recording for `rank` of the run described by `ctx`.
    pub fn new(
        ctx: &SimulationContext,
        rank: usize,
        coords: &[GlobalCoord],
    ) -> Result<Self, GridError> {
        ctx.validate()?;
        let partition = ctx.decomposition()?.partition(rank)?;
        let receivers = ReceiverSet::new(&partition, coords)?;
        let ns = ctx.ns();
        let sampler = ReceiverSampler::new(ctx.seismo, ctx.spacing, receivers.ntr_local(), ns)?;
        let collector = SeismogramCollector::new(&receivers, ns);
        Ok(Self {
            ctx: ctx.clone(),
            partition,
            receivers,
            sampler,
            collector,
        })
    }

    /// Record time step `step` (1-based) if it falls on the sampling
    /// cadence. Returns whether a sample was taken.
    pub fn record(&mut self, step: usize, state: &LocalState<'_>) -> Result<bool, GridError> {
        let Some(col) = self.ctx.sample_index(step) else {
            return Ok(false);
        };
        self.sampler.sample(col, &self.receivers, state)?;
        Ok(true)
    }

    /// Gather every recorded quantity. Collective over `comm`.
    pub fn collect<C: Communicator>(&self, comm: &C) -> Result<SeismogramSet, GridError> {
        self.collector.collect_set(self.sampler.seismograms(), comm)
    }

    pub fn partition(&self) -> &GridPartition {
        &self.partition
    }

    pub fn receivers(&self) -> &ReceiverSet {
        &self.receivers
    }

    /// Compacted local traces recorded so far.
    pub fn local_seismograms(&self) -> &SeismogramSet {
        self.sampler.seismograms()
    }
}
