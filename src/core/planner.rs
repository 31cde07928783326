use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::engine::run_simulation;
use super::range::make_range;
use super::summary::{Headline, RequiredCapitalMatrix, build_headline, required_capital_matrix};
use super::types::{PlannerInputs, SimulationResult};

/// Generation handed out by [`SimulationSlot::begin`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ticket(u64);

/// Holds the latest simulation result. Only the most recently issued ticket
/// may publish; results from superseded computations are dropped.
#[derive(Debug, Default)]
pub struct SimulationSlot {
    issued: AtomicU64,
    current: Mutex<Option<SimulationResult>>,
}

impl SimulationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Returns `false` when a newer ticket has been issued since `ticket`.
    pub fn publish(&self, ticket: Ticket, result: SimulationResult) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_current(ticket) {
            return false;
        }
        *current = Some(result);
        true
    }

    pub fn current(&self) -> Option<SimulationResult> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Calculator state owned by the caller: inputs plus the slot that receives
/// each recomputation.
#[derive(Debug, Clone)]
pub struct Planner {
    inputs: PlannerInputs,
    slot: Arc<SimulationSlot>,
}

impl Planner {
    pub fn new(inputs: PlannerInputs) -> Self {
        Self::with_slot(inputs, Arc::new(SimulationSlot::new()))
    }

    pub fn with_slot(inputs: PlannerInputs, slot: Arc<SimulationSlot>) -> Self {
        Self { inputs, slot }
    }

    pub fn inputs(&self) -> &PlannerInputs {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut PlannerInputs {
        &mut self.inputs
    }

    pub fn sanitize_inputs(&mut self) {
        self.inputs = self.inputs.sanitized();
    }

    /// Sanitizes, simulates and publishes. Returns `None` when a newer
    /// refresh on the same slot started before this one finished.
    pub fn refresh(&mut self) -> Option<SimulationResult> {
        let ticket = self.begin_refresh();
        self.finish_refresh(ticket)
    }

    /// Sanitizes the inputs and claims the slot for the coming result.
    pub fn begin_refresh(&mut self) -> Ticket {
        self.sanitize_inputs();
        self.slot.begin()
    }

    pub fn finish_refresh(&self, ticket: Ticket) -> Option<SimulationResult> {
        let result = run_simulation(&self.inputs.simulation_params());
        if self.slot.publish(ticket, result.clone()) {
            Some(result)
        } else {
            log::debug!("discarding superseded simulation result");
            None
        }
    }

    pub fn simulation(&self) -> Option<SimulationResult> {
        self.slot.current()
    }

    pub fn targets(&self) -> Vec<f64> {
        let r = self.inputs.ranges;
        make_range(r.target_min, r.target_max, r.target_step)
    }

    pub fn years_list(&self) -> Vec<f64> {
        let r = self.inputs.ranges;
        make_range(r.years_min, r.years_max, r.years_step)
    }

    pub fn cagr_list(&self) -> Vec<f64> {
        let r = self.inputs.ranges;
        make_range(r.cagr_min, r.cagr_max, r.cagr_step)
    }

    pub fn headline(&self, simulation: &SimulationResult) -> Headline {
        build_headline(&self.inputs, simulation)
    }

    pub fn matrix(&self) -> RequiredCapitalMatrix {
        required_capital_matrix(&self.targets(), &self.years_list(), self.inputs.selected.cagr)
    }
}
