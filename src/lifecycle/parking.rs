use crate::lifecycle::machine::{StateMachine, Stateful};
use crate::state::ParkingSpot;
use crate::types::{ParkingSpotStatus, ParkingTrigger};

impl Stateful for ParkingSpot {
    type State = ParkingSpotStatus;

    fn state(&self) -> ParkingSpotStatus {
        self.status
    }

    fn set_state(&mut self, state: ParkingSpotStatus) {
        self.status = state;
    }
}

/// context for parking spot status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkingContext {
    pub trigger: ParkingTrigger,
}

impl ParkingContext {
    pub fn new(trigger: ParkingTrigger) -> Self {
        Self { trigger }
    }
}

/// AVAILABLE <-> UNDER_MAINTENANCE, AVAILABLE -> ASSIGNED, ASSIGNED -> AVAILABLE on checkout
pub fn parking_machine() -> StateMachine<ParkingSpot, ParkingContext> {
    StateMachine::<ParkingSpot, ParkingContext>::builder("parking spot")
        .edge(ParkingSpotStatus::Available, ParkingSpotStatus::UnderMaintenance)
        .edge(ParkingSpotStatus::UnderMaintenance, ParkingSpotStatus::Available)
        .guarded(ParkingSpotStatus::Available, ParkingSpotStatus::Assigned, |spot, _| {
            if spot.status == ParkingSpotStatus::Available && spot.assigned_lease.is_none() {
                Ok(())
            } else {
                Err(format!("spot {} is not available", spot.code))
            }
        })
        .guarded(ParkingSpotStatus::Assigned, ParkingSpotStatus::Available, |spot, ctx| {
            if ctx.trigger == ParkingTrigger::CheckoutRelease {
                Ok(())
            } else {
                Err(format!("spot {} can only be released by checkout", spot.code))
            }
        })
        .build()
}
