//! Request lifecycle: acquire a server, hold it, release it, report.
//!
//! A lifecycle is not a thread or a coroutine. Its suspension points are
//! encoded as [`SimEvent`]s: a request that has to wait is parked in the
//! server's FIFO queue and is resumed by an `AccessGranted` event when the
//! previous occupant releases the slot.

use crate::engine::SimEvent;
use crate::metrics::MetricsCollector;
use crate::request::Request;
use crate::scheduler::Scheduler;
use crate::server::{Access, ServerId, ServerPool};
use tracing::trace;

/// Start the lifecycle of a freshly routed request on `server`.
///
/// Acquisition is immediate when the slot is free; otherwise the request
/// joins the back of the queue and nothing is scheduled until its turn.
pub fn start(
    request: Request,
    server: ServerId,
    pool: &mut ServerPool,
    scheduler: &mut Scheduler<SimEvent>,
) {
    let request_id = request.id;
    match pool[server].request_access(request, scheduler.now_ticks()) {
        Access::Granted { occupation_ticks } => {
            trace!(request_id, %server, occupation_ticks, "service started");
            scheduler.schedule_in_ticks(
                occupation_ticks,
                SimEvent::ServiceComplete { server, request_id },
            );
        }
        Access::Queued { position } => {
            trace!(request_id, %server, position, "waiting for server");
        }
    }
}

/// Resume a queued request that has just been handed the slot.
pub fn resume(
    server: ServerId,
    request_id: u64,
    pool: &ServerPool,
    scheduler: &mut Scheduler<SimEvent>,
) {
    let occupant = match pool[server].occupant() {
        Some(occupant) if occupant.request.id == request_id => occupant,
        other => panic!(
            "{} granted to request {} but held by {:?}",
            server,
            request_id,
            other.map(|o| o.request.id)
        ),
    };
    trace!(
        request_id,
        %server,
        waited_ticks = occupant.waiting_ticks(),
        "service started after wait"
    );
    scheduler.schedule_in_ticks(
        occupant.occupation_ticks,
        SimEvent::ServiceComplete { server, request_id },
    );
}

/// Finish service: release the slot, record the response time and wake the
/// next request in line.
pub fn complete(
    server: ServerId,
    request_id: u64,
    pool: &mut ServerPool,
    scheduler: &mut Scheduler<SimEvent>,
    metrics: &mut MetricsCollector,
) {
    let now_ticks = scheduler.now_ticks();
    let release = pool[server].release(request_id, now_ticks);
    metrics.record_completion(server, &release.finished, now_ticks);
    trace!(request_id, %server, "service complete");

    if let Some(next) = release.next {
        scheduler.schedule_in_ticks(
            0,
            SimEvent::AccessGranted {
                server,
                request_id: next,
            },
        );
    }
}
